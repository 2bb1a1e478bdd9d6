use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The launcher's persisted settings record.
///
/// Keys this version does not know about are kept in `extra` so a rewrite never drops
/// settings written by another build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LauncherConfig {
    #[serde(default)]
    pub exe_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LauncherConfig {
    /// Shallow merge: every top-level key of `patch` replaces the key in `self`.
    pub fn merged(&self, patch: &ConfigPatch) -> Result<LauncherConfig, serde_json::Error> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for (key, value) in &patch.0 {
            record.insert(key.clone(), value.clone());
        }
        serde_json::from_value(Value::Object(record))
    }
}

/// Top-level keys to overwrite in a [`LauncherConfig`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigPatch(Map<String, Value>);

impl ConfigPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exe_path(path: impl Into<String>) -> Self {
        Self::new().set("exePath", Value::String(path.into()))
    }

    pub fn clear_exe_path() -> Self {
        Self::new().set("exePath", Value::Null)
    }

    pub fn set(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ConfigPatch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
