//! Request and response shapes exchanged with the UI.

use std::fmt;

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use fraktum_core::{ErrorKind, LaunchRequest};

/// Why an operation was refused. Serialized kebab-case as the `reason` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reason {
    NoSlot,
    InvalidSlot,
    WriteFailed,
    Empty,
    Cancel,
    CopyFailed,
    NotConfigured,
    SpawnFailed,
    IoFailure,
    UpdaterUnavailable,
    NetworkFailure,
    ValidationFailure,
}

impl From<ErrorKind> for Reason {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotConfigured => Reason::NotConfigured,
            ErrorKind::SpawnFailed => Reason::SpawnFailed,
            ErrorKind::IoFailure => Reason::IoFailure,
            ErrorKind::UpdaterUnavailable => Reason::UpdaterUnavailable,
            ErrorKind::NetworkFailure => Reason::NetworkFailure,
            ErrorKind::ValidationFailure => Reason::ValidationFailure,
        }
    }
}

/// The `ok:false` half of a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Failure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Reason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dev: bool,
}

impl Failure {
    pub fn reason(reason: Reason) -> Self {
        Self {
            reason: Some(reason),
            ..Self::default()
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::default().with_message(message)
    }

    pub fn dev() -> Self {
        Self {
            dev: true,
            ..Self::default()
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(if self.dev { "not available in development builds" } else { "failed" });
        match self.reason.and_then(|r| serde_json::to_value(r).ok()) {
            Some(serde_json::Value::String(reason)) => write!(f, "{reason}: {text}"),
            _ => f.write_str(text),
        }
    }
}

/// `{ ok: true, ...value }` or `{ ok: false, ...failure }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply<T> {
    Ok(T),
    Err(Failure),
}

impl<T> Reply<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Reply::Ok(v) => Some(v),
            Reply::Err(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Reply::Ok(_) => None,
            Reply::Err(f) => Some(f),
        }
    }
}

impl<T: Serialize> Serialize for Reply<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Tagged<'a, V> {
            ok: bool,
            #[serde(flatten)]
            body: &'a V,
        }

        match self {
            Reply::Ok(value) => Tagged {
                ok: true,
                body: value,
            }
            .serialize(serializer),
            Reply::Err(failure) => Tagged {
                ok: false,
                body: failure,
            }
            .serialize(serializer),
        }
    }
}

/// Success with nothing else to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Done {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLaunched {
    pub launched: bool,
    pub game_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveStored {
    pub file: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveExported {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDownloaded {
    pub zip: String,
    pub dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SaveUploadRequest {
    #[serde(default)]
    pub slot: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(alias = "data")]
    pub bytes: Vec<u8>,
}

/// Payload of the operations that only name a save slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SlotRequest {
    #[serde(default)]
    pub slot: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DownloadBuildRequest {
    pub game_id: String,
    pub url: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Untrusted request envelope: `{ "op": "<name>", "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", content = "payload", rename_all = "camelCase")]
pub enum BridgeRequest {
    SelectExecutable,
    GetExecutable,
    RunGame(LaunchRequest),
    SaveUpload(SaveUploadRequest),
    SaveDownload(SlotRequest),
    SaveImport(SlotRequest),
    GetPlatform,
    GetAppVersion,
    UpdateCheck,
    UpdateQuitAndInstall,
    OpenExternal(String),
    DownloadGameBuild(DownloadBuildRequest),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_display_prefers_message() {
        let failure = Failure::reason(Reason::NoSlot).with_message("slot is required");
        assert_eq!(failure.to_string(), "no-slot: slot is required");
        assert_eq!(Failure::default().with_error("boom").to_string(), "boom");
    }

    #[test]
    fn replies_carry_ok_flag() {
        let ok: Reply<GameLaunched> = Reply::Ok(GameLaunched {
            launched: true,
            game_id: "g1".into(),
        });
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "ok": true, "launched": true, "gameId": "g1" })
        );

        let dev: Reply<Done> = Reply::Err(Failure::dev().with_message("dev build"));
        assert_eq!(
            serde_json::to_value(&dev).unwrap(),
            json!({ "ok": false, "dev": true, "message": "dev build" })
        );

        let done: Reply<Done> = Reply::Ok(Done {});
        assert_eq!(serde_json::to_value(&done).unwrap(), json!({ "ok": true }));
    }

    #[test]
    fn reasons_are_kebab_case() {
        let failure = Failure::reason(Reason::NoSlot);
        let reply: Reply<Done> = Reply::Err(failure);
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({ "ok": false, "reason": "no-slot" })
        );
    }

    #[test]
    fn requests_parse_from_envelopes() {
        let req: BridgeRequest = serde_json::from_value(json!({
            "op": "runGame",
            "payload": { "gameId": "g1", "args": ["--fullscreen"] }
        }))
        .unwrap();
        assert_eq!(
            req,
            BridgeRequest::RunGame(LaunchRequest::new("g1", vec!["--fullscreen".into()]))
        );

        let req: BridgeRequest = serde_json::from_value(json!({ "op": "getPlatform" })).unwrap();
        assert_eq!(req, BridgeRequest::GetPlatform);

        let legacy: BridgeRequest = serde_json::from_value(json!({
            "op": "saveUpload",
            "payload": { "slot": "s1", "data": [1, 2, 3] }
        }))
        .unwrap();
        assert!(matches!(legacy, BridgeRequest::SaveUpload(r) if r.bytes == vec![1, 2, 3]));
    }

    #[test]
    fn unknown_ops_are_rejected() {
        let err = serde_json::from_value::<BridgeRequest>(json!({ "op": "deleteEverything" }));
        assert!(err.is_err());
    }
}
