use std::path::Path;

use fraktum_config::{MAX_GAME_ID_LEN, MAX_LAUNCH_ARGS};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One request to start the configured game executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub game_id: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl LaunchRequest {
    pub fn new(game_id: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            game_id: game_id.into(),
            args,
        }
    }

    /// `game_id` is opaque to the launcher but must be printable and bounded; arguments
    /// must be representable as OS strings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.game_id.trim().is_empty() {
            return Err(ValidationError::Empty { field: "gameId" });
        }
        if self.game_id.chars().count() > MAX_GAME_ID_LEN {
            return Err(ValidationError::TooLong {
                field: "gameId",
                max: MAX_GAME_ID_LEN,
            });
        }
        if self.game_id.chars().any(char::is_control) {
            return Err(ValidationError::ControlCharacter { field: "gameId" });
        }
        if self.args.len() > MAX_LAUNCH_ARGS {
            return Err(ValidationError::TooManyArgs {
                count: self.args.len(),
                max: MAX_LAUNCH_ARGS,
            });
        }
        if self.args.iter().any(|a| a.contains('\0')) {
            return Err(ValidationError::ControlCharacter { field: "args" });
        }
        Ok(())
    }
}

/// The configured executable as shown to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableInfo {
    pub path: String,
    pub name: String,
}

impl ExecutableInfo {
    pub fn from_path(path: &str) -> Self {
        let name = Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_owned());
        Self {
            path: path.to_owned(),
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_default_to_empty() {
        let req: LaunchRequest = serde_json::from_str(r#"{"gameId":"g1"}"#).unwrap();
        assert!(req.args.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn blank_game_id_is_rejected() {
        let req = LaunchRequest::new("  ", vec![]);
        assert_eq!(
            req.validate(),
            Err(ValidationError::Empty { field: "gameId" })
        );
    }

    #[test]
    fn nul_in_args_is_rejected() {
        let req = LaunchRequest::new("g1", vec!["ok".into(), "bad\0arg".into()]);
        assert!(req.validate().is_err());
    }

    #[test]
    fn executable_name_is_file_name() {
        let info = ExecutableInfo::from_path("/opt/games/novel/Novel.x86_64");
        assert_eq!(info.name, "Novel.x86_64");
    }
}
