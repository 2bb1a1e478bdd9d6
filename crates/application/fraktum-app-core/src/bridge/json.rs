use fraktum_infra::ReleaseFeed;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::wire::{BridgeRequest, Done, Failure, Reason, Reply};
use super::CapabilityBridge;
use crate::ports::{Dialogs, LauncherPort};

impl<L: LauncherPort, D: Dialogs, F: ReleaseFeed> CapabilityBridge<L, D, F> {
    /// Entry point for untrusted JSON: `{ "op": "<name>", "payload": ... }`.
    ///
    /// Never fails; unknown operations and malformed payloads come back as
    /// `{ ok: false, reason: "validation-failure" }`.
    pub async fn invoke(&self, request: &str) -> Value {
        match serde_json::from_str::<BridgeRequest>(request) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!("Rejected bridge request: {e}");
                to_value(Reply::<Done>::Err(
                    Failure::reason(Reason::ValidationFailure).with_message(e.to_string()),
                ))
            }
        }
    }

    pub async fn dispatch(&self, request: BridgeRequest) -> Value {
        debug!("Bridge request {request:?}");
        match request {
            BridgeRequest::SelectExecutable => to_value(self.select_executable().await),
            BridgeRequest::GetExecutable => to_value(self.get_executable().await),
            BridgeRequest::RunGame(req) => to_value(self.run_game(req).await),
            BridgeRequest::SaveUpload(req) => to_value(self.save_upload(req).await),
            BridgeRequest::SaveDownload(req) => to_value(self.save_download(&req.slot).await),
            BridgeRequest::SaveImport(req) => to_value(self.save_import(&req.slot).await),
            BridgeRequest::GetPlatform => Value::from(self.platform()),
            BridgeRequest::GetAppVersion => Value::from(self.app_version()),
            BridgeRequest::UpdateCheck => to_value(self.update_check()),
            BridgeRequest::UpdateQuitAndInstall => to_value(self.update_quit_and_install().await),
            BridgeRequest::OpenExternal(url) => Value::from(self.open_external(&url)),
            BridgeRequest::DownloadGameBuild(req) => {
                to_value(self.download_game_build(req).await)
            }
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        json!({ "ok": false, "reason": "io-failure", "message": e.to_string() })
    })
}
