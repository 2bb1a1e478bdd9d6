//! Self-update state machine and the events it publishes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdatePhase {
    Idle,
    Checking,
    NoUpdate,
    UpdateAvailable,
    Downloading,
    Downloaded,
    InstallPending,
    Error,
}

impl UpdatePhase {
    /// Phases during which a check/download cycle owns the state machine.
    pub fn is_cycle_active(self) -> bool {
        matches!(
            self,
            UpdatePhase::Checking
                | UpdatePhase::UpdateAvailable
                | UpdatePhase::Downloading
                | UpdatePhase::Downloaded
                | UpdatePhase::InstallPending
        )
    }

    pub fn can_transition_to(self, next: UpdatePhase) -> bool {
        use UpdatePhase::*;
        matches!(
            (self, next),
            (Idle | NoUpdate | Error, Checking)
                | (Checking, NoUpdate | UpdateAvailable | Error)
                | (UpdateAvailable, Downloading | Error)
                | (Downloading, Downloading | Downloaded | Error)
                | (Downloaded, InstallPending)
                | (InstallPending, Downloaded)
                | (Error | NoUpdate, Idle)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgress {
    pub percent: u8,
    pub transferred_bytes: u64,
    pub total_bytes: u64,
}

impl UpdateProgress {
    /// Builds a progress value from a raw percentage reported by the feed.
    pub fn from_percent(percent: i32, total_bytes: u64) -> Self {
        let percent = percent.clamp(0, 100) as u8;
        let transferred_bytes = total_bytes.saturating_mul(u64::from(percent)) / 100;
        Self {
            percent,
            transferred_bytes,
            total_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid update transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: UpdatePhase,
    pub to: UpdatePhase,
}

/// The single live update state of a host process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateState {
    phase: UpdatePhase,
    version: Option<String>,
    progress: Option<UpdateProgress>,
}

impl Default for UpdateState {
    fn default() -> Self {
        Self::idle()
    }
}

impl UpdateState {
    pub fn idle() -> Self {
        Self {
            phase: UpdatePhase::Idle,
            version: None,
            progress: None,
        }
    }

    pub fn phase(&self) -> UpdatePhase {
        self.phase
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn progress(&self) -> Option<UpdateProgress> {
        self.progress
    }

    pub fn begin_check(&mut self) -> Result<(), InvalidTransition> {
        self.move_to(UpdatePhase::Checking, None, None)
    }

    pub fn no_update(&mut self) -> Result<(), InvalidTransition> {
        self.move_to(UpdatePhase::NoUpdate, None, None)
    }

    pub fn available(&mut self, version: &str) -> Result<(), InvalidTransition> {
        self.move_to(UpdatePhase::UpdateAvailable, Some(version.to_owned()), None)
    }

    pub fn downloading(&mut self, progress: UpdateProgress) -> Result<(), InvalidTransition> {
        let version = self.version.clone();
        self.move_to(UpdatePhase::Downloading, version, Some(progress))
    }

    pub fn downloaded(&mut self) -> Result<(), InvalidTransition> {
        let version = self.version.clone();
        let progress = self.progress;
        self.move_to(UpdatePhase::Downloaded, version, progress)
    }

    pub fn install_pending(&mut self) -> Result<(), InvalidTransition> {
        let version = self.version.clone();
        self.move_to(UpdatePhase::InstallPending, version, None)
    }

    pub fn failed(&mut self) -> Result<(), InvalidTransition> {
        self.move_to(UpdatePhase::Error, None, None)
    }

    /// `Error` and `NoUpdate` settle back to `Idle` once reported.
    pub fn settle(&mut self) -> Result<(), InvalidTransition> {
        self.move_to(UpdatePhase::Idle, None, None)
    }

    fn move_to(
        &mut self,
        next: UpdatePhase,
        version: Option<String>,
        progress: Option<UpdateProgress>,
    ) -> Result<(), InvalidTransition> {
        if !self.phase.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        self.version = version;
        self.progress = progress;
        Ok(())
    }
}

/// Filters raw feed percentages so a download never reports going backwards.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_bytes: u64,
    last: Option<u8>,
}

impl ProgressTracker {
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            last: None,
        }
    }

    /// Returns the progress to publish, or `None` when `raw` would not advance it.
    pub fn advance(&mut self, raw: i32) -> Option<UpdateProgress> {
        let next = UpdateProgress::from_percent(raw, self.total_bytes);
        if self.last.is_some_and(|last| next.percent <= last) {
            return None;
        }
        self.last = Some(next.percent);
        Some(next)
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPhase {
    Checking,
    Available,
    #[serde(rename = "none")]
    NoUpdate,
    Error,
    Downloaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub phase: StatusPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Host → UI push events, serialized as `{ "channel": ..., "payload": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", content = "payload")]
pub enum UpdateEvent {
    #[serde(rename = "update:status")]
    Status(StatusPayload),
    #[serde(rename = "update:progress")]
    Progress(UpdateProgress),
}

impl UpdateEvent {
    pub fn checking() -> Self {
        Self::status(StatusPhase::Checking, None, None)
    }

    pub fn available(version: &str) -> Self {
        Self::status(StatusPhase::Available, Some(version.to_owned()), None)
    }

    pub fn no_update() -> Self {
        Self::status(StatusPhase::NoUpdate, None, None)
    }

    pub fn downloaded(version: &str) -> Self {
        Self::status(StatusPhase::Downloaded, Some(version.to_owned()), None)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::status(StatusPhase::Error, None, Some(message.into()))
    }

    fn status(phase: StatusPhase, version: Option<String>, error: Option<String>) -> Self {
        UpdateEvent::Status(StatusPayload {
            phase,
            version,
            error,
        })
    }

    pub fn channel(&self) -> &'static str {
        match self {
            UpdateEvent::Status(_) => "update:status",
            UpdateEvent::Progress(_) => "update:progress",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_event_wire_shape() {
        let ev = UpdateEvent::available("1.4.0");
        assert_eq!(
            serde_json::to_value(&ev).unwrap(),
            json!({ "channel": "update:status", "payload": { "phase": "available", "version": "1.4.0" } })
        );

        let none = serde_json::to_value(UpdateEvent::no_update()).unwrap();
        assert_eq!(none["payload"]["phase"], "none");
    }

    #[test]
    fn progress_event_wire_shape() {
        let ev = UpdateEvent::Progress(UpdateProgress::from_percent(50, 2000));
        assert_eq!(
            serde_json::to_value(&ev).unwrap(),
            json!({
                "channel": "update:progress",
                "payload": { "percent": 50, "transferredBytes": 1000, "totalBytes": 2000 }
            })
        );
    }

    #[test]
    fn progress_clamps_out_of_range_percentages() {
        assert_eq!(UpdateProgress::from_percent(-5, 100).percent, 0);
        let over = UpdateProgress::from_percent(140, 100);
        assert_eq!(over.percent, 100);
        assert_eq!(over.transferred_bytes, 100);
    }
}
