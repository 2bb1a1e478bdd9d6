//! Optional online services (account, playtime, friends).
//!
//! The launcher works fully offline. [`RemoteFacade`] turns a missing or failing backend
//! into neutral answers so callers never branch on connectivity.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How recently a friend must have been seen to count as online.
const ONLINE_WINDOW_SECS: i64 = 120;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySession {
    pub game_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
}

impl PlaySession {
    /// Whole seconds played; an open session counts up to `now`.
    pub fn seconds(&self, now: DateTime<Utc>) -> u64 {
        let end = self.stopped_at.unwrap_or(now);
        let secs = (end - self.started_at).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaytimeEntry {
    pub game_id: String,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub online: bool,
}

impl FriendSummary {
    pub fn new(
        id: impl Into<String>,
        display_name: Option<String>,
        avatar_url: Option<String>,
        last_seen: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let online = last_seen
            .is_some_and(|seen| now - seen < Duration::seconds(ONLINE_WINDOW_SECS));
        Self {
            id: id.into(),
            display_name: display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Player".to_owned()),
            avatar_url,
            online,
        }
    }
}

/// Total seconds played per game, most played first, at most `limit` entries.
pub fn recent_playtimes(
    sessions: &[PlaySession],
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<PlaytimeEntry> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for session in sessions {
        *totals.entry(session.game_id.as_str()).or_default() += session.seconds(now);
    }

    let mut entries: Vec<PlaytimeEntry> = totals
        .into_iter()
        .map(|(game_id, seconds)| PlaytimeEntry {
            game_id: game_id.to_owned(),
            seconds,
        })
        .collect();
    entries.sort_by(|a, b| b.seconds.cmp(&a.seconds).then(a.game_id.cmp(&b.game_id)));
    entries.truncate(limit);
    entries
}

/// Remote account service. Implementations may fail freely; callers go through
/// [`RemoteFacade`].
#[async_trait]
pub trait RemoteBackend: Send + Sync + 'static {
    async fn user_id(&self) -> anyhow::Result<Option<String>>;

    async fn start_play_session(&self, game_id: &str) -> anyhow::Result<()>;

    async fn stop_play_session(&self, game_id: &str) -> anyhow::Result<()>;

    async fn sessions(&self, game_id: Option<&str>) -> anyhow::Result<Vec<PlaySession>>;

    async fn friends(&self) -> anyhow::Result<Vec<FriendSummary>>;
}

/// The backend used when none is configured.
pub struct OfflineBackend;

#[async_trait]
impl RemoteBackend for OfflineBackend {
    async fn user_id(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn start_play_session(&self, _game_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop_play_session(&self, _game_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn sessions(&self, _game_id: Option<&str>) -> anyhow::Result<Vec<PlaySession>> {
        Ok(Vec::new())
    }

    async fn friends(&self) -> anyhow::Result<Vec<FriendSummary>> {
        Ok(Vec::new())
    }
}

#[derive(Clone)]
pub struct RemoteFacade {
    backend: Arc<dyn RemoteBackend>,
}

impl Default for RemoteFacade {
    fn default() -> Self {
        Self::offline()
    }
}

impl RemoteFacade {
    pub fn new(backend: Arc<dyn RemoteBackend>) -> Self {
        Self { backend }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineBackend))
    }

    pub async fn user_id(&self) -> Option<String> {
        degrade("user_id", self.backend.user_id().await).flatten()
    }

    pub async fn start_play_session(&self, game_id: &str) -> bool {
        degrade("start_play_session", self.backend.start_play_session(game_id).await).is_some()
    }

    pub async fn stop_play_session(&self, game_id: &str) -> bool {
        degrade("stop_play_session", self.backend.stop_play_session(game_id).await).is_some()
    }

    pub async fn playtime_seconds(&self, game_id: &str) -> u64 {
        let now = Utc::now();
        degrade("playtime", self.backend.sessions(Some(game_id)).await)
            .unwrap_or_default()
            .iter()
            .filter(|s| s.game_id == game_id)
            .map(|s| s.seconds(now))
            .sum()
    }

    pub async fn recent_playtimes(&self, limit: usize) -> Vec<PlaytimeEntry> {
        let sessions = degrade("recent_playtimes", self.backend.sessions(None).await)
            .unwrap_or_default();
        recent_playtimes(&sessions, Utc::now(), limit)
    }

    pub async fn friends(&self) -> Vec<FriendSummary> {
        degrade("friends", self.backend.friends().await).unwrap_or_default()
    }
}

fn degrade<T>(call: &str, result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Remote {call} unavailable: {e:#}");
            None
        }
    }
}
