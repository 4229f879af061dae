use std::time::Duration;

use tokio::time::Instant;

use crate::connection::LoopState;

/// One connection to the gateway, from connect to disconnect.
///
/// A reconnect starts a new session with the next generation number; the
/// client's registry and id high-water mark carry over, the session does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    generation: u64,
    state: LoopState,
    started_at: Instant,
    last_activity: Instant,
}

impl Session {
    pub(crate) fn new(generation: u64) -> Self {
        let now = Instant::now();
        Self {
            generation,
            state: LoopState::Connecting,
            started_at: now,
            last_activity: now,
        }
    }

    /// 1 for the first session of a client, incremented on every connect.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Current loop state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the session is still usable for sending.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, LoopState::Connecting | LoopState::Running)
    }

    /// When the last frame arrived or the last probe was sent.
    #[must_use]
    pub const fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// Time since [`Session::last_activity`].
    #[must_use]
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Time since connect.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub(crate) fn set_state(&mut self, state: LoopState) {
        self.state = state;
    }
}
