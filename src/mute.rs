use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-boxed posting restrictions, keyed by nickname. Expired entries are
/// left in the map and are simply inert.
#[derive(Debug, Default)]
pub struct MuteRegistry {
    muted: HashMap<String, Instant>,
}

impl MuteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mute `nickname` for `duration` from now, overwriting any earlier entry.
    pub fn mute(&mut self, nickname: &str, duration: Duration) {
        self.muted
            .insert(nickname.to_string(), Instant::now() + duration);
    }

    /// Lift a mute. Returns false when the user was not muted.
    pub fn unmute(&mut self, nickname: &str) -> bool {
        self.muted.remove(nickname).is_some()
    }

    pub fn is_muted(&self, nickname: &str) -> bool {
        self.muted
            .get(nickname)
            .is_some_and(|until| *until > Instant::now())
    }
}
