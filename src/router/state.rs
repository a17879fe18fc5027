//! Router state machine.

use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RouterState {
    Stopped = 0,
    Initializing = 1,
    Running = 2,
    Paused = 3,
    ShuttingDown = 4,
    Error = 5,
}

impl RouterState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => RouterState::Stopped,
            1 => RouterState::Initializing,
            2 => RouterState::Running,
            3 => RouterState::Paused,
            4 => RouterState::ShuttingDown,
            _ => RouterState::Error,
        }
    }
}

impl std::fmt::Display for RouterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RouterState::Stopped => "STOPPED",
            RouterState::Initializing => "INITIALIZING",
            RouterState::Running => "RUNNING",
            RouterState::Paused => "PAUSED",
            RouterState::ShuttingDown => "SHUTDOWN",
            RouterState::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// Atomic cell holding a [`RouterState`], with CAS-guarded transitions so
/// concurrent `start`/`stop`/`pause` calls from different threads don't race.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new(initial: RouterState) -> Self {
        StateCell(AtomicU8::new(initial as u8))
    }

    pub fn get(&self) -> RouterState {
        RouterState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, state: RouterState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Transitions `from -> to` only if the current state is `from`.
    pub fn transition(&self, from: RouterState, to: RouterState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_fails_from_wrong_state() {
        let cell = StateCell::new(RouterState::Stopped);
        assert!(!cell.transition(RouterState::Running, RouterState::Paused));
        assert_eq!(cell.get(), RouterState::Stopped);
    }

    #[test]
    fn transition_succeeds_from_matching_state() {
        let cell = StateCell::new(RouterState::Stopped);
        assert!(cell.transition(RouterState::Stopped, RouterState::Initializing));
        assert_eq!(cell.get(), RouterState::Initializing);
    }
}
