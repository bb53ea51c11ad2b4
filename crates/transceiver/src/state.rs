//! Rig process lifecycle.
//!
//! ```text
//! NotRunning --start--> Starting --spawned--> Running
//!      ^                   |                     |
//!      +----spawn failed---+                     |
//!      +----------------process died-------------+
//! any --abort/quit--> Aborting --> NotRunning
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RigProcessState {
    #[default]
    NotRunning,
    Starting,
    Running,
    Aborting,
}

impl RigProcessState {
    /// Only a running rig may exchange messages.
    #[must_use]
    pub const fn can_exchange(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotRunning, Self::Starting)
                | (Self::Starting, Self::Running | Self::NotRunning)
                | (Self::Running, Self::NotRunning)
                | (_, Self::Aborting)
                | (Self::Aborting, Self::NotRunning)
        )
    }
}

impl fmt::Display for RigProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotRunning => "not running",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Aborting => "aborting",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_running_exchanges() {
        assert!(RigProcessState::Running.can_exchange());
        assert!(!RigProcessState::Starting.can_exchange());
        assert!(!RigProcessState::NotRunning.can_exchange());
    }

    #[test]
    fn test_transitions() {
        use RigProcessState::*;
        assert!(NotRunning.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Running));
        assert!(Starting.can_transition_to(NotRunning));
        assert!(Running.can_transition_to(Aborting));
        assert!(NotRunning.can_transition_to(Aborting));
        assert!(!NotRunning.can_transition_to(Running));
        assert!(!Running.can_transition_to(Starting));
    }
}
