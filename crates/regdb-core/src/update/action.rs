use std::fmt;

///
/// Action
///
/// Kind of change an update performs, derived from which records are present.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Action {
    Create,
    Modify,
    Delete,
}

impl Action {
    pub const ALL: &'static [Self] = &[Self::Create, Self::Modify, Self::Delete];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "CREATE",
            Self::Modify => "MODIFY",
            Self::Delete => "DELETE",
        };
        write!(f, "{label}")
    }
}

///
/// UpdateState
///
/// Pipeline progress of one update. `Indexed` and `Failed` are terminal.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum UpdateState {
    Received,
    Prepared,
    Authenticated,
    Validated,
    Persisted,
    Indexed,
    Failed,
}

impl UpdateState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Indexed | Self::Failed)
    }

    /// Successor on the success path; `None` for terminal states.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::Prepared),
            Self::Prepared => Some(Self::Authenticated),
            Self::Authenticated => Some(Self::Validated),
            Self::Validated => Some(Self::Persisted),
            Self::Persisted => Some(Self::Indexed),
            Self::Indexed | Self::Failed => None,
        }
    }

    /// Any non-terminal state may fail; otherwise only the successor is reachable.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if to == Self::Failed {
            return !self.is_terminal();
        }

        self.next() == Some(to)
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Received => "RECEIVED",
            Self::Prepared => "PREPARED",
            Self::Authenticated => "AUTHENTICATED",
            Self::Validated => "VALIDATED",
            Self::Persisted => "PERSISTED",
            Self::Indexed => "INDEXED",
            Self::Failed => "FAILED",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::UpdateState;

    #[test]
    fn states_advance_in_order_and_fail_from_anywhere_non_terminal() {
        let mut state = UpdateState::Received;
        let mut path = vec![state];
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            assert!(state.can_transition_to(UpdateState::Failed));
            state = next;
            path.push(state);
        }

        assert_eq!(path.last(), Some(&UpdateState::Indexed));
        assert_eq!(path.len(), 6);
        assert!(!UpdateState::Indexed.can_transition_to(UpdateState::Failed));
        assert!(!UpdateState::Failed.can_transition_to(UpdateState::Prepared));
        assert!(!UpdateState::Prepared.can_transition_to(UpdateState::Validated));
    }
}
