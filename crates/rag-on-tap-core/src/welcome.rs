use serde::{Deserialize, Serialize};

/// First-run welcome modal. Moves one way only: unseen, then seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WelcomeState {
    #[default]
    Unseen,
    Seen,
}

impl WelcomeState {
    pub fn is_open(self) -> bool {
        self == WelcomeState::Unseen
    }

    pub fn dismiss(self) -> WelcomeState {
        WelcomeState::Seen
    }
}
