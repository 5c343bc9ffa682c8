//! Action Status
//!
//! Every user action (pay, add card) moves through
//! `Idle -> Loading -> {Success, Error}`. Terminal states stay put until
//! something calls [`Status::reset`].

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Whether the user may start an action (forms are enabled)
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// `Idle -> Loading`
    pub fn start(self) -> Result<Self> {
        self.transition(Self::Loading)
    }

    /// `Loading -> Success`
    pub fn succeed(self) -> Result<Self> {
        self.transition(Self::Success)
    }

    /// `Loading -> Error`
    pub fn fail(self) -> Result<Self> {
        self.transition(Self::Error)
    }

    /// Start a repeatable action: `Idle` or a finished state goes to `Loading`,
    /// an action already in flight is refused
    pub fn restart(self) -> Result<Self> {
        if self.is_terminal() {
            self.reset().start()
        } else {
            self.start()
        }
    }

    /// Back to `Idle` from any state
    #[must_use]
    pub const fn reset(self) -> Self {
        Self::Idle
    }

    /// Apply a transition, rejecting anything outside the state machine
    pub fn transition(self, to: Self) -> Result<Self> {
        let allowed = matches!(
            (self, to),
            (Self::Idle, Self::Loading) | (Self::Loading, Self::Success | Self::Error)
        );
        if allowed {
            Ok(to)
        } else {
            Err(CoreError::InvalidTransition { from: self, to })
        }
    }

    /// Settle a finished action
    pub fn finish<T, E>(self, outcome: &std::result::Result<T, E>) -> Result<Self> {
        match outcome {
            Ok(_) => self.succeed(),
            Err(_) => self.fail(),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
