//! Global lifecycle stages shared by every hosted service.

use std::fmt;

/// Stage of a [`crate::ServiceHost`].
///
/// Stages only ever advance, one step per call to
/// [`crate::ServiceHost::run_next_lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleStage {
    /// Services are constructed but no hook has run.
    NotInitialized,
    /// Services loaded their own state.
    PreInitialized,
    /// Services are queryable by their dependents.
    Initialized,
    /// Cross-service subscriptions are wired.
    PostInitialized,
    /// Services released their resources.
    Terminated,
}

impl LifecycleStage {
    /// Stage entered by the next transition, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::NotInitialized => Some(Self::PreInitialized),
            Self::PreInitialized => Some(Self::Initialized),
            Self::Initialized => Some(Self::PostInitialized),
            Self::PostInitialized => Some(Self::Terminated),
            Self::Terminated => None,
        }
    }

    /// Returns `true` for the stages in which dependents may be resolved.
    #[must_use]
    pub const fn is_initialized(self) -> bool {
        matches!(self, Self::Initialized | Self::PostInitialized)
    }

    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::NotInitialized => 0,
            Self::PreInitialized => 1,
            Self::Initialized => 2,
            Self::PostInitialized => 3,
            Self::Terminated => 4,
        }
    }

    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotInitialized,
            1 => Self::PreInitialized,
            2 => Self::Initialized,
            3 => Self::PostInitialized,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotInitialized => "not_initialized",
            Self::PreInitialized => "pre_initialized",
            Self::Initialized => "initialized",
            Self::PostInitialized => "post_initialized",
            Self::Terminated => "terminated",
        };
        formatter.write_str(label)
    }
}
