use core::fmt;
use portable_atomic::{AtomicU8, Ordering};

/// Lifecycle of one pipeline run.
///
/// States only move forward:
/// `Idle -> Running -> Draining -> Cancelling -> Terminated`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PipelineState {
    /// Constructed, not started.
    Idle = 0,
    /// Stage tasks are being spawned and wired.
    Running = 1,
    /// The bounded take output is being consumed.
    Draining = 2,
    /// The cancellation signal fired; waiting for stage tasks to exit.
    Cancelling = 3,
    /// Every stage task has returned.
    Terminated = 4,
}

impl PipelineState {
    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            3 => Self::Cancelling,
            _ => Self::Terminated,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Draining => write!(f, "draining"),
            Self::Cancelling => write!(f, "cancelling"),
            Self::Terminated => write!(f, "terminated"),
        }
    }
}

/// Shared, lock-free holder of a [`PipelineState`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl Default for StateCell {
    fn default() -> Self {
        Self(AtomicU8::new(PipelineState::Idle as u8))
    }
}

impl StateCell {
    pub(crate) fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` unless the cell is already at or past it.
    pub(crate) fn advance(&self, next: PipelineState) {
        self.0.fetch_max(next as u8, Ordering::AcqRel);
    }
}
