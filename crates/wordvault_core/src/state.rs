//! Facade lifecycle state machine and health records.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a word store facade.
///
/// ```text
/// New ──► Opening ──► Open ──► Closed
///              │                 ▲
///              └─────────────────┘   (validation / I-O failure)
/// ```
///
/// `Closed` is terminal for the process; a closed store is re-opened
/// only on the next start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StoreState {
    /// Constructed, not yet opened.
    New = 0,
    /// Validation or ingestion in progress.
    Opening = 1,
    /// Serving queries.
    Open = 2,
    /// Shut down or failed to open. Terminal.
    Closed = 3,
}

impl StoreState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::New,
            1 => Self::Opening,
            2 => Self::Open,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for StoreState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::New => "NEW",
            Self::Opening => "OPENING",
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        };
        f.write_str(name)
    }
}

/// Atomic holder for a [`StoreState`] with explicit transitions.
///
/// Single writer, many readers: only the owning facade calls
/// [`StateCell::transition`]; query threads read concurrently.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Creates a cell in the `New` state.
    #[must_use]
    pub fn new() -> Self {
        Self(AtomicU8::new(StoreState::New as u8))
    }

    /// Returns the current state.
    #[must_use]
    pub fn get(&self) -> StoreState {
        StoreState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves from `from` to `to`; returns false if the current state
    /// was not `from`. `Closed` has no outgoing transitions.
    pub fn transition(&self, from: StoreState, to: StoreState) -> bool {
        if from == StoreState::Closed {
            return false;
        }
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Forces the state to `Closed` regardless of the current state.
    pub fn close(&self) {
        self.0.store(StoreState::Closed as u8, Ordering::Release);
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Severity of a health record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthSeverity {
    /// Operating normally.
    Ok,
    /// Degraded but functional (e.g. still opening).
    Caution,
    /// Unavailable.
    Warn,
}

/// Structured health report for the owning application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthRecord {
    /// Severity of the report.
    pub severity: HealthSeverity,
    /// Human-readable detail.
    pub message: String,
}

impl HealthRecord {
    /// Creates a health record.
    #[must_use]
    pub fn new(severity: HealthSeverity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}
