//! Observable loading state

use crate::aggregator::Aggregate;
use std::fmt;
use std::time::Duration;

/// Lifecycle of the orchestrator's current (or last) run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadingStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
    Canceled,
    Failed(String),
}

impl LoadingStatus {
    /// Whether the run has reached an end state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadingStatus::Completed | LoadingStatus::Canceled | LoadingStatus::Failed(_)
        )
    }
}

/// What a presentation layer renders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingState {
    pub status: LoadingStatus,

    /// Latest published aggregate
    pub users: Aggregate,

    /// Time since the run started, as of the last update
    pub elapsed: Duration,
}

impl LoadingState {
    /// A new run may be started
    pub fn can_start(&self) -> bool {
        self.status != LoadingStatus::InProgress
    }

    /// The current run may be cancelled
    pub fn can_cancel(&self) -> bool {
        self.status == LoadingStatus::InProgress
    }

    /// Human-readable status line
    pub fn status_text(&self) -> String {
        let time = format_elapsed(self.elapsed);
        match &self.status {
            LoadingStatus::NotStarted => "Loading status: not started".to_string(),
            LoadingStatus::InProgress => format!("Loading status: in progress {}", time),
            LoadingStatus::Completed => format!("Loading status: completed in {}", time),
            LoadingStatus::Canceled => "Loading status: canceled".to_string(),
            LoadingStatus::Failed(message) => format!("Loading status: failed ({})", message),
        }
    }
}

/// `1.2 sec`, or nothing before the first update
fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis == 0 {
        String::new()
    } else {
        format!("{}.{} sec", millis / 1000, millis % 1000 / 100)
    }
}

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(Aggregate),
    Canceled,
    Failed(String),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Completed(users) => write!(f, "completed with {} contributors", users.len()),
            RunOutcome::Canceled => write!(f, "canceled"),
            RunOutcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text() {
        let mut state = LoadingState::default();
        assert_eq!(state.status_text(), "Loading status: not started");

        state.status = LoadingStatus::InProgress;
        state.elapsed = Duration::from_millis(2250);
        assert_eq!(state.status_text(), "Loading status: in progress 2.2 sec");

        state.status = LoadingStatus::Completed;
        assert_eq!(state.status_text(), "Loading status: completed in 2.2 sec");

        state.status = LoadingStatus::Canceled;
        assert_eq!(state.status_text(), "Loading status: canceled");
    }

    #[test]
    fn test_start_and_cancel_availability() {
        let mut state = LoadingState::default();
        assert!(state.can_start());
        assert!(!state.can_cancel());

        state.status = LoadingStatus::InProgress;
        assert!(!state.can_start());
        assert!(state.can_cancel());

        state.status = LoadingStatus::Failed("boom".to_string());
        assert!(state.can_start());
        assert!(state.status.is_terminal());
    }
}
