//! Loading orchestration
//!
//! Starts one loading run at a time, publishes its progress as a
//! [`LoadingState`] and supports cooperative cancellation.
//!
//! # Example
//!
//! ```no_run
//! use contributors::config::FetchConfig;
//! use contributors::model::RequestData;
//! use contributors::orchestrator::Orchestrator;
//! use contributors::strategy::StrategyKind;
//!
//! # async fn example() -> contributors::Result<()> {
//! let orchestrator = Orchestrator::github(FetchConfig::default());
//! let req = RequestData::new("octocat", "ghp_token", "kotlin")?;
//!
//! let handle = orchestrator.start(req, StrategyKind::Progress)?;
//! let mut updates = orchestrator.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     println!("{}", state.status_text());
//!     if state.status.is_terminal() {
//!         break;
//!     }
//! }
//! let outcome = handle.wait().await;
//! # Ok(())
//! # }
//! ```

mod loader;
mod state;

pub use loader::{Orchestrator, RunHandle, SourceFactory};
pub use state::{LoadingState, LoadingStatus, RunOutcome};
