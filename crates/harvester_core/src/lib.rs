//! Harvester core: identifiers, records, and the pure per-identifier state machines.
mod effect;
mod id;
mod locator;
mod msg;
mod record;
mod retry;
mod state;
mod summary;
mod update;

pub use effect::Effect;
pub use id::{compare_keys, IdError, IdRange, Identifier};
pub use locator::{LocatorError, SourceLocator};
pub use msg::Msg;
pub use record::{HarvestedRecord, PageOutcome, PageResult};
pub use retry::{RetryEvent, RetryPolicy, RetryState};
pub use state::{FailurePolicy, RunSettings, RunState};
pub use summary::RunSummary;
pub use update::update;
