use crate::{HarvestedRecord, Identifier};

/// Side effects requested by [`crate::update`], executed in order by the engine.
///
/// A failed `Append`, `MarkCompleted`, `Checkpoint` or `Finalize` aborts the run;
/// effects after it must not be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Add a new record to the in-memory result set.
    Append(HarvestedRecord),
    /// Durably record the identifier in the progress ledger.
    MarkCompleted(Identifier),
    /// Write the full result set to stable storage.
    Checkpoint,
    /// Sort the result set by identifier and write it a last time.
    Finalize,
    /// Politeness delay before the next identifier.
    Pause,
}
