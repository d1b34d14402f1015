use crate::{Identifier, PageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Seed the set of identifiers already present in the persisted result file.
    RestoreHarvested(Vec<String>),
    /// The ledger says this identifier needs no further attempt.
    Skipped(Identifier),
    /// One identifier went through fetch and extraction.
    PageProcessed { id: Identifier, result: PageResult },
    /// Every identifier in the range has been visited.
    RangeFinished,
    /// The run was cancelled between identifiers.
    Interrupted,
}
