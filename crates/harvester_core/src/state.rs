use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Identifier, RunSummary};

/// What to do with an identifier whose fetch exhausted its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Mark it in the ledger. The run always moves forward, but the identifier
    /// is not revisited until an operator removes its ledger entry.
    #[default]
    MarkDone,
    /// Leave it out of the ledger so the next run tries it again.
    RetryNextRun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Checkpoint after this many newly appended records.
    pub checkpoint_every: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            checkpoint_every: 50,
            failure_policy: FailurePolicy::MarkDone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
    settings: RunSettings,
    known: BTreeSet<String>,
    /// Appended identifiers whose ledger mark waits for the next checkpoint.
    unmarked: Vec<Identifier>,
    since_checkpoint: usize,
    summary: RunSummary,
    finished: bool,
}

impl RunState {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_known(&self, key: &str) -> bool {
        self.known.contains(key)
    }

    pub fn pending_marks(&self) -> &[Identifier] {
        &self.unmarked
    }

    pub(crate) fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    pub(crate) fn restore(&mut self, keys: Vec<String>) {
        self.known.extend(keys);
    }

    /// Returns false if the key was already present.
    pub(crate) fn remember(&mut self, key: String) -> bool {
        self.known.insert(key)
    }

    /// Registers an appended identifier; true when a checkpoint is due.
    pub(crate) fn record_append(&mut self, id: Identifier) -> bool {
        self.unmarked.push(id);
        self.since_checkpoint += 1;
        self.since_checkpoint >= self.settings.checkpoint_every.max(1)
    }

    pub(crate) fn take_unmarked(&mut self) -> Vec<Identifier> {
        self.since_checkpoint = 0;
        std::mem::take(&mut self.unmarked)
    }

    pub(crate) fn finish(&mut self, interrupted: bool) {
        self.finished = true;
        self.summary.interrupted = interrupted;
    }
}
