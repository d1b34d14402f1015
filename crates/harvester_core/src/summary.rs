use std::fmt;

/// End-of-run counters. `fetched` counts records appended this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub extraction_failed: usize,
    pub duplicates: usize,
    pub errored: usize,
    pub checkpoints: usize,
    pub interrupted: bool,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed={} skipped={} fetched={} not_found={} extraction_failed={} duplicates={} errored={}",
            self.processed,
            self.skipped,
            self.fetched,
            self.not_found,
            self.extraction_failed,
            self.duplicates,
            self.errored
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        Ok(())
    }
}
