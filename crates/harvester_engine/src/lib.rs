//! Harvester engine: fetching, extraction, durable progress and result files,
//! and the effect-executing run loop.
mod decode;
mod extract;
mod fetch;
mod harvest;
mod ledger;
mod persist;
mod retry;
mod sink;
mod store;
mod text;
mod types;

pub use decode::{decode_forced, resolve_encoding, DecodeError, DecodedHtml};
pub use extract::{
    BodyText, ContainerText, Extraction, ExtractionFailure, ExtractorConfig, RecordExtractor,
    SectionStrategy, SelectorError, StructuredSections,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use harvest::{HarvestError, HarvestSettings, Harvester};
pub use ledger::{read_entries, LedgerError, ProgressLedger};
pub use persist::{ensure_parent_dir, AtomicFileWriter, PersistError};
pub use retry::{fetch_page, FetchReport};
pub use sink::{HarvestSink, LogSink};
pub use store::{LoadStatus, ResultStore};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestEvent};

/// Re-exported so callers can pass cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;
