use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use engine_logging::{LogDestination, LogSettings};
use harvester_core::{FailurePolicy, IdRange, RetryPolicy, RunSettings, SourceLocator};
use harvester_engine::{
    resolve_encoding, ExtractorConfig, FetchSettings, HarvestSettings, RecordExtractor,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "harvester.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::File => LogDestination::File,
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

/// On-disk configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub locator_template: String,
    pub start: u32,
    pub end: u32,
    pub id_width: u8,
    pub delay_ms: u64,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_bytes: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub encoding: String,
    pub checkpoint_every: usize,
    pub min_body_chars: usize,
    pub failure_policy: FailurePolicy,
    pub section_selector: String,
    pub heading_selector: String,
    pub title_marker_selector: String,
    pub container_selector: String,
    pub ledger_path: PathBuf,
    pub output_path: PathBuf,
    pub log_file: PathBuf,
    pub log_destination: LogTarget,
    pub log_level: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        let extractor = ExtractorConfig::default();
        Self {
            locator_template: "https://nanyo-city.jpn.org/prompt/{id}.html".to_string(),
            start: 1,
            end: 999,
            id_width: 3,
            delay_ms: 1000,
            request_timeout_secs: fetch.request_timeout.as_secs(),
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            max_bytes: fetch.max_bytes,
            max_retries: 2,
            retry_backoff_ms: 2000,
            user_agent: fetch.user_agent,
            accept_language: fetch.accept_language,
            encoding: "utf-8".to_string(),
            checkpoint_every: 50,
            min_body_chars: extractor.min_body_chars,
            failure_policy: FailurePolicy::MarkDone,
            section_selector: extractor.section_selector,
            heading_selector: extractor.heading_selector,
            title_marker_selector: extractor.title_marker_selector,
            container_selector: extractor.container_selector,
            ledger_path: PathBuf::from("progress.log"),
            output_path: PathBuf::from("data/prompts.json"),
            log_file: PathBuf::from("crawler.log"),
            log_destination: LogTarget::Both,
            log_level: "info".to_string(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Progress ledger file
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    /// Result file (JSON array of records)
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,

    /// Where log lines go
    #[arg(long, global = true, value_enum)]
    pub log: Option<LogTarget>,
}

/// Range and pacing overrides accepted by `run`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunOverrides {
    /// First identifier number
    #[arg(long)]
    pub start: Option<u32>,

    /// Last identifier number (inclusive)
    #[arg(long)]
    pub end: Option<u32>,

    /// Milliseconds to wait after each fetched identifier
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Leave identifiers whose retries were exhausted out of the ledger
    #[arg(long)]
    pub retry_failed_next_run: bool,
}

impl HarvestConfig {
    /// Read `path`, or [`DEFAULT_CONFIG_FILE`] when present, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        ron::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(ledger) = &overrides.ledger {
            self.ledger_path = ledger.clone();
        }
        if let Some(output) = &overrides.output {
            self.output_path = output.clone();
        }
        if let Some(log) = overrides.log {
            self.log_destination = log;
        }
        self
    }

    pub fn apply_run(mut self, overrides: &RunOverrides) -> Self {
        if let Some(start) = overrides.start {
            self.start = start;
        }
        if let Some(end) = overrides.end {
            self.end = end;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.delay_ms = delay_ms;
        }
        if overrides.retry_failed_next_run {
            self.failure_policy = FailurePolicy::RetryNextRun;
        }
        self
    }

    pub fn range(&self) -> Result<IdRange> {
        IdRange::new(self.start, self.end, self.id_width).context("invalid identifier range")
    }

    pub fn log_settings(&self) -> Result<LogSettings> {
        let level = LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("unknown log level {:?}", self.log_level))?;
        Ok(LogSettings {
            destination: self.log_destination.into(),
            file: self.log_file.clone(),
            level,
        })
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            section_selector: self.section_selector.clone(),
            heading_selector: self.heading_selector.clone(),
            title_marker_selector: self.title_marker_selector.clone(),
            container_selector: self.container_selector.clone(),
            min_body_chars: self.min_body_chars,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone(),
            accept_language: self.accept_language.clone(),
            ..FetchSettings::default()
        }
    }

    /// Validate everything a run needs and build its parts.
    pub fn plan(&self) -> Result<RunPlan> {
        let range = self.range()?;
        let locator = SourceLocator::new(self.locator_template.clone())
            .context("invalid locator template")?;
        let extractor =
            RecordExtractor::new(&self.extractor_config()).context("invalid extractor selector")?;
        let encoding = resolve_encoding(&self.encoding)?;
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        let harvest = HarvestSettings {
            delay: Duration::from_millis(self.delay_ms),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                backoff: Duration::from_millis(self.retry_backoff_ms),
            },
            run: RunSettings {
                checkpoint_every: self.checkpoint_every,
                failure_policy: self.failure_policy,
            },
            encoding,
        };

        Ok(RunPlan {
            range,
            locator,
            extractor,
            fetch: self.fetch_settings(),
            harvest,
            ledger_path: self.ledger_path.clone(),
            output_path: self.output_path.clone(),
        })
    }
}

/// Validated parts of a harvest run.
pub struct RunPlan {
    pub range: IdRange,
    pub locator: SourceLocator,
    pub extractor: RecordExtractor,
    pub fetch: FetchSettings,
    pub harvest: HarvestSettings,
    pub ledger_path: PathBuf,
    pub output_path: PathBuf,
}
