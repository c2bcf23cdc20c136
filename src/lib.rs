//! Eyegaze Flux - Eye-tracking session log parser and derived-metrics engine
//!
//! Flux turns the plain-text logs of an eye-tracking study into a typed,
//! immutable corpus through a deterministic pipeline: metadata table →
//! per-slot fetch → line adaptation → corpus indexing. Derived metrics
//! (time windows, bubble scaling, radar normalization) are pure functions
//! over the corpus.
//!
//! ## Modules
//!
//! - **Adapters**: Parse fixation and event lines into typed records
//! - **Pipeline**: Load a corpus from a data source with a per-slot report
//! - **Metrics**: Windowing, scaling and normalization over loaded records

pub mod adapters;
pub mod config;
pub mod corpus;
pub mod error;
pub mod generated;
pub mod metadata;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod source;
pub mod types;

pub use config::LoaderConfig;
pub use corpus::{Corpus, CorpusStore};
pub use error::GazeError;
pub use pipeline::{load, load_from_config, CorpusLoader, LoadOutcome, LoadReport};
pub use source::{DataSource, FsSource, MemorySource, SlotKey};

// Line-level parse entry points
pub use adapters::{parse_event_line, parse_fixation_line};
pub use generated::parse_generated_line;

/// Flux version reported by the CLI
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "eyegaze-flux";
