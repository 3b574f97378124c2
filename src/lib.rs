pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod geojson;
pub mod intake;
pub mod location;
pub mod observability;
pub mod orchestrator;
pub mod pool;
pub mod record;
pub mod region;
pub mod schema;
pub mod splitter;
pub mod writer;

pub use config::Config;
pub use error::{Error, Result};
pub use orchestrator::{BatchReport, Extractor, RunFailure, RunSummary, Stage};
