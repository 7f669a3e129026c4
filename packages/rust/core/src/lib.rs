//! VTC Finder pipelines: directory skeleton, event-driven enrichment,
//! region/language tagging, and catalog filtering.

pub mod directory;
pub mod enrich;
pub mod filter;
pub mod progress;
pub mod tagger;

pub use progress::{ProgressReporter, SilentProgress};
