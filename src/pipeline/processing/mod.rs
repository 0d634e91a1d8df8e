// Pipeline processing: flatten source appointments, then add derived columns

pub mod enrich;
pub mod flatten;

pub use enrich::{DefaultEnricher, EnrichedBatch, Enricher};
pub use flatten::{flatten, flatten_all, FieldPaths};
