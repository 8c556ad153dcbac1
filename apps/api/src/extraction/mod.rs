//! Field extraction engine: strategies, field extractors, the factory that
//! wires them, and the coordinator that runs each field's fallback chain.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod extractors;
pub mod factory;
pub mod strategies;
pub mod types;

pub use config::ExtractionConfig;
pub use coordinator::{ExtractionCoordinator, ExtractorChains};
pub use error::ExtractionError;
pub use extractors::{FieldExtractor, FieldValue};
pub use factory::{GeneratorSource, RecognizerSource, StrategyFactory};
pub use types::{FieldSpec, FieldType, ResultLimit, StrategyType};
