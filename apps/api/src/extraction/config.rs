use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::extraction::types::{FieldType, StrategyType};

/// Declared fallback priority per field.
///
/// Built once at startup and read-only afterwards. Order inside each list is
/// the order the coordinator tries extractors in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(flatten)]
    preferences: HashMap<FieldType, Vec<StrategyType>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let preferences = HashMap::from([
            (
                FieldType::Name,
                vec![StrategyType::Entity, StrategyType::Generative],
            ),
            (
                FieldType::Email,
                vec![
                    StrategyType::Pattern,
                    StrategyType::Entity,
                    StrategyType::Generative,
                ],
            ),
            (
                FieldType::Skills,
                vec![StrategyType::Generative, StrategyType::Entity],
            ),
        ]);
        Self { preferences }
    }
}

impl ExtractionConfig {
    pub fn new(preferences: HashMap<FieldType, Vec<StrategyType>>) -> Self {
        Self { preferences }
    }

    /// Strategy order for `field`; empty when the field was never declared.
    pub fn strategies_for(&self, field: FieldType) -> &[StrategyType] {
        self.preferences
            .get(&field)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Replaces one field's list, leaving the others alone.
    pub fn with_override(mut self, field: FieldType, strategies: Vec<StrategyType>) -> Self {
        self.preferences.insert(field, strategies);
        self
    }
}
