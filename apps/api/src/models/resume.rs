use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The aggregated result of one extraction call.
///
/// Every field may be missing independently; a record with nothing in it is a
/// valid outcome, not an error. The coordinator always fills `skills`, using
/// an empty list when nothing was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Option<Vec<String>>,
}

impl ResumeData {
    /// Plain mapping with keys in the order `name`, `email`, `skills`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), json_opt(self.name.clone()));
        map.insert("email".to_string(), json_opt(self.email.clone()));
        map.insert(
            "skills".to_string(),
            match &self.skills {
                Some(skills) => Value::Array(skills.iter().cloned().map(Value::String).collect()),
                None => Value::Null,
            },
        );
        map
    }

    /// Pretty-printed JSON with the same key order as [`ResumeData::to_map`].
    pub fn to_json(&self) -> String {
        // A map of strings, nulls and string arrays always serializes.
        serde_json::to_string_pretty(&Value::Object(self.to_map())).unwrap_or_default()
    }

    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.skills.as_ref().map_or(true, Vec::is_empty)
    }
}

fn json_opt(value: Option<String>) -> Value {
    value.map(Value::String).unwrap_or(Value::Null)
}

impl fmt::Display for ResumeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let skills = self
            .skills
            .as_ref()
            .map(|s| s.join(", "))
            .unwrap_or_default();
        write!(
            f,
            "ResumeData(name={}, email={}, skills=[{}])",
            self.name.as_deref().unwrap_or("-"),
            self.email.as_deref().unwrap_or("-"),
            skills
        )
    }
}
