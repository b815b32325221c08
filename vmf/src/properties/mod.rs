use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shipyard::Component;

use crate::Output;

// Properties
#[derive(Debug, Component, Clone, Serialize, Deserialize)]
pub struct PropClassName(pub String);

impl PropClassName {
    pub fn is(&self, classname: &str) -> bool {
        self.0.eq_ignore_ascii_case(classname)
    }
}

// Entities without a targetname get an empty one, so every entity is reachable by name
#[derive(Debug, Component, Clone, Serialize, Deserialize)]
pub struct PropTargetName(pub String);

impl PropTargetName {
    // Full Unicode lowercasing, names are not always ASCII
    pub fn matches(&self, name: &str) -> bool {
        self.0 == name || self.0.to_lowercase() == name.to_lowercase()
    }
}

///
/// PropKeyValues
///
/// The raw keyvalues of an entity. Keys are stored lowercased, values untouched.
#[derive(Debug, Component, Clone, Default, Serialize, Deserialize)]
pub struct PropKeyValues {
    values: HashMap<String, String>,
}

impl PropKeyValues {
    pub fn from_map(map: &HashMap<String, String>) -> PropKeyValues {
        let values = map
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_owned()))
            .collect();
        PropKeyValues { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(&key.to_ascii_lowercase())
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values
            .insert(key.to_ascii_lowercase(), value.to_owned());
    }

    pub fn to_map(&self) -> HashMap<String, String> {
        self.values.clone()
    }
}

// Connections
#[derive(Debug, Component, Clone, Default, Serialize, Deserialize)]
pub struct Outputs {
    pub outputs: Vec<Output>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyvalues_are_case_insensitive() {
        let mut map = HashMap::new();
        map.insert("Ctrl_Value".to_owned(), "0".to_owned());
        let mut kv = PropKeyValues::from_map(&map);

        assert_eq!(kv.get("ctrl_value"), Some("0"));
        assert!(kv.contains("CTRL_VALUE"));
        assert!(!kv.contains("ctrl_type"));

        kv.set("Delay", "2");
        assert_eq!(kv.get("delay"), Some("2"));
    }

    #[test]
    fn test_targetname_matches_unicode_case() {
        let name = PropTargetName("Tür_Relay".to_owned());
        assert!(name.matches("TÜR_RELAY"));
        assert!(name.matches("tür_relay"));
        assert!(!name.matches("tur_relay"));
    }

    #[test]
    fn test_classname_comparison() {
        let class = PropClassName("Comp_Relay".to_owned());
        assert!(class.is("comp_relay"));
        assert!(!class.is("logic_relay"));
    }
}
