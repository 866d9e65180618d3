use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a technology node in the catalog, e.g. `"reinforced_mandibles"`.
///
/// Ordered so that sets of active technologies iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TechId(pub String);

/// Identifies the colony whose upgrades an engine session tracks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColonyId(pub String);

impl TechId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ColonyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TechId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ColonyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TechId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TechId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ColonyId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ColonyId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tech_id_equality() {
        let a = TechId::from("mandibles");
        let b = TechId::new("mandibles".to_string());
        let c = TechId::from("antennae");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn ids_are_ordered() {
        let mut ids = vec![TechId::from("c"), TechId::from("a"), TechId::from("b")];
        ids.sort();
        assert_eq!(ids, vec![TechId::from("a"), TechId::from("b"), TechId::from("c")]);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&TechId::from("armor")).unwrap();
        assert_eq!(json, "\"armor\"");

        let colony: ColonyId = serde_json::from_str("\"colony-7\"").unwrap();
        assert_eq!(colony.as_str(), "colony-7");
        assert_eq!(colony.to_string(), "colony-7");
    }
}
