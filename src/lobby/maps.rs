//! Map Catalog
//!
//! Map geometry lives with the client. The server only needs to know which
//! ids exist and which one a new lobby starts on.

use serde::Serialize;

/// Catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapInfo {
    /// Stable map id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

/// Canonical map list. The first entry is the default for new lobbies.
pub const ALL_MAPS: &[MapInfo] = &[
    MapInfo {
        id: "grasslands",
        name: "Grasslands",
        description: "A winding path through open fields",
    },
    MapInfo {
        id: "fortress",
        name: "Fortress",
        description: "Enemies approach from two sides",
    },
];

/// Whether `id` names a map in the catalog.
pub fn map_exists(id: &str) -> bool {
    ALL_MAPS.iter().any(|m| m.id == id)
}

/// Map a freshly created lobby selects.
pub fn default_map_id() -> &'static str {
    ALL_MAPS[0].id
}

/// Look up a map by id.
pub fn map_by_id(id: &str) -> Option<&'static MapInfo> {
    ALL_MAPS.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert!(map_exists("grasslands"));
        assert!(map_exists("fortress"));
        assert!(!map_exists("moon"));
        assert_eq!(default_map_id(), "grasslands");
        assert_eq!(map_by_id("fortress").map(|m| m.name), Some("Fortress"));
    }
}
