//! Identifiers
//!
//! Players are keyed by their connection handle; lobbies by a generated id.
//! Both are opaque strings on the wire.

/// Opaque, stable per-connection handle. Doubles as the player id.
pub type PlayerId = String;

/// Lobby identifier.
pub type LobbyId = String;

/// Generate a fresh id of the form `<prefix>_<12 hex chars>`.
pub fn generate_id(prefix: &str) -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &simple[..12])
}

/// Generate a connection id.
pub fn connection_id() -> PlayerId {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_prefix() {
        let id = generate_id("lobby");
        assert!(id.starts_with("lobby_"));
        assert_eq!(id.len(), "lobby_".len() + 12);
    }

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id("lobby"), generate_id("lobby"));
        assert_ne!(connection_id(), connection_id());
    }
}
