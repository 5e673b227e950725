use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a bill.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// bill IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillId(Uuid);

impl BillId {
    /// Creates a new random bill ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a bill ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a bill ID from its hyphenated string form.
    pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl Default for BillId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BillId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for BillId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<BillId> for Uuid {
    fn from(id: BillId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bill_id_new_creates_unique_ids() {
        let id1 = BillId::new();
        let id2 = BillId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn bill_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = BillId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn bill_id_parse_accepts_display_form() {
        let id = BillId::new();
        let parsed = BillId::parse(&id.to_string()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn bill_id_parse_rejects_garbage() {
        assert!(BillId::parse("not-a-bill").is_err());
    }

    #[test]
    fn bill_id_serializes_as_plain_string() {
        let id = BillId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
