use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Opaque 128-bit per-caller identity.
///
/// Issued by the gateway's cookie middleware and passed into the store as
/// an uninterpreted scoping key. The store never creates or validates
/// identities; it only indexes records by them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Issues a fresh random identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an identity from its 32-character hex form.
    pub fn from_hex(hex: &str) -> Option<Self> {
        Uuid::try_parse(hex).ok().map(Self)
    }

    /// Renders the identity as 32 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        self.0.simple().to_string()
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for UserId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let uid = UserId::random();
        let hex = uid.to_hex();
        assert_eq!(hex.len(), 32);
        assert_eq!(UserId::from_hex(&hex), Some(uid));
    }

    #[test]
    fn from_hex_rejects_garbage() {
        assert!(UserId::from_hex("not-a-uuid").is_none());
        assert!(UserId::from_hex("").is_none());
    }
}
