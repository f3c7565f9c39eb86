//! Revoked token set.
//!
//! Tokens blacklisted by logout stay revoked until process restart or an
//! explicit security reset. Membership is checked before any signature
//! validation so a revoked token is refused even if it would otherwise
//! still verify.

use dashmap::DashSet;

#[derive(Default)]
pub struct RevocationList {
    tokens: DashSet<String>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, token: String) {
        self.tokens.insert(token);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Drop all revocations (security reset).
    pub fn clear(&self) {
        self.tokens.clear();
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_and_check() {
        let list = RevocationList::new();
        assert!(!list.is_revoked("tok-a"));

        list.revoke("tok-a".to_string());
        assert!(list.is_revoked("tok-a"));
        assert!(!list.is_revoked("tok-b"));

        // Revoking twice is harmless.
        list.revoke("tok-a".to_string());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_clear() {
        let list = RevocationList::new();
        list.revoke("tok-a".to_string());
        list.revoke("tok-b".to_string());

        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_revoked("tok-a"));
    }
}
