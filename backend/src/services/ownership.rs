//! Ownership binding for owned records.
//!
//! The `owner` of a new record is always the verified requester; whatever the
//! client sent is discarded. Patches never carry an `owner`.

use serde_json::Value;
use walletfolio_adapters::Document;

use crate::auth::Identity;

pub const OWNER_FIELD: &str = "owner";

/// Stamps `identity` as the owner of an outgoing create.
pub fn bind_owner(doc: &mut Document, identity: &Identity) {
    if let Some(previous) = doc.insert(OWNER_FIELD.to_string(), Value::String(identity.id.clone())) {
        if previous.as_str() != Some(identity.id.as_str()) {
            tracing::debug!(user_id = %identity.id, "discarded client-supplied owner");
        }
    }
}

/// Removes any `owner` from an update patch.
pub fn strip_owner(patch: &mut Document) {
    if patch.remove(OWNER_FIELD).is_some() {
        tracing::debug!("ignored owner in update patch");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use serde_json::json;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.into(),
            email: format!("{id}@example.com"),
            role: Role::User,
        }
    }

    #[test]
    fn test_bind_owner_overrides_client_value() {
        let mut doc = json!({"address": "0xabc", "owner": "X"})
            .as_object()
            .cloned()
            .unwrap();
        bind_owner(&mut doc, &identity("Y"));
        assert_eq!(doc["owner"], "Y");
        assert_eq!(doc["address"], "0xabc");
    }

    #[test]
    fn test_bind_owner_sets_missing_value() {
        let mut doc = Document::new();
        bind_owner(&mut doc, &identity("Y"));
        assert_eq!(doc["owner"], "Y");
    }

    #[test]
    fn test_strip_owner() {
        let mut patch = json!({"notes": "cold", "owner": "X"})
            .as_object()
            .cloned()
            .unwrap();
        strip_owner(&mut patch);
        assert!(!patch.contains_key("owner"));
        assert_eq!(patch["notes"], "cold");
    }
}
