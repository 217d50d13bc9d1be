//! Role and ownership based access rules for owned collections.
//!
//! [`evaluate`] is a pure function of the requester and the operation. It
//! says nothing about how a store filters records; the database layer turns
//! a [`Decision`] into a store filter.

use super::models::{Identity, Role};

/// Operations on an owned collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Every record is in scope.
    AllowAll,
    /// Only records whose `owner` equals this id are in scope.
    AllowOwned(String),
    Deny,
}

impl Decision {
    /// Whether a record owned by `owner` is in scope.
    pub fn permits(&self, owner: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::AllowOwned(id) => id == owner,
            Self::Deny => false,
        }
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Deny)
    }
}

/// Access decision for `op` by `requester`.
///
/// Unauthenticated requesters are denied everything. Any authenticated
/// requester may create; ownership of new records is stamped separately.
/// Admins see and modify everything; other users only what they own.
pub fn evaluate(requester: Option<&Identity>, op: Operation) -> Decision {
    let Some(identity) = requester else {
        return Decision::Deny;
    };
    match (op, identity.role) {
        (Operation::Create, _) | (_, Role::Admin) => Decision::AllowAll,
        (Operation::Read | Operation::Update | Operation::Delete, Role::User) => {
            Decision::AllowOwned(identity.id.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPS: [Operation; 4] = [
        Operation::Create,
        Operation::Read,
        Operation::Update,
        Operation::Delete,
    ];

    fn identity(id: &str, role: Role) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{id}@example.com"),
            role,
        }
    }

    #[test]
    fn test_unauthenticated_is_denied_everything() {
        for op in OPS {
            assert_eq!(evaluate(None, op), Decision::Deny);
        }
    }

    #[test]
    fn test_user_is_scoped_to_own_records() {
        let u1 = identity("u1", Role::User);
        for op in [Operation::Read, Operation::Update, Operation::Delete] {
            let decision = evaluate(Some(&u1), op);
            assert!(decision.permits("u1"), "{} own", op.as_str());
            assert!(!decision.permits("u2"), "{} foreign", op.as_str());
        }
    }

    #[test]
    fn test_admin_is_allowed_everything() {
        let admin = identity("a", Role::Admin);
        for op in OPS {
            let decision = evaluate(Some(&admin), op);
            assert_eq!(decision, Decision::AllowAll);
            assert!(decision.permits("anyone"));
        }
    }

    #[test]
    fn test_any_user_may_create() {
        let u1 = identity("u1", Role::User);
        assert_eq!(evaluate(Some(&u1), Operation::Create), Decision::AllowAll);
    }

    #[test]
    fn test_decision_follows_current_role() {
        let mut who = identity("u1", Role::User);
        assert!(!evaluate(Some(&who), Operation::Read).permits("u2"));
        who.role = Role::Admin;
        assert!(evaluate(Some(&who), Operation::Read).permits("u2"));
    }
}
