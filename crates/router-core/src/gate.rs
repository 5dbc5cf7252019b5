//! The precondition gate run before every command invocation.

use crate::AccessLevel;

pub const DENY_REASON: &str = "insufficient permissions";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    Deny { reason: &'static str },
}

impl Authorization {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Compares a command's declared minimum level against the requester's
/// resolved level. The `permit_all` override short-circuits every check and
/// exists for local debugging only.
#[derive(Debug, Clone, Copy)]
pub struct PreconditionGate {
    permit_all: bool,
}

impl PreconditionGate {
    #[must_use]
    pub const fn new(permit_all: bool) -> Self {
        Self { permit_all }
    }

    #[must_use]
    pub const fn permits_all(self) -> bool {
        self.permit_all
    }

    #[must_use]
    pub fn authorize(self, required: AccessLevel, resolved: AccessLevel) -> Authorization {
        if self.permit_all || resolved >= required {
            Authorization::Allow
        } else {
            Authorization::Deny {
                reason: DENY_REASON,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: [AccessLevel; 6] = [
        AccessLevel::Blocked,
        AccessLevel::User,
        AccessLevel::ServerMod,
        AccessLevel::ServerAdmin,
        AccessLevel::ServerOwner,
        AccessLevel::BotOwner,
    ];

    #[test]
    fn allows_at_and_above_required() {
        let gate = PreconditionGate::new(false);
        assert!(
            gate.authorize(AccessLevel::ServerMod, AccessLevel::ServerMod)
                .is_allowed()
        );
        assert!(
            gate.authorize(AccessLevel::ServerMod, AccessLevel::BotOwner)
                .is_allowed()
        );
        assert_eq!(
            gate.authorize(AccessLevel::ServerMod, AccessLevel::User),
            Authorization::Deny {
                reason: DENY_REASON
            }
        );
    }

    #[test]
    fn authorization_is_monotone_in_resolved_level() {
        let gate = PreconditionGate::new(false);
        for required in LEVELS {
            let mut was_allowed = false;
            for resolved in LEVELS {
                let allowed = gate.authorize(required, resolved).is_allowed();
                // Once allowed at some level, every higher level is allowed too.
                assert!(!was_allowed || allowed);
                was_allowed = allowed;
            }
        }
    }

    #[test]
    fn permit_all_short_circuits() {
        let gate = PreconditionGate::new(true);
        assert!(
            gate.authorize(AccessLevel::BotOwner, AccessLevel::Blocked)
                .is_allowed()
        );
    }
}
