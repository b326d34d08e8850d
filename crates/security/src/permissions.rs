//! Role to capability table and permission checks

use gatehouse_config::GateConfig;
use gatehouse_core::{Capability, GateError, Principal, Requirement, Role};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use Capability::*;

const EDITOR: &[Capability] = &[
    ReadNews,
    ReadEvents,
    ReadConferences,
    ReadProfile,
    WriteEvents,
    WriteConferences,
    RegisterEvents,
    WriteProfile,
];

const USER: &[Capability] = &[
    ReadNews,
    ReadEvents,
    ReadConferences,
    RegisterEvents,
    ReadProfile,
    WriteProfile,
];

const ANONYMOUS: &[Capability] = &[ReadNews, ReadEvents, ReadConferences];

/// Built-in grants for a role; unknown roles get nothing
#[must_use]
pub fn default_capabilities(role: Role) -> &'static [Capability] {
    match role {
        Role::Admin => &Capability::ALL,
        Role::Editor => EDITOR,
        Role::User => USER,
        Role::Anonymous => ANONYMOUS,
        Role::Unknown => &[],
    }
}

/// Fixed capability set per role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    grants: BTreeMap<Role, BTreeSet<Capability>>,
}

impl Default for RoleTable {
    fn default() -> Self {
        let grants = Role::KNOWN
            .into_iter()
            .map(|role| (role, default_capabilities(role).iter().copied().collect()))
            .collect();
        Self { grants }
    }
}

impl RoleTable {
    /// Built-in table with per-role replacements applied
    ///
    /// Overrides for the unknown role are ignored; validated configs never carry them.
    #[must_use]
    pub fn with_overrides(overrides: &BTreeMap<Role, BTreeSet<Capability>>) -> Self {
        let mut table = Self::default();
        for (role, capabilities) in overrides.iter().filter(|(role, _)| role.is_known()) {
            table.grants.insert(*role, capabilities.clone());
        }
        table
    }

    #[must_use]
    pub fn from_config(config: &GateConfig) -> Self {
        Self::with_overrides(&config.roles)
    }

    #[must_use]
    pub fn has(&self, role: Role, capability: Capability) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|granted| granted.contains(&capability))
    }

    /// Capabilities granted to a role, sorted
    #[must_use]
    pub fn capabilities(&self, role: Role) -> Vec<Capability> {
        self.grants
            .get(&role)
            .map(|granted| granted.iter().copied().collect())
            .unwrap_or_default()
    }
}

/// Checks a principal against a route's requirement
#[derive(Debug, Clone, Default)]
pub struct PermissionEvaluator {
    table: RoleTable,
}

impl PermissionEvaluator {
    #[must_use]
    pub fn new(table: RoleTable) -> Self {
        Self { table }
    }

    /// Allow or deny; empty capability and role lists deny
    pub fn check(&self, principal: &Principal, requirement: &Requirement) -> Result<(), GateError> {
        let role = principal.role();
        let allowed = match requirement {
            Requirement::None => true,
            Requirement::Capability(capability) => {
                if !self.table.has(role, *capability) {
                    return Err(self.deny(principal, capability.as_str()));
                }
                true
            }
            Requirement::AnyOf(capabilities) => {
                capabilities.iter().any(|cap| self.table.has(role, *cap))
            }
            Requirement::AllOf(capabilities) => {
                if let Some(missing) = capabilities.iter().find(|cap| !self.table.has(role, **cap)) {
                    return Err(self.deny(principal, missing.as_str()));
                }
                !capabilities.is_empty()
            }
            Requirement::RoleIn(roles) => roles.contains(&role),
        };

        if allowed {
            Ok(())
        } else {
            Err(self.deny(principal, &requirement.to_string()))
        }
    }

    fn deny(&self, principal: &Principal, required: &str) -> GateError {
        debug!(%principal, required, "capability check failed");
        GateError::insufficient_capability(required)
    }

    #[must_use]
    pub fn table(&self) -> &RoleTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::authenticated("1", "p@giip.info", role)
    }

    #[test]
    fn test_admin_has_everything() {
        let table = RoleTable::default();
        for capability in Capability::ALL {
            assert!(table.has(Role::Admin, capability), "{capability}");
        }
    }

    #[test]
    fn test_unknown_role_has_nothing() {
        let table = RoleTable::default();
        assert!(table.capabilities(Role::Unknown).is_empty());
        for capability in Capability::ALL {
            assert!(!table.has(Role::Unknown, capability));
        }
    }

    #[test]
    fn test_editor_cannot_write_news() {
        let evaluator = PermissionEvaluator::default();
        let err = evaluator
            .check(
                &principal(Role::Editor),
                &Requirement::Capability(Capability::WriteNews),
            )
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert_eq!(err, GateError::insufficient_capability("write:news"));

        assert!(evaluator
            .check(
                &principal(Role::Editor),
                &Requirement::Capability(Capability::WriteEvents)
            )
            .is_ok());
    }

    #[test]
    fn test_anonymous_is_read_only() {
        let table = RoleTable::default();
        assert_eq!(
            table.capabilities(Role::Anonymous),
            vec![ReadNews, ReadEvents, ReadConferences]
        );
        assert!(!table.has(Role::Anonymous, RegisterEvents));
    }

    #[test]
    fn test_any_all_and_role_requirements() {
        let evaluator = PermissionEvaluator::default();
        let user = principal(Role::User);

        assert!(evaluator
            .check(&user, &Requirement::AnyOf(vec![WriteNews, RegisterEvents]))
            .is_ok());
        assert!(evaluator
            .check(&user, &Requirement::AnyOf(vec![WriteNews, DeleteNews]))
            .is_err());

        let err = evaluator
            .check(&user, &Requirement::AllOf(vec![ReadProfile, ManageUsers]))
            .unwrap_err();
        assert_eq!(err, GateError::insufficient_capability("manage:users"));

        assert!(evaluator
            .check(&user, &Requirement::RoleIn(vec![Role::Admin]))
            .is_err());
        assert!(evaluator
            .check(&principal(Role::Admin), &Requirement::RoleIn(vec![Role::Admin]))
            .is_ok());
    }

    #[test]
    fn test_empty_requirement_sets_deny() {
        let evaluator = PermissionEvaluator::default();
        let admin = principal(Role::Admin);
        assert!(evaluator.check(&admin, &Requirement::AnyOf(vec![])).is_err());
        assert!(evaluator.check(&admin, &Requirement::AllOf(vec![])).is_err());
        assert!(evaluator.check(&admin, &Requirement::RoleIn(vec![])).is_err());
        assert!(evaluator.check(&admin, &Requirement::None).is_ok());
    }

    #[test]
    fn test_overrides_replace_role_entries() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Role::Editor, BTreeSet::from([ReadNews, WriteNews]));
        overrides.insert(Role::Unknown, BTreeSet::from([ReadNews]));
        let table = RoleTable::with_overrides(&overrides);

        assert!(table.has(Role::Editor, WriteNews));
        assert!(!table.has(Role::Editor, WriteEvents));
        assert!(!table.has(Role::Unknown, ReadNews));
        assert!(table.has(Role::User, RegisterEvents));
    }
}
