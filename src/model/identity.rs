use serde::{Deserialize, Serialize};

/// Who is calling, as far as punch records are concerned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Identity {
    Superuser,
    Regular { employee_id: u64 },
}

impl Identity {
    /// A non-superuser must be bound to an employee, otherwise there is no identity.
    pub fn from_user(is_superuser: bool, employee_id: Option<u64>) -> Option<Self> {
        match (is_superuser, employee_id) {
            (true, _) => Some(Identity::Superuser),
            (false, Some(employee_id)) => Some(Identity::Regular { employee_id }),
            (false, None) => None,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Identity::Superuser)
    }

    pub fn can_access(&self, employee_id: u64) -> bool {
        match self {
            Identity::Superuser => true,
            Identity::Regular { employee_id: own } => *own == employee_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superuser_ignores_employee_binding() {
        assert_eq!(Identity::from_user(true, None), Some(Identity::Superuser));
        assert_eq!(Identity::from_user(true, Some(4)), Some(Identity::Superuser));
    }

    #[test]
    fn regular_user_needs_an_employee() {
        assert_eq!(
            Identity::from_user(false, Some(7)),
            Some(Identity::Regular { employee_id: 7 })
        );
        assert_eq!(Identity::from_user(false, None), None);
    }

    #[test]
    fn regular_user_only_reaches_own_records() {
        let identity = Identity::Regular { employee_id: 7 };
        assert!(identity.can_access(7));
        assert!(!identity.can_access(8));
        assert!(Identity::Superuser.can_access(8));
    }
}
