//! [`Status`] state machine of a [`Contract`].

use common::define_kind;

#[cfg(doc)]
use crate::domain::{Contract, Property, User};

define_kind! {
    #[doc = "Status of a [`Contract`]."]
    enum Status {
        #[doc = "[`Contract`] is in force."]
        #[code = "ACTIVO"]
        Active = 1,

        #[doc = "[`Contract`] is expired or suspended."]
        #[code = "INACTIVO"]
        Inactive = 2,
    }
}

impl Status {
    /// Returns the opposite [`Status`].
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    /// Toggles this [`Status`], describing the side [`Effect`]s the caller
    /// has to carry out.
    #[must_use]
    pub fn transition(self) -> Transition {
        let to = self.toggled();
        let effects = match to {
            Self::Active => vec![
                Effect::GrantTenantRole,
                Effect::OccupyProperty,
                Effect::NotifyReactivated,
            ],
            Self::Inactive => vec![
                Effect::RevokeTenantRole,
                Effect::ReleaseProperty,
                Effect::NotifyExpired,
            ],
        };
        Transition {
            from: self,
            to,
            effects,
        }
    }
}

/// Transition of a [`Contract`] between [`Status`]es.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    /// [`Status`] the [`Contract`] leaves.
    pub from: Status,

    /// [`Status`] the [`Contract`] enters.
    pub to: Status,

    /// Side [`Effect`]s of this [`Transition`], in execution order.
    pub effects: Vec<Effect>,
}

/// Side effect of a [`Transition`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Effect {
    /// Grant the tenant role to the [`Contract`]'s [`User`].
    GrantTenantRole,

    /// Revoke the tenant role from the [`Contract`]'s [`User`].
    RevokeTenantRole,

    /// Mark the [`Contract`]'s [`Property`] as rented.
    OccupyProperty,

    /// Mark the [`Contract`]'s [`Property`] as available.
    ReleaseProperty,

    /// Notify the tenant the [`Contract`] is active again.
    NotifyReactivated,

    /// Notify the tenant the [`Contract`] has expired.
    NotifyExpired,
}

#[cfg(test)]
mod spec {
    use super::{Effect, Status};

    #[test]
    fn deactivation_revokes_role() {
        let t = Status::Active.transition();

        assert_eq!(t.from, Status::Active);
        assert_eq!(t.to, Status::Inactive);
        assert!(t.effects.contains(&Effect::RevokeTenantRole));
        assert!(t.effects.contains(&Effect::ReleaseProperty));
        assert!(t.effects.contains(&Effect::NotifyExpired));
        assert!(!t.effects.contains(&Effect::GrantTenantRole));
    }

    #[test]
    fn activation_grants_role() {
        let t = Status::Inactive.transition();

        assert_eq!(t.to, Status::Active);
        assert!(t.effects.contains(&Effect::GrantTenantRole));
        assert!(t.effects.contains(&Effect::OccupyProperty));
        assert!(!t.effects.contains(&Effect::RevokeTenantRole));
    }

    #[test]
    fn toggling_twice_is_identity() {
        for status in Status::ALL.iter().copied() {
            let there = status.transition();
            let back = there.to.transition();

            assert_eq!(back.to, status);
            assert_eq!(
                there.effects.contains(&Effect::GrantTenantRole),
                back.effects.contains(&Effect::RevokeTenantRole),
            );
        }
    }

    #[test]
    fn codes() {
        assert_eq!(Status::Active.to_string(), "ACTIVO");
        assert_eq!("INACTIVO".parse::<Status>().unwrap(), Status::Inactive);
    }
}
