//! [`Notice`]s sent by the [`Service`].
//!
//! The [`Service`] only decides when a [`Notice`] is sent and to whom: its
//! rendering and delivery are up to the [`Notifier`].
//!
//! [`Notifier`]: crate::infra::Notifier
//! [`Service`]: crate::Service

use common::{Date, Money, Percent};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{contract, contract_utility, user};

/// Notice delivered to a single recipient.
pub trait Notice: Serialize {
    /// Code of the template this [`Notice`] is rendered with.
    const TEMPLATE: &'static str;

    /// Returns [`user::Email`] of this [`Notice`] recipient.
    fn recipient(&self) -> &user::Email;
}

/// Implements [`Notice`] for the provided types, all having a `to` field.
macro_rules! impl_notice {
    ($($ty:ty => $template:literal),* $(,)?) => {$(
        impl Notice for $ty {
            const TEMPLATE: &'static str = $template;

            fn recipient(&self) -> &user::Email {
                &self.to
            }
        }
    )*};
}

impl_notice! {
    NewContract => "contract.created",
    ContractReactivated => "contract.reactivated",
    ContractExpired => "contract.expired",
    ContractDeleted => "contract.deleted",
    IncreaseCreated => "increase.created",
    IncreaseUpdated => "increase.updated",
    UpcomingIncrease => "increase.upcoming",
    UpcomingIncreaseDigest => "increase.upcoming.digest",
    UpcomingExpiration => "contract.expiring",
    UpcomingExpirationDigest => "contract.expiring.digest",
    RentPaymentReminder => "rent.payment.reminder",
    UtilityAmountLoaded => "utility.amount.loaded",
    UtilityChargeReminder => "utility.charge.reminder",
    UtilityChargeDigest => "utility.charge.digest",
}

/// Tenant is informed about their new [`Contract`].
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct NewContract {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the new [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the [`Contract`] starts at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub start_date: Date,

    /// [`Date`] the [`Contract`] ends at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub end_date: Date,

    /// Initial rent amount.
    pub initial_amount: Money,

    /// Number of months between rent adjustments.
    pub adjustment_frequency: i32,
}

/// Tenant is informed their [`Contract`] is active again.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct ContractReactivated {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the reactivated [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,
}

/// Tenant is informed their [`Contract`] has expired.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct ContractExpired {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the expired [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the [`Contract`] ends at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub end_date: Date,
}

/// Administration is informed a [`Contract`] was deleted before its end.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct ContractDeleted {
    /// Recipient of this notice.
    pub to: user::Email,

    /// ID of the deleted [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// Full name of the tenant, if known.
    pub tenant: Option<String>,

    /// [`Date`] the [`Contract`] was supposed to end at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub end_date: Date,
}

/// Tenant is informed about a rent [`Increase`].
///
/// [`Increase`]: crate::domain::Increase
#[derive(Clone, Debug, Serialize)]
pub struct IncreaseCreated {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the adjusted [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the [`Increase`] takes effect at.
    ///
    /// [`Increase`]: crate::domain::Increase
    pub date: Date,

    /// New rent amount.
    pub amount: Money,

    /// Applied adjustment.
    pub adjustment: Percent,
}

/// Tenant is informed a rent [`Increase`] was corrected.
///
/// [`Increase`]: crate::domain::Increase
#[derive(Clone, Debug, Serialize)]
pub struct IncreaseUpdated {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the adjusted [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the [`Increase`] takes effect at.
    ///
    /// [`Increase`]: crate::domain::Increase
    pub date: Date,

    /// New rent amount.
    pub amount: Money,

    /// Applied adjustment.
    pub adjustment: Percent,
}

/// Tenant is informed their rent is adjusted in a month.
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingIncrease {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the [`Contract`] to be adjusted.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] of the adjustment.
    pub date: Date,
}

/// Administration is informed about all the rent adjustments in a month.
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingIncreaseDigest {
    /// Recipient of this notice.
    pub to: user::Email,

    /// [`Date`] of the adjustments.
    pub date: Date,

    /// Adjusted [`Contract`]s.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contracts: Vec<DigestEntry>,
}

/// Tenant is informed their [`Contract`] ends in a month.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingExpiration {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the expiring [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the [`Contract`] ends at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub end_date: Date,
}

/// Administration is informed about all the [`Contract`]s ending in a month.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct UpcomingExpirationDigest {
    /// Recipient of this notice.
    pub to: user::Email,

    /// [`Date`] the [`Contract`]s end at.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub end_date: Date,

    /// Expiring [`Contract`]s.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contracts: Vec<DigestEntry>,
}

/// Tenant is reminded to pay their rent.
#[derive(Clone, Debug, Serialize)]
pub struct RentPaymentReminder {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the paid [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// [`Date`] the rent is due at.
    pub due_date: Date,

    /// Rent amount in effect.
    pub amount: Money,
}

/// Tenant is informed about an adjusted utility charge.
#[derive(Clone, Debug, Serialize)]
pub struct UtilityAmountLoaded {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the [`Contract`] the charge is billed through.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// ID of the adjusted [`ContractUtility`].
    ///
    /// [`ContractUtility`]: crate::domain::ContractUtility
    pub contract_utility_id: contract_utility::Id,

    /// [`Date`] the adjustment takes effect at.
    pub date: Date,

    /// Adjusted charge amount.
    pub amount: Decimal,
}

/// Tenant is reminded about a utility charge due in ten days.
#[derive(Clone, Debug, Serialize)]
pub struct UtilityChargeReminder {
    /// Recipient of this notice.
    pub to: user::Email,

    /// First name of the tenant.
    pub first_name: user::Name,

    /// ID of the [`Contract`] the charge is billed through.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// ID of the due [`ContractUtility`].
    ///
    /// [`ContractUtility`]: crate::domain::ContractUtility
    pub contract_utility_id: contract_utility::Id,

    /// [`Date`] the charge is due at.
    pub due_date: Date,

    /// Last known charge amount.
    pub amount: Decimal,
}

/// Administration is informed about all the utility charges due in ten days.
#[derive(Clone, Debug, Serialize)]
pub struct UtilityChargeDigest {
    /// Recipient of this notice.
    pub to: user::Email,

    /// [`Date`] the charges are due at.
    pub due_date: Date,

    /// Due charges.
    pub charges: Vec<UtilityDigestEntry>,
}

/// [`Contract`] mentioned in an administrative digest.
///
/// [`Contract`]: crate::domain::Contract
#[derive(Clone, Debug, Serialize)]
pub struct DigestEntry {
    /// ID of the [`Contract`].
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// Full name of the tenant.
    pub tenant: String,

    /// [`user::Email`] of the tenant.
    pub email: user::Email,
}

/// Utility charge mentioned in an administrative digest.
#[derive(Clone, Debug, Serialize)]
pub struct UtilityDigestEntry {
    /// ID of the [`Contract`] the charge is billed through.
    ///
    /// [`Contract`]: crate::domain::Contract
    pub contract_id: contract::Id,

    /// ID of the due [`ContractUtility`].
    ///
    /// [`ContractUtility`]: crate::domain::ContractUtility
    pub contract_utility_id: contract_utility::Id,

    /// Full name of the tenant, if it could be resolved.
    pub tenant: Option<String>,

    /// Last known charge amount.
    pub amount: Decimal,
}
