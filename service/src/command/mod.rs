//! [`Command`] definition.

pub mod apply_increase;
pub mod apply_scheduled_increases;
pub mod create_commission;
pub mod create_contract;
pub mod create_contract_utility;
pub mod create_guarantor;
pub mod create_increase;
pub mod create_index;
pub mod create_payment;
pub mod create_utility;
pub mod create_utility_increase;
pub mod delete_commission;
pub mod delete_contract;
pub mod delete_contract_increases;
pub mod delete_contract_utility;
pub mod delete_guarantor;
pub mod delete_increase;
pub mod delete_index;
pub mod delete_payment;
pub mod delete_utility;
pub mod delete_utility_increase;
pub mod link_guarantor;
pub mod notify_contract_expirations;
pub mod notify_upcoming_increases;
pub mod remind_rent_payments;
pub mod remind_utility_charges;
pub mod unlink_guarantor;
pub mod update_commission;
pub mod update_commission_status;
pub mod update_contract;
pub mod update_contract_status;
pub mod update_contract_utility;
pub mod update_guarantor;
pub mod update_increase;
pub mod update_utility_increase;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    apply_increase::ApplyIncrease,
    apply_scheduled_increases::ApplyScheduledIncreases,
    create_commission::CreateCommission, create_contract::CreateContract,
    create_contract_utility::CreateContractUtility,
    create_guarantor::CreateGuarantor, create_increase::CreateIncrease,
    create_index::CreateIndex, create_payment::CreatePayment,
    create_utility::CreateUtility,
    create_utility_increase::CreateUtilityIncrease,
    delete_commission::DeleteCommission, delete_contract::DeleteContract,
    delete_contract_increases::DeleteContractIncreases,
    delete_contract_utility::DeleteContractUtility,
    delete_guarantor::DeleteGuarantor, delete_increase::DeleteIncrease,
    delete_index::DeleteIndex, delete_payment::DeletePayment,
    delete_utility::DeleteUtility,
    delete_utility_increase::DeleteUtilityIncrease,
    link_guarantor::{LinkGuarantor, Linking},
    notify_contract_expirations::NotifyContractExpirations,
    notify_upcoming_increases::NotifyUpcomingIncreases,
    remind_rent_payments::RemindRentPayments,
    remind_utility_charges::RemindUtilityCharges,
    unlink_guarantor::{UnlinkGuarantor, Unlinking},
    update_commission::UpdateCommission,
    update_commission_status::UpdateCommissionStatus,
    update_contract::UpdateContract,
    update_contract_status::UpdateContractStatus,
    update_contract_utility::UpdateContractUtility,
    update_guarantor::UpdateGuarantor, update_increase::UpdateIncrease,
    update_utility_increase::UpdateUtilityIncrease,
};
