//! Domain definitions.

pub mod commission;
pub mod contract;
pub mod contract_utility;
pub mod guarantor;
pub mod increase;
pub mod index;
mod note;
pub mod payment;
pub mod property;
pub mod user;
pub mod utility;

pub use self::{
    commission::Commission, contract::Contract,
    contract_utility::ContractUtility, guarantor::Guarantor,
    increase::Increase, index::Index, note::Note, payment::Payment,
    property::Property, user::User, utility::Utility,
};
