//! [`Query`] collection related to [`Guarantor`]s.

use common::operations::By;

use crate::domain::{contract, guarantor, Guarantor};
#[cfg(doc)]
use crate::{domain::Contract, Query};

use super::DatabaseQuery;

/// Queries a [`Guarantor`] by its [`guarantor::Id`].
pub type ById = DatabaseQuery<By<Option<Guarantor>, guarantor::Id>>;

/// Queries all the [`Guarantor`]s linked to a [`Contract`], ordered by their
/// names.
pub type ByContract = DatabaseQuery<By<Vec<Guarantor>, contract::Id>>;
