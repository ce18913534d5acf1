//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::domain::{contract, payment, Payment};
#[cfg(doc)]
use crate::{domain::Contract, Query};

use super::DatabaseQuery;

/// Queries a [`Payment`] by its [`payment::Id`].
pub type ById = DatabaseQuery<By<Option<Payment>, payment::Id>>;

/// Queries all the [`Payment`]s of a [`Contract`], ordered by their date.
pub type ByContract = DatabaseQuery<By<Vec<Payment>, contract::Id>>;
