//! Read entities definitions.

pub mod sweep;

use std::marker::PhantomData;

#[cfg(doc)]
use crate::domain::{Guarantor, Index, Utility};

pub use self::sweep::Report;

/// Marker selecting whether an entity of type `T` (an [`Index`], a
/// [`Utility`] or a [`Guarantor`]) is referenced by any other entity.
#[derive(Clone, Copy, Debug)]
pub struct Referenced<T: ?Sized>(PhantomData<T>);
