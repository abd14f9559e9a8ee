//! [`House`]-related read definitions.

pub mod criteria;
pub mod list;

use crate::domain::house;
#[cfg(doc)]
use crate::domain::{house::Resident, House};

pub use self::criteria::Criteria;

/// Lookup of a single [`House`] by its ID.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Lookup {
    /// ID of the [`House`] to look up.
    pub id: house::Id,

    /// Indicator whether [`Resident`]s of the [`House`] should be fetched.
    pub with_residents: bool,
}
