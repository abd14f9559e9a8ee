//! [`Command`] definition.

pub mod create_house;
pub mod update_house;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{create_house::CreateHouse, update_house::UpdateHouse};
