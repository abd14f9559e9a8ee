//! [`Query`] definition.

pub mod house;
pub mod houses;

/// [`Query`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Query;
