//! Infrastructure layer.

pub mod database;
pub mod mail;

pub use self::{database::Database, mail::Mailer};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
