//! Service contains the business logic of the houses application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

#[cfg(doc)]
use infra::{Database, Mailer};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Notifications [`infra::mail::Config`].
    pub mail: infra::mail::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Ml = infra::mail::Log> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Mailer`] of this [`Service`].
    mailer: Ml,
}

impl<Db, Ml> Service<Db, Ml> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db, mailer: Ml) -> Self {
        Self {
            config,
            database,
            mailer,
        }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Mailer`] of this [`Service`].
    #[must_use]
    pub fn mailer(&self) -> &Ml {
        &self.mailer
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers for testing [`Service`] operations.

    use crate::{
        domain::house::{self, equipment, resident},
        infra::{database::memory::Memory, mail},
        Config, Service,
    };

    /// Creates a new [`Service`] backed by a fresh in-memory database.
    pub(crate) fn service<Ml>(mailer: Ml) -> Service<Memory, Ml> {
        Service::new(
            Config {
                mail: mail::Config {
                    sender: "houses@acme.test".into(),
                    recipient: "office@acme.test".into(),
                },
            },
            Memory::default(),
            mailer,
        )
    }

    /// Creates a new [`house::Draft`] of the provided kind at the provided
    /// location.
    pub(crate) fn draft(location: &str, kind: house::Kind) -> house::Draft {
        let location = house::Location::new(location);
        house::Draft {
            hash: house::Hash::new(location.as_ref(), kind),
            kind,
            num_floors: house::NumFloors::new(2).unwrap(),
            num_rooms: house::NumRooms::new(5).unwrap(),
            price: "250000".parse().unwrap(),
            size: "140.25".parse().unwrap(),
            location,
            keywords: house::Keywords::default(),
            equipment: equipment::Draft::default(),
            residents: vec![resident::Draft {
                first_name: "Erika".parse().unwrap(),
                last_name: "Mustermann".parse().unwrap(),
                age: resident::Age::new(42).unwrap(),
                occupation: "Architektin".parse().ok(),
            }],
        }
    }
}
