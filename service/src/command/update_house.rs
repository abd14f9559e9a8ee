//! [`Command`] for updating an existing [`House`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{house, House},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for updating an existing [`House`] guarded by its
/// [`house::Version`].
///
/// Doesn't touch the equipment and the residents of the [`House`].
#[derive(Clone, Debug)]
pub struct UpdateHouse {
    /// ID of the [`House`] to update.
    pub id: house::Id,

    /// [`house::Changes`] to apply.
    pub changes: house::Changes,

    /// Token of the [`house::Version`] the changes are based on.
    ///
    /// See [`house::Version::from_token()`] for the format.
    pub version: String,
}

impl<Db, Ml> Command<UpdateHouse> for Service<Db, Ml>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<House, house::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<House>, read::house::Lookup>>,
            Ok = Option<House>,
            Err = Traced<database::Error>,
        > + Database<
            Update<House>,
            Ok = Option<house::Version>,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = house::Version;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateHouse) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateHouse {
            id,
            changes,
            version,
        } = cmd;

        let Some(expected) = house::Version::from_token(&version) else {
            return Err(tracerr::new!(E::InvalidVersion(version)));
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `House`.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut house = tx
            .execute(Select(By::new(read::house::Lookup {
                id,
                with_residents: false,
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;

        // Versions newer than the persisted one are accepted.
        if expected < house.version {
            log::debug!(
                %id,
                %expected,
                persisted = %house.version,
                "outdated house version",
            );
            return Err(tracerr::new!(E::OutdatedVersion(expected)));
        }

        house.apply(changes);
        let updated = tx
            .execute(Update(house))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::debug!(%id, version = %updated, "house updated");
        Ok(updated)
    }
}

/// Error of [`UpdateHouse`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] doesn't exist.
    #[display("`House(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] house::Id),

    /// Provided version token is malformed.
    #[display("Invalid version token: {_0}")]
    #[from(ignore)]
    InvalidVersion(#[error(not(source))] String),

    /// Provided [`house::Version`] is older than the persisted one.
    #[display("`House` version {_0} is outdated")]
    #[from(ignore)]
    OutdatedVersion(#[error(not(source))] house::Version),
}
