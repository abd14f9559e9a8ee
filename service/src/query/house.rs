//! [`Query`] related to a single [`House`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::house::Resident;
use crate::{
    domain::{house, House},
    infra::{database, Database},
    read, Service,
};

use super::Query;

/// Queries a [`House`] by its [`house::Id`].
#[derive(Clone, Copy, Debug)]
pub struct ById {
    /// ID of the [`House`] to query.
    pub id: house::Id,

    /// Indicator whether [`Resident`]s of the [`House`] should be queried
    /// too.
    pub with_residents: bool,
}

impl<Db, Ml> Query<ById> for Service<Db, Ml>
where
    Db: Database<
        Select<By<Option<House>, read::house::Lookup>>,
        Ok = Option<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = House;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        ById { id, with_residents }: ById,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        log::debug!(%id, with_residents, "looking up house");

        self.database()
            .execute(Select(By::new(read::house::Lookup { id, with_residents })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotExists(id))
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`ById`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] doesn't exist.
    #[display("`House(id: {_0})` does not exist")]
    #[from(ignore)]
    NotExists(#[error(not(source))] house::Id),
}
