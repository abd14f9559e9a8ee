//! [`Command`] for creating a new [`House`].

use std::fmt;

use common::operations::{
    By, Commit, Deliver, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::house::{Equipment, Resident};
use crate::{
    domain::{
        house::{self, equipment, resident},
        House,
    },
    infra::{database, mail, Database, Mailer},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`House`] along with its [`Equipment`] and
/// [`Resident`]s.
#[derive(Clone, Debug)]
pub struct CreateHouse {
    /// [`house::Kind`] of a new [`House`].
    pub kind: house::Kind,

    /// [`house::NumFloors`] of a new [`House`].
    pub num_floors: house::NumFloors,

    /// [`house::NumRooms`] of a new [`House`].
    pub num_rooms: house::NumRooms,

    /// [`house::Price`] of a new [`House`].
    pub price: house::Price,

    /// [`house::Size`] of a new [`House`].
    pub size: house::Size,

    /// [`house::Location`] of a new [`House`], if known.
    pub location: Option<house::Location>,

    /// [`house::Keywords`] of a new [`House`].
    pub keywords: house::Keywords,

    /// [`Equipment`] of a new [`House`].
    pub equipment: equipment::Draft,

    /// [`Resident`]s of a new [`House`].
    pub residents: Vec<resident::Draft>,
}

impl<Db, Ml> Command<CreateHouse> for Service<Db, Ml>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<House, house::Hash>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<house::Id>, house::Hash>>,
            Ok = Option<house::Id>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<house::Draft>,
            Ok = house::Id,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
    Ml: Mailer<Deliver<mail::Message>, Ok = (), Err: fmt::Display>,
{
    type Ok = house::Id;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateHouse) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateHouse {
            kind,
            num_floors,
            num_rooms,
            price,
            size,
            location,
            keywords,
            equipment,
            residents,
        } = cmd;

        let hash = house::Hash::new(location.as_ref(), kind);

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of the same `House`.
        tx.execute(Lock(By::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<house::Id>, _>::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(id) = existing {
            log::debug!(%id, %kind, ?location, "house already exists");
            return Err(tracerr::new!(E::AlreadyExists { location, kind }));
        }

        let id = tx
            .execute(Insert(house::Draft {
                hash,
                kind,
                num_floors,
                num_rooms,
                price,
                size,
                location: location.clone(),
                keywords,
                equipment,
                residents,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.notify(id, location.as_ref(), kind).await;

        Ok(id)
    }
}

impl<Db, Ml> Service<Db, Ml>
where
    Ml: Mailer<Deliver<mail::Message>, Ok = (), Err: fmt::Display>,
{
    /// Notifies about a newly created [`House`].
    ///
    /// Failures are only logged, as the [`House`] is already persisted.
    async fn notify(
        &self,
        id: house::Id,
        location: Option<&house::Location>,
        kind: house::Kind,
    ) {
        let mail::Config { sender, recipient } = &self.config().mail;
        let location =
            location.map_or_else(|| "an unknown location".into(), |l| l.to_string());
        let msg = mail::Message {
            from: sender.clone(),
            to: recipient.clone(),
            subject: format!("New house created {id}"),
            body: format!("House of `{kind}` kind at {location} was created"),
        };

        if let Err(e) = self.mailer().execute(Deliver(msg)).await {
            log::error!(%id, "failed to notify about new house: {e}");
        }
    }
}

/// Error of [`CreateHouse`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`House`] of the same [`house::Kind`] at the same
    /// [`house::Location`] exists already.
    #[display("`House` of `{kind}` kind at {location:?} already exists")]
    #[from(ignore)]
    AlreadyExists {
        /// [`house::Location`] of the existing [`House`].
        location: Option<house::Location>,

        /// [`house::Kind`] of the existing [`House`].
        kind: house::Kind,
    },
}

#[cfg(test)]
mod spec {
    use crate::{
        domain::house::{self, equipment},
        infra::mail::{self, mock},
        query, testing, Command as _, Query as _,
    };

    use super::{CreateHouse, ExecutionError};

    fn command(location: &str, kind: house::Kind) -> CreateHouse {
        let draft = testing::draft(location, kind);
        CreateHouse {
            kind: draft.kind,
            num_floors: draft.num_floors,
            num_rooms: draft.num_rooms,
            price: draft.price,
            size: draft.size,
            location: draft.location,
            keywords: draft.keywords,
            equipment: equipment::Draft {
                basement: true,
                garden: true,
                garage: true,
            },
            residents: vec![],
        }
    }

    #[tokio::test]
    async fn creates_house_with_equipment() {
        let svc = testing::service(mail::Log);

        let id = svc
            .execute(command("Ulm", house::Kind::Apartment))
            .await
            .unwrap();

        let house = svc
            .execute(query::house::ById {
                id,
                with_residents: true,
            })
            .await
            .unwrap();
        assert!(i32::from(id) > 0);
        assert_eq!(house.version, house::Version::default());
        assert_eq!(house.equipment.label(), "basement garden garage");
        assert_eq!(house.residents, Some(vec![]));
    }

    #[tokio::test]
    async fn rejects_duplicate_location_and_kind() {
        let svc = testing::service(mail::Log);
        _ = svc
            .execute(command("Ulm", house::Kind::Apartment))
            .await
            .unwrap();

        let err = svc
            .execute(command("Ulm", house::Kind::Apartment))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyExists {
                kind: house::Kind::Apartment,
                ..
            },
        ));
        _ = svc
            .execute(command("Ulm", house::Kind::SingleFamily))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn notifies_about_created_house() {
        let mailer = mock::Recorder::default();
        let svc = testing::service(mailer.clone());

        let id = svc
            .execute(command("Kiel", house::Kind::MultiFamily))
            .await
            .unwrap();

        let delivered = mailer.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].subject, format!("New house created {id}"));
        assert_eq!(delivered[0].to, "office@acme.test");
        assert!(delivered[0].body.contains("Kiel"));
        assert!(delivered[0].body.contains("MULTI_FAMILY"));
    }

    #[tokio::test]
    async fn keeps_house_when_notification_fails() {
        let svc = testing::service(mock::Broken);

        let id = svc
            .execute(command("Kiel", house::Kind::MultiFamily))
            .await
            .unwrap();

        assert!(svc
            .execute(query::house::ById {
                id,
                with_residents: false,
            })
            .await
            .is_ok());
    }
}
