//! [`Query`] related to multiple [`House`]s.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::House,
    infra::{database, Database},
    read::house::{
        list::{Filter, InvalidCriteria},
        Criteria,
    },
    Service,
};

use super::Query;

/// Searches [`House`]s matching the provided [`Criteria`].
///
/// Absent or empty [`Criteria`] match all the [`House`]s.
#[derive(Clone, Debug, Default)]
pub struct Search(pub Option<Criteria>);

impl<Db, Ml> Query<Search> for Service<Db, Ml>
where
    Db: Database<
        Select<By<Vec<House>, Option<Filter>>>,
        Ok = Vec<House>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<House>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Search(criteria): Search,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let criteria = criteria.filter(|c| !c.is_empty());
        let filter = criteria
            .as_ref()
            .map(Filter::from_criteria)
            .transpose()
            .map_err(tracerr::from_and_wrap!(=> E))?
            .flatten();
        log::debug!(
            ?criteria,
            ?filter,
            "searching houses",
        );

        let houses = self
            .database()
            .execute(Select(By::new(filter)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        match criteria {
            Some(criteria) if houses.is_empty() => {
                Err(tracerr::new!(E::NotFound(criteria)))
            }
            _ => Ok(houses),
        }
    }
}

/// Error of [`Search`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Criteria`] are invalid.
    #[display("Invalid criteria: {_0}")]
    InvalidCriteria(InvalidCriteria),

    /// No [`House`]s match the [`Criteria`].
    #[display("No `House`s match {_0}")]
    #[from(ignore)]
    NotFound(#[error(not(source))] Criteria),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        domain::house::{self, Keywords},
        infra::{database::memory::Memory, mail, Database as _},
        read::house::Criteria,
        testing, Query as _, Service,
    };

    use super::{ExecutionError, Search};

    async fn seeded() -> Service<Memory, mail::Log> {
        let svc = testing::service(mail::Log);
        for (location, kind, keywords) in [
            ("Ulm", house::Kind::Apartment, "Sternenhimmel,Wasserfall"),
            ("Bonn", house::Kind::SingleFamily, "Sternenhimmel"),
            ("Kiel", house::Kind::MultiFamily, ""),
        ] {
            let mut draft = testing::draft(location, kind);
            draft.keywords = keywords.parse::<Keywords>().unwrap();
            _ = svc.database().execute(Insert(draft)).await.unwrap();
        }
        svc
    }

    fn criteria(pairs: &[(&str, &str)]) -> Option<Criteria> {
        Some(Criteria::from_iter(pairs.iter().copied()))
    }

    #[tokio::test]
    async fn returns_everything_without_criteria() {
        let svc = seeded().await;

        let all = svc.execute(Search(None)).await.unwrap();
        let empty = svc.execute(Search(criteria(&[]))).await.unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(empty.len(), 3);
    }

    #[tokio::test]
    async fn fails_on_unknown_key_without_querying() {
        let svc = seeded().await;

        let err = svc
            .execute(Search(criteria(&[("rooms", "5"), ("pool", "yes")])))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::InvalidCriteria(_)));
        assert_eq!(svc.database().searches(), 0);
    }

    #[tokio::test]
    async fn combines_keyword_flags() {
        let svc = seeded().await;

        let houses = svc
            .execute(Search(criteria(&[
                ("sternenhimmel", "true"),
                ("wasserfall", "true"),
            ])))
            .await
            .unwrap();

        assert_eq!(houses.len(), 1);
        assert_eq!(
            houses[0].location.as_ref().map(ToString::to_string).as_deref(),
            Some("Ulm"),
        );
    }

    #[tokio::test]
    async fn never_returns_absent_keywords() {
        let svc = seeded().await;

        let houses = svc
            .execute(Search(criteria(&[("location", "Kiel")])))
            .await
            .unwrap();

        assert_eq!(houses.len(), 1);
        assert!(houses[0].keywords.is_empty());
    }

    #[tokio::test]
    async fn fails_when_nothing_matches() {
        let svc = seeded().await;

        let err = svc
            .execute(Search(criteria(&[("location", "Berlin")])))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotFound(_)));
        assert!(err.to_string().contains("Berlin"), "{err}");
    }

    #[tokio::test]
    async fn matches_equipment_case_insensitively() {
        let svc = testing::service(mail::Log);
        let mut draft = testing::draft("Ulm", house::Kind::Apartment);
        draft.equipment.garage = true;
        _ = svc.database().execute(Insert(draft)).await.unwrap();
        _ = svc
            .database()
            .execute(Insert(testing::draft("Bonn", house::Kind::Apartment)))
            .await
            .unwrap();

        let houses = svc
            .execute(Search(criteria(&[("equipment", "GARAGE")])))
            .await
            .unwrap();

        assert_eq!(houses.len(), 1);
        assert!(houses[0].equipment.garage);
    }
}
