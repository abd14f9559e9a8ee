//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{domain::house, query, read::house::Criteria, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `House` with the specified ID.
    ///
    /// `House` residents are fetched only if `withResidents` is `true`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `HOUSE_NOT_EXISTS` - the `House` with the specified ID does not
    ///                        exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "house",
            id = %id,
            otel.name = Self::SPAN_NAME,
            with_residents = ?with_residents,
        ),
    )]
    pub async fn house(
        id: i32,
        with_residents: Option<bool>,
        ctx: &Context,
    ) -> Result<api::House, Error> {
        let id = house::Id::new(id)
            .ok_or_else(|| {
                Error::from(api::house::HouseError::NotExists).with_message(
                    &format!("`House(id: {id})` does not exist"),
                )
            })
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::house::ById {
                id,
                with_residents: with_residents.unwrap_or_default(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Searches `House`s matching all the provided criteria.
    ///
    /// Without criteria, all the `House`s are returned.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_CRITERIA` - some criterion is unknown or has an invalid
    ///                        value;
    /// - `HOUSES_NOT_FOUND` - no `House` matches the criteria.
    #[tracing::instrument(
        skip_all,
        fields(
            criteria = ?criteria,
            gql.name = "houses",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn houses(
        criteria: Option<Vec<api::house::CriterionInput>>,
        ctx: &Context,
    ) -> Result<Vec<api::House>, Error> {
        let criteria = criteria.map(|cs| {
            cs.into_iter()
                .map(|c| (c.key, c.value))
                .collect::<Criteria>()
        });

        ctx.service()
            .execute(query::houses::Search(criteria))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|houses| houses.into_iter().map(Into::into).collect())
    }
}

impl AsError for query::house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(
                Error::from(api::house::HouseError::NotExists)
                    .with_message(self),
            ),
        }
    }
}

impl AsError for query::houses::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidCriteria(_) => {
                Some(Error::from(SearchError::InvalidCriteria).with_message(self))
            }
            Self::NotFound(_) => {
                Some(Error::from(SearchError::NotFound).with_message(self))
            }
        }
    }
}

define_error! {
    enum SearchError {
        #[code = "INVALID_CRITERIA"]
        #[status = NOT_FOUND]
        #[message = "Invalid search criteria"]
        InvalidCriteria,

        #[code = "HOUSES_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "No `House` matches the search criteria"]
        NotFound,
    }
}
