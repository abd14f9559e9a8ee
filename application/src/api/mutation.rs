//! GraphQL [`Mutation`]s definitions.

use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `House` along with its equipment and residents.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BAD_REQUEST` - some of the provided values are invalid;
    /// - `HOUSE_EXISTS` - a `House` of the same type at the same location
    ///                    exists already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createHouse",
            kind = ?input.kind,
            location = ?input.location,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_house(
        input: api::house::HouseInput,
        ctx: &Context,
    ) -> Result<api::house::CreatePayload, Error> {
        let cmd = command::CreateHouse::try_from(input).map_err(ctx.error())?;

        let id = ctx
            .service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::house::CreatePayload { id: id.into() })
    }

    /// Updates the `House` with the provided changes.
    ///
    /// The update only succeeds if the provided `version` is not older than
    /// the current one.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `BAD_REQUEST` - some of the provided values are invalid;
    /// - `HOUSE_NOT_EXISTS` - the `House` with the specified ID does not
    ///                        exist;
    /// - `INVALID_VERSION` - the provided version is malformed;
    /// - `OUTDATED_VERSION` - the provided version is outdated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateHouse",
            id = %input.id,
            otel.name = Self::SPAN_NAME,
            version = %input.version,
        ),
    )]
    pub async fn update_house(
        input: api::house::HouseUpdateInput,
        ctx: &Context,
    ) -> Result<api::house::UpdatePayload, Error> {
        let cmd = command::UpdateHouse::try_from(input).map_err(ctx.error())?;

        let version = ctx
            .service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::house::UpdatePayload {
            version: version.into(),
        })
    }
}

impl AsError for command::create_house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::AlreadyExists { .. } => Some(
                Error::from(api::house::HouseError::Exists).with_message(self),
            ),
        }
    }
}

impl AsError for command::update_house::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotExists(_) => Some(
                Error::from(api::house::HouseError::NotExists)
                    .with_message(self),
            ),
            Self::InvalidVersion(_) => {
                Some(Error::from(VersionError::Invalid).with_message(self))
            }
            Self::OutdatedVersion(_) => {
                Some(Error::from(VersionError::Outdated).with_message(self))
            }
        }
    }
}

define_error! {
    enum VersionError {
        #[code = "INVALID_VERSION"]
        #[status = PRECONDITION_FAILED]
        #[message = "Invalid `House` version"]
        Invalid,

        #[code = "OUTDATED_VERSION"]
        #[status = PRECONDITION_FAILED]
        #[message = "Outdated `House` version"]
        Outdated,
    }
}

#[cfg(test)]
mod spec {
    use service::{command, domain::house};

    use crate::AsError as _;

    #[test]
    fn maps_duplicate_house_to_conflict() {
        let err = command::create_house::ExecutionError::AlreadyExists {
            location: house::Location::new("Berlin"),
            kind: house::Kind::Apartment,
        }
        .as_error();

        assert_eq!(err.code, "HOUSE_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn maps_version_failures_to_failed_precondition() {
        use command::update_house::ExecutionError as E;

        let invalid = E::InvalidVersion("5".into()).as_error();
        let outdated = E::OutdatedVersion(house::Version::from(4)).as_error();
        let missing = E::NotExists(house::Id::new(3).unwrap()).as_error();

        assert_eq!(invalid.code, "INVALID_VERSION");
        assert_eq!(invalid.status_code, http::StatusCode::PRECONDITION_FAILED);
        assert_eq!(outdated.code, "OUTDATED_VERSION");
        assert_eq!(
            outdated.status_code,
            http::StatusCode::PRECONDITION_FAILED,
        );
        assert_eq!(missing.code, "HOUSE_NOT_EXISTS");
        assert_eq!(missing.status_code, http::StatusCode::NOT_FOUND);
    }
}
