//! REST API definitions.
//!
//! [`House`]s are exposed as [HAL] documents under the [`BASE_PATH`], with
//! their versions carried in the `ETag`, `If-None-Match` and `If-Match`
//! headers.
//!
//! [`House`]: service::domain::House
//! [HAL]: https://datatracker.ietf.org/doc/html/draft-kelly-json-hal

pub mod hal;

use axum::{
    extract::{rejection::JsonRejection, Path, Query},
    response::{IntoResponse as _, Response},
    routing::get,
    Extension, Json, Router,
};
use http::{header, HeaderMap, StatusCode};
use service::{command, domain::house, query, Command as _, Query as _};
use tracing as log;

use crate::{api, define_error, AsError, Error, Service};

use self::hal::{BaseUri, HouseModel, HousesModel, Links};

/// Base path of the REST API.
pub const BASE_PATH: &str = "/rest";

/// Creates a new [`Router`] of the REST API.
///
/// Expects the [`Service`] to be provided as an [`Extension`].
pub fn router() -> Router {
    Router::new()
        .route(BASE_PATH, get(houses).post(create_house))
        .route(&format!("{BASE_PATH}/:id"), get(house).put(update_house))
}

/// Returns the `House` with the provided ID.
///
/// Responds with `304 Not Modified` if the `If-None-Match` header carries
/// the current version of the `House`.
///
/// # Errors
///
/// - `HOUSE_NOT_EXISTS` if the `House` doesn't exist or the ID is invalid.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "house", id = %id),
)]
pub async fn house(
    Extension(service): Extension<Service>,
    base: BaseUri,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let id = parse_id(&id)?;

    let house = service
        .execute(query::house::ById {
            id,
            with_residents: false,
        })
        .await
        .map_err(AsError::into_error)?;

    let etag = house.version.token();
    if is_not_modified(&headers, &etag) {
        log::debug!(%etag, "not modified");
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let model = HouseModel::new(house, Links::all(&base, id));
    Ok((
        [
            (header::CONTENT_TYPE, hal::CONTENT_TYPE.to_owned()),
            (header::ETAG, etag),
        ],
        Json(model),
    )
        .into_response())
}

/// Searches `House`s matching all the criteria provided as query parameters.
///
/// # Errors
///
/// - `INVALID_CRITERIA` if some criterion is unknown or invalid;
/// - `HOUSES_NOT_FOUND` if no `House` matches the criteria.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "houses", criteria = ?criteria),
)]
pub async fn houses(
    Extension(service): Extension<Service>,
    base: BaseUri,
    Query(criteria): Query<Vec<(String, String)>>,
) -> Result<Response, Error> {
    let criteria =
        (!criteria.is_empty()).then(|| criteria.into_iter().collect());

    let houses = service
        .execute(query::houses::Search(criteria))
        .await
        .map_err(AsError::into_error)?;

    let model = HousesModel {
        embedded: hal::Embedded {
            houses: houses
                .into_iter()
                .map(|h| {
                    let links = Links::this(&base, h.id);
                    HouseModel::new(h, links)
                })
                .collect(),
        },
    };
    Ok((
        [(header::CONTENT_TYPE, hal::CONTENT_TYPE)],
        Json(model),
    )
        .into_response())
}

/// Creates a new `House` out of the request body.
///
/// Responds with `201 Created` and the `Location` of the new `House`.
///
/// # Errors
///
/// - `BAD_REQUEST` if the body is malformed or has invalid values;
/// - `HOUSE_EXISTS` if a `House` of the same type at the same location
///   exists already.
#[tracing::instrument(skip_all, fields(http.handler = "createHouse"))]
pub async fn create_house(
    Extension(service): Extension<Service>,
    base: BaseUri,
    body: Result<Json<api::house::HouseInput>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(input) = body.map_err(AsError::into_error)?;
    let cmd = command::CreateHouse::try_from(input)?;

    let id = service
        .execute(cmd)
        .await
        .map_err(AsError::into_error)?;

    let location = base.house(id);
    log::debug!(%location, "house created");
    Ok((StatusCode::CREATED, [(header::LOCATION, location)]).into_response())
}

/// Updates the `House` with the provided ID by the request body.
///
/// The `If-Match` header must carry the version the changes are based on.
/// Responds with `204 No Content` and the new version in the `ETag`.
///
/// # Errors
///
/// - `HOUSE_NOT_EXISTS` if the `House` doesn't exist or the ID is invalid;
/// - `IF_MATCH_REQUIRED` if the `If-Match` header is missing;
/// - `BAD_REQUEST` if the body is malformed or has invalid values;
/// - `INVALID_VERSION` if the version is malformed;
/// - `OUTDATED_VERSION` if the version is outdated.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "updateHouse", id = %id),
)]
pub async fn update_house(
    Extension(service): Extension<Service>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<api::house::HouseChangesInput>, JsonRejection>,
) -> Result<Response, Error> {
    let id = parse_id(&id)?;
    let version = if_match(&headers)
        .ok_or_else(|| Error::from(PreconditionError::IfMatchRequired))?;
    let Json(changes) = body.map_err(AsError::into_error)?;

    let version = service
        .execute(command::UpdateHouse {
            id,
            changes: changes.try_into()?,
            version,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok((StatusCode::NO_CONTENT, [(header::ETAG, version.token())])
        .into_response())
}

/// Parses the [`house::Id`] out of the request path.
///
/// # Errors
///
/// With `HOUSE_NOT_EXISTS` if the ID is not a positive integer.
fn parse_id(id: &str) -> Result<house::Id, Error> {
    id.parse().map_err(|_| {
        Error::from(api::house::HouseError::NotExists)
            .with_message(&format!("Invalid `House` ID: {id}"))
    })
}

/// Checks whether the `If-None-Match` header carries the provided `etag`.
fn is_not_modified(headers: &HeaderMap, etag: &str) -> bool {
    headers
        .get(header::IF_NONE_MATCH)
        .is_some_and(|v| v.as_bytes() == etag.as_bytes())
}

/// Extracts the raw version token from the `If-Match` header, if any.
fn if_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::IF_MATCH)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

define_error! {
    enum PreconditionError {
        #[code = "IF_MATCH_REQUIRED"]
        #[status = PRECONDITION_REQUIRED]
        #[message = "`If-Match` header is required"]
        IfMatchRequired,
    }
}
