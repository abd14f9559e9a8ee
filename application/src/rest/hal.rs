//! [HAL] representations of [`House`]s.
//!
//! [HAL]: https://datatracker.ietf.org/doc/html/draft-kelly-json-hal

use axum::{async_trait, extract::FromRequestParts};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::Serialize;
use service::domain::{house, House};

use crate::{api, Error};

/// Media type of [HAL] documents.
///
/// [HAL]: https://datatracker.ietf.org/doc/html/draft-kelly-json-hal
pub const CONTENT_TYPE: &str = "application/hal+json";

/// Base URI of the REST API, as seen by the client.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct BaseUri(String);

impl BaseUri {
    /// Header carrying the scheme of the original request when proxied.
    const FORWARDED_PROTO: &'static str = "x-forwarded-proto";

    /// Resolves the [`BaseUri`] out of the provided request [`Parts`].
    ///
    /// [`None`] is returned if the request doesn't reveal its host.
    ///
    /// [`Parts`]: http::request::Parts
    #[must_use]
    pub fn from_parts(parts: &http::request::Parts) -> Option<Self> {
        let host = parts
            .headers
            .get(http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))?;
        let scheme = parts
            .headers
            .get(Self::FORWARDED_PROTO)
            .and_then(|h| h.to_str().ok())
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http");

        Some(Self(format!("{scheme}://{host}{}", super::BASE_PATH)))
    }

    /// Returns URI of the [`House`]s collection.
    #[must_use]
    pub fn houses(&self) -> String {
        self.0.clone()
    }

    /// Returns URI of the [`House`] with the provided ID.
    #[must_use]
    pub fn house(&self, id: house::Id) -> String {
        format!("{}/{id}", self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BaseUri
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)
            .ok_or_else(|| Error::bad_request(&"Missing `Host` header"))
    }
}

/// Hypermedia link.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Link {
    /// Target URI of this [`Link`].
    pub href: String,
}

/// [`Link`]s of a [`House`] representation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Links {
    /// The [`House`] itself.
    #[serde(rename = "self")]
    pub this: Link,

    /// Collection of all [`House`]s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Link>,

    /// Where new [`House`]s are created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<Link>,

    /// Where the [`House`] is updated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Link>,

    /// Where the [`House`] is removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<Link>,
}

impl Links {
    /// Creates all the [`Links`] of a standalone [`House`] representation.
    #[must_use]
    pub fn all(base: &BaseUri, id: house::Id) -> Self {
        let link = |href| Some(Link { href });
        Self {
            this: Link {
                href: base.house(id),
            },
            list: link(base.houses()),
            add: link(base.houses()),
            update: link(base.house(id)),
            remove: link(base.house(id)),
        }
    }

    /// Creates the [`Links`] of a [`House`] embedded into a collection.
    #[must_use]
    pub fn this(base: &BaseUri, id: house::Id) -> Self {
        Self {
            this: Link {
                href: base.house(id),
            },
            list: None,
            add: None,
            update: None,
            remove: None,
        }
    }
}

/// Representation of a [`House`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseModel {
    /// Kind of the [`House`].
    #[serde(rename = "type")]
    pub kind: api::house::Kind,

    /// Number of floors of the [`House`].
    pub floors: i16,

    /// Number of rooms of the [`House`].
    pub rooms: i16,

    /// Price of the [`House`].
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,

    /// Living space of the [`House`], in square meters.
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,

    /// Location of the [`House`], if known.
    pub location: Option<String>,

    /// Keywords of the [`House`].
    pub keywords: Vec<String>,

    /// Equipment of the [`House`].
    pub equipment: api::house::Equipment,

    /// Residents of the [`House`], if fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub residents: Option<Vec<api::house::Resident>>,

    /// [`Links`] of the [`House`].
    #[serde(rename = "_links")]
    pub links: Links,
}

impl HouseModel {
    /// Creates a new [`HouseModel`] of the provided [`House`].
    #[must_use]
    pub fn new(house: House, links: Links) -> Self {
        let House {
            kind,
            num_floors,
            num_rooms,
            price,
            size,
            location,
            keywords,
            equipment,
            residents,
            ..
        } = house;

        Self {
            kind: kind.into(),
            floors: num_floors.into(),
            rooms: num_rooms.into(),
            price: price.into(),
            size: size.into(),
            location: location.map(|l| l.to_string()),
            keywords: keywords.iter().map(ToString::to_string).collect(),
            equipment: equipment.into(),
            residents: residents
                .map(|rs| rs.into_iter().map(Into::into).collect()),
            links,
        }
    }
}

/// Representation of a [`House`]s collection.
#[derive(Clone, Debug, Serialize)]
pub struct HousesModel {
    /// Embedded [`HouseModel`]s.
    #[serde(rename = "_embedded")]
    pub embedded: Embedded,
}

/// Resources embedded into a [`HousesModel`].
#[derive(Clone, Debug, Serialize)]
pub struct Embedded {
    /// Found [`House`]s.
    pub houses: Vec<HouseModel>,
}

#[cfg(test)]
mod spec {
    use serde_json::json;
    use service::domain::{
        house::{self, equipment},
        House,
    };

    use super::{BaseUri, HouseModel, Links};

    fn base() -> BaseUri {
        let (parts, ()) = http::Request::get("/rest/1")
            .header(http::header::HOST, "localhost:8080")
            .body(())
            .unwrap()
            .into_parts();
        BaseUri::from_parts(&parts).unwrap()
    }

    fn house() -> House {
        let id = house::Id::new(1).unwrap();
        let location = house::Location::new("Karlsruhe");
        House {
            id,
            version: house::Version::from(3),
            hash: house::Hash::new(location.as_ref(), house::Kind::SingleFamily),
            kind: house::Kind::SingleFamily,
            num_floors: house::NumFloors::new(2).unwrap(),
            num_rooms: house::NumRooms::new(6).unwrap(),
            price: "350000.50".parse().unwrap(),
            size: "120.75".parse().unwrap(),
            location,
            keywords: "Traumgarten".parse().unwrap(),
            equipment: house::Equipment {
                id: equipment::Id::new(1).unwrap(),
                house_id: id,
                basement: true,
                garden: true,
                garage: false,
            },
            residents: None,
        }
    }

    #[test]
    fn resolves_base_uri_from_host() {
        assert_eq!(base().to_string(), "http://localhost:8080/rest");
    }

    #[test]
    fn respects_forwarded_scheme() {
        let (parts, ()) = http::Request::get("/rest")
            .header(http::header::HOST, "houses.example.com")
            .header("X-Forwarded-Proto", "https")
            .body(())
            .unwrap()
            .into_parts();

        let base = BaseUri::from_parts(&parts).unwrap();

        assert_eq!(base.houses(), "https://houses.example.com/rest");
    }

    #[test]
    fn renders_standalone_house() {
        let model = HouseModel::new(
            house(),
            Links::all(&base(), house::Id::new(1).unwrap()),
        );

        assert_eq!(
            serde_json::to_value(model).unwrap(),
            json!({
                "type": "SINGLE_FAMILY",
                "floors": 2,
                "rooms": 6,
                "price": 350_000.5,
                "size": 120.75,
                "location": "Karlsruhe",
                "keywords": ["Traumgarten"],
                "equipment": {
                    "basement": true,
                    "garden": true,
                    "garage": false,
                },
                "_links": {
                    "self": {"href": "http://localhost:8080/rest/1"},
                    "list": {"href": "http://localhost:8080/rest"},
                    "add": {"href": "http://localhost:8080/rest"},
                    "update": {"href": "http://localhost:8080/rest/1"},
                    "remove": {"href": "http://localhost:8080/rest/1"},
                },
            }),
        );
    }

    #[test]
    fn embedded_house_links_only_itself() {
        let links = Links::this(&base(), house::Id::new(7).unwrap());

        assert_eq!(
            serde_json::to_value(links).unwrap(),
            json!({"self": {"href": "http://localhost:8080/rest/7"}}),
        );
    }
}
