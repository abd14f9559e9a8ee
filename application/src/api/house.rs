//! [`House`]-related definitions.

use derive_more::From;
use itertools::Itertools as _;
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
};
use rust_decimal::{
    prelude::{FromPrimitive as _, ToPrimitive as _},
    Decimal,
};
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        self,
        house::{self, equipment, resident},
    },
};

use crate::{define_error, Context, Error};

/// A house.
#[derive(Clone, Debug, From)]
pub struct House(domain::House);

/// A house.
#[graphql_object(context = Context)]
impl House {
    /// Unique identifier of this `House`.
    pub fn id(&self) -> i32 {
        self.0.id.into()
    }

    /// Version of this `House`, incremented on every update.
    pub fn version(&self) -> i32 {
        self.0.version.into()
    }

    /// Kind of this `House`.
    #[graphql(name = "type")]
    pub fn kind(&self) -> Kind {
        self.0.kind.into()
    }

    /// Number of floors of this `House`.
    pub fn floors(&self) -> i32 {
        i16::from(self.0.num_floors).into()
    }

    /// Number of rooms of this `House`.
    pub fn rooms(&self) -> i32 {
        i16::from(self.0.num_rooms).into()
    }

    /// Price of this `House`.
    pub fn price(&self) -> Result<f64, Error> {
        to_float(self.0.price.into())
    }

    /// Living space of this `House`, in square meters.
    pub fn size(&self) -> Result<f64, Error> {
        to_float(self.0.size.into())
    }

    /// Location of this `House`, if known.
    pub fn location(&self) -> Option<String> {
        self.0.location.as_ref().map(ToString::to_string)
    }

    /// Keywords describing this `House`.
    pub fn keywords(&self) -> Vec<String> {
        self.0.keywords.iter().map(ToString::to_string).collect()
    }

    /// `Equipment` of this `House`.
    pub fn equipment(&self) -> Equipment {
        self.0.equipment.clone().into()
    }

    /// `Resident`s of this `House`.
    ///
    /// `null` unless requested explicitly.
    pub fn residents(&self) -> Option<Vec<Resident>> {
        self.0
            .residents
            .as_ref()
            .map(|rs| rs.iter().cloned().map(Into::into).collect())
    }
}

/// Converts the provided [`Decimal`] into a GraphQL `Float`.
fn to_float(value: Decimal) -> Result<f64, Error> {
    value
        .to_f64()
        .ok_or_else(|| Error::internal(&format!("`{value}` is not a float")))
}

/// Kind of a `House`.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, GraphQLEnum, PartialEq, Serialize,
)]
#[graphql(name = "HouseKind")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Kind {
    /// House for a single family.
    SingleFamily,

    /// House for multiple families.
    MultiFamily,

    /// Apartment building.
    Apartment,
}

impl From<house::Kind> for Kind {
    fn from(kind: house::Kind) -> Self {
        match kind {
            house::Kind::SingleFamily => Self::SingleFamily,
            house::Kind::MultiFamily => Self::MultiFamily,
            house::Kind::Apartment => Self::Apartment,
        }
    }
}

impl From<Kind> for house::Kind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::SingleFamily => Self::SingleFamily,
            Kind::MultiFamily => Self::MultiFamily,
            Kind::Apartment => Self::Apartment,
        }
    }
}

/// Equipment of a `House`.
#[derive(Clone, Debug, GraphQLObject, Serialize)]
#[graphql(name = "HouseEquipment")]
pub struct Equipment {
    /// Whether the `House` has a basement.
    pub basement: bool,

    /// Whether the `House` has a garden.
    pub garden: bool,

    /// Whether the `House` has a garage.
    pub garage: bool,
}

impl From<house::Equipment> for Equipment {
    fn from(equipment: house::Equipment) -> Self {
        let house::Equipment {
            basement,
            garden,
            garage,
            ..
        } = equipment;
        Self {
            basement,
            garden,
            garage,
        }
    }
}

/// Resident of a `House`.
#[derive(Clone, Debug, GraphQLObject, Serialize)]
#[graphql(name = "HouseResident")]
#[serde(rename_all = "camelCase")]
pub struct Resident {
    /// First name of this `Resident`.
    pub first_name: String,

    /// Last name of this `Resident`.
    pub last_name: String,

    /// Age of this `Resident`, in full years.
    pub age: i32,

    /// Occupation of this `Resident`, if any.
    pub occupation: Option<String>,
}

impl From<house::Resident> for Resident {
    fn from(resident: house::Resident) -> Self {
        let house::Resident {
            first_name,
            last_name,
            age,
            occupation,
            ..
        } = resident;
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            age: i16::from(age).into(),
            occupation: occupation.map(|o| o.to_string()),
        }
    }
}

/// Input of a new `House`.
#[derive(Clone, Debug, Deserialize, GraphQLInputObject)]
#[serde(rename_all = "camelCase")]
pub struct HouseInput {
    /// Kind of the `House`.
    #[graphql(name = "type")]
    #[serde(rename = "type")]
    pub kind: Kind,

    /// Number of floors, positive.
    pub floors: i32,

    /// Number of rooms, positive.
    pub rooms: i32,

    /// Price, positive, rounded to cents.
    pub price: f64,

    /// Living space in square meters, positive.
    pub size: f64,

    /// Location, up to 40 characters.
    pub location: Option<String>,

    /// Unique keywords.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,

    /// Equipment of the `House`.
    pub equipment: EquipmentInput,

    /// Residents of the `House`.
    #[serde(default)]
    pub residents: Option<Vec<ResidentInput>>,
}

impl TryFrom<HouseInput> for command::CreateHouse {
    type Error = Error;

    fn try_from(input: HouseInput) -> Result<Self, Self::Error> {
        let HouseInput {
            kind,
            floors,
            rooms,
            price,
            size,
            location,
            keywords,
            equipment: EquipmentInput {
                basement,
                garden,
                garage,
            },
            residents,
        } = input;

        Ok(Self {
            kind: kind.into(),
            num_floors: num_floors(floors)?,
            num_rooms: num_rooms(rooms)?,
            price: price_of(price)?,
            size: size_of(size)?,
            location: location.map(location_of).transpose()?,
            keywords: keywords_of(keywords.unwrap_or_default())?,
            equipment: equipment::Draft {
                basement,
                garden,
                garage,
            },
            residents: residents
                .unwrap_or_default()
                .into_iter()
                .map(resident::Draft::try_from)
                .try_collect()?,
        })
    }
}

/// Input of `House` equipment.
#[derive(Clone, Copy, Debug, Deserialize, GraphQLInputObject)]
#[graphql(name = "HouseEquipmentInput")]
pub struct EquipmentInput {
    /// Whether the `House` has a basement.
    #[serde(default)]
    pub basement: bool,

    /// Whether the `House` has a garden.
    #[serde(default)]
    pub garden: bool,

    /// Whether the `House` has a garage.
    #[serde(default)]
    pub garage: bool,
}

/// Input of a `House` resident.
#[derive(Clone, Debug, Deserialize, GraphQLInputObject)]
#[graphql(name = "HouseResidentInput")]
#[serde(rename_all = "camelCase")]
pub struct ResidentInput {
    /// First name, 1 to 30 characters.
    pub first_name: String,

    /// Last name, 1 to 30 characters.
    pub last_name: String,

    /// Age, from 18 to 100 years.
    pub age: i32,

    /// Occupation, 1 to 30 characters.
    pub occupation: Option<String>,
}

impl TryFrom<ResidentInput> for resident::Draft {
    type Error = Error;

    fn try_from(input: ResidentInput) -> Result<Self, Self::Error> {
        let ResidentInput {
            first_name,
            last_name,
            age,
            occupation,
        } = input;

        Ok(Self {
            first_name: valid("firstName", resident::FirstName::new(first_name))?,
            last_name: valid("lastName", resident::LastName::new(last_name))?,
            age: valid(
                "age",
                i16::try_from(age).ok().and_then(resident::Age::new),
            )?,
            occupation: occupation
                .map(|o| valid("occupation", resident::Occupation::new(o)))
                .transpose()?,
        })
    }
}

/// Input of `House` changes.
///
/// Omitted fields keep their persisted values.
#[derive(Clone, Debug, Default, Deserialize, GraphQLInputObject)]
#[serde(rename_all = "camelCase")]
pub struct HouseChangesInput {
    /// New kind of the `House`.
    #[graphql(name = "type")]
    #[serde(rename = "type")]
    pub kind: Option<Kind>,

    /// New number of floors, positive.
    pub floors: Option<i32>,

    /// New number of rooms, positive.
    pub rooms: Option<i32>,

    /// New price, positive, rounded to cents.
    pub price: Option<f64>,

    /// New living space in square meters, positive.
    pub size: Option<f64>,

    /// New location, up to 40 characters.
    pub location: Option<String>,

    /// New unique keywords.
    pub keywords: Option<Vec<String>>,
}

impl TryFrom<HouseChangesInput> for house::Changes {
    type Error = Error;

    fn try_from(input: HouseChangesInput) -> Result<Self, Self::Error> {
        let HouseChangesInput {
            kind,
            floors,
            rooms,
            price,
            size,
            location,
            keywords,
        } = input;

        Ok(Self {
            kind: kind.map(Into::into),
            num_floors: floors.map(num_floors).transpose()?,
            num_rooms: rooms.map(num_rooms).transpose()?,
            price: price.map(price_of).transpose()?,
            size: size.map(size_of).transpose()?,
            location: location.map(location_of).transpose()?,
            keywords: keywords.map(keywords_of).transpose()?,
        })
    }
}

/// Input of a `House` update.
#[derive(Clone, Debug, GraphQLInputObject)]
pub struct HouseUpdateInput {
    /// ID of the `House` to update.
    pub id: i32,

    /// Version of the `House` the changes are based on.
    pub version: i32,

    /// Changes to apply.
    pub house: HouseChangesInput,
}

impl TryFrom<HouseUpdateInput> for command::UpdateHouse {
    type Error = Error;

    fn try_from(input: HouseUpdateInput) -> Result<Self, Self::Error> {
        let HouseUpdateInput { id, version, house } = input;

        Ok(Self {
            id: house::Id::new(id).ok_or_else(|| {
                Error::from(HouseError::NotExists)
                    .with_message(&format!("`House(id: {id})` does not exist"))
            })?,
            changes: house.try_into()?,
            version: house::Version::from(version).token(),
        })
    }
}

/// Single search criterion of `House`s.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "HouseCriterionInput")]
pub struct CriterionInput {
    /// Name of the filter.
    pub key: String,

    /// Value of the filter.
    pub value: String,
}

/// Result of a `House` creation.
#[derive(Clone, Copy, Debug, GraphQLObject)]
pub struct CreatePayload {
    /// ID of the created `House`.
    pub id: i32,
}

/// Result of a `House` update.
#[derive(Clone, Copy, Debug, GraphQLObject)]
pub struct UpdatePayload {
    /// New version of the updated `House`.
    pub version: i32,
}

/// Checks the parsed value of the `field`, failing with a
/// [`Error::bad_request()`] if it's invalid.
fn valid<T>(field: &str, value: Option<T>) -> Result<T, Error> {
    value.ok_or_else(|| Error::bad_request(&format!("Invalid `{field}` value")))
}

/// Parses [`house::NumFloors`].
fn num_floors(floors: i32) -> Result<house::NumFloors, Error> {
    valid(
        "floors",
        i16::try_from(floors).ok().and_then(house::NumFloors::new),
    )
}

/// Parses [`house::NumRooms`].
fn num_rooms(rooms: i32) -> Result<house::NumRooms, Error> {
    valid(
        "rooms",
        i16::try_from(rooms).ok().and_then(house::NumRooms::new),
    )
}

/// Parses [`house::Price`], rounding it to cents.
fn price_of(price: f64) -> Result<house::Price, Error> {
    valid(
        "price",
        Decimal::from_f64(price).and_then(|p| house::Price::new(p.round_dp(2))),
    )
}

/// Parses [`house::Size`], rounding it to hundredths.
fn size_of(size: f64) -> Result<house::Size, Error> {
    valid(
        "size",
        Decimal::from_f64(size).and_then(|s| house::Size::new(s.round_dp(2))),
    )
}

/// Parses [`house::Location`].
fn location_of(location: String) -> Result<house::Location, Error> {
    valid("location", house::Location::new(location))
}

/// Parses [`house::Keywords`], rejecting duplicates.
fn keywords_of(keywords: Vec<String>) -> Result<house::Keywords, Error> {
    let keywords = keywords
        .into_iter()
        .map(|k| valid("keywords", house::Keyword::new(k)))
        .collect::<Result<Vec<_>, _>>()?;
    valid("keywords", house::Keywords::new(keywords))
}

define_error! {
    enum HouseError {
        #[code = "HOUSE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`House` does not exist"]
        NotExists,

        #[code = "HOUSE_EXISTS"]
        #[status = CONFLICT]
        #[message = "`House` of the same type at the same location exists"]
        Exists,
    }
}

#[cfg(test)]
mod spec {
    use service::{command, domain::house};

    use super::{
        EquipmentInput, HouseChangesInput, HouseInput, HouseUpdateInput, Kind,
        ResidentInput,
    };

    fn input() -> HouseInput {
        HouseInput {
            kind: Kind::MultiFamily,
            floors: 3,
            rooms: 9,
            price: 480_000.499,
            size: 210.5,
            location: Some("Karlsruhe".into()),
            keywords: Some(vec!["Sternenhimmel".into(), "Traumgarten".into()]),
            equipment: EquipmentInput {
                basement: true,
                garden: false,
                garage: true,
            },
            residents: Some(vec![ResidentInput {
                first_name: "Max".into(),
                last_name: "Mustermann".into(),
                age: 35,
                occupation: None,
            }]),
        }
    }

    #[test]
    fn converts_valid_input() {
        let cmd = command::CreateHouse::try_from(input()).unwrap();

        assert_eq!(cmd.kind, house::Kind::MultiFamily);
        assert_eq!(i16::from(cmd.num_floors), 3);
        assert_eq!(cmd.price.to_string(), "480000.50");
        assert_eq!(cmd.keywords.joined().unwrap(), "Sternenhimmel,Traumgarten");
        assert_eq!(cmd.equipment.label(), "basement garage");
        assert_eq!(cmd.residents.len(), 1);
    }

    #[test]
    fn rejects_invalid_values() {
        for broken in [
            HouseInput {
                floors: 0,
                ..input()
            },
            HouseInput {
                price: -1.0,
                ..input()
            },
            HouseInput {
                price: 1e9,
                ..input()
            },
            HouseInput {
                size: 123_456_789.0,
                ..input()
            },
            HouseInput {
                keywords: Some((0..20).map(|i| format!("{i:030}")).collect()),
                ..input()
            },
            HouseInput {
                keywords: Some(vec!["Wasserfall".into(), "Wasserfall".into()]),
                ..input()
            },
            HouseInput {
                location: Some("x".repeat(41)),
                ..input()
            },
            HouseInput {
                residents: Some(vec![ResidentInput {
                    first_name: "Kid".into(),
                    last_name: "Mustermann".into(),
                    age: 12,
                    occupation: None,
                }]),
                ..input()
            },
        ] {
            let err = command::CreateHouse::try_from(broken).unwrap_err();

            assert_eq!(err.code, "BAD_REQUEST");
            assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn formats_version_into_token() {
        let cmd = command::UpdateHouse::try_from(HouseUpdateInput {
            id: 7,
            version: 5,
            house: HouseChangesInput {
                rooms: Some(4),
                ..HouseChangesInput::default()
            },
        })
        .unwrap();

        assert_eq!(cmd.version, "\"5\"");
        assert_eq!(cmd.changes.num_rooms.map(i16::from), Some(4));
        assert!(cmd.changes.kind.is_none());
    }

    #[test]
    fn rejects_non_positive_id_as_missing() {
        let err = command::UpdateHouse::try_from(HouseUpdateInput {
            id: 0,
            version: 0,
            house: HouseChangesInput::default(),
        })
        .unwrap_err();

        assert_eq!(err.code, "HOUSE_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);
    }
}
