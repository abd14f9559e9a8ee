//! [`House`] list definitions.

use derive_more::{Display, Error, From};

use crate::domain::house;
#[cfg(doc)]
use crate::domain::House;

use super::criteria::{Criteria, Field, Flag, Key, UnknownKey};

/// Single condition on a [`House`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match against the equipment label.
    EquipmentLike(String),

    /// [`House`] keywords contain the [`Flag::tag()`].
    Tagged(Flag),

    /// [`House`] property equals the [`Value`].
    Equals(Value),
}

/// Typed value of a [`House`] property to compare with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// [`House::id`] value.
    Id(house::Id),

    /// [`House::version`] value.
    Version(house::Version),

    /// [`House::kind`] value.
    Kind(house::Kind),

    /// [`House::num_floors`] value.
    NumFloors(house::NumFloors),

    /// [`House::num_rooms`] value.
    NumRooms(house::NumRooms),

    /// [`House::price`] value.
    Price(house::Price),

    /// [`House::size`] value.
    Size(house::Size),

    /// [`House::location`] value.
    Location(house::Location),

    /// [`House::keywords`] value.
    Keywords(house::Keywords),
}

impl Value {
    /// Parses a [`Value`] of the provided [`Field`].
    ///
    /// # Errors
    ///
    /// With [`InvalidValue`] if the `raw` value cannot be parsed into the
    /// [`Field`]'s type.
    pub fn parse(field: Field, raw: &str) -> Result<Self, InvalidValue> {
        let value = match field {
            Field::Id => raw.parse().map(Self::Id).ok(),
            Field::Version => raw.parse().map(Self::Version).ok(),
            Field::Kind => raw.parse().map(Self::Kind).ok(),
            Field::NumFloors => raw.parse().map(Self::NumFloors).ok(),
            Field::NumRooms => raw.parse().map(Self::NumRooms).ok(),
            Field::Price => raw.parse().map(Self::Price).ok(),
            Field::Size => raw.parse().map(Self::Size).ok(),
            Field::Location => raw.parse().map(Self::Location).ok(),
            Field::Keywords => raw.parse().map(Self::Keywords).ok(),
        };
        value.ok_or_else(|| InvalidValue {
            key: field.name(),
            value: raw.to_owned(),
        })
    }

    /// Returns the [`Field`] this [`Value`] belongs to.
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            Self::Id(_) => Field::Id,
            Self::Version(_) => Field::Version,
            Self::Kind(_) => Field::Kind,
            Self::NumFloors(_) => Field::NumFloors,
            Self::NumRooms(_) => Field::NumRooms,
            Self::Price(_) => Field::Price,
            Self::Size(_) => Field::Size,
            Self::Location(_) => Field::Location,
            Self::Keywords(_) => Field::Keywords,
        }
    }
}

/// Immutable composition of [`Predicate`]s, all of which must hold.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Filter {
    /// First applicable [`Predicate`].
    pub root: Predicate,

    /// [`Predicate`]s joined to the [`Filter::root`].
    pub conjuncts: Vec<Predicate>,
}

impl Filter {
    /// Folds the provided [`Predicate`]s into a [`Filter`], keeping their
    /// order.
    ///
    /// Returns [`None`] if there are no [`Predicate`]s at all.
    #[must_use]
    pub fn compose(predicates: impl IntoIterator<Item = Predicate>) -> Option<Self> {
        predicates.into_iter().fold(None, |filter, p| match filter {
            None => Some(Self {
                root: p,
                conjuncts: vec![],
            }),
            Some(Self {
                root,
                mut conjuncts,
            }) => {
                conjuncts.push(p);
                Some(Self { root, conjuncts })
            }
        })
    }

    /// Builds a [`Filter`] out of the provided [`Criteria`].
    ///
    /// [`Predicate`]s are applied in a fixed order: the equipment filter
    /// first, then the enabled [`Flag`]s in [`Flag::ALL`] order, then the
    /// property equalities in the [`Criteria`] order.
    ///
    /// # Errors
    ///
    /// - [`InvalidCriteria::UnknownKey`] if any key of the [`Criteria`] is
    ///   not allowed;
    /// - [`InvalidCriteria::InvalidValue`] if any property value cannot be
    ///   parsed.
    pub fn from_criteria(
        criteria: &Criteria,
    ) -> Result<Option<Self>, InvalidCriteria> {
        let keys = criteria.keys()?;

        let equipment = criteria
            .get(Key::EQUIPMENT)
            .map(|text| Predicate::EquipmentLike(text.to_owned()));
        let flags = Flag::ALL
            .into_iter()
            .filter(|f| criteria.get(f.name()) == Some(Flag::ON))
            .map(Predicate::Tagged);
        let fields = keys
            .into_iter()
            .zip(criteria.iter())
            .filter_map(|(key, (_, raw))| match key {
                Key::Field(field) => Some(Value::parse(field, raw)),
                Key::Flag(_) | Key::Equipment => None,
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::compose(
            equipment
                .into_iter()
                .chain(flags)
                .chain(fields.into_iter().map(Predicate::Equals)),
        ))
    }

    /// Returns an iterator over all the [`Predicate`]s of this [`Filter`],
    /// starting from its [`Filter::root`].
    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        std::iter::once(&self.root).chain(&self.conjuncts)
    }
}

/// Error of a [`Criteria`] value not matching its property type.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("invalid `{key}` criteria value: {value:?}")]
pub struct InvalidValue {
    /// Name of the key.
    pub key: &'static str,

    /// Unparsable value.
    pub value: String,
}

/// Error of [`Criteria`] being invalid.
#[derive(Clone, Debug, Display, Eq, Error, From, PartialEq)]
pub enum InvalidCriteria {
    /// Key is not allowed.
    UnknownKey(UnknownKey),

    /// Value cannot be parsed.
    InvalidValue(InvalidValue),
}

#[cfg(test)]
mod spec {
    use crate::domain::house;

    use super::{Criteria, Filter, Flag, InvalidCriteria, Predicate, Value};

    #[test]
    fn composes_nothing_into_none() {
        assert_eq!(Filter::compose([]), None);
        assert_eq!(Filter::from_criteria(&Criteria::default()), Ok(None));
    }

    #[test]
    fn first_predicate_is_root() {
        let filter = Filter::compose([
            Predicate::Tagged(Flag::Wasserfall),
            Predicate::Tagged(Flag::Traumgarten),
            Predicate::EquipmentLike("garden".into()),
        ])
        .unwrap();

        assert_eq!(filter.root, Predicate::Tagged(Flag::Wasserfall));
        assert_eq!(
            filter.conjuncts,
            [
                Predicate::Tagged(Flag::Traumgarten),
                Predicate::EquipmentLike("garden".into()),
            ],
        );
    }

    #[test]
    fn orders_equipment_then_flags_then_fields() {
        let criteria = Criteria::from_iter([
            ("rooms", "4"),
            ("wasserfall", "true"),
            ("type", "APARTMENT"),
            ("sternenhimmel", "true"),
            ("equipment", "Garage"),
        ]);

        let filter = Filter::from_criteria(&criteria).unwrap().unwrap();

        assert_eq!(
            filter.predicates().cloned().collect::<Vec<_>>(),
            [
                Predicate::EquipmentLike("Garage".into()),
                Predicate::Tagged(Flag::Sternenhimmel),
                Predicate::Tagged(Flag::Wasserfall),
                Predicate::Equals(Value::NumRooms(
                    house::NumRooms::new(4).unwrap(),
                )),
                Predicate::Equals(Value::Kind(house::Kind::Apartment)),
            ],
        );
    }

    #[test]
    fn skips_flags_not_exactly_true() {
        let criteria = Criteria::from_iter([
            ("sternenhimmel", "TRUE"),
            ("wasserfall", "false"),
            ("traumgarten", "1"),
        ]);

        assert_eq!(Filter::from_criteria(&criteria), Ok(None));
    }

    #[test]
    fn rejects_unknown_keys() {
        let criteria = Criteria::from_iter([("rooms", "4"), ("pool", "true")]);

        assert!(matches!(
            Filter::from_criteria(&criteria),
            Err(InvalidCriteria::UnknownKey(k)) if k.0 == "pool",
        ));
    }

    #[test]
    fn rejects_unparsable_values() {
        for (key, value) in
            [("rooms", "many"), ("type", "castle"), ("price", "-1"), ("id", "0")]
        {
            let criteria = Criteria::from_iter([(key, value)]);

            assert!(
                matches!(
                    Filter::from_criteria(&criteria),
                    Err(InvalidCriteria::InvalidValue(v)) if v.key == key,
                ),
                "{key}={value}",
            );
        }
    }
}
