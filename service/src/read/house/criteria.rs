//! [`Criteria`] of [`House`]s search.

use std::{fmt, str::FromStr};

use derive_more::{Display, Error};

#[cfg(doc)]
use crate::domain::House;

/// Search criteria of [`House`]s: a mapping of filter names to their values.
///
/// Keeps the insertion order of keys. A repeated key replaces the previous
/// value while keeping its original position.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Criteria(Vec<(String, String)>);

impl Criteria {
    /// Indicates whether these [`Criteria`] are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value of the provided `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v.as_str()))
    }

    /// Returns an iterator over the key-value pairs of these [`Criteria`], in
    /// their insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses the [`Key`]s of these [`Criteria`] against the allow-list.
    ///
    /// # Errors
    ///
    /// With [`UnknownKey`] if any of the keys is not allowed.
    pub fn keys(&self) -> Result<Vec<Key>, UnknownKey> {
        self.0.iter().map(|(k, _)| k.parse()).collect()
    }
}

impl<K, V> FromIterator<(K, V)> for Criteria
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut pairs = Vec::<(String, String)>::new();
        for (key, value) in iter {
            let (key, value) = (key.into(), value.into());
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some((_, v)) => *v = value,
                None => pairs.push((key, value)),
            }
        }
        Self(pairs)
    }
}

impl fmt::Display for Criteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v:?}")?;
        }
        write!(f, "}}")
    }
}

/// Allowed key of [`Criteria`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key {
    /// Equality filter on a [`House`] property.
    Field(Field),

    /// Keyword flag filter.
    Flag(Flag),

    /// Free-text filter on the equipment label.
    Equipment,
}

impl Key {
    /// Name of the [`Key::Equipment`].
    pub const EQUIPMENT: &'static str = "equipment";
}

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::EQUIPMENT {
            return Ok(Self::Equipment);
        }
        if let Some(flag) = Flag::ALL.iter().find(|f| f.name() == s) {
            return Ok(Self::Flag(*flag));
        }
        Field::ALL
            .iter()
            .find(|f| f.name() == s)
            .map(|f| Self::Field(*f))
            .ok_or_else(|| UnknownKey(s.to_owned()))
    }
}

/// [`House`] property filterable by equality.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    /// [`House::id`].
    Id,

    /// [`House::version`].
    Version,

    /// [`House::kind`].
    Kind,

    /// [`House::num_floors`].
    NumFloors,

    /// [`House::num_rooms`].
    NumRooms,

    /// [`House::price`].
    Price,

    /// [`House::size`].
    Size,

    /// [`House::location`].
    Location,

    /// [`House::keywords`].
    Keywords,
}

impl Field {
    /// All the [`Field`]s.
    pub const ALL: [Self; 9] = [
        Self::Id,
        Self::Version,
        Self::Kind,
        Self::NumFloors,
        Self::NumRooms,
        Self::Price,
        Self::Size,
        Self::Location,
        Self::Keywords,
    ];

    /// Returns the name of this [`Field`] as used in [`Criteria`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Version => "version",
            Self::Kind => "type",
            Self::NumFloors => "floors",
            Self::NumRooms => "rooms",
            Self::Price => "price",
            Self::Size => "size",
            Self::Location => "location",
            Self::Keywords => "keywords",
        }
    }
}

/// Flag filtering [`House`]s tagged with a special keyword.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flag {
    /// Tagged with `Sternenhimmel`.
    Sternenhimmel,

    /// Tagged with `Wasserfall`.
    Wasserfall,

    /// Tagged with `Traumgarten`.
    Traumgarten,

    /// Tagged with `Himmelsleiter`.
    Himmelsleiter,
}

impl Flag {
    /// All the [`Flag`]s, in the order they are applied.
    pub const ALL: [Self; 4] = [
        Self::Sternenhimmel,
        Self::Wasserfall,
        Self::Traumgarten,
        Self::Himmelsleiter,
    ];

    /// Value of a [`Flag`] turning it on.
    pub const ON: &'static str = "true";

    /// Returns the name of this [`Flag`] as used in [`Criteria`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sternenhimmel => "sternenhimmel",
            Self::Wasserfall => "wasserfall",
            Self::Traumgarten => "traumgarten",
            Self::Himmelsleiter => "himmelsleiter",
        }
    }

    /// Returns the literal keyword this [`Flag`] matches.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Sternenhimmel => "Sternenhimmel",
            Self::Wasserfall => "Wasserfall",
            Self::Traumgarten => "Traumgarten",
            Self::Himmelsleiter => "Himmelsleiter",
        }
    }
}

/// Error of a [`Criteria`] key not being allowed.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("unknown criteria key `{_0}`")]
pub struct UnknownKey(#[error(not(source))] pub String);

#[cfg(test)]
mod spec {
    use super::{Criteria, Field, Flag, Key};

    #[test]
    fn parses_allowed_keys() {
        assert_eq!("equipment".parse(), Ok(Key::Equipment));
        assert_eq!("wasserfall".parse(), Ok(Key::Flag(Flag::Wasserfall)));
        assert_eq!("type".parse(), Ok(Key::Field(Field::Kind)));
        assert_eq!("floors".parse(), Ok(Key::Field(Field::NumFloors)));
        assert!("kind".parse::<Key>().is_err());
        assert!("Wasserfall".parse::<Key>().is_err());
        assert!("".parse::<Key>().is_err());
    }

    #[test]
    fn every_field_name_is_a_key() {
        for field in Field::ALL {
            assert_eq!(field.name().parse(), Ok(Key::Field(field)));
        }
        for flag in Flag::ALL {
            assert_eq!(flag.name().parse(), Ok(Key::Flag(flag)));
        }
    }

    #[test]
    fn repeated_key_keeps_first_position() {
        let criteria = Criteria::from_iter([
            ("rooms", "3"),
            ("type", "APARTMENT"),
            ("rooms", "4"),
        ]);

        assert_eq!(
            criteria.iter().collect::<Vec<_>>(),
            [("rooms", "4"), ("type", "APARTMENT")],
        );
        assert_eq!(criteria.get("rooms"), Some("4"));
    }

    #[test]
    fn reports_first_unknown_key() {
        let criteria =
            Criteria::from_iter([("rooms", "3"), ("color", "red"), ("x", "y")]);

        assert_eq!(criteria.keys().unwrap_err().0, "color");
    }

    #[test]
    fn displays_criteria() {
        let criteria = Criteria::from_iter([("rooms", "3"), ("location", "Ulm")]);

        assert_eq!(criteria.to_string(), r#"{rooms: "3", location: "Ulm"}"#);
        assert_eq!(Criteria::default().to_string(), "{}");
    }
}
