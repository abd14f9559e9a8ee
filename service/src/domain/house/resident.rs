//! [`Resident`] definitions.

use std::str::FromStr;

use derive_more::{AsRef, Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
#[cfg(feature = "serde")]
use serde::Serialize;

use super::House;

/// Person living in a [`House`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resident {
    /// ID of this [`Resident`].
    pub id: Id,

    /// ID of the [`House`] this [`Resident`] lives in.
    pub house_id: super::Id,

    /// [`FirstName`] of this [`Resident`].
    pub first_name: FirstName,

    /// [`LastName`] of this [`Resident`].
    pub last_name: LastName,

    /// [`Age`] of this [`Resident`].
    pub age: Age,

    /// [`Occupation`] of this [`Resident`], if any.
    pub occupation: Option<Occupation>,
}

/// [`Resident`] of a new [`House`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Draft {
    /// [`FirstName`] of the new [`Resident`].
    pub first_name: FirstName,

    /// [`LastName`] of the new [`Resident`].
    pub last_name: LastName,

    /// [`Age`] of the new [`Resident`].
    pub age: Age,

    /// [`Occupation`] of the new [`Resident`], if any.
    pub occupation: Option<Occupation>,
}

/// ID of a [`Resident`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(i32);

impl Id {
    /// Creates a new [`Id`] if the given `id` is positive.
    #[must_use]
    pub fn new(id: i32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }
}

/// Maximum length of [`Resident`]'s textual attributes, in characters.
const MAX_TEXT_LEN: usize = 30;

/// Checks whether the given `text` is trimmed, non-empty and not too long.
fn check_text(text: &str) -> bool {
    text.trim() == text
        && !text.is_empty()
        && text.chars().count() <= MAX_TEXT_LEN
}

/// First name of a [`Resident`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
#[as_ref(forward)]
pub struct FirstName(String);

impl FirstName {
    /// Creates a new [`FirstName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        check_text(&name).then_some(Self(name))
    }
}

impl FromStr for FirstName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `FirstName`")
    }
}

/// Last name of a [`Resident`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
#[as_ref(forward)]
pub struct LastName(String);

impl LastName {
    /// Creates a new [`LastName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        check_text(&name).then_some(Self(name))
    }
}

impl FromStr for LastName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `LastName`")
    }
}

/// Occupation of a [`Resident`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
#[as_ref(forward)]
pub struct Occupation(String);

impl Occupation {
    /// Creates a new [`Occupation`] if the given `occupation` is valid.
    #[must_use]
    pub fn new(occupation: impl Into<String>) -> Option<Self> {
        let occupation = occupation.into();
        check_text(&occupation).then_some(Self(occupation))
    }
}

impl FromStr for Occupation {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Occupation`")
    }
}

/// Age of a [`Resident`], in full years.
///
/// Only adults up to 100 years old are registered.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Age(i16);

impl Age {
    /// Minimal allowed [`Age`].
    pub const MIN: Self = Self(18);

    /// Maximal allowed [`Age`].
    pub const MAX: Self = Self(100);

    /// Creates a new [`Age`] if the given `age` is within the allowed range.
    #[must_use]
    pub fn new(age: i16) -> Option<Self> {
        (Self::MIN.0..=Self::MAX.0).contains(&age).then_some(Self(age))
    }
}
