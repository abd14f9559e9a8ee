//! [`Equipment`] definitions.

use derive_more::{Display, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

use super::House;

/// Equipment of a [`House`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Equipment {
    /// ID of this [`Equipment`].
    pub id: Id,

    /// ID of the [`House`] this [`Equipment`] belongs to.
    pub house_id: super::Id,

    /// Indicator whether the [`House`] has a basement.
    pub basement: bool,

    /// Indicator whether the [`House`] has a garden.
    pub garden: bool,

    /// Indicator whether the [`House`] has a garage.
    pub garage: bool,
}

impl Equipment {
    /// Returns the searchable label of this [`Equipment`].
    #[must_use]
    pub fn label(&self) -> String {
        label(self.basement, self.garden, self.garage)
    }
}

/// [`Equipment`] of a new [`House`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Draft {
    /// Indicator whether the new [`House`] has a basement.
    pub basement: bool,

    /// Indicator whether the new [`House`] has a garden.
    pub garden: bool,

    /// Indicator whether the new [`House`] has a garage.
    pub garage: bool,
}

impl Draft {
    /// Returns the searchable label of this [`Draft`].
    #[must_use]
    pub fn label(&self) -> String {
        label(self.basement, self.garden, self.garage)
    }
}

/// ID of an [`Equipment`].
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

/// Builds a label listing the present features, space-separated, in the
/// fixed `basement garden garage` order.
fn label(basement: bool, garden: bool, garage: bool) -> String {
    [(basement, "basement"), (garden, "garden"), (garage, "garage")]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod spec {
    use super::Draft;

    #[test]
    fn labels_present_features_in_order() {
        let draft = |basement, garden, garage| Draft {
            basement,
            garden,
            garage,
        };

        assert_eq!(draft(true, true, true).label(), "basement garden garage");
        assert_eq!(draft(false, true, true).label(), "garden garage");
        assert_eq!(draft(true, false, false).label(), "basement");
        assert_eq!(draft(false, false, false).label(), "");
    }
}
