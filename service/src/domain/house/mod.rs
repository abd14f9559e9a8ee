//! [`House`] definitions.

pub mod equipment;
pub mod resident;

use std::{str::FromStr, sync::LazyLock};

use common::define_kind;
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::Decimal;
#[cfg(feature = "serde")]
use serde::Serialize;
use uuid::Uuid;
use xxhash_rust::xxh3;

pub use self::{equipment::Equipment, resident::Resident};

/// House offered by the agency.
#[derive(Clone, Debug)]
pub struct House {
    /// ID of this [`House`].
    pub id: Id,

    /// Current [`Version`] of this [`House`].
    pub version: Version,

    /// [`Hash`] of this [`House`] used for deduplication.
    ///
    /// [`Hash`]: struct@Hash
    pub hash: Hash,

    /// [`Kind`] of this [`House`].
    pub kind: Kind,

    /// Number of floors in this [`House`].
    pub num_floors: NumFloors,

    /// Number of rooms in this [`House`].
    pub num_rooms: NumRooms,

    /// [`Price`] of this [`House`].
    pub price: Price,

    /// [`Size`] of this [`House`].
    pub size: Size,

    /// [`Location`] of this [`House`], if known.
    pub location: Option<Location>,

    /// [`Keywords`] describing this [`House`].
    pub keywords: Keywords,

    /// [`Equipment`] of this [`House`].
    pub equipment: Equipment,

    /// [`Resident`]s of this [`House`].
    ///
    /// [`None`] means that [`Resident`]s were not fetched, while an empty
    /// [`Vec`] means that nobody lives in this [`House`].
    pub residents: Option<Vec<Resident>>,
}

impl House {
    /// Applies the provided [`Changes`] to this [`House`].
    ///
    /// Absent [`Changes`] keep the current values untouched. The [`Hash`] is
    /// recalculated afterwards.
    ///
    /// [`Hash`]: struct@Hash
    pub fn apply(&mut self, changes: Changes) {
        let Changes {
            kind,
            num_floors,
            num_rooms,
            price,
            size,
            location,
            keywords,
        } = changes;

        if let Some(kind) = kind {
            self.kind = kind;
        }
        if let Some(num_floors) = num_floors {
            self.num_floors = num_floors;
        }
        if let Some(num_rooms) = num_rooms {
            self.num_rooms = num_rooms;
        }
        if let Some(price) = price {
            self.price = price;
        }
        if let Some(size) = size {
            self.size = size;
        }
        if location.is_some() {
            self.location = location;
        }
        if let Some(keywords) = keywords {
            self.keywords = keywords;
        }

        self.hash = Hash::new(self.location.as_ref(), self.kind);
    }
}

/// Data of a new [`House`] to be stored.
#[derive(Clone, Debug)]
pub struct Draft {
    /// [`Hash`] of the new [`House`].
    ///
    /// [`Hash`]: struct@Hash
    pub hash: Hash,

    /// [`Kind`] of the new [`House`].
    pub kind: Kind,

    /// Number of floors in the new [`House`].
    pub num_floors: NumFloors,

    /// Number of rooms in the new [`House`].
    pub num_rooms: NumRooms,

    /// [`Price`] of the new [`House`].
    pub price: Price,

    /// [`Size`] of the new [`House`].
    pub size: Size,

    /// [`Location`] of the new [`House`], if known.
    pub location: Option<Location>,

    /// [`Keywords`] of the new [`House`].
    pub keywords: Keywords,

    /// [`Equipment`] of the new [`House`].
    pub equipment: equipment::Draft,

    /// [`Resident`]s of the new [`House`].
    pub residents: Vec<resident::Draft>,
}

/// Partial changes of a [`House`].
#[derive(Clone, Debug, Default)]
pub struct Changes {
    /// New [`Kind`].
    pub kind: Option<Kind>,

    /// New number of floors.
    pub num_floors: Option<NumFloors>,

    /// New number of rooms.
    pub num_rooms: Option<NumRooms>,

    /// New [`Price`].
    pub price: Option<Price>,

    /// New [`Size`].
    pub size: Option<Size>,

    /// New [`Location`].
    pub location: Option<Location>,

    /// New [`Keywords`].
    pub keywords: Option<Keywords>,
}

/// ID of a [`House`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Id(i32);

impl Id {
    /// Creates a new [`Id`] if the given `id` is positive.
    #[must_use]
    pub fn new(id: i32) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }
}

impl FromStr for Id {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `house::Id`")
    }
}

/// Version of a [`House`] used for optimistic concurrency control.
///
/// Every successful update of a [`House`] increments its [`Version`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Version(i32);

impl Version {
    /// Parses a [`Version`] out of its quoted token (like `"3"`), as used in
    /// `ETag` and `If-Match` HTTP headers.
    ///
    /// Only tokens of 1 to 3 digits wrapped into double quotes are accepted.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        /// Regular expression checking [`Version`] token format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r#"^"\d{1,3}"$"#).expect("valid regex")
        });

        if !REGEX.is_match(token) {
            return None;
        }
        token.trim_matches('"').parse::<i32>().ok().map(Self)
    }

    /// Returns the quoted token representing this [`Version`].
    #[must_use]
    pub fn token(self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl FromStr for Version {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i32>()
            .ok()
            .filter(|v| *v >= 0)
            .map(Self)
            .ok_or("invalid `house::Version`")
    }
}

/// Hash of a [`House`] used for deduplication.
///
/// Two [`House`]s of the same [`Kind`] at the same [`Location`] are
/// considered duplicates.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Hash(Uuid);

impl Hash {
    /// Calculates a new [`Hash`] for a [`House`].
    ///
    /// [`Hash`]: struct@Hash
    #[must_use]
    pub fn new(location: Option<&Location>, kind: Kind) -> Self {
        use std::hash::Hash as _;

        // WARNING: Changing the hashed fields or their order invalidates all
        //          the hashes already stored in the database.
        let mut hasher = xxh3::Xxh3Builder::new().build();
        location.hash(&mut hasher);
        kind.u8().hash(&mut hasher);

        Self(Uuid::from_u128(hasher.digest128()))
    }

    /// Returns a key of a transaction-scoped advisory lock guarding
    /// [`House`]s with this [`Hash`].
    ///
    /// [`Hash`]: struct@Hash
    #[must_use]
    pub fn lock_key(self) -> i64 {
        let (high, _) = self.0.as_u64_pair();
        i64::from_ne_bytes(high.to_ne_bytes())
    }
}

define_kind! {
    #[doc = "Kind of a [`House`]."]
    enum Kind {
        #[doc = "House for a single family."]
        SingleFamily = 1,

        #[doc = "House for multiple families."]
        MultiFamily = 2,

        #[doc = "Apartment building."]
        Apartment = 3,
    }
}

/// Number of floors in a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct NumFloors(i16);

impl NumFloors {
    /// Creates new [`NumFloors`] if the given `num` is positive.
    #[must_use]
    pub fn new(num: i16) -> Option<Self> {
        (num > 0).then_some(Self(num))
    }
}

impl FromStr for NumFloors {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `NumFloors`")
    }
}

/// Number of rooms in a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct NumRooms(i16);

impl NumRooms {
    /// Creates new [`NumRooms`] if the given `num` is positive.
    #[must_use]
    pub fn new(num: i16) -> Option<Self> {
        (num > 0).then_some(Self(num))
    }
}

impl FromStr for NumRooms {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `NumRooms`")
    }
}

/// Price of a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Price(Decimal);

impl Price {
    /// Creates a new [`Price`] if the given `price` is positive and fits into
    /// `NUMERIC(10,2)`.
    #[must_use]
    pub fn new(price: Decimal) -> Option<Self> {
        is_amount(price).then_some(Self(price))
    }
}

impl FromStr for Price {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Price`")
    }
}

/// Living area of a [`House`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Size(Decimal);

impl Size {
    /// Creates a new [`Size`] if the given `size` is positive and fits into
    /// `NUMERIC(10,2)`.
    #[must_use]
    pub fn new(size: Decimal) -> Option<Self> {
        is_amount(size).then_some(Self(size))
    }
}

/// Checks whether the given `amount` is positive, has at most 8 integral and
/// 2 fractional digits.
fn is_amount(amount: Decimal) -> bool {
    /// Exclusive upper bound of an amount.
    const LIMIT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    amount > Decimal::ZERO
        && amount < LIMIT
        && amount.normalize().scale() <= 2
}

impl FromStr for Size {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().ok().and_then(Self::new).ok_or("invalid `Size`")
    }
}

/// Location of a [`House`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
#[as_ref(forward)]
pub struct Location(String);

impl Location {
    /// Creates a new [`Location`] if the given `location` is valid.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Option<Self> {
        let location = location.into();
        Self::check(&location).then_some(Self(location))
    }

    /// Checks whether the given `location` is a valid [`Location`].
    fn check(location: impl AsRef<str>) -> bool {
        let location = location.as_ref();
        location.trim() == location
            && !location.is_empty()
            && location.chars().count() <= 40
    }
}

impl FromStr for Location {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Location`")
    }
}

/// Single keyword describing a [`House`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
#[as_ref(forward)]
pub struct Keyword(String);

impl Keyword {
    /// Creates a new [`Keyword`] if the given `keyword` is valid.
    ///
    /// [`Keyword`]s cannot contain commas, as [`Keywords`] are persisted as a
    /// comma-separated list.
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Option<Self> {
        let keyword = keyword.into();
        Self::check(&keyword).then_some(Self(keyword))
    }

    /// Checks whether the given `keyword` is a valid [`Keyword`].
    fn check(keyword: impl AsRef<str>) -> bool {
        let keyword = keyword.as_ref();
        keyword.trim() == keyword
            && !keyword.is_empty()
            && !keyword.contains(Keywords::SEPARATOR)
            && keyword.chars().count() <= 32
    }
}

impl FromStr for Keyword {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Keyword`")
    }
}

/// Unique [`Keyword`]s of a [`House`], in their original order.
///
/// Never absent: a missing persisted value reads as empty [`Keywords`].
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct Keywords(Vec<Keyword>);

impl Keywords {
    /// Separator of [`Keyword`]s in the persisted form.
    pub const SEPARATOR: char = ',';

    /// Maximum length of the persisted form, in characters.
    pub const MAX_LEN: usize = 512;

    /// Creates new [`Keywords`] if all the given ones are unique and their
    /// persisted form doesn't exceed [`Keywords::MAX_LEN`].
    #[must_use]
    pub fn new(keywords: impl IntoIterator<Item = Keyword>) -> Option<Self> {
        let keywords = keywords.into_iter().collect::<Vec<_>>();
        let unique = keywords
            .iter()
            .enumerate()
            .all(|(i, k)| !keywords[..i].contains(k));
        let len = keywords.iter().map(|k| k.0.chars().count()).sum::<usize>()
            + keywords.len().saturating_sub(1);
        (unique && len <= Self::MAX_LEN).then_some(Self(keywords))
    }

    /// Returns an iterator over these [`Keywords`].
    pub fn iter(&self) -> impl Iterator<Item = &Keyword> {
        self.0.iter()
    }

    /// Indicates whether these [`Keywords`] are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the persisted form of these [`Keywords`].
    ///
    /// Empty [`Keywords`] are persisted as [`None`].
    #[must_use]
    pub fn joined(&self) -> Option<String> {
        (!self.is_empty()).then(|| {
            self.0
                .iter()
                .map(AsRef::<str>::as_ref)
                .collect::<Vec<_>>()
                .join(&Self::SEPARATOR.to_string())
        })
    }

    /// Parses [`Keywords`] out of their persisted form.
    ///
    /// Empty segments are ignored.
    #[must_use]
    pub fn split(joined: &str) -> Option<Self> {
        joined
            .split(Self::SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(Keyword::new)
            .collect::<Option<Vec<_>>>()
            .and_then(Self::new)
    }
}

impl FromStr for Keywords {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(s).ok_or("invalid `Keywords`")
    }
}

#[cfg(feature = "postgres")]
mod postgres {
    //! [`Keywords`] integration with [`postgres_types`].

    use std::error::Error as StdError;

    use postgres_types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    };

    use super::Keywords;

    impl<'a> FromSql<'a> for Keywords {
        accepts!(VARCHAR, TEXT);

        fn from_sql(
            ty: &Type,
            raw: &'a [u8],
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            let joined = <&str>::from_sql(ty, raw)?;
            Self::split(joined)
                .ok_or_else(|| format!("invalid `Keywords`: {joined}").into())
        }

        fn from_sql_null(
            _: &Type,
        ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
            Ok(Self::default())
        }
    }

    impl ToSql for Keywords {
        accepts!(VARCHAR, TEXT);
        to_sql_checked!();

        fn to_sql(
            &self,
            ty: &Type,
            w: &mut BytesMut,
        ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
            self.joined().to_sql(ty, w)
        }
    }
}

#[cfg(test)]
mod spec {
    use super::*;

    fn house() -> House {
        let location = Location::new("Karlsruhe");
        House {
            id: Id::new(1).unwrap(),
            version: Version::default(),
            hash: Hash::new(location.as_ref(), Kind::SingleFamily),
            kind: Kind::SingleFamily,
            num_floors: NumFloors::new(2).unwrap(),
            num_rooms: NumRooms::new(5).unwrap(),
            price: "350000.00".parse().unwrap(),
            size: "120.5".parse().unwrap(),
            location,
            keywords: "Garten,Sternenhimmel".parse().unwrap(),
            equipment: Equipment {
                id: equipment::Id::new(1).unwrap(),
                house_id: Id::new(1).unwrap(),
                basement: true,
                garden: true,
                garage: false,
            },
            residents: None,
        }
    }

    #[test]
    fn accepts_only_short_quoted_version_tokens() {
        assert_eq!(Version::from_token("\"0\""), Some(Version(0)));
        assert_eq!(Version::from_token("\"123\""), Some(Version(123)));

        for invalid in ["0", "\"1234\"", "\"\"", "\"1", "\"1\"x", "W/\"1\"", ""]
        {
            assert_eq!(Version::from_token(invalid), None, "{invalid}");
        }
    }

    #[test]
    fn formats_version_token() {
        assert_eq!(Version(7).token(), "\"7\"");
        assert_eq!(Version::from_token(&Version(42).token()), Some(Version(42)));
    }

    #[test]
    fn hash_depends_only_on_location_and_kind() {
        let a = Location::new("Karlsruhe");
        let b = Location::new("Stuttgart");

        assert_eq!(
            Hash::new(a.as_ref(), Kind::Apartment),
            Hash::new(a.as_ref(), Kind::Apartment),
        );
        assert_ne!(
            Hash::new(a.as_ref(), Kind::Apartment),
            Hash::new(b.as_ref(), Kind::Apartment),
        );
        assert_ne!(
            Hash::new(a.as_ref(), Kind::Apartment),
            Hash::new(a.as_ref(), Kind::SingleFamily),
        );
        assert_ne!(
            Hash::new(None, Kind::Apartment),
            Hash::new(a.as_ref(), Kind::Apartment),
        );
    }

    #[test]
    fn rejects_non_positive_numbers() {
        assert!(Id::new(0).is_none());
        assert!("-1".parse::<Id>().is_err());
        assert!(NumFloors::new(0).is_none());
        assert!(NumRooms::new(-3).is_none());
        assert!("0".parse::<Price>().is_err());
        assert!("-0.5".parse::<Size>().is_err());
        assert!("0.01".parse::<Price>().is_ok());
    }

    #[test]
    fn bounds_amounts_by_numeric_column() {
        assert!("99999999.99".parse::<Price>().is_ok());
        assert!("100000000".parse::<Price>().is_err());
        assert!("1000000000".parse::<Size>().is_err());
        assert!("12.345".parse::<Size>().is_err());
        assert!("12.340".parse::<Size>().is_ok());
    }

    #[test]
    fn bounds_keywords_length() {
        let many = |n: usize| {
            (0..n).map(|i| Keyword::new(format!("{i:031}")).unwrap())
        };

        // 16 keywords of 31 chars and 15 separators
        assert!(Keywords::new(many(16)).is_some());
        assert!(Keywords::new(many(17)).is_none());
    }

    #[test]
    fn keywords_must_be_unique() {
        let kw = |s: &str| Keyword::new(s).unwrap();

        assert!(Keywords::new([kw("a"), kw("b")]).is_some());
        assert!(Keywords::new([kw("a"), kw("a")]).is_none());
        assert!(Keyword::new("a,b").is_none());
        assert!(Keyword::new(" a").is_none());
    }

    #[test]
    fn keywords_persist_as_joined_list() {
        let keywords = "Garten,Sternenhimmel".parse::<Keywords>().unwrap();

        assert_eq!(keywords.joined().as_deref(), Some("Garten,Sternenhimmel"));
        assert_eq!(Keywords::default().joined(), None);
        assert_eq!(Keywords::split(""), Some(Keywords::default()));
    }

    #[test]
    fn applies_only_present_changes() {
        let mut house = house();
        let before = house.clone();

        house.apply(Changes {
            num_rooms: NumRooms::new(7),
            ..Changes::default()
        });

        assert_eq!(house.num_rooms, NumRooms(7));
        assert_eq!(house.kind, before.kind);
        assert_eq!(house.location, before.location);
        assert_eq!(house.keywords, before.keywords);
        assert_eq!(house.hash, before.hash);
    }

    #[test]
    fn rehashes_on_identity_changes() {
        let mut house = house();
        let before = house.hash;

        house.apply(Changes {
            kind: Some(Kind::Apartment),
            ..Changes::default()
        });

        assert_ne!(house.hash, before);
        assert_eq!(house.hash, Hash::new(house.location.as_ref(), Kind::Apartment));
    }
}
