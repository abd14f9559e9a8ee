//! SQL rendering of [`Filter`]s.

use std::error::Error as StdError;

use itertools::Itertools as _;
use postgres_types::{private::BytesMut, to_sql_checked, IsNull, ToSql, Type};
use rust_decimal::Decimal;

use crate::read::house::list::{Filter, Predicate, Value};

/// SQL dialect to render a [`Filter`] in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Dialect {
    /// PostgreSQL, supporting case-insensitive `ILIKE`.
    #[default]
    Postgres,

    /// Standard SQL, having case-sensitive `LIKE` only.
    Standard,
}

impl Dialect {
    /// Returns the operator matching a case-insensitive pattern, or its
    /// closest fallback.
    #[must_use]
    pub const fn like_ignore_case(self) -> &'static str {
        match self {
            Self::Postgres => "ILIKE",
            Self::Standard => "LIKE",
        }
    }
}

/// Parameter bound to a rendered [`Where`] clause.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Param {
    /// `INT2` parameter.
    Int2(i16),

    /// `INT4` parameter.
    Int4(i32),

    /// `NUMERIC` parameter.
    Numeric(Decimal),

    /// `VARCHAR` parameter.
    Text(String),
}

impl ToSql for Param {
    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Self::Int2(v) => v.to_sql(ty, w),
            Self::Int4(v) => v.to_sql(ty, w),
            Self::Numeric(v) => v.to_sql(ty, w),
            Self::Text(v) => v.to_sql(ty, w),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <i16 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <Decimal as ToSql>::accepts(ty)
            || <String as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

/// Rendered `WHERE` clause of a [`Filter`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Where {
    /// SQL text of the clause, empty if there is nothing to filter.
    pub sql: String,

    /// [`Param`]s referenced by the [`Where::sql`] as `$1`, `$2`, etc.
    pub params: Vec<Param>,
}

impl Where {
    /// Renders the provided [`Filter`] in the provided [`Dialect`].
    ///
    /// Columns are referenced through the `h` (houses) and `e` (equipment)
    /// table aliases.
    #[must_use]
    pub fn render(filter: Option<&Filter>, dialect: Dialect) -> Self {
        let Some(filter) = filter else {
            return Self::default();
        };

        let mut params = Vec::new();
        let mut clause = |p: &Predicate| render_predicate(p, dialect, &mut params);

        let root = clause(&filter.root);
        let conjuncts = filter.conjuncts.iter().map(&mut clause).collect_vec();
        let sql = format!(
            "WHERE {root}{}",
            conjuncts
                .iter()
                .format_with("", |c, f| f(&format_args!(" AND {c}"))),
        );

        Self { sql, params }
    }

    /// Returns [`Where::params`] ready to be passed into a query.
    #[must_use]
    pub fn bindings(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|p| -> &(dyn ToSql + Sync) { p })
            .collect()
    }
}

/// Renders a single [`Predicate`], pushing its parameters into `params`.
fn render_predicate(
    predicate: &Predicate,
    dialect: Dialect,
    params: &mut Vec<Param>,
) -> String {
    let mut bind = |p: Param| {
        params.push(p);
        params.len()
    };

    match predicate {
        Predicate::EquipmentLike(text) => {
            let idx = bind(Param::Text(contains_pattern(text)));
            let op = dialect.like_ignore_case();
            format!("e.label {op} ${idx}::VARCHAR")
        }
        Predicate::Tagged(flag) => {
            format!("h.keywords LIKE '%{}%'", flag.tag())
        }
        Predicate::Equals(Value::Keywords(v)) if v.is_empty() => {
            "h.keywords IS NULL".to_owned()
        }
        Predicate::Equals(value) => {
            let (column, param, ty) = match value {
                Value::Id(v) => ("id", Param::Int4((*v).into()), "INT4"),
                Value::Version(v) => {
                    ("version", Param::Int4((*v).into()), "INT4")
                }
                Value::Kind(v) => {
                    ("kind", Param::Int2(i16::from(v.u8())), "INT2")
                }
                Value::NumFloors(v) => {
                    ("num_floors", Param::Int2((*v).into()), "INT2")
                }
                Value::NumRooms(v) => {
                    ("num_rooms", Param::Int2((*v).into()), "INT2")
                }
                Value::Price(v) => {
                    ("price", Param::Numeric((*v).into()), "NUMERIC")
                }
                Value::Size(v) => {
                    ("size", Param::Numeric((*v).into()), "NUMERIC")
                }
                Value::Location(v) => {
                    ("location", Param::Text(v.to_string()), "VARCHAR")
                }
                Value::Keywords(v) => (
                    "keywords",
                    Param::Text(v.joined().unwrap_or_default()),
                    "VARCHAR",
                ),
            };
            let idx = bind(param);
            format!("h.{column} = ${idx}::{ty}")
        }
    }
}

/// Creates a `LIKE` pattern matching any text containing the provided one
/// literally.
fn contains_pattern(text: &str) -> String {
    format!(
        "%{}%",
        text.replace('\\', r"\\")
            .replace('%', r"\%")
            .replace('_', r"\_"),
    )
}

#[cfg(test)]
mod spec {
    use crate::read::house::{list::Filter, Criteria};

    use super::{Dialect, Param, Where};

    fn render(pairs: &[(&str, &str)], dialect: Dialect) -> Where {
        let criteria = Criteria::from_iter(pairs.iter().copied());
        let filter = Filter::from_criteria(&criteria).unwrap();
        Where::render(filter.as_ref(), dialect)
    }

    #[test]
    fn renders_nothing_without_filter() {
        assert_eq!(render(&[], Dialect::Postgres), Where::default());
    }

    #[test]
    fn renders_flags_with_where_then_and() {
        let rendered = render(
            &[("wasserfall", "true"), ("sternenhimmel", "true")],
            Dialect::Postgres,
        );

        assert_eq!(
            rendered.sql,
            "WHERE h.keywords LIKE '%Sternenhimmel%' \
             AND h.keywords LIKE '%Wasserfall%'",
        );
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn renders_clauses_in_fixed_order() {
        let rendered = render(
            &[
                ("location", "Ulm"),
                ("himmelsleiter", "true"),
                ("rooms", "3"),
                ("equipment", "garden"),
            ],
            Dialect::Postgres,
        );

        assert_eq!(
            rendered.sql,
            "WHERE e.label ILIKE $1::VARCHAR \
             AND h.keywords LIKE '%Himmelsleiter%' \
             AND h.location = $2::VARCHAR \
             AND h.num_rooms = $3::INT2",
        );
        assert_eq!(
            rendered.params,
            [
                Param::Text("%garden%".into()),
                Param::Text("Ulm".into()),
                Param::Int2(3),
            ],
        );
    }

    #[test]
    fn falls_back_to_case_sensitive_like() {
        let rendered = render(&[("equipment", "Garage")], Dialect::Standard);

        assert_eq!(rendered.sql, "WHERE e.label LIKE $1::VARCHAR");
    }

    #[test]
    fn escapes_equipment_pattern() {
        let rendered = render(&[("equipment", r"50%_\")], Dialect::Postgres);

        assert_eq!(
            rendered.params,
            [Param::Text(r"%50\%\_\\%".into())],
        );
    }

    #[test]
    fn renders_typed_equalities() {
        let rendered = render(
            &[("type", "MULTI_FAMILY"), ("price", "1000.50"), ("id", "7")],
            Dialect::Postgres,
        );

        assert_eq!(
            rendered.sql,
            "WHERE h.kind = $1::INT2 \
             AND h.price = $2::NUMERIC \
             AND h.id = $3::INT4",
        );
        assert_eq!(
            rendered.params,
            [
                Param::Int2(2),
                Param::Numeric("1000.50".parse().unwrap()),
                Param::Int4(7),
            ],
        );
        assert_eq!(rendered.bindings().len(), 3);
    }

    #[test]
    fn matches_missing_keywords_as_null() {
        let rendered = render(&[("keywords", "")], Dialect::Postgres);

        assert_eq!(rendered.sql, "WHERE h.keywords IS NULL");
        assert!(rendered.params.is_empty());
    }

    #[test]
    fn binds_joined_keywords() {
        let rendered = render(&[("keywords", "Sauna,Pool")], Dialect::Postgres);

        assert_eq!(rendered.sql, "WHERE h.keywords = $1::VARCHAR");
        assert_eq!(rendered.params, [Param::Text("Sauna,Pool".into())]);
    }
}
