//! Attribute filters and SELECT rendering.
//!
//! Filters are `attribute → value` pairs combined with `AND`. An attribute is
//! a flattened column name, optionally followed by a modifier suffix:
//!
//! | attribute        | condition                       |
//! |------------------|---------------------------------|
//! | `col`            | `col = ?` (`col IS ?` for NULL) |
//! | `col__not`       | `col != ?` (`col IS NOT ?`)     |
//! | `col__in`        | `col IN (?,?,…)`                |
//! | `col__not_in`    | `col NOT IN (?,?,…)`            |
//!
//! Values are always bound as parameters, never interpolated.

use std::fmt::Write as _;

use crate::catalog::Schema;
use crate::encoding::Value;
use crate::error::QueryError;

/// Separator between a column name and its modifier.
pub const MODIFIER_SEPARATOR: &str = "__";

/// The right-hand side of a filter: one value, or a list for `__in` forms.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Scalar(Value),
    List(Vec<Value>),
}

macro_rules! filter_value_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FilterValue {
                fn from(v: $t) -> Self {
                    FilterValue::Scalar(v.into())
                }
            }

            impl From<Vec<$t>> for FilterValue {
                fn from(v: Vec<$t>) -> Self {
                    FilterValue::List(v.into_iter().map(Into::into).collect())
                }
            }

            impl<const N: usize> From<[$t; N]> for FilterValue {
                fn from(v: [$t; N]) -> Self {
                    FilterValue::List(v.into_iter().map(Into::into).collect())
                }
            }
        )*
    };
}

filter_value_from!(Value, i64, i32, u32, bool, f64, f32, String, &str);

impl<T: Into<Value>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        FilterValue::Scalar(v.into())
    }
}

/// How an attribute's value is compared with its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Eq,
    Not,
    In,
    NotIn,
}

impl Modifier {
    fn from_suffix(suffix: &str) -> Result<Self, QueryError> {
        match suffix {
            "not" => Ok(Modifier::Not),
            "in" => Ok(Modifier::In),
            "not_in" => Ok(Modifier::NotIn),
            other => Err(QueryError::UnknownModifier(other.to_string())),
        }
    }

    fn takes_list(self) -> bool {
        matches!(self, Modifier::In | Modifier::NotIn)
    }
}

/// Split an attribute into its column name and modifier.
///
/// The modifier is the text after the last `__`; an attribute without one
/// compares for equality.
pub fn parse_attribute(attribute: &str) -> Result<(&str, Modifier), QueryError> {
    match attribute.rsplit_once(MODIFIER_SEPARATOR) {
        Some((column, suffix)) => Ok((column, Modifier::from_suffix(suffix)?)),
        None => Ok((attribute, Modifier::Eq)),
    }
}

/// An ordered list of attribute filters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, FilterValue)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter; later filters are ANDed with earlier ones.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.push(attribute, value);
        self
    }

    pub fn push(&mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) {
        self.entries.push((attribute.into(), value.into()));
    }

    pub fn extend(&mut self, other: Filters) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(a, v)| (a.as_str(), v))
    }
}

impl<A: Into<String>, V: Into<FilterValue>> FromIterator<(A, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (A, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (attribute, value) in iter {
            filters.push(attribute, value);
        }
        filters
    }
}

/// A rendered WHERE condition and its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Render `filters` against `schema` as a single condition.
///
/// No filters render as `TRUE`.
pub fn build_condition(schema: &Schema, filters: &Filters) -> Result<Condition, QueryError> {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::new();

    for (attribute, value) in filters.iter() {
        let (column, modifier) = parse_attribute(attribute)?;
        check_column(schema, column)?;

        let clause = match (modifier, value) {
            (Modifier::Eq, FilterValue::Scalar(v)) => {
                let op = if v.is_null() { "IS" } else { "=" };
                params.push(v.clone());
                format!("{column} {op} ?")
            }
            (Modifier::Not, FilterValue::Scalar(v)) => {
                let op = if v.is_null() { "IS NOT" } else { "!=" };
                params.push(v.clone());
                format!("{column} {op} ?")
            }
            (Modifier::In | Modifier::NotIn, FilterValue::List(values)) => {
                let op = if modifier == Modifier::In {
                    "IN"
                } else {
                    "NOT IN"
                };
                let placeholders = vec!["?"; values.len()].join(",");
                params.extend(values.iter().cloned());
                format!("{column} {op} ({placeholders})")
            }
            (m, FilterValue::Scalar(_)) if m.takes_list() => {
                return Err(QueryError::ExpectedList {
                    attribute: attribute.to_string(),
                });
            }
            _ => {
                return Err(QueryError::ExpectedScalar {
                    attribute: attribute.to_string(),
                });
            }
        };
        clauses.push(clause);
    }

    let sql = if clauses.is_empty() {
        "TRUE".to_string()
    } else {
        clauses.join(" AND ")
    };
    Ok(Condition { sql, params })
}

fn check_column(schema: &Schema, column: &str) -> Result<(), QueryError> {
    if schema.column(column).is_some() {
        Ok(())
    } else {
        Err(QueryError::UnknownColumn {
            table: schema.table_name().to_string(),
            column: column.to_string(),
        })
    }
}

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    fn sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A SELECT over one table: filters, ordering and paging.
///
/// Rendered against a schema, which validates every column it names.
/// Caller-written conditions added with [`Select::where_sql`] are not
/// validated.
#[derive(Debug, Clone, Default)]
pub struct Select {
    filters: Filters,
    raw: Vec<Condition>,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&mut self, attribute: impl Into<String>, value: impl Into<FilterValue>) {
        self.filters.push(attribute, value);
    }

    pub fn filters(&mut self, filters: Filters) {
        self.filters.extend(filters);
    }

    /// AND a caller-written condition with `?` placeholders into the
    /// WHERE clause. Its parameters bind after those of the filters.
    pub fn where_sql(&mut self, sql: impl Into<String>, params: Vec<Value>) {
        self.raw.push(Condition {
            sql: sql.into(),
            params,
        });
    }

    pub fn order_by(&mut self, column: impl Into<String>, order: Order) {
        self.order.push((column.into(), order));
    }

    pub fn limit(&mut self, limit: u64) {
        self.limit = Some(limit);
    }

    pub fn offset(&mut self, offset: u64) {
        self.offset = Some(offset);
    }

    /// Render the statement and its parameters.
    pub fn to_sql(&self, schema: &Schema) -> Result<(String, Vec<Value>), QueryError> {
        let condition = self.condition(schema)?;
        let mut sql = format!(
            "SELECT {} FROM {} WHERE ({})",
            schema.column_list(),
            schema.table_name(),
            condition.sql
        );

        if !self.order.is_empty() {
            let mut terms = Vec::with_capacity(self.order.len());
            for (column, order) in &self.order {
                check_column(schema, column)?;
                terms.push(format!("{column} {}", order.sql()));
            }
            let _ = write!(sql, " ORDER BY {}", terms.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => {
                let _ = write!(sql, " LIMIT {limit} OFFSET {offset}");
            }
            (Some(limit), None) => {
                let _ = write!(sql, " LIMIT {limit}");
            }
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(offset)) => {
                let _ = write!(sql, " LIMIT -1 OFFSET {offset}");
            }
            (None, None) => {}
        }

        Ok((sql, condition.params))
    }

    /// Render a `COUNT(*)` over the same filters, ignoring order and paging.
    pub fn to_count_sql(&self, schema: &Schema) -> Result<(String, Vec<Value>), QueryError> {
        let condition = self.condition(schema)?;
        Ok((
            format!(
                "SELECT COUNT(*) FROM {} WHERE ({})",
                schema.table_name(),
                condition.sql
            ),
            condition.params,
        ))
    }

    fn condition(&self, schema: &Schema) -> Result<Condition, QueryError> {
        let mut condition = build_condition(schema, &self.filters)?;
        for raw in &self.raw {
            let _ = write!(condition.sql, ") AND ({}", raw.sql);
            condition.params.extend(raw.params.iter().cloned());
        }
        Ok(condition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::record::Record;

    crate::record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Page {
            page_url: String,
            category: String,
            source: Option<String>,
            rank: i64,
        }
    }

    fn schema() -> Arc<Schema> {
        Page::schema().unwrap()
    }

    #[test]
    fn test_parse_attribute() {
        assert_eq!(parse_attribute("name").unwrap(), ("name", Modifier::Eq));
        assert_eq!(parse_attribute("name__not").unwrap(), ("name", Modifier::Not));
        assert_eq!(parse_attribute("page_url__in").unwrap(), ("page_url", Modifier::In));
        assert_eq!(
            parse_attribute("page_url__not_in").unwrap(),
            ("page_url", Modifier::NotIn)
        );
        assert!(matches!(
            parse_attribute("rank__gt"),
            Err(QueryError::UnknownModifier(m)) if m == "gt"
        ));
    }

    #[test]
    fn test_no_filters_is_true() {
        let condition = build_condition(&schema(), &Filters::new()).unwrap();
        assert_eq!(condition.sql, "TRUE");
        assert!(condition.params.is_empty());
    }

    #[test]
    fn test_conditions_combine_with_and() {
        let filters = Filters::new()
            .with("category", "hats")
            .with("rank__not", 3)
            .with("page_url__not_in", ["a", "b", "c"]);
        let condition = build_condition(&schema(), &filters).unwrap();
        assert_eq!(
            condition.sql,
            "category = ? AND rank != ? AND page_url NOT IN (?,?,?)"
        );
        assert_eq!(
            condition.params,
            vec![
                Value::from("hats"),
                Value::Integer(3),
                Value::from("a"),
                Value::from("b"),
                Value::from("c"),
            ]
        );
    }

    #[test]
    fn test_null_comparisons_use_is() {
        let filters = Filters::new()
            .with("source", None::<String>)
            .with("source__not", Value::Null);
        let condition = build_condition(&schema(), &filters).unwrap();
        assert_eq!(condition.sql, "source IS ? AND source IS NOT ?");
        assert_eq!(condition.params, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_empty_in_list() {
        let filters = Filters::new().with("category__in", Vec::<String>::new());
        let condition = build_condition(&schema(), &filters).unwrap();
        assert_eq!(condition.sql, "category IN ()");
        assert!(condition.params.is_empty());
    }

    #[test]
    fn test_rejects_unknown_column_and_bad_shapes() {
        let err = build_condition(&schema(), &Filters::new().with("colour", "red")).unwrap_err();
        assert!(matches!(err, QueryError::UnknownColumn { ref column, .. } if column == "colour"));

        let err = build_condition(&schema(), &Filters::new().with("category__in", "hats"))
            .unwrap_err();
        assert!(matches!(err, QueryError::ExpectedList { .. }));

        let err =
            build_condition(&schema(), &Filters::new().with("category", ["hats"])).unwrap_err();
        assert!(matches!(err, QueryError::ExpectedScalar { .. }));
    }

    #[test]
    fn test_select_with_in_and_limit() {
        let mut select = Select::new();
        select.filter("category__in", ["hats", "robes"]);
        select.limit(10);
        let (sql, params) = select.to_sql(&schema()).unwrap();
        assert_eq!(
            sql,
            "SELECT page_url, category, source, rank FROM page WHERE (category IN (?,?)) LIMIT 10"
        );
        assert_eq!(params, vec![Value::from("hats"), Value::from("robes")]);
    }

    #[test]
    fn test_select_order_and_offset() {
        let mut select = Select::new();
        select.order_by("rank", Order::Desc);
        select.order_by("page_url", Order::Asc);
        select.offset(5);
        let (sql, _) = select.to_sql(&schema()).unwrap();
        assert!(sql.ends_with("WHERE (TRUE) ORDER BY rank DESC, page_url ASC LIMIT -1 OFFSET 5"));

        let mut select = Select::new();
        select.order_by("missing", Order::Asc);
        assert!(matches!(
            select.to_sql(&schema()),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_where_sql_joins_filters() {
        let mut select = Select::new();
        select.filter("category", "hats");
        select.where_sql("rank BETWEEN ? AND ?", vec![Value::Integer(1), Value::Integer(5)]);
        select.limit(3);
        let (sql, params) = select.to_sql(&schema()).unwrap();
        assert_eq!(
            sql,
            "SELECT page_url, category, source, rank FROM page \
             WHERE (category = ?) AND (rank BETWEEN ? AND ?) LIMIT 3"
        );
        assert_eq!(
            params,
            vec![Value::from("hats"), Value::Integer(1), Value::Integer(5)]
        );

        let (sql, _) = select.to_count_sql(&schema()).unwrap();
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM page WHERE (category = ?) AND (rank BETWEEN ? AND ?)"
        );
    }

    #[test]
    fn test_count_sql() {
        let mut select = Select::new();
        select.filter("category", "hats");
        select.limit(1);
        let (sql, params) = select.to_count_sql(&schema()).unwrap();
        assert_eq!(sql, "SELECT COUNT(*) FROM page WHERE (category = ?)");
        assert_eq!(params.len(), 1);
    }
}
