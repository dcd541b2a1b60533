//! List-endpoint query parameters: filtering, sorting, projection, paging.
//!
//! Raw `(key, value)` pairs from the query string are parsed into a
//! [`ListQuery`], then resolved against the [`FieldSpec`]s a resource
//! exposes. Only resolved queries reach the SQL builder, so every column
//! name used there comes from a `&'static str` in a field table.
//!
//! ```text
//! ?price[gte]=10&city=Berlin&sort=-date,title&fields=title,date&page=2&limit=20
//! ```

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// Newest first unless the caller asks otherwise.
pub const DEFAULT_SORT: &str = "-created_at";

/// Field always kept by projection and used as the final sort tiebreaker.
pub const ID_FIELD: &str = "id";

// ---------------------------------------------------------------------------
// Field specs
// ---------------------------------------------------------------------------

/// Value type of a filterable column, used to parse filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
}

/// A column a resource allows filtering and sorting on.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// A typed filter value ready to be bound to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(Timestamp),
}

impl FieldKind {
    /// Parse a raw query-string value for a field of this kind.
    pub fn parse(self, field: &str, raw: &str) -> Result<FilterValue, CoreError> {
        let invalid = || CoreError::Validation(format!("Invalid value for {field}: {raw}"));
        match self {
            FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
            FieldKind::Integer => raw
                .trim()
                .parse()
                .map(FilterValue::Integer)
                .map_err(|_| invalid()),
            FieldKind::Float => raw
                .trim()
                .parse()
                .map(FilterValue::Float)
                .map_err(|_| invalid()),
            FieldKind::Boolean => match raw.trim() {
                "true" => Ok(FilterValue::Boolean(true)),
                "false" => Ok(FilterValue::Boolean(false)),
                _ => Err(invalid()),
            },
            FieldKind::Timestamp => parse_timestamp(raw)
                .map(FilterValue::Timestamp)
                .ok_or_else(invalid),
        }
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparison {
    /// Map a bracketed keyword (`price[gte]`) to its operator.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "gt" => Some(Comparison::Gt),
            "gte" => Some(Comparison::Gte),
            "lt" => Some(Comparison::Lt),
            "lte" => Some(Comparison::Lte),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Gte => ">=",
            Comparison::Lt => "<",
            Comparison::Lte => "<=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

// ---------------------------------------------------------------------------
// Parsed query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RawFilter {
    pub field: String,
    pub op: Comparison,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<RawFilter>,
    pub sort: Vec<(String, SortDirection)>,
    /// Requested projection; `None` returns every public field.
    pub fields: Option<Vec<String>>,
    pub page: i64,
    pub limit: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: parse_sort(DEFAULT_SORT),
            fields: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Parse raw query-string pairs.
    ///
    /// `page`, `sort`, `limit` and `fields` control the listing; every
    /// other key is a filter.
    ///
    /// Non-numeric or non-positive `page`/`limit` values fall back to their
    /// defaults; `limit` is capped at [`MAX_LIMIT`].
    pub fn from_pairs<I>(pairs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = ListQuery::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => query.page = positive_or(&value, DEFAULT_PAGE),
                "limit" => query.limit = positive_or(&value, DEFAULT_LIMIT).min(MAX_LIMIT),
                "sort" => {
                    let sort = parse_sort(&value);
                    if !sort.is_empty() {
                        query.sort = sort;
                    }
                }
                "fields" => {
                    let fields = split_list(&value);
                    query.fields = (!fields.is_empty()).then_some(fields);
                }
                _ => query.filters.push(parse_filter(&key, value)?),
            }
        }

        Ok(query)
    }

    /// `(page - 1) * limit`.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Check every filter and sort key against the resource's field specs
    /// and parse filter values into typed values.
    pub fn resolve(&self, specs: &[FieldSpec]) -> Result<ResolvedQuery, CoreError> {
        let lookup = |name: &str| specs.iter().find(|s| s.name == name);

        let mut filters = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            let field_def = lookup(&filter.field).ok_or_else(|| {
                CoreError::Validation(format!("Invalid filter field: {}", filter.field))
            })?;
            if field_def.kind == FieldKind::Boolean && filter.op != Comparison::Eq {
                return Err(CoreError::Validation(format!(
                    "Field {} only supports equality filters",
                    field_def.name
                )));
            }
            filters.push(ResolvedFilter {
                column: field_def.name,
                op: filter.op,
                value: field_def.kind.parse(field_def.name, &filter.value)?,
            });
        }

        let mut sort = Vec::with_capacity(self.sort.len() + 1);
        for (field, direction) in &self.sort {
            let field_def = lookup(field)
                .ok_or_else(|| CoreError::Validation(format!("Invalid sort field: {field}")))?;
            sort.push(ResolvedSort {
                column: field_def.name,
                direction: *direction,
            });
        }
        if !sort.iter().any(|s| s.column == ID_FIELD) {
            sort.push(ResolvedSort {
                column: ID_FIELD,
                direction: SortDirection::Asc,
            });
        }

        Ok(ResolvedQuery {
            filters,
            sort,
            limit: self.limit,
            offset: self.offset(),
        })
    }
}

fn positive_or(raw: &str, default: i64) -> i64 {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => n,
        _ => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_sort(raw: &str) -> Vec<(String, SortDirection)> {
    split_list(raw)
        .into_iter()
        .map(|key| match key.strip_prefix('-') {
            Some(field) => (field.to_string(), SortDirection::Desc),
            None => (key, SortDirection::Asc),
        })
        .collect()
}

/// `field=value` is equality; `field[op]=value` a comparison.
fn parse_filter(key: &str, value: String) -> Result<RawFilter, CoreError> {
    let Some((field, rest)) = key.split_once('[') else {
        return Ok(RawFilter {
            field: key.to_string(),
            op: Comparison::Eq,
            value,
        });
    };

    let op = rest
        .strip_suffix(']')
        .and_then(Comparison::from_keyword)
        .ok_or_else(|| CoreError::Validation(format!("Invalid filter operator in {key}")))?;

    Ok(RawFilter {
        field: field.to_string(),
        op,
        value,
    })
}

// ---------------------------------------------------------------------------
// Resolved query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub column: &'static str,
    pub op: Comparison,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSort {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// A list query whose columns are all known to the resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedQuery {
    pub filters: Vec<ResolvedFilter>,
    pub sort: Vec<ResolvedSort>,
    pub limit: i64,
    pub offset: i64,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Keep only the requested top-level keys of a serialized record (plus
/// `id`). Unknown keys are ignored; non-object values pass through.
pub fn project_fields(value: Value, fields: &[String]) -> Value {
    match value {
        Value::Object(map) => {
            let projected: Map<String, Value> = map
                .into_iter()
                .filter(|(k, _)| k == ID_FIELD || fields.iter().any(|f| f == k))
                .collect();
            Value::Object(projected)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const SPECS: &[FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Integer),
        FieldSpec::new("title", FieldKind::Text),
        FieldSpec::new("price", FieldKind::Float),
        FieldSpec::new("active", FieldKind::Boolean),
        FieldSpec::new("date", FieldKind::Timestamp),
        FieldSpec::new("created_at", FieldKind::Timestamp),
    ];

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_without_parameters() {
        let query = ListQuery::from_pairs(Vec::new()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 100);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.sort, vec![("created_at".to_string(), SortDirection::Desc)]);
        assert!(query.fields.is_none());
        assert!(query.filters.is_empty());
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let query = ListQuery::from_pairs(pairs(&[
            ("page", "3"),
            ("limit", "20"),
            ("sort", "title"),
            ("fields", "title,date"),
            ("title", "Meetup"),
        ]))
        .unwrap();

        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.filters[0].field, "title");
        assert_eq!(query.offset(), 40);
        assert_eq!(
            query.fields,
            Some(vec!["title".to_string(), "date".to_string()])
        );
    }

    #[test]
    fn comparison_keywords_become_operators() {
        let query =
            ListQuery::from_pairs(pairs(&[("price[gte]", "10"), ("price[lt]", "50")])).unwrap();
        assert_eq!(query.filters[0].op, Comparison::Gte);
        assert_eq!(query.filters[1].op, Comparison::Lt);

        let resolved = query.resolve(SPECS).unwrap();
        assert_eq!(resolved.filters[0].value, FilterValue::Float(10.0));
        assert_eq!(resolved.filters[1].op.as_sql(), "<");
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = ListQuery::from_pairs(pairs(&[("price[ne]", "10")])).unwrap_err();
        assert!(err.to_string().contains("Invalid filter operator"));
    }

    #[test]
    fn invalid_paging_falls_back_to_defaults() {
        let query = ListQuery::from_pairs(pairs(&[("page", "zero"), ("limit", "-5")])).unwrap();
        assert_eq!(query.page, DEFAULT_PAGE);
        assert_eq!(query.limit, DEFAULT_LIMIT);

        let capped = ListQuery::from_pairs(pairs(&[("limit", "50000")])).unwrap();
        assert_eq!(capped.limit, MAX_LIMIT);
    }

    #[test]
    fn sort_parses_directions_and_appends_id() {
        let query = ListQuery::from_pairs(pairs(&[("sort", "-date,title")])).unwrap();
        let resolved = query.resolve(SPECS).unwrap();
        let order: Vec<_> = resolved
            .sort
            .iter()
            .map(|s| (s.column, s.direction))
            .collect();
        assert_eq!(
            order,
            vec![
                ("date", SortDirection::Desc),
                ("title", SortDirection::Asc),
                ("id", SortDirection::Asc),
            ]
        );
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let bad_filter = ListQuery::from_pairs(pairs(&[("password_hash", "x")])).unwrap();
        assert!(bad_filter.resolve(SPECS).is_err());

        let bad_sort = ListQuery::from_pairs(pairs(&[("sort", "secret")])).unwrap();
        assert!(bad_sort.resolve(SPECS).is_err());
    }

    #[test]
    fn values_are_parsed_by_kind() {
        let query = ListQuery::from_pairs(pairs(&[
            ("active", "true"),
            ("date[gte]", "2026-05-01"),
        ]))
        .unwrap();
        let resolved = query.resolve(SPECS).unwrap();
        assert_eq!(resolved.filters[0].value, FilterValue::Boolean(true));
        match &resolved.filters[1].value {
            FilterValue::Timestamp(ts) => assert_eq!(ts.to_rfc3339(), "2026-05-01T00:00:00+00:00"),
            other => panic!("expected timestamp, got {other:?}"),
        }

        let bad = ListQuery::from_pairs(pairs(&[("price", "cheap")])).unwrap();
        assert!(bad.resolve(SPECS).is_err());
    }

    #[test]
    fn boolean_fields_only_support_equality() {
        let query = ListQuery::from_pairs(pairs(&[("active[gt]", "true")])).unwrap();
        assert!(query.resolve(SPECS).is_err());
    }

    #[test]
    fn projection_keeps_requested_keys_and_id() {
        let record = json!({ "id": 1, "title": "Meetup", "price": 5.0, "photo": "default.jpg" });
        let projected = project_fields(record, &["title".to_string(), "missing".to_string()]);
        assert_eq!(projected, json!({ "id": 1, "title": "Meetup" }));
    }
}
