//! List query composition.
//!
//! Raw query-string options (`?search=touch&price.gte=10&sort=name&page=2`)
//! are parsed into a [`ListQuery`]: a typed [`Filter`] tree, sort keys, a
//! projection and a page window. The same tree renders to a MongoDB filter
//! document and evaluates against in-memory documents, so both store
//! implementations agree on what matches.
//!
//! Every field named in a filter, sort or projection must be declared in the
//! resource's [`ResourceSchema`]; values are coerced to the declared kind
//! before they reach the store.

use crate::utils::parse_instant;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const RESERVED_KEYS: [&str; 6] = ["page", "sort", "limit", "fields", "order", "search"];
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

pub const ID_FIELD: &str = "_id";
pub const VERSION_FIELD: &str = "__v";
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Storage type of a filterable field; drives query value coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Integer,
    Date,
    /// Identity of a record in another collection.
    Reference,
    /// Text restricted to a fixed set of values.
    Choice(&'static [&'static str]),
}

/// Fields a resource exposes to list queries.
#[derive(Debug)]
pub struct ResourceSchema {
    pub fields: &'static [(&'static str, FieldKind)],
    /// Stored but never returned, whatever the projection asks for.
    pub hidden: &'static [&'static str],
}

impl ResourceSchema {
    pub fn kind_of(&self, field: &str) -> Option<FieldKind> {
        if field == ID_FIELD {
            return Some(FieldKind::Reference);
        }
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, kind)| *kind)
    }

    fn default_projection(&self) -> Projection {
        let mut excluded = vec![VERSION_FIELD.to_string()];
        excluded.extend(self.hidden.iter().map(|f| f.to_string()));
        Projection::Exclude(excluded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {message}")]
pub struct QueryError {
    pub path: String,
    pub message: String,
}

impl QueryError {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }

    fn mongo_operator(&self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Gt => "$gt",
            CompareOp::Gte => "$gte",
            CompareOp::Lt => "$lt",
            CompareOp::Lte => "$lte",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Predicate over a single collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Conjunction; empty matches everything.
    And(Vec<Filter>),
    /// Disjunction; empty matches nothing.
    Or(Vec<Filter>),
    Compare {
        field: String,
        op: CompareOp,
        value: Bson,
    },
    /// Case-insensitive literal substring match.
    Contains { field: String, term: String },
    In { field: String, values: Vec<Bson> },
}

impl Filter {
    pub fn all() -> Self {
        Filter::And(Vec::new())
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Filter::Compare {
            field: field.into(),
            op: CompareOp::Eq,
            value: value.into(),
        }
    }

    pub fn to_document(&self) -> Document {
        match self {
            Filter::And(filters) => match filters.as_slice() {
                [] => Document::new(),
                [single] => single.to_document(),
                many => doc! { "$and": many.iter().map(|f| Bson::Document(f.to_document())).collect::<Vec<_>>() },
            },
            Filter::Or(filters) => match filters.as_slice() {
                [] => doc! { ID_FIELD: { "$in": [] } },
                [single] => single.to_document(),
                many => doc! { "$or": many.iter().map(|f| Bson::Document(f.to_document())).collect::<Vec<_>>() },
            },
            Filter::Compare { field, op, value } => match op {
                CompareOp::Eq => doc! { field.as_str(): value.clone() },
                _ => doc! { field.as_str(): { op.mongo_operator(): value.clone() } },
            },
            Filter::Contains { field, term } => doc! {
                field.as_str(): { "$regex": escape_regex(term), "$options": "i" }
            },
            Filter::In { field, values } => doc! { field.as_str(): { "$in": values.clone() } },
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
            Filter::Compare { field, op, value } => document
                .get(field)
                .and_then(|actual| compare_bson(actual, value))
                .map(|ordering| op.accepts(ordering))
                .unwrap_or(false),
            Filter::Contains { field, term } => document
                .get_str(field)
                .map(|actual| actual.to_lowercase().contains(&term.to_lowercase()))
                .unwrap_or(false),
            Filter::In { field, values } => document
                .get(field)
                .map(|actual| {
                    values
                        .iter()
                        .any(|v| compare_bson(actual, v) == Some(Ordering::Equal))
                })
                .unwrap_or(false),
        }
    }
}

/// Orders two BSON values of comparable type. Numbers compare across
/// int/double representations; mismatched types are incomparable.
pub fn compare_bson(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(a), Bson::String(b)) => Some(a.cmp(b)),
        (Bson::Boolean(a), Bson::Boolean(b)) => Some(a.cmp(b)),
        (Bson::DateTime(a), Bson::DateTime(b)) => Some(a.cmp(b)),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn escape_regex(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if "\\^$.|?*+()[]{}/-".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

pub fn sort_document(keys: &[SortKey]) -> Document {
    let mut sort = Document::new();
    for key in keys {
        let direction = match key.direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        };
        sort.insert(key.field.clone(), direction);
    }
    sort
}

/// Total order over documents for the given keys. Missing fields sort first
/// in ascending order, as they do in MongoDB.
pub fn compare_documents(a: &Document, b: &Document, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ordering = match (a.get(&key.field), b.get(&key.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare_bson(x, y).unwrap_or(Ordering::Equal),
        };
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Only these fields, plus `_id`.
    Include(Vec<String>),
    /// Everything except these fields.
    Exclude(Vec<String>),
}

impl Projection {
    pub fn to_document(&self) -> Document {
        let mut projection = Document::new();
        match self {
            Projection::Include(fields) => {
                for field in fields {
                    projection.insert(field.clone(), 1);
                }
            }
            Projection::Exclude(fields) => {
                for field in fields {
                    projection.insert(field.clone(), 0);
                }
            }
        }
        projection
    }

    pub fn apply(&self, document: Document) -> Document {
        match self {
            Projection::Include(fields) => document
                .into_iter()
                .filter(|(key, _)| key == ID_FIELD || fields.iter().any(|f| f == key))
                .collect(),
            Projection::Exclude(fields) => document
                .into_iter()
                .filter(|(key, _)| !fields.iter().any(|f| f == key))
                .collect(),
        }
    }
}

/// A fully resolved list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub page: u64,
    pub limit: u64,
}

impl ListQuery {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of matches plus the number of records matching the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub items: Vec<Document>,
    pub total: u64,
}

/// Chainable composition of a [`ListQuery`] from raw query-string options.
///
/// Steps not invoked keep their defaults: no predicate, newest first, the
/// schema's default projection, first page of ten.
pub struct ListQueryBuilder<'a> {
    schema: &'a ResourceSchema,
    params: BTreeMap<&'a str, &'a str>,
    predicates: Vec<Filter>,
    sort: Vec<SortKey>,
    projection: Projection,
    page: u64,
    limit: u64,
}

impl<'a> ListQueryBuilder<'a> {
    pub fn new(schema: &'a ResourceSchema, params: &'a HashMap<String, String>) -> Self {
        Self {
            schema,
            params: params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
            predicates: Vec::new(),
            sort: default_sort(),
            projection: schema.default_projection(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }

    /// The trimmed `search` term, if one was given.
    pub fn search_term(&self) -> Option<&'a str> {
        self.params
            .get("search")
            .copied()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// OR-s a case-insensitive substring match for `search` across `fields`.
    pub fn search(mut self, fields: &[&str]) -> Self {
        if let Some(term) = self.search_term() {
            self.predicates.push(Filter::Or(
                fields
                    .iter()
                    .map(|field| Filter::Contains {
                        field: field.to_string(),
                        term: term.to_string(),
                    })
                    .collect(),
            ));
        }
        self
    }

    /// AND-s an already-built predicate into the query.
    pub fn restrict(mut self, predicate: Filter) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Turns every non-reserved option into an equality or range predicate.
    pub fn filter(mut self) -> Result<Self, QueryError> {
        for (key, raw) in &self.params {
            if RESERVED_KEYS.contains(key) {
                continue;
            }

            let (field, op) = match key.rsplit_once('.') {
                Some((field, suffix)) => match CompareOp::from_suffix(suffix) {
                    Some(op) => (field, op),
                    None => (*key, CompareOp::Eq),
                },
                None => (*key, CompareOp::Eq),
            };

            let kind = self
                .schema
                .kind_of(field)
                .ok_or_else(|| QueryError::new(*key, "Unknown filter field"))?;
            let value = coerce(kind, raw).map_err(|message| QueryError::new(*key, message))?;

            self.predicates.push(Filter::Compare {
                field: field.to_string(),
                op,
                value,
            });
        }
        Ok(self)
    }

    /// Applies `sort` / `order`. A leading `-` on a field sorts it descending
    /// regardless of `order`.
    pub fn sort(mut self) -> Result<Self, QueryError> {
        let Some(raw) = self.params.get("sort").copied() else {
            return Ok(self);
        };

        let default_direction = match self.params.get("order").copied().map(str::trim) {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        let mut keys = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let (field, direction) = match name.strip_prefix('-') {
                Some(field) => (field, SortDirection::Descending),
                None => (name, default_direction),
            };
            if self.schema.kind_of(field).is_none() {
                return Err(QueryError::new("sort", format!("Unknown sort field '{}'", field)));
            }
            keys.push(SortKey::new(field, direction));
        }

        if !keys.is_empty() {
            if !keys.iter().any(|k| k.field == ID_FIELD) {
                keys.push(SortKey::new(ID_FIELD, SortDirection::Ascending));
            }
            self.sort = keys;
        }
        Ok(self)
    }

    /// Reads `page` / `limit`; anything that is not a positive integer falls
    /// back to the default.
    pub fn paginate(mut self) -> Self {
        self.page = positive_or(self.params.get("page").copied(), DEFAULT_PAGE);
        self.limit = positive_or(self.params.get("limit").copied(), DEFAULT_LIMIT);
        self
    }

    /// Applies `fields`. Hidden fields cannot be selected.
    pub fn limit_fields(mut self) -> Result<Self, QueryError> {
        let Some(raw) = self.params.get("fields").copied() else {
            return Ok(self);
        };

        let mut fields = Vec::new();
        for field in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if self.schema.kind_of(field).is_none() {
                return Err(QueryError::new(
                    "fields",
                    format!("Unknown field '{}'", field),
                ));
            }
            if !fields.iter().any(|f| f == field) {
                fields.push(field.to_string());
            }
        }

        if !fields.is_empty() {
            self.projection = Projection::Include(fields);
        }
        Ok(self)
    }

    pub fn build(self) -> ListQuery {
        let filter = match self.predicates.len() {
            1 => self.predicates.into_iter().next().unwrap_or_else(Filter::all),
            _ => Filter::And(self.predicates),
        };
        ListQuery {
            filter,
            sort: self.sort,
            projection: self.projection,
            page: self.page,
            limit: self.limit,
        }
    }
}

fn default_sort() -> Vec<SortKey> {
    vec![
        SortKey::new(CREATED_AT_FIELD, SortDirection::Descending),
        SortKey::new(ID_FIELD, SortDirection::Ascending),
    ]
}

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn coerce(kind: FieldKind, raw: &str) -> Result<Bson, String> {
    let trimmed = raw.trim();
    match kind {
        FieldKind::Text | FieldKind::Reference => Ok(Bson::String(raw.to_string())),
        FieldKind::Choice(allowed) => {
            if allowed.contains(&trimmed) {
                Ok(Bson::String(trimmed.to_string()))
            } else {
                Err(format!("Expected one of: {}", allowed.join(", ")))
            }
        }
        FieldKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Bson::Double)
            .ok_or_else(|| "Expected a number".to_string()),
        FieldKind::Integer => trimmed
            .parse::<i64>()
            .map(Bson::Int64)
            .map_err(|_| "Expected an integer".to_string()),
        FieldKind::Date => parse_instant(trimmed)
            .map(|dt| Bson::DateTime(BsonDateTime::from_chrono(dt)))
            .ok_or_else(|| "Expected an ISO 8601 date".to_string()),
    }
}
