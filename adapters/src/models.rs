//! Generic data models for the `adapters` crate.
//!
//! These models define the store-agnostic shapes exchanged with any
//! [`DocumentStore`](crate::DocumentStore) implementation: documents,
//! filters, pagination, and connection options.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record: a JSON object carrying at least `id`, `createdAt`
/// and `updatedAt` once persisted.
pub type Document = Map<String, Value>;

pub const FIELD_ID: &str = "id";
pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// Returns the `id` of a document, if present.
pub fn document_id(doc: &Document) -> Option<&str> {
    doc.get(FIELD_ID).and_then(Value::as_str)
}

/// Current time in the ISO-8601 form stored in timestamp fields.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generates a 24-character hex identifier: 4 bytes of unix seconds,
/// 5 random bytes, and a 3-byte process-wide counter.
pub fn generate_id() -> String {
    let mut raw = [0u8; 12];
    let secs = Utc::now().timestamp() as u32;
    raw[..4].copy_from_slice(&secs.to_be_bytes());
    let random: [u8; 5] = rand::random();
    raw[4..9].copy_from_slice(&random);
    let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed).to_be_bytes();
    raw[9..].copy_from_slice(&count[1..]);
    hex::encode(raw)
}

/// Query predicate over top-level document fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Field equals the given value.
    Equals { field: String, value: Value },
    /// Field equals any of the given values.
    In { field: String, values: Vec<Value> },
    /// Every sub-filter matches.
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn any_of<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `self` and `other`, flattening trivial cases.
    pub fn and(self, other: Filter) -> Filter {
        match (self, other) {
            (Filter::All, f) | (f, Filter::All) => f,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), f) => {
                left.push(f);
                Filter::And(left)
            }
            (f, Filter::And(mut right)) => {
                right.insert(0, f);
                Filter::And(right)
            }
            (a, b) => Filter::And(vec![a, b]),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Filter::All => true,
            Filter::Equals { field, value } => doc.get(field) == Some(value),
            Filter::In { field, values } => doc
                .get(field)
                .map(|v| values.contains(v))
                .unwrap_or(false),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
        }
    }
}

/// Pagination and ordering for `find`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FindOptions {
    /// Page size; `0` returns every match on a single page.
    #[serde(default = "FindOptions::default_limit")]
    pub limit: usize,
    /// One-based page number.
    #[serde(default = "FindOptions::default_page")]
    pub page: usize,
}

impl FindOptions {
    pub const DEFAULT_LIMIT: usize = 10;

    fn default_limit() -> usize {
        Self::DEFAULT_LIMIT
    }

    fn default_page() -> usize {
        1
    }

    /// Every match, one page.
    pub fn unlimited() -> Self {
        Self { limit: 0, page: 1 }
    }
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            page: 1,
        }
    }
}

/// A page of results in the paginated shape clients consume.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FindResult<T> {
    pub docs: Vec<T>,
    pub total_docs: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub page: usize,
    pub paging_counter: usize,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
}

impl<T> FindResult<T> {
    /// Slices `all` (already ordered) according to `options`.
    pub fn paginate(all: Vec<T>, options: FindOptions) -> Self {
        let total_docs = all.len();
        let page = options.page.max(1);
        let (docs, limit, total_pages) = if options.limit == 0 {
            (all, total_docs, 1)
        } else {
            let limit = options.limit;
            let total_pages = total_docs.div_ceil(limit).max(1);
            let docs = all
                .into_iter()
                .skip((page - 1).saturating_mul(limit))
                .take(limit)
                .collect();
            (docs, limit, total_pages)
        };

        Self {
            docs,
            total_docs,
            limit,
            total_pages,
            page,
            paging_counter: (page - 1).saturating_mul(limit).saturating_add(1),
            has_prev_page: page > 1,
            has_next_page: page < total_pages,
            prev_page: (page > 1).then(|| page - 1),
            next_page: (page < total_pages).then(|| page + 1),
        }
    }

    /// Converts every document, keeping pagination metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<FindResult<U>, E> {
        let docs = self.docs.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(FindResult {
            docs,
            total_docs: self.total_docs,
            limit: self.limit,
            total_pages: self.total_pages,
            page: self.page,
            paging_counter: self.paging_counter,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        })
    }
}

/// Connection settings handed to a [`StoreConnector`](crate::StoreConnector).
///
/// Everything beyond `url` is passed through to the store driver as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub url: String,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
    pub server_selection_timeout: Duration,
    pub max_idle_time: Duration,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub retry_writes: bool,
    pub retry_reads: bool,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        let minute = Duration::from_secs(60);
        Self {
            url: url.into(),
            connect_timeout: minute,
            socket_timeout: minute,
            server_selection_timeout: minute,
            max_idle_time: minute,
            max_pool_size: 10,
            min_pool_size: 5,
            retry_writes: true,
            retry_reads: true,
        }
    }

    /// The URL scheme, e.g. `memory` for `memory://portfolio`.
    pub fn scheme(&self) -> Option<&str> {
        self.url.split_once("://").map(|(scheme, _)| scheme)
    }

    /// The database name: the URL path after the host part.
    pub fn database(&self) -> Option<&str> {
        let rest = self.url.split_once("://")?.1;
        let name = match rest.split_once('/') {
            Some((_, path)) => path,
            None => rest,
        };
        let name = name.split('?').next().unwrap_or_default();
        (!name.is_empty()).then_some(name)
    }
}
