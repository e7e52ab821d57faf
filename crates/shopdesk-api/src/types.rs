// ── Wire types shared by every resource endpoint ──
//
// QueryParams is the cache key for list reads, so it derives `Hash`/`Eq`
// and stores free-form filters in a `BTreeMap`: two values built in a
// different insertion order still compare equal.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Query-string keys owned by the paging/sorting protocol.
pub const RESERVED_KEYS: [&str; 5] = ["page", "pageSize", "search", "_sort", "_order"];

// ── ResourceId ──────────────────────────────────────────────────────

/// Identifier of a resource record.
///
/// Backends emit either string or numeric ids; both normalize to a string
/// so identity comparisons never depend on the JSON representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

// ── Sorting ─────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortOrder {
    Asc,
    Desc,
}

// ── QueryParams ─────────────────────────────────────────────────────

/// Paging, search, sort, and free-form filters for a list read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub page: u32,
    pub page_size: u32,
    #[serde(default)]
    pub search: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub filters: BTreeMap<String, String>,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl QueryParams {
    /// First page, empty search, no sort, no filters.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            search: String::new(),
            sort_field: None,
            sort_order: None,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order);
        self
    }

    /// Add a free-form filter. Reserved protocol keys are ignored.
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_filter(key, value);
        self
    }

    /// Insert or replace a free-form filter; an empty value removes it.
    ///
    /// Returns `false` when `key` is one of [`RESERVED_KEYS`].
    pub fn insert_filter(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if is_reserved_key(&key) {
            return false;
        }
        let value = value.into();
        if value.is_empty() {
            self.filters.remove(&key);
        } else {
            self.filters.insert(key, value);
        }
        true
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    pub fn is_sorted(&self) -> bool {
        self.sort_field.is_some()
    }

    /// Compare the "what am I looking at" part of two param sets:
    /// search and free-form filters, ignoring paging and sort.
    pub fn same_selection(&self, other: &Self) -> bool {
        self.search == other.search && self.filters == other.filters
    }

    /// Query-string pairs in wire order. Empty search and empty filter
    /// values are omitted.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(5 + self.filters.len());
        if !self.search.is_empty() {
            pairs.push(("search".to_owned(), self.search.clone()));
        }
        pairs.push(("page".to_owned(), self.page.to_string()));
        pairs.push(("pageSize".to_owned(), self.page_size.to_string()));
        if let Some(field) = &self.sort_field {
            pairs.push(("_sort".to_owned(), field.clone()));
            let order = self.sort_order.unwrap_or(SortOrder::Asc);
            pairs.push(("_order".to_owned(), order.to_string()));
        }
        pairs.extend(
            self.filters
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        pairs
    }
}

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

// ── Pagination envelope ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl PageMeta {
    /// Build metadata with `total_pages = ceil(total / page_size)`.
    pub fn new(total: u64, page: u32, page_size: u32) -> Self {
        Self {
            total,
            page,
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// `ceil(total / page_size)`, saturating at `u32::MAX`; zero for a zero page size.
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
}

/// One page of a list read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> PaginatedResult<T> {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            data: Vec::new(),
            meta: PageMeta::new(0, page, page_size),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// ── Dropdown options ────────────────────────────────────────────────

/// `{id, label}` pair from `GET /R/options`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionItem {
    pub id: ResourceId,
    pub label: String,
}

// ── Bulk bodies ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct BulkUpdateBody<'a, P: ?Sized> {
    pub ids: &'a [String],
    pub data: &'a P,
}

#[derive(Debug, Serialize)]
pub(crate) struct BulkDeleteBody<'a> {
    pub ids: &'a [String],
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[test]
    fn filter_insertion_order_does_not_change_identity() {
        let a = QueryParams::default()
            .with_filter("brand", "7")
            .with_filter("status", "open");
        let b = QueryParams::default()
            .with_filter("status", "open")
            .with_filter("brand", "7");
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn reserved_keys_are_not_filters() {
        let mut p = QueryParams::default();
        assert!(!p.insert_filter("page", "9"));
        assert!(!p.insert_filter("_sort", "name"));
        assert!(p.filters.is_empty());
        assert_eq!(p.page, 1);
    }

    #[test]
    fn empty_filter_value_removes_key() {
        let mut p = QueryParams::default().with_filter("brand", "7");
        p.insert_filter("brand", "");
        assert_eq!(p.filter("brand"), None);
    }

    #[test]
    fn query_pairs_follow_wire_convention() {
        let p = QueryParams::new(25)
            .with_page(2)
            .with_search("iphone")
            .with_sort("name", SortOrder::Desc)
            .with_filter("isActive", "true");
        assert_eq!(
            p.to_query_pairs(),
            vec![
                ("search".to_owned(), "iphone".to_owned()),
                ("page".to_owned(), "2".to_owned()),
                ("pageSize".to_owned(), "25".to_owned()),
                ("_sort".to_owned(), "name".to_owned()),
                ("_order".to_owned(), "desc".to_owned()),
                ("isActive".to_owned(), "true".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_search_is_omitted() {
        let pairs = QueryParams::default().to_query_pairs();
        assert!(pairs.iter().all(|(k, _)| k != "search"));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(PageMeta::new(45, 1, 10).total_pages, 5);
        assert_eq!(PageMeta::new(40, 1, 10).total_pages, 4);
        assert_eq!(PageMeta::new(0, 1, 10).total_pages, 0);
        assert_eq!(PageMeta::new(1, 1, 10).total_pages, 1);
        assert_eq!(total_pages(10, 0), 0);
    }

    #[test]
    fn resource_id_accepts_numbers_and_strings() {
        let ids: Vec<ResourceId> = serde_json::from_str(r#"["abc", 42, -1]"#).unwrap();
        assert_eq!(ids[0].as_str(), "abc");
        assert_eq!(ids[1].as_str(), "42");
        assert_eq!(ids[2].as_str(), "-1");
    }

    #[test]
    fn query_params_round_trip_with_flattened_filters() {
        let json = serde_json::json!({
            "page": 3,
            "pageSize": 20,
            "search": "",
            "sortField": "createdAt",
            "sortOrder": "desc",
            "brandId": "5"
        });
        let p: QueryParams = serde_json::from_value(json).unwrap();
        assert_eq!(p.page, 3);
        assert_eq!(p.sort_order, Some(SortOrder::Desc));
        assert_eq!(p.filter("brandId"), Some("5"));
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::Asc.to_string(), "asc");
    }
}
