//! Pagination, sorting and list-query parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Requested page window (1-based page number).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Clamp raw query values into a usable window.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_LIMIT }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A validated sort clause.
///
/// Parsed from the `"<field> <asc|desc>"` query form; the field must come
/// from the caller-supplied allow-list, otherwise the request is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn parse(raw: &str, allowed: &[&str]) -> DomainResult<Self> {
        let mut parts = raw.split_whitespace();
        let field = parts
            .next()
            .ok_or_else(|| DomainError::invalid("sort", "must be \"<field> <asc|desc>\""))?
            .to_ascii_lowercase();

        let direction = match parts.next() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(DomainError::invalid(
                    "sort",
                    format!("unknown sort direction: {other}"),
                ));
            }
        };

        if parts.next().is_some() {
            return Err(DomainError::invalid("sort", "must be \"<field> <asc|desc>\""));
        }

        if !allowed.contains(&field.as_str()) {
            return Err(DomainError::invalid("sort", format!("invalid field: {field}")));
        }

        Ok(Self { field, direction })
    }
}

/// Composed parameters for a paginated listing.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub page: PageRequest,
    pub search: Option<String>,
    pub sort: Option<Sort>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
}

/// Page envelope returned to transports.
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageMeta {
    pub fn new(page: PageRequest, total_items: u64) -> Self {
        let mut total_pages = (total_items / u64::from(page.limit)) as u32;
        if total_items % u64::from(page.limit) > 0 {
            total_pages += 1;
        }
        Self {
            page: page.page,
            limit: page.limit,
            total_items,
            total_pages,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_items: u64) -> Self {
        Self { items, meta: PageMeta::new(page, total_items) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALLOWED: &[&str] = &["name", "created_at"];

    #[test]
    fn sort_parses_field_and_direction() {
        let sort = Sort::parse("name desc", ALLOWED).unwrap();
        assert_eq!(sort.field, "name");
        assert_eq!(sort.direction, SortDirection::Desc);
    }

    #[test]
    fn sort_defaults_to_ascending() {
        let sort = Sort::parse("created_at", ALLOWED).unwrap();
        assert_eq!(sort.direction, SortDirection::Asc);
    }

    #[test]
    fn sort_rejects_fields_outside_allow_list() {
        let err = Sort::parse("password_hash asc", ALLOWED).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn sort_rejects_bad_direction() {
        assert!(Sort::parse("name sideways", ALLOWED).is_err());
    }

    #[test]
    fn page_meta_rounds_total_pages_up() {
        let meta = PageMeta::new(PageRequest::new(1, 10), 21);
        assert_eq!(meta.total_pages, 3);
        let meta = PageMeta::new(PageRequest::new(1, 10), 20);
        assert_eq!(meta.total_pages, 2);
        let meta = PageMeta::new(PageRequest::new(1, 10), 0);
        assert_eq!(meta.total_pages, 0);
    }

    #[test]
    fn page_request_clamps_inputs() {
        let page = PageRequest::new(0, 0);
        assert_eq!((page.page, page.limit), (1, 1));
        let page = PageRequest::new(3, 1000);
        assert_eq!(page.limit, MAX_PAGE_LIMIT);
        assert_eq!(page.offset(), 2 * MAX_PAGE_LIMIT);
    }
}
