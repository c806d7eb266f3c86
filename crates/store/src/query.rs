//! List-query composition.
//!
//! Paginated endpoints share the same filter shape: an optional
//! case-folded search over a set of columns, an optional creation-time
//! window, an allow-listed sort and a LIMIT/OFFSET window. The filter half
//! is pushed onto both the count query and the page query; sort and
//! pagination only apply to the latter. Sort fields are validated against
//! the entity's allow-list at parse time, which is what makes pushing them
//! as literals safe.

use sqlx::{Postgres, QueryBuilder};

use gatehouse_core::ListParams;

/// Append the shared WHERE clause: soft-delete exclusion, search, and the
/// created_at window.
pub fn push_list_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    params: &ListParams,
    search_fields: &[&str],
    alias: &str,
) {
    qb.push(" WHERE ");
    qb.push(alias);
    qb.push(".deleted_at IS NULL");

    if let Some(search) = &params.search {
        if !search.is_empty() && !search_fields.is_empty() {
            let needle = format!("%{}%", search.to_lowercase());
            qb.push(" AND (");
            for (i, field) in search_fields.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("LOWER({alias}.{field}) LIKE "));
                qb.push_bind(needle.clone());
            }
            qb.push(")");
        }
    }

    if let Some(from) = params.created_from {
        qb.push(format!(" AND {alias}.created_at >= "));
        qb.push_bind(from);
    }
    if let Some(until) = params.created_until {
        qb.push(format!(" AND {alias}.created_at <= "));
        qb.push_bind(until);
    }
}

/// Append ORDER BY / LIMIT / OFFSET for the page query.
pub fn push_sort_and_page(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams, alias: &str) {
    if let Some(sort) = &params.sort {
        qb.push(format!(
            " ORDER BY {alias}.{} {}",
            sort.field,
            sort.direction.as_sql()
        ));
    }
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(params.page.limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::from(params.page.offset()));
}
