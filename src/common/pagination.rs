// src/common/pagination.rs
//
// Paginação, busca e ordenação compartilhadas por todas as listagens.

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
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

// Query string comum: ?page=2&limit=10&search=dust&sortField=date&sortDirection=asc
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .filter(|l| *l >= 1)
            .map(|l| l.min(MAX_LIMIT))
            .unwrap_or(DEFAULT_LIMIT)
    }

    // Páginas absurdas viram um OFFSET enorme (lista vazia), nunca negativo
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn direction(&self) -> SortDirection {
        self.sort_direction.unwrap_or_default()
    }

    /// Padrão ILIKE para a busca, ou `None` quando a busca está vazia.
    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern)
    }

    /// Resolve `sortField` contra a lista permitida do recurso.
    /// Campos desconhecidos caem no padrão (nunca vão crus para o SQL).
    pub fn sort_column(&self, allowed: &[(&str, &'static str)], default: &'static str) -> &'static str {
        self.sort_field
            .as_deref()
            .and_then(|field| {
                allowed
                    .iter()
                    .find(|(name, _)| *name == field)
                    .map(|(_, column)| *column)
            })
            .unwrap_or(default)
    }
}

/// Escapa `\`, `%` e `_` e envolve o termo em `%...%`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Acrescenta `AND (col1 ILIKE $n OR col2 ILIKE $n ...)` ao builder.
pub fn push_search(builder: &mut QueryBuilder<'_, Postgres>, columns: &[&str], pattern: Option<&str>) {
    let Some(pattern) = pattern else { return };
    if columns.is_empty() {
        return;
    }

    builder.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push("COALESCE(")
            .push(*column)
            .push(", '') ILIKE ")
            .push_bind(pattern.to_owned());
    }
    builder.push(")");
}

/// Acrescenta ORDER BY / LIMIT / OFFSET. O `id` desempata a ordenação.
pub fn push_page(builder: &mut QueryBuilder<'_, Postgres>, column: &'static str, query: &PageQuery) {
    builder
        .push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(query.direction().as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(query.limit())
        .push(" OFFSET ")
        .push_bind(query.offset());
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageMeta {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, query: &PageQuery) -> Self {
        Self {
            data,
            pagination: PageMeta::new(total, query.page(), query.limit()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: i64, limit: i64) -> PageQuery {
        PageQuery {
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        }
    }

    #[test]
    fn second_page_of_twenty_five() {
        let q = query(2, 10);
        let meta = PageMeta::new(25, q.page(), q.limit());

        // registros 11..=20
        assert_eq!(q.offset(), 10);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn last_and_first_pages() {
        let last = PageMeta::new(25, 3, 10);
        assert!(!last.has_next_page);
        assert!(last.has_prev_page);

        let first = PageMeta::new(25, 1, 10);
        assert!(first.has_next_page);
        assert!(!first.has_prev_page);

        let empty = PageMeta::new(0, 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
    }

    #[test]
    fn defaults_and_clamping() {
        let q = PageQuery::default();
        assert_eq!((q.page(), q.limit(), q.offset()), (1, DEFAULT_LIMIT, 0));

        let q = query(0, 5000);
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), MAX_LIMIT);

        let q = query(-3, -1);
        assert_eq!((q.page(), q.limit()), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn huge_page_saturates_offset() {
        let q = query(i64::MAX, 10);
        assert_eq!(q.offset(), i64::MAX);

        let meta = PageMeta::new(25, q.page(), q.limit());
        assert!(!meta.has_next_page);
        assert!(meta.has_prev_page);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("dust"), "%dust%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn blank_search_is_ignored() {
        let q = PageQuery {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(q.search_pattern(), None);
    }

    #[test]
    fn sort_column_uses_whitelist() {
        let allowed = [("name", "name"), ("createdAt", "created_at")];
        let mut q = PageQuery {
            sort_field: Some("createdAt".into()),
            ..Default::default()
        };
        assert_eq!(q.sort_column(&allowed, "name"), "created_at");

        q.sort_field = Some("name; DROP TABLE customers".into());
        assert_eq!(q.sort_column(&allowed, "name"), "name");
    }
}
