//! Data table component types: filter bar and pager.
//!
//! List pages describe their filters with [`TableFilter`]; the shared
//! `partials/filters.html` and `partials/pager.html` render them.

use shopfront_core::listing::{ListQuery, Page};

/// Option for a select filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl FilterOption {
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    Text,
    Select,
}

/// One control in a list page's filter bar, prefilled from the query.
#[derive(Debug, Clone)]
pub struct TableFilter {
    /// Query parameter name.
    pub key: String,
    pub label: String,
    pub filter_type: FilterType,
    pub placeholder: String,
    /// Current value (text filters).
    pub value: String,
    /// Choices (select filters); the first is always "All".
    pub options: Vec<FilterOption>,
}

impl TableFilter {
    /// Create a text filter.
    #[must_use]
    pub fn text(key: &str, label: &str, placeholder: &str, current: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Text,
            placeholder: placeholder.to_string(),
            value: current.unwrap_or_default().to_string(),
            options: vec![],
        }
    }

    /// Create a select filter with an "All" choice in front of `options`.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>, current: Option<&str>) -> Self {
        let current = current.map(str::trim).unwrap_or_default();
        let options = std::iter::once(FilterOption::new("", "All"))
            .chain(options)
            .map(|mut option| {
                option.selected = option.value == current;
                option
            })
            .collect();

        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            placeholder: String::new(),
            value: current.to_string(),
            options,
        }
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }
}

/// Link to `page` of a listing, keeping the active filters.
#[must_use]
pub fn page_url(base: &str, query: &ListQuery, page: usize) -> String {
    let params = [
        ("q", &query.q),
        ("category", &query.category),
        ("stock", &query.stock),
        ("role", &query.role),
    ];
    let mut url = format!("{base}?page={page}");
    for (key, value) in params {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
    }
    url
}

/// Pager under a table: position and neighbour links.
#[derive(Debug, Clone)]
pub struct Pager {
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based index of the first row shown; 0 when the table is empty.
    pub first_row: usize,
    pub last_row: usize,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

impl Pager {
    #[must_use]
    pub fn new<T>(page: &Page<T>, base: &str, query: &ListQuery) -> Self {
        let first_row = if page.items.is_empty() {
            0
        } else {
            (page.page - 1) * page.per_page + 1
        };
        Self {
            page: page.page,
            total_pages: page.total_pages,
            total_items: page.total_items,
            first_row,
            last_row: (page.page - 1) * page.per_page + page.items.len(),
            prev_url: page
                .has_prev()
                .then(|| page_url(base, query, page.prev_page())),
            next_url: page
                .has_next()
                .then(|| page_url(base, query, page.next_page())),
        }
    }
}

#[cfg(test)]
mod tests {
    use shopfront_core::listing::ADMIN_PAGE_SIZE;

    use super::*;

    #[test]
    fn test_select_marks_current_option() {
        let filter = TableFilter::select(
            "role",
            "Role",
            vec![
                FilterOption::new("customer", "Customer"),
                FilterOption::new("admin", "Admin"),
            ],
            Some("admin"),
        );
        let selected: Vec<&str> = filter
            .options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.label.as_str())
            .collect();
        assert_eq!(selected, vec!["Admin"]);
        assert_eq!(filter.options.len(), 3);
    }

    #[test]
    fn test_select_without_value_selects_all() {
        let filter = TableFilter::select("stock", "Stock", vec![], None);
        assert!(filter.options.first().is_some_and(|o| o.selected));
    }

    #[test]
    fn test_pager_rows_and_links() {
        let query = ListQuery {
            role: Some("admin".to_string()),
            ..ListQuery::default()
        };
        let page = Page::paginate((1..=45).collect::<Vec<_>>(), 2, ADMIN_PAGE_SIZE);
        let pager = Pager::new(&page, "/users", &query);
        assert_eq!((pager.first_row, pager.last_row), (21, 40));
        assert_eq!(pager.prev_url.as_deref(), Some("/users?page=1&role=admin"));
        assert_eq!(pager.next_url.as_deref(), Some("/users?page=3&role=admin"));
    }

    #[test]
    fn test_pager_for_empty_table() {
        let page: Page<u8> = Page::paginate(Vec::new(), 1, ADMIN_PAGE_SIZE);
        let pager = Pager::new(&page, "/products", &ListQuery::default());
        assert_eq!((pager.first_row, pager.last_row), (0, 0));
        assert!(pager.prev_url.is_none() && pager.next_url.is_none());
    }
}
