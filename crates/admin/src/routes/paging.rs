//! Page links for long lists.

/// Rows per list page.
pub const PAGE_SIZE: i64 = 50;

/// Position in a paged list plus the query string to keep on page links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    pub page: i64,
    pub total: i64,
    /// `path?filters` without the `page` parameter.
    base: String,
}

impl Pager {
    /// `page` is clamped to `1..=total_pages`. `filters` are the other query
    /// parameters; blank values are dropped.
    #[must_use]
    pub fn new(path: &str, page: Option<i64>, total: i64, filters: &[(&str, &str)]) -> Self {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in filters {
            if !value.trim().is_empty() {
                query.append_pair(key, value.trim());
            }
        }
        let query = query.finish();
        let base = if query.is_empty() {
            format!("{path}?")
        } else {
            format!("{path}?{query}&")
        };

        let mut pager = Self {
            page: 1,
            total: total.max(0),
            base,
        };
        pager.page = page.unwrap_or(1).clamp(1, pager.total_pages());
        pager
    }

    #[must_use]
    pub fn total_pages(&self) -> i64 {
        ((self.total + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * PAGE_SIZE
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    #[must_use]
    pub fn prev_href(&self) -> String {
        format!("{}page={}", self.base, self.page - 1)
    }

    #[must_use]
    pub fn next_href(&self) -> String {
        format!("{}page={}", self.base, self.page + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_links_keep_filters() {
        let pager = Pager::new("/orders", Some(2), 120, &[("status", "sent"), ("q", "")]);
        assert_eq!(pager.total_pages(), 3);
        assert_eq!(pager.offset(), 50);
        assert_eq!(pager.prev_href(), "/orders?status=sent&page=1");
        assert_eq!(pager.next_href(), "/orders?status=sent&page=3");
    }

    #[test]
    fn test_page_is_clamped() {
        let pager = Pager::new("/products", Some(9), 10, &[]);
        assert_eq!(pager.page, 1);
        assert!(!pager.has_prev());
        assert!(!pager.has_next());
        assert_eq!(Pager::new("/x", Some(0), 0, &[]).page, 1);
    }
}
