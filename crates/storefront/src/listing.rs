//! Product list filters, sorting and pagination.
//!
//! Category, search and the collection pages (offers, newest, best sellers)
//! all accept the same query string. Parsing is lenient: a value that does
//! not parse is ignored instead of rejecting the request.

use serde::Deserialize;

use iranmarket_core::{BrandId, Toman};

/// Products per listing page.
pub const PAGE_SIZE: i64 = 24;

/// Raw listing query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub q: Option<String>,
    pub brand: Option<String>,
    pub only_discount: Option<String>,
    pub in_stock: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

/// Product ordering on list pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    /// Best sellers first, then newest.
    BestSeller,
}

impl SortOrder {
    /// Parse the `sort` parameter; unknown values fall back to newest.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("price_asc") => Self::PriceAsc,
            Some("price_desc") => Self::PriceDesc,
            Some("bestseller") => Self::BestSeller,
            _ => Self::Newest,
        }
    }

    /// `ORDER BY` clause; `final_price` is the effective price column.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::PriceAsc => "final_price ASC, p.id DESC",
            Self::PriceDesc => "final_price DESC, p.id DESC",
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::BestSeller => "p.is_best_seller DESC, p.created_at DESC, p.id DESC",
        }
    }
}

/// Parsed, validated filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub brand: Option<BrandId>,
    pub only_discount: bool,
    pub in_stock: bool,
    /// Inclusive bounds on the effective price.
    pub min_price: Option<Toman>,
    pub max_price: Option<Toman>,
    pub sort: SortOrder,
}

impl ListingFilter {
    #[must_use]
    pub fn from_query(query: &ListingQuery) -> Self {
        Self {
            brand: parse_number(query.brand.as_deref()).map(BrandId::new),
            only_discount: is_flag_set(query.only_discount.as_deref()),
            in_stock: is_flag_set(query.in_stock.as_deref()),
            min_price: parse_number::<i64>(query.min_price.as_deref()).map(Toman::new),
            max_price: parse_number::<i64>(query.max_price.as_deref()).map(Toman::new),
            sort: SortOrder::parse(query.sort.as_deref()),
        }
    }
}

fn is_flag_set(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim() == "1")
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>) -> Option<T> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// One page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl Page {
    /// Resolve the requested page against the result count. Garbage selects
    /// the first page; numbers past the end select the last.
    #[must_use]
    pub fn resolve(requested: Option<&str>, total: i64) -> Self {
        let num_pages = ((total.max(0) + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let number = parse_number::<i64>(requested)
            .unwrap_or(1)
            .clamp(1, num_pages);
        Self {
            number,
            num_pages,
            total,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.number - 1) * PAGE_SIZE
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    #[must_use]
    pub const fn previous(&self) -> i64 {
        self.number - 1
    }

    #[must_use]
    pub const fn next(&self) -> i64 {
        self.number + 1
    }
}

/// The current query string minus `page` and empty values, for page links.
#[must_use]
pub fn querystring_without_page(raw: Option<&str>) -> String {
    raw.unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key != "page" && !value.is_empty()).then_some(pair)
        })
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let mut q = ListingQuery::default();
        for (k, v) in pairs {
            let v = Some((*v).to_owned());
            match *k {
                "brand" => q.brand = v,
                "only_discount" => q.only_discount = v,
                "in_stock" => q.in_stock = v,
                "min_price" => q.min_price = v,
                "max_price" => q.max_price = v,
                "sort" => q.sort = v,
                _ => {}
            }
        }
        q
    }

    #[test]
    fn test_filter_parses_known_values() {
        let filter = ListingFilter::from_query(&query(&[
            ("brand", "4"),
            ("only_discount", "1"),
            ("in_stock", "1"),
            ("min_price", "10000"),
            ("max_price", "50000"),
            ("sort", "price_desc"),
        ]));
        assert_eq!(filter.brand, Some(BrandId::new(4)));
        assert!(filter.only_discount);
        assert!(filter.in_stock);
        assert_eq!(filter.min_price, Some(Toman::new(10_000)));
        assert_eq!(filter.max_price, Some(Toman::new(50_000)));
        assert_eq!(filter.sort, SortOrder::PriceDesc);
    }

    #[test]
    fn test_filter_ignores_garbage() {
        let filter = ListingFilter::from_query(&query(&[
            ("brand", "x"),
            ("only_discount", "yes"),
            ("min_price", "ten"),
            ("max_price", ""),
            ("sort", "random"),
        ]));
        assert_eq!(filter, ListingFilter::default());
    }

    #[test]
    fn test_bestseller_sort_falls_back_to_newest() {
        assert!(SortOrder::BestSeller.sql().starts_with("p.is_best_seller DESC, p.created_at DESC"));
        assert_eq!(SortOrder::parse(None), SortOrder::Newest);
        assert_eq!(SortOrder::parse(Some("new")), SortOrder::Newest);
    }

    #[test]
    fn test_page_resolve() {
        let page = Page::resolve(Some("2"), 50);
        assert_eq!(page.num_pages, 3);
        assert_eq!(page.offset(), 24);
        assert!(page.has_previous());
        assert!(page.has_next());

        assert_eq!(Page::resolve(Some("abc"), 50).number, 1);
        assert_eq!(Page::resolve(Some("99"), 50).number, 3);
        assert_eq!(Page::resolve(Some("-3"), 50).number, 1);

        let empty = Page::resolve(None, 0);
        assert_eq!(empty.num_pages, 1);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_querystring_without_page() {
        assert_eq!(
            querystring_without_page(Some("sort=new&page=3&brand=&in_stock=1")),
            "sort=new&in_stock=1"
        );
        assert_eq!(querystring_without_page(Some("page=2")), "");
        assert_eq!(querystring_without_page(None), "");
    }
}
