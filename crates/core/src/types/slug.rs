//! URL slugs for categories, brands, products and locations.
//!
//! Names are mostly Persian, so slugs keep any Unicode letter or digit rather
//! than transliterating. Everything else collapses into single hyphens.

/// Turn a display name into a slug.
///
/// ```
/// use iranmarket_core::slugify;
///
/// assert_eq!(slugify("  Fresh  Fruit & Veg "), "fresh-fruit-veg");
/// assert_eq!(slugify("لبنیات و پروتئین"), "لبنیات-و-پروتئین");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(ch.to_lowercase());
        } else if !matches!(ch, '\u{200c}') {
            // Zero-width non-joiner is part of Persian words; drop it silently.
            pending_dash = true;
        }
    }
    out
}

/// Pick a slug derived from `base` that `is_taken` does not reject.
///
/// Tries `base`, then `base-2`, `base-3`, and so on. An empty base falls
/// back to `item`.
pub fn unique_slug<F>(base: &str, mut is_taken: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = if base.is_empty() { "item" } else { base };
    if !is_taken(base) {
        return base.to_owned();
    }
    let mut n: u32 = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !is_taken(&candidate) {
            return candidate;
        }
        n = n.saturating_add(1);
    }
}

/// Default slug for a city: `<province>-<city>`.
#[must_use]
pub fn city_slug(province_name: &str, city_name: &str) -> String {
    slugify(&format!("{province_name} {city_name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_separators() {
        assert_eq!(slugify("a__b--c  d"), "a-b-c-d");
        assert_eq!(slugify("--edge--"), "edge");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn test_keeps_persian_and_drops_zwnj() {
        assert_eq!(slugify("می\u{200c}خواهم"), "میخواهم");
        assert_eq!(slugify("روغن ۲ لیتری"), "روغن-۲-لیتری");
    }

    #[test]
    fn test_unique_slug_suffixes() {
        let taken = ["rice", "rice-2"];
        let slug = unique_slug("rice", |s| taken.contains(&s));
        assert_eq!(slug, "rice-3");
    }

    #[test]
    fn test_unique_slug_free_base() {
        assert_eq!(unique_slug("tea", |_| false), "tea");
        assert_eq!(unique_slug("", |_| false), "item");
    }

    #[test]
    fn test_city_slug() {
        assert_eq!(city_slug("Tehran", "Shemiran"), "tehran-shemiran");
    }
}
