//! URL slug generation for products and categories

/// Turn an arbitrary name into a URL-safe slug
///
/// Lowercases, maps whitespace and punctuation runs to a single `-`,
/// keeps ASCII alphanumerics, strips everything else.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true; // suppress leading dash

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_' || ch == '/') && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    if slug.ends_with('-') {
        slug.pop();
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        assert_eq!(slugify("Summer T-Shirt"), "summer-t-shirt");
        assert_eq!(slugify("  Red   Dress  "), "red-dress");
    }

    #[test]
    fn test_strips_symbols() {
        assert_eq!(slugify("50% Off! (Limited)"), "50-off-limited");
    }

    #[test]
    fn test_empty_and_symbol_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }
}
