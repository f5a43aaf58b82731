//! Small string normalization helpers shared by the extractor.

/// Trim surrounding whitespace and ASCII-lowercase.
///
/// Attribute names and keyword-like attribute values (`http-equiv`,
/// `property`, `name`) are compared through this.
///
/// # Examples
/// ```
/// # use kodegen_tools_linkpreview::utils::clean_str;
/// assert_eq!(clean_str("  OG:Title "), "og:title");
/// ```
#[inline]
#[must_use]
pub fn clean_str(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

/// Strip whitespace and one level of matching single or double quotes.
#[must_use]
pub fn trim_quotes(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
            return inner.trim();
        }
    }
    s.trim_matches(|c| c == '"' || c == '\'').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_str_lowercases_and_trims() {
        assert_eq!(clean_str("\tHTTP-EQUIV\n"), "http-equiv");
        assert_eq!(clean_str(""), "");
    }

    #[test]
    fn trim_quotes_handles_matching_and_stray_quotes() {
        assert_eq!(trim_quotes("'next.html'"), "next.html");
        assert_eq!(trim_quotes(" \"next.html\" "), "next.html");
        assert_eq!(trim_quotes("'next.html"), "next.html");
        assert_eq!(trim_quotes("next.html"), "next.html");
    }
}
