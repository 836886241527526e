//! URL classification for rich-text links and media sources.

use url::Url;

/// Outcome of checking an `href` for use as a run link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Absolute URL the host accepts as a link
    Absolute(String),
    /// Not linkable; the anchor text is kept as plain text
    Demoted,
}

/// Check if a URL is an absolute http(s) URL
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Decide whether `href` can become a run link.
///
/// Absolute `http`, `https` and `mailto` URLs are kept. Relative URLs are
/// resolved against `base_url` when one is given. Fragment-only links,
/// `javascript:` and every other scheme are demoted.
pub fn classify_link(href: &str, base_url: Option<&str>) -> LinkTarget {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return LinkTarget::Demoted;
    }

    match Url::parse(href) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" | "mailto" => LinkTarget::Absolute(parsed.to_string()),
            _ => LinkTarget::Demoted,
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let Some(base) = base_url.and_then(|b| Url::parse(b).ok()) else {
                return LinkTarget::Demoted;
            };
            match base.join(href) {
                Ok(joined) if matches!(joined.scheme(), "http" | "https") => {
                    LinkTarget::Absolute(joined.to_string())
                }
                _ => LinkTarget::Demoted,
            }
        }
        Err(_) => LinkTarget::Demoted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn javascript_links_are_demoted() {
        assert_eq!(classify_link("javascript:void(0)", None), LinkTarget::Demoted);
    }

    #[test]
    fn relative_links_need_a_base() {
        assert_eq!(classify_link("/docs/page.html", None), LinkTarget::Demoted);
        assert_eq!(
            classify_link("../api/intro", Some("https://docs.example.com/guide/start.html")),
            LinkTarget::Absolute("https://docs.example.com/api/intro".to_string())
        );
    }

    #[test]
    fn mailto_is_kept_as_link_but_not_as_media() {
        assert_eq!(
            classify_link("mailto:docs@example.com", None),
            LinkTarget::Absolute("mailto:docs@example.com".to_string())
        );
        assert!(!is_valid_url("mailto:docs@example.com"));
    }
}
