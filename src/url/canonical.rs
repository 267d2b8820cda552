use crate::{UrlError, UrlResult};
use url::Url;

/// Produces the canonical form of a link found on `base`
///
/// # Canonicalization Steps
///
/// 1. Resolve `raw` against `base` using standard URL resolution
///    (absolute, protocol-relative, root-relative and relative forms)
/// 2. Reject anything that does not resolve to an http(s) URL with a host
/// 3. Remove the fragment (everything after #)
/// 4. Remove an empty query, so `page?` and `page` are the same URL
///
/// The URL parser also lowercases the host, drops default ports and removes
/// dot segments, so the serialized result is stable under re-canonicalization.
/// Non-empty query strings are kept as-is.
///
/// # Arguments
///
/// * `raw` - The link as it appears in the page (`href` value)
/// * `base` - The URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(Url)` - Canonical URL, usable as a deduplication key
/// * `Err(UrlError)` - Link is unparsable or not a web URL; callers drop it
///
/// # Examples
///
/// ```
/// use docs_mirror::url::canonicalize;
/// use url::Url;
///
/// let base = Url::parse("https://interview.poetries.top/fe-base-docs/browser/part1").unwrap();
/// let url = canonicalize("part2#intro", &base).unwrap();
/// assert_eq!(url.as_str(), "https://interview.poetries.top/fe-base-docs/browser/part2");
/// ```
pub fn canonicalize(raw: &str, base: &Url) -> UrlResult<Url> {
    let mut url = base.join(raw).map_err(|e| UrlError::Resolve {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://interview.poetries.top/fe-base-docs/browser/part1").unwrap()
    }

    #[test]
    fn test_empty_query_dropped() {
        let bare = canonicalize("part2", &base()).unwrap();
        let empty_query = canonicalize("part2?", &base()).unwrap();
        let empty_query_fragment = canonicalize("part2?#top", &base()).unwrap();

        assert_eq!(empty_query, bare);
        assert_eq!(empty_query_fragment, bare);
        assert_eq!(
            empty_query.as_str(),
            "https://interview.poetries.top/fe-base-docs/browser/part2"
        );

        let with_query = canonicalize("part2?lang=en", &base()).unwrap();
        assert_eq!(with_query.query(), Some("lang=en"));
    }

    #[test]
    fn test_fragment_variants_are_equal() {
        let with_fragment = canonicalize(
            "https://interview.poetries.top/fe-base-docs/browser/part1#intro",
            &base(),
        )
        .unwrap();
        let without = canonicalize(
            "https://interview.poetries.top/fe-base-docs/browser/part1",
            &base(),
        )
        .unwrap();
        assert_eq!(with_fragment, without);
        assert_eq!(
            with_fragment.as_str(),
            "https://interview.poetries.top/fe-base-docs/browser/part1"
        );
    }

    #[test]
    fn test_empty_fragment_removed() {
        let url = canonicalize("part2#", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://interview.poetries.top/fe-base-docs/browser/part2"
        );
    }

    #[test]
    fn test_fragment_only_link_resolves_to_base() {
        let url = canonicalize("#section-3", &base()).unwrap();
        assert_eq!(url, base());
    }

    #[test]
    fn test_relative_sibling() {
        let url = canonicalize("./part2", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://interview.poetries.top/fe-base-docs/browser/part2"
        );
    }

    #[test]
    fn test_relative_parent() {
        let url = canonicalize("../network/part1.html", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://interview.poetries.top/fe-base-docs/network/part1.html"
        );
    }

    #[test]
    fn test_root_relative() {
        let url = canonicalize("/fe-base-docs/css/part3", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://interview.poetries.top/fe-base-docs/css/part3"
        );
    }

    #[test]
    fn test_protocol_relative() {
        let url = canonicalize("//other.com/fe-base-docs/browser/part1", &base()).unwrap();
        assert_eq!(url.as_str(), "https://other.com/fe-base-docs/browser/part1");
    }

    #[test]
    fn test_query_is_kept() {
        let url = canonicalize("part2?tab=1#top", &base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://interview.poetries.top/fe-base-docs/browser/part2?tab=1"
        );
    }

    #[test]
    fn test_host_lowercased() {
        let url = canonicalize("https://Interview.Poetries.TOP/fe-base-docs/a/b", &base()).unwrap();
        assert_eq!(url.host_str(), Some("interview.poetries.top"));
    }

    #[test]
    fn test_non_web_schemes_rejected() {
        assert!(matches!(
            canonicalize("mailto:someone@example.com", &base()).unwrap_err(),
            UrlError::InvalidScheme(_)
        ));
        assert!(matches!(
            canonicalize("javascript:void(0)", &base()).unwrap_err(),
            UrlError::InvalidScheme(_)
        ));
    }

    #[test]
    fn test_unparsable_rejected() {
        assert!(matches!(
            canonicalize("http://[::1", &base()).unwrap_err(),
            UrlError::Resolve { .. }
        ));
        assert!(canonicalize("https://exa mple.com/", &base()).is_err());
    }

    #[test]
    fn test_canonicalization_is_idempotent() {
        let inputs = [
            "part2#intro",
            "../network/part1.html?x=1#y",
            "//Interview.Poetries.Top:443/fe-base-docs/./a/../b",
            "/fe-base-docs/browser/%E6%B5%8F%E8%A7%88%E5%99%A8",
            "/fe-base-docs/browser/浏览器",
            "https://interview.poetries.top",
        ];

        for input in inputs {
            let once = canonicalize(input, &base()).unwrap();
            let twice = canonicalize(once.as_str(), &base()).unwrap();
            assert_eq!(once.as_str(), twice.as_str(), "not idempotent: {}", input);

            // Re-canonicalizing against an unrelated base changes nothing either
            let other_base = Url::parse("https://other.com/x/y").unwrap();
            let elsewhere = canonicalize(once.as_str(), &other_base).unwrap();
            assert_eq!(once.as_str(), elsewhere.as_str());
        }
    }
}
