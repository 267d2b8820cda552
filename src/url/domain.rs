use url::Url;

/// Extracts the authority (network location) of a URL
///
/// The result is the lowercase host, prefixed by any userinfo and suffixed by
/// an explicit non-default port, so it can be compared verbatim against a
/// configured host. Default ports are dropped by the URL parser and therefore
/// never appear.
///
/// # Returns
///
/// * `Some(String)` - The authority, e.g. `example.com` or `127.0.0.1:8080`
/// * `None` - If the URL has no host (`mailto:`, `javascript:`, `data:` ...)
///
/// # Examples
///
/// ```
/// use url::Url;
/// use docs_mirror::url::extract_authority;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_authority(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/path").unwrap();
/// assert_eq!(extract_authority(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_authority(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();

    let mut authority = String::new();
    if !url.username().is_empty() || url.password().is_some() {
        authority.push_str(url.username());
        if let Some(password) = url.password() {
            authority.push(':');
            authority.push_str(password);
        }
        authority.push('@');
    }
    authority.push_str(&host);
    if let Some(port) = url.port() {
        authority.push_str(&format!(":{}", port));
    }

    Some(authority)
}
