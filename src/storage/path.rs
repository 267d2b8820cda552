use std::path::{Path, PathBuf};
use url::Url;

/// Separator used in place of `/` when flattening a URL path
pub const FLAT_DELIMITER: char = '_';

/// Derives the flat local file name of a canonical URL
///
/// # Mapping Steps
///
/// 1. Take the URL path (still percent-encoded, query and host ignored)
/// 2. Strip leading and trailing `/`
/// 3. Append `suffix` unless the path already ends with it
/// 4. Replace every remaining `/` with `_`
///
/// The mapping is injective for the route shapes seen on the target site, but
/// not in general: `/a/b` and `/a_b` both map to `a_b.html`, and URLs that
/// differ only in their query string share a name. Those collisions are a
/// known limitation; the later write wins.
///
/// # Examples
///
/// ```
/// use docs_mirror::storage::local_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://interview.poetries.top/fe-base-docs/browser/part1").unwrap();
/// assert_eq!(local_file_name(&url, ".html"), "fe-base-docs_browser_part1.html");
/// ```
pub fn local_file_name(url: &Url, suffix: &str) -> String {
    let mut path = url.path().trim_matches('/').to_string();

    if !path.ends_with(suffix) {
        path.push_str(suffix);
    }

    path.replace('/', &FLAT_DELIMITER.to_string())
}

/// Joins the flat file name of `url` onto the output directory
pub fn local_path(root: &Path, url: &Url, suffix: &str) -> PathBuf {
    root.join(local_file_name(url, suffix))
}
