use crate::{UrlError, UrlResult};
use url::Url;

/// Default sitemap file appended to bare site inputs
pub const DEFAULT_SITEMAP_FILE: &str = "sitemap.xml";

/// Suffixes that mark an input as already pointing at a sitemap document
const SITEMAP_SUFFIXES: &[&str] = &[".xml", ".xml.gz"];

/// Parses a user-supplied URL, defaulting the scheme to `https://`
///
/// Only HTTP and HTTPS URLs with a host are accepted.
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::ensure_scheme;
///
/// let url = ensure_scheme("example.com/page").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn ensure_scheme(input: &str) -> UrlResult<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Malformed("empty URL".to_string()));
    }

    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&candidate).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Normalizes a site identifier into the primary sitemap URL
///
/// # Normalization Steps
///
/// 1. Prefix `https://` when no scheme is given
/// 2. Keep the URL as-is when its path already ends in `.xml` (query allowed)
/// 3. Otherwise strip trailing slashes from the path and append `/sitemap.xml`
///
/// # Examples
///
/// ```
/// use sitemap_crawler::url::normalize_site_input;
///
/// let url = normalize_site_input("example.com/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/sitemap.xml");
///
/// let url = normalize_site_input("https://example.com/post-sitemap.xml?page=2").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/post-sitemap.xml?page=2");
/// ```
pub fn normalize_site_input(input: &str) -> UrlResult<Url> {
    let mut url = ensure_scheme(input)?;

    if is_sitemap_path(url.path()) {
        return Ok(url);
    }

    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        DEFAULT_SITEMAP_FILE
    );
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Builds the ordered list of sitemap URLs to try for a normalized input
///
/// The primary URL always comes first. When it ends in `/sitemap.xml`, each
/// fallback path is tried in the same directory afterwards.
pub fn sitemap_candidates(primary: &Url, fallback_paths: &[String]) -> Vec<Url> {
    let mut candidates = vec![primary.clone()];

    let suffix = format!("/{}", DEFAULT_SITEMAP_FILE);
    let Some(prefix) = primary.path().strip_suffix(&suffix) else {
        return candidates;
    };

    for fallback in fallback_paths {
        let mut candidate = primary.clone();
        candidate.set_path(&format!("{}{}", prefix, fallback));
        candidate.set_query(None);
        candidate.set_fragment(None);

        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }

    candidates
}

/// Resolves a `Location` header value against the URL that returned it
///
/// Handles absolute, scheme-relative, root-relative and path-relative references.
pub fn resolve_location(base: &Url, location: &str) -> UrlResult<Url> {
    let location = location.trim();
    if location.is_empty() {
        return Err(UrlError::Malformed("empty Location header".to_string()));
    }

    base.join(location)
        .map_err(|e| UrlError::Parse(format!("{} (relative to {})", e, base)))
}

/// Returns true when the path points at a sitemap document rather than a site
fn is_sitemap_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    SITEMAP_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}
