//! URL handling module for the sitemap crawler
//!
//! This module turns user-supplied site identifiers into sitemap URLs, builds
//! the list of fallback sitemap candidates, and resolves redirect targets.

mod normalize;

pub use normalize::{
    ensure_scheme, normalize_site_input, resolve_location, sitemap_candidates,
    DEFAULT_SITEMAP_FILE,
};

use url::Url;

/// Returns true when the URL uses the `https` scheme
pub fn is_https(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.scheme() == "https")
        .unwrap_or_else(|_| url.trim().to_ascii_lowercase().starts_with("https://"))
}
