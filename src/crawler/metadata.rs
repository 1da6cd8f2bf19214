//! HTML metadata extraction
//!
//! Pulls the SEO-relevant fields out of raw HTML with text patterns rather
//! than a DOM. Malformed markup never fails; missing patterns yield `None`.

use crate::crawler::chain::OgFlags;
use regex::Regex;
use std::sync::LazyLock;

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title pattern"));

static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").expect("h1 pattern"));

static ANY_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern"));

// Quoted attribute values may contain '>' so they are consumed whole.
static META_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("meta pattern")
});

static LINK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b(?:[^>"']|"[^"]*"|'[^']*')*>"#).expect("link pattern")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("attribute pattern")
});

/// Metadata extracted from an HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub canonical_url: Option<String>,
    pub hreflang_count: u32,
    pub og: OgFlags,
}

/// Extracts page metadata from raw HTML
///
/// # Matching Rules
///
/// - Title: first `<title>` element's text with nested tags stripped, trimmed
/// - Description: first `<meta name="description">` carrying a `content`, in either attribute order
/// - H1: first `<h1>` with nested tags stripped; empty counts as absent
/// - Canonical: first `<link rel="canonical">` carrying an `href`
/// - Hreflang: number of `<link rel="alternate" hreflang=…>` tags
/// - Open Graph: presence of `og:image`, `og:title`, `og:description`
///
/// # Example
///
/// ```
/// use sitemap_crawler::crawler::extract_metadata;
///
/// let html = r#"<head><title> Home </title><meta content='Hi' name='description'></head>"#;
/// let metadata = extract_metadata(html);
/// assert_eq!(metadata.title.as_deref(), Some("Home"));
/// assert_eq!(metadata.meta_description.as_deref(), Some("Hi"));
/// ```
pub fn extract_metadata(html: &str) -> PageMetadata {
    let mut metadata = PageMetadata {
        title: extract_title(html),
        h1: extract_h1(html),
        ..PageMetadata::default()
    };

    for tag in META_TAG_RE.find_iter(html) {
        let attrs = attributes(tag.as_str());

        if metadata.meta_description.is_none()
            && attr(&attrs, "name").is_some_and(|name| name.eq_ignore_ascii_case("description"))
        {
            metadata.meta_description = attr(&attrs, "content").and_then(non_empty);
        }

        match attr(&attrs, "property").map(|p| p.trim().to_ascii_lowercase()) {
            Some(p) if p == "og:image" => metadata.og.has_image = true,
            Some(p) if p == "og:title" => metadata.og.has_title = true,
            Some(p) if p == "og:description" => metadata.og.has_description = true,
            _ => {}
        }
    }

    for tag in LINK_TAG_RE.find_iter(html) {
        let attrs = attributes(tag.as_str());
        let Some(rel) = attr(&attrs, "rel") else {
            continue;
        };

        if has_rel(rel, "canonical") && metadata.canonical_url.is_none() {
            metadata.canonical_url = attr(&attrs, "href").and_then(non_empty);
        }

        if has_rel(rel, "alternate") && attr(&attrs, "hreflang").is_some() {
            metadata.hreflang_count += 1;
        }
    }

    metadata
}

fn extract_title(html: &str) -> Option<String> {
    element_text(&TITLE_RE, html)
}

fn extract_h1(html: &str) -> Option<String> {
    element_text(&H1_RE, html)
}

/// Text of the first element matched by `pattern`, with nested tags stripped
fn element_text(pattern: &Regex, html: &str) -> Option<String> {
    let inner = pattern.captures(html)?.get(1)?.as_str();
    let stripped = ANY_TAG_RE.replace_all(inner, "");
    non_empty(&stripped)
}

/// Lowercased attribute names paired with their raw values
fn attributes(tag: &str) -> Vec<(String, &str)> {
    ATTRIBUTE_RE
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps.get(2).or(caps.get(3)).or(caps.get(4))?.as_str();
            Some((name, value))
        })
        .collect()
}

fn attr<'a>(attrs: &'a [(String, &'a str)], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|(attr_name, _)| attr_name == name)
        .map(|(_, value)| *value)
}

fn has_rel(rel: &str, wanted: &str) -> bool {
    rel.split_whitespace()
        .any(|token| token.eq_ignore_ascii_case(wanted))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
