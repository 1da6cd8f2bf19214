//! Sitemap document parsing
//!
//! Handles XML `urlset` and `sitemapindex` documents as well as plain-text
//! sitemaps with one URL per line. The format is chosen from the
//! Content-Type header and, when that is missing or wrong, by sniffing the body.
//! Gzip-compressed documents (`sitemap.xml.gz`) are inflated before parsing.

use crate::sitemap::SitemapEntry;
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Format a fetched document will be parsed as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapFormat {
    Xml,
    PlainText,
    /// HTML or binary content that cannot be a sitemap
    Unsupported,
}

/// Result of parsing one sitemap document
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSitemap {
    /// A `urlset` (or plain-text list) of page entries
    UrlSet(Vec<SitemapEntry>),
    /// A `sitemapindex` pointing at further sitemaps
    Index(Vec<String>),
    /// Neither root element was found
    Unrecognized,
}

impl ParsedSitemap {
    /// Returns true when no entries and no child sitemaps were found
    pub fn is_empty(&self) -> bool {
        match self {
            Self::UrlSet(entries) => entries.is_empty(),
            Self::Index(children) => children.is_empty(),
            Self::Unrecognized => true,
        }
    }
}

/// Returns true if the bytes start with the gzip magic number
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Turns a fetched body into text, inflating it when it is gzip-compressed
///
/// # Returns
///
/// * `Ok((String, bool))` - The text and whether it was inflated
/// * `Err(String)` - The gzip stream was corrupt or not UTF-8
pub fn decode_body(bytes: &[u8]) -> Result<(String, bool), String> {
    if !is_gzip(bytes) {
        return Ok((String::from_utf8_lossy(bytes).into_owned(), false));
    }

    let mut body = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut body)
        .map_err(|e| format!("gzip error: {}", e))?;
    Ok((body, true))
}

/// Decides how a document should be parsed
pub fn detect_format(content_type: Option<&str>, body: &str) -> SitemapFormat {
    let content_type = content_type.map(str::to_ascii_lowercase);

    if looks_like_xml(body) || content_type.as_deref().is_some_and(|ct| ct.contains("xml")) {
        return SitemapFormat::Xml;
    }

    match content_type.as_deref() {
        Some(ct) if ct.contains("text/html") => SitemapFormat::Unsupported,
        Some(ct) if ct.contains("gzip") => SitemapFormat::Unsupported,
        _ => SitemapFormat::PlainText,
    }
}

/// Returns true if the body starts like an XML sitemap
pub fn looks_like_xml(body: &str) -> bool {
    let head = body.trim_start_matches('\u{feff}').trim_start();
    head.starts_with("<?xml") || head.starts_with("<urlset") || head.starts_with("<sitemapindex")
}

/// Parses a fetched sitemap document
///
/// # Returns
///
/// * `Ok(ParsedSitemap)` - The parsed document; unknown roots yield `Unrecognized`
/// * `Err(String)` - The XML was malformed
pub fn parse_sitemap(content_type: Option<&str>, body: &str) -> Result<ParsedSitemap, String> {
    match detect_format(content_type, body) {
        SitemapFormat::Xml => parse_xml(body),
        SitemapFormat::PlainText => Ok(ParsedSitemap::UrlSet(parse_plain_text(body))),
        SitemapFormat::Unsupported => Ok(ParsedSitemap::Unrecognized),
    }
}

/// Parses a plain-text sitemap: one absolute URL per non-blank line
pub fn parse_plain_text(body: &str) -> Vec<SitemapEntry> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| {
            url::Url::parse(line).is_ok_and(|u| u.scheme() == "http" || u.scheme() == "https")
        })
        .map(|line| SitemapEntry {
            loc: line.to_string(),
            last_modified: None,
            priority: None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    UrlSet,
    Index,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    LastMod,
    Priority,
}

#[derive(Debug, Default)]
struct PartialEntry {
    loc: String,
    lastmod: String,
    priority: String,
}

impl PartialEntry {
    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Loc => &mut self.loc,
            Field::LastMod => &mut self.lastmod,
            Field::Priority => &mut self.priority,
        }
    }

    fn into_entry(self) -> Option<SitemapEntry> {
        let loc = self.loc.trim();
        if loc.is_empty() {
            return None;
        }

        let lastmod = self.lastmod.trim();
        Some(SitemapEntry {
            loc: loc.to_string(),
            last_modified: (!lastmod.is_empty()).then(|| lastmod.to_string()),
            priority: self.priority.trim().parse::<f64>().ok(),
        })
    }
}

/// Parses an XML sitemap or sitemap index
pub fn parse_xml(body: &str) -> Result<ParsedSitemap, String> {
    let mut reader = Reader::from_str(body.trim_start_matches('\u{feff}'));
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut root: Option<Root> = None;
    let mut current: Option<PartialEntry> = None;
    let mut field: Option<Field> = None;
    let mut entries = Vec::new();
    let mut children = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                match (root, name.as_ref()) {
                    (None, b"urlset") => root = Some(Root::UrlSet),
                    (None, b"sitemapindex") => root = Some(Root::Index),
                    (None, _) => return Ok(ParsedSitemap::Unrecognized),
                    (Some(Root::UrlSet), b"url") | (Some(Root::Index), b"sitemap") => {
                        current = Some(PartialEntry::default());
                        field = None;
                    }
                    (Some(_), b"loc") => field = Some(Field::Loc),
                    (Some(Root::UrlSet), b"lastmod") => field = Some(Field::LastMod),
                    (Some(Root::UrlSet), b"priority") => field = Some(Field::Priority),
                    _ => field = None,
                }
            }
            Ok(Event::Empty(ref e)) if root.is_none() => {
                return Ok(match e.local_name().as_ref() {
                    b"urlset" => ParsedSitemap::UrlSet(Vec::new()),
                    b"sitemapindex" => ParsedSitemap::Index(Vec::new()),
                    _ => ParsedSitemap::Unrecognized,
                });
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = e.unescape().map_err(|err| err.to_string())?;
                    entry.field_mut(f).push_str(&text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.field_mut(f).push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => match (root, e.local_name().as_ref()) {
                (Some(Root::UrlSet), b"url") => {
                    if let Some(entry) = current.take().and_then(PartialEntry::into_entry) {
                        entries.push(entry);
                    }
                }
                (Some(Root::Index), b"sitemap") => {
                    if let Some(entry) = current.take().and_then(PartialEntry::into_entry) {
                        children.push(entry.loc);
                    }
                }
                _ => field = None,
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
        buf.clear();
    }

    Ok(match root {
        Some(Root::UrlSet) => ParsedSitemap::UrlSet(entries),
        Some(Root::Index) => ParsedSitemap::Index(children),
        None => ParsedSitemap::Unrecognized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url>
    <loc>https://example.com/</loc>
    <lastmod>2024-05-01</lastmod>
    <priority>1.0</priority>
  </url>
  <url>
    <loc> https://example.com/about?a=1&amp;b=2 </loc>
  </url>
  <url>
    <loc>https://example.com/blog</loc>
    <priority>high</priority>
  </url>
</urlset>"#;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/pages.xml</loc><lastmod>2024-01-01</lastmod></sitemap>
  <sitemap><loc>https://example.com/posts.xml</loc></sitemap>
</sitemapindex>"#;

    #[test]
    fn test_parse_urlset() {
        let parsed = parse_sitemap(Some("application/xml"), URLSET).unwrap();
        let ParsedSitemap::UrlSet(entries) = parsed else {
            panic!("expected urlset");
        };

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].loc, "https://example.com/");
        assert_eq!(entries[0].last_modified.as_deref(), Some("2024-05-01"));
        assert_eq!(entries[0].priority, Some(1.0));
        assert_eq!(entries[1].loc, "https://example.com/about?a=1&b=2");
        assert_eq!(entries[1].last_modified, None);
        assert_eq!(entries[1].priority, None);
        assert_eq!(entries[2].priority, None);
    }

    #[test]
    fn test_parse_index_in_document_order() {
        let parsed = parse_sitemap(Some("text/xml"), INDEX).unwrap();
        assert_eq!(
            parsed,
            ParsedSitemap::Index(vec![
                "https://example.com/pages.xml".to_string(),
                "https://example.com/posts.xml".to_string(),
            ])
        );
    }

    #[test]
    fn test_sniff_xml_with_wrong_content_type() {
        let parsed = parse_sitemap(Some("text/plain"), URLSET).unwrap();
        assert!(matches!(parsed, ParsedSitemap::UrlSet(ref e) if e.len() == 3));

        let parsed = parse_sitemap(None, INDEX).unwrap();
        assert!(matches!(parsed, ParsedSitemap::Index(ref c) if c.len() == 2));
    }

    #[test]
    fn test_sniff_urlset_without_declaration() {
        let body = "\u{feff}  <urlset><url><loc>https://example.com/x</loc></url></urlset>";
        assert_eq!(detect_format(Some("application/octet-stream"), body), SitemapFormat::Xml);
        assert!(!parse_sitemap(None, body).unwrap().is_empty());
    }

    #[test]
    fn test_prefixed_namespace() {
        let body = r#"<ns:urlset xmlns:ns="http://www.sitemaps.org/schemas/sitemap/0.9"><ns:url><ns:loc>https://example.com/p</ns:loc></ns:url></ns:urlset>"#;
        let parsed = parse_sitemap(Some("application/xml"), body).unwrap();
        assert!(matches!(parsed, ParsedSitemap::UrlSet(ref e) if e[0].loc == "https://example.com/p"));
    }

    #[test]
    fn test_cdata_loc() {
        let body = "<urlset><url><loc><![CDATA[https://example.com/c]]></loc></url></urlset>";
        let parsed = parse_xml(body).unwrap();
        assert!(matches!(parsed, ParsedSitemap::UrlSet(ref e) if e[0].loc == "https://example.com/c"));
    }

    #[test]
    fn test_unknown_root() {
        let body = r#"<?xml version="1.0"?><rss><channel></channel></rss>"#;
        assert_eq!(parse_xml(body).unwrap(), ParsedSitemap::Unrecognized);
    }

    #[test]
    fn test_empty_urlset() {
        let parsed = parse_xml("<urlset/>").unwrap();
        assert_eq!(parsed, ParsedSitemap::UrlSet(Vec::new()));
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        let body = "<urlset><url><loc>https://example.com/</url></urlset>";
        assert!(parse_xml(body).is_err());
    }

    #[test]
    fn test_plain_text() {
        let body = "https://example.com/a\n\n   https://example.com/b  \r\nnot a url\n";
        let parsed = parse_sitemap(Some("text/plain; charset=utf-8"), body).unwrap();
        let ParsedSitemap::UrlSet(entries) = parsed else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].loc, "https://example.com/b");
        assert_eq!(entries[1].last_modified, None);
    }

    #[test]
    fn test_decode_gzip_body() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(URLSET.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(is_gzip(&compressed));
        let (body, inflated) = decode_body(&compressed).unwrap();
        assert!(inflated);
        assert!(matches!(parse_sitemap(None, &body).unwrap(), ParsedSitemap::UrlSet(ref e) if e.len() == 3));

        let (plain, inflated) = decode_body(INDEX.as_bytes()).unwrap();
        assert!(!inflated);
        assert_eq!(plain, INDEX);
    }

    #[test]
    fn test_corrupt_gzip_body() {
        // Valid gzip header followed by a deflate block of reserved type
        let corrupt = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(decode_body(&corrupt).is_err());
    }

    #[test]
    fn test_html_is_unsupported() {
        let body = "<html><body>https://example.com/</body></html>";
        assert_eq!(
            parse_sitemap(Some("text/html"), body).unwrap(),
            ParsedSitemap::Unrecognized
        );
    }
}
