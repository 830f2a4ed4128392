//! Sitemap XML parsing
//!
//! Only single-level sitemaps are accepted: `<urlset>` documents whose
//! `<url><loc>` entries list page URLs. Sitemap index files are rejected.

use crate::SitemapError;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Extracts page URLs from sitemap XML
///
/// URLs are returned in document order with duplicates kept. Surrounding
/// whitespace is trimmed and empty `<loc>` entries are dropped.
///
/// # Arguments
///
/// * `xml` - Raw sitemap document
///
/// # Returns
///
/// * `Ok(Vec<String>)` - At least one URL
/// * `Err(SitemapError)` - Empty input, malformed XML, a sitemap index, or no URLs
///
/// # Example
///
/// ```
/// use affiliate_scout::sitemap::parse_sitemap;
///
/// let xml = r#"<urlset><url><loc>https://example.com/a</loc></url></urlset>"#;
/// assert_eq!(parse_sitemap(xml).unwrap(), vec!["https://example.com/a"]);
/// ```
pub fn parse_sitemap(xml: &str) -> Result<Vec<String>, SitemapError> {
    if xml.trim().is_empty() {
        return Err(SitemapError::EmptyInput);
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // Local names of the currently open elements
    let mut open: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut loc = String::new();
    let mut urls = Vec::new();

    loop {
        let event = reader.read_event().map_err(|e| {
            SitemapError::Malformed(format!(
                "{} (at byte {})",
                e,
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(ref e) => {
                let name = e.local_name().as_ref().to_vec();
                if !seen_root {
                    if name == b"sitemapindex" {
                        return Err(SitemapError::SitemapIndex);
                    }
                    seen_root = true;
                }
                if name == b"loc" {
                    loc.clear();
                }
                open.push(name);
            }
            Event::Empty(ref e) => {
                if !seen_root && e.local_name().as_ref() == b"sitemapindex" {
                    return Err(SitemapError::SitemapIndex);
                }
                seen_root = true;
            }
            Event::Text(ref e) => {
                if in_url_loc(&open) {
                    let text = e
                        .unescape()
                        .map_err(|err| SitemapError::Malformed(err.to_string()))?;
                    loc.push_str(&text);
                }
            }
            Event::CData(ref e) => {
                if in_url_loc(&open) {
                    loc.push_str(&String::from_utf8_lossy(e));
                }
            }
            Event::End(_) => {
                if in_url_loc(&open) {
                    let url = loc.trim();
                    if !url.is_empty() {
                        urls.push(url.to_string());
                    }
                    loc.clear();
                }
                open.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(SitemapError::Malformed(format!(
            "document ended inside an unclosed <{}> element",
            String::from_utf8_lossy(unclosed)
        )));
    }
    if !seen_root {
        return Err(SitemapError::Malformed(
            "no root element found".to_string(),
        ));
    }
    if urls.is_empty() {
        return Err(SitemapError::NoUrls);
    }

    tracing::debug!("Parsed {} URLs from sitemap", urls.len());
    Ok(urls)
}

/// Returns true when the innermost open elements are `<url><loc>`
fn in_url_loc(open: &[Vec<u8>]) -> bool {
    matches!(open, [.., parent, child] if parent.as_slice() == b"url" && child.as_slice() == b"loc")
}
