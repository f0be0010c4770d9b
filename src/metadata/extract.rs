//! Pure HTML metadata extraction.
//!
//! Every field is extracted independently from a priority-ordered list of
//! sources, so one malformed tag never poisons its neighbors. Sources are
//! described as data ([`Source`]) and matched with regular expressions
//! tolerant of attribute order.

use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::config::METADATA_FIELD_TOTAL;
use crate::models::MetadataResult;

/// Where a metadata field's value may come from, in priority order.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// `<meta property="..." content="...">`
    MetaProperty(&'static str),
    /// `<meta name="..." content="...">`
    MetaName(&'static str),
    /// `<title>...</title>`
    TitleTag,
    /// `lang` attribute on the `<html>` tag.
    HtmlLang,
    /// `charset` attribute on a `<meta>` tag.
    Charset,
    /// `<link rel="..." href="...">`; the rel value is a regex fragment.
    LinkRel(&'static str),
    /// `<link type="..." href="...">`; the type value is a regex fragment.
    LinkType(&'static str),
}

fn capture(html: &str, pattern: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Matches a `<meta>` tag by its key attribute, tolerating either attribute
/// order.
fn meta_content(html: &str, key_attr: &str, key: &str) -> Option<String> {
    let key = regex::escape(key);
    capture(
        html,
        &format!(
            r#"(?i)<meta[^>]*\b{key_attr}=["']{key}["'][^>]*\bcontent=["']([^"']*)["']"#
        ),
    )
    .or_else(|| {
        capture(
            html,
            &format!(
                r#"(?i)<meta[^>]*\bcontent=["']([^"']*)["'][^>]*\b{key_attr}=["']{key}["']"#
            ),
        )
    })
}

fn link_href(html: &str, attr: &str, value_fragment: &str) -> Option<String> {
    capture(
        html,
        &format!(
            r#"(?i)<link[^>]*\b{attr}=["']{value_fragment}["'][^>]*\bhref=["']([^"']+)["']"#
        ),
    )
    .or_else(|| {
        capture(
            html,
            &format!(
                r#"(?i)<link[^>]*\bhref=["']([^"']+)["'][^>]*\b{attr}=["']{value_fragment}["']"#
            ),
        )
    })
}

fn from_source(html: &str, source: Source) -> Option<String> {
    match source {
        Source::MetaProperty(name) => meta_content(html, "property", name),
        Source::MetaName(name) => meta_content(html, "name", name),
        Source::TitleTag => capture(html, r"(?is)<title[^>]*>(.*?)</title>"),
        Source::HtmlLang => capture(html, r#"(?i)<html[^>]*\blang=["']([^"']+)["']"#),
        Source::Charset => capture(html, r#"(?i)<meta[^>]*\bcharset=["']?([a-zA-Z0-9_\-]+)"#),
        Source::LinkRel(fragment) => link_href(html, "rel", fragment),
        Source::LinkType(fragment) => link_href(html, "type", fragment),
    }
}

/// First source in the list that yields a value.
fn first_of(html: &str, sources: &[Source]) -> Option<String> {
    sources.iter().find_map(|s| from_source(html, *s))
}

/// All `article:tag` values, comma-joined.
fn all_tags(html: &str) -> Option<String> {
    let regex = Regex::new(
        r#"(?i)<meta[^>]*\bproperty=["']article:tag["'][^>]*\bcontent=["']([^"']+)["']"#,
    )
    .ok()?;
    let tags: Vec<String> = regex
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(", "))
    }
}

/// Resolves a possibly-relative href against `https://<domain>/`.
fn absolutize(domain: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = Url::parse(&format!("https://{domain}/")).ok()?;
    base.join(href).ok().map(|u| u.to_string())
}

/// Parses each JSON-LD script block independently; arrays are flattened and
/// unparseable blocks dropped.
fn json_ld_blocks(html: &str) -> Vec<Value> {
    let Ok(regex) =
        Regex::new(r#"(?is)<script[^>]*\btype=["']application/ld\+json["'][^>]*>(.*?)</script>"#)
    else {
        return Vec::new();
    };
    let mut blocks = Vec::new();
    for capture in regex.captures_iter(html) {
        let Some(raw) = capture.get(1) else { continue };
        match serde_json::from_str::<Value>(raw.as_str().trim()) {
            Ok(Value::Array(items)) => blocks.extend(items),
            Ok(value) => blocks.push(value),
            Err(_) => continue,
        }
    }
    blocks
}

fn block_string(block: &Value, key: &str) -> Option<String> {
    match block.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Array(items)) => items
            .iter()
            .find_map(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// Extracts page metadata from raw HTML.
///
/// Pure: no network, no clock beyond the record timestamp. Each field has
/// its own priority-ordered source list; absent fields stay `None`.
pub fn extract(html: &str, domain: &str) -> MetadataResult {
    let mut result = MetadataResult::new(domain);
    let get = |sources: &[Source]| first_of(html, sources);

    result.title = get(&[
        Source::MetaProperty("og:title"),
        Source::MetaName("twitter:title"),
        Source::TitleTag,
    ]);
    result.description = get(&[
        Source::MetaProperty("og:description"),
        Source::MetaName("twitter:description"),
        Source::MetaName("description"),
    ]);
    result.keywords = get(&[Source::MetaName("keywords")]);
    result.author = get(&[
        Source::MetaProperty("article:author"),
        Source::MetaName("author"),
    ]);
    result.lang = get(&[Source::HtmlLang, Source::MetaProperty("og:locale")]);
    result.publisher = get(&[Source::MetaProperty("og:site_name")]);
    result.content_type = get(&[Source::MetaProperty("og:type")]);
    result.image = get(&[
        Source::MetaProperty("og:image"),
        Source::MetaName("twitter:image"),
    ]);
    result.image_alt = get(&[
        Source::MetaProperty("og:image:alt"),
        Source::MetaName("twitter:image:alt"),
    ]);
    result.url = get(&[Source::MetaProperty("og:url"), Source::LinkRel("canonical")])
        .or_else(|| Some(format!("https://{domain}")));
    result.twitter_card = get(&[Source::MetaName("twitter:card")]);
    result.twitter_site = get(&[Source::MetaName("twitter:site")]);
    result.twitter_creator = get(&[Source::MetaName("twitter:creator")]);
    result.date = get(&[
        Source::MetaProperty("article:published_time"),
        Source::MetaName("date"),
    ]);
    result.modified_date = get(&[
        Source::MetaProperty("article:modified_time"),
        Source::MetaName("last-modified"),
    ]);
    result.category = get(&[Source::MetaProperty("article:section")]);
    result.tags = all_tags(html);
    result.favicon = get(&[Source::LinkRel("(?:shortcut )?icon")])
        .and_then(|href| absolutize(domain, &href));
    result.logo = get(&[Source::LinkRel("apple-touch-icon")])
        .and_then(|href| absolutize(domain, &href));
    result.robots = get(&[Source::MetaName("robots")]);
    result.viewport = get(&[Source::MetaName("viewport")]);
    result.theme_color = get(&[Source::MetaName("theme-color")]);
    result.charset = get(&[Source::Charset]);
    result.generator = get(&[Source::MetaName("generator")]);
    result.rss_feed = get(&[Source::LinkType(r"application/rss\+xml")])
        .and_then(|href| absolutize(domain, &href));
    result.atom_feed = get(&[Source::LinkType(r"application/atom\+xml")])
        .and_then(|href| absolutize(domain, &href));

    result.json_ld = json_ld_blocks(html);
    if let Some(first) = result.json_ld.first() {
        result.schema_type = block_string(first, "@type");
        if result.title.is_none() {
            result.title = block_string(first, "name");
        }
        if result.description.is_none() {
            result.description = block_string(first, "description");
        }
    }

    result.completeness_score = completeness(&result);
    result
}

/// Percentage of the fixed field checklist that was populated, rounded.
///
/// Bookkeeping fields (id, domain, timestamp, the raw JSON-LD array) are
/// excluded; the denominator is fixed so scores stay comparable across
/// pages.
fn completeness(result: &MetadataResult) -> u8 {
    let fields: [&Option<String>; 27] = [
        &result.title,
        &result.description,
        &result.keywords,
        &result.author,
        &result.lang,
        &result.publisher,
        &result.content_type,
        &result.image,
        &result.image_alt,
        &result.url,
        &result.twitter_card,
        &result.twitter_site,
        &result.twitter_creator,
        &result.date,
        &result.modified_date,
        &result.category,
        &result.tags,
        &result.favicon,
        &result.logo,
        &result.robots,
        &result.viewport,
        &result.theme_color,
        &result.charset,
        &result.generator,
        &result.rss_feed,
        &result.atom_feed,
        &result.schema_type,
    ];
    let filled = fields.iter().filter(|f| f.is_some()).count() as f64;
    (100.0 * filled / f64::from(METADATA_FIELD_TOTAL)).round() as u8
}
