// seloger/extract.rs
//
// Field chains for SeLoger ad pages. The site reshuffles its DOM often but
// keeps meta tags and the embedded fetcher state stable, so every field lists
// its most stable source first.

use crate::domain::listing::RawAdRecord;
use crate::scraper::images::ImagePolicy;
use crate::scraper::normalize::{non_empty, price_from_text, price_to_digits};
use crate::scraper::page::AdPage;
use crate::scraper::strategy::{find_in_json, first_match, Strategy};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

pub const GALLERY: ImagePolicy = ImagePolicy {
    host_suffix: "seloger.com",
    extensions: &[".jpg", ".jpeg"],
    marker_tokens: &["logo", "agence", "brand", "icon", "marker", "avatar"],
};

const ID_PREFIX: &str = "seloger_";
const DESCRIPTION_MIN_CHARS: usize = 50;
const DESCRIPTION_MAX_HOPS: usize = 8;

// Patterns are literals built once on first use; tests reach every one of them.
macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pattern).expect(stringify!($name)))
        }
    };
}

static_regex!(detail_id_re, r"/(\d+)/detail\.htm");
static_regex!(postal_in_parens_re, r"\((\d{5})\)");
static_regex!(legacy_city_re, r#""av_city"\s*:\s*"([^"]+)""#);
static_regex!(
    fetcher_payload_re,
    r#"(?s)__UFRN_FETCHER__"\]=JSON\.parse\("(?P<payload>.+?)"\);"#
);
static_regex!(
    body_shape_re,
    r#"(?s)"body"\s*:\s*\{[^{}]*"headline"\s*:\s*"(?P<head>.*?)"[^{}]*"texts"\s*:\s*\[\s*\{\s*"text"\s*:\s*"(?P<txt>.*?)"\s*\}\s*\]"#
);

/// Parses one ad page. Never fails: fields that no strategy can read stay empty.
pub fn parse_ad(url: &str, html: impl Into<String>) -> RawAdRecord {
    let page = AdPage::parse(url, html);

    let canonical_url = page.canonical_href().unwrap_or_else(|| page.url.clone());

    let external_id = first_match(
        "id",
        &page,
        &[
            Strategy::new("canonical_link", id_from_canonical),
            Strategy::new("meta_idtiers", |p: &AdPage| p.meta_name("ad:idtiers")),
        ],
    )
    .map(with_id_prefix);

    let title = first_match(
        "title",
        &page,
        &[
            Strategy::new("og_title", |p: &AdPage| p.meta_property("og:title")),
            Strategy::new("title_tag", AdPage::title_tag),
        ],
    );

    let price_digits = first_match(
        "price",
        &page,
        &[
            Strategy::new("meta_prix", |p: &AdPage| {
                p.meta_name("ad:prix").as_deref().and_then(price_to_digits)
            }),
            Strategy::new("text_scan", |p: &AdPage| price_from_text(&p.raw)),
        ],
    );

    let city = first_match(
        "city",
        &page,
        &[
            Strategy::new("legacy_tracking", city_from_legacy_tracking),
            Strategy::new("title_postal_code", |_: &AdPage| {
                city_from_title(title.as_deref()?)
            }),
        ],
    );

    let description = first_match(
        "description",
        &page,
        &[
            Strategy::new("dom_heading", description_from_dom),
            Strategy::new("embedded_json", description_from_embedded_json),
            Strategy::new("og_description", |p: &AdPage| {
                p.meta_property("og:description")
            }),
        ],
    );

    RawAdRecord {
        external_id,
        canonical_url,
        title,
        city,
        postal_code: page.meta_name("ad:cp"),
        price_digits,
        surface_area_text: page.meta_name("ad:surface"),
        description,
        image_urls: GALLERY.gallery_urls(&page.document, &page.raw),
    }
}

fn with_id_prefix(raw: String) -> String {
    if raw.starts_with(ID_PREFIX) {
        raw
    } else {
        format!("{ID_PREFIX}{raw}")
    }
}

pub fn id_from_canonical(page: &AdPage) -> Option<String> {
    let canonical = page.canonical_href().unwrap_or_else(|| page.url.clone());
    let caps = detail_id_re().captures(&canonical)?;
    Some(caps.get(1)?.as_str().to_string())
}

pub fn city_from_legacy_tracking(page: &AdPage) -> Option<String> {
    let caps = legacy_city_re().captures(&page.raw)?;
    non_empty(caps.get(1)?.as_str())
}

/// `"Immeuble 12 pièces Nice (06000)"` gives `"Nice"`: the last word before the
/// parenthesised postal code, after the last comma.
pub fn city_from_title(title: &str) -> Option<String> {
    let found = postal_in_parens_re().find(title)?;
    let prefix = title[..found.start()].trim();
    let prefix = prefix.rsplit(',').next().unwrap_or(prefix);
    prefix.split_whitespace().last().map(str::to_string)
}

pub fn description_from_dom(page: &AdPage) -> Option<String> {
    let heading = description_heading(&page.document)?;

    let headline: String = heading.text().map(str::trim).collect();
    if headline.is_empty() {
        return None;
    }

    let body = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take(DESCRIPTION_MAX_HOPS)
        .map(block_text)
        .find(|text| text.chars().count() > DESCRIPTION_MIN_CHARS)?;

    non_empty(&format!("{headline}\n{body}"))
}

fn description_heading(document: &Html) -> Option<ElementRef<'_>> {
    let by_id = Selector::parse("h2#description").ok()?;
    if let Some(heading) = document.select(&by_id).next() {
        return Some(heading);
    }

    let with_testid = Selector::parse("[data-testid]").ok()?;
    document.select(&with_testid).find(|el| {
        el.value()
            .attr("data-testid")
            .is_some_and(|id| id.to_ascii_lowercase().contains("cdp-main-description-title"))
    })
}

fn block_text(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn description_from_embedded_json(page: &AdPage) -> Option<String> {
    let (headline, text) =
        body_from_fetcher_payload(&page.raw).or_else(|| body_from_raw_scan(&page.raw))?;

    let text = unescape_text(&text);
    let headline = headline
        .filter(|h| !h.is_empty())
        .map(|h| decode_json_string(&h).unwrap_or(h));

    match headline {
        Some(headline) => non_empty(&format!("{headline}\n{text}")),
        None => non_empty(&text),
    }
}

/// `(headline, texts[0].text)` from the `JSON.parse("...")` fetcher payload.
fn body_from_fetcher_payload(raw: &str) -> Option<(Option<String>, String)> {
    let payload = fetcher_payload_re().captures(raw)?.name("payload")?.as_str();
    let state = decode_payload(payload)?;

    find_in_json(&state, |node| {
        let body = node.get("body")?.as_object()?;
        let text = body.get("texts")?.as_array()?.first()?.get("text")?.as_str()?;
        let headline = body.get("headline").and_then(Value::as_str).map(str::to_string);
        Some((headline, text.to_string()))
    })
}

/// Same shape, but matched on the raw markup when the payload won't decode.
fn body_from_raw_scan(raw: &str) -> Option<(Option<String>, String)> {
    let caps = body_shape_re().captures(raw)?;
    let headline = caps.name("head").map(|m| m.as_str().to_string());
    let text = caps.name("txt")?.as_str().to_string();
    Some((headline, text))
}

/// The payload is usually a JSON document escaped into a JS string literal.
/// Try it as-is first, then unescape the literal and parse what's inside.
fn decode_payload(payload: &str) -> Option<Value> {
    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) => value,
        Err(_) => {
            let inner = decode_json_string(payload)?;
            serde_json::from_str(&inner).ok()?
        }
    };

    match value {
        Value::String(inner) => serde_json::from_str(&inner).ok(),
        other => Some(other),
    }
}

fn decode_json_string(escaped: &str) -> Option<String> {
    serde_json::from_str::<String>(&format!("\"{escaped}\"")).ok()
}

/// Strict string decode, else only the common whitespace escapes. Keep both
/// tiers: some pages only survive the lenient one.
fn unescape_text(text: &str) -> String {
    decode_json_string(text).unwrap_or_else(|| {
        text.replace("\\n", "\n")
            .replace("\\r", "")
            .replace("\\t", "\t")
    })
}
