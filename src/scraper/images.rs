// images.rs
use crate::scraper::normalize::{normalize_url, unique};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// Which images on a listing page count as gallery photos for one source.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    pub host_suffix: &'static str,
    pub extensions: &'static [&'static str],
    pub marker_tokens: &'static [&'static str],
}

impl ImagePolicy {
    /// Two stages: reject anything off-domain, non-photographic or branded,
    /// then require proof that the URL is a served photo variant (sized or sealed).
    pub fn is_gallery_photo(&self, raw: &str) -> bool {
        let Ok(parsed) = Url::parse(raw) else {
            return false;
        };

        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        if !host.ends_with(self.host_suffix) {
            return false;
        }

        let path = parsed.path().to_ascii_lowercase();
        if !self.extensions.iter().any(|ext| path.ends_with(ext)) {
            return false;
        }
        if self.marker_tokens.iter().any(|token| path.contains(token)) {
            return false;
        }

        let mut has_w = false;
        let mut has_h = false;
        let mut has_seal = false;
        for (key, value) in parsed.query_pairs() {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "w" => has_w = true,
                "h" => has_h = true,
                "ci_seal" => has_seal = true,
                _ => {}
            }
        }

        (has_w && has_h) || has_seal
    }

    /// Collects `<source srcset>`, `<img src>` and raw-text photo URLs, then keeps
    /// the ones this policy accepts. First-seen order.
    pub fn gallery_urls(&self, document: &Html, raw_html: &str) -> Vec<String> {
        let candidates = srcset_candidates(document)
            .chain(img_candidates(document))
            .chain(raw_candidates(raw_html))
            .map(|u| normalize_url(&u));

        unique(candidates)
            .into_iter()
            .filter(|u| self.is_gallery_photo(u))
            .collect()
    }
}

fn photo_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)https?://[^\s"']+?\.(?:jpg|png|jpeg)(?:\?[^\s"']*)?"#)
            .expect("static photo url pattern")
    })
}

fn source_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("source[srcset]").expect("static selector"))
}

fn img_selector() -> &'static Selector {
    static SEL: OnceLock<Selector> = OnceLock::new();
    SEL.get_or_init(|| Selector::parse("img[src]").expect("static selector"))
}

fn srcset_candidates(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(source_selector())
        .filter_map(|el| el.value().attr("srcset"))
        .flat_map(|srcset| srcset.split(','))
        .filter_map(|part| part.split_whitespace().next())
        .map(str::to_string)
}

fn img_candidates(document: &Html) -> impl Iterator<Item = String> + '_ {
    document
        .select(img_selector())
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
}

fn raw_candidates(raw_html: &str) -> impl Iterator<Item = String> + '_ {
    photo_url_re()
        .find_iter(raw_html)
        .map(|m| m.as_str().to_string())
}
