// page.rs
use crate::scraper::normalize::non_empty;
use scraper::{Html, Selector};

/// A fetched listing page: the raw markup (for regex strategies) next to the
/// parsed document (for DOM strategies).
pub struct AdPage {
    pub url: String,
    pub raw: String,
    pub document: Html,
}

impl AdPage {
    pub fn parse(url: impl Into<String>, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let document = Html::parse_document(&raw);
        Self {
            url: url.into(),
            raw,
            document,
        }
    }

    /// `<meta name="...">` content, trimmed.
    pub fn meta_name(&self, name: &str) -> Option<String> {
        self.first_attr(&format!(r#"meta[name="{name}"]"#), "content")
    }

    /// `<meta property="...">` content, trimmed.
    pub fn meta_property(&self, property: &str) -> Option<String> {
        self.first_attr(&format!(r#"meta[property="{property}"]"#), "content")
    }

    pub fn canonical_href(&self) -> Option<String> {
        self.first_attr(r#"link[rel="canonical"]"#, "href")
    }

    pub fn title_tag(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let el = self.document.select(&selector).next()?;
        non_empty(&el.text().collect::<String>())
    }

    /// First non-empty value of `attr` across elements matching `css`.
    /// A selector that fails to parse yields nothing.
    pub fn first_attr(&self, css: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        self.document
            .select(&selector)
            .filter_map(|el| el.value().attr(attr))
            .find_map(non_empty)
    }
}
