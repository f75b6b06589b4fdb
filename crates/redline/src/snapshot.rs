//! Offline page snapshots.
//!
//! A [`SnapshotSite`] is a frozen, in-memory rendition of a handful of pages:
//! title, URL and the elements fixtures look for, keyed by the selectors
//! that match them. It drives the harness without a browser so the fixture
//! contract (every case fails) can be checked offline and deterministically.

use crate::driver::{PageDriver, Session};
use crate::locator::{ElementProbe, Selector};
use crate::result::{RedlineError, RedlineResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One element of a snapshot page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotElement {
    /// CSS selectors this element answers to
    pub selectors: Vec<String>,
    /// `textContent`
    #[serde(default)]
    pub text: String,
    /// Rendered with a non-empty box
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Not disabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Navigation target when clicked
    #[serde(default)]
    pub href: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl SnapshotElement {
    /// Create a visible, enabled element
    #[must_use]
    pub fn new(selectors: &[&str], text: impl Into<String>) -> Self {
        Self {
            selectors: selectors.iter().map(|s| (*s).to_string()).collect(),
            text: text.into(),
            visible: true,
            enabled: true,
            href: None,
        }
    }

    /// Make the element a link
    #[must_use]
    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Text selectors match on contained text, so an element's ancestors
    /// match along with it, as in the CDP driver's query
    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Css(css) => self.selectors.iter().any(|s| s == css),
            Selector::Text(text) => self.text.contains(text.as_str()),
        }
    }

    fn probe(&self) -> ElementProbe {
        ElementProbe {
            text: self.text.clone(),
            visible: self.visible,
            enabled: self.enabled,
        }
    }
}

/// A frozen page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    /// Final URL after redirects
    pub url: String,
    /// Document title
    pub title: String,
    /// Elements in document order
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
}

impl PageSnapshot {
    fn blank() -> Self {
        Self {
            url: "about:blank".to_string(),
            title: String::new(),
            elements: Vec::new(),
        }
    }
}

/// A set of frozen pages plus redirects
#[derive(Debug, Clone, Default)]
pub struct SnapshotSite {
    pages: HashMap<String, PageSnapshot>,
    redirects: HashMap<String, String>,
}

/// On-disk shape of a snapshot site
#[derive(Debug, Deserialize)]
struct SiteFile {
    pages: Vec<PageSnapshot>,
    #[serde(default)]
    redirects: HashMap<String, String>,
}

impl SnapshotSite {
    /// Create an empty site (every navigation fails)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page, keyed by its normalized URL
    #[must_use]
    pub fn with_page(mut self, mut page: PageSnapshot) -> Self {
        page.url = normalize_url(&page.url);
        self.pages.insert(page.url.clone(), page);
        self
    }

    /// Add a redirect
    #[must_use]
    pub fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(normalize_url(from), normalize_url(to));
        self
    }

    /// Parse a site from YAML (`pages:` list plus `redirects:` map)
    pub fn from_yaml(yaml: &str, source_name: &str) -> RedlineResult<Self> {
        let file: SiteFile =
            serde_yaml_ng::from_str(yaml).map_err(|e| RedlineError::FixtureParse {
                source_name: source_name.to_string(),
                message: e.to_string(),
            })?;
        let site = file
            .pages
            .into_iter()
            .fold(Self::new(), Self::with_page);
        Ok(file
            .redirects
            .iter()
            .fold(site, |site, (from, to)| site.with_redirect(from, to)))
    }

    /// https://example.com and the IANA page its only link leads to
    #[must_use]
    pub fn example_domain() -> Self {
        let example = PageSnapshot {
            url: "https://example.com/".to_string(),
            title: "Example Domain".to_string(),
            elements: vec![
                SnapshotElement::new(&["div", "body > div"], EXAMPLE_DIV_TEXT),
                SnapshotElement::new(&["h1", "div > h1"], "Example Domain"),
                SnapshotElement::new(&["p", "div > p"], EXAMPLE_FIRST_PARAGRAPH),
                SnapshotElement::new(&["p", "div > p"], "More information..."),
                SnapshotElement::new(&["a", "p > a", "div a"], "More information...")
                    .with_href("https://www.iana.org/domains/example"),
            ],
        };
        let iana = PageSnapshot {
            url: "https://www.iana.org/help/example-domains".to_string(),
            title: "Example Domains".to_string(),
            elements: vec![SnapshotElement::new(&["h1"], "Example Domains")],
        };
        Self::new()
            .with_page(example)
            .with_page(iana)
            .with_redirect(
                "https://www.iana.org/domains/example",
                "https://www.iana.org/help/example-domains",
            )
    }

    fn resolve(&self, url: &str) -> Option<&PageSnapshot> {
        let mut current = normalize_url(url);
        // Bounded so a redirect cycle cannot spin forever
        for _ in 0..=self.redirects.len() {
            match self.redirects.get(&current) {
                Some(next) => current.clone_from(next),
                None => break,
            }
        }
        self.pages.get(&current)
    }
}

const EXAMPLE_FIRST_PARAGRAPH: &str = "This domain is for use in illustrative examples in \
     documents. You may use this domain in literature without prior coordination or asking \
     for permission.";

const EXAMPLE_DIV_TEXT: &str = "Example Domain This domain is for use in illustrative \
     examples in documents. You may use this domain in literature without prior coordination \
     or asking for permission. More information...";

/// Append the root path browsers add to bare origins
#[must_use]
pub fn normalize_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) if !rest.contains('/') => {
            let (host, tail) = match rest.find(['?', '#']) {
                Some(idx) => rest.split_at(idx),
                None => (rest, ""),
            };
            format!("{scheme}://{host}/{tail}")
        }
        _ => url.to_string(),
    }
}

#[async_trait]
impl Session for Arc<SnapshotSite> {
    async fn new_page(&self) -> RedlineResult<Box<dyn PageDriver>> {
        Ok(Box::new(SnapshotPage {
            site: Arc::clone(self),
            current: PageSnapshot::blank(),
        }))
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

/// A page navigating inside a [`SnapshotSite`]
#[derive(Debug)]
pub struct SnapshotPage {
    site: Arc<SnapshotSite>,
    current: PageSnapshot,
}

#[async_trait]
impl PageDriver for SnapshotPage {
    async fn goto(&mut self, url: &str) -> RedlineResult<()> {
        let page = self
            .site
            .resolve(url)
            .ok_or_else(|| RedlineError::NavigationError {
                url: url.to_string(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })?;
        self.current = page.clone();
        Ok(())
    }

    async fn click(&mut self, selector: &Selector) -> RedlineResult<()> {
        let target = self
            .current
            .elements
            .iter()
            .find(|el| el.matches(selector))
            .ok_or_else(|| RedlineError::InputError {
                message: format!("no element matches '{selector}'"),
            })?
            .href
            .clone();
        match target {
            Some(href) => self.goto(&href).await,
            None => Ok(()),
        }
    }

    async fn title(&self) -> RedlineResult<String> {
        Ok(self.current.title.clone())
    }

    async fn url(&self) -> RedlineResult<String> {
        Ok(self.current.url.clone())
    }

    async fn count(&self, selector: &Selector) -> RedlineResult<usize> {
        Ok(self
            .current
            .elements
            .iter()
            .filter(|el| el.matches(selector))
            .count())
    }

    async fn probe(&self, selector: &Selector) -> RedlineResult<Option<ElementProbe>> {
        Ok(self
            .current
            .elements
            .iter()
            .find(|el| el.matches(selector))
            .map(SnapshotElement::probe))
    }

    async fn screenshot(&self) -> RedlineResult<Vec<u8>> {
        Err(RedlineError::ScreenshotError {
            message: "snapshot pages have no pixels".to_string(),
        })
    }

    async fn close(self: Box<Self>) -> RedlineResult<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn site() -> Arc<SnapshotSite> {
        Arc::new(SnapshotSite::example_domain())
    }

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_bare_origin_gets_slash() {
            assert_eq!(normalize_url("https://example.com"), "https://example.com/");
            assert_eq!(
                normalize_url("https://example.com?q=1"),
                "https://example.com/?q=1"
            );
        }

        #[test]
        fn test_path_untouched() {
            assert_eq!(
                normalize_url("https://example.com/search?q=laptop"),
                "https://example.com/search?q=laptop"
            );
            assert_eq!(normalize_url("about:blank"), "about:blank");
        }
    }

    mod page_tests {
        use super::*;

        #[tokio::test]
        async fn test_blank_page_before_navigation() {
            let page = site().new_page().await.unwrap();
            assert_eq!(page.url().await.unwrap(), "about:blank");
            assert_eq!(page.title().await.unwrap(), "");
        }

        #[tokio::test]
        async fn test_example_domain_shape() {
            let mut page = site().new_page().await.unwrap();
            page.goto("https://example.com").await.unwrap();
            assert_eq!(page.title().await.unwrap(), "Example Domain");
            assert_eq!(page.url().await.unwrap(), "https://example.com/");
            assert_eq!(page.count(&Selector::css("p")).await.unwrap(), 2);
            assert_eq!(page.count(&Selector::css("footer a")).await.unwrap(), 0);

            let h1 = page.probe(&Selector::css("h1")).await.unwrap().unwrap();
            assert_eq!(h1.text, "Example Domain");
            assert!(page
                .probe(&Selector::css("button#login"))
                .await
                .unwrap()
                .is_none());
        }

        #[tokio::test]
        async fn test_click_follows_link_and_redirect() {
            let mut page = site().new_page().await.unwrap();
            page.goto("https://example.com").await.unwrap();
            page.click(&Selector::css("a")).await.unwrap();
            assert_eq!(
                page.url().await.unwrap(),
                "https://www.iana.org/help/example-domains"
            );
        }

        #[tokio::test]
        async fn test_text_selector() {
            let mut page = site().new_page().await.unwrap();
            page.goto("https://example.com").await.unwrap();
            // div, the second p and the a all contain the link text
            assert_eq!(page.count(&Selector::text("More information")).await.unwrap(), 3);
            let first = page
                .probe(&Selector::text("More information"))
                .await
                .unwrap()
                .unwrap();
            assert!(first.text.starts_with("Example Domain"));
        }

        #[tokio::test]
        async fn test_unknown_host_is_navigation_error() {
            let mut page = site().new_page().await.unwrap();
            let err = page.goto("https://nowhere.invalid").await.unwrap_err();
            assert!(matches!(err, RedlineError::NavigationError { .. }));
        }

        #[tokio::test]
        async fn test_click_missing_element_is_input_error() {
            let mut page = site().new_page().await.unwrap();
            page.goto("https://example.com").await.unwrap();
            let err = page.click(&Selector::css("#nope")).await.unwrap_err();
            assert!(matches!(err, RedlineError::InputError { .. }));
        }

        #[tokio::test]
        async fn test_site_from_yaml() {
            let yaml = r##"
pages:
  - url: https://shop.test
    title: Shop
    elements:
      - selectors: ["#checkout-proceed-button", "button"]
        text: Checkout
        enabled: false
redirects:
  https://shop.test/cart: https://shop.test
"##;
            let site = Arc::new(SnapshotSite::from_yaml(yaml, "shop.yaml").unwrap());
            let mut page = site.new_page().await.unwrap();
            page.goto("https://shop.test/cart").await.unwrap();
            assert_eq!(page.title().await.unwrap(), "Shop");
            let button = page
                .probe(&Selector::css("#checkout-proceed-button"))
                .await
                .unwrap()
                .unwrap();
            assert!(button.visible);
            assert!(!button.enabled);
        }

        #[test]
        fn test_bad_site_yaml() {
            let err = SnapshotSite::from_yaml("pages: 3", "bad.yaml").unwrap_err();
            assert!(err.to_string().contains("bad.yaml"));
        }

        #[test]
        fn test_redirect_cycle_terminates() {
            let site = SnapshotSite::new()
                .with_redirect("https://a.test/", "https://b.test/")
                .with_redirect("https://b.test/", "https://a.test/");
            assert!(site.resolve("https://a.test").is_none());
        }
    }
}
