//! Marketplace page extractor
//!
//! Classifies pages of the app marketplace and extracts one record per app
//! details page. Only pages that look like app listings, app details or
//! developer pages expand the crawl; everything else (music, movies, review
//! threads, sign-in pages) is ignored.

use crate::crawler::extractor::{PageExtractor, PageOutcome};
use crate::crawler::results::PendingRecord;
use crate::url::{absolute_url, query_param};
use crate::ExtractError;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::BTreeSet;
use url::Url;

/// Top-selling listings that are always worth expanding
const LISTING_IDS: &[&str] = &["apps_topselling_paid", "apps_topselling_free"];

/// Pre-parsed CSS selectors used on every page
struct Selectors {
    anchors: Selector,
    developer_banner: Selector,
    details_page: Selector,
    breadcrumbs: Selector,
    title: Selector,
    developer_link: Selector,
    overview_links: Selector,
    rating_count: Selector,
    rating_value: Selector,
    description: Selector,
    also_installed: Selector,
    also_viewed: Selector,
    price: Selector,
    metadata_links: Selector,
    downloads: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            anchors: parse_selector("a[href]")?,
            developer_banner: parse_selector("h1.page-banner-text")?,
            details_page: parse_selector("div.apps.details-page")?,
            breadcrumbs: parse_selector(".page-content .breadcrumbs a")?,
            title: parse_selector("h1.doc-banner-title")?,
            developer_link: parse_selector("a.doc-header-link")?,
            overview_links: parse_selector(".doc-overview a")?,
            rating_count: parse_selector("[itemprop=ratingCount]")?,
            rating_value: parse_selector("[itemprop=ratingValue]")?,
            description: parse_selector("#doc-original-text")?,
            also_installed: parse_selector(
                "[data-analyticsid=users-also-installed] a.common-snippet-title",
            )?,
            also_viewed: parse_selector("[data-analyticsid=related] a.common-snippet-title")?,
            price: parse_selector(".buy-button-price")?,
            metadata_links: parse_selector(".doc-metadata-list dd a")?,
            downloads: parse_selector("[itemprop=numDownloads]")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {:?}", css, e)))
}

/// [`PageExtractor`] for the app marketplace
pub struct MarketExtractor {
    base_url: Url,
    selectors: Selectors,
    follow_link: Regex,
    price: Regex,
    install_range: Regex,
}

impl MarketExtractor {
    /// Creates an extractor resolving relative links against `base_url`
    pub fn new(base_url: &str) -> Result<Self, ExtractError> {
        let base_url = Url::parse(base_url).map_err(|e| ExtractError::InvalidField {
            url: base_url.to_string(),
            field: "base_url".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            base_url,
            selectors: Selectors::new()?,
            follow_link: compile(r"/(details|developer)\?")?,
            price: compile(r".*[\d.]+")?,
            install_range: compile(r"([\d,]+)\s*-\s*([\d,]+)")?,
        })
    }

    /// Decides whether a page belongs to the app part of the marketplace
    pub fn is_page_of_interest(&self, url: &str, document: &Html) -> bool {
        if url == self.base_url.as_str() {
            return true;
        }

        if self.is_listing(url) {
            return true;
        }

        if !url.contains("details") && !url.contains("developer") {
            return false;
        }

        if url.contains("reviewId") {
            return false;
        }

        if query_param(url, "id").is_none() && query_param(url, "pub").is_none() {
            return false;
        }

        if url.contains("developer") {
            return joined_text(document, &self.selectors.developer_banner)
                .to_lowercase()
                .starts_with("apps by");
        }

        self.is_app_details(document)
    }

    fn is_listing(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        parsed.path() == "/details"
            && query_param(url, "id")
                .map_or(false, |id| LISTING_IDS.iter().any(|l| id.starts_with(l)))
    }

    fn is_app_details(&self, document: &Html) -> bool {
        document.select(&self.selectors.details_page).next().is_some()
            && joined_text(document, &self.selectors.breadcrumbs).contains("Apps")
    }

    /// Collects app and developer links worth following
    pub fn extract_links(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selectors.anchors)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| {
                self.follow_link.is_match(href)
                    && !href.contains("reviewId")
                    && !href.contains("accounts/ServiceLogin")
            })
            .map(|href| absolute_url(Some(href), &self.base_url))
            .filter(|link| !link.is_empty())
            .collect()
    }

    /// Extracts the app record from a details page
    ///
    /// Returns `Ok(None)` when the page is not an app details page.
    pub fn extract_record(
        &self,
        url: &str,
        document: &Html,
    ) -> Result<Option<PendingRecord>, ExtractError> {
        let Some(app_id) = query_param(url, "id") else {
            return Ok(None);
        };

        if !self.is_app_details(document) {
            return Ok(None);
        }

        let sel = &self.selectors;

        let name = joined_text(document, &sel.title);
        if name.is_empty() {
            return Err(ExtractError::MissingElement {
                url: url.to_string(),
                selector: "h1.doc-banner-title".to_string(),
            });
        }

        let developer = document.select(&sel.developer_link).next();

        let mut record = PendingRecord::new(app_id.as_str())
            .with_field("name", name)
            .with_field("app_link", self.app_link(&app_id))
            .with_field("dev_name", developer.map(element_text).unwrap_or_default())
            .with_field(
                "dev_link",
                absolute_url(developer.and_then(|a| a.value().attr("href")), &self.base_url),
            )
            .with_field("dev_web_links", self.developer_websites(url, document)?)
            .with_field("dev_emails", self.developer_emails(document))
            .with_field("rating_count", self.rating_count(url, document)?)
            .with_field(
                "rating_value",
                document
                    .select(&sel.rating_value)
                    .next()
                    .and_then(|e| e.value().attr("content"))
                    .map_or(Value::Null, Value::from),
            )
            .with_field(
                "description_html",
                document
                    .select(&sel.description)
                    .next()
                    .map_or(Value::Null, |e| Value::from(e.inner_html())),
            )
            .with_field(
                "users_also_installed",
                self.related_apps(url, document, &sel.also_installed)?,
            )
            .with_field(
                "users_also_viewed",
                self.related_apps(url, document, &sel.also_viewed)?,
            );

        let price_text = joined_text(document, &sel.price);
        match self.price.find(&price_text) {
            Some(price) => {
                record.insert("is_free", false);
                record.insert("price", price.as_str());
            }
            None => {
                record.insert("is_free", true);
                record.insert("price", 0);
            }
        }

        let category = document
            .select(&sel.metadata_links)
            .find(|a| a.value().attr("href").map_or(false, |h| h.contains("category")));
        if let Some(category) = category {
            record.insert("category", element_text(category));
        }

        let downloads = joined_text(document, &sel.downloads);
        if let Some(range) = self.install_range.captures(&downloads) {
            record.insert("installs_min", parse_count(url, "installs_min", &range[1])?);
            record.insert("installs_max", parse_count(url, "installs_max", &range[2])?);
        }

        Ok(Some(record))
    }

    fn app_link(&self, app_id: &str) -> String {
        let mut link = self.base_url.clone();
        link.set_path("/details");
        link.query_pairs_mut().clear().append_pair("id", app_id);
        link.to_string()
    }

    fn developer_websites(&self, url: &str, document: &Html) -> Result<Vec<String>, ExtractError> {
        let mut sites = BTreeSet::new();
        for a in document.select(&self.selectors.overview_links) {
            if !element_text(a).contains("Visit Developer's Website") {
                continue;
            }
            let href = a.value().attr("href").unwrap_or_default();
            let target = self
                .param_of(href, "q")
                .ok_or_else(|| ExtractError::MissingParam {
                    url: url.to_string(),
                    param: "q".to_string(),
                })?;
            sites.insert(target);
        }
        Ok(sites.into_iter().collect())
    }

    fn developer_emails(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.selectors.overview_links)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| href.strip_prefix("mailto:"))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn rating_count(&self, url: &str, document: &Html) -> Result<u64, ExtractError> {
        let digits: String = joined_text(document, &self.selectors.rating_count)
            .chars()
            .filter(char::is_ascii_digit)
            .collect();
        if digits.is_empty() {
            return Ok(0);
        }
        parse_count(url, "rating_count", &digits)
    }

    fn related_apps(
        &self,
        url: &str,
        document: &Html,
        selector: &Selector,
    ) -> Result<Vec<String>, ExtractError> {
        document
            .select(selector)
            .map(|a| {
                a.value()
                    .attr("href")
                    .and_then(|href| self.param_of(href, "id"))
                    .ok_or_else(|| ExtractError::MissingParam {
                        url: url.to_string(),
                        param: "id".to_string(),
                    })
            })
            .collect()
    }

    /// Reads a query parameter from a possibly relative href
    fn param_of(&self, href: &str, key: &str) -> Option<String> {
        let resolved = self.base_url.join(href).ok()?;
        query_param(resolved.as_str(), key)
    }
}

impl PageExtractor for MarketExtractor {
    fn classify_and_extract(&self, url: &str, body: &str) -> Result<PageOutcome, ExtractError> {
        let document = Html::parse_document(body);

        if !self.is_page_of_interest(url, &document) {
            return Ok(PageOutcome::not_of_interest());
        }

        let links = self.extract_links(&document);
        match self.extract_record(url, &document) {
            Ok(record) => Ok(PageOutcome::of_interest(links, record)),
            Err(e) => Ok(PageOutcome::with_record_error(links, e)),
        }
    }

    fn entity_hint(&self, url: &str) -> Option<String> {
        query_param(url, "id")
    }
}

fn compile(pattern: &str) -> Result<Regex, ExtractError> {
    Regex::new(pattern).map_err(|e| ExtractError::Selector(e.to_string()))
}

/// Text of one element with whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of every matching element, joined by a space
fn joined_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses a number after dropping every non-digit (thousands separators)
fn parse_count(url: &str, field: &str, raw: &str) -> Result<u64, ExtractError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().map_err(|e| ExtractError::InvalidField {
        url: url.to_string(),
        field: field.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}
