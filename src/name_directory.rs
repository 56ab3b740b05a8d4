use std::time::Duration;
use log::{info, warn, error};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};
use url::Url;

use crate::config::Config;
use crate::extractor::Extractor;
use crate::lookup::{Directory, LookupOutcome, LookupQuery};
use crate::validator::{self, PersonDetail};

// Results page
const RESULT_COUNT_SELECTOR: &str = ".TopH1";
const ZERO_RESULTS_MARKER: &str = "0 Voter Records";
const FIRST_RESULT_LINK_SELECTOR: &str = "td a";

// Detail page
const TELEPHONE_SELECTOR: &str = r#"span[itemprop="telephone"]"#;
const NAME_SELECTOR: &str = r#"span[itemprop="name"]"#;
const TOWN_SELECTOR: &str = r#"span[itemprop="addressLocality"]"#;
const STATE_SELECTOR: &str = r#"span[itemprop="addressRegion"]"#;
const ADDRESS_SELECTOR: &str = ".top-address-link";

/// Primary site: searches voter rolls by first/last name, state and town.
pub struct NameDirectory {
    client: Client,
    base_url: String,
    state_abbr: String,
    extractor: Extractor,
}

#[derive(Debug, PartialEq)]
enum ResultPage {
    /// Explicit zero-records heading. Confirmed absent, skip the detail fetch.
    ZeroRecords,
    /// First result row's detail link.
    Detail(String),
    /// Neither indicator nor result rows. Layout change or interstitial.
    NoListing,
}

impl NameDirectory {
    pub fn new(config: &Config) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        NameDirectory {
            client,
            base_url: config.name_site_url.clone(),
            state_abbr: config.state_abbr.clone(),
            extractor: Extractor::new(),
        }
    }

    fn get_random_user_agent(&self) -> &str {
        let uas = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
        ];
        use rand::Rng;
        let mut rng = rand::thread_rng();
        uas[rng.gen_range(0..uas.len())]
    }

    fn search_url(&self, query: &LookupQuery) -> String {
        format!(
            "{}/voters/?first_name={}&last_name={}&state={}&city={}",
            self.base_url,
            urlencoding::encode(&query.first_name),
            urlencoding::encode(&query.last_name),
            urlencoding::encode(&self.state_abbr),
            urlencoding::encode(&query.town),
        )
    }

    fn fetch(&self, url: &str) -> Result<(String, reqwest::StatusCode), reqwest::Error> {
        let ua = self.get_random_user_agent();
        let resp = self.client.get(url).header(USER_AGENT, ua).send()?;
        let status = resp.status();
        let text = resp.text()?;
        Ok((text, status))
    }

    fn fetch_detail(&self, href: &str, query: &LookupQuery) -> LookupOutcome {
        let detail_url = match Url::parse(&self.base_url).and_then(|base| base.join(href)) {
            Ok(u) => u.to_string(),
            Err(e) => {
                warn!("Unusable detail link {}: {}", href, e);
                return LookupOutcome::Indeterminate;
            }
        };

        let (body, status) = match self.fetch(&detail_url) {
            Ok(r) => r,
            Err(e) => {
                error!("Failed to fetch detail page {}: {}", detail_url, e);
                return LookupOutcome::Indeterminate;
            }
        };
        if status.as_u16() == 403 || status.as_u16() == 429 {
            warn!("Blocked at {}: {}", detail_url, status);
            return LookupOutcome::Indeterminate;
        }

        let detail = extract_detail(&body);
        if validator::validate(&detail, query) {
            let raw = detail.telephone.unwrap_or_default();
            let phone = self
                .extractor
                .extract_phone(&raw)
                .unwrap_or_else(|| raw.trim().to_string());
            info!(
                "{} {} {}: {}",
                query.first_name, query.last_name, query.town, phone
            );
            LookupOutcome::Found(phone)
        } else if detail.telephone.is_none() {
            // Number is gated behind extra verification. Nothing to confirm either way.
            LookupOutcome::Indeterminate
        } else {
            info!(
                "{} {} {}: first result is a different person",
                query.first_name, query.last_name, query.town
            );
            LookupOutcome::NoMatch
        }
    }
}

impl Directory for NameDirectory {
    fn lookup(&self, query: &LookupQuery) -> LookupOutcome {
        info!(
            "Name search: {} {} ({}, {})",
            query.first_name, query.last_name, query.town, self.state_abbr
        );

        let (body, status) = match self.fetch(&self.search_url(query)) {
            Ok(r) => r,
            Err(e) => {
                error!("Name search request failed: {}", e);
                return LookupOutcome::Indeterminate;
            }
        };
        if status.as_u16() == 403 || status.as_u16() == 429 {
            warn!("Name search blocked: {}", status);
            return LookupOutcome::Indeterminate;
        }

        match parse_result_page(&body) {
            ResultPage::ZeroRecords => {
                info!(
                    "{} {} {}: zero records",
                    query.first_name, query.last_name, query.town
                );
                LookupOutcome::NoMatch
            }
            ResultPage::NoListing => {
                warn!("Results page had neither a count heading nor result rows");
                LookupOutcome::Indeterminate
            }
            ResultPage::Detail(href) => self.fetch_detail(&href, query),
        }
    }
}

fn parse_result_page(html: &str) -> ResultPage {
    let document = Html::parse_document(html);

    let count_selector = Selector::parse(RESULT_COUNT_SELECTOR).unwrap();
    if let Some(heading) = document.select(&count_selector).next() {
        let text = heading.text().collect::<Vec<_>>().join("");
        if text.contains(ZERO_RESULTS_MARKER) {
            return ResultPage::ZeroRecords;
        }
    }

    let link_selector = Selector::parse(FIRST_RESULT_LINK_SELECTOR).unwrap();
    match document
        .select(&link_selector)
        .find_map(|a| a.value().attr("href"))
    {
        Some(href) => ResultPage::Detail(href.to_string()),
        None => ResultPage::NoListing,
    }
}

fn extract_detail(html: &str) -> PersonDetail {
    let document = Html::parse_document(html);
    PersonDetail {
        telephone: first_text(&document, TELEPHONE_SELECTOR),
        name: first_text(&document, NAME_SELECTOR).unwrap_or_default(),
        address: first_text(&document, ADDRESS_SELECTOR).unwrap_or_default(),
        town: first_text(&document, TOWN_SELECTOR).unwrap_or_default(),
        state: first_text(&document, STATE_SELECTOR).unwrap_or_default(),
    }
}

/// Presence probe: first matching element's trimmed text, None when the
/// element is absent or empty.
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).unwrap();
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
        .filter(|s| !s.is_empty())
}
