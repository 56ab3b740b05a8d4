use std::time::Duration;
use log::{info, warn, error};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};

use crate::config::Config;
use crate::extractor::Extractor;
use crate::lookup::{Directory, LookupOutcome, LookupQuery};

const CHALLENGE_SELECTOR: &str = r#"#challenge-form, .g-recaptcha, iframe[src*="captcha"]"#;
const CHALLENGE_MARKERS: [&str; 2] = ["verify you are a human", "unusual traffic"];
const CARD_SELECTOR: &str = "div.card-summary, div.card";
const CARD_PHONE_SELECTOR: &str = r#"span[itemprop="telephone"], a[href^="tel:"]"#;

/// Street-suffix rewrites applied in order before querying the site,
/// which indexes addresses in abbreviated form. Trail and Turnpike are
/// listed even though the site keeps them spelled out.
const STREET_ABBREVIATIONS: &[(&str, &str)] = &[
    ("Drive", "Dr"),
    ("Street", "St"),
    ("Road", "Rd"),
    ("Lane", "Ln"),
    ("Parkway", "Pkwy"),
    ("Avenue", "Ave"),
    ("Unit ", "#"),
    ("Court", "Ct"),
    ("Trail", "Trail"),
    ("Turnpike", "Turnpike"),
];

/// Fallback site: searches by street address and scans result cards for
/// the queried name.
pub struct AddressDirectory {
    client: Client,
    base_url: String,
    state_abbr: String,
    extractor: Extractor,
}

#[derive(Debug, PartialEq)]
enum AddressPage {
    Challenge,
    NoCard,
    CardWithoutPhone,
    Phone(String),
}

pub fn normalize_address(address: &str, town: &str, state_abbr: &str) -> String {
    let mut street = address.to_string();
    for (long, short) in STREET_ABBREVIATIONS {
        street = street.replace(long, short);
    }
    format!("{}, {}, {}", street, town, state_abbr)
}

impl AddressDirectory {
    pub fn new(config: &Config) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client");

        AddressDirectory {
            client,
            base_url: config.address_site_url.clone(),
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
        let normalized = normalize_address(&query.address, &query.town, &self.state_abbr);
        format!(
            "{}/results?address={}",
            self.base_url,
            urlencoding::encode(&normalized)
        )
    }

    fn fetch(&self, url: &str) -> Result<(String, reqwest::StatusCode), reqwest::Error> {
        let ua = self.get_random_user_agent();
        let resp = self.client.get(url).header(USER_AGENT, ua).send()?;
        let status = resp.status();
        let text = resp.text()?;
        Ok((text, status))
    }
}

impl Directory for AddressDirectory {
    fn lookup(&self, query: &LookupQuery) -> LookupOutcome {
        let url = self.search_url(query);
        info!(
            "Address search: {}",
            normalize_address(&query.address, &query.town, &self.state_abbr)
        );

        let (body, status) = match self.fetch(&url) {
            Ok(r) => r,
            Err(e) => {
                error!("Address search request failed: {}", e);
                return LookupOutcome::Indeterminate;
            }
        };
        if status.as_u16() == 403 || status.as_u16() == 429 {
            warn!("Address search blocked: {}", status);
            return LookupOutcome::Challenged;
        }

        match parse_result_page(&body, &query.first_name, &query.last_name, &self.extractor) {
            AddressPage::Challenge => {
                warn!("Anti-automation challenge on the address site");
                LookupOutcome::Challenged
            }
            AddressPage::NoCard => {
                info!(
                    "{} {}: no result card at {}",
                    query.first_name, query.last_name, query.address
                );
                LookupOutcome::NoMatch
            }
            AddressPage::CardWithoutPhone => {
                info!(
                    "{} {}: matched card carries no phone",
                    query.first_name, query.last_name
                );
                LookupOutcome::NoMatch
            }
            AddressPage::Phone(phone) => {
                info!(
                    "{} {} {}: {}",
                    query.first_name, query.last_name, query.town, phone
                );
                LookupOutcome::Found(phone)
            }
        }
    }
}

fn parse_result_page(
    html: &str,
    first_name: &str,
    last_name: &str,
    extractor: &Extractor,
) -> AddressPage {
    let document = Html::parse_document(html);

    let challenge_selector = Selector::parse(CHALLENGE_SELECTOR).unwrap();
    if document.select(&challenge_selector).next().is_some() {
        return AddressPage::Challenge;
    }
    let lowered = html.to_lowercase();
    if CHALLENGE_MARKERS.iter().any(|m| lowered.contains(m)) {
        return AddressPage::Challenge;
    }

    let card_selector = Selector::parse(CARD_SELECTOR).unwrap();
    let card = document.select(&card_selector).find(|card| {
        let text = card.text().collect::<Vec<_>>().join("\n");
        text.contains(first_name) && text.contains(last_name)
    });
    let card = match card {
        Some(c) => c,
        None => return AddressPage::NoCard,
    };

    let phone_selector = Selector::parse(CARD_PHONE_SELECTOR).unwrap();
    if let Some(el) = card.select(&phone_selector).next() {
        let text = el.text().collect::<Vec<_>>().join("").trim().to_string();
        if !text.is_empty() {
            return AddressPage::Phone(text);
        }
    }

    // Some cards print the number as plain text instead of a tagged field.
    let card_text = card.text().collect::<Vec<_>>().join("\n");
    match extractor.extract_phone(&card_text) {
        Some(phone) => AddressPage::Phone(phone),
        None => AddressPage::CardWithoutPhone,
    }
}
