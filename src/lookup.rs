use crate::input_loader::ResidentRecord;

/// One person to search for. First/last name are split off the raw
/// name field: first whitespace token and last whitespace token, so
/// "John & Mary Smith" queries as John Smith.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupQuery {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub town: String,
    pub state: String,
}

impl LookupQuery {
    pub fn from_record(record: &ResidentRecord, state: &str) -> Option<Self> {
        let tokens: Vec<&str> = record.names.split_whitespace().collect();
        let first_name = (*tokens.first()?).to_string();
        let last_name = (*tokens.last()?).to_string();
        Some(LookupQuery {
            first_name,
            last_name,
            address: record.address.trim().to_string(),
            town: record.town.trim().to_string(),
            state: state.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// Validated phone number.
    Found(String),
    /// The site answered and the person (or their number) is absent.
    NoMatch,
    /// Transport failure, unexpected page structure, or a detail page
    /// we could not verify. Distinct from NoMatch in logs and summary only.
    Indeterminate,
    /// Anti-automation interstitial. Needs a human before retrying.
    Challenged,
}

pub trait Directory {
    fn lookup(&self, query: &LookupQuery) -> LookupOutcome;
}
