use log::{info, warn};

use crate::lookup::LookupQuery;

/// Fields pulled off a directory detail page.
#[derive(Debug, Clone, Default)]
pub struct PersonDetail {
    /// None when the site hid the number behind extra verification.
    pub telephone: Option<String>,
    pub name: String,
    pub address: String,
    pub town: String,
    pub state: String,
}

/// Confirms the detail page belongs to the queried person. Town and
/// state must match exactly; name and address are substring checks so
/// middle initials and unit numbers don't invalidate a real hit.
pub fn validate(detail: &PersonDetail, query: &LookupQuery) -> bool {
    if detail.telephone.is_none() {
        info!("===== Additional permissions needed =====");
        return false;
    }

    if detail.town != query.town
        || detail.state != query.state
        || !detail.name.contains(&query.first_name)
        || !detail.name.contains(&query.last_name)
        || !detail.address.contains(&query.address)
    {
        warn!(
            "Expected: {} {} / {} / {} / {}",
            query.first_name, query.last_name, query.address, query.town, query.state
        );
        warn!(
            "Got: {} / {} / {} / {}",
            detail.name, detail.address, detail.town, detail.state
        );
        return false;
    }
    true
}
