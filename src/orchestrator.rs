use log::{info, warn};

use crate::config::Config;
use crate::delay_manager;
use crate::input_loader::ResidentRecord;
use crate::lookup::{Directory, LookupOutcome, LookupQuery};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChallengeAction {
    /// A human cleared the interstitial; retry the fallback lookup.
    Resume,
    /// Give up on this record.
    Abort,
}

/// Decides what happens when the fallback site throws up an
/// anti-automation challenge. The binary blocks on stdin; tests script it.
pub trait ChallengeHandler {
    fn on_challenge(&mut self, query: &LookupQuery) -> ChallengeAction;
}

#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub total: usize,
    pub skipped: usize,
    pub resolved: usize,
    pub no_match: usize,
    pub indeterminate: usize,
}

/// Sequential loop over the record set, input order. Records that
/// already carry a phone number are never looked up again, so re-running
/// on a previous output file resumes where it left off.
pub fn process_records(
    records: &mut [ResidentRecord],
    primary: &dyn Directory,
    fallback: &dyn Directory,
    handler: &mut dyn ChallengeHandler,
    config: &Config,
) -> RunSummary {
    let total = records.len();
    let mut summary = RunSummary {
        total,
        ..RunSummary::default()
    };
    let mut looked_up = 0;

    for (i, record) in records.iter_mut().enumerate() {
        if !record.phone.trim().is_empty() {
            info!(
                "Skipping {} / {} : {} (already has {})",
                i + 1,
                total,
                record.names,
                record.phone
            );
            summary.skipped += 1;
            continue;
        }

        let query = match LookupQuery::from_record(record, &config.state) {
            Some(q) => q,
            None => {
                warn!("Record {} has no usable name, leaving it unresolved", i + 1);
                summary.indeterminate += 1;
                continue;
            }
        };

        if looked_up > 0 && config.throttle {
            delay_manager::random_site_delay();
        }
        looked_up += 1;
        info!(
            "Processing {} / {} : {} ({})",
            i + 1,
            total,
            record.names,
            record.town
        );

        let mut outcome = primary.lookup(&query);
        if !matches!(outcome, LookupOutcome::Found(_)) {
            if config.throttle {
                delay_manager::random_page_delay();
            }
            outcome = run_fallback(fallback, handler, &query);
        }

        match outcome {
            LookupOutcome::Found(phone) => {
                record.phone = phone;
                summary.resolved += 1;
            }
            LookupOutcome::NoMatch => {
                info!("{}: no directory match", record.names);
                summary.no_match += 1;
            }
            LookupOutcome::Indeterminate | LookupOutcome::Challenged => {
                warn!("{}: could not determine a phone number", record.names);
                summary.indeterminate += 1;
            }
        }
    }
    summary
}

/// One fallback attempt, re-issued only when a human answers a challenge
/// with Resume.
fn run_fallback(
    fallback: &dyn Directory,
    handler: &mut dyn ChallengeHandler,
    query: &LookupQuery,
) -> LookupOutcome {
    loop {
        match fallback.lookup(query) {
            LookupOutcome::Challenged => match handler.on_challenge(query) {
                ChallengeAction::Resume => continue,
                ChallengeAction::Abort => return LookupOutcome::Indeterminate,
            },
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    struct StubDirectory {
        outcomes: RefCell<VecDeque<LookupOutcome>>,
        calls: RefCell<usize>,
    }

    impl StubDirectory {
        fn always(outcome: LookupOutcome) -> Self {
            StubDirectory {
                outcomes: RefCell::new(VecDeque::from(vec![outcome])),
                calls: RefCell::new(0),
            }
        }

        fn sequence(outcomes: Vec<LookupOutcome>) -> Self {
            StubDirectory {
                outcomes: RefCell::new(VecDeque::from(outcomes)),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Directory for StubDirectory {
        fn lookup(&self, _query: &LookupQuery) -> LookupOutcome {
            *self.calls.borrow_mut() += 1;
            let mut outcomes = self.outcomes.borrow_mut();
            if outcomes.len() > 1 {
                outcomes.pop_front().unwrap()
            } else {
                outcomes.front().cloned().unwrap_or(LookupOutcome::NoMatch)
            }
        }
    }

    struct ScriptedHandler {
        action: ChallengeAction,
        challenges: usize,
    }

    impl ScriptedHandler {
        fn new(action: ChallengeAction) -> Self {
            ScriptedHandler {
                action,
                challenges: 0,
            }
        }
    }

    impl ChallengeHandler for ScriptedHandler {
        fn on_challenge(&mut self, _query: &LookupQuery) -> ChallengeAction {
            self.challenges += 1;
            self.action
        }
    }

    fn record(names: &str, phone: &str) -> ResidentRecord {
        ResidentRecord {
            names: names.to_string(),
            address: "12 Oak Street".to_string(),
            town: "Hartford".to_string(),
            phone: phone.to_string(),
        }
    }

    fn test_config() -> Config {
        Config {
            throttle: false,
            ..Config::default()
        }
    }

    #[test]
    fn preresolved_records_are_untouched_and_trigger_no_lookups() {
        let mut records = vec![record("John Smith", "(860) 555-0144")];
        let primary = StubDirectory::always(LookupOutcome::Found("(999) 999-9999".to_string()));
        let fallback = StubDirectory::always(LookupOutcome::Found("(999) 999-9999".to_string()));
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records[0].phone, "(860) 555-0144");
        assert_eq!(primary.calls(), 0);
        assert_eq!(fallback.calls(), 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.resolved, 0);
    }

    #[test]
    fn primary_hit_skips_the_fallback() {
        let mut records = vec![record("John Smith", "")];
        let primary = StubDirectory::always(LookupOutcome::Found("(860) 555-0144".to_string()));
        let fallback = StubDirectory::always(LookupOutcome::Found("(999) 999-9999".to_string()));
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records[0].phone, "(860) 555-0144");
        assert_eq!(fallback.calls(), 0);
        assert_eq!(summary.resolved, 1);
    }

    #[test]
    fn primary_miss_records_fallback_value() {
        let mut records = vec![record("John Smith", "")];
        let primary = StubDirectory::always(LookupOutcome::NoMatch);
        let fallback = StubDirectory::always(LookupOutcome::Found("(203) 555-0101".to_string()));
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records[0].phone, "(203) 555-0101");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert_eq!(summary.resolved, 1);
    }

    #[test]
    fn both_misses_leave_phone_empty_but_keep_the_row() {
        let mut records = vec![record("John Smith", ""), record("Jane Doe", "")];
        let primary = StubDirectory::always(LookupOutcome::NoMatch);
        let fallback = StubDirectory::always(LookupOutcome::NoMatch);
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].phone, "");
        assert_eq!(records[1].phone, "");
        assert_eq!(summary.no_match, 2);
    }

    #[test]
    fn challenge_then_resume_retries_the_fallback() {
        let mut records = vec![record("John Smith", "")];
        let primary = StubDirectory::always(LookupOutcome::NoMatch);
        let fallback = StubDirectory::sequence(vec![
            LookupOutcome::Challenged,
            LookupOutcome::Found("(203) 555-0101".to_string()),
        ]);
        let mut handler = ScriptedHandler::new(ChallengeAction::Resume);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records[0].phone, "(203) 555-0101");
        assert_eq!(fallback.calls(), 2);
        assert_eq!(handler.challenges, 1);
        assert_eq!(summary.resolved, 1);
    }

    #[test]
    fn challenge_then_abort_leaves_record_unresolved() {
        let mut records = vec![record("John Smith", "")];
        let primary = StubDirectory::always(LookupOutcome::NoMatch);
        let fallback = StubDirectory::always(LookupOutcome::Challenged);
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(records[0].phone, "");
        assert_eq!(handler.challenges, 1);
        assert_eq!(summary.indeterminate, 1);
    }

    #[test]
    fn unusable_name_is_counted_without_any_lookup() {
        let mut records = vec![record("  ", "")];
        let primary = StubDirectory::always(LookupOutcome::NoMatch);
        let fallback = StubDirectory::always(LookupOutcome::NoMatch);
        let mut handler = ScriptedHandler::new(ChallengeAction::Abort);

        let summary =
            process_records(&mut records, &primary, &fallback, &mut handler, &test_config());

        assert_eq!(primary.calls(), 0);
        assert_eq!(summary.indeterminate, 1);
    }
}
