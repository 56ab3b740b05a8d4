use resident_lookup_lib::{input_loader, logger, orchestrator, output_writer};
use resident_lookup_lib::config::Config;
use resident_lookup_lib::lookup::LookupQuery;
use resident_lookup_lib::orchestrator::{ChallengeAction, ChallengeHandler};
use resident_lookup_lib::{AddressDirectory, NameDirectory};

use std::error::Error;
use std::io::{self, BufRead, Write};
use log::{info, warn, error};

/// Blocks the run until a human has cleared the interstitial in a
/// browser, then resumes the lookup. Typing q gives up on the record.
struct StdinChallengeHandler;

impl ChallengeHandler for StdinChallengeHandler {
    fn on_challenge(&mut self, query: &LookupQuery) -> ChallengeAction {
        warn!(
            "Challenge hit while looking up {} {}. Solve it in a browser, then press Enter (q to skip this record).",
            query.first_name, query.last_name
        );
        print!("> ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) if line.trim().eq_ignore_ascii_case("q") => ChallengeAction::Abort,
            Ok(_) => ChallengeAction::Resume,
            Err(e) => {
                error!("Could not read from stdin: {}. Skipping record.", e);
                ChallengeAction::Abort
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    info!("Starting Resident Phone Lookup...");

    let config = Config::load();

    let mut records = input_loader::load_records(&config.input_file);
    if records.is_empty() {
        error!(
            "No records found in {}. Please ensure the file exists and has headers: Name(s), Address, Town",
            config.input_file
        );
        return Ok(());
    }

    let primary = NameDirectory::new(&config);
    let fallback = AddressDirectory::new(&config);
    let mut handler = StdinChallengeHandler;

    let summary = orchestrator::process_records(
        &mut records,
        &primary,
        &fallback,
        &mut handler,
        &config,
    );

    let output_path = config.output_path();
    output_writer::write_records(&output_path, &records)?;

    info!(
        "Lookup completed. {} resolved, {} no match, {} undetermined, {} already done (of {}). Wrote {:?}",
        summary.resolved,
        summary.no_match,
        summary.indeterminate,
        summary.skipped,
        summary.total,
        output_path
    );
    Ok(())
}
