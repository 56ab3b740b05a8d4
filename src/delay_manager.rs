use std::time::Duration;
use std::thread;
use rand::Rng;
use log::info;

/// Between the primary and fallback site for one record.
pub fn random_page_delay() {
    let mut rng = rand::thread_rng();
    let delay_secs = rng.gen_range(4..=12);
    info!("Waiting for {} seconds (Page Delay)...", delay_secs);
    thread::sleep(Duration::from_secs(delay_secs));
}

/// Between records.
pub fn random_site_delay() {
    let mut rng = rand::thread_rng();
    let delay_secs = rng.gen_range(10..=30);
    info!("Waiting for {} seconds (Site Delay)...", delay_secs);
    thread::sleep(Duration::from_secs(delay_secs));
}
