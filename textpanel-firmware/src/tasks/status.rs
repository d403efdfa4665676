//! Demo status screen
//!
//! Shows uptime on the second row and logs whenever the fault counters move.

use core::fmt::Write;

use defmt::{info, warn};
use embassy_time::{Duration, Instant, Ticker};
use heapless::String;

use crate::PANEL;

/// Screen update interval in milliseconds
pub const STATUS_INTERVAL_MS: u64 = 1000;

#[embassy_executor::task]
pub async fn status_task() {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATUS_INTERVAL_MS));
    let start = Instant::now();
    let mut faults_seen = 0;

    loop {
        ticker.next().await;

        let secs = start.elapsed().as_secs();
        let mut line: String<16> = String::new();
        // Fits in 16 columns up to 999h
        let _ = write!(
            line,
            "up {:3}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        PANEL.write(0, 1, 16, &line);

        if let Some(stats) = crate::fault_stats() {
            if stats.total != faults_seen {
                faults_seen = stats.total;
                warn!("Display faults: {}", stats);
            }
        }
    }
}
