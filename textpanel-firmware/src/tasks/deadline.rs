//! Watchdog deadline task
//!
//! Turns the engine's arm/cancel requests into an embassy-time timer. When a
//! deadline passes, the timeout is delivered on the I2C2 error interrupt so
//! it runs at the same priority as every other engine event.

use defmt::*;
use textpanel_hal_stm32f1::time::run_deadline;
use textpanel_hal_stm32f1::DeadlineSignal;

#[embassy_executor::task]
pub async fn deadline_task(signal: &'static DeadlineSignal) {
    info!("Deadline task started");
    run_deadline(signal, crate::deadline_expired).await
}
