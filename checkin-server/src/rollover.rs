//! Daily counter rollover
//!
//! Background task that resets the daily check-in counter once the
//! event-local date changes. It sleeps until the next local midnight, capped
//! at `poll` so a suspended host or a clock jump is noticed soon after.

use std::sync::Arc;
use std::time::Duration;
use checkin_common::time::{local_date, now, until_next_midnight};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::state::SharedState;

/// Spawn the rollover loop on the current runtime
pub fn spawn_daily_rollover(state: Arc<SharedState>, poll: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let tz = state.timezone();
        info!("Daily check-in counter resets at midnight {}", tz);

        loop {
            let wait = until_next_midnight(now(), tz).min(poll);
            debug!("Next rollover check in {:?}", wait);
            tokio::time::sleep(wait).await;

            let today = local_date(&now(), tz);
            let previous = state.daily_check_in_count();
            if state.daily().roll_over(today) {
                info!(
                    "New day {}: daily check-in count reset (was {})",
                    today, previous
                );
            }
        }
    })
}
