//! Shared application state
//!
//! One instance lives for the whole process and is handed to every handler
//! and to the daily rollover task.
//!
//! The store sits behind a single RwLock. Every mutation holds the write
//! lock across change + persist, so mutations are applied one at a time.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::{info, warn};

use crate::checkin::{apply_check_in, CheckInOutcome};
use crate::store::{ParticipantStore, Roster, StoreError};

/// Successful check-ins for one event-local day
#[derive(Debug)]
pub struct DailyCounter {
    count: AtomicU64,
    /// Day the count belongs to, as days since 0001-01-01
    day: AtomicI32,
}

impl DailyCounter {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            count: AtomicU64::new(0),
            day: AtomicI32::new(today.num_days_from_ce()),
        }
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Count one check-in and return the new total
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reset when `today` is past the tracked day
    ///
    /// Returns true when a reset happened. A clock that steps backwards
    /// does not reset the count.
    pub fn roll_over(&self, today: NaiveDate) -> bool {
        let today = today.num_days_from_ce();
        let tracked = self.day.load(Ordering::Relaxed);
        if today <= tracked {
            return false;
        }
        if self
            .day
            .compare_exchange(tracked, today, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }
        self.count.store(0, Ordering::Relaxed);
        true
    }
}

/// Result of a check-in plus the counters every response reports
#[derive(Debug, Clone)]
pub struct CheckInReport {
    pub outcome: CheckInOutcome,
    pub daily_check_in_count: u64,
    pub total_people: usize,
}

/// State shared by all components
pub struct SharedState {
    store: RwLock<ParticipantStore>,
    daily: DailyCounter,
    /// Process-wide demo flag, reported to the front end
    demo_mode: AtomicBool,
    timezone: Tz,
}

impl SharedState {
    /// Wrap a loaded store; demo mode starts on
    pub fn new(store: ParticipantStore, timezone: Tz) -> Self {
        let today = checkin_common::time::local_date(&checkin_common::time::now(), timezone);
        Self::starting_on(store, timezone, today)
    }

    /// Same as [`SharedState::new`] with the daily counter pinned to `today`
    pub fn starting_on(store: ParticipantStore, timezone: Tz, today: NaiveDate) -> Self {
        Self {
            store: RwLock::new(store),
            daily: DailyCounter::new(today),
            demo_mode: AtomicBool::new(true),
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn daily(&self) -> &DailyCounter {
        &self.daily
    }

    pub fn daily_check_in_count(&self) -> u64 {
        self.daily.get()
    }

    pub fn is_demo_mode(&self) -> bool {
        self.demo_mode.load(Ordering::Relaxed)
    }

    pub fn set_demo_mode(&self, enabled: bool) {
        self.demo_mode.store(enabled, Ordering::Relaxed);
        info!(
            "Switched to {} mode",
            if enabled { "demo" } else { "production" }
        );
    }

    /// Read access to the participants
    pub async fn store(&self) -> RwLockReadGuard<'_, ParticipantStore> {
        self.store.read().await
    }

    pub async fn total_people(&self) -> usize {
        self.store.read().await.len()
    }

    /// Replace the roster with an import and persist it
    pub async fn replace_roster(&self, roster: Roster) -> Result<usize, StoreError> {
        let mut store = self.store.write().await;
        let total = store.replace(roster)?;
        info!("Roster replaced, {} participants", total);
        Ok(total)
    }

    /// Drop every participant and persist
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut store = self.store.write().await;
        store.clear()?;
        info!("All participant data cleared");
        Ok(())
    }

    /// Run one scan through the check-in rules
    ///
    /// `demo_mode` is the request's own flag; the process-wide flag never
    /// allows a repeat. A recorded check-in bumps the daily counter and is
    /// persisted; when persisting fails the in-memory change is kept and the
    /// error returned.
    pub async fn check_in(
        &self,
        id: &str,
        at: DateTime<Utc>,
        demo_mode: bool,
    ) -> Result<CheckInReport, StoreError> {
        let mut store = self.store.write().await;

        let outcome = apply_check_in(&mut store, id, at, demo_mode, self.timezone);

        let daily_check_in_count = if outcome.is_recorded() {
            let count = self.daily.increment();
            if let Err(e) = store.save() {
                warn!("Check-in for {} kept in memory only: {}", id, e);
                return Err(e);
            }
            count
        } else {
            self.daily.get()
        };

        Ok(CheckInReport {
            outcome,
            daily_check_in_count,
            total_people: store.len(),
        })
    }
}
