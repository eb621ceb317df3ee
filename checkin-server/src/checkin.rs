//! Check-in rules
//!
//! Decides what a scan does to the store. Persisting and counting are left to
//! the caller ([`crate::state::SharedState::check_in`]) so the rules stay pure.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use checkin_common::time::local_date;

use crate::store::{Participant, ParticipantStore};

pub const MSG_NOT_FOUND: &str = "找不到參與者資料。";
pub const MSG_INVALID: &str = "抱歉，您的資料無效。";

/// What happened to a scan
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    /// No participant with that ID
    NotFound,
    /// Participant exists but is not eligible
    Invalid,
    /// Timestamp recorded
    Recorded {
        participant: Participant,
        /// Same-day check-ins including this one
        ordinal: usize,
        /// Participant had already checked in that day (demo mode)
        repeat: bool,
    },
    /// Refused: already checked in that day and demo mode is off
    AlreadyCheckedIn {
        participant: Participant,
        /// Same-day check-ins already on record
        ordinal: usize,
    },
}

impl CheckInOutcome {
    /// Whether the store was changed
    pub fn is_recorded(&self) -> bool {
        matches!(self, CheckInOutcome::Recorded { .. })
    }

    /// User-facing message
    pub fn message(&self) -> String {
        match self {
            CheckInOutcome::NotFound => MSG_NOT_FOUND.to_string(),
            CheckInOutcome::Invalid => MSG_INVALID.to_string(),
            CheckInOutcome::Recorded { participant, .. } => {
                format!("{}，簽到成功。請進入活動場地。", participant.name)
            }
            CheckInOutcome::AlreadyCheckedIn { participant, .. } => {
                format!("{}，您今天已經簽到過了。", participant.name)
            }
        }
    }
}

/// Apply one scan to the store
///
/// Only valid participants are touched. The first check-in of an
/// event-local day is always recorded; later ones only in demo mode.
pub fn apply_check_in(
    store: &mut ParticipantStore,
    id: &str,
    at: DateTime<Utc>,
    demo_mode: bool,
    tz: Tz,
) -> CheckInOutcome {
    let Some(participant) = store.get_mut(id) else {
        return CheckInOutcome::NotFound;
    };
    if !participant.is_valid {
        return CheckInOutcome::Invalid;
    }

    let same_day = participant.check_ins_on(local_date(&at, tz), tz);

    if same_day == 0 || demo_mode {
        participant.record_check_in(at);
        CheckInOutcome::Recorded {
            participant: participant.clone(),
            ordinal: same_day + 1,
            repeat: same_day > 0,
        }
    } else {
        CheckInOutcome::AlreadyCheckedIn {
            participant: participant.clone(),
            ordinal: same_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Roster, MAX_CHECK_INS};

    fn hk() -> Tz {
        "Asia/Hong_Kong".parse().unwrap()
    }

    fn ts(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn store_with(entries: &[(&str, &str, bool)]) -> (tempfile::TempDir, ParticipantStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ParticipantStore::load(dir.path().join("participants_data.json")).unwrap();
        let roster: Roster = entries
            .iter()
            .map(|(id, name, is_valid)| {
                (
                    id.to_string(),
                    Participant {
                        name: name.to_string(),
                        is_valid: *is_valid,
                        ..Default::default()
                    },
                )
            })
            .collect();
        store.replace(roster).unwrap();
        (dir, store)
    }

    #[test]
    fn test_unknown_id_not_found() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);

        let outcome = apply_check_in(&mut store, "ZZ", ts("2024-01-01T09:00:00Z"), false, hk());
        assert_eq!(outcome, CheckInOutcome::NotFound);
        assert_eq!(outcome.message(), MSG_NOT_FOUND);
        assert!(store.get("A1").unwrap().check_ins.is_empty());
    }

    #[test]
    fn test_invalid_participant_untouched() {
        let (_dir, mut store) = store_with(&[("B2", "李小明", false)]);

        let outcome = apply_check_in(&mut store, "B2", ts("2024-01-01T09:00:00Z"), true, hk());
        assert_eq!(outcome, CheckInOutcome::Invalid);
        assert_eq!(outcome.message(), MSG_INVALID);
        assert!(store.get("B2").unwrap().check_ins.is_empty());
    }

    #[test]
    fn test_first_check_in_of_day_recorded() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);

        let outcome = apply_check_in(&mut store, "A1", ts("2024-01-01T09:00:00Z"), false, hk());
        match &outcome {
            CheckInOutcome::Recorded { participant, ordinal, repeat } => {
                assert_eq!(*ordinal, 1);
                assert!(!repeat);
                assert_eq!(participant.check_ins, vec![ts("2024-01-01T09:00:00Z")]);
            }
            other => panic!("expected Recorded, got {:?}", other),
        }
        assert!(outcome.message().contains("陳大文"));
        assert_eq!(store.get("A1").unwrap().check_ins.len(), 1);
    }

    #[test]
    fn test_second_same_day_refused_without_demo() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);
        apply_check_in(&mut store, "A1", ts("2024-01-01T01:00:00Z"), false, hk());

        let outcome = apply_check_in(&mut store, "A1", ts("2024-01-01T09:00:00Z"), false, hk());
        match &outcome {
            CheckInOutcome::AlreadyCheckedIn { ordinal, .. } => assert_eq!(*ordinal, 1),
            other => panic!("expected AlreadyCheckedIn, got {:?}", other),
        }
        assert!(!outcome.is_recorded());
        assert_eq!(outcome.message(), "陳大文，您今天已經簽到過了。");
        assert_eq!(store.get("A1").unwrap().check_ins.len(), 1);
    }

    #[test]
    fn test_second_same_day_recorded_in_demo() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);
        apply_check_in(&mut store, "A1", ts("2024-01-01T01:00:00Z"), false, hk());

        let outcome = apply_check_in(&mut store, "A1", ts("2024-01-01T09:00:00Z"), true, hk());
        match outcome {
            CheckInOutcome::Recorded { participant, ordinal, repeat } => {
                assert_eq!(ordinal, 2);
                assert!(repeat);
                assert_eq!(participant.check_ins[0], ts("2024-01-01T09:00:00Z"));
            }
            other => panic!("expected Recorded, got {:?}", other),
        }
    }

    #[test]
    fn test_next_local_day_is_new_day() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);
        // 2024-01-01 23:00 in Hong Kong
        apply_check_in(&mut store, "A1", ts("2024-01-01T15:00:00Z"), false, hk());

        // 2024-01-02 00:30 in Hong Kong, same UTC date as the first
        let outcome = apply_check_in(&mut store, "A1", ts("2024-01-01T16:30:00Z"), false, hk());
        assert!(matches!(
            outcome,
            CheckInOutcome::Recorded { ordinal: 1, repeat: false, .. }
        ));
    }

    #[test]
    fn test_demo_mode_caps_history() {
        let (_dir, mut store) = store_with(&[("A1", "陳大文", true)]);
        for minute in 0..(MAX_CHECK_INS + 3) {
            let at = ts(&format!("2024-01-01T09:{:02}:00Z", minute));
            assert!(apply_check_in(&mut store, "A1", at, true, hk()).is_recorded());
        }

        let check_ins = &store.get("A1").unwrap().check_ins;
        assert_eq!(check_ins.len(), MAX_CHECK_INS);
        assert_eq!(check_ins[0], ts("2024-01-01T09:12:00Z"));
    }
}
