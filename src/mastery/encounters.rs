use chrono::{DateTime, SecondsFormat, Utc};

use crate::types::{EncounterEvent, EncounterType, Encounters, MAX_ENCOUNTER_HISTORY};

/// Encounters after which an item counts as sufficiently exposed.
pub const TARGET_ENCOUNTERS: u32 = 12;

pub fn add_encounter(current: &Encounters, kind: EncounterType, now: DateTime<Utc>) -> Encounters {
    let mut next = current.clone();
    next.total += 1;
    *next.by_type.get_mut(kind) += 1;
    next.history.insert(
        0,
        EncounterEvent {
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
        },
    );
    next.history.truncate(MAX_ENCOUNTER_HISTORY);
    next
}

pub fn has_reached_target_encounters(encounters: &Encounters) -> bool {
    encounters.total >= TARGET_ENCOUNTERS
}

/// Percentage of the target reached, capped at 100.
pub fn get_encounter_progress(encounters: &Encounters) -> u8 {
    let pct = (encounters.total as f64 / TARGET_ENCOUNTERS as f64 * 100.0).round();
    pct.min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap()
    }

    #[test]
    fn add_encounter_counts_and_prepends() {
        let e = add_encounter(&Encounters::default(), EncounterType::Reading, at(0));
        let e = add_encounter(&e, EncounterType::Flashcard, at(1));
        assert_eq!(e.total, 2);
        assert_eq!(e.by_type.reading, 1);
        assert_eq!(e.by_type.flashcard, 1);
        assert_eq!(e.history[0].kind, EncounterType::Flashcard);
        assert_eq!(e.history[1].kind, EncounterType::Reading);
    }

    #[test]
    fn history_capped_at_twenty() {
        let mut e = Encounters::default();
        for i in 0..25 {
            e = add_encounter(&e, EncounterType::Exercise, at(i));
        }
        assert_eq!(e.total, 25);
        assert_eq!(e.history.len(), MAX_ENCOUNTER_HISTORY);
        assert!(e.history[0].date.starts_with("2024-01-01T10:24"));
    }

    #[test]
    fn target_and_progress() {
        let mut e = Encounters {
            total: 6,
            ..Default::default()
        };
        assert!(!has_reached_target_encounters(&e));
        assert_eq!(get_encounter_progress(&e), 50);
        e.total = 12;
        assert!(has_reached_target_encounters(&e));
        e.total = 30;
        assert_eq!(get_encounter_progress(&e), 100);
        e.total = 1;
        assert_eq!(get_encounter_progress(&e), 8);
    }
}
