use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};

/// Hours (UTC) offered on each business day.
pub const SLOT_HOURS: [u32; 2] = [10, 14];
/// Calendar days ahead to look for business days.
pub const LOOKAHEAD_DAYS: u64 = 7;
pub const MAX_SLOTS: usize = 6;

/// Proposes meeting slots: the next seven calendar days starting tomorrow,
/// weekdays only, at 10:00 and 14:00, capped at six options.
pub fn propose_meeting_times(now: DateTime<Utc>) -> Vec<DateTime<Utc>> {
    let today = now.date_naive();
    (1..=LOOKAHEAD_DAYS)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter(|day| !matches!(day.weekday(), Weekday::Sat | Weekday::Sun))
        .flat_map(|day| {
            SLOT_HOURS.iter().filter_map(move |hour| {
                NaiveTime::from_hms_opt(*hour, 0, 0).map(|t| day.and_time(t).and_utc())
            })
        })
        .take(MAX_SLOTS)
        .collect()
}

/// `1. Monday, March 04 at 10:00 AM` style list, one slot per line.
pub fn format_slot_options(slots: &[DateTime<Utc>]) -> String {
    slots
        .iter()
        .enumerate()
        .map(|(i, slot)| format!("{}. {}", i + 1, slot.format("%A, %B %d at %I:%M %p")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_monday_yields_six_weekday_slots() {
        // 2024-03-04 is a Monday
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 16, 30, 0).unwrap();
        let slots = propose_meeting_times(now);
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0], Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap());
        assert_eq!(slots[1], Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap());
        assert_eq!(slots[5], Utc.with_ymd_and_hms(2024, 3, 7, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_friday_skips_weekend() {
        // 2024-03-08 is a Friday
        let now = Utc.with_ymd_and_hms(2024, 3, 8, 9, 0, 0).unwrap();
        let slots = propose_meeting_times(now);
        assert_eq!(slots.len(), 6);
        assert_eq!(slots[0].date_naive().weekday(), Weekday::Mon);
        assert!(slots
            .iter()
            .all(|s| !matches!(s.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn test_slots_are_on_offered_hours() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 12, 0, 0).unwrap();
        for slot in propose_meeting_times(now) {
            assert!(SLOT_HOURS.contains(&slot.hour()));
            assert_eq!(slot.minute(), 0);
            assert!(slot > now);
        }
    }

    #[test]
    fn test_format_slot_options() {
        let slots = vec![
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap(),
        ];
        assert_eq!(
            format_slot_options(&slots),
            "1. Tuesday, March 05 at 10:00 AM\n2. Tuesday, March 05 at 02:00 PM"
        );
    }
}
