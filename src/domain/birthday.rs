use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};
use uuid::Uuid;

/// A birthday stored by a user. The stored year is kept for age display only;
/// recurrence uses month and day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Birthday {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub birthday: Date,
    /// Contact details of the person whose birthday this is, not the owner.
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Whole days before the occurrence at which to notify. 0 = on the day.
    pub reminder_days: i32,
    pub notes: Option<String>,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Birthday {
    /// The next calendar date this birthday falls on, seen from `today`.
    ///
    /// The candidate is this year's month/day; if that is strictly before
    /// `today` it rolls to next year. Feb 29 resolves to Mar 1 in years
    /// without a leap day.
    pub fn next_occurrence(&self, today: Date) -> Date {
        let candidate = on_year(self.birthday, today.year());
        if candidate < today {
            on_year(self.birthday, today.year() + 1)
        } else {
            candidate
        }
    }

    /// Calendar-day distance from `today` to the next occurrence.
    ///
    /// Both ends are pure dates, so time of day can never leak into the
    /// difference.
    pub fn days_until(&self, today: Date) -> i64 {
        (self.next_occurrence(today) - today).whole_days()
    }

    /// Whether the daily run on `today` should notify for this birthday.
    pub fn is_due(&self, today: Date) -> bool {
        self.days_until(today) == i64::from(self.reminder_days)
    }

    /// Completed age at the next occurrence, from the stored year.
    pub fn age_at_next_occurrence(&self, today: Date) -> i32 {
        self.next_occurrence(today).year() - self.birthday.year()
    }

}

/// `day/month` display form, no year.
pub fn short_date(date: Date) -> String {
    format!("{}/{}", date.day(), u8::from(date.month()))
}

fn on_year(date: Date, year: i32) -> Date {
    Date::from_calendar_date(year, date.month(), date.day()).unwrap_or_else(|_| {
        // Feb 29 in a non-leap year.
        Date::from_calendar_date(year, Month::March, 1)
            .expect("March 1 exists in every year")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn birthday(date: Date, reminder_days: i32) -> Birthday {
        Birthday {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Ana".to_string(),
            birthday: date,
            email: None,
            phone: None,
            reminder_days,
            notes: None,
            is_active: true,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn occurrence_later_this_year_stays_this_year() {
        let b = birthday(date!(2020 - 03 - 10), 7);
        assert_eq!(b.next_occurrence(date!(2025 - 03 - 03)), date!(2025 - 03 - 10));
    }

    #[test]
    fn occurrence_already_passed_rolls_to_next_year() {
        let b = birthday(date!(2025 - 01 - 01), 1);
        assert_eq!(b.next_occurrence(date!(2025 - 12 - 31)), date!(2026 - 01 - 01));
        assert_eq!(b.days_until(date!(2025 - 12 - 31)), 1);
        assert!(b.is_due(date!(2025 - 12 - 31)));
    }

    #[test]
    fn occurrence_today_does_not_roll() {
        let b = birthday(date!(1990 - 06 - 15), 0);
        assert_eq!(b.next_occurrence(date!(2025 - 06 - 15)), date!(2025 - 06 - 15));
        assert_eq!(b.days_until(date!(2025 - 06 - 15)), 0);
    }

    #[test]
    fn exact_offset_match_only() {
        let b = birthday(date!(2020 - 03 - 10), 7);
        assert!(!b.is_due(date!(2025 - 03 - 02))); // 8 days out
        assert!(b.is_due(date!(2025 - 03 - 03))); // exactly 7
        assert!(!b.is_due(date!(2025 - 03 - 04))); // 6 days out
    }

    #[test]
    fn zero_offset_means_on_the_day() {
        let b = birthday(date!(1990 - 06 - 15), 0);
        assert!(b.is_due(date!(2025 - 06 - 15)));
        assert!(!b.is_due(date!(2025 - 06 - 14)));
        assert!(!b.is_due(date!(2025 - 06 - 16)));
    }

    #[test]
    fn leap_day_resolves_to_march_first_in_common_years() {
        let b = birthday(date!(2000 - 02 - 29), 0);
        assert_eq!(b.next_occurrence(date!(2025 - 02 - 20)), date!(2025 - 03 - 01));
        // Leap years keep the real date.
        assert_eq!(b.next_occurrence(date!(2024 - 02 - 20)), date!(2024 - 02 - 29));
    }

    #[test]
    fn age_uses_stored_year() {
        let b = birthday(date!(2020 - 03 - 10), 7);
        assert_eq!(b.age_at_next_occurrence(date!(2025 - 03 - 03)), 5);
        assert_eq!(b.age_at_next_occurrence(date!(2025 - 03 - 11)), 6);
    }

    #[test]
    fn short_date_is_day_slash_month() {
        assert_eq!(short_date(date!(2025 - 03 - 10)), "10/3");
        assert_eq!(short_date(date!(2025 - 11 - 05)), "5/11");
    }
}
