//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Format a calendar date the way the club writes it (DD.MM.YYYY)
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Format an amount in minor units, e.g. `125050` + `PLN` -> `1250.50 PLN`
pub fn format_amount(minor_units: i64, currency: &str) -> String {
    let sign = if minor_units < 0 { "-" } else { "" };
    let abs = minor_units.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

/// Format an instant as club-local `DD.MM.YYYY HH:MM`
pub fn format_local_datetime(instant: DateTime<Utc>, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%d.%m.%Y %H:%M").to_string()
}

/// Calendar date of an instant in the club timezone
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Today's date in the club timezone
pub fn local_today(tz: Tz) -> NaiveDate {
    local_date(Utc::now(), tz)
}

/// Interpret a wall-clock date and time in the club timezone.
///
/// `None` for a time skipped by a DST change; an ambiguous time takes the earlier instant.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Parse a date written either as `YYYY-MM-DD` or `DD.MM.YYYY`
pub fn parse_flexible_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
        .ok()
}

/// Parse a time written as `HH:MM` (seconds optional)
pub fn parse_flexible_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M:%S"))
        .ok()
}

/// Normalize an email address for comparison
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Validate a Polish national identification number (PESEL).
///
/// Eleven digits; the last one is a checksum over the first ten with the
/// weights 1,3,7,9 repeating.
pub fn is_valid_pesel(pesel: &str) -> bool {
    const WEIGHTS: [u32; 10] = [1, 3, 7, 9, 1, 3, 7, 9, 1, 3];

    if pesel.len() != 11 || !pesel.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = pesel.chars().filter_map(|c| c.to_digit(10)).collect();
    let sum: u32 = digits.iter().zip(WEIGHTS.iter()).map(|(d, w)| d * w).sum();
    let check = (10 - sum % 10) % 10;

    check == digits[10]
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Calculate pagination offset
pub fn calculate_offset(page: i64, page_size: i64) -> i64 {
    (page.max(1) - 1) * page_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(125050, "PLN"), "1250.50 PLN");
        assert_eq!(format_amount(5, "EUR"), "0.05 EUR");
        assert_eq!(format_amount(-1000, "PLN"), "-10.00 PLN");
    }

    #[test]
    fn test_parse_flexible_date() {
        let expected = NaiveDate::from_ymd_opt(2015, 3, 7);
        assert_eq!(parse_flexible_date("2015-03-07"), expected);
        assert_eq!(parse_flexible_date(" 07.03.2015 "), expected);
        assert_eq!(parse_flexible_date("7/3/2015"), None);
    }

    #[test]
    fn test_parse_flexible_time() {
        assert_eq!(parse_flexible_time("06:30"), NaiveTime::from_hms_opt(6, 30, 0));
        assert_eq!(parse_flexible_time("6.30"), None);
    }

    #[test]
    fn test_local_time_in_warsaw() {
        let tz = chrono_tz::Europe::Warsaw;
        let winter = Utc.with_ymd_and_hms(2026, 2, 14, 6, 30, 0).unwrap();
        assert_eq!(format_local_datetime(winter, tz), "14.02.2026 07:30");

        let summer = Utc.with_ymd_and_hms(2026, 7, 1, 22, 30, 0).unwrap();
        assert_eq!(format_local_datetime(summer, tz), "02.07.2026 00:30");
        assert_eq!(local_date(summer, tz), NaiveDate::from_ymd_opt(2026, 7, 2).unwrap());
    }

    #[test]
    fn test_local_to_utc() {
        let tz = chrono_tz::Europe::Warsaw;
        let date = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        assert_eq!(
            local_to_utc(date, NaiveTime::from_hms_opt(7, 30, 0).unwrap(), tz),
            Some(Utc.with_ymd_and_hms(2026, 2, 14, 6, 30, 0).unwrap())
        );

        // 02:30 does not exist on the spring DST change
        let spring = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        assert_eq!(local_to_utc(spring, NaiveTime::from_hms_opt(2, 30, 0).unwrap(), tz), None);
    }

    #[test]
    fn test_pesel_checksum() {
        assert!(is_valid_pesel("44051401359"));
        assert!(is_valid_pesel("02070803628"));
        assert!(!is_valid_pesel("44051401358"));
        assert!(!is_valid_pesel("4405140135"));
        assert!(!is_valid_pesel("4405140135a"));
    }

    #[test]
    fn test_email_helpers() {
        assert!(is_valid_email("rodzic@example.pl"));
        assert!(!is_valid_email("rodzic.example.pl"));
        assert!(!is_valid_email("@example.pl"));
        assert_eq!(normalize_email("  Jan.Kowalski@Example.PL "), "jan.kowalski@example.pl");
    }

    #[test]
    fn test_calculate_offset() {
        assert_eq!(calculate_offset(1, 20), 0);
        assert_eq!(calculate_offset(3, 20), 40);
        assert_eq!(calculate_offset(0, 20), 0);
    }
}
