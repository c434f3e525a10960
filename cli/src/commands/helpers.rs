use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use nosh_core::models::MealType;

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// The last `days` days ending today, as an inclusive range.
pub(crate) fn last_days_range(days: u32) -> (NaiveDate, NaiveDate) {
    let end = Local::now().date_naive();
    let start = end - chrono::Duration::days(i64::from(days.max(1)) - 1);
    (start, end)
}

pub(crate) fn parse_meal_type(s: Option<&str>) -> Result<MealType> {
    match s {
        Some(v) => MealType::parse(v),
        None => Ok(MealType::Snack),
    }
}

/// Current local time as "HH:MM".
pub(crate) fn current_time() -> String {
    Local::now().format("%H:%M").to_string()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(None).unwrap(), today);
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_last_days_range() {
        let (start, end) = last_days_range(7);
        assert_eq!((end - start).num_days(), 6);

        let (start, end) = last_days_range(1);
        assert_eq!(start, end);
    }

    #[test]
    fn test_parse_meal_type_default() {
        assert_eq!(parse_meal_type(None).unwrap(), MealType::Snack);
        assert_eq!(parse_meal_type(Some("lunch")).unwrap(), MealType::Lunch);
        assert!(parse_meal_type(Some("brunch")).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        // Should not panic on multi-byte characters
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }

    #[test]
    fn test_current_time_format() {
        let t = current_time();
        assert_eq!(t.len(), 5);
        assert_eq!(&t[2..3], ":");
    }
}
