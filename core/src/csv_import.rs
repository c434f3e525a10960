use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::db::Database;
use crate::models::{MealType, NewFoodLogEntry};

/// A single row parsed from a food-log CSV.
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub date: String,
    pub meal: String,
    pub food_name: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

/// Summary of what a CSV import would do / did.
#[derive(Debug, Clone)]
pub struct CsvImportSummary {
    pub rows_parsed: usize,
    pub entries_logged: usize,
    pub dates_spanned: usize,
}

/// Parse a food-log CSV from any reader.
///
/// Expected header:
/// `Date,Meal,Food Name,Calories,Protein (g),Carbs (g),Fat (g),Amount,Unit`
///
/// Columns after Calories are optional.
pub fn parse_log_csv<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let required = ["Date", "Meal", "Food Name", "Calories"];
    for name in &required {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            bail!("Missing required column: {name}");
        }
    }

    // Column index map (case-insensitive)
    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_date = col("Date").context("Missing 'Date' column")?;
    let idx_meal = col("Meal").context("Missing 'Meal' column")?;
    let idx_food = col("Food Name").context("Missing 'Food Name' column")?;
    let idx_cal = col("Calories").context("Missing 'Calories' column")?;
    let idx_protein = col("Protein (g)");
    let idx_carbs = col("Carbs (g)");
    let idx_fat = col("Fat (g)");
    let idx_amount = col("Amount");
    let idx_unit = col("Unit");

    let mut rows = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line_num + 2))?;

        let date = record.get(idx_date).unwrap_or("").trim().to_string();
        let meal = record.get(idx_meal).unwrap_or("").trim().to_string();
        let food_name = record.get(idx_food).unwrap_or("").trim().to_string();

        if date.is_empty() || food_name.is_empty() {
            continue; // skip blank rows
        }

        let parse_opt_f64 = |idx: Option<usize>| -> Option<f64> {
            idx.and_then(|i| record.get(i))
                .and_then(|v| v.trim().parse::<f64>().ok())
        };

        let calories = parse_opt_f64(Some(idx_cal)).unwrap_or(0.0);

        let unit = idx_unit
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        rows.push(CsvRow {
            date,
            meal,
            food_name,
            calories,
            protein: parse_opt_f64(idx_protein),
            carbs: parse_opt_f64(idx_carbs),
            fat: parse_opt_f64(idx_fat),
            amount: parse_opt_f64(idx_amount),
            unit,
        });
    }

    Ok(rows)
}

/// Normalize a CSV meal name to a valid meal type. Anything that is not
/// breakfast/lunch/dinner lands in snack, which also absorbs exporter
/// variants like "Snacks" or "Morning Snack".
#[must_use]
pub fn normalize_meal_type(meal: &str) -> MealType {
    match meal.to_lowercase().as_str() {
        "breakfast" => MealType::Breakfast,
        "lunch" => MealType::Lunch,
        "dinner" => MealType::Dinner,
        _ => MealType::Snack,
    }
}

/// Normalize a CSV date to YYYY-MM-DD format.
fn normalize_date(date: &str) -> Result<String> {
    // Try YYYY-MM-DD first
    if chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() {
        return Ok(date.to_string());
    }
    // Try M/D/YYYY
    if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%m/%d/%Y") {
        return Ok(d.format("%Y-%m-%d").to_string());
    }
    // Try D/M/YYYY
    if let Ok(d) = chrono::NaiveDate::parse_from_str(date, "%d/%m/%Y") {
        return Ok(d.format("%Y-%m-%d").to_string());
    }
    bail!("Cannot parse date: '{date}'")
}

/// Import parsed CSV rows into the food log.
///
/// Returns a `CsvImportSummary`. When `dry_run` is true, no data is written.
pub fn import_log_rows(db: &Database, rows: &[CsvRow], dry_run: bool) -> Result<CsvImportSummary> {
    let mut entries_logged: usize = 0;
    let mut dates: HashSet<String> = HashSet::new();

    for row in rows {
        let date = normalize_date(&row.date)?;
        dates.insert(date.clone());

        if !dry_run {
            let entry_date = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")?;
            db.insert_log_entry(&NewFoodLogEntry {
                food_name: row.food_name.clone(),
                meal_type: normalize_meal_type(&row.meal),
                calories: row.calories,
                protein: row.protein,
                carbs: row.carbs,
                fat: row.fat,
                caffeine: None,
                amount: row.amount.unwrap_or(1.0),
                unit: row.unit.clone().unwrap_or_else(|| "serving".to_string()),
                entry_date,
                entry_time: "12:00".to_string(),
                meal_id: None,
            })?;
        }
        entries_logged += 1;
    }

    Ok(CsvImportSummary {
        rows_parsed: rows.len(),
        entries_logged,
        dates_spanned: dates.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE_CSV: &str = "\
Date,Meal,Food Name,Calories,Protein (g),Carbs (g),Fat (g),Amount,Unit
2024-01-15,Breakfast,Oatmeal,150,5,27,3,1,bowl
2024-01-15,Lunch,Grilled Chicken,165,31,0,3.6,150,g
2024-01-15,Dinner,Salmon Fillet,208,20,0,13,1,fillet
2024-01-16,Breakfast,Greek Yogurt,100,17,6,0.7,1,cup
2024-01-16,Snacks,Almonds,164,6,6.1,14.2,28,g
";

    #[test]
    fn test_parse_log_csv_basic() {
        let rows = parse_log_csv(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(rows.len(), 5);

        assert_eq!(rows[0].date, "2024-01-15");
        assert_eq!(rows[0].meal, "Breakfast");
        assert_eq!(rows[0].food_name, "Oatmeal");
        assert!((rows[0].calories - 150.0).abs() < f64::EPSILON);
        assert!((rows[0].protein.unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((rows[0].amount.unwrap() - 1.0).abs() < f64::EPSILON);
        assert_eq!(rows[0].unit.as_deref(), Some("bowl"));

        assert_eq!(rows[4].food_name, "Almonds");
    }

    #[test]
    fn test_parse_log_csv_missing_required_column() {
        let bad_csv = "Date,Meal,Calories\n2024-01-15,Lunch,100\n";
        let result = parse_log_csv(bad_csv.as_bytes());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Food Name"));
    }

    #[test]
    fn test_parse_log_csv_minimal_columns() {
        let csv = "\
Date,Meal,Food Name,Calories
2024-01-15,Lunch,Chicken,165
";
        let rows = parse_log_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].protein.is_none());
        assert!(rows[0].amount.is_none());
        assert!(rows[0].unit.is_none());
    }

    #[test]
    fn test_parse_log_csv_skips_blank_rows() {
        let csv = "\
Date,Meal,Food Name,Calories
2024-01-15,Lunch,Chicken,165
,,,
2024-01-15,Dinner,Rice,130
";
        let rows = parse_log_csv(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_normalize_meal_type() {
        assert_eq!(normalize_meal_type("Breakfast"), MealType::Breakfast);
        assert_eq!(normalize_meal_type("LUNCH"), MealType::Lunch);
        assert_eq!(normalize_meal_type("dinner"), MealType::Dinner);
        assert_eq!(normalize_meal_type("Snacks"), MealType::Snack);
        assert_eq!(normalize_meal_type("Morning Snack"), MealType::Snack);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-01-15").unwrap(), "2024-01-15");
        assert_eq!(normalize_date("1/15/2024").unwrap(), "2024-01-15");
        assert!(normalize_date("not-a-date").is_err());
    }

    #[test]
    fn test_import_dry_run_writes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let rows = parse_log_csv(SAMPLE_CSV.as_bytes()).unwrap();

        let summary = import_log_rows(&db, &rows, true).unwrap();
        assert_eq!(summary.rows_parsed, 5);
        assert_eq!(summary.entries_logged, 5);
        assert_eq!(summary.dates_spanned, 2);

        let day = NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d").unwrap();
        assert!(db.entries_for_date(day).unwrap().is_empty());
    }

    #[test]
    fn test_import_actual() {
        let db = Database::open_in_memory().unwrap();
        let rows = parse_log_csv(SAMPLE_CSV.as_bytes()).unwrap();

        let summary = import_log_rows(&db, &rows, false).unwrap();
        assert_eq!(summary.entries_logged, 5);

        let day = NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d").unwrap();
        let entries = db.entries_for_date(day).unwrap();
        assert_eq!(entries.len(), 3);
        // Snacks exporter name lands in the snack bucket
        let day2 = NaiveDate::parse_from_str("2024-01-16", "%Y-%m-%d").unwrap();
        let entries2 = db.entries_for_date(day2).unwrap();
        assert!(entries2.iter().any(|e| e.meal_type == MealType::Snack));
    }

    #[test]
    fn test_import_defaults_amount_and_unit() {
        let db = Database::open_in_memory().unwrap();
        let csv = "\
Date,Meal,Food Name,Calories
2024-01-15,Lunch,Chicken,165
";
        let rows = parse_log_csv(csv.as_bytes()).unwrap();
        import_log_rows(&db, &rows, false).unwrap();

        let day = NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d").unwrap();
        let entries = db.entries_for_date(day).unwrap();
        assert!((entries[0].amount - 1.0).abs() < f64::EPSILON);
        assert_eq!(entries[0].unit, "serving");
    }
}
