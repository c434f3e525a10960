use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::csv_import::{self, CsvImportSummary};
use crate::db::Database;
use crate::energy::{self, EnergyTargets};
use crate::models::{
    ExportData, FoodLogEntry, Goals, ImportSummary, Meal, MealType, NewFoodLogEntry, NewMeal,
    NewWeightEntry, Profile, WeightEntry, validate_goals, validate_log_entry, validate_meal,
    validate_profile, validate_weight_entry,
};
use crate::progress::{self, WeightTrend};
use crate::stats::{self, DayPoint, DaySummary, Metric, RangeAverages};
use crate::vision::{self, MealGuess};

/// Meal-photo analysis provider.
///
/// The CLI implements this with reqwest against an OpenAI-compatible
/// endpoint. `analyze` blocks; callers already inside a runtime must
/// drive it from a blocking task, never from an async worker thread.
pub trait MealVisionProvider: Send + Sync {
    /// Analyze 1-3 photos of a meal and return guessed food items.
    fn analyze(&self, images: &[Vec<u8>]) -> Result<Vec<MealGuess>>;
}

pub struct NoshService {
    db: Database,
}

impl NoshService {
    pub fn new(db_path: &str) -> Result<Self> {
        let db = Database::open(Path::new(db_path))?;
        Ok(Self { db })
    }

    pub fn new_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db })
    }

    // --- Food log ---

    pub fn log(&self, entry: &NewFoodLogEntry) -> Result<FoodLogEntry> {
        validate_log_entry(entry)?;
        self.db.insert_log_entry(entry)
    }

    pub fn get_entry(&self, id: i64) -> Result<FoodLogEntry> {
        self.db.get_log_entry(id)
    }

    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        self.db.delete_log_entry(id)
    }

    pub fn daily_summary(&self, date: &str) -> Result<DaySummary> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        let entries = self.db.entries_for_date(date)?;
        let goals = Some(self.db.get_goals()?);
        Ok(stats::day_summary(date, entries, goals))
    }

    /// One aggregated point per day over `[start, end]`, zero-filled.
    pub fn series(&self, start: &str, end: &str, metric: Metric) -> Result<Vec<DayPoint>> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
        let entries = self.db.entries_in_range(start, end)?;
        stats::daily_series(start, end, &entries, metric)
    }

    /// Complete-day macro averages over `[start, end]`. `None` when no day
    /// in the range reaches the completeness threshold.
    pub fn range_stats(&self, start: &str, end: &str) -> Result<Option<RangeAverages>> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")?;
        let entries = self.db.entries_in_range(start, end)?;
        stats::average_macros(start, end, &entries, stats::COMPLETE_DAY_KCAL)
    }

    // --- Energy ---

    pub fn energy(&self) -> Result<EnergyTargets> {
        let profile = self
            .db
            .get_profile()?
            .context("No profile set. Run 'nosh profile set' first")?;
        energy::energy_targets(&profile)
    }

    // --- Weight ---

    pub fn log_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        validate_weight_entry(entry)?;
        self.db.upsert_weight(entry)
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        self.db.get_weight(date)
    }

    pub fn weight_history(&self, days: Option<i64>) -> Result<Vec<WeightEntry>> {
        self.db.weight_history(days)
    }

    pub fn delete_weight(&self, date: NaiveDate) -> Result<bool> {
        self.db.delete_weight(date)
    }

    /// Trend over entries dated within the last `days` days (all entries
    /// when `None`). `None` result means fewer than two entries in the
    /// window.
    pub fn weight_trend(&self, days: Option<i64>) -> Result<Option<WeightTrend>> {
        let history = self.db.weight_history(days)?;
        Ok(progress::weight_trend(&history))
    }

    // --- Profile and goals ---

    pub fn set_profile(&self, profile: &Profile) -> Result<()> {
        validate_profile(profile)?;
        self.db.set_profile(profile)
    }

    pub fn get_profile(&self) -> Result<Option<Profile>> {
        self.db.get_profile()
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<()> {
        validate_goals(goals)?;
        self.db.set_goals(goals)
    }

    pub fn get_goals(&self) -> Result<Goals> {
        self.db.get_goals()
    }

    pub fn clear_goals(&self) -> Result<bool> {
        self.db.clear_goals()
    }

    // --- Meal templates ---

    pub fn add_meal(&self, meal: &NewMeal) -> Result<Meal> {
        validate_meal(meal)?;
        self.db.insert_meal(meal)
    }

    pub fn get_meal_by_name(&self, name: &str) -> Result<Option<Meal>> {
        self.db.get_meal_by_name(name)
    }

    pub fn list_meals(&self, tag: Option<&str>) -> Result<Vec<Meal>> {
        self.db.list_meals(tag)
    }

    pub fn set_meal_favorite(&self, name: &str, favorite: bool) -> Result<Meal> {
        let meal = self
            .db
            .get_meal_by_name(name)?
            .with_context(|| format!("No meal named '{name}'"))?;
        self.db.set_meal_favorite(meal.id, favorite)
    }

    pub fn delete_meal(&self, name: &str) -> Result<bool> {
        let Some(meal) = self.db.get_meal_by_name(name)? else {
            return Ok(false);
        };
        self.db.delete_meal(meal.id)
    }

    /// Log a template at `amount` units. The entry snapshots `amount` times
    /// the template's per-unit values; later template edits never touch it.
    pub fn log_meal(
        &self,
        name: &str,
        amount: f64,
        meal_type: MealType,
        date: &str,
        time: &str,
    ) -> Result<FoodLogEntry> {
        if amount <= 0.0 {
            bail!("Amount must be positive");
        }
        let meal = self
            .db
            .get_meal_by_name(name)?
            .with_context(|| format!("No meal named '{name}'"))?;
        let entry_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        let entry = NewFoodLogEntry {
            food_name: meal.name.clone(),
            meal_type,
            calories: meal.calories * amount,
            protein: meal.protein.map(|v| v * amount),
            carbs: meal.carbs.map(|v| v * amount),
            fat: meal.fat.map(|v| v * amount),
            caffeine: None,
            amount,
            unit: meal.unit.clone(),
            entry_date,
            entry_time: time.to_string(),
            meal_id: Some(meal.id),
        };
        self.log(&entry)
    }

    // --- Photo analysis ---

    /// Analyze meal photos and log the guessed items.
    ///
    /// Returns the logged entries. The provider's output is type-coerced
    /// but otherwise untrusted; entries can be deleted afterwards.
    pub fn log_from_photos(
        &self,
        provider: &dyn MealVisionProvider,
        images: &[Vec<u8>],
        meal_type: MealType,
        date: &str,
        time: &str,
    ) -> Result<Vec<FoodLogEntry>> {
        vision::validate_photos(images)?;
        let entry_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")?;
        let guesses = provider.analyze(images)?;
        if guesses.is_empty() {
            bail!("No food items recognized in the photo");
        }
        let mut logged = Vec::with_capacity(guesses.len());
        for guess in &guesses {
            let entry = vision::guess_to_entry(guess, meal_type, entry_date, time)?;
            logged.push(self.log(&entry)?);
        }
        Ok(logged)
    }

    // --- Import / export ---

    pub fn import_csv(&self, csv_data: &str, dry_run: bool) -> Result<CsvImportSummary> {
        let rows = csv_import::parse_log_csv(csv_data.as_bytes())?;
        csv_import::import_log_rows(&self.db, &rows, dry_run)
    }

    pub fn export_all(&self) -> Result<ExportData> {
        self.db.export_all()
    }

    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        self.db.import_all(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Gender};

    struct MockProvider {
        guesses: Vec<MealGuess>,
    }

    impl MealVisionProvider for MockProvider {
        fn analyze(&self, _images: &[Vec<u8>]) -> Result<Vec<MealGuess>> {
            Ok(self.guesses.clone())
        }
    }

    fn sample_entry() -> NewFoodLogEntry {
        NewFoodLogEntry {
            food_name: "Oatmeal".to_string(),
            meal_type: MealType::Breakfast,
            calories: 300.0,
            protein: Some(10.0),
            carbs: Some(54.0),
            fat: Some(5.0),
            caffeine: None,
            amount: 1.0,
            unit: "bowl".to_string(),
            entry_date: NaiveDate::parse_from_str("2024-01-15", "%Y-%m-%d").unwrap(),
            entry_time: "08:00".to_string(),
            meal_id: None,
        }
    }

    #[test]
    fn test_log_and_daily_summary() {
        let service = NoshService::new_in_memory().unwrap();
        service.log(&sample_entry()).unwrap();

        let summary = service.daily_summary("2024-01-15").unwrap();
        assert_eq!(summary.entries.len(), 1);
        assert!((summary.totals.calories - 300.0).abs() < f64::EPSILON);
        assert!((summary.by_meal.breakfast - 300.0).abs() < f64::EPSILON);
        assert_eq!(summary.goals.as_ref().unwrap().calories, 2000);
    }

    #[test]
    fn test_log_rejects_invalid_entry() {
        let service = NoshService::new_in_memory().unwrap();
        let mut bad = sample_entry();
        bad.calories = -10.0;
        assert!(service.log(&bad).is_err());
    }

    #[test]
    fn test_series_zero_fills() {
        let service = NoshService::new_in_memory().unwrap();
        service.log(&sample_entry()).unwrap();

        let points = service
            .series("2024-01-14", "2024-01-16", Metric::Calories)
            .unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0].value - 0.0).abs() < f64::EPSILON);
        assert!((points[1].value - 300.0).abs() < f64::EPSILON);
        assert!((points[2].value - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_range_stats_none_without_complete_days() {
        let service = NoshService::new_in_memory().unwrap();
        // 300 kcal is below the completeness threshold
        service.log(&sample_entry()).unwrap();
        let avg = service.range_stats("2024-01-15", "2024-01-15").unwrap();
        assert!(avg.is_none());
    }

    #[test]
    fn test_energy_requires_profile() {
        let service = NoshService::new_in_memory().unwrap();
        let err = service.energy().unwrap_err();
        assert!(err.to_string().contains("No profile set"));

        service
            .set_profile(&Profile {
                weight_kg: 80.0,
                height_cm: 180.0,
                age: 30,
                gender: Gender::Male,
                activity_level: ActivityLevel::Sedentary,
                weekly_goal_lbs: 0.0,
            })
            .unwrap();
        let targets = service.energy().unwrap();
        assert!((targets.bmr - 1780.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weight_trend_through_service() {
        let service = NoshService::new_in_memory().unwrap();
        assert!(service.weight_trend(None).unwrap().is_none());

        for (day, kg) in [("2024-01-01", 86.2), ("2024-01-10", 81.6)] {
            service
                .log_weight(&NewWeightEntry {
                    entry_date: NaiveDate::parse_from_str(day, "%Y-%m-%d").unwrap(),
                    weight_kg: kg,
                    note: None,
                })
                .unwrap();
        }

        let trend = service.weight_trend(None).unwrap().unwrap();
        assert!((trend.total_change_kg - 4.6).abs() < 1e-9);
        assert_eq!(trend.days_tracked, 9);
    }

    #[test]
    fn test_log_meal_snapshots_template() {
        let service = NoshService::new_in_memory().unwrap();
        service
            .add_meal(&NewMeal {
                name: "Protein Shake".to_string(),
                unit: "shake".to_string(),
                calories: 220.0,
                protein: Some(30.0),
                carbs: Some(12.0),
                fat: Some(4.0),
                tags: vec![],
            })
            .unwrap();

        let entry = service
            .log_meal("protein shake", 2.0, MealType::Snack, "2024-01-15", "15:00")
            .unwrap();
        assert!((entry.calories - 440.0).abs() < f64::EPSILON);
        assert_eq!(entry.protein, Some(60.0));
        assert!(entry.meal_id.is_some());

        // Deleting the template leaves the logged snapshot intact
        assert!(service.delete_meal("Protein Shake").unwrap());
        let fetched = service.get_entry(entry.id).unwrap();
        assert!((fetched.calories - 440.0).abs() < f64::EPSILON);
        assert_eq!(fetched.meal_id, None);
    }

    #[test]
    fn test_log_meal_unknown_name() {
        let service = NoshService::new_in_memory().unwrap();
        let err = service
            .log_meal("nothing", 1.0, MealType::Lunch, "2024-01-15", "12:00")
            .unwrap_err();
        assert!(err.to_string().contains("No meal named"));
    }

    #[test]
    fn test_log_from_photos() {
        let service = NoshService::new_in_memory().unwrap();
        let provider = MockProvider {
            guesses: vec![
                MealGuess {
                    name: "Pizza Slice".to_string(),
                    calories: 285.0,
                    protein: Some(12.0),
                    carbs: Some(36.0),
                    fat: Some(10.0),
                    amount: Some(2.0),
                    unit: Some("slice".to_string()),
                },
                MealGuess {
                    name: "Side Salad".to_string(),
                    calories: 80.0,
                    protein: None,
                    carbs: None,
                    fat: None,
                    amount: None,
                    unit: None,
                },
            ],
        };

        let logged = service
            .log_from_photos(
                &provider,
                &[vec![0xFF, 0xD8]],
                MealType::Dinner,
                "2024-01-15",
                "19:00",
            )
            .unwrap();
        assert_eq!(logged.len(), 2);
        assert_eq!(logged[0].food_name, "Pizza Slice");
        assert_eq!(logged[1].unit, "serving");

        let summary = service.daily_summary("2024-01-15").unwrap();
        assert!((summary.by_meal.dinner - 365.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_from_photos_rejects_empty_batch() {
        let service = NoshService::new_in_memory().unwrap();
        let provider = MockProvider { guesses: vec![] };
        assert!(
            service
                .log_from_photos(&provider, &[], MealType::Lunch, "2024-01-15", "12:00")
                .is_err()
        );
    }

    #[test]
    fn test_log_from_photos_no_items_recognized() {
        let service = NoshService::new_in_memory().unwrap();
        let provider = MockProvider { guesses: vec![] };
        let err = service
            .log_from_photos(&provider, &[vec![1]], MealType::Lunch, "2024-01-15", "12:00")
            .unwrap_err();
        assert!(err.to_string().contains("No food items recognized"));
    }

    #[test]
    fn test_import_csv_through_service() {
        let service = NoshService::new_in_memory().unwrap();
        let csv = "\
Date,Meal,Food Name,Calories,Protein (g),Carbs (g),Fat (g),Amount,Unit
2024-01-15,Breakfast,Oatmeal,150,5,27,3,1,bowl
";
        let summary = service.import_csv(csv, false).unwrap();
        assert_eq!(summary.entries_logged, 1);

        let day = service.daily_summary("2024-01-15").unwrap();
        assert_eq!(day.entries.len(), 1);
    }
}
