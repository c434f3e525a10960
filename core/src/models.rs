use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Meal categories. Closed set: anything else is rejected at the boundary
/// (CLI parse, JSON deserialize, DB row load) rather than silently dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            _ => bail!("Invalid meal type '{s}'. Must be one of: breakfast, lunch, dinner, snack"),
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            _ => bail!("Invalid gender '{s}'. Must be 'male' or 'female'"),
        }
    }
}

/// Activity levels for TDEE scaling. The multiplier table lives in
/// `crate::energy` and is the only multiplier source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    Extreme,
}

impl ActivityLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::Extreme => "extreme",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sedentary" => Ok(ActivityLevel::Sedentary),
            "light" => Ok(ActivityLevel::Light),
            "moderate" => Ok(ActivityLevel::Moderate),
            "active" => Ok(ActivityLevel::Active),
            "extreme" => Ok(ActivityLevel::Extreme),
            _ => bail!(
                "Invalid activity level '{s}'. Must be one of: sedentary, light, moderate, active, extreme"
            ),
        }
    }
}

/// A logged food entry. Nutrient values are snapshots computed at log time;
/// editing a meal template later never touches existing entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodLogEntry {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub food_name: String,
    pub meal_type: MealType,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub caffeine: Option<f64>,
    pub amount: f64,
    pub unit: String,
    pub entry_date: NaiveDate,
    pub entry_time: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meal_id: Option<i64>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFoodLogEntry {
    pub food_name: String,
    pub meal_type: MealType,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub caffeine: Option<f64>,
    pub amount: f64,
    pub unit: String,
    pub entry_date: NaiveDate,
    pub entry_time: String,
    pub meal_id: Option<i64>,
}

/// A reusable meal template with per-unit nutrient values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meal {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    pub unit: String,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub name: String,
    pub unit: String,
    pub calories: f64,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub entry_date: NaiveDate,
    pub weight_kg: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewWeightEntry {
    pub entry_date: NaiveDate,
    pub weight_kg: f64,
    pub note: Option<String>,
}

/// User biometrics. Weight/height are stored metric; the CLI converts
/// imperial input before it gets here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i64,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
    /// Desired weekly weight change in lbs, positive = lose.
    pub weekly_goal_lbs: f64,
}

/// Daily nutrition goals. A single row, created lazily with defaults on
/// first read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goals {
    pub calories: i64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Goals {
            calories: 2000,
            protein_g: 150.0,
            carbs_g: 250.0,
            fat_g: 65.0,
        }
    }
}

// --- Export / Import types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub entries: Vec<FoodLogEntry>,
    pub meals: Vec<Meal>,
    pub weight_entries: Vec<WeightEntry>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub goals: Option<Goals>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_field_names)]
pub struct ImportSummary {
    pub entries_imported: i64,
    pub entries_skipped: i64,
    pub meals_imported: i64,
    pub meals_skipped: i64,
    pub weight_entries_imported: i64,
    pub weight_entries_skipped: i64,
    pub profile_imported: bool,
    pub goals_imported: bool,
}

// --- Validation ---

/// Validate an "HH:MM" time-of-day string. The value is display-only but a
/// malformed one should be rejected at input time.
pub fn validate_entry_time(time: &str) -> Result<()> {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map_err(|_| anyhow::anyhow!("Invalid time '{time}'. Must be HH:MM"))?;
    Ok(())
}

/// Validate a new log entry: name, non-negative nutrients, positive amount,
/// well-formed time.
pub fn validate_log_entry(entry: &NewFoodLogEntry) -> Result<()> {
    if entry.food_name.trim().is_empty() {
        bail!("Food name must not be empty");
    }
    if entry.calories < 0.0 {
        bail!("calories must not be negative");
    }
    for (field, value) in [
        ("protein", entry.protein),
        ("carbs", entry.carbs),
        ("fat", entry.fat),
        ("caffeine", entry.caffeine),
    ] {
        if value.is_some_and(|v| v < 0.0) {
            bail!("{field} must not be negative");
        }
    }
    if entry.amount <= 0.0 {
        bail!("amount must be greater than 0");
    }
    if entry.unit.trim().is_empty() {
        bail!("unit must not be empty");
    }
    validate_entry_time(&entry.entry_time)?;
    Ok(())
}

/// Validate a new meal template: name, non-negative per-unit nutrients.
pub fn validate_meal(meal: &NewMeal) -> Result<()> {
    if meal.name.trim().is_empty() {
        bail!("Meal name must not be empty");
    }
    if meal.unit.trim().is_empty() {
        bail!("Meal unit must not be empty");
    }
    if meal.calories < 0.0 {
        bail!("calories must not be negative");
    }
    for (field, value) in [
        ("protein", meal.protein),
        ("carbs", meal.carbs),
        ("fat", meal.fat),
    ] {
        if value.is_some_and(|v| v < 0.0) {
            bail!("{field} must not be negative");
        }
    }
    Ok(())
}

pub fn validate_weight_entry(entry: &NewWeightEntry) -> Result<()> {
    if entry.weight_kg <= 0.0 {
        bail!("weight_kg must be greater than 0");
    }
    Ok(())
}

pub fn validate_profile(profile: &Profile) -> Result<()> {
    if profile.weight_kg <= 0.0 {
        bail!("Profile weight must be greater than 0");
    }
    if profile.height_cm <= 0.0 {
        bail!("Profile height must be greater than 0");
    }
    if profile.age <= 0 {
        bail!("Profile age must be greater than 0");
    }
    Ok(())
}

pub fn validate_goals(goals: &Goals) -> Result<()> {
    if goals.calories <= 0 {
        bail!("Calorie goal must be greater than 0");
    }
    if goals.protein_g < 0.0 || goals.carbs_g < 0.0 || goals.fat_g < 0.0 {
        bail!("Macro goals must not be negative");
    }
    Ok(())
}

/// Validate an imported log entry (JSON import path).
pub fn validate_import_entry(entry: &FoodLogEntry) -> Result<()> {
    if entry.food_name.trim().is_empty() {
        bail!("Food name must not be empty");
    }
    if entry.calories < 0.0 {
        bail!("calories must not be negative");
    }
    if entry.amount <= 0.0 {
        bail!("amount must be greater than 0");
    }
    validate_entry_time(&entry.entry_time)?;
    Ok(())
}
