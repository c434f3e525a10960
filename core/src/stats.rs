//! Aggregation over food-log entries: macro totals, per-meal calorie
//! buckets, zero-filled daily series, and range averages.
//!
//! Everything here is a pure function over already-fetched slices. Callers
//! pass data in explicitly; nothing reaches into the database or any other
//! ambient state.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{FoodLogEntry, Goals, MealType};

/// Minimum logged calories for a day to count as fully logged. Days below
/// this are excluded from range averages (treated as incomplete logging,
/// not as genuine zero-calorie days).
pub const COMPLETE_DAY_KCAL: f64 = 1200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    pub const ZERO: MacroTotals = MacroTotals {
        calories: 0.0,
        protein: 0.0,
        carbs: 0.0,
        fat: 0.0,
    };
}

/// Sum calories and macros across entries. Missing macro values count as 0;
/// an empty slice yields all zeros.
#[must_use]
pub fn sum_macros(entries: &[FoodLogEntry]) -> MacroTotals {
    entries.iter().fold(MacroTotals::ZERO, |acc, e| MacroTotals {
        calories: acc.calories + e.calories,
        protein: acc.protein + e.protein.unwrap_or(0.0),
        carbs: acc.carbs + e.carbs.unwrap_or(0.0),
        fat: acc.fat + e.fat.unwrap_or(0.0),
    })
}

/// Calorie subtotals per meal category, fixed shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MealCalories {
    pub breakfast: f64,
    pub lunch: f64,
    pub dinner: f64,
    pub snack: f64,
}

impl MealCalories {
    #[must_use]
    pub fn get(&self, meal: MealType) -> f64 {
        match meal {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
            MealType::Snack => self.snack,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.breakfast + self.lunch + self.dinner + self.snack
    }
}

/// Bucket calories by meal type. `MealType` is a closed enum, so the four
/// buckets are exhaustive and their sum always equals the grand total.
#[must_use]
pub fn calories_by_meal(entries: &[FoodLogEntry]) -> MealCalories {
    let mut buckets = MealCalories {
        breakfast: 0.0,
        lunch: 0.0,
        dinner: 0.0,
        snack: 0.0,
    };
    for e in entries {
        match e.meal_type {
            MealType::Breakfast => buckets.breakfast += e.calories,
            MealType::Lunch => buckets.lunch += e.calories,
            MealType::Dinner => buckets.dinner += e.calories,
            MealType::Snack => buckets.snack += e.calories,
        }
    }
    buckets
}

/// Which numeric field a daily series aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Calories,
    Protein,
    Carbs,
    Fat,
    Caffeine,
}

impl Metric {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Calories => "calories",
            Metric::Protein => "protein",
            Metric::Carbs => "carbs",
            Metric::Fat => "fat",
            Metric::Caffeine => "caffeine",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "calories" | "kcal" => Ok(Metric::Calories),
            "protein" => Ok(Metric::Protein),
            "carbs" => Ok(Metric::Carbs),
            "fat" => Ok(Metric::Fat),
            "caffeine" => Ok(Metric::Caffeine),
            _ => bail!(
                "Invalid metric '{s}'. Must be one of: calories, protein, carbs, fat, caffeine"
            ),
        }
    }

    fn of(self, entry: &FoodLogEntry) -> f64 {
        match self {
            Metric::Calories => entry.calories,
            Metric::Protein => entry.protein.unwrap_or(0.0),
            Metric::Carbs => entry.carbs.unwrap_or(0.0),
            Metric::Fat => entry.fat.unwrap_or(0.0),
            Metric::Caffeine => entry.caffeine.unwrap_or(0.0),
        }
    }
}

/// One aggregated point per calendar day, for charting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPoint {
    pub date: NaiveDate,
    pub label: String,
    pub value: f64,
}

/// Aggregate `metric` into one point per calendar day over the closed
/// interval `[start, end]`, in chronological order. Days with no entries get
/// a 0 point rather than being omitted. Days are enumerated by calendar-day
/// increment, so DST transitions cannot skew the bucket boundaries.
pub fn daily_series(
    start: NaiveDate,
    end: NaiveDate,
    entries: &[FoodLogEntry],
    metric: Metric,
) -> Result<Vec<DayPoint>> {
    if start > end {
        bail!(
            "Invalid range: start {start} is after end {end}",
            start = start.format("%Y-%m-%d"),
            end = end.format("%Y-%m-%d")
        );
    }

    let mut points = Vec::new();
    let mut day = start;
    loop {
        let value: f64 = entries
            .iter()
            .filter(|e| e.entry_date == day)
            .map(|e| metric.of(e))
            .sum();
        points.push(DayPoint {
            date: day,
            label: day.format("%b %-d").to_string(),
            value,
        });
        if day == end {
            break;
        }
        day = day
            .succ_opt()
            .ok_or_else(|| anyhow::anyhow!("Date overflow past {day}"))?;
    }
    Ok(points)
}

/// Average macro intake over a date range, counting only complete days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RangeAverages {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub complete_days: i64,
    pub incomplete_days: i64,
}

/// Average daily macro intake over `[start, end]`.
///
/// Days are partitioned into complete (total calories >= threshold) and
/// incomplete; the average denominator is the complete-day count only, so
/// half-logged days don't drag the averages down. Returns `None` when no
/// day in the range is complete — callers must handle the absence instead
/// of receiving NaN.
pub fn average_macros(
    start: NaiveDate,
    end: NaiveDate,
    entries: &[FoodLogEntry],
    threshold: f64,
) -> Result<Option<RangeAverages>> {
    if start > end {
        bail!(
            "Invalid range: start {start} is after end {end}",
            start = start.format("%Y-%m-%d"),
            end = end.format("%Y-%m-%d")
        );
    }

    let mut sum = MacroTotals::ZERO;
    let mut complete_days: i64 = 0;
    let mut incomplete_days: i64 = 0;

    let mut day = start;
    loop {
        let day_entries: Vec<&FoodLogEntry> =
            entries.iter().filter(|e| e.entry_date == day).collect();
        let day_totals = day_entries
            .iter()
            .fold(MacroTotals::ZERO, |acc, e| MacroTotals {
                calories: acc.calories + e.calories,
                protein: acc.protein + e.protein.unwrap_or(0.0),
                carbs: acc.carbs + e.carbs.unwrap_or(0.0),
                fat: acc.fat + e.fat.unwrap_or(0.0),
            });

        if day_totals.calories >= threshold {
            complete_days += 1;
            sum.calories += day_totals.calories;
            sum.protein += day_totals.protein;
            sum.carbs += day_totals.carbs;
            sum.fat += day_totals.fat;
        } else {
            incomplete_days += 1;
        }

        if day == end {
            break;
        }
        day = day
            .succ_opt()
            .ok_or_else(|| anyhow::anyhow!("Date overflow past {day}"))?;
    }

    if complete_days == 0 {
        return Ok(None);
    }

    #[allow(clippy::cast_precision_loss)]
    let n = complete_days as f64;
    Ok(Some(RangeAverages {
        calories: sum.calories / n,
        protein: sum.protein / n,
        carbs: sum.carbs / n,
        fat: sum.fat / n,
        complete_days,
        incomplete_days,
    }))
}

/// A full day: entries grouped by meal, totals, and the active goals.
#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entries: Vec<FoodLogEntry>,
    pub by_meal: MealCalories,
    pub totals: MacroTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<Goals>,
}

#[must_use]
pub fn day_summary(date: NaiveDate, entries: Vec<FoodLogEntry>, goals: Option<Goals>) -> DaySummary {
    let by_meal = calories_by_meal(&entries);
    let totals = sum_macros(&entries);
    DaySummary {
        date,
        entries,
        by_meal,
        totals,
        goals,
    }
}
