use anyhow::{Context, Result};

use nosh_core::models::NewFoodLogEntry;
use nosh_core::service::{MealVisionProvider, NoshService};

use super::helpers::{current_time, parse_date, parse_meal_type};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_log(
    service: &NoshService,
    food: &str,
    calories: f64,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    caffeine: Option<f64>,
    amount: f64,
    unit: Option<String>,
    meal: Option<String>,
    date: Option<String>,
    time: Option<String>,
    json: bool,
) -> Result<()> {
    let entry = NewFoodLogEntry {
        food_name: food.to_string(),
        meal_type: parse_meal_type(meal.as_deref())?,
        calories,
        protein,
        carbs,
        fat,
        caffeine,
        amount,
        unit: unit.unwrap_or_else(|| "serving".to_string()),
        entry_date: parse_date(date)?,
        entry_time: time.unwrap_or_else(current_time),
        meal_id: None,
    };
    let logged = service.log(&entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logged)?);
    } else {
        let meal = logged.meal_type;
        let cal = logged.calories;
        let name = &logged.food_name;
        let id = logged.id;
        println!("[{id}] Logged {name} — {cal:.0} kcal ({meal})");
    }
    Ok(())
}

pub(crate) fn cmd_delete(service: &NoshService, entry_id: i64, json: bool) -> Result<()> {
    let deleted = service.delete_entry(entry_id)?;
    if !deleted {
        anyhow::bail!("No entry with id {entry_id}");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": entry_id }));
    } else {
        println!("Deleted entry {entry_id}");
    }
    Ok(())
}

/// Log a meal from photos via the vision provider.
pub(crate) fn cmd_snap(
    service: &NoshService,
    provider: &dyn MealVisionProvider,
    photos: &[std::path::PathBuf],
    meal: Option<String>,
    date: Option<String>,
    time: Option<String>,
    json: bool,
) -> Result<()> {
    let mut images = Vec::with_capacity(photos.len());
    for path in photos {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read photo: {}", path.display()))?;
        images.push(bytes);
    }

    let meal_type = parse_meal_type(meal.as_deref())?;
    let date = parse_date(date)?.format("%Y-%m-%d").to_string();
    let time = time.unwrap_or_else(current_time);

    eprintln!("Analyzing {} photo(s)...", images.len());
    let logged = service.log_from_photos(provider, &images, meal_type, &date, &time)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&logged)?);
        return Ok(());
    }

    println!("Logged {} item(s):", logged.len());
    for entry in &logged {
        let id = entry.id;
        let name = &entry.food_name;
        let cal = entry.calories;
        let p = entry.protein.unwrap_or(0.0);
        let c = entry.carbs.unwrap_or(0.0);
        let f = entry.fat.unwrap_or(0.0);
        println!("  [{id}] {name} — {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    }
    println!("Estimates only. Use 'nosh delete <id>' to remove a wrong guess.");
    Ok(())
}
