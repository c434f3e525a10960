use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::models::NewMeal;
use nosh_core::service::NoshService;

use super::helpers::{current_time, parse_date, parse_meal_type, truncate};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_meal_add(
    service: &NoshService,
    name: &str,
    unit: &str,
    calories: f64,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    tags: Vec<String>,
    json: bool,
) -> Result<()> {
    let meal = service.add_meal(&NewMeal {
        name: name.to_string(),
        unit: unit.to_string(),
        calories,
        protein,
        carbs,
        fat,
        tags,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &meal.name;
        let cal = meal.calories;
        let unit = &meal.unit;
        println!("Saved meal '{name}' — {cal:.0} kcal per {unit}");
    }
    Ok(())
}

pub(crate) fn cmd_meal_list(service: &NoshService, tag: Option<&str>, json: bool) -> Result<()> {
    let meals = service.list_meals(tag)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
        return Ok(());
    }

    if meals.is_empty() {
        eprintln!("No meals saved. Use `nosh meal add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct MealRow {
        #[tabled(rename = "")]
        fav: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<MealRow> = meals
        .iter()
        .map(|m| MealRow {
            fav: if m.is_favorite { "★".to_string() } else { String::new() },
            name: truncate(&m.name, 30),
            unit: m.unit.clone(),
            calories: format!("{:.0}", m.calories),
            protein: m.protein.map_or("-".into(), |v| format!("{v:.1}g")),
            carbs: m.carbs.map_or("-".into(), |v| format!("{v:.1}g")),
            fat: m.fat.map_or("-".into(), |v| format!("{v:.1}g")),
            tags: m.tags.join(", "),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) fn cmd_meal_log(
    service: &NoshService,
    name: &str,
    amount: f64,
    meal: Option<String>,
    date: Option<String>,
    time: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type = parse_meal_type(meal.as_deref())?;
    let date = parse_date(date)?.format("%Y-%m-%d").to_string();
    let time = time.unwrap_or_else(current_time);

    let entry = service.log_meal(name, amount, meal_type, &date, &time)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let id = entry.id;
        let name = &entry.food_name;
        let cal = entry.calories;
        let amount = entry.amount;
        let unit = &entry.unit;
        println!("[{id}] Logged {amount} {unit} of {name} — {cal:.0} kcal");
    }
    Ok(())
}

pub(crate) fn cmd_meal_favorite(
    service: &NoshService,
    name: &str,
    unset: bool,
    json: bool,
) -> Result<()> {
    let meal = service.set_meal_favorite(name, !unset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &meal.name;
        if meal.is_favorite {
            println!("Marked '{name}' as favorite");
        } else {
            println!("Removed '{name}' from favorites");
        }
    }
    Ok(())
}

pub(crate) fn cmd_meal_delete(service: &NoshService, name: &str, json: bool) -> Result<()> {
    let deleted = service.delete_meal(name)?;
    if !deleted {
        anyhow::bail!("No meal named '{name}'");
    }

    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted meal '{name}' (logged entries keep their values)");
    }
    Ok(())
}
