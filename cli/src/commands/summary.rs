use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::models::MealType;
use nosh_core::service::NoshService;
use nosh_core::stats::Metric;

use super::helpers::{last_days_range, no_neg_zero, parse_date, truncate};

pub(crate) fn cmd_summary(service: &NoshService, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?.format("%Y-%m-%d").to_string();
    let summary = service.daily_summary(&date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    if summary.entries.is_empty() {
        eprintln!("No entries for {date}");
        process::exit(2);
    }

    println!("=== {date} ===\n");

    for meal in MealType::ALL {
        let entries: Vec<_> = summary
            .entries
            .iter()
            .filter(|e| e.meal_type == meal)
            .collect();
        if entries.is_empty() {
            continue;
        }
        let sub_cal = summary.by_meal.get(meal);
        let meal_label = meal.as_str().to_uppercase();
        println!("  {meal_label} ({sub_cal:.0} kcal)");
        for e in entries {
            let id = e.id;
            let name = truncate(&e.food_name, 35);
            let amount = e.amount;
            let unit = &e.unit;
            let amount_display = if amount.fract() == 0.0 {
                format!("{amount:.0} {unit}")
            } else {
                format!("{amount} {unit}")
            };
            let cal = e.calories;
            let protein = e.protein.unwrap_or(0.0);
            let carbs = e.carbs.unwrap_or(0.0);
            let fat = e.fat.unwrap_or(0.0);
            println!(
                "    [{id}] {name} — {amount_display} — {cal:.0} kcal | P:{protein:.0}g C:{carbs:.0}g F:{fat:.0}g"
            );
        }
        println!();
    }

    let total_cal = summary.totals.calories;
    let total_p = summary.totals.protein;
    let total_c = summary.totals.carbs;
    let total_f = summary.totals.fat;
    println!("  TOTAL: {total_cal:.0} kcal | P:{total_p:.0}g C:{total_c:.0}g F:{total_f:.0}g");

    if let Some(goals) = &summary.goals {
        let gcal = goals.calories;
        let gp = goals.protein_g;
        let gc = goals.carbs_g;
        let gf = goals.fat_g;
        println!("  GOAL: {gcal} kcal | P:{gp:.0}g C:{gc:.0}g F:{gf:.0}g");
        #[allow(clippy::cast_precision_loss)]
        let gcal_f = gcal as f64;
        let rcal = gcal_f - total_cal;
        let rp = gp - total_p;
        let rc = gc - total_c;
        let rf = gf - total_f;
        println!("  REMAINING: {rcal:.0} kcal | P:{rp:.0}g C:{rc:.0}g F:{rf:.0}g");
    }

    Ok(())
}

pub(crate) fn cmd_history(service: &NoshService, days: u32, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let (start, end) = last_days_range(days);
    let mut summaries = Vec::new();
    let mut date = end;
    while date >= start {
        let summary = service.daily_summary(&date.format("%Y-%m-%d").to_string())?;
        summaries.push(summary);
        let Some(prev) = date.pred_opt() else { break };
        date = prev;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let rows: Vec<HistoryRow> = summaries
        .iter()
        .map(|s| {
            let cal = no_neg_zero(s.totals.calories);
            let p = no_neg_zero(s.totals.protein);
            let c = no_neg_zero(s.totals.carbs);
            let f = no_neg_zero(s.totals.fat);
            HistoryRow {
                date: s.date.format("%Y-%m-%d").to_string(),
                calories: format!("{cal:.0}"),
                protein: format!("{p:.0}g"),
                carbs: format!("{c:.0}g"),
                fat: format!("{f:.0}g"),
            }
        })
        .collect();

    if rows.iter().all(|r| r.calories == "0") {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

/// Bar chart of a daily metric over the last N days.
pub(crate) fn cmd_chart(
    service: &NoshService,
    days: u32,
    metric: &str,
    json: bool,
) -> Result<()> {
    let metric = Metric::parse(metric)?;
    let (start, end) = last_days_range(days);
    let points = service.series(
        &start.format("%Y-%m-%d").to_string(),
        &end.format("%Y-%m-%d").to_string(),
        metric,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }

    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    if max <= 0.0 {
        eprintln!("No entries in the last {days} days");
        process::exit(2);
    }

    const BAR_WIDTH: f64 = 40.0;
    let name = metric.as_str();
    println!("{name} per day\n");
    for point in &points {
        #[allow(clippy::cast_sign_loss)]
        let len = (point.value / max * BAR_WIDTH).round() as usize;
        let bar = "█".repeat(len);
        let label = &point.label;
        let value = point.value;
        println!("  {label:>6} | {bar} {value:.0}");
    }

    Ok(())
}

/// Average macros over the last N days, complete days only.
pub(crate) fn cmd_stats(service: &NoshService, days: u32, json: bool) -> Result<()> {
    let (start, end) = last_days_range(days);
    let averages = service.range_stats(
        &start.format("%Y-%m-%d").to_string(),
        &end.format("%Y-%m-%d").to_string(),
    )?;

    let Some(avg) = averages else {
        if json {
            println!(
                "{}",
                super::helpers::json_error(&format!(
                    "No fully logged days in the last {days} days"
                ))
            );
        } else {
            eprintln!("No fully logged days in the last {days} days");
        }
        process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&avg)?);
        return Ok(());
    }

    let cal = avg.calories;
    let p = avg.protein;
    let c = avg.carbs;
    let f = avg.fat;
    println!("Daily averages over the last {days} days:");
    println!("  {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    let complete = avg.complete_days;
    let incomplete = avg.incomplete_days;
    println!("  ({complete} fully logged day(s); {incomplete} partial day(s) excluded)");

    Ok(())
}
