use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nosh_core::energy::{KG_PER_LB, LBS_PER_KG};
use nosh_core::models::NewWeightEntry;
use nosh_core::service::NoshService;

use super::helpers::{no_neg_zero, parse_date};

pub(crate) fn cmd_weight_log(
    service: &NoshService,
    value: f64,
    unit: &str,
    date: Option<String>,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    if value <= 0.0 {
        bail!("Weight must be greater than 0");
    }

    let weight_kg = match unit.to_lowercase().as_str() {
        "kg" => value,
        "lbs" | "lb" => {
            let kg = no_neg_zero(value * KG_PER_LB);
            eprintln!("Converting {value:.1} lbs → {kg:.2} kg");
            kg
        }
        _ => bail!("Invalid unit '{unit}'. Use 'kg' or 'lbs'"),
    };

    let entry = NewWeightEntry {
        entry_date: parse_date(date)?,
        weight_kg,
        note,
    };
    let result = service.log_weight(&entry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let lbs = result.weight_kg * LBS_PER_KG;
        println!(
            "Logged {:.1} kg ({:.1} lbs) for {}",
            result.weight_kg,
            lbs,
            result.entry_date.format("%Y-%m-%d")
        );
        if let Some(ref n) = result.note {
            println!("  Note: {n}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_weight_show(
    service: &NoshService,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let entry = service.get_weight(date)?;

    if let Some(e) = entry {
        if json {
            println!("{}", serde_json::to_string_pretty(&e)?);
        } else {
            let lbs = e.weight_kg * LBS_PER_KG;
            println!(
                "{}: {:.1} kg ({:.1} lbs)",
                e.entry_date.format("%Y-%m-%d"),
                e.weight_kg,
                lbs
            );
            if let Some(ref n) = e.note {
                println!("  Note: {n}");
            }
        }
    } else {
        let date_str = date.format("%Y-%m-%d");
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": format!("No weight entry for {date_str}") })
            );
        } else {
            eprintln!("No weight entry for {date_str}");
        }
    }

    Ok(())
}

pub(crate) fn cmd_weight_history(
    service: &NoshService,
    days: Option<u32>,
    json: bool,
) -> Result<()> {
    let entries = service.weight_history(days.map(i64::from))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No weight entries found. Use `nosh weight log` to record your weight.");
    } else {
        #[derive(Tabled)]
        struct WeightRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Weight (kg)")]
            kg: String,
            #[tabled(rename = "Weight (lbs)")]
            lbs: String,
            #[tabled(rename = "Note")]
            note: String,
        }

        let rows: Vec<WeightRow> = entries
            .iter()
            .map(|e| WeightRow {
                date: e.entry_date.format("%Y-%m-%d").to_string(),
                kg: format!("{:.1}", e.weight_kg),
                lbs: format!("{:.1}", e.weight_kg * LBS_PER_KG),
                note: e.note.clone().unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) fn cmd_weight_trend(
    service: &NoshService,
    days: Option<u32>,
    json: bool,
) -> Result<()> {
    let trend = service.weight_trend(days.map(i64::from))?;

    let Some(t) = trend else {
        let msg = "Not enough data for a trend. Log at least two weight entries.";
        if json {
            println!("{}", super::helpers::json_error(msg));
        } else {
            eprintln!("{msg}");
        }
        std::process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&t)?);
        return Ok(());
    }

    let start = t.start_weight_kg;
    let current = t.current_weight_kg;
    let days_tracked = t.days_tracked;
    println!("{start:.1} kg → {current:.1} kg over {days_tracked} day(s)");

    let change = t.total_change_kg;
    let weekly = t.avg_weekly_change_kg;
    if change >= 0.0 {
        println!("Lost {change:.1} kg ({weekly:.2} kg/week on average)");
    } else {
        let gained = -change;
        let weekly_gain = -weekly;
        println!("Gained {gained:.1} kg ({weekly_gain:.2} kg/week on average)");
    }

    Ok(())
}

pub(crate) fn cmd_weight_delete(
    service: &NoshService,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let deleted = service.delete_weight(date)?;
    let date_str = date.format("%Y-%m-%d");
    if !deleted {
        bail!("No weight entry for {date_str}");
    }

    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": date_str.to_string() })
        );
    } else {
        println!("Deleted weight entry for {date_str}");
    }

    Ok(())
}
