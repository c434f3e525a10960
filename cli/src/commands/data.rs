use std::path::Path;

use anyhow::{Context, Result};

use nosh_core::models::ExportData;
use nosh_core::service::NoshService;

pub(crate) fn cmd_import_csv(
    service: &NoshService,
    file: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let csv_data = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read CSV file: {}", file.display()))?;

    let summary = service.import_csv(&csv_data, dry_run)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "rows_parsed": summary.rows_parsed,
                "entries_logged": summary.entries_logged,
                "dates_spanned": summary.dates_spanned,
                "dry_run": dry_run,
            })
        );
        return Ok(());
    }

    if dry_run {
        println!("Dry run — no changes made:");
    }
    let rows = summary.rows_parsed;
    let entries = summary.entries_logged;
    let dates = summary.dates_spanned;
    println!("  {rows} row(s) parsed");
    println!("  {entries} entr(ies) logged across {dates} day(s)");

    Ok(())
}

pub(crate) fn cmd_import_json(service: &NoshService, file: &Path, json: bool) -> Result<()> {
    let data = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read export file: {}", file.display()))?;
    let export: ExportData =
        serde_json::from_str(&data).context("Failed to parse export file")?;

    let summary = service.import_all(&export)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Import complete:");
    let (ei, es) = (summary.entries_imported, summary.entries_skipped);
    let (mi, ms) = (summary.meals_imported, summary.meals_skipped);
    let (wi, ws) = (
        summary.weight_entries_imported,
        summary.weight_entries_skipped,
    );
    println!("  Log entries:    {ei} imported, {es} skipped");
    println!("  Meals:          {mi} imported, {ms} skipped");
    println!("  Weight entries: {wi} imported, {ws} skipped");
    if summary.profile_imported {
        println!("  Profile imported");
    }
    if summary.goals_imported {
        println!("  Goals imported");
    }

    Ok(())
}

pub(crate) fn cmd_export(service: &NoshService, output: Option<&Path>) -> Result<()> {
    let data = service.export_all()?;
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            let entries = data.entries.len();
            let meals = data.meals.len();
            let weights = data.weight_entries.len();
            eprintln!(
                "Exported {entries} entr(ies), {meals} meal(s), {weights} weight entr(ies) to {}",
                path.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}
