mod commands;
mod config;
mod server;
mod vision;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_chart, cmd_delete, cmd_energy, cmd_export, cmd_goal_clear, cmd_goal_set, cmd_goal_show,
    cmd_history, cmd_import_csv, cmd_import_json, cmd_log, cmd_meal_add, cmd_meal_delete,
    cmd_meal_favorite, cmd_meal_list, cmd_meal_log, cmd_profile_set, cmd_profile_show, cmd_snap,
    cmd_stats, cmd_summary, cmd_weight_delete, cmd_weight_history, cmd_weight_log, cmd_weight_show,
    cmd_weight_trend,
};
use crate::config::Config;
use crate::vision::VisionClient;
use nosh_core::service::NoshService;

#[derive(Parser)]
#[command(
    name = "nosh",
    version,
    about = "A food diary and calorie tracker CLI",
    long_about = "\n\n  ███╗   ██╗ ██████╗ ███████╗██╗  ██╗
  ████╗  ██║██╔═══██╗██╔════╝██║  ██║
  ██╔██╗ ██║██║   ██║███████╗███████║
  ██║╚██╗██║██║   ██║╚════██║██╔══██║
  ██║ ╚████║╚██████╔╝███████║██║  ██║
  ╚═╝  ╚═══╝ ╚═════╝ ╚══════╝╚═╝  ╚═╝
        every bite, accounted for.

Data is stored in the platform data directory; set NOSH_DATA_DIR to
use a different location.
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a food entry
    Log {
        /// Food name
        food: String,
        /// Calories for this entry
        #[arg(long)]
        calories: f64,
        /// Protein in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs in grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat in grams
        #[arg(long)]
        fat: Option<f64>,
        /// Caffeine in milligrams
        #[arg(long)]
        caffeine: Option<f64>,
        /// Amount eaten
        #[arg(short, long, default_value = "1.0")]
        amount: f64,
        /// Unit for the amount (e.g. serving, bowl, g)
        #[arg(short, long)]
        unit: Option<String>,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long)]
        meal: Option<String>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM, default: now)
        #[arg(long)]
        time: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a meal from one or more photos (AI estimate)
    Snap {
        /// Photo file(s), up to 3
        #[arg(required = true)]
        photos: Vec<std::path::PathBuf>,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long)]
        meal: Option<String>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM, default: now)
        #[arg(long)]
        time: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a log entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily summary (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals for the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw a text chart of a metric over the last N days
    Chart {
        /// Number of days to chart
        #[arg(short, long, default_value = "14")]
        days: u32,
        /// Metric: calories, protein, carbs, fat, caffeine
        #[arg(short, long, default_value = "calories")]
        metric: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show average intake over the last N days
    Stats {
        /// Number of days to average
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show BMR, TDEE, and recommended daily calories
    Energy {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Manage saved meals
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Manage your body profile (used for energy calculations)
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage daily calorie/macro goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Import data from files
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight entry (one per day, re-logging overwrites)
    Log {
        /// Weight value (number)
        value: f64,
        /// Unit: kg or lbs (default: kg)
        #[arg(short, long, default_value = "kg")]
        unit: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight for a specific date (default: today)
    Show {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight history
    History {
        /// Number of days to show (default: all)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight change trend
    Trend {
        /// Restrict to the last N days (default: all entries)
        #[arg(short, long)]
        days: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a weight entry by date
    Delete {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Save a reusable meal
    Add {
        /// Meal name
        name: String,
        /// Unit one serving is measured in (e.g. bowl, plate, serving)
        #[arg(short, long, default_value = "serving")]
        unit: String,
        /// Calories per unit
        #[arg(long)]
        calories: f64,
        /// Protein per unit in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Carbs per unit in grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat per unit in grams
        #[arg(long)]
        fat: Option<f64>,
        /// Tags for filtering (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List saved meals (favorites first)
    List {
        /// Only show meals with this tag
        #[arg(short, long)]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a saved meal to the food diary
    Log {
        /// Meal name
        name: String,
        /// How many units were eaten
        #[arg(short, long, default_value = "1.0")]
        amount: f64,
        /// Meal type: breakfast, lunch, dinner, snack
        #[arg(short, long)]
        meal: Option<String>,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM, default: now)
        #[arg(long)]
        time: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a meal as a favorite (or unmark with --unset)
    Favorite {
        /// Meal name
        name: String,
        /// Remove the favorite mark instead
        #[arg(long)]
        unset: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved meal (logged entries keep their values)
    Delete {
        /// Meal name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Set your body profile
    Set {
        /// Body weight
        #[arg(long)]
        weight: f64,
        /// Weight unit: kg or lbs (default: kg)
        #[arg(long, default_value = "kg")]
        weight_unit: String,
        /// Height
        #[arg(long)]
        height: f64,
        /// Height unit: cm or in (default: cm)
        #[arg(long, default_value = "cm")]
        height_unit: String,
        /// Age in years
        #[arg(long)]
        age: i64,
        /// Gender: male or female
        #[arg(long)]
        gender: String,
        /// Activity level: sedentary, light, moderate, active, extreme
        #[arg(long)]
        activity: String,
        /// Pounds to lose per week (negative to gain, 0 to maintain)
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        weekly_goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show your profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set daily calorie/macro goals
    Set {
        /// Daily calorie goal
        calories: i64,
        /// Daily protein goal in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Daily carbs goal in grams
        #[arg(long)]
        carbs: Option<f64>,
        /// Daily fat goal in grams
        #[arg(long)]
        fat: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset goals to defaults
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import log entries from a CSV export
    Csv {
        /// Path to the CSV file
        file: std::path::PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a full JSON export (merge, existing data wins)
    Json {
        /// Path to the export file
        file: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db_path = config
        .db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Database path is not valid UTF-8"))?;
    let service = NoshService::new(db_path)?;

    match cli.command {
        Commands::Log {
            food,
            calories,
            protein,
            carbs,
            fat,
            caffeine,
            amount,
            unit,
            meal,
            date,
            time,
            json,
        } => cmd_log(
            &service, &food, calories, protein, carbs, fat, caffeine, amount, unit, meal, date,
            time, json,
        ),
        Commands::Snap {
            photos,
            meal,
            date,
            time,
            json,
        } => {
            let client = VisionClient::from_env()?;
            // The provider blocks on the runtime and must not run on an
            // async worker thread.
            tokio::task::spawn_blocking(move || {
                cmd_snap(&service, &client, &photos, meal, date, time, json)
            })
            .await?
        }
        Commands::Delete { entry_id, json } => cmd_delete(&service, entry_id, json),
        Commands::Summary { date, json } => cmd_summary(&service, date, json),
        Commands::History { days, json } => cmd_history(&service, days, json),
        Commands::Chart { days, metric, json } => cmd_chart(&service, days, &metric, json),
        Commands::Stats { days, json } => cmd_stats(&service, days, json),
        Commands::Energy { json } => cmd_energy(&service, json),
        Commands::Weight { command } => match command {
            WeightCommands::Log {
                value,
                unit,
                date,
                note,
                json,
            } => cmd_weight_log(&service, value, &unit, date, note, json),
            WeightCommands::Show { date, json } => cmd_weight_show(&service, date, json),
            WeightCommands::History { days, json } => cmd_weight_history(&service, days, json),
            WeightCommands::Trend { days, json } => cmd_weight_trend(&service, days, json),
            WeightCommands::Delete { date, json } => cmd_weight_delete(&service, date, json),
        },
        Commands::Meal { command } => match command {
            MealCommands::Add {
                name,
                unit,
                calories,
                protein,
                carbs,
                fat,
                tag,
                json,
            } => cmd_meal_add(
                &service, &name, &unit, calories, protein, carbs, fat, tag, json,
            ),
            MealCommands::List { tag, json } => cmd_meal_list(&service, tag.as_deref(), json),
            MealCommands::Log {
                name,
                amount,
                meal,
                date,
                time,
                json,
            } => cmd_meal_log(&service, &name, amount, meal, date, time, json),
            MealCommands::Favorite { name, unset, json } => {
                cmd_meal_favorite(&service, &name, unset, json)
            }
            MealCommands::Delete { name, json } => cmd_meal_delete(&service, &name, json),
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Set {
                weight,
                weight_unit,
                height,
                height_unit,
                age,
                gender,
                activity,
                weekly_goal,
                json,
            } => cmd_profile_set(
                &service,
                weight,
                &weight_unit,
                height,
                &height_unit,
                age,
                &gender,
                &activity,
                weekly_goal,
                json,
            ),
            ProfileCommands::Show { json } => cmd_profile_show(&service, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Set {
                calories,
                protein,
                carbs,
                fat,
                json,
            } => cmd_goal_set(&service, calories, protein, carbs, fat, json),
            GoalCommands::Show { json } => cmd_goal_show(&service, json),
            GoalCommands::Clear { json } => cmd_goal_clear(&service, json),
        },
        Commands::Import { command } => match command {
            ImportCommands::Csv {
                file,
                dry_run,
                json,
            } => cmd_import_csv(&service, &file, dry_run, json),
            ImportCommands::Json { file, json } => cmd_import_json(&service, &file, json),
        },
        Commands::Export { output } => cmd_export(&service, output.as_deref()),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let (key, _new) = config.load_or_create_api_key()?;
                Some(key)
            };
            server::start_server(service, port, &bind, api_key).await
        }
    }
}
