use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::models::{
    ExportData, FoodLogEntry, Goals, ImportSummary, Meal, MealType, NewFoodLogEntry, NewMeal,
    NewWeightEntry, Profile, WeightEntry, validate_import_entry,
};

pub struct Database {
    conn: Connection,
}

fn parse_date_col(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_meal_type_col(idx: usize, s: &str) -> rusqlite::Result<MealType> {
    MealType::parse(s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS food_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    food_name TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL,
                    carbs REAL,
                    fat REAL,
                    caffeine REAL,
                    amount REAL NOT NULL,
                    unit TEXT NOT NULL,
                    entry_date TEXT NOT NULL,
                    entry_time TEXT NOT NULL,
                    meal_id INTEGER REFERENCES meals(id) ON DELETE SET NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS meals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
                    unit TEXT NOT NULL,
                    calories REAL NOT NULL,
                    protein REAL,
                    carbs REAL,
                    fat REAL,
                    tags TEXT NOT NULL DEFAULT '[]',
                    is_favorite INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_entries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    uuid TEXT NOT NULL UNIQUE,
                    entry_date TEXT NOT NULL UNIQUE,
                    weight_kg REAL NOT NULL,
                    note TEXT,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS profile (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    weight_kg REAL NOT NULL,
                    height_cm REAL NOT NULL,
                    age INTEGER NOT NULL,
                    gender TEXT NOT NULL,
                    activity_level TEXT NOT NULL,
                    weekly_goal_lbs REAL NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS goals (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    calories INTEGER NOT NULL,
                    protein_g REAL NOT NULL,
                    carbs_g REAL NOT NULL,
                    fat_g REAL NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_food_log_date ON food_log(entry_date);
                CREATE INDEX IF NOT EXISTS idx_food_log_meal ON food_log(meal_id);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    // Expects columns:
    // 0: id, 1: uuid, 2: food_name, 3: meal_type, 4: calories, 5: protein,
    // 6: carbs, 7: fat, 8: caffeine, 9: amount, 10: unit, 11: entry_date,
    // 12: entry_time, 13: meal_id, 14: created_at
    fn log_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<FoodLogEntry> {
        let date_str: String = row.get(11)?;
        let meal_type_str: String = row.get(3)?;
        Ok(FoodLogEntry {
            id: row.get(0)?,
            uuid: row.get(1)?,
            food_name: row.get(2)?,
            meal_type: parse_meal_type_col(3, &meal_type_str)?,
            calories: row.get(4)?,
            protein: row.get(5)?,
            carbs: row.get(6)?,
            fat: row.get(7)?,
            caffeine: row.get(8)?,
            amount: row.get(9)?,
            unit: row.get(10)?,
            entry_date: parse_date_col(11, &date_str)?,
            entry_time: row.get(12)?,
            meal_id: row.get(13)?,
            created_at: row.get(14)?,
        })
    }

    fn meal_from_row(row: &rusqlite::Row) -> rusqlite::Result<Meal> {
        let tags_json: String = row.get(8)?;
        let tags: Vec<String> = serde_json::from_str(&tags_json).unwrap_or_default();
        Ok(Meal {
            id: row.get(0)?,
            uuid: row.get(1)?,
            name: row.get(2)?,
            unit: row.get(3)?,
            calories: row.get(4)?,
            protein: row.get(5)?,
            carbs: row.get(6)?,
            fat: row.get(7)?,
            tags,
            is_favorite: row.get(9)?,
            created_at: row.get(10)?,
        })
    }

    fn weight_entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<WeightEntry> {
        let date_str: String = row.get(2)?;
        Ok(WeightEntry {
            id: row.get(0)?,
            uuid: row.get(1)?,
            entry_date: parse_date_col(2, &date_str)?,
            weight_kg: row.get(3)?,
            note: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // --- Food log ---

    pub fn insert_log_entry(&self, entry: &NewFoodLogEntry) -> Result<FoodLogEntry> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let date_str = entry.entry_date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO food_log (uuid, food_name, meal_type, calories, protein, carbs, fat,
                                   caffeine, amount, unit, entry_date, entry_time, meal_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                uuid,
                entry.food_name,
                entry.meal_type.as_str(),
                entry.calories,
                entry.protein,
                entry.carbs,
                entry.fat,
                entry.caffeine,
                entry.amount,
                entry.unit,
                date_str,
                entry.entry_time,
                entry.meal_id,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.get_log_entry(id)
    }

    pub fn get_log_entry(&self, id: i64) -> Result<FoodLogEntry> {
        self.conn
            .query_row(
                "SELECT id, uuid, food_name, meal_type, calories, protein, carbs, fat,
                        caffeine, amount, unit, entry_date, entry_time, meal_id, created_at
                 FROM food_log WHERE id = ?1",
                params![id],
                Self::log_entry_from_row,
            )
            .context("Log entry not found")
    }

    pub fn delete_log_entry(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM food_log WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<FoodLogEntry>> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, food_name, meal_type, calories, protein, carbs, fat,
                    caffeine, amount, unit, entry_date, entry_time, meal_id, created_at
             FROM food_log WHERE entry_date = ?1 ORDER BY entry_time, id",
        )?;
        let entries = stmt
            .query_map(params![date_str], Self::log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn entries_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<FoodLogEntry>> {
        let start_str = start.format("%Y-%m-%d").to_string();
        let end_str = end.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, food_name, meal_type, calories, protein, carbs, fat,
                    caffeine, amount, unit, entry_date, entry_time, meal_id, created_at
             FROM food_log WHERE entry_date >= ?1 AND entry_date <= ?2
             ORDER BY entry_date, entry_time, id",
        )?;
        let entries = stmt
            .query_map(params![start_str, end_str], Self::log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // --- Meal templates ---

    pub fn insert_meal(&self, meal: &NewMeal) -> Result<Meal> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let tags_json = serde_json::to_string(&meal.tags)?;
        self.conn
            .execute(
                "INSERT INTO meals (uuid, name, unit, calories, protein, carbs, fat, tags, is_favorite, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
                params![
                    uuid,
                    meal.name,
                    meal.unit,
                    meal.calories,
                    meal.protein,
                    meal.carbs,
                    meal.fat,
                    tags_json,
                    now,
                ],
            )
            .with_context(|| format!("Failed to save meal '{}' (name already taken?)", meal.name))?;
        let id = self.conn.last_insert_rowid();
        self.get_meal_by_id(id)
    }

    pub fn get_meal_by_id(&self, id: i64) -> Result<Meal> {
        self.conn
            .query_row(
                "SELECT id, uuid, name, unit, calories, protein, carbs, fat, tags, is_favorite, created_at
                 FROM meals WHERE id = ?1",
                params![id],
                Self::meal_from_row,
            )
            .context("Meal not found")
    }

    pub fn get_meal_by_name(&self, name: &str) -> Result<Option<Meal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, name, unit, calories, protein, carbs, fat, tags, is_favorite, created_at
             FROM meals WHERE name = ?1 COLLATE NOCASE",
        )?;
        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::meal_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// List meal templates, favorites first, then alphabetical.
    pub fn list_meals(&self, tag: Option<&str>) -> Result<Vec<Meal>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, name, unit, calories, protein, carbs, fat, tags, is_favorite, created_at
             FROM meals ORDER BY is_favorite DESC, name COLLATE NOCASE",
        )?;
        let meals = stmt
            .query_map([], Self::meal_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        match tag {
            Some(t) => Ok(meals
                .into_iter()
                .filter(|m| m.tags.iter().any(|x| x.eq_ignore_ascii_case(t)))
                .collect()),
            None => Ok(meals),
        }
    }

    pub fn set_meal_favorite(&self, id: i64, favorite: bool) -> Result<Meal> {
        self.get_meal_by_id(id)?;
        self.conn.execute(
            "UPDATE meals SET is_favorite = ?1 WHERE id = ?2",
            params![favorite, id],
        )?;
        self.get_meal_by_id(id)
    }

    pub fn delete_meal(&self, id: i64) -> Result<bool> {
        // Past log entries keep their snapshot values; only the back-link
        // is cleared.
        self.conn.execute(
            "UPDATE food_log SET meal_id = NULL WHERE meal_id = ?1",
            params![id],
        )?;
        let rows = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // --- Weight entries ---

    pub fn upsert_weight(&self, entry: &NewWeightEntry) -> Result<WeightEntry> {
        let now = Local::now().to_rfc3339();
        let uuid = Uuid::new_v4().to_string();
        let date_str = entry.entry_date.format("%Y-%m-%d").to_string();
        self.conn.execute(
            "INSERT INTO weight_entries (uuid, entry_date, weight_kg, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(entry_date) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                note = excluded.note",
            params![uuid, date_str, entry.weight_kg, entry.note, now],
        )?;
        self.get_weight(entry.entry_date)?
            .context("Weight entry not found after upsert")
    }

    pub fn get_weight(&self, date: NaiveDate) -> Result<Option<WeightEntry>> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, entry_date, weight_kg, note, created_at
             FROM weight_entries WHERE entry_date = ?1",
        )?;
        let mut rows = stmt.query(params![date_str])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::weight_entry_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// Weight history, newest first. `days` keeps entries dated within the
    /// last N calendar days, today inclusive.
    pub fn weight_history(&self, days: Option<i64>) -> Result<Vec<WeightEntry>> {
        let entries = match days {
            Some(n) => {
                let cutoff = Local::now().date_naive() - chrono::Duration::days(n.max(1) - 1);
                let mut stmt = self.conn.prepare(
                    "SELECT id, uuid, entry_date, weight_kg, note, created_at
                     FROM weight_entries WHERE entry_date >= ?1 ORDER BY entry_date DESC",
                )?;
                stmt.query_map(
                    params![cutoff.format("%Y-%m-%d").to_string()],
                    Self::weight_entry_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, uuid, entry_date, weight_kg, note, created_at
                     FROM weight_entries ORDER BY entry_date DESC",
                )?;
                stmt.query_map([], Self::weight_entry_from_row)?
                    .collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(entries)
    }

    pub fn delete_weight(&self, date: NaiveDate) -> Result<bool> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let rows = self.conn.execute(
            "DELETE FROM weight_entries WHERE entry_date = ?1",
            params![date_str],
        )?;
        Ok(rows > 0)
    }

    // --- Profile ---

    pub fn set_profile(&self, profile: &Profile) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO profile (id, weight_kg, height_cm, age, gender, activity_level, weekly_goal_lbs, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                weight_kg = excluded.weight_kg,
                height_cm = excluded.height_cm,
                age = excluded.age,
                gender = excluded.gender,
                activity_level = excluded.activity_level,
                weekly_goal_lbs = excluded.weekly_goal_lbs,
                updated_at = excluded.updated_at",
            params![
                profile.weight_kg,
                profile.height_cm,
                profile.age,
                profile.gender.as_str(),
                profile.activity_level.as_str(),
                profile.weekly_goal_lbs,
                now,
            ],
        )?;
        Ok(())
    }

    pub fn get_profile(&self) -> Result<Option<Profile>> {
        let mut stmt = self.conn.prepare(
            "SELECT weight_kg, height_cm, age, gender, activity_level, weekly_goal_lbs
             FROM profile WHERE id = 1",
        )?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            let gender_str: String = row.get(3)?;
            let activity_str: String = row.get(4)?;
            let gender = crate::models::Gender::parse(&gender_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
            })?;
            let activity_level = crate::models::ActivityLevel::parse(&activity_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
            })?;
            Ok(Some(Profile {
                weight_kg: row.get(0)?,
                height_cm: row.get(1)?,
                age: row.get(2)?,
                gender,
                activity_level,
                weekly_goal_lbs: row.get(5)?,
            }))
        } else {
            Ok(None)
        }
    }

    // --- Goals ---

    /// Fetch goals, creating the default row on first read.
    pub fn get_goals(&self) -> Result<Goals> {
        let mut stmt = self
            .conn
            .prepare("SELECT calories, protein_g, carbs_g, fat_g FROM goals WHERE id = 1")?;
        let mut rows = stmt.query([])?;
        if let Some(row) = rows.next()? {
            return Ok(Goals {
                calories: row.get(0)?,
                protein_g: row.get(1)?,
                carbs_g: row.get(2)?,
                fat_g: row.get(3)?,
            });
        }
        drop(rows);
        drop(stmt);
        let defaults = Goals::default();
        self.set_goals(&defaults)?;
        Ok(defaults)
    }

    pub fn set_goals(&self, goals: &Goals) -> Result<()> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO goals (id, calories, protein_g, carbs_g, fat_g, updated_at)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                calories = excluded.calories,
                protein_g = excluded.protein_g,
                carbs_g = excluded.carbs_g,
                fat_g = excluded.fat_g,
                updated_at = excluded.updated_at",
            params![goals.calories, goals.protein_g, goals.carbs_g, goals.fat_g, now],
        )?;
        Ok(())
    }

    /// Reset goals to the lazily-created defaults.
    pub fn clear_goals(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM goals WHERE id = 1", [])?;
        Ok(rows > 0)
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> Result<ExportData> {
        let mut stmt = self.conn.prepare(
            "SELECT id, uuid, food_name, meal_type, calories, protein, carbs, fat,
                    caffeine, amount, unit, entry_date, entry_time, meal_id, created_at
             FROM food_log ORDER BY entry_date, entry_time, id",
        )?;
        let entries = stmt
            .query_map([], Self::log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let meals = self.list_meals(None)?;
        let weight_entries = self.weight_history(None)?;
        let profile = self.get_profile()?;
        let goals_row: Option<Goals> = {
            let mut stmt = self
                .conn
                .prepare("SELECT calories, protein_g, carbs_g, fat_g FROM goals WHERE id = 1")?;
            let mut rows = stmt.query([])?;
            if let Some(row) = rows.next()? {
                Some(Goals {
                    calories: row.get(0)?,
                    protein_g: row.get(1)?,
                    carbs_g: row.get(2)?,
                    fat_g: row.get(3)?,
                })
            } else {
                None
            }
        };

        Ok(ExportData {
            version: 1,
            exported_at: Local::now().to_rfc3339(),
            entries,
            meals,
            weight_entries,
            profile,
            goals: goals_row,
        })
    }

    /// Merge an export into this database. Log and weight entries dedup by
    /// uuid, meals by name. Imported log entries drop their `meal_id`
    /// back-link since template ids do not survive the transfer.
    pub fn import_all(&self, data: &ExportData) -> Result<ImportSummary> {
        let mut summary = ImportSummary {
            entries_imported: 0,
            entries_skipped: 0,
            meals_imported: 0,
            meals_skipped: 0,
            weight_entries_imported: 0,
            weight_entries_skipped: 0,
            profile_imported: false,
            goals_imported: false,
        };

        for meal in &data.meals {
            if self.get_meal_by_name(&meal.name)?.is_some() {
                summary.meals_skipped += 1;
                continue;
            }
            self.insert_meal(&NewMeal {
                name: meal.name.clone(),
                unit: meal.unit.clone(),
                calories: meal.calories,
                protein: meal.protein,
                carbs: meal.carbs,
                fat: meal.fat,
                tags: meal.tags.clone(),
            })?;
            summary.meals_imported += 1;
        }

        for entry in &data.entries {
            validate_import_entry(entry)?;
            if !entry.uuid.is_empty() && self.log_entry_uuid_exists(&entry.uuid)? {
                summary.entries_skipped += 1;
                continue;
            }
            let uuid = if entry.uuid.is_empty() {
                Uuid::new_v4().to_string()
            } else {
                entry.uuid.clone()
            };
            let created_at = if entry.created_at.is_empty() {
                Local::now().to_rfc3339()
            } else {
                entry.created_at.clone()
            };
            let date_str = entry.entry_date.format("%Y-%m-%d").to_string();
            self.conn.execute(
                "INSERT INTO food_log (uuid, food_name, meal_type, calories, protein, carbs, fat,
                                       caffeine, amount, unit, entry_date, entry_time, meal_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, NULL, ?13)",
                params![
                    uuid,
                    entry.food_name,
                    entry.meal_type.as_str(),
                    entry.calories,
                    entry.protein,
                    entry.carbs,
                    entry.fat,
                    entry.caffeine,
                    entry.amount,
                    entry.unit,
                    date_str,
                    entry.entry_time,
                    created_at,
                ],
            )?;
            summary.entries_imported += 1;
        }

        for entry in &data.weight_entries {
            if self.get_weight(entry.entry_date)?.is_some() {
                summary.weight_entries_skipped += 1;
                continue;
            }
            self.upsert_weight(&NewWeightEntry {
                entry_date: entry.entry_date,
                weight_kg: entry.weight_kg,
                note: entry.note.clone(),
            })?;
            summary.weight_entries_imported += 1;
        }

        if let Some(profile) = &data.profile {
            if self.get_profile()?.is_none() {
                self.set_profile(profile)?;
                summary.profile_imported = true;
            }
        }
        if let Some(goals) = &data.goals {
            let has_goals: i64 =
                self.conn
                    .query_row("SELECT COUNT(*) FROM goals WHERE id = 1", [], |row| {
                        row.get(0)
                    })?;
            if has_goals == 0 {
                self.set_goals(goals)?;
                summary.goals_imported = true;
            }
        }

        Ok(summary)
    }

    fn log_entry_uuid_exists(&self, uuid: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM food_log WHERE uuid = ?1",
            params![uuid],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Gender};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_entry(date: &str, meal_type: MealType, calories: f64) -> NewFoodLogEntry {
        NewFoodLogEntry {
            food_name: "Oatmeal".to_string(),
            meal_type,
            calories,
            protein: Some(10.0),
            carbs: Some(54.0),
            fat: Some(5.0),
            caffeine: None,
            amount: 1.0,
            unit: "bowl".to_string(),
            entry_date: d(date),
            entry_time: "08:00".to_string(),
            meal_id: None,
        }
    }

    fn sample_meal() -> NewMeal {
        NewMeal {
            name: "Protein Shake".to_string(),
            unit: "shake".to_string(),
            calories: 220.0,
            protein: Some(30.0),
            carbs: Some(12.0),
            fat: Some(4.0),
            tags: vec!["quick".to_string()],
        }
    }

    #[test]
    fn test_insert_and_get_log_entry() {
        let db = Database::open_in_memory().unwrap();
        let entry = db
            .insert_log_entry(&sample_entry("2024-01-15", MealType::Breakfast, 300.0))
            .unwrap();

        assert_eq!(entry.food_name, "Oatmeal");
        assert_eq!(entry.meal_type, MealType::Breakfast);
        assert!(!entry.uuid.is_empty());

        let fetched = db.get_log_entry(entry.id).unwrap();
        assert_eq!(fetched.id, entry.id);
        assert_eq!(fetched.entry_date, d("2024-01-15"));
        assert_eq!(fetched.protein, Some(10.0));
    }

    #[test]
    fn test_delete_log_entry() {
        let db = Database::open_in_memory().unwrap();
        let entry = db
            .insert_log_entry(&sample_entry("2024-01-15", MealType::Lunch, 500.0))
            .unwrap();

        assert!(db.delete_log_entry(entry.id).unwrap());
        assert!(!db.delete_log_entry(entry.id).unwrap());
        assert!(db.get_log_entry(entry.id).is_err());
    }

    #[test]
    fn test_entries_for_date_filters() {
        let db = Database::open_in_memory().unwrap();
        db.insert_log_entry(&sample_entry("2024-01-15", MealType::Breakfast, 300.0))
            .unwrap();
        db.insert_log_entry(&sample_entry("2024-01-15", MealType::Dinner, 700.0))
            .unwrap();
        db.insert_log_entry(&sample_entry("2024-01-16", MealType::Lunch, 450.0))
            .unwrap();

        let entries = db.entries_for_date(d("2024-01-15")).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.entry_date == d("2024-01-15")));
    }

    #[test]
    fn test_entries_in_range_inclusive() {
        let db = Database::open_in_memory().unwrap();
        for day in ["2024-01-14", "2024-01-15", "2024-01-17", "2024-01-18"] {
            db.insert_log_entry(&sample_entry(day, MealType::Lunch, 400.0))
                .unwrap();
        }

        let entries = db.entries_in_range(d("2024-01-15"), d("2024-01-17")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_date, d("2024-01-15"));
        assert_eq!(entries[1].entry_date, d("2024-01-17"));
    }

    #[test]
    fn test_meal_name_unique_case_insensitive() {
        let db = Database::open_in_memory().unwrap();
        db.insert_meal(&sample_meal()).unwrap();

        let mut dup = sample_meal();
        dup.name = "PROTEIN SHAKE".to_string();
        assert!(db.insert_meal(&dup).is_err());

        let found = db.get_meal_by_name("protein shake").unwrap();
        assert!(found.is_some());
    }

    #[test]
    fn test_list_meals_favorites_first() {
        let db = Database::open_in_memory().unwrap();
        let shake = db.insert_meal(&sample_meal()).unwrap();
        db.insert_meal(&NewMeal {
            name: "Avocado Toast".to_string(),
            unit: "slice".to_string(),
            calories: 190.0,
            protein: Some(5.0),
            carbs: Some(20.0),
            fat: Some(11.0),
            tags: vec![],
        })
        .unwrap();

        db.set_meal_favorite(shake.id, true).unwrap();
        let meals = db.list_meals(None).unwrap();
        assert_eq!(meals[0].name, "Protein Shake");
        assert!(meals[0].is_favorite);
    }

    #[test]
    fn test_list_meals_by_tag() {
        let db = Database::open_in_memory().unwrap();
        db.insert_meal(&sample_meal()).unwrap();
        db.insert_meal(&NewMeal {
            name: "Stew".to_string(),
            unit: "bowl".to_string(),
            calories: 420.0,
            protein: Some(25.0),
            carbs: Some(30.0),
            fat: Some(18.0),
            tags: vec!["dinner".to_string()],
        })
        .unwrap();

        let quick = db.list_meals(Some("quick")).unwrap();
        assert_eq!(quick.len(), 1);
        assert_eq!(quick[0].name, "Protein Shake");
    }

    #[test]
    fn test_delete_meal_clears_backlinks() {
        let db = Database::open_in_memory().unwrap();
        let meal = db.insert_meal(&sample_meal()).unwrap();
        let mut new_entry = sample_entry("2024-01-15", MealType::Snack, 220.0);
        new_entry.meal_id = Some(meal.id);
        let entry = db.insert_log_entry(&new_entry).unwrap();
        assert_eq!(entry.meal_id, Some(meal.id));

        assert!(db.delete_meal(meal.id).unwrap());
        let fetched = db.get_log_entry(entry.id).unwrap();
        assert_eq!(fetched.meal_id, None);
        // Snapshot values survive the template's deletion
        assert!((fetched.calories - 220.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_upsert_weight_replaces_same_date() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_weight(&NewWeightEntry {
            entry_date: d("2024-01-15"),
            weight_kg: 80.0,
            note: None,
        })
        .unwrap();
        let updated = db
            .upsert_weight(&NewWeightEntry {
                entry_date: d("2024-01-15"),
                weight_kg: 79.5,
                note: Some("evening".to_string()),
            })
            .unwrap();

        assert!((updated.weight_kg - 79.5).abs() < f64::EPSILON);
        assert_eq!(db.weight_history(None).unwrap().len(), 1);
    }

    #[test]
    fn test_weight_history_newest_first() {
        let db = Database::open_in_memory().unwrap();
        for (day, kg) in [("2024-01-01", 82.0), ("2024-01-08", 81.2), ("2024-01-15", 80.5)] {
            db.upsert_weight(&NewWeightEntry {
                entry_date: d(day),
                weight_kg: kg,
                note: None,
            })
            .unwrap();
        }

        let history = db.weight_history(None).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].entry_date, d("2024-01-15"));
    }

    #[test]
    fn test_weight_history_days_is_a_date_window() {
        let db = Database::open_in_memory().unwrap();
        let today = Local::now().date_naive();
        // Sparse logging: one recent entry, one last week, one months ago
        for (offset, kg) in [(0_i64, 80.0), (6, 80.5), (200, 86.0)] {
            db.upsert_weight(&NewWeightEntry {
                entry_date: today - chrono::Duration::days(offset),
                weight_kg: kg,
                note: None,
            })
            .unwrap();
        }

        let recent = db.weight_history(Some(30)).unwrap();
        assert_eq!(recent.len(), 2);
        let cutoff = today - chrono::Duration::days(29);
        assert!(recent.iter().all(|e| e.entry_date >= cutoff));

        // Window of 1 covers today only
        let just_today = db.weight_history(Some(1)).unwrap();
        assert_eq!(just_today.len(), 1);
        assert_eq!(just_today[0].entry_date, today);

        assert_eq!(db.weight_history(None).unwrap().len(), 3);
    }

    #[test]
    fn test_profile_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_profile().unwrap().is_none());

        let profile = Profile {
            weight_kg: 80.0,
            height_cm: 180.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
            weekly_goal_lbs: 1.0,
        };
        db.set_profile(&profile).unwrap();

        let fetched = db.get_profile().unwrap().unwrap();
        assert!((fetched.weight_kg - 80.0).abs() < f64::EPSILON);
        assert_eq!(fetched.gender, Gender::Male);
        assert_eq!(fetched.activity_level, ActivityLevel::Moderate);
    }

    #[test]
    fn test_goals_lazy_default() {
        let db = Database::open_in_memory().unwrap();
        let goals = db.get_goals().unwrap();
        assert_eq!(goals.calories, 2000);

        db.set_goals(&Goals {
            calories: 1800,
            protein_g: 140.0,
            carbs_g: 200.0,
            fat_g: 60.0,
        })
        .unwrap();
        assert_eq!(db.get_goals().unwrap().calories, 1800);

        assert!(db.clear_goals().unwrap());
        assert_eq!(db.get_goals().unwrap().calories, 2000);
    }

    #[test]
    fn test_export_import_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        db.insert_log_entry(&sample_entry("2024-01-15", MealType::Breakfast, 300.0))
            .unwrap();
        db.insert_meal(&sample_meal()).unwrap();
        db.upsert_weight(&NewWeightEntry {
            entry_date: d("2024-01-15"),
            weight_kg: 80.0,
            note: None,
        })
        .unwrap();

        let data = db.export_all().unwrap();
        assert_eq!(data.entries.len(), 1);
        assert_eq!(data.meals.len(), 1);
        assert_eq!(data.weight_entries.len(), 1);

        let db2 = Database::open_in_memory().unwrap();
        let summary = db2.import_all(&data).unwrap();
        assert_eq!(summary.entries_imported, 1);
        assert_eq!(summary.meals_imported, 1);
        assert_eq!(summary.weight_entries_imported, 1);

        // Re-import dedups by uuid / name / date
        let summary2 = db2.import_all(&data).unwrap();
        assert_eq!(summary2.entries_imported, 0);
        assert_eq!(summary2.entries_skipped, 1);
        assert_eq!(summary2.meals_skipped, 1);
        assert_eq!(summary2.weight_entries_skipped, 1);
    }

    #[test]
    fn test_open_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nosh.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_log_entry(&sample_entry("2024-01-15", MealType::Breakfast, 300.0))
                .unwrap();
        }

        let db = Database::open(&path).unwrap();
        let entries = db.entries_for_date(d("2024-01-15")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].food_name, "Oatmeal");
    }

    #[test]
    fn test_import_drops_meal_backlink() {
        let db = Database::open_in_memory().unwrap();
        let meal = db.insert_meal(&sample_meal()).unwrap();
        let mut new_entry = sample_entry("2024-01-15", MealType::Snack, 220.0);
        new_entry.meal_id = Some(meal.id);
        db.insert_log_entry(&new_entry).unwrap();

        let data = db.export_all().unwrap();
        let db2 = Database::open_in_memory().unwrap();
        db2.import_all(&data).unwrap();

        let entries = db2.entries_for_date(d("2024-01-15")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].meal_id, None);
    }
}
