//! Types for the AI meal-photo analysis collaborator.
//!
//! The model's reply is untrusted: it is type-coerced into log entries
//! (negatives clamped, names required) but never validated beyond that.
//! The user reviews the result before anything is saved.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{MealType, NewFoodLogEntry};

/// Maximum number of photos per analysis request.
pub const MAX_PHOTOS: usize = 3;

/// One food item guessed from a photo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealGuess {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Parse the model's reply content into guesses.
///
/// The model is instructed to reply with a JSON array of items, but some
/// models wrap it in markdown fences or return a single object. Both are
/// tolerated.
pub fn parse_guesses(content: &str) -> Result<Vec<MealGuess>> {
    let trimmed = strip_code_fence(content);

    if let Ok(guesses) = serde_json::from_str::<Vec<MealGuess>>(trimmed) {
        return Ok(guesses);
    }
    if let Ok(guess) = serde_json::from_str::<MealGuess>(trimmed) {
        return Ok(vec![guess]);
    }
    bail!("Could not parse analysis reply as food items: {content}")
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop a language tag like ```json
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    rest.trim_end_matches('`').trim()
}

fn clamp_non_negative(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 { v } else { 0.0 }
}

/// Coerce a guess into a loggable entry.
///
/// Negative or non-finite numbers from the model become 0; a missing name
/// is the one thing that fails, since an entry without a name is useless.
pub fn guess_to_entry(
    guess: &MealGuess,
    meal_type: MealType,
    entry_date: NaiveDate,
    entry_time: &str,
) -> Result<NewFoodLogEntry> {
    let name = guess.name.trim();
    if name.is_empty() {
        bail!("Analysis returned a food item without a name");
    }
    Ok(NewFoodLogEntry {
        food_name: name.to_string(),
        meal_type,
        calories: clamp_non_negative(guess.calories),
        protein: guess.protein.map(clamp_non_negative),
        carbs: guess.carbs.map(clamp_non_negative),
        fat: guess.fat.map(clamp_non_negative),
        caffeine: None,
        amount: guess.amount.filter(|a| a.is_finite() && *a > 0.0).unwrap_or(1.0),
        unit: guess
            .unit
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or("serving")
            .to_string(),
        entry_date,
        entry_time: entry_time.to_string(),
        meal_id: None,
    })
}

/// Validate a photo batch before it is sent anywhere.
pub fn validate_photos(images: &[Vec<u8>]) -> Result<()> {
    if images.is_empty() {
        bail!("At least one photo is required");
    }
    if images.len() > MAX_PHOTOS {
        bail!("At most {MAX_PHOTOS} photos per analysis");
    }
    if let Some(i) = images.iter().position(Vec::is_empty) {
        bail!("Photo {} is empty", i + 1);
    }
    Ok(())
}

// --- OpenAI-compatible chat-completions reply shapes ---

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: String,
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn content(&self) -> Result<&str> {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .context("Analysis reply contained no choices")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_guesses_array() {
        let content = r#"[{"name": "Margherita Pizza", "calories": 850, "protein": 32, "carbs": 98, "fat": 34, "amount": 1, "unit": "pizza"}]"#;
        let guesses = parse_guesses(content).unwrap();
        assert_eq!(guesses.len(), 1);
        assert_eq!(guesses[0].name, "Margherita Pizza");
        assert!((guesses[0].calories - 850.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_guesses_fenced() {
        let content = "```json\n[{\"name\": \"Apple\", \"calories\": 95}]\n```";
        let guesses = parse_guesses(content).unwrap();
        assert_eq!(guesses.len(), 1);
        assert_eq!(guesses[0].name, "Apple");
        assert!(guesses[0].protein.is_none());
    }

    #[test]
    fn test_parse_guesses_single_object() {
        let content = r#"{"name": "Banana", "calories": 105}"#;
        let guesses = parse_guesses(content).unwrap();
        assert_eq!(guesses.len(), 1);
    }

    #[test]
    fn test_parse_guesses_garbage() {
        assert!(parse_guesses("I see a plate of food.").is_err());
    }

    #[test]
    fn test_guess_to_entry_clamps_negatives() {
        let guess = MealGuess {
            name: "Mystery Dish".to_string(),
            calories: -200.0,
            protein: Some(-5.0),
            carbs: Some(40.0),
            fat: None,
            amount: Some(-1.0),
            unit: None,
        };
        let entry = guess_to_entry(&guess, MealType::Dinner, d("2024-01-15"), "19:00").unwrap();
        assert!((entry.calories - 0.0).abs() < f64::EPSILON);
        assert_eq!(entry.protein, Some(0.0));
        assert_eq!(entry.carbs, Some(40.0));
        assert!((entry.amount - 1.0).abs() < f64::EPSILON);
        assert_eq!(entry.unit, "serving");
    }

    #[test]
    fn test_guess_to_entry_requires_name() {
        let guess = MealGuess {
            name: "  ".to_string(),
            calories: 100.0,
            protein: None,
            carbs: None,
            fat: None,
            amount: None,
            unit: None,
        };
        assert!(guess_to_entry(&guess, MealType::Lunch, d("2024-01-15"), "12:00").is_err());
    }

    #[test]
    fn test_validate_photos() {
        assert!(validate_photos(&[]).is_err());
        assert!(validate_photos(&[vec![1, 2, 3]]).is_ok());
        assert!(validate_photos(&[vec![1], vec![2], vec![3], vec![4]]).is_err());
        assert!(validate_photos(&[vec![1], vec![]]).is_err());
    }

    #[test]
    fn test_chat_response_content() {
        let json = r#"{"choices": [{"message": {"content": "[]"}}]}"#;
        let resp: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content().unwrap(), "[]");

        let empty: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(empty.content().is_err());
    }
}
