//! Energy-balance calculations: BMR (Mifflin-St Jeor), TDEE from the
//! activity multiplier table, and a recommended daily calorie target
//! derived from the weekly weight goal.

use anyhow::Result;
use serde::Serialize;

use crate::models::{ActivityLevel, Gender, Profile, validate_profile};

/// Kilograms per pound.
pub const KG_PER_LB: f64 = 0.453_592;
/// Pounds per kilogram.
pub const LBS_PER_KG: f64 = 2.204_62;
/// Centimetres per inch.
pub const CM_PER_IN: f64 = 2.54;
/// Approximate energy content of one pound of body fat.
pub const KCAL_PER_LB: f64 = 3500.0;
/// Recommended targets are never pushed below this daily intake.
pub const MIN_DAILY_KCAL: f64 = 1200.0;

impl ActivityLevel {
    /// TDEE multiplier for this activity level.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::Extreme => 1.9,
        }
    }
}

/// Basal metabolic rate in kcal/day, Mifflin-St Jeor.
pub fn bmr(profile: &Profile) -> Result<f64> {
    validate_profile(profile)?;
    #[allow(clippy::cast_precision_loss)]
    let age = profile.age as f64;
    let base = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * age;
    Ok(match profile.gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    })
}

/// Full energy picture for a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyTargets {
    /// Basal metabolic rate, kcal/day.
    pub bmr: f64,
    /// Total daily energy expenditure (BMR scaled by activity), kcal/day.
    pub tdee: f64,
    /// Daily deficit implied by the weekly goal, kcal/day. Positive for
    /// weight loss, negative for gain.
    pub daily_deficit: f64,
    /// TDEE minus the deficit, clamped to `MIN_DAILY_KCAL`.
    pub recommended_calories: f64,
    /// True when the clamp changed the recommendation.
    pub floor_applied: bool,
}

/// Compute BMR, TDEE, and the recommended daily target for `profile`.
///
/// The weekly goal is in pounds to lose per week (signed; negative means
/// gain). A goal of 1 lb/week maps to a 500 kcal/day deficit. Aggressive
/// goals on small TDEEs can push the raw target below a safe intake, so
/// the recommendation is clamped at `MIN_DAILY_KCAL` and the clamp is
/// surfaced via `floor_applied` so callers can warn.
pub fn energy_targets(profile: &Profile) -> Result<EnergyTargets> {
    let bmr = bmr(profile)?;
    let tdee = bmr * profile.activity_level.multiplier();
    let daily_deficit = profile.weekly_goal_lbs * KCAL_PER_LB / 7.0;
    let raw = tdee - daily_deficit;
    let floor_applied = raw < MIN_DAILY_KCAL;
    let recommended_calories = if floor_applied { MIN_DAILY_KCAL } else { raw };
    Ok(EnergyTargets {
        bmr,
        tdee,
        daily_deficit,
        recommended_calories,
        floor_applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(
        weight_kg: f64,
        height_cm: f64,
        age: i64,
        gender: Gender,
        activity_level: ActivityLevel,
        weekly_goal_lbs: f64,
    ) -> Profile {
        Profile {
            weight_kg,
            height_cm,
            age,
            gender,
            activity_level,
            weekly_goal_lbs,
        }
    }

    #[test]
    fn test_multiplier_table() {
        assert!((ActivityLevel::Sedentary.multiplier() - 1.2).abs() < f64::EPSILON);
        assert!((ActivityLevel::Light.multiplier() - 1.375).abs() < f64::EPSILON);
        assert!((ActivityLevel::Moderate.multiplier() - 1.55).abs() < f64::EPSILON);
        assert!((ActivityLevel::Active.multiplier() - 1.725).abs() < f64::EPSILON);
        assert!((ActivityLevel::Extreme.multiplier() - 1.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmr_male() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 800 + 1125 - 150 + 5 = 1780
        let p = profile(80.0, 180.0, 30, Gender::Male, ActivityLevel::Sedentary, 0.0);
        assert!((bmr(&p).unwrap() - 1780.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmr_female() {
        // 10*60 + 6.25*165 - 5*25 - 161 = 600 + 1031.25 - 125 - 161 = 1345.25
        let p = profile(60.0, 165.0, 25, Gender::Female, ActivityLevel::Sedentary, 0.0);
        assert!((bmr(&p).unwrap() - 1345.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bmr_rejects_invalid_profile() {
        let p = profile(0.0, 180.0, 30, Gender::Male, ActivityLevel::Sedentary, 0.0);
        assert!(bmr(&p).is_err());
    }

    #[test]
    fn test_tdee_uses_activity_multiplier() {
        let p = profile(80.0, 180.0, 30, Gender::Male, ActivityLevel::Moderate, 0.0);
        let targets = energy_targets(&p).unwrap();
        assert!((targets.tdee - 1780.0 * 1.55).abs() < 1e-9);
        assert!((targets.daily_deficit - 0.0).abs() < f64::EPSILON);
        assert!((targets.recommended_calories - targets.tdee).abs() < 1e-9);
        assert!(!targets.floor_applied);
    }

    #[test]
    fn test_loss_goal_maps_to_daily_deficit() {
        let p = profile(80.0, 180.0, 30, Gender::Male, ActivityLevel::Moderate, 1.0);
        let targets = energy_targets(&p).unwrap();
        assert!((targets.daily_deficit - 500.0).abs() < f64::EPSILON);
        assert!((targets.recommended_calories - (targets.tdee - 500.0)).abs() < 1e-9);
    }

    #[test]
    fn test_gain_goal_maps_to_daily_surplus() {
        let p = profile(80.0, 180.0, 30, Gender::Male, ActivityLevel::Moderate, -0.5);
        let targets = energy_targets(&p).unwrap();
        assert!((targets.daily_deficit - -250.0).abs() < f64::EPSILON);
        assert!((targets.recommended_calories - (targets.tdee + 250.0)).abs() < 1e-9);
    }

    #[test]
    fn test_floor_clamps_aggressive_goal() {
        // 5 lb/week is a ~2500 kcal/day deficit, far more than this
        // profile's TDEE can absorb.
        let p = profile(
            45.0,
            150.0,
            60,
            Gender::Female,
            ActivityLevel::Sedentary,
            5.0,
        );
        let targets = energy_targets(&p).unwrap();
        let raw = targets.tdee - targets.daily_deficit;
        assert!(raw < MIN_DAILY_KCAL);
        assert!((targets.recommended_calories - MIN_DAILY_KCAL).abs() < f64::EPSILON);
        assert!(targets.floor_applied);
    }

    #[test]
    fn test_floor_not_flagged_at_or_above_minimum() {
        let p = profile(80.0, 180.0, 30, Gender::Male, ActivityLevel::Sedentary, 0.0);
        let targets = energy_targets(&p).unwrap();
        assert!(targets.recommended_calories >= MIN_DAILY_KCAL);
        assert!(!targets.floor_applied);
    }
}
