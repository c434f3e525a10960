use anyhow::{Result, bail};

use nosh_core::energy::{CM_PER_IN, KG_PER_LB, LBS_PER_KG};
use nosh_core::models::{ActivityLevel, Gender, Goals, Profile};
use nosh_core::service::NoshService;

use super::helpers::no_neg_zero;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_profile_set(
    service: &NoshService,
    weight: f64,
    weight_unit: &str,
    height: f64,
    height_unit: &str,
    age: i64,
    gender: &str,
    activity: &str,
    weekly_goal: f64,
    json: bool,
) -> Result<()> {
    let weight_kg = match weight_unit.to_lowercase().as_str() {
        "kg" => weight,
        "lbs" | "lb" => {
            let kg = no_neg_zero(weight * KG_PER_LB);
            eprintln!("Converting {weight:.1} lbs → {kg:.2} kg");
            kg
        }
        _ => bail!("Invalid weight unit '{weight_unit}'. Use 'kg' or 'lbs'"),
    };
    let height_cm = match height_unit.to_lowercase().as_str() {
        "cm" => height,
        "in" => {
            let cm = no_neg_zero(height * CM_PER_IN);
            eprintln!("Converting {height:.1} in → {cm:.1} cm");
            cm
        }
        _ => bail!("Invalid height unit '{height_unit}'. Use 'cm' or 'in'"),
    };

    let profile = Profile {
        weight_kg,
        height_cm,
        age,
        gender: Gender::parse(gender)?,
        activity_level: ActivityLevel::parse(activity)?,
        weekly_goal_lbs: weekly_goal,
    };
    service.set_profile(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Profile saved. Run 'nosh energy' to see your targets.");
    }
    Ok(())
}

pub(crate) fn cmd_profile_show(service: &NoshService, json: bool) -> Result<()> {
    let Some(profile) = service.get_profile()? else {
        let msg = "No profile set. Run 'nosh profile set' first";
        if json {
            println!("{}", super::helpers::json_error(msg));
        } else {
            eprintln!("{msg}");
        }
        std::process::exit(2);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    let kg = profile.weight_kg;
    let lbs = kg * LBS_PER_KG;
    let cm = profile.height_cm;
    let age = profile.age;
    let gender = profile.gender.as_str();
    let activity = profile.activity_level.as_str();
    let goal = profile.weekly_goal_lbs;
    println!("Weight:   {kg:.1} kg ({lbs:.1} lbs)");
    println!("Height:   {cm:.1} cm");
    println!("Age:      {age}");
    println!("Gender:   {gender}");
    println!("Activity: {activity}");
    if goal > 0.0 {
        println!("Goal:     lose {goal} lbs/week");
    } else if goal < 0.0 {
        let gain = -goal;
        println!("Goal:     gain {gain} lbs/week");
    } else {
        println!("Goal:     maintain");
    }

    Ok(())
}

pub(crate) fn cmd_goal_set(
    service: &NoshService,
    calories: i64,
    protein: Option<f64>,
    carbs: Option<f64>,
    fat: Option<f64>,
    json: bool,
) -> Result<()> {
    let current = service.get_goals()?;
    let goals = Goals {
        calories,
        protein_g: protein.unwrap_or(current.protein_g),
        carbs_g: carbs.unwrap_or(current.carbs_g),
        fat_g: fat.unwrap_or(current.fat_g),
    };
    service.set_goals(&goals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        let cal = goals.calories;
        let p = goals.protein_g;
        let c = goals.carbs_g;
        let f = goals.fat_g;
        println!("Goals set: {cal} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    }
    Ok(())
}

pub(crate) fn cmd_goal_show(service: &NoshService, json: bool) -> Result<()> {
    let goals = service.get_goals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        let cal = goals.calories;
        let p = goals.protein_g;
        let c = goals.carbs_g;
        let f = goals.fat_g;
        println!("Daily goals: {cal} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    }
    Ok(())
}

pub(crate) fn cmd_goal_clear(service: &NoshService, json: bool) -> Result<()> {
    service.clear_goals()?;

    if json {
        println!("{}", serde_json::json!({ "cleared": true }));
    } else {
        println!("Goals reset to defaults");
    }
    Ok(())
}
