use anyhow::Result;

use nosh_core::service::NoshService;

pub(crate) fn cmd_energy(service: &NoshService, json: bool) -> Result<()> {
    let targets = service.energy()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    let bmr = targets.bmr;
    let tdee = targets.tdee;
    println!("BMR:  {bmr:.0} kcal/day");
    println!("TDEE: {tdee:.0} kcal/day");

    let deficit = targets.daily_deficit;
    if deficit > 0.0 {
        println!("Goal deficit: {deficit:.0} kcal/day");
    } else if deficit < 0.0 {
        let surplus = -deficit;
        println!("Goal surplus: {surplus:.0} kcal/day");
    }

    let rec = targets.recommended_calories;
    println!("Recommended: {rec:.0} kcal/day");
    if targets.floor_applied {
        eprintln!(
            "Warning: your goal would put the target below a safe minimum; \
             it has been raised to {rec:.0} kcal/day. Consider a gentler weekly goal."
        );
    }

    Ok(())
}
