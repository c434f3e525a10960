//! Weight trend derivation from logged weight entries.

use serde::Serialize;

use crate::models::WeightEntry;

/// Net weight change over a window of entries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightTrend {
    pub start_weight_kg: f64,
    pub current_weight_kg: f64,
    /// Oldest weight minus newest. Positive means loss.
    pub total_change_kg: f64,
    /// Calendar days between the oldest and newest entry.
    pub days_tracked: i64,
    /// Average change per week, 0 when both entries fall on the same day.
    pub avg_weekly_change_kg: f64,
}

/// Derive a trend from weight entries, in any order.
///
/// Returns `None` with fewer than two entries: a single data point has no
/// trend, and fabricating one would mislead. Oldest and newest are located
/// by `entry_date`, so callers need not pre-sort.
#[must_use]
pub fn weight_trend(entries: &[WeightEntry]) -> Option<WeightTrend> {
    if entries.len() < 2 {
        return None;
    }
    let oldest = entries.iter().min_by_key(|e| e.entry_date)?;
    let newest = entries.iter().max_by_key(|e| e.entry_date)?;

    let total_change_kg = oldest.weight_kg - newest.weight_kg;
    let days_tracked = (newest.entry_date - oldest.entry_date).num_days();
    let avg_weekly_change_kg = if days_tracked > 0 {
        #[allow(clippy::cast_precision_loss)]
        let days = days_tracked as f64;
        total_change_kg / days * 7.0
    } else {
        0.0
    };

    Some(WeightTrend {
        start_weight_kg: oldest.weight_kg,
        current_weight_kg: newest.weight_kg,
        total_change_kg,
        days_tracked,
        avg_weekly_change_kg,
    })
}
