mod data;
mod energy;
mod helpers;
mod log;
mod meal;
mod profile;
mod summary;
mod weight;

pub(crate) use data::{cmd_export, cmd_import_csv, cmd_import_json};
pub(crate) use energy::cmd_energy;
pub(crate) use log::{cmd_delete, cmd_log, cmd_snap};
pub(crate) use meal::{cmd_meal_add, cmd_meal_delete, cmd_meal_favorite, cmd_meal_list, cmd_meal_log};
pub(crate) use profile::{
    cmd_goal_clear, cmd_goal_set, cmd_goal_show, cmd_profile_set, cmd_profile_show,
};
pub(crate) use summary::{cmd_chart, cmd_history, cmd_stats, cmd_summary};
pub(crate) use weight::{
    cmd_weight_delete, cmd_weight_history, cmd_weight_log, cmd_weight_show, cmd_weight_trend,
};
