pub mod csv_import;
pub mod db;
pub mod energy;
pub mod models;
pub mod progress;
pub mod service;
pub mod stats;
pub mod vision;
