//! Budget planner - per-project budget plans and actual-cost reporting for
//! a time-tracking dashboard.

pub mod api;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod db;

pub use config::Config;
