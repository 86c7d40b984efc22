pub mod accounts;
pub mod app;
pub mod auth;
pub mod categories;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod database;
pub mod models;
pub mod reporting;
pub mod telemetry;
pub mod transactions;
pub mod utils;
