pub mod alerts;
pub mod api;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod dashboard;
pub mod db;
pub mod metrics;
