pub mod agents;
pub mod config;
pub mod context;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod scheduler;
pub mod sqlite;
