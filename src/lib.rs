//! Spreadsheet analysis service: ingests an uploaded workbook, infers column
//! types, recommends charts and reshapes each sheet into chart payloads.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

use services::queue::JobQueue;

// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(config: config::Config, queue: JobQueue) -> Self {
        Self { config, queue }
    }
}
