pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod similarity;
pub mod telemetry;

#[cfg(test)]
mod test_support;
