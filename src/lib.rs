pub mod api;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod preview;
pub mod recognition;
pub mod schedule;
pub mod services;
pub mod state;
