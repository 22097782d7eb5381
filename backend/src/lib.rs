pub mod config;
pub mod error;
pub mod job_controller;
pub mod services;
