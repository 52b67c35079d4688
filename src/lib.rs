// src/lib.rs

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod notify;
pub mod proctoring;
pub mod routes;
pub mod state;
pub mod summary;
pub mod terminal;
pub mod utils;

pub use controller::{ExamCommand, ExamController, ExamIds, SubmitTrigger};
pub use error::AppError;
pub use state::ExamState;
