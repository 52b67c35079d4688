// src/models/mod.rs

pub mod answer;
pub mod session;
pub mod summary;
pub mod test;
