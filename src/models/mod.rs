// src/models/mod.rs
pub mod announcement;
pub mod assignment;
pub mod attendance;
pub mod class;
pub mod dashboard;
pub mod enrollment;
pub mod pagination;
pub mod subject;
pub mod submission;
pub mod user;
