// src/lib.rs

// --- Modules ---
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod scanner;
pub mod services;
pub mod state;
pub mod templates;
pub mod web;
