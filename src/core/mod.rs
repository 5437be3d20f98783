// src/core/mod.rs
//! Configuration, filesystem helpers and the SQLite document store

pub mod config_manager;
pub mod database;
pub mod fs_ops;

pub use config_manager::ConfigManager;
pub use database::Database;
pub use fs_ops::FsOps;
