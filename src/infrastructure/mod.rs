pub mod collaborators;
pub mod config;
pub mod error;
pub mod schedule_repository;
pub mod storage;
