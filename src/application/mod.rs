pub mod bootstrap;
pub mod commands;
pub mod day_plan;
pub mod schedule_sync;
