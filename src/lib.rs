//! Single-user day planner: place work tasks and free-form entries on a
//! fixed-width time grid for one date, with cascading duration edits and
//! whole-day persistence.

pub mod application;
pub mod domain;
pub mod infrastructure;

use application::bootstrap::bootstrap_workspace;
use application::commands::{
    add_custom_entry_impl, get_day_plan_impl, get_grid_impl, get_unscheduled_tasks_impl,
    on_drop_impl, reload_impl, remove_item_impl, select_date_impl, set_duration_impl,
};
use serde::Serialize;
use std::path::PathBuf;

pub use application::commands::{AppState, DayPlanResponse, Directories, GridResponse};
pub use application::day_plan::{
    Collaborators, DayPlan, MutationReport, ScheduledItemView, TaskView,
};
pub use application::schedule_sync::{RetryPolicy, ScheduleSyncService};
pub use domain::models::{ClientDisplay, DayPlanPolicy, ItemKind, ScheduledItem, WorkTask};
pub use infrastructure::error::InfraError;

#[derive(Debug, Serialize)]
pub struct BootstrapResponse {
    pub workspace_root: String,
    pub database_path: String,
}

pub fn bootstrap(root: Option<String>) -> Result<BootstrapResponse, String> {
    let workspace_root = match root {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().map_err(|error| error.to_string())?,
    };

    let result = bootstrap_workspace(&workspace_root).map_err(|error| error.to_string())?;
    Ok(BootstrapResponse {
        workspace_root: result.workspace_root.display().to_string(),
        database_path: result.database_path.display().to_string(),
    })
}

pub async fn select_date(state: &AppState, date: String) -> Result<DayPlanResponse, String> {
    select_date_impl(state, date)
        .await
        .map_err(|error| state.command_error("select_date", &error))
}

pub async fn get_day_plan(state: &AppState) -> Result<DayPlanResponse, String> {
    get_day_plan_impl(state)
        .await
        .map_err(|error| state.command_error("get_day_plan", &error))
}

pub async fn get_grid(state: &AppState) -> Result<GridResponse, String> {
    get_grid_impl(state)
        .await
        .map_err(|error| state.command_error("get_grid", &error))
}

pub async fn get_unscheduled_tasks(state: &AppState) -> Result<Vec<TaskView>, String> {
    get_unscheduled_tasks_impl(state)
        .await
        .map_err(|error| state.command_error("get_unscheduled_tasks", &error))
}

pub async fn on_drop(
    state: &AppState,
    source: String,
    destination: String,
    item_id: String,
) -> Result<MutationReport, String> {
    on_drop_impl(state, source, destination, item_id)
        .await
        .map_err(|error| state.command_error("on_drop", &error))
}

pub async fn set_duration(
    state: &AppState,
    item_id: String,
    minutes: u32,
) -> Result<MutationReport, String> {
    set_duration_impl(state, item_id, minutes)
        .await
        .map_err(|error| state.command_error("set_duration", &error))
}

pub async fn add_custom_entry(
    state: &AppState,
    title: String,
    minutes: u32,
    color: Option<String>,
    start_slot: Option<String>,
) -> Result<MutationReport, String> {
    add_custom_entry_impl(state, title, minutes, color, start_slot)
        .await
        .map_err(|error| state.command_error("add_custom_entry", &error))
}

pub async fn remove_item(state: &AppState, item_id: String) -> Result<MutationReport, String> {
    remove_item_impl(state, item_id)
        .await
        .map_err(|error| state.command_error("remove_item", &error))
}

pub async fn reload(state: &AppState) -> Result<DayPlanResponse, String> {
    reload_impl(state)
        .await
        .map_err(|error| state.command_error("reload", &error))
}
