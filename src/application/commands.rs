use crate::application::bootstrap::bootstrap_workspace;
use crate::application::day_plan::{
    Collaborators, DayPlan, DayPlanView, MutationReport, TaskView,
};
use crate::application::schedule_sync::RetryPolicy;
use crate::infrastructure::collaborators::{
    ClientDirectory, InMemoryTaskDirectory, InMemoryTeamDirectory, PaletteClientDirectory,
    TaskDirectory, TeamDirectory,
};
use crate::infrastructure::config::{
    read_day_plan_policy, read_sync_settings, read_timezone, today_in,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::SqliteDayScheduleRepository;
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

pub type DayPlanResponse = DayPlanView;

/// Read-only lookups the day plan joins against.
#[derive(Clone)]
pub struct Directories {
    pub tasks: Arc<dyn TaskDirectory>,
    pub team: Arc<dyn TeamDirectory>,
    pub clients: Arc<dyn ClientDirectory>,
}

impl Default for Directories {
    fn default() -> Self {
        Self {
            tasks: Arc::new(InMemoryTaskDirectory::default()),
            team: Arc::new(InMemoryTeamDirectory::default()),
            clients: Arc::new(PaletteClientDirectory),
        }
    }
}

pub struct AppState {
    config_dir: PathBuf,
    database_path: PathBuf,
    logs_dir: PathBuf,
    day_plan: AsyncMutex<DayPlan>,
    log_guard: Mutex<()>,
}

impl AppState {
    /// Bootstraps `workspace_root` and opens today's plan for `user_id`.
    pub async fn new(
        workspace_root: PathBuf,
        user_id: &str,
        directories: Directories,
    ) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(&workspace_root)?;
        let policy = read_day_plan_policy(&bootstrap.config_dir)?;
        let retry_policy = RetryPolicy::from(read_sync_settings(&bootstrap.config_dir)?);
        let today = today_in(read_timezone(&bootstrap.config_dir)?)
            .format("%Y-%m-%d")
            .to_string();

        let collaborators = Collaborators {
            schedules: Arc::new(SqliteDayScheduleRepository::new(&bootstrap.database_path)),
            tasks: directories.tasks,
            team: directories.team,
            clients: directories.clients,
        };
        let day_plan = DayPlan::open(user_id, policy, retry_policy, collaborators, &today).await?;

        Ok(Self {
            config_dir: bootstrap.config_dir,
            database_path: bootstrap.database_path,
            logs_dir: bootstrap.logs_dir,
            day_plan: AsyncMutex::new(day_plan),
            log_guard: Mutex::new(()),
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn log_report(&self, command: &str, subject: &str, report: &MutationReport) {
        if let Some(reason) = report.rejection.as_deref() {
            self.log_info(command, &format!("rejected {subject}: {reason}"));
        } else if report.applied {
            self.log_info(
                command,
                &format!(
                    "applied {subject} shifts={} items={}",
                    report.shifts.len(),
                    report.items.len()
                ),
            );
        }
        if let Some(notification) = report.notification.as_deref() {
            self.log_error(command, notification);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GridResponse {
    pub date: String,
    pub window_start: String,
    pub window_end: String,
    pub slot_width_minutes: u32,
    pub slots: Vec<String>,
}

pub async fn select_date_impl(
    state: &AppState,
    date: String,
) -> Result<DayPlanResponse, InfraError> {
    let mut day_plan = state.day_plan.lock().await;
    day_plan.select_date(&date).await?;
    let view = day_plan.view().await?;
    state.log_info(
        "select_date",
        &format!("selected date={} items={}", view.date, view.items.len()),
    );
    Ok(view)
}

pub async fn get_day_plan_impl(state: &AppState) -> Result<DayPlanResponse, InfraError> {
    let day_plan = state.day_plan.lock().await;
    day_plan.view().await
}

pub async fn get_grid_impl(state: &AppState) -> Result<GridResponse, InfraError> {
    let day_plan = state.day_plan.lock().await;
    let policy = day_plan.policy();
    Ok(GridResponse {
        date: day_plan.selected_date().to_string(),
        window_start: policy.window_start.clone(),
        window_end: policy.window_end.clone(),
        slot_width_minutes: day_plan.grid().width_minutes(),
        slots: day_plan.grid().labels(),
    })
}

pub async fn get_unscheduled_tasks_impl(state: &AppState) -> Result<Vec<TaskView>, InfraError> {
    let day_plan = state.day_plan.lock().await;
    let tasks = day_plan.unscheduled_tasks().await?;
    Ok(tasks.iter().map(|task| day_plan.task_view(task)).collect())
}

pub async fn on_drop_impl(
    state: &AppState,
    source: String,
    destination: String,
    item_id: String,
) -> Result<MutationReport, InfraError> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "item_id must not be empty".to_string(),
        ));
    }

    let report = {
        let mut day_plan = state.day_plan.lock().await;
        day_plan.on_drop(&source, &destination, item_id).await?
    };
    state.log_report(
        "on_drop",
        &format!("{item_id} {} -> {}", source.trim(), destination.trim()),
        &report,
    );
    Ok(report)
}

pub async fn set_duration_impl(
    state: &AppState,
    item_id: String,
    minutes: u32,
) -> Result<MutationReport, InfraError> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "item_id must not be empty".to_string(),
        ));
    }

    let report = {
        let mut day_plan = state.day_plan.lock().await;
        day_plan.set_duration(item_id, minutes).await?
    };
    state.log_report(
        "set_duration",
        &format!("item_id={item_id} minutes={minutes}"),
        &report,
    );
    Ok(report)
}

pub async fn add_custom_entry_impl(
    state: &AppState,
    title: String,
    minutes: u32,
    color: Option<String>,
    start_slot: Option<String>,
) -> Result<MutationReport, InfraError> {
    let report = {
        let mut day_plan = state.day_plan.lock().await;
        day_plan
            .add_custom_entry(&title, minutes, color.as_deref(), start_slot.as_deref())
            .await?
    };
    state.log_report(
        "add_custom_entry",
        &format!("title={} minutes={minutes}", title.trim()),
        &report,
    );
    Ok(report)
}

pub async fn remove_item_impl(
    state: &AppState,
    item_id: String,
) -> Result<MutationReport, InfraError> {
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(InfraError::InvalidConfig(
            "item_id must not be empty".to_string(),
        ));
    }

    let report = {
        let mut day_plan = state.day_plan.lock().await;
        day_plan.remove_item(item_id).await?
    };
    state.log_report("remove_item", &format!("item_id={item_id}"), &report);
    Ok(report)
}

pub async fn reload_impl(state: &AppState) -> Result<DayPlanResponse, InfraError> {
    let mut day_plan = state.day_plan.lock().await;
    day_plan.reload().await?;
    let view = day_plan.view().await?;
    state.log_info("reload", &format!("reloaded date={}", view.date));
    Ok(view)
}
