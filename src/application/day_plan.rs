//! Day-plan façade: the one object UI commands talk to.
//!
//! Owns the selected date and the schedule store for it. Every accepted
//! mutation is followed by a full replace of the day in persistence and a
//! reload of the store from what was written.

use crate::application::schedule_sync::{RetryPolicy, ScheduleSyncService};
use crate::domain::drag_drop::{DragDropController, DropOutcome, DropZone};
use crate::domain::models::{
    ClientDisplay, DayPlanPolicy, ItemKind, ScheduledItem, WorkTask, next_id, parse_date,
};
use crate::domain::resolver::{ItemShift, ResizeRejection};
use crate::domain::schedule::{ScheduleError, ScheduleStore, unscheduled_tasks};
use crate::domain::slot_grid::SlotGrid;
use crate::infrastructure::collaborators::{
    ClientDirectory, TaskDirectory, TeamDirectory, assignee_display_name,
};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::schedule_repository::DayScheduleRepository;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// External services the façade reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub schedules: Arc<dyn DayScheduleRepository>,
    pub tasks: Arc<dyn TaskDirectory>,
    pub team: Arc<dyn TeamDirectory>,
    pub clients: Arc<dyn ClientDirectory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub shifts: Vec<ItemShift>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<String>,
    pub items: Vec<ScheduledItem>,
}

impl MutationReport {
    fn rejected(reason: impl ToString, items: Vec<ScheduledItem>) -> Self {
        Self {
            applied: false,
            rejection: Some(reason.to_string()),
            items,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub assignee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientDisplay>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledItemView {
    pub id: String,
    pub kind: ItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientDisplay>,
    pub start_slot: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_slot: Option<String>,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPlanView {
    pub date: String,
    pub slot_width_minutes: u32,
    pub grid: Vec<String>,
    pub items: Vec<ScheduledItemView>,
    pub unscheduled: Vec<TaskView>,
}

pub struct DayPlan {
    user_id: String,
    policy: DayPlanPolicy,
    controller: DragDropController,
    store: ScheduleStore,
    sync: ScheduleSyncService<dyn DayScheduleRepository>,
    collaborators: Collaborators,
}

impl DayPlan {
    /// Builds the grid from `policy` and loads `date` for `user_id`.
    pub async fn open(
        user_id: &str,
        policy: DayPlanPolicy,
        retry_policy: RetryPolicy,
        collaborators: Collaborators,
        date: &str,
    ) -> Result<Self, InfraError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(InfraError::InvalidConfig(
                "user_id must not be empty".to_string(),
            ));
        }
        policy.validate().map_err(InfraError::InvalidConfig)?;
        let grid = SlotGrid::parse_window(
            &policy.window_start,
            &policy.window_end,
            policy.slot_width_minutes,
        )
        .map_err(InfraError::InvalidConfig)?;
        let date = normalize_date(date)?;

        let sync = ScheduleSyncService::new(Arc::clone(&collaborators.schedules))
            .with_retry_policy(retry_policy);
        let mut store = ScheduleStore::new(date.clone(), grid);
        store.replace_all(sync.load(user_id, &date).await?);

        Ok(Self {
            user_id: user_id.to_string(),
            controller: DragDropController::new(policy.default_duration_minutes),
            policy,
            store,
            sync,
            collaborators,
        })
    }

    pub fn policy(&self) -> &DayPlanPolicy {
        &self.policy
    }

    pub fn selected_date(&self) -> &str {
        self.store.date()
    }

    pub fn grid(&self) -> &SlotGrid {
        self.store.grid()
    }

    pub fn items(&self) -> Vec<ScheduledItem> {
        self.store.items()
    }

    /// Tears down the current store and loads `date`. On a failed load the
    /// previous date stays selected.
    pub async fn select_date(&mut self, date: &str) -> Result<(), InfraError> {
        let date = normalize_date(date)?;
        let loaded = self.sync.load(&self.user_id, &date).await?;
        let mut store = ScheduleStore::new(date, self.store.grid().clone());
        store.replace_all(loaded);
        self.store = store;
        tracing::debug!(user_id = %self.user_id, date = %self.store.date(), items = self.store.len(), "selected date");
        Ok(())
    }

    pub async fn reload(&mut self) -> Result<(), InfraError> {
        let loaded = self.sync.load(&self.user_id, self.store.date()).await?;
        self.store.replace_all(loaded);
        Ok(())
    }

    pub async fn unscheduled_tasks(&self) -> Result<Vec<WorkTask>, InfraError> {
        let tasks = self.collaborators.tasks.list_tasks(&self.user_id).await?;
        Ok(unscheduled_tasks(&tasks, &self.store.items()))
    }

    pub async fn on_drop(
        &mut self,
        source: &str,
        destination: &str,
        item_ref: &str,
    ) -> Result<MutationReport, InfraError> {
        let Some(source_zone) = DropZone::parse(source) else {
            return Err(InfraError::InvalidConfig(format!("unknown drop zone: {source}")));
        };
        let Some(destination_zone) = DropZone::parse(destination) else {
            return Err(InfraError::InvalidConfig(format!(
                "unknown drop zone: {destination}"
            )));
        };

        let outcome =
            self.controller
                .apply(&mut self.store, &source_zone, &destination_zone, item_ref);
        tracing::debug!(%source_zone, %destination_zone, item_ref, ?outcome, "applied drop");
        match outcome {
            DropOutcome::Cancelled { reason } => {
                Ok(MutationReport::rejected(reason, self.store.items()))
            }
            outcome if outcome.is_mutation() => Ok(self.commit(Vec::new()).await),
            _ => Ok(MutationReport {
                items: self.store.items(),
                ..MutationReport::default()
            }),
        }
    }

    pub async fn set_duration(
        &mut self,
        item_id: &str,
        minutes: u32,
    ) -> Result<MutationReport, InfraError> {
        match self.store.resize(item_id.trim(), minutes) {
            Ok(outcome) => Ok(self.commit(outcome.shifts).await),
            Err(ScheduleError::ResizeRejected(ResizeRejection::UnknownItem(id))) => {
                Err(InfraError::NotFound(format!("item not found: {id}")))
            }
            Err(error) => Ok(MutationReport::rejected(error, self.store.items())),
        }
    }

    /// Places a free-form entry at `start_slot`, or at the first free slot
    /// that fits when no slot is given.
    pub async fn add_custom_entry(
        &mut self,
        title: &str,
        minutes: u32,
        color: Option<&str>,
        start_slot: Option<&str>,
    ) -> Result<MutationReport, InfraError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(InfraError::InvalidConfig(
                "title must not be empty".to_string(),
            ));
        }
        if minutes == 0 {
            return Err(InfraError::InvalidConfig(
                "duration must be > 0 minutes".to_string(),
            ));
        }
        let color = color
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.policy.default_custom_color.as_str())
            .to_string();

        let start = match start_slot.map(str::trim).filter(|value| !value.is_empty()) {
            Some(label) => label.to_string(),
            None => match self.store.first_free_slot(minutes) {
                Some(label) => label,
                None => {
                    return Ok(MutationReport::rejected(
                        format!("no free {minutes}-minute range left on {}", self.store.date()),
                        self.store.items(),
                    ));
                }
            },
        };

        let item = ScheduledItem::custom(
            next_id("itm"),
            self.store.date(),
            title,
            color,
            start,
            minutes,
        );
        match self.store.place(item) {
            Ok(()) => Ok(self.commit(Vec::new()).await),
            Err(error) => Ok(MutationReport::rejected(error, self.store.items())),
        }
    }

    pub async fn remove_item(&mut self, item_id: &str) -> Result<MutationReport, InfraError> {
        match self.store.remove(item_id.trim()) {
            Ok(_) => Ok(self.commit(Vec::new()).await),
            Err(ScheduleError::UnknownItem(id)) => {
                Err(InfraError::NotFound(format!("item not found: {id}")))
            }
            Err(error) => Err(error.into()),
        }
    }

    pub fn assignee_name(&self, task: &WorkTask) -> String {
        assignee_display_name(self.collaborators.team.as_ref(), task.assignee_id.as_deref())
    }

    pub fn client_display(&self, client_name: &str) -> ClientDisplay {
        self.collaborators.clients.resolve_client_display(client_name)
    }

    /// Everything the day view renders, with collaborator lookups joined in.
    pub async fn view(&self) -> Result<DayPlanView, InfraError> {
        let tasks = self.collaborators.tasks.list_tasks(&self.user_id).await?;
        let by_id = tasks
            .iter()
            .map(|task| (task.id.as_str(), task))
            .collect::<HashMap<_, _>>();
        let grid = self.store.grid();
        let items = self.store.items();

        let item_views = items
            .iter()
            .map(|item| {
                let task = item.task_ref().and_then(|task_id| by_id.get(task_id).copied());
                let title = match (item.kind, task) {
                    (ItemKind::Custom, _) => item.title.clone().unwrap_or_default(),
                    (ItemKind::Task, Some(task)) => task.title.clone(),
                    (ItemKind::Task, None) => item
                        .title
                        .clone()
                        .unwrap_or_else(|| "Unknown task".to_string()),
                };
                ScheduledItemView {
                    id: item.id.clone(),
                    kind: item.kind,
                    task_id: item.task_ref().map(ToOwned::to_owned),
                    title,
                    color: item.color.clone(),
                    assignee_name: task.map(|task| self.assignee_name(task)),
                    client: task.and_then(|task| self.task_client(task)),
                    start_slot: item.start_slot.clone(),
                    end_slot: grid
                        .index_of(&item.start_slot)
                        .and_then(|start| grid.end_label(start, item.duration_minutes)),
                    duration_minutes: item.duration_minutes,
                }
            })
            .collect();

        let unscheduled = unscheduled_tasks(&tasks, &items)
            .iter()
            .map(|task| self.task_view(task))
            .collect();

        Ok(DayPlanView {
            date: self.store.date().to_string(),
            slot_width_minutes: grid.width_minutes(),
            grid: grid.labels(),
            items: item_views,
            unscheduled,
        })
    }

    pub fn task_view(&self, task: &WorkTask) -> TaskView {
        TaskView {
            id: task.id.clone(),
            title: task.title.clone(),
            assignee_name: self.assignee_name(task),
            client: self.task_client(task),
            due_date: task.due_date.clone(),
        }
    }

    fn task_client(&self, task: &WorkTask) -> Option<ClientDisplay> {
        task.client_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| self.client_display(name))
    }

    /// Persists the whole day and reloads it. A failed write or reload is
    /// reported, not rolled back: the in-memory schedule stays as the user left
    /// it.
    async fn commit(&mut self, shifts: Vec<ItemShift>) -> MutationReport {
        let date = self.store.date().to_string();
        let items = self.store.items();
        let mut report = MutationReport {
            applied: true,
            shifts,
            ..MutationReport::default()
        };

        if let Err(error) = self.sync.persist(&self.user_id, &date, &items).await {
            tracing::warn!(user_id = %self.user_id, date = %date, %error, "failed to persist day schedule");
            report.notification = Some(format!("Could not save schedule for {date}: {error}"));
        } else {
            match self.sync.load(&self.user_id, &date).await {
                Ok(reloaded) => self.store.replace_all(reloaded),
                Err(error) => {
                    tracing::warn!(user_id = %self.user_id, date = %date, %error, "failed to reload day schedule");
                    report.notification = Some(format!(
                        "Schedule for {date} was saved but could not be reloaded: {error}"
                    ));
                }
            }
        }
        report.items = self.store.items();
        report
    }
}

fn normalize_date(value: &str) -> Result<String, InfraError> {
    parse_date(value)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .map_err(|error| InfraError::InvalidConfig(format!("date must be YYYY-MM-DD: {error}")))
}
