use crate::domain::models::{ClientDisplay, WorkTask};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

const CLIENT_PALETTE: [&str; 8] = [
    "blue", "green", "orange", "purple", "teal", "red", "amber", "indigo",
];
const UNKNOWN_CLIENT_INITIALS: &str = "?";
const UNKNOWN_CLIENT_COLOR: &str = "gray";
const UNASSIGNED_NAME: &str = "Unassigned";

#[async_trait]
pub trait TaskDirectory: Send + Sync {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<WorkTask>, InfraError>;
}

pub trait TeamDirectory: Send + Sync {
    fn resolve_assignee_name(&self, assignee_id: &str) -> Option<String>;
}

pub trait ClientDirectory: Send + Sync {
    fn resolve_client_display(&self, client_name: &str) -> ClientDisplay;
}

#[derive(Debug, Default)]
pub struct InMemoryTaskDirectory {
    tasks: Mutex<HashMap<String, Vec<WorkTask>>>,
}

impl InMemoryTaskDirectory {
    /// Seeds `user_id`'s tasks; tasks that fail validation are skipped.
    pub fn with_tasks(user_id: &str, tasks: Vec<WorkTask>) -> Self {
        let directory = Self::default();
        let tasks = tasks
            .into_iter()
            .filter(|task| task.validate().is_ok())
            .collect();
        if let Ok(mut all) = directory.tasks.lock() {
            all.insert(user_id.to_string(), tasks);
        }
        directory
    }
}

#[async_trait]
impl TaskDirectory for InMemoryTaskDirectory {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<WorkTask>, InfraError> {
        let all = self
            .tasks
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("task directory lock poisoned: {error}")))?;
        Ok(all.get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTeamDirectory {
    names: HashMap<String, String>,
}

impl InMemoryTeamDirectory {
    pub fn new(names: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }
}

impl TeamDirectory for InMemoryTeamDirectory {
    fn resolve_assignee_name(&self, assignee_id: &str) -> Option<String> {
        self.names.get(assignee_id.trim()).cloned()
    }
}

/// Display name for an assignee, falling back to a placeholder.
pub fn assignee_display_name(team: &dyn TeamDirectory, assignee_id: Option<&str>) -> String {
    assignee_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|id| team.resolve_assignee_name(id))
        .unwrap_or_else(|| UNASSIGNED_NAME.to_string())
}

/// Derives initials and a stable color token from the client's name.
#[derive(Debug, Default, Clone, Copy)]
pub struct PaletteClientDirectory;

impl ClientDirectory for PaletteClientDirectory {
    fn resolve_client_display(&self, client_name: &str) -> ClientDisplay {
        let name = client_name.trim();
        let initials = name
            .split_whitespace()
            .filter_map(|word| word.chars().find(|ch| ch.is_alphanumeric()))
            .take(2)
            .flat_map(char::to_uppercase)
            .collect::<String>();
        if initials.is_empty() {
            return ClientDisplay {
                initials: UNKNOWN_CLIENT_INITIALS.to_string(),
                color_token: UNKNOWN_CLIENT_COLOR.to_string(),
            };
        }

        // FNV-1a over the lowercased name keeps the color stable across runs.
        let hash = name
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
            });
        let color = CLIENT_PALETTE[(hash % CLIENT_PALETTE.len() as u64) as usize];
        ClientDisplay {
            initials,
            color_token: color.to_string(),
        }
    }
}
