use crate::domain::models::{ItemKind, ScheduledItem};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::open_database;
use async_trait::async_trait;
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage for one user's day schedules, always written as a whole day.
#[async_trait]
pub trait DayScheduleRepository: Send + Sync {
    async fn load_by_date(&self, user_id: &str, date: &str)
    -> Result<Vec<ScheduledItem>, InfraError>;

    async fn delete_by_date(&self, user_id: &str, date: &str) -> Result<(), InfraError>;

    async fn insert_items(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError>;

    /// Delete-then-insert. Not atomic: a failure between the two phases leaves
    /// the day empty until the next successful replace.
    async fn replace_by_date(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError> {
        self.delete_by_date(user_id, date).await?;
        self.insert_items(user_id, date, items).await
    }
}

#[derive(Debug, Clone)]
pub struct SqliteDayScheduleRepository {
    db_path: PathBuf,
}

impl SqliteDayScheduleRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        open_database(&self.db_path)
    }
}

fn insert_rows(
    connection: &Connection,
    user_id: &str,
    date: &str,
    items: &[ScheduledItem],
) -> Result<(), InfraError> {
    let mut statement = connection.prepare(
        "INSERT INTO scheduled_items
           (user_id, date, id, kind, ref_id, title, color, start_slot, duration_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for item in items {
        item.validate().map_err(InfraError::Persistence)?;
        if item.date != date {
            return Err(InfraError::Persistence(format!(
                "item {} belongs to {}, not {}",
                item.id, item.date, date
            )));
        }
        statement.execute(params![
            user_id,
            date,
            item.id,
            item.kind.as_str(),
            item.ref_id,
            item.title,
            item.color,
            item.start_slot,
            item.duration_minutes,
        ])?;
    }
    Ok(())
}

#[async_trait]
impl DayScheduleRepository for SqliteDayScheduleRepository {
    async fn load_by_date(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Vec<ScheduledItem>, InfraError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, kind, ref_id, title, color, start_slot, duration_minutes
             FROM scheduled_items
             WHERE user_id = ?1 AND date = ?2
             ORDER BY start_slot, id",
        )?;
        let rows = statement.query_map(params![user_id, date], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, u32>(6)?,
            ))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, kind_raw, ref_id, title, color, start_slot, duration_minutes) = row?;
            let kind = ItemKind::parse(&kind_raw).ok_or_else(|| {
                InfraError::Persistence(format!(
                    "invalid scheduled_items.kind '{kind_raw}' for item {id}"
                ))
            })?;
            items.push(ScheduledItem {
                id,
                date: date.to_string(),
                kind,
                ref_id,
                title,
                color,
                start_slot,
                duration_minutes,
            });
        }
        Ok(items)
    }

    async fn delete_by_date(&self, user_id: &str, date: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "DELETE FROM scheduled_items WHERE user_id = ?1 AND date = ?2",
            params![user_id, date],
        )?;
        Ok(())
    }

    async fn insert_items(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError> {
        let connection = self.connect()?;
        insert_rows(&connection, user_id, date, items)
    }

    /// SQLite can do both phases in one transaction, so it does.
    async fn replace_by_date(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        transaction.execute(
            "DELETE FROM scheduled_items WHERE user_id = ?1 AND date = ?2",
            params![user_id, date],
        )?;
        insert_rows(&transaction, user_id, date, items)?;
        transaction.commit()?;
        Ok(())
    }
}

type DayKey = (String, String);

#[derive(Debug, Default)]
pub struct InMemoryDayScheduleRepository {
    days: Mutex<HashMap<DayKey, Vec<ScheduledItem>>>,
}

impl InMemoryDayScheduleRepository {
    fn lock_days(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<DayKey, Vec<ScheduledItem>>>, InfraError> {
        self.days
            .lock()
            .map_err(|error| InfraError::Persistence(format!("schedule store lock poisoned: {error}")))
    }

    fn key(user_id: &str, date: &str) -> DayKey {
        (user_id.trim().to_string(), date.trim().to_string())
    }
}

#[async_trait]
impl DayScheduleRepository for InMemoryDayScheduleRepository {
    async fn load_by_date(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Vec<ScheduledItem>, InfraError> {
        let days = self.lock_days()?;
        Ok(days
            .get(&Self::key(user_id, date))
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_by_date(&self, user_id: &str, date: &str) -> Result<(), InfraError> {
        let mut days = self.lock_days()?;
        days.remove(&Self::key(user_id, date));
        Ok(())
    }

    async fn insert_items(
        &self,
        user_id: &str,
        date: &str,
        items: &[ScheduledItem],
    ) -> Result<(), InfraError> {
        let mut days = self.lock_days()?;
        days.entry(Self::key(user_id, date))
            .or_default()
            .extend(items.iter().cloned());
        Ok(())
    }
}
