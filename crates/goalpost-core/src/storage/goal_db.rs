//! SQLite-based storage for goals.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{DatabaseError, Result};
use crate::goal::{Goal, GoalField};

const GOAL_COLUMNS: &str = "goal_id, title, description, start_time, end_time, time_zone, \
                            reminder, created_date, calendar_event_id";

/// Goal row as stored, before timestamps are parsed.
struct GoalRow {
    goal_id: String,
    title: String,
    description: String,
    start_time: String,
    end_time: String,
    time_zone: String,
    reminder: u32,
    created_date: i64,
    calendar_event_id: Option<String>,
}

impl GoalRow {
    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            goal_id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            start_time: row.get(3)?,
            end_time: row.get(4)?,
            time_zone: row.get(5)?,
            reminder: row.get(6)?,
            created_date: row.get(7)?,
            calendar_event_id: row.get(8)?,
        })
    }

    fn into_goal(self) -> Result<Goal, DatabaseError> {
        let parse = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| DatabaseError::CorruptRow {
                    goal_id: self.goal_id.clone(),
                    message: format!("bad timestamp '{raw}': {e}"),
                })
        };
        let start_time = parse(&self.start_time)?;
        let end_time = parse(&self.end_time)?;
        Ok(Goal {
            goal_id: self.goal_id,
            title: self.title,
            description: self.description,
            start_time,
            end_time,
            time_zone: self.time_zone,
            reminder: self.reminder,
            created_date: self.created_date,
            calendar_event_id: self.calendar_event_id,
        })
    }
}

/// SQLite database for goal storage.
pub struct GoalDb {
    conn: Connection,
}

impl GoalDb {
    /// Open (or create) the database at an explicit path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS goals (
                goal_id           TEXT PRIMARY KEY,
                title             TEXT NOT NULL,
                description       TEXT NOT NULL DEFAULT '',
                start_time        TEXT NOT NULL,
                end_time          TEXT NOT NULL,
                time_zone         TEXT NOT NULL,
                reminder          INTEGER NOT NULL,
                created_date      INTEGER NOT NULL,
                calendar_event_id TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_goals_start_time ON goals(start_time);",
        )?;
        Ok(())
    }

    /// Insert a new goal.
    ///
    /// # Errors
    /// Returns an error if the insert fails (including a duplicate id).
    pub fn insert(&self, goal: &Goal) -> Result<()> {
        self.conn.execute(
            &format!("INSERT INTO goals ({GOAL_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
            params![
                goal.goal_id,
                goal.title,
                goal.description,
                goal.start_time.to_rfc3339(),
                goal.end_time.to_rfc3339(),
                goal.time_zone,
                goal.reminder,
                goal.created_date,
                goal.calendar_event_id,
            ],
        )?;
        Ok(())
    }

    /// Fetch a goal by id.
    pub fn get(&self, goal_id: &str) -> Result<Option<Goal>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {GOAL_COLUMNS} FROM goals WHERE goal_id = ?1"),
                params![goal_id],
                GoalRow::from_row,
            )
            .optional()?;
        Ok(row.map(GoalRow::into_goal).transpose()?)
    }

    /// All goals, earliest start first.
    pub fn list(&self) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM goals ORDER BY start_time, goal_id"
        ))?;
        let rows = stmt.query_map([], GoalRow::from_row)?;

        let mut goals = Vec::new();
        for row in rows {
            goals.push(row?.into_goal()?);
        }
        Ok(goals)
    }

    /// Overwrite every mutable column of an existing goal.
    ///
    /// Returns `false` if no goal has that id.
    pub fn update(&self, goal: &Goal) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE goals
             SET title = ?2, description = ?3, start_time = ?4, end_time = ?5,
                 time_zone = ?6, reminder = ?7, calendar_event_id = ?8
             WHERE goal_id = ?1",
            params![
                goal.goal_id,
                goal.title,
                goal.description,
                goal.start_time.to_rfc3339(),
                goal.end_time.to_rfc3339(),
                goal.time_zone,
                goal.reminder,
                goal.calendar_event_id,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Change one field of a stored goal, returning the updated goal, or
    /// `None` if no goal has that id.
    ///
    /// # Errors
    /// Returns a validation error when the value does not fit the field; the
    /// stored row is left unchanged.
    pub fn update_field(
        &self,
        goal_id: &str,
        field: GoalField,
        value: &serde_json::Value,
    ) -> Result<Option<Goal>> {
        let Some(mut goal) = self.get(goal_id)? else {
            return Ok(None);
        };
        goal.apply(field, value)?;
        self.update(&goal)?;
        Ok(Some(goal))
    }

    /// Delete a goal, returning it as it was stored.
    pub fn delete(&self, goal_id: &str) -> Result<Option<Goal>> {
        let Some(goal) = self.get(goal_id)? else {
            return Ok(None);
        };
        self.conn
            .execute("DELETE FROM goals WHERE goal_id = ?1", params![goal_id])?;
        Ok(Some(goal))
    }
}
