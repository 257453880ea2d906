//! SQLite repository implementation
//!
//! All writes take `&Connection`, so they run unchanged inside a
//! `Transaction` (which derefs to `Connection`).

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, inbox_not_found, Result};
use rusqlite::Connection;
use sb_core::routing::NewEntity;
use sb_core_types::{Category, InboxStatus};

/// Longest `log_events.details` value stored, in characters
pub const MAX_EVENT_DETAILS: usize = 2000;

/// An inbox row awaiting processing
#[derive(Debug, Clone, PartialEq)]
pub struct InboxItem {
    pub id: i64,
    pub raw_text: String,
}

/// SQLite repository for the brain database
pub struct SqliteRepo;

impl SqliteRepo {
    /// Add a capture to the inbox as unprocessed
    pub fn insert_inbox(conn: &Connection, raw_text: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO inbox (raw_text, status) VALUES (?1, ?2)",
            rusqlite::params![raw_text, InboxStatus::Unprocessed.as_str()],
        )
        .map_err(from_rusqlite)?;
        Ok(conn.last_insert_rowid())
    }

    /// Oldest unprocessed inbox rows, at most `limit`
    pub fn fetch_unprocessed(conn: &Connection, limit: u32) -> Result<Vec<InboxItem>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, raw_text FROM inbox WHERE status = ?1 ORDER BY id ASC LIMIT ?2",
            )
            .map_err(from_rusqlite)?;
        let items = stmt
            .query_map(
                rusqlite::params![InboxStatus::Unprocessed.as_str(), limit],
                |row| {
                    Ok(InboxItem {
                        id: row.get(0)?,
                        raw_text: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                    })
                },
            )
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        Ok(items)
    }

    /// Insert a routed entity into its category table, returning the new row id
    pub fn insert_entity(conn: &Connection, entity: &NewEntity) -> Result<i64> {
        let inserted = match entity {
            NewEntity::Person {
                name,
                context,
                follow_up,
                last_contact,
            } => conn.execute(
                "INSERT INTO people (name, context, follow_up, last_contact, updated_at)
                 VALUES (?1, ?2, ?3, ?4, datetime('now'))",
                rusqlite::params![name, context, follow_up, last_contact],
            ),
            NewEntity::Project {
                name,
                status,
                next_action,
                notes,
            } => conn.execute(
                "INSERT INTO projects (name, status, next_action, notes, updated_at)
                 VALUES (?1, ?2, ?3, ?4, datetime('now'))",
                rusqlite::params![name, status.as_str(), next_action, notes],
            ),
            NewEntity::Idea {
                title,
                one_liner,
                notes,
            } => conn.execute(
                "INSERT INTO ideas (title, one_liner, notes) VALUES (?1, ?2, ?3)",
                rusqlite::params![title, one_liner, notes],
            ),
            NewEntity::Admin {
                task,
                due_date,
                status,
            } => conn.execute(
                "INSERT INTO admin (task, due_date, status) VALUES (?1, ?2, ?3)",
                rusqlite::params![task, due_date, status.as_str()],
            ),
        };
        inserted.map_err(from_rusqlite)?;

        let id = conn.last_insert_rowid();
        tracing::debug!(category = %entity.category(), id, "entity inserted");
        Ok(id)
    }

    /// Mark an inbox row processed into `category`
    pub fn mark_processed(
        conn: &Connection,
        inbox_id: i64,
        category: Category,
        confidence: f64,
        model: &str,
    ) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE inbox SET status = ?1, category = ?2, confidence = ?3, model = ?4, error = ''
                 WHERE id = ?5",
                rusqlite::params![
                    InboxStatus::Processed.as_str(),
                    category.as_str(),
                    confidence,
                    model,
                    inbox_id
                ],
            )
            .map_err(from_rusqlite)?;
        expect_one_row(changed, inbox_id)
    }

    /// Send an inbox row to review
    ///
    /// `category` and `confidence` leave the stored values untouched when `None`.
    pub fn mark_needs_review(
        conn: &Connection,
        inbox_id: i64,
        category: Option<&str>,
        confidence: Option<f64>,
        model: &str,
        error: &str,
    ) -> Result<()> {
        let changed = conn
            .execute(
                "UPDATE inbox SET status = ?1,
                    category = COALESCE(?2, category),
                    confidence = COALESCE(?3, confidence),
                    model = ?4,
                    error = ?5
                 WHERE id = ?6",
                rusqlite::params![
                    InboxStatus::NeedsReview.as_str(),
                    category,
                    confidence,
                    model,
                    error,
                    inbox_id
                ],
            )
            .map_err(from_rusqlite)?;
        expect_one_row(changed, inbox_id)
    }

    /// Append to the event log; `details` is cut to [`MAX_EVENT_DETAILS`] characters
    pub fn log_event(
        conn: &Connection,
        event: &str,
        inbox_id: Option<i64>,
        details: &str,
    ) -> Result<()> {
        let details: String = details.chars().take(MAX_EVENT_DETAILS).collect();
        conn.execute(
            "INSERT INTO log_events (event, inbox_id, details) VALUES (?1, ?2, ?3)",
            rusqlite::params![event, inbox_id, details],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }
}

fn expect_one_row(changed: usize, inbox_id: i64) -> Result<()> {
    if changed == 0 {
        return Err(inbox_not_found(inbox_id));
    }
    Ok(())
}
