//! Summary query

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use sb_core::Summary;
use sb_core_types::{AdminStatus, InboxStatus, ProjectStatus};

/// One aggregate statement for all six summary counts
///
/// The project status list is every status for which
/// [`ProjectStatus::is_open`] holds.
pub fn summary_sql() -> String {
    let open_projects = ProjectStatus::ALL
        .into_iter()
        .filter(ProjectStatus::is_open)
        .map(|st| format!("'{}'", st.as_str()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "SELECT
    (SELECT COUNT(*) FROM inbox WHERE status = '{unprocessed}'),
    (SELECT COUNT(*) FROM inbox WHERE status = '{needs_review}'),
    (SELECT COUNT(*) FROM projects WHERE status IN ({open_projects})),
    (SELECT COUNT(*) FROM admin WHERE status = '{admin_open}'),
    (SELECT COUNT(*) FROM people),
    (SELECT COUNT(*) FROM ideas)",
        unprocessed = InboxStatus::Unprocessed.as_str(),
        needs_review = InboxStatus::NeedsReview.as_str(),
        open_projects = open_projects,
        admin_open = AdminStatus::Open.as_str(),
    )
}

/// Compute the summary counts
pub fn load_summary(conn: &Connection) -> Result<Summary> {
    conn.query_row(&summary_sql(), [], |row| {
        Ok(Summary {
            inbox_unprocessed: row.get(0)?,
            needs_review: row.get(1)?,
            projects_active: row.get(2)?,
            admin_open: row.get(3)?,
            people: row.get(4)?,
            ideas: row.get(5)?,
        })
    })
    .map_err(|e| from_rusqlite(e).with_op("load_summary"))
}
