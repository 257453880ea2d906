//! Summary counts and their fixed-width rendering

use serde::Serialize;

/// Column the counts start at
pub const LABEL_WIDTH: usize = 20;

/// The six headline counts of the brain database
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub inbox_unprocessed: i64,
    pub needs_review: i64,
    /// Projects that are active, waiting or blocked
    pub projects_active: i64,
    pub admin_open: i64,
    pub people: i64,
    pub ideas: i64,
}

impl Summary {
    /// Labeled counts in display order
    pub fn rows(&self) -> [(&'static str, i64); 6] {
        [
            ("Inbox unprocessed", self.inbox_unprocessed),
            ("Needs review", self.needs_review),
            ("Projects active", self.projects_active),
            ("Admin open", self.admin_open),
            ("People", self.people),
            ("Ideas", self.ideas),
        ]
    }

    /// One `Label:<pad>count` line per metric, newline-terminated
    pub fn render(&self) -> String {
        self.rows()
            .iter()
            .map(|(label, count)| {
                format!("{:<width$}{}\n", format!("{}:", label), count, width = LABEL_WIDTH)
            })
            .collect()
    }
}

impl std::fmt::Display for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}
