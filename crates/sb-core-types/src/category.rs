//! Categories and status vocabularies of the brain database
//!
//! Every value here is stored as a plain string column, so each enum
//! round-trips through `as_str` / `parse`.

use serde::{Deserialize, Serialize};

/// Category an inbox capture is routed into (one table each)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    People,
    Projects,
    Ideas,
    Admin,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::People,
        Category::Projects,
        Category::Ideas,
        Category::Admin,
    ];

    /// Stored name, which is also the table name
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::People => "people",
            Category::Projects => "projects",
            Category::Ideas => "ideas",
            Category::Admin => "admin",
        }
    }

    /// Parse a stored category name (exact, lowercase)
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an inbox row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboxStatus {
    Unprocessed,
    Processed,
    NeedsReview,
}

impl InboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboxStatus::Unprocessed => "unprocessed",
            InboxStatus::Processed => "processed",
            InboxStatus::NeedsReview => "needs_review",
        }
    }
}

impl std::fmt::Display for InboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Waiting,
    Blocked,
    Someday,
    Done,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        ProjectStatus::Active,
        ProjectStatus::Waiting,
        ProjectStatus::Blocked,
        ProjectStatus::Someday,
        ProjectStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Waiting => "waiting",
            ProjectStatus::Blocked => "blocked",
            ProjectStatus::Someday => "someday",
            ProjectStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }

    /// Parse, falling back to `Active` for anything unrecognised
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s.trim()).unwrap_or_default()
    }

    /// Whether the project still needs attention (counted by the summary)
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ProjectStatus::Active | ProjectStatus::Waiting | ProjectStatus::Blocked
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    #[default]
    Open,
    Done,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Open => "open",
            AdminStatus::Done => "done",
        }
    }

    /// Parse, falling back to `Open` for anything unrecognised
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim() {
            "done" => AdminStatus::Done,
            _ => AdminStatus::Open,
        }
    }
}
