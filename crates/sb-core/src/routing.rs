//! Inbox routing
//!
//! Turns one raw inbox capture into a [`Decision`]: either a new row for one
//! of the category tables, or a needs-review verdict with a reason. Two entry
//! points feed the same decision type:
//!
//! - [`pre_route`] + [`decide_prefixed`]: deterministic `category:` prefixes
//! - [`Classification::from_output`] + [`decide_classified`]: classifier JSON
//!
//! Nothing here touches the database or spawns processes.

use crate::errors::SecondBrainError;
use regex::Regex;
use sb_core_types::{AdminStatus, Category, ProjectStatus};
use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

/// Sorter prompt; the raw capture text is appended verbatim
pub const SORTER_PROMPT: &str = r#"
You are a strict JSON generator for a personal second-brain sorter.

Task: classify the user text into one of: people, projects, ideas, admin.
Then extract the relevant fields for that category.

Return ONLY valid JSON. No markdown. No commentary.

Schema:
{
  "category": "people|projects|ideas|admin|unknown",
  "confidence": 0.0-1.0,
  "fields": { ...category-specific fields... },
  "title": "short human-friendly name"
}

Category field rules:

people.fields:
- name: string (required; if missing -> category "unknown" with low confidence)
- context: string (optional)
- follow_up: string (optional; specific next follow-up)
- last_contact: string (optional; ISO date YYYY-MM-DD if clearly present)

projects.fields:
- name: string (required)
- status: active|waiting|blocked|someday|done (default active)
- next_action: string (optional but preferred; must be concrete if possible)
- notes: string (optional)

ideas.fields:
- title: string (required)
- one_liner: string (optional; <= 25 words)
- notes: string (optional)

admin.fields:
- task: string (required)
- due_date: string (optional; ISO date YYYY-MM-DD if clear)
- status: open|done (default open)

If uncertain, set category="unknown" and confidence <= 0.50.

User text:
"#;

/// Full classifier prompt for one capture
pub fn build_prompt(raw_text: &str) -> String {
    format!("{}{}", SORTER_PROMPT, raw_text)
}

const PREFIXES: [(&str, Category); 7] = [
    ("admin:", Category::Admin),
    ("project:", Category::Projects),
    ("projects:", Category::Projects),
    ("idea:", Category::Ideas),
    ("ideas:", Category::Ideas),
    ("person:", Category::People),
    ("people:", Category::People),
];

const FAMILY_WORDS: [&str; 4] = ["mom", "mother", "dad", "father"];

/// A capture that named its own category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRoute {
    pub category: Category,
    /// Text after the prefix, trimmed; may be empty
    pub text: String,
}

/// Match a case-insensitive `category:` prefix on the trimmed capture
pub fn pre_route(raw: &str) -> Option<PrefixRoute> {
    let s = raw.trim();
    PREFIXES.iter().find_map(|(prefix, category)| {
        let head = s.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix).then(|| PrefixRoute {
            category: *category,
            text: s[prefix.len()..].trim().to_string(),
        })
    })
}

// ---------- Aliases ----------

/// Case-insensitive person aliases (`"mom" -> "Margaret"`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aliases {
    map: HashMap<String, String>,
}

impl Aliases {
    pub fn from_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            map: entries
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Parse an alias file (a JSON object of alias to name)
    pub fn parse(path: &Path, content: &str) -> Result<Self, SecondBrainError> {
        let map: HashMap<String, String> =
            serde_json::from_str(content).map_err(|e| SecondBrainError::InvalidAliases {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self::from_map(map))
    }

    /// Load the alias file; a missing or unreadable file yields no aliases
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "no alias file");
                return Self::default();
            }
        };
        Self::parse(path, &content).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring alias file");
            Self::default()
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

fn family_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(mom|mother|dad|father)\b").expect("family word pattern is valid")
    })
}

fn json_object_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object span pattern is valid"))
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Find a family word (`mom`, `dad`, ...) in free text and name the person
///
/// Aliased words resolve through `aliases`; others are title-cased. A word
/// aliased to a blank name yields `None`.
pub fn infer_person_name(raw: &str, aliases: &Aliases) -> Option<String> {
    let lowered = raw.trim().to_lowercase();
    let word = family_word_re().captures(&lowered)?.get(1)?.as_str();
    match aliases.get(word) {
        Some(alias) => non_blank(alias),
        None => Some(title_case(word)),
    }
}

fn non_blank(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Resolve the name given after a `person:` prefix
fn resolve_prefixed_person(text: &str, aliases: &Aliases) -> Option<String> {
    let name = text.trim();
    if let Some(alias) = aliases.get(name) {
        return non_blank(alias);
    }
    let lowered = name.to_lowercase();
    if FAMILY_WORDS.contains(&lowered.as_str()) {
        return infer_person_name(name, aliases).or_else(|| Some(title_case(name)));
    }
    (!name.is_empty()).then(|| name.to_string())
}

// ---------- Decisions ----------

/// A row to insert into one of the category tables
#[derive(Debug, Clone, PartialEq)]
pub enum NewEntity {
    Person {
        name: String,
        context: String,
        follow_up: String,
        last_contact: String,
    },
    Project {
        name: String,
        status: ProjectStatus,
        next_action: String,
        notes: String,
    },
    Idea {
        title: String,
        one_liner: String,
        notes: String,
    },
    Admin {
        task: String,
        due_date: String,
        status: AdminStatus,
    },
}

impl NewEntity {
    pub fn category(&self) -> Category {
        match self {
            NewEntity::Person { .. } => Category::People,
            NewEntity::Project { .. } => Category::Projects,
            NewEntity::Idea { .. } => Category::Ideas,
            NewEntity::Admin { .. } => Category::Admin,
        }
    }
}

/// Why a capture was sent to review
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewReason {
    EmptyAfterPrefix,
    MissingPersonName,
    MissingProjectName,
    MissingIdeaTitle,
    MissingAdminTask,
    /// Unknown category or confidence under the threshold
    LowConfidence,
}

impl ReviewReason {
    /// Text stored in `inbox.error` (empty for low confidence)
    pub fn error_text(&self) -> &'static str {
        match self {
            ReviewReason::EmptyAfterPrefix => "empty after prefix",
            ReviewReason::MissingPersonName => "missing person name",
            ReviewReason::MissingProjectName => "missing project name",
            ReviewReason::MissingIdeaTitle => "missing idea title",
            ReviewReason::MissingAdminTask => "missing admin task",
            ReviewReason::LowConfidence => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Route(NewEntity),
    Review {
        /// `None` when the classifier named no known category
        category: Option<Category>,
        reason: ReviewReason,
    },
}

/// Decide a prefix-routed capture; `raw` is the untouched capture text
pub fn decide_prefixed(route: &PrefixRoute, raw: &str, aliases: &Aliases) -> Decision {
    let review = |reason| Decision::Review {
        category: Some(route.category),
        reason,
    };

    if route.text.is_empty() {
        return review(ReviewReason::EmptyAfterPrefix);
    }

    let clean = route.text.clone();
    let entity = match route.category {
        Category::Admin => NewEntity::Admin {
            task: clean,
            due_date: String::new(),
            status: AdminStatus::Open,
        },
        Category::Projects => NewEntity::Project {
            name: clean,
            status: ProjectStatus::Active,
            next_action: String::new(),
            notes: String::new(),
        },
        Category::Ideas => NewEntity::Idea {
            title: clean,
            one_liner: String::new(),
            notes: String::new(),
        },
        Category::People => match resolve_prefixed_person(&clean, aliases) {
            Some(name) => NewEntity::Person {
                name,
                context: String::new(),
                follow_up: raw.to_string(),
                last_contact: String::new(),
            },
            None => return review(ReviewReason::MissingPersonName),
        },
    };
    Decision::Route(entity)
}

// ---------- Classifier output ----------

/// Extract the first usable JSON object from model output
///
/// Tries the whole (trimmed) text first, then the span from the first `{`
/// to the last `}`. An empty object counts as no object.
pub fn extract_json_object(output: &str) -> Option<Map<String, Value>> {
    let s = output.trim();
    let value = serde_json::from_str::<Value>(s).ok().or_else(|| {
        let span = json_object_re().find(s)?;
        serde_json::from_str::<Value>(span.as_str()).ok()
    })?;
    match value {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Event-log JSON style: spaced separators, ASCII-only strings
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Leniently-typed classifier verdict
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Category as reported, `"unknown"` when absent
    pub category: String,
    pub confidence: f64,
    pub fields: Map<String, Value>,
    pub title: Option<String>,
    /// The whole object, kept for the event log
    pub raw: Map<String, Value>,
}

impl Classification {
    /// Parse model output; `None` when it holds no JSON object
    pub fn from_output(output: &str) -> Option<Self> {
        extract_json_object(output).map(Self::from_object)
    }

    pub fn from_object(raw: Map<String, Value>) -> Self {
        let category = raw
            .get("category")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let confidence = match raw.get("confidence") {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        };
        let fields = match raw.get("fields") {
            Some(Value::Object(f)) => f.clone(),
            _ => Map::new(),
        };
        let title = raw
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            category,
            confidence,
            fields,
            title,
            raw,
        }
    }

    /// Recognised category, if any
    pub fn known_category(&self) -> Option<Category> {
        Category::parse(&self.category)
    }

    /// JSON of the whole verdict for the event log
    ///
    /// Keys keep the model's order; separators are `", "` and `": "` and
    /// non-ASCII characters are `\u` escaped.
    pub fn to_json(&self) -> String {
        let value = Value::Object(self.raw.clone());
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
        match value.serialize(&mut ser) {
            Ok(()) => String::from_utf8(out).unwrap_or_else(|_| value.to_string()),
            Err(_) => value.to_string(),
        }
    }

    fn field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    fn required_field(&self, key: &str) -> Option<String> {
        let v = self.field(key);
        let v = v.trim();
        (!v.is_empty()).then(|| v.to_string())
    }
}

/// Decide a classifier verdict
pub fn decide_classified(
    result: &Classification,
    raw: &str,
    aliases: &Aliases,
    threshold: f64,
) -> Decision {
    let category = match result.known_category() {
        Some(c) if result.confidence >= threshold => c,
        known => {
            return Decision::Review {
                category: known,
                reason: ReviewReason::LowConfidence,
            }
        }
    };

    let review = |reason| Decision::Review {
        category: Some(category),
        reason,
    };

    let entity = match category {
        Category::People => {
            let name = result
                .required_field("name")
                .or_else(|| infer_person_name(raw, aliases));
            match name {
                Some(name) => NewEntity::Person {
                    name,
                    context: result.field("context"),
                    follow_up: result.field("follow_up"),
                    last_contact: result.field("last_contact"),
                },
                None => return review(ReviewReason::MissingPersonName),
            }
        }
        Category::Projects => match result.required_field("name") {
            Some(name) => NewEntity::Project {
                name,
                status: ProjectStatus::parse_or_default(&result.field("status")),
                next_action: result.field("next_action"),
                notes: result.field("notes"),
            },
            None => return review(ReviewReason::MissingProjectName),
        },
        Category::Ideas => {
            let title = result.required_field("title").or_else(|| {
                result
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
            });
            match title {
                Some(title) => NewEntity::Idea {
                    title,
                    one_liner: result.field("one_liner"),
                    notes: result.field("notes"),
                },
                None => return review(ReviewReason::MissingIdeaTitle),
            }
        }
        Category::Admin => match result.required_field("task") {
            Some(task) => NewEntity::Admin {
                task,
                due_date: result.field("due_date"),
                status: AdminStatus::parse_or_default(&result.field("status")),
            },
            None => return review(ReviewReason::MissingAdminTask),
        },
    };
    Decision::Route(entity)
}
