//! Inbox processing
//!
//! Routes each unprocessed inbox capture into a category table. Captures
//! with a `category:` prefix are routed deterministically; everything else
//! goes through the classifier, retried up to `max_retries` extra times.
//!
//! Every handled row is committed in its own transaction together with its
//! category row (if any) and exactly one `log_events` entry. A database
//! error aborts the run; rows committed before it stay committed.

#![allow(clippy::result_large_err)]

use crate::classifier::Classifier;
use rusqlite::Connection;
use sb_core::config::{Settings, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_RETRIES};
use sb_core::routing::{
    build_prompt, decide_classified, decide_prefixed, pre_route, Aliases, Classification,
    Decision, NewEntity, ReviewReason,
};
use sb_core::schema::{LOG_EVENT_NEEDS_REVIEW, LOG_EVENT_PROCESSED};
use sb_core::{log_op_end, log_op_error, log_op_start};
use sb_core_types::{Category, RunId};
use sb_store::errors::{from_rusqlite, Result};
use sb_store::{InboxItem, SqliteRepo};

/// Model name recorded for prefix-routed rows
pub const PREFIX_MODEL: &str = "prefix";

pub const DEFAULT_LIMIT: u32 = 10;

/// Category stored when the classifier names none of the four
const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOptions {
    /// Most rows handled in one run
    pub limit: u32,
    pub confidence_threshold: f64,
    /// Extra classifier attempts after the first
    pub max_retries: u32,
}

impl ProcessOptions {
    pub fn from_settings(settings: &Settings, limit: u32) -> Self {
        Self {
            limit,
            confidence_threshold: settings.confidence_threshold,
            max_retries: settings.max_retries,
        }
    }
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// What happened to one inbox row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    Processed(Category),
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub run_id: RunId,
    pub processed: usize,
    pub needs_review: usize,
}

impl ProcessReport {
    pub fn total(&self) -> usize {
        self.processed + self.needs_review
    }
}

/// Process up to `options.limit` unprocessed inbox rows, oldest first
pub fn process_inbox(
    conn: &mut Connection,
    classifier: &dyn Classifier,
    aliases: &Aliases,
    options: &ProcessOptions,
) -> Result<ProcessReport> {
    let run_id = RunId::new();
    log_op_start!(
        "process_inbox",
        run_id = run_id.as_str(),
        limit = options.limit,
        model = classifier.model()
    );
    let start = std::time::Instant::now();

    let result = process_inbox_impl(conn, classifier, aliases, options, run_id.clone())
        .map_err(|e| {
            log_op_error!(
                "process_inbox",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                run_id = run_id.as_str()
            );
            e
        })?;

    log_op_end!(
        "process_inbox",
        duration_ms = start.elapsed().as_millis() as u64,
        run_id = run_id.as_str(),
        processed = result.processed,
        needs_review = result.needs_review
    );

    Ok(result)
}

fn process_inbox_impl(
    conn: &mut Connection,
    classifier: &dyn Classifier,
    aliases: &Aliases,
    options: &ProcessOptions,
    run_id: RunId,
) -> Result<ProcessReport> {
    let items = SqliteRepo::fetch_unprocessed(conn, options.limit)?;
    let mut report = ProcessReport {
        run_id,
        processed: 0,
        needs_review: 0,
    };

    for item in &items {
        let outcome = match pre_route(&item.raw_text) {
            Some(route) => {
                let decision = decide_prefixed(&route, &item.raw_text, aliases);
                record_prefixed(conn, item, route.category, decision)
            }
            None => process_with_classifier(conn, item, classifier, aliases, options),
        }
        .map_err(|e| e.with_inbox_id(item.id))?;

        tracing::info!(inbox_id = item.id, outcome = ?outcome, "inbox item handled");
        match outcome {
            ItemOutcome::Processed(_) => report.processed += 1,
            ItemOutcome::NeedsReview => report.needs_review += 1,
        }
    }

    Ok(report)
}

fn record_prefixed(
    conn: &mut Connection,
    item: &InboxItem,
    category: Category,
    decision: Decision,
) -> Result<ItemOutcome> {
    let tx = conn.transaction().map_err(from_rusqlite)?;
    let outcome = match decision {
        Decision::Route(entity) => {
            let details = format!("prefix_route -> {}", category);
            record_route(&tx, item.id, &entity, 1.0, PREFIX_MODEL, &details)?
        }
        Decision::Review { reason, .. } => {
            let details = prefix_review_details(category, reason);
            record_review(
                &tx,
                item.id,
                Some(category.as_str()),
                Some(1.0),
                PREFIX_MODEL,
                reason.error_text(),
                &details,
            )?
        }
    };
    tx.commit().map_err(from_rusqlite)?;
    Ok(outcome)
}

fn process_with_classifier(
    conn: &mut Connection,
    item: &InboxItem,
    classifier: &dyn Classifier,
    aliases: &Aliases,
    options: &ProcessOptions,
) -> Result<ItemOutcome> {
    let model = classifier.model();
    let verdict = classify_with_retries(item, classifier, options.max_retries);

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let outcome = match verdict {
        Err(last_err) => record_review(&tx, item.id, None, None, model, &last_err, &last_err)?,
        Ok(result) => {
            let confidence = result.confidence;
            match decide_classified(&result, &item.raw_text, aliases, options.confidence_threshold)
            {
                Decision::Route(entity) => {
                    record_route(&tx, item.id, &entity, confidence, model, &result.to_json())?
                }
                Decision::Review {
                    category,
                    reason: ReviewReason::LowConfidence,
                } => record_review(
                    &tx,
                    item.id,
                    Some(category.map_or(UNKNOWN_CATEGORY, |c| c.as_str())),
                    Some(confidence),
                    model,
                    "",
                    &result.to_json(),
                )?,
                Decision::Review { category, reason } => record_review(
                    &tx,
                    item.id,
                    category.map(|c| c.as_str()),
                    Some(confidence),
                    model,
                    reason.error_text(),
                    reason.error_text(),
                )?,
            }
        }
    };
    tx.commit().map_err(from_rusqlite)?;
    Ok(outcome)
}

/// Event-log text for a prefix capture sent to review
fn prefix_review_details(category: Category, reason: ReviewReason) -> String {
    match reason {
        ReviewReason::EmptyAfterPrefix => format!("prefix {} but empty", category),
        other => format!("{} (prefix)", other.error_text()),
    }
}

/// Ask the classifier until it yields a JSON object; `Err` carries the last failure
fn classify_with_retries(
    item: &InboxItem,
    classifier: &dyn Classifier,
    max_retries: u32,
) -> std::result::Result<Classification, String> {
    let prompt = build_prompt(&item.raw_text);
    let mut last_err = String::new();

    for attempt in 0..=max_retries {
        match classifier.classify(&prompt) {
            Ok(output) => match Classification::from_output(&output) {
                Some(result) => return Ok(result),
                None => last_err = format!("invalid json (attempt {})", attempt),
            },
            Err(e) => last_err = e.message().to_string(),
        }
        tracing::debug!(inbox_id = item.id, attempt, error = %last_err, "classifier attempt failed");
    }

    Err(last_err)
}

fn record_route(
    conn: &Connection,
    inbox_id: i64,
    entity: &NewEntity,
    confidence: f64,
    model: &str,
    details: &str,
) -> Result<ItemOutcome> {
    let category = entity.category();
    SqliteRepo::insert_entity(conn, entity)?;
    SqliteRepo::mark_processed(conn, inbox_id, category, confidence, model)?;
    SqliteRepo::log_event(conn, LOG_EVENT_PROCESSED, Some(inbox_id), details)?;
    Ok(ItemOutcome::Processed(category))
}

fn record_review(
    conn: &Connection,
    inbox_id: i64,
    category: Option<&str>,
    confidence: Option<f64>,
    model: &str,
    error: &str,
    details: &str,
) -> Result<ItemOutcome> {
    SqliteRepo::mark_needs_review(conn, inbox_id, category, confidence, model, error)?;
    SqliteRepo::log_event(conn, LOG_EVENT_NEEDS_REVIEW, Some(inbox_id), details)?;
    Ok(ItemOutcome::NeedsReview)
}
