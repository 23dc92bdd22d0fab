//! Grouping definitions validated from configuration records.
//!
//! A grouping is stored as a loose JSON object. [`Grouping::from_record`]
//! turns it into a typed definition once per run; the record itself is never
//! written back.

use crate::error::{Result, SyncError};
use crate::rules::{self, Rule};
use bridge_traits::time::Clock;
use chrono::{Datelike, NaiveDate};
use core_library::{MetadataField, SortOrder, WatchState};
use core_providers::ListProvider;
use serde_json::{Map, Value};
use std::fmt;
use tracing::warn;

/// Where a grouping's items come from.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Server-side filter on one field; `None` selects every movie and series
    MetadataFilter(Option<MetadataField>),
    /// Rule chain evaluated against the full library snapshot
    Expression(Vec<Rule>),
    /// Ranked ids from an external list
    ExternalList(ListProvider),
}

/// Calendar day without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// Parse `MM-DD`. February 29 is accepted.
    pub fn parse(value: &str) -> Option<Self> {
        let (month, day) = value.trim().split_once('-')?;
        if month.len() != 2 || day.len() != 2 {
            return None;
        }
        let month: u32 = month.parse().ok()?;
        let day: u32 = day.parse().ok()?;
        NaiveDate::from_ymd_opt(2000, month, day)?;
        Some(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Half-open `[start, end)` window of calendar days, wrapping past
/// December 31 when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonalWindow {
    pub start: MonthDay,
    pub end: MonthDay,
}

impl SeasonalWindow {
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self {
            start: MonthDay::parse(start)?,
            end: MonthDay::parse(end)?,
        })
    }

    pub fn contains(&self, day: MonthDay) -> bool {
        if self.start <= self.end {
            self.start <= day && day < self.end
        } else {
            day >= self.start || day < self.end
        }
    }

    pub fn in_season(&self, clock: &dyn Clock) -> bool {
        self.contains(MonthDay::of(clock.local_now().date()))
    }
}

/// A validated grouping definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping {
    pub name: String,
    pub source: SourceKind,
    /// Filter value, list identifier or user id, depending on `source`
    pub source_value: String,
    pub sort_order: SortOrder,
    pub watch_state: WatchState,
    /// Present only when seasonal filtering is on and both bounds parse
    pub seasonal_window: Option<SeasonalWindow>,
    /// Cron expression, present only when per-grouping scheduling is on
    pub schedule: Option<String>,
}

fn text(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        _ => false,
    }
}

impl Grouping {
    /// Validate a configuration record.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidGrouping`] when the record is not an object
    /// or its name is empty or not usable as a directory name.
    pub fn from_record(record: &Value) -> Result<Self> {
        let object = record
            .as_object()
            .ok_or_else(|| SyncError::InvalidGrouping("record is not an object".to_string()))?;

        let name = text(object, "name").trim().to_string();
        if name.is_empty() {
            return Err(SyncError::InvalidGrouping("Empty group name".to_string()));
        }
        if name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(SyncError::InvalidGrouping(format!(
                "{:?} cannot be used as a directory name",
                name
            )));
        }

        let source_type = text(object, "source_type");
        let source_value = text(object, "source_value");

        let inline_rules = object
            .get("rules")
            .and_then(Value::as_array)
            .filter(|rules| !rules.is_empty());

        let source = if let Some(provider) = ListProvider::from_source_type(&source_type) {
            SourceKind::ExternalList(provider)
        } else if let Some(records) = inline_rules {
            SourceKind::Expression(rules::rules_from_records(records))
        } else {
            match MetadataField::parse(&source_type) {
                Some(field) if rules::is_expression(&source_value) => {
                    SourceKind::Expression(rules::parse_expression(&source_value, field))
                }
                Some(field) => SourceKind::MetadataFilter(Some(field)),
                None => {
                    if !source_type.trim().is_empty() {
                        warn!(grouping = %name, source_type = %source_type, "Unknown source type, syncing unfiltered");
                    }
                    SourceKind::MetadataFilter(None)
                }
            }
        };

        let sort_order = SortOrder::parse(&text(object, "sort_order"));
        if !sort_order.is_recognized() {
            warn!(grouping = %name, sort_order = %sort_order.as_str(), "Unknown sort order, keeping item order");
        }

        let seasonal_window = if flag(object, "seasonal_enabled") {
            let start = text(object, "seasonal_start");
            let end = text(object, "seasonal_end");
            let window = SeasonalWindow::parse(&start, &end);
            if window.is_none() {
                warn!(grouping = %name, start = %start, end = %end, "Malformed seasonal window, treating as always in season");
            }
            window
        } else {
            None
        };

        let schedule = Some(text(object, "schedule"))
            .filter(|cron| flag(object, "schedule_enabled") && !cron.trim().is_empty());

        Ok(Self {
            name,
            source,
            source_value,
            sort_order,
            watch_state: WatchState::parse(&text(object, "watch_state")),
            seasonal_window,
            schedule,
        })
    }

    /// Whether the grouping should be materialized today.
    pub fn in_season(&self, clock: &dyn Clock) -> bool {
        self.seasonal_window
            .map_or(true, |window| window.in_season(clock))
    }
}
