//! # Sync Module
//!
//! Materializes groupings as directories of symlinks inside the media
//! library.
//!
//! ## Overview
//!
//! Each run re-derives every grouping from its declarative source (metadata
//! filter, boolean rule expression or external ranked list), orders the
//! matched catalog items and reconciles the grouping's directory to match.
//!
//! ## Components
//!
//! - **Rule Evaluator** (`rules`): Parses `AND` / `OR` / `AND NOT` / `OR NOT` expressions and folds them per item
//! - **Groupings** (`grouping`): Validated grouping definitions and the seasonal gate
//! - **Reconciler** (`reconciler`): Path translation, numbered symlinks, dry-run previews and the broken-link sweep
//! - **Covers** (`covers`): Cover image lookup
//! - **Sync Coordinator** (`coordinator`): Serialized runs over all groupings with per-grouping failure isolation
//! - **Scheduler** (`scheduler`): Background job planning and execution

pub mod coordinator;
pub mod covers;
pub mod error;
pub mod grouping;
pub mod reconciler;
pub mod result;
pub mod rules;
pub mod scheduler;

pub use coordinator::{SyncCoordinator, RECOMMENDATION_SEED_LIMIT};
pub use covers::{CoverStore, DirectoryCoverStore};
pub use error::{Result, SyncError};
pub use grouping::{Grouping, MonthDay, SeasonalWindow, SourceKind};
pub use reconciler::{sweep_broken_symlinks, Preview, Reconciler};
pub use result::{ErrorKind, PreviewItem, SyncResult, SyncStatus, PREVIEW_LIMIT};
pub use rules::{evaluate, parse_expression, Rule, RuleOperator};
pub use scheduler::{JobKind, JobOutcome, ScheduledJob, SyncScheduler};
