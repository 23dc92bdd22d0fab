//! Schedule planning for background runs.
//!
//! [`SyncScheduler::plan`] derives the jobs a host scheduler should register
//! from the configuration. Cron parsing and timer delivery belong to the host;
//! when a job fires, the host hands it back to [`SyncScheduler::execute`],
//! which runs it through the coordinator and therefore through the same run
//! lock as on-demand runs.

use crate::{coordinator::SyncCoordinator, grouping::Grouping, result::SyncResult, Result};
use core_runtime::config::CoreConfig;
use std::sync::Arc;
use tracing::{debug, info};

pub const GLOBAL_JOB_ID: &str = "global_sync";
pub const CLEANUP_JOB_ID: &str = "cleanup_broken_symlinks";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Every grouping except the excluded names, resolved when the job fires
    Global { exclude: Vec<String> },
    Group { name: String },
    Cleanup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: String,
    pub cron: String,
    pub kind: JobKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Synced(Vec<SyncResult>),
    /// Nothing left to sync after exclusions
    Skipped,
    Cleaned(usize),
}

pub struct SyncScheduler {
    coordinator: Arc<SyncCoordinator>,
}

impl SyncScheduler {
    pub fn new(coordinator: Arc<SyncCoordinator>) -> Self {
        Self { coordinator }
    }

    /// Jobs to register for `config`.
    pub fn plan(config: &CoreConfig) -> Vec<ScheduledJob> {
        let settings = &config.scheduler;
        let mut jobs = Vec::new();

        let global_cron = settings.global_schedule.trim();
        if settings.global_enabled && !global_cron.is_empty() {
            jobs.push(ScheduledJob {
                id: GLOBAL_JOB_ID.to_string(),
                cron: global_cron.to_string(),
                kind: JobKind::Global {
                    exclude: settings.global_exclude.clone(),
                },
            });
        }

        for record in &config.groups {
            let Ok(grouping) = Grouping::from_record(record) else {
                continue;
            };
            if let Some(cron) = grouping.schedule {
                jobs.push(ScheduledJob {
                    id: format!("group_sync_{}", grouping.name),
                    cron: cron.trim().to_string(),
                    kind: JobKind::Group {
                        name: grouping.name,
                    },
                });
            }
        }

        let cleanup_cron = settings.cleanup_schedule.trim();
        if settings.cleanup_enabled && !cleanup_cron.is_empty() {
            jobs.push(ScheduledJob {
                id: CLEANUP_JOB_ID.to_string(),
                cron: cleanup_cron.to_string(),
                kind: JobKind::Cleanup,
            });
        }

        debug!(jobs = jobs.len(), "Planned scheduled jobs");
        jobs
    }

    /// Run a fired job against the current configuration.
    pub async fn execute(&self, job: &ScheduledJob, config: &CoreConfig) -> Result<JobOutcome> {
        match &job.kind {
            JobKind::Global { exclude } => {
                let names: Vec<String> = config
                    .group_names()
                    .into_iter()
                    .filter(|name| !exclude.contains(name))
                    .collect();

                if names.is_empty() {
                    info!(job = %job.id, "Background global sync skipped: no groupings after exclusions");
                    return Ok(JobOutcome::Skipped);
                }

                info!(job = %job.id, groupings = names.len(), "Background global sync starting");
                let results = self.coordinator.run(config, false, Some(&names)).await?;
                Ok(JobOutcome::Synced(results))
            }
            JobKind::Group { name } => {
                info!(job = %job.id, grouping = %name, "Background sync starting");
                let results = self
                    .coordinator
                    .run(config, false, Some(std::slice::from_ref(name)))
                    .await?;
                Ok(JobOutcome::Synced(results))
            }
            JobKind::Cleanup => {
                let removed = self.coordinator.cleanup_broken_symlinks(config).await?;
                Ok(JobOutcome::Cleaned(removed))
            }
        }
    }
}
