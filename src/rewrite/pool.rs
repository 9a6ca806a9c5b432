//! Worker pool running one remap job per project.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use crossbeam::channel;

use super::error::{RemapWarning, RewriteError};
use super::project::{Project, ProjectStats};

#[derive(Debug)]
pub struct ProjectReport {
    pub name: String,
    pub outcome: Result<ProjectStats, RewriteError>,
}

/// Result of every project in a run, sorted by project name.
#[derive(Debug, Default)]
pub struct RemapReport {
    pub projects: Vec<ProjectReport>,
}

impl RemapReport {
    pub fn succeeded(&self) -> impl Iterator<Item = (&str, &ProjectStats)> {
        self.projects
            .iter()
            .filter_map(|p| p.outcome.as_ref().ok().map(|s| (p.name.as_str(), s)))
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &RewriteError)> {
        self.projects
            .iter()
            .filter_map(|p| p.outcome.as_ref().err().map(|e| (p.name.as_str(), e)))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RemapWarning> {
        self.succeeded().flat_map(|(_, stats)| stats.warnings.iter())
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none() && self.warnings().next().is_none()
    }
}

impl fmt::Display for RemapReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units: usize = self.succeeded().map(|(_, s)| s.units).sum();
        write!(
            f,
            "{} projects remapped, {} failed, {} units, {} warnings",
            self.succeeded().count(),
            self.failed().count(),
            units,
            self.warnings().count()
        )
    }
}

/// Runs `job` for every project on up to `workers` threads. A failing or
/// panicking job only fails its own project.
pub fn run_projects<F>(projects: Vec<Project>, workers: usize, job: F) -> RemapReport
where
    F: Fn(&Project) -> Result<ProjectStats, RewriteError> + Sync,
{
    let workers = workers.clamp(1, projects.len().max(1));
    let (job_tx, job_rx) = channel::unbounded::<Project>();
    let (done_tx, done_rx) = channel::unbounded::<ProjectReport>();
    for project in projects {
        if job_tx.send(project).is_err() {
            break;
        }
    }
    drop(job_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            let job = &job;
            scope.spawn(move || {
                for project in job_rx.iter() {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&project)))
                        .unwrap_or_else(|_| Err(RewriteError::WorkerPanicked(project.name.clone())));
                    if let Err(err) = &outcome {
                        tracing::warn!(project = %project.name, error = %err, "project remap failed");
                    }
                    let report = ProjectReport {
                        name: project.name,
                        outcome,
                    };
                    if done_tx.send(report).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(done_tx);

    let mut projects: Vec<ProjectReport> = done_rx.iter().collect();
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    RemapReport { projects }
}
