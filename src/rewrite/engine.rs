use std::path::{Path, PathBuf};

use crate::mapping::Remapper;

use super::classpath::ClassIndex;
use super::error::RewriteError;
use super::pool::{RemapReport, run_projects};
use super::project::{ProjectLayout, discover_projects, remap_project};
use super::unit::RewriteContext;

/// Produces the remapped form of an upstream tree.
pub trait TreeRemapper {
    /// Remaps the projects of `input` into `output`. Per-project failures are
    /// reported, not returned.
    fn remap_tree(&self, input: &Path, output: &Path) -> Result<RemapReport, RewriteError>;
}

/// Remaps trees with the built-in rewriter.
#[derive(Debug)]
pub struct InProcessRemapper {
    remapper: Remapper,
    classpath: ClassIndex,
    layout: ProjectLayout,
    workers: usize,
}

impl InProcessRemapper {
    pub fn new(remapper: Remapper, classpath: ClassIndex, layout: ProjectLayout) -> Self {
        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            remapper,
            classpath,
            layout,
            workers,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn remapper(&self) -> &Remapper {
        &self.remapper
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }
}

impl TreeRemapper for InProcessRemapper {
    fn remap_tree(&self, input: &Path, output: &Path) -> Result<RemapReport, RewriteError> {
        ensure_distinct(input, output)?;
        let ctx = RewriteContext::new(&self.remapper, &self.classpath);
        let projects = discover_projects(input, &self.layout)?;
        tracing::info!(
            projects = projects.len(),
            workers = self.workers,
            from = %self.remapper.from_namespace(),
            to = %self.remapper.to_namespace(),
            "remapping tree"
        );
        let report = run_projects(projects, self.workers, |project| {
            remap_project(project, output, &ctx, &self.layout)
        });
        tracing::info!(summary = %report, "tree remapped");
        Ok(report)
    }
}

/// Output must not be the input tree or lie inside it.
fn ensure_distinct(input: &Path, output: &Path) -> Result<(), RewriteError> {
    let input = input.canonicalize().map_err(|e| RewriteError::io(input, e))?;
    let output_abs = absolute(output)?;
    if output_abs == input || output_abs.starts_with(&input) {
        return Err(RewriteError::InPlace(output.to_path_buf()));
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, RewriteError> {
    if path.exists() {
        path.canonicalize().map_err(|e| RewriteError::io(path, e))
    } else {
        std::path::absolute(path).map_err(|e| RewriteError::io(path, e))
    }
}
