//! Sync typestate machine.
//!
//! Integrates upstream history into the derived branch one commit at a time:
//! - Idle → Aligned → Pending → Picked → Committed
//! - Each transition consumes `self`, returns next phase
//! - Can't skip steps - enforced at compile time
//!
//! Key design:
//! - Every pass starts from the last aligned pair, so a crashed pass is
//!   simply discarded
//! - The alignment log is the commit point; publishing follows it and is
//!   repeated by the next pass if it failed
//! - Provenance is kept: integrated commits carry the upstream author,
//!   committer and message

use std::fmt;

use git2::Oid;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use super::alignment::{AlignedPair, AlignmentLog};
use super::conflict::{Resolution, pick_options, resolve_conflicts, rollback};
use super::error::SyncError;
use super::mirror::Mirror;
use super::publish::{publish, publish_all};
use super::select::{CommitKind, classify, commits_behind, next_commit};
use crate::rewrite::{RemapReport, TreeRemapper};

/// Tunables of a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Path suffixes whose change forces a full re-remap.
    pub suffixes: Vec<String>,
    /// Upper bound of commits integrated by [`Syncer::sync`].
    pub max_commits: usize,
    /// Message of the first derived commit; `{namespace}` is substituted.
    pub setup_message: String,
    /// Message of commits made by [`Syncer::refresh`].
    pub refresh_message: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            suffixes: vec![".java".into(), ".accesswidener".into()],
            max_commits: 1,
            setup_message: "Remap sources to {namespace}".into(),
            refresh_message: "Update remapped sources".into(),
        }
    }
}

// =============================================================================
// Phase markers
// =============================================================================

/// Initial phase - mirror branches in an unknown state.
pub struct Idle;

/// Both working branches sit on the last aligned pair.
pub struct Aligned {
    pub pair: AlignedPair,
}

/// The next upstream commit has been chosen.
pub struct Pending {
    pub pair: AlignedPair,
    pub commit: Oid,
    pub kind: CommitKind,
}

/// The commit has been applied to the derived work tree and staged.
pub struct Picked {
    pub pair: AlignedPair,
    pub commit: Oid,
    pub kind: CommitKind,
    pub tree: Oid,
    pub resolution: Resolution,
    pub report: Option<RemapReport>,
}

/// The derived commit exists on the working branches.
pub struct Committed {
    pub pair: AlignedPair,
    pub kind: CommitKind,
    pub resolution: Resolution,
    pub report: Option<RemapReport>,
}

/// One integrated upstream commit.
#[derive(Debug)]
pub struct Integration {
    /// The upstream commit, now the tracking tip.
    pub upstream: Oid,
    /// Its counterpart on the derived branch.
    pub derived: Oid,
    pub kind: CommitKind,
    pub resolution: Resolution,
    /// Present for remap picks.
    pub report: Option<RemapReport>,
}

/// Sync process with typestate.
///
/// ```ignore
/// if let Some(pending) = SyncProcess::new()
///     .reconcile(&mirror, &log)?
///     .select(&mirror, &settings.suffixes)?
/// {
///     let integration = pending.pick(&mirror, remapper)?.commit(&mirror)?.record(&mut log)?;
/// }
/// ```
pub struct SyncProcess<Phase> {
    pub phase: Phase,
}

impl Default for SyncProcess<Idle> {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncProcess<Idle> {
    pub fn new() -> Self {
        SyncProcess { phase: Idle }
    }

    /// Resets both working branches to the last aligned pair and checks out
    /// the derived one.
    pub fn reconcile(
        self,
        mirror: &Mirror,
        log: &AlignmentLog,
    ) -> Result<SyncProcess<Aligned>, SyncError> {
        let pair = log
            .last()
            .ok_or_else(|| SyncError::Uninitialized(mirror.workdir().to_path_buf()))?;
        let topology = mirror.topology();
        for (branch, oid) in [
            (topology.temp_tracking.as_str(), pair.tracking),
            (topology.temp_derived.as_str(), pair.derived),
        ] {
            let tip = mirror.branch_tip(branch)?;
            if tip != Some(oid) {
                tracing::warn!(branch, expected = %oid, found = ?tip, "resetting to last aligned commit");
                mirror.set_branch(branch, oid)?;
            }
        }
        mirror.checkout_branch(&topology.temp_derived)?;
        mirror.hard_reset(pair.derived)?;
        Ok(SyncProcess {
            phase: Aligned { pair },
        })
    }
}

impl SyncProcess<Aligned> {
    pub fn pair(&self) -> AlignedPair {
        self.phase.pair
    }

    /// Chooses the next upstream commit; `None` when up to date.
    pub fn select(
        self,
        mirror: &Mirror,
        suffixes: &[String],
    ) -> Result<Option<SyncProcess<Pending>>, SyncError> {
        let pair = self.phase.pair;
        let head = mirror.upstream_tip()?;
        let Some(commit) = next_commit(mirror.repo(), pair.tracking, head)? else {
            tracing::info!(tracking = %pair.tracking, "up to date");
            return Ok(None);
        };
        let kind = classify(mirror.repo(), pair.tracking, commit, suffixes)?;
        tracing::info!(commit = %commit, %kind, "next upstream commit");
        Ok(Some(SyncProcess {
            phase: Pending { pair, commit, kind },
        }))
    }
}

impl SyncProcess<Pending> {
    /// Applies the commit to the derived work tree.
    ///
    /// A remap pick first remaps the whole upstream tree at the commit and,
    /// after the cherry-pick, copies the remapped project sources over the
    /// derived work tree.
    pub fn pick(
        self,
        mirror: &Mirror,
        remapper: &dyn TreeRemapper,
    ) -> Result<SyncProcess<Picked>, SyncError> {
        let Pending { pair, commit, kind } = self.phase;
        let topology = mirror.topology();

        let remapped = match kind {
            CommitKind::Remap => {
                mirror.checkout_detached(commit)?;
                let (scratch, report) = remap_workdir(mirror, remapper)?;
                mirror.checkout_branch(&topology.temp_derived)?;
                Some((scratch, report))
            }
            CommitKind::PlainPick => {
                mirror.checkout_branch(&topology.temp_derived)?;
                None
            }
        };
        cherry_pick(mirror, commit, pair)?;
        let resolution = resolve_conflicts(mirror.repo(), commit, pair.derived)?;
        if !resolution.is_empty() {
            tracing::info!(deleted = resolution.deleted.len(), "resolved conflicts");
        }

        let report = match remapped {
            Some((scratch, report)) => {
                mirror.overlay(scratch.path(), &report)?;
                Some(report)
            }
            None => None,
        };
        let tree = mirror.stage_all()?;
        Ok(SyncProcess {
            phase: Picked {
                pair,
                commit,
                kind,
                tree,
                resolution,
                report,
            },
        })
    }
}

impl SyncProcess<Picked> {
    /// Commits the staged tree with the upstream commit's identity and
    /// advances both working branches.
    pub fn commit(self, mirror: &Mirror) -> Result<SyncProcess<Committed>, SyncError> {
        let Picked {
            pair,
            commit,
            kind,
            tree,
            resolution,
            report,
        } = self.phase;
        let upstream = mirror.repo().find_commit(commit)?;
        let message = String::from_utf8_lossy(upstream.message_raw_bytes()).into_owned();
        let derived = mirror.commit_tree(
            tree,
            pair.derived,
            &upstream.author(),
            &upstream.committer(),
            &message,
        )?;
        mirror.repo().cleanup_state()?;
        mirror.set_branch(&mirror.topology().temp_tracking, commit)?;
        tracing::debug!(upstream = %commit, derived = %derived, "committed");
        Ok(SyncProcess {
            phase: Committed {
                pair: AlignedPair {
                    tracking: commit,
                    derived,
                },
                kind,
                resolution,
                report,
            },
        })
    }
}

impl SyncProcess<Committed> {
    /// Records the new pair. Once recorded the integration is durable.
    pub fn record(self, log: &mut AlignmentLog) -> Result<Integration, SyncError> {
        let Committed {
            pair,
            kind,
            resolution,
            report,
        } = self.phase;
        log.record(pair)?;
        Ok(Integration {
            upstream: pair.tracking,
            derived: pair.derived,
            kind,
            resolution,
            report,
        })
    }
}

fn cherry_pick(mirror: &Mirror, commit: Oid, pair: AlignedPair) -> Result<(), SyncError> {
    let repo = mirror.repo();
    let upstream = repo.find_commit(commit)?;
    let mut options = pick_options(&upstream, pair.tracking);
    if let Err(source) = repo.cherrypick(&upstream, Some(&mut options)) {
        rollback(repo, pair.derived)?;
        return Err(SyncError::CherryPick {
            commit: commit.to_string(),
            source,
        });
    }
    Ok(())
}

fn remap_workdir(
    mirror: &Mirror,
    remapper: &dyn TreeRemapper,
) -> Result<(TempDir, RemapReport), SyncError> {
    let scratch = TempDir::new().map_err(|e| SyncError::io(std::env::temp_dir(), e))?;
    let report = remapper.remap_tree(mirror.workdir(), scratch.path())?;
    tracing::info!(%report, "remapped upstream tree");
    Ok((scratch, report))
}

// =============================================================================
// Driver
// =============================================================================

/// Outcome of one pass.
#[derive(Debug)]
pub enum SyncOutcome {
    UpToDate { tracking: Oid },
    Integrated(Integration),
}

/// Outcome of [`Syncer::sync`].
#[derive(Debug, Default)]
pub struct SyncSummary {
    pub integrated: Vec<Integration>,
    /// Whether the last pass found nothing left to integrate.
    pub up_to_date: bool,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let remapped = self
            .integrated
            .iter()
            .filter(|i| i.kind == CommitKind::Remap)
            .count();
        write!(
            f,
            "integrated {} commits ({} remapped, {} picked)",
            self.integrated.len(),
            remapped,
            self.integrated.len() - remapped
        )?;
        if self.up_to_date {
            f.write_str(", up to date")?;
        }
        Ok(())
    }
}

/// Where the mirror stands relative to upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Uninitialized,
    /// The tracking branch exists but no derived branch is aligned to it.
    TrackingReady,
    UpToDate,
    RemapPending,
    PlainPickPending,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Uninitialized => "uninitialized",
            SyncState::TrackingReady => "tracking ready",
            SyncState::UpToDate => "up to date",
            SyncState::RemapPending => "remap pending",
            SyncState::PlainPickPending => "plain pick pending",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub state: SyncState,
    /// Last integrated upstream commit.
    pub current: Option<Oid>,
    /// Upstream head as last fetched.
    pub latest: Option<Oid>,
    pub pending: Option<Oid>,
    pub behind: usize,
}

impl StatusReport {
    fn uninitialized() -> Self {
        Self {
            state: SyncState::Uninitialized,
            current: None,
            latest: None,
            pending: None,
            behind: 0,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        if let Some(current) = self.current {
            write!(f, "\ncurrent: {current}")?;
        }
        if let Some(latest) = self.latest {
            write!(f, "\nlatest:  {latest}")?;
        }
        if let Some(pending) = self.pending {
            write!(f, "\nnext:    {pending}")?;
        }
        if self.behind > 0 {
            write!(f, "\nbehind by {} commits", self.behind)?;
        }
        Ok(())
    }
}

/// Runs passes against one mirror.
pub struct Syncer<'a> {
    mirror: &'a Mirror,
    remapper: &'a dyn TreeRemapper,
    settings: SyncSettings,
    namespace: String,
}

impl<'a> Syncer<'a> {
    /// `namespace` is the target namespace named in the setup commit.
    pub fn new(
        mirror: &'a Mirror,
        remapper: &'a dyn TreeRemapper,
        settings: SyncSettings,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            mirror,
            remapper,
            settings,
            namespace: namespace.into(),
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Fetches both remotes and makes sure the tracking and derived branches
    /// exist and are aligned. Safe to repeat.
    pub fn init(&self) -> Result<AlignedPair, SyncError> {
        let _span = tracing::info_span!("init", version = %self.mirror.topology().version).entered();
        self.mirror.fetch_upstream()?;
        self.mirror.fetch_root()?;
        let tracking = self.ensure_tracking()?;
        let mut log = self.mirror.alignment_log()?;
        self.ensure_derived(&mut log, tracking)
    }

    fn ensure_tracking(&self) -> Result<Oid, SyncError> {
        let mirror = self.mirror;
        let topology = mirror.topology();
        if let Some(tip) = mirror.branch_tip(&topology.temp_tracking)? {
            return Ok(tip);
        }
        let published = mirror.root_tip(&topology.tracking)?;
        let start = match published {
            Some(oid) => oid,
            None => mirror.upstream_tip()?,
        };
        mirror.set_branch(&topology.temp_tracking, start)?;
        tracing::info!(branch = %topology.temp_tracking, start = %start, "created tracking branch");
        if published.is_none() {
            publish(mirror, &topology.temp_tracking, &topology.tracking)?;
        }
        Ok(start)
    }

    fn ensure_derived(&self, log: &mut AlignmentLog, tracking: Oid) -> Result<AlignedPair, SyncError> {
        let mirror = self.mirror;
        let topology = mirror.topology();
        if let Some(pair) = log.last() {
            return Ok(pair);
        }

        if let Some(derived) = mirror.root_tip(&topology.derived)? {
            mirror.set_branch(&topology.temp_derived, derived)?;
            let pair = AlignedPair { tracking, derived };
            log.record(pair)?;
            tracing::info!(derived = %derived, "adopted published derived branch");
            return Ok(pair);
        }

        mirror.checkout_detached(tracking)?;
        let (scratch, report) = remap_workdir(mirror, self.remapper)?;
        mirror.set_branch(&topology.temp_derived, tracking)?;
        mirror.checkout_branch(&topology.temp_derived)?;
        mirror.overlay(scratch.path(), &report)?;
        let tree = mirror.stage_all()?;
        let signature = mirror.own_signature()?;
        let message = self.settings.setup_message.replace("{namespace}", &self.namespace);
        let derived = mirror.commit_tree(tree, tracking, &signature, &signature, &message)?;

        let pair = AlignedPair { tracking, derived };
        log.record(pair)?;
        publish(mirror, &topology.temp_derived, &topology.derived)?;
        tracing::info!(derived = %derived, "created derived branch");
        Ok(pair)
    }

    /// Fetches upstream and integrates at most one commit.
    pub fn sync_once(&self) -> Result<SyncOutcome, SyncError> {
        self.mirror.fetch_upstream()?;
        self.pass()
    }

    /// Fetches upstream and integrates up to `max_commits` commits, or the
    /// configured bound when `None`.
    pub fn sync(&self, max_commits: Option<usize>) -> Result<SyncSummary, SyncError> {
        let limit = max_commits.unwrap_or(self.settings.max_commits);
        self.mirror.fetch_upstream()?;
        let mut summary = SyncSummary::default();
        while summary.integrated.len() < limit {
            match self.pass()? {
                SyncOutcome::UpToDate { .. } => {
                    summary.up_to_date = true;
                    break;
                }
                SyncOutcome::Integrated(integration) => summary.integrated.push(integration),
            }
        }
        tracing::info!(%summary, "sync finished");
        Ok(summary)
    }

    fn pass(&self) -> Result<SyncOutcome, SyncError> {
        let mirror = self.mirror;
        let _span = tracing::info_span!("sync_pass", version = %mirror.topology().version).entered();
        let mut log = mirror.alignment_log()?;
        let aligned = SyncProcess::new().reconcile(mirror, &log)?;
        // A publish interrupted after the last record is completed here.
        publish_all(mirror)?;

        let tracking = aligned.pair().tracking;
        let Some(pending) = aligned.select(mirror, &self.settings.suffixes)? else {
            return Ok(SyncOutcome::UpToDate { tracking });
        };
        let integration = pending
            .pick(mirror, self.remapper)?
            .commit(mirror)?
            .record(&mut log)?;
        publish_all(mirror)?;
        tracing::info!(
            upstream = %integration.upstream,
            derived = %integration.derived,
            kind = %integration.kind,
            "integrated"
        );
        Ok(SyncOutcome::Integrated(integration))
    }

    /// Re-remaps the current tracking tip onto the derived branch without
    /// integrating upstream. Returns the new derived commit, or `None` when
    /// the remapped tree is unchanged.
    pub fn refresh(&self) -> Result<Option<Oid>, SyncError> {
        let mirror = self.mirror;
        let _span = tracing::info_span!("refresh", version = %mirror.topology().version).entered();
        let topology = mirror.topology();
        let mut log = mirror.alignment_log()?;
        let pair = SyncProcess::new().reconcile(mirror, &log)?.pair();

        mirror.checkout_detached(pair.tracking)?;
        let (scratch, report) = remap_workdir(mirror, self.remapper)?;
        mirror.checkout_branch(&topology.temp_derived)?;
        mirror.overlay(scratch.path(), &report)?;
        let tree = mirror.stage_all()?;
        if tree == mirror.repo().find_commit(pair.derived)?.tree_id() {
            mirror.hard_reset(pair.derived)?;
            tracing::info!("remapped sources unchanged");
            return Ok(None);
        }

        let signature = mirror.own_signature()?;
        let derived = mirror.commit_tree(
            tree,
            pair.derived,
            &signature,
            &signature,
            &self.settings.refresh_message,
        )?;
        log.record(AlignedPair {
            tracking: pair.tracking,
            derived,
        })?;
        publish(mirror, &topology.temp_derived, &topology.derived)?;
        tracing::info!(derived = %derived, "refreshed remapped sources");
        Ok(Some(derived))
    }

    /// Reports the state of `mirror` from local refs only.
    pub fn status(mirror: Option<&Mirror>, suffixes: &[String]) -> Result<StatusReport, SyncError> {
        let Some(mirror) = mirror else {
            return Ok(StatusReport::uninitialized());
        };
        let topology = mirror.topology();
        let log = mirror.alignment_log()?;
        let latest = match mirror.upstream_tip() {
            Ok(oid) => Some(oid),
            Err(SyncError::NoRemoteRef(_)) => None,
            Err(e) => return Err(e),
        };
        let Some(pair) = log.last() else {
            let state = match mirror.branch_tip(&topology.temp_tracking)? {
                Some(_) => SyncState::TrackingReady,
                None => SyncState::Uninitialized,
            };
            return Ok(StatusReport {
                state,
                latest,
                ..StatusReport::uninitialized()
            });
        };

        let current = Some(pair.tracking);
        let Some(head) = latest else {
            return Ok(StatusReport {
                state: SyncState::UpToDate,
                current,
                latest,
                pending: None,
                behind: 0,
            });
        };
        let repo = mirror.repo();
        let behind = commits_behind(repo, pair.tracking, head)?;
        let (state, pending) = match next_commit(repo, pair.tracking, head)? {
            None => (SyncState::UpToDate, None),
            Some(next) => match classify(repo, pair.tracking, next, suffixes)? {
                CommitKind::Remap => (SyncState::RemapPending, Some(next)),
                CommitKind::PlainPick => (SyncState::PlainPickPending, Some(next)),
            },
        };
        Ok(StatusReport {
            state,
            current,
            latest,
            pending,
            behind,
        })
    }
}
