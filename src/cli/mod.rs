//! CLI surface for remap-sync.
//!
//! Thin handlers over the library: each command loads the layered config for
//! the root repository and calls one library operation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{self, Config, ConfigError};
use crate::external::ExternalCommand;
use crate::git::{Mirror, SyncError};
use crate::mapping::{Composition, Remapper, compose_files, read_mappings};
use crate::rewrite::{ClassIndex, InProcessRemapper, TreeRemapper};
use crate::Result;

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "remap-sync",
    version,
    about = "Mirror an upstream tree and keep a remapped copy of its history",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    /// Root repository path (default: discover from cwd).
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Debug output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the mirror and the tracking and remapped branches.
    Init,

    /// Integrate upstream commits into the remapped branch.
    Sync(SyncArgs),

    /// Re-remap the current tracking tip without integrating upstream.
    Refresh,

    /// Show how far the mirror is behind upstream.
    Status(StatusArgs),

    /// Compose the two configured mapping tables.
    Compose(ComposeArgs),

    /// Remap a source tree into an output directory.
    Remap(RemapArgs),

    /// Merge access descriptors sharing one namespace.
    #[command(alias = "merge")]
    MergeDescriptors(MergeArgs),

    /// Collect the injected interfaces declared by every project.
    Setup(SetupArgs),
}

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Commits to integrate in this run (default: `sync.max_commits`).
    #[arg(long, short = 'n', value_name = "N")]
    pub max_commits: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Fetch upstream before reporting.
    #[arg(long, default_value_t = false)]
    pub fetch: bool,
}

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Table `origin -> A` (default: `mappings.primary`).
    #[arg(long, value_name = "PATH")]
    pub primary: Option<PathBuf>,
    /// Table `origin -> B` (default: `mappings.secondary`).
    #[arg(long, value_name = "PATH")]
    pub secondary: Option<PathBuf>,
    /// Output file (default: `mappings.output`).
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct RemapArgs {
    /// Tree holding the projects to remap (relative paths start at the root).
    pub input: PathBuf,
    /// Directory receiving the remapped projects.
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Descriptors to merge, in order.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Tree holding the projects (default: the mirror work tree).
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,
    /// JSON file to write.
    #[arg(
        long,
        short = 'o',
        value_name = "PATH",
        default_value = "src/generated/resources/architectury.common.json"
    )]
    pub output: PathBuf,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli) -> Result<()> {
    let root = resolve_root(cli.repo)?;
    let config = config::load_for_repo(Some(&root))?;
    let ctx = Ctx {
        root,
        config,
        json: cli.json,
    };
    match cli.command {
        Commands::Init => commands::init::handle(&ctx),
        Commands::Sync(args) => commands::sync::handle(&ctx, args),
        Commands::Refresh => commands::refresh::handle(&ctx),
        Commands::Status(args) => commands::status::handle(&ctx, args),
        Commands::Compose(args) => commands::compose::handle(&ctx, args),
        Commands::Remap(args) => commands::remap::handle(&ctx, args),
        Commands::MergeDescriptors(args) => commands::merge::handle(&ctx, args),
        Commands::Setup(args) => commands::setup::handle(&ctx, args),
    }
}

// =============================================================================
// Shared handler context
// =============================================================================

struct Ctx {
    root: PathBuf,
    config: Config,
    json: bool,
}

impl Ctx {
    /// Relative config paths are taken from the root work tree.
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn open_mirror(&self) -> Result<Mirror> {
        let dir = self.config.mirror_dir(&self.root);
        let url = self.config.upstream_url()?;
        Ok(Mirror::open_or_init(&dir, &self.root, url, self.config.topology())?)
    }

    fn existing_mirror(&self) -> Result<Option<Mirror>> {
        let dir = self.config.mirror_dir(&self.root);
        Ok(Mirror::open(&dir, &self.root, self.config.topology())?)
    }

    /// Loads the composed table, composing it first when it is missing.
    fn remapper(&self) -> Result<Remapper> {
        let mappings = &self.config.mappings;
        let path = self.resolve(&mappings.output);
        if !path.exists() {
            let primary = mappings
                .primary
                .as_deref()
                .ok_or(ConfigError::Missing("mappings.primary"))?;
            let secondary = mappings
                .secondary
                .as_deref()
                .ok_or(ConfigError::Missing("mappings.secondary"))?;
            let composition = Composition::new(&mappings.intermediate, &mappings.promote);
            compose_files(
                &self.resolve(primary),
                &self.resolve(secondary),
                &composition,
                &path,
            )?;
        }
        let tree = read_mappings(&path)?;
        Ok(Remapper::new(&tree, &self.config.remap.from, &self.config.remap.to)?)
    }

    fn tree_remapper(&self) -> Result<Box<dyn TreeRemapper>> {
        let remap = &self.config.remap;
        if let Some(command) = &remap.command {
            let mut command: ExternalCommand = command.clone();
            command.cwd = command.cwd.map(|cwd| self.resolve(&cwd));
            return Ok(Box::new(command));
        }
        let classpath: Vec<PathBuf> = remap.classpath.iter().map(|p| self.resolve(p)).collect();
        let classpath = ClassIndex::from_entries(&classpath)?;
        let mut engine = InProcessRemapper::new(self.remapper()?, classpath, remap.layout());
        if let Some(workers) = remap.workers {
            engine = engine.with_workers(workers);
        }
        Ok(Box::new(engine))
    }
}

fn resolve_root(repo: Option<PathBuf>) -> Result<PathBuf> {
    let path = match repo.or_else(config::discover_repo_root) {
        Some(path) => path,
        None => std::env::current_dir().map_err(|e| SyncError::Io {
            path: PathBuf::from("."),
            source: e,
        })?,
    };
    Ok(path)
}

fn print_line(text: &str) {
    use std::io::Write;
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{text}")
        && e.kind() != std::io::ErrorKind::BrokenPipe
    {
        tracing::warn!("failed to write output: {e}");
    }
}

fn print_json(value: &serde_json::Value) {
    let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    print_line(&text);
}
