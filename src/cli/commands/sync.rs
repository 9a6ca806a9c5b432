use super::super::render::{render_summary, summary_json};
use super::super::{Ctx, SyncArgs, print_json, print_line};
use crate::Result;
use crate::git::Syncer;

pub(crate) fn handle(ctx: &Ctx, args: SyncArgs) -> Result<()> {
    let mirror = ctx.open_mirror()?;
    let remapper = ctx.tree_remapper()?;
    let syncer = Syncer::new(
        &mirror,
        remapper.as_ref(),
        ctx.config.sync.clone(),
        &ctx.config.remap.to,
    );
    let summary = syncer.sync(args.max_commits)?;
    if ctx.json {
        print_json(&summary_json(&summary));
    } else {
        print_line(&render_summary(&summary));
    }
    Ok(())
}
