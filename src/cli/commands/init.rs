use super::super::render::pair_json;
use super::super::{Ctx, print_json, print_line};
use crate::Result;
use crate::git::Syncer;

pub(crate) fn handle(ctx: &Ctx) -> Result<()> {
    let mirror = ctx.open_mirror()?;
    let remapper = ctx.tree_remapper()?;
    let syncer = Syncer::new(
        &mirror,
        remapper.as_ref(),
        ctx.config.sync.clone(),
        &ctx.config.remap.to,
    );
    let pair = syncer.init()?;
    if ctx.json {
        print_json(&pair_json(&pair));
    } else {
        let topology = mirror.topology();
        print_line(&format!(
            "{} at {}\n{} at {}",
            topology.tracking, pair.tracking, topology.derived, pair.derived
        ));
    }
    Ok(())
}
