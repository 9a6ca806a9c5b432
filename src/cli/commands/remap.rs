use super::super::render::{remap_report_json, render_remap_report};
use super::super::{Ctx, RemapArgs, print_json, print_line};
use crate::Result;

pub(crate) fn handle(ctx: &Ctx, args: RemapArgs) -> Result<()> {
    let remapper = ctx.tree_remapper()?;
    let report = remapper.remap_tree(&ctx.resolve(&args.input), &ctx.resolve(&args.output))?;
    if ctx.json {
        print_json(&remap_report_json(&report));
    } else {
        print_line(&render_remap_report(&report));
    }
    Ok(())
}
