use super::super::render::status_json;
use super::super::{Ctx, StatusArgs, print_json, print_line};
use crate::Result;
use crate::git::Syncer;

pub(crate) fn handle(ctx: &Ctx, args: StatusArgs) -> Result<()> {
    let mirror = ctx.existing_mirror()?;
    if args.fetch
        && let Some(mirror) = &mirror
    {
        mirror.fetch_upstream()?;
    }
    let report = Syncer::status(mirror.as_ref(), &ctx.config.sync.suffixes)?;
    if ctx.json {
        print_json(&status_json(&report));
    } else {
        print_line(&report.to_string());
    }
    Ok(())
}
