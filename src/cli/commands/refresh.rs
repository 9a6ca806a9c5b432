use serde_json::json;

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
    let derived = syncer.refresh()?;
    if ctx.json {
        print_json(&json!({ "derived": derived.map(|oid| oid.to_string()) }));
    } else {
        match derived {
            Some(oid) => print_line(&format!("{} at {oid}", mirror.topology().derived)),
            None => print_line("remapped sources unchanged"),
        }
    }
    Ok(())
}
