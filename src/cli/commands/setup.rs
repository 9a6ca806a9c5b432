use serde_json::json;

use super::super::{Ctx, SetupArgs, print_json, print_line};
use crate::Result;
use crate::git::SyncError;
use crate::rewrite::{collect_injected_interfaces, write_injected_interfaces};

pub(crate) fn handle(ctx: &Ctx, args: SetupArgs) -> Result<()> {
    let input = match &args.input {
        Some(input) => ctx.resolve(input),
        None => {
            let dir = ctx.config.mirror_dir(&ctx.root);
            let mirror = ctx
                .existing_mirror()?
                .ok_or(SyncError::Uninitialized(dir))?;
            mirror.workdir().to_path_buf()
        }
    };
    let output = ctx.resolve(&args.output);
    let interfaces = collect_injected_interfaces(&input, &ctx.config.remap.layout())?;
    write_injected_interfaces(&output, &interfaces)?;
    let injected: usize = interfaces.values().map(|set| set.len()).sum();
    if ctx.json {
        print_json(&json!({
            "output": output,
            "classes": interfaces.len(),
            "interfaces": injected,
        }));
    } else {
        print_line(&format!(
            "wrote {injected} injected interfaces for {} classes to {}",
            interfaces.len(),
            output.display()
        ));
    }
    Ok(())
}
