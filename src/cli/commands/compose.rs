use serde_json::json;

use super::super::{ComposeArgs, Ctx, print_json, print_line};
use crate::Result;
use crate::config::ConfigError;
use crate::mapping::{Composition, compose_files};

pub(crate) fn handle(ctx: &Ctx, args: ComposeArgs) -> Result<()> {
    let mappings = &ctx.config.mappings;
    let primary = args
        .primary
        .or_else(|| mappings.primary.clone())
        .ok_or(ConfigError::Missing("mappings.primary"))?;
    let secondary = args
        .secondary
        .or_else(|| mappings.secondary.clone())
        .ok_or(ConfigError::Missing("mappings.secondary"))?;
    let output = args.output.unwrap_or_else(|| mappings.output.clone());

    let composition = Composition::new(&mappings.intermediate, &mappings.promote);
    let outputs = compose_files(
        &ctx.resolve(&primary),
        &ctx.resolve(&secondary),
        &composition,
        &ctx.resolve(&output),
    )?;
    if ctx.json {
        print_json(&json!({
            "composed": outputs.composed,
            "promoted": outputs.promoted,
        }));
    } else {
        print_line(&format!(
            "wrote {}\nwrote {}",
            outputs.composed.display(),
            outputs.promoted.display()
        ));
    }
    Ok(())
}
