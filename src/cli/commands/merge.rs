use std::path::PathBuf;

use serde_json::json;

use super::super::{Ctx, MergeArgs, print_json, print_line};
use crate::Result;
use crate::access::merge_descriptor_files;

pub(crate) fn handle(ctx: &Ctx, args: MergeArgs) -> Result<()> {
    let inputs: Vec<PathBuf> = args.inputs.iter().map(|p| ctx.resolve(p)).collect();
    let output = ctx.resolve(&args.output);
    let merged = merge_descriptor_files(&inputs, &output)?;
    if ctx.json {
        print_json(&json!({
            "output": output,
            "namespace": merged.header.namespace,
            "entries": merged.entries.len(),
        }));
    } else {
        print_line(&format!(
            "merged {} entries into {}",
            merged.entries.len(),
            output.display()
        ));
    }
    Ok(())
}
