use serde_json::{Value, json};

use crate::git::{AlignedPair, Integration, StatusReport, SyncSummary};
use crate::rewrite::RemapReport;

fn short(oid: git2::Oid) -> String {
    let hex = oid.to_string();
    hex[..hex.len().min(10)].to_string()
}

pub fn render_integration(integration: &Integration) -> String {
    let mut line = format!(
        "{} {} -> {}",
        integration.kind,
        short(integration.upstream),
        short(integration.derived)
    );
    let resolved = integration.resolution.deleted.len();
    if resolved > 0 {
        line.push_str(&format!(" ({resolved} conflicts resolved)"));
    }
    if let Some(report) = &integration.report {
        line.push_str(&format!("\n  {report}"));
    }
    line
}

pub fn render_summary(summary: &SyncSummary) -> String {
    let mut out: Vec<String> = summary.integrated.iter().map(render_integration).collect();
    out.push(summary.to_string());
    out.join("\n")
}

pub fn summary_json(summary: &SyncSummary) -> Value {
    let commits: Vec<Value> = summary
        .integrated
        .iter()
        .map(|i| {
            json!({
                "upstream": i.upstream.to_string(),
                "derived": i.derived.to_string(),
                "kind": i.kind.to_string(),
                "deleted": i.resolution.deleted,
            })
        })
        .collect();
    json!({ "integrated": commits, "up_to_date": summary.up_to_date })
}

pub fn status_json(report: &StatusReport) -> Value {
    json!({
        "state": report.state.to_string(),
        "current": report.current.map(|o| o.to_string()),
        "latest": report.latest.map(|o| o.to_string()),
        "pending": report.pending.map(|o| o.to_string()),
        "behind": report.behind,
    })
}

pub fn pair_json(pair: &AlignedPair) -> Value {
    json!({
        "tracking": pair.tracking.to_string(),
        "derived": pair.derived.to_string(),
    })
}

pub fn render_remap_report(report: &RemapReport) -> String {
    let mut out = vec![report.to_string()];
    for (name, err) in report.failed() {
        out.push(format!("  failed {name}: {err}"));
    }
    for warning in report.warnings() {
        out.push(format!("  warning: {warning}"));
    }
    out.join("\n")
}

pub fn remap_report_json(report: &RemapReport) -> Value {
    let failed: Vec<Value> = report
        .failed()
        .map(|(name, err)| json!({ "project": name, "error": err.to_string() }))
        .collect();
    let warnings: Vec<String> = report.warnings().map(|w| w.to_string()).collect();
    json!({
        "summary": report.to_string(),
        "succeeded": report.succeeded().map(|(name, _)| name).collect::<Vec<_>>(),
        "failed": failed,
        "warnings": warnings,
    })
}
