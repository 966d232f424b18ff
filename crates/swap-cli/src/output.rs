//! Report rendering.

use swapgrid_rollout::{DeployReport, RollbackReport};

use crate::OutputFormat;

pub fn deploy(report: &DeployReport, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => format!(
            "✓ {} now routes to {} ({})\n  Image:    {}\n  Replicas: {}\n  Previous: {} ({}), scaled to 0",
            report.service,
            report.replica_group,
            report.variant,
            report.image,
            report.replicas,
            report.previous_replica_group,
            report.previous_variant,
        ),
    })
}

pub fn rollback(report: &RollbackReport, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)?,
        OutputFormat::Text => format!(
            "✓ {} rolled back to {}\n  Replicas: {}\n  Selector: {}\n  Retired:  {}, scaled to 0",
            report.service,
            report.restored_replica_group,
            report.restored_replicas,
            report.selector,
            report.retired_replica_group,
        ),
    })
}
