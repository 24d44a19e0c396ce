pub mod audit;
pub mod campaign;
pub mod config;
pub mod investigate;
pub mod monitor;
pub mod serve;
pub mod workflow;

use osint_core::workflow::AlertCondition;

/// Parse `--alert` specs up front so a typo fails before any work starts.
pub(crate) fn parse_alerts(specs: &[String]) -> anyhow::Result<Vec<AlertCondition>> {
    specs
        .iter()
        .map(|s| s.parse::<AlertCondition>().map_err(anyhow::Error::from))
        .collect()
}
