use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use franchise_bi::{BiConfig, CalculationPolicy, MaintenanceService};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = BiConfig::from_env();
    info!("nightly maintenance starting against {}", config.db_path.display());

    let service = MaintenanceService::new(config, CalculationPolicy::default());
    let result = service.run();

    for err in &result.errors {
        error!("{err}");
    }

    if result.success {
        info!(
            "run complete: {} summaries generated, {} anomalies flagged",
            result.stats.summaries_generated.len(),
            result.stats.anomalies_detected
        );
        std::process::exit(0);
    } else {
        error!("run failed before per-franchise work could start");
        std::process::exit(1);
    }
}
