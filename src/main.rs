use fluentd_cert_reloader::config::{Invocation, LogFormat};
use fluentd_cert_reloader::{
    reconcile, telemetry, Config, Error, HttpReloader, KubeClusterClient, TlsProbe,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // kube and reqwest both build rustls configs; pin them to ring
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| Error::ConfigError("Failed to install rustls crypto provider".to_string()))?;

    let config = match Config::load() {
        Ok(Invocation::Run(config)) => config,
        Ok(Invocation::Print(text)) => {
            print!("{text}");
            return Ok(());
        }
        Err(e) => {
            telemetry::init_tracing(LogFormat::default())?;
            error!("{}", e);
            return Err(e);
        }
    };

    let otel_enabled = telemetry::init_tracing(config.log_format)?;
    if otel_enabled {
        info!("OpenTelemetry tracing initialized");
    }

    info!(
        "Starting fluentd-cert-reloader v{}",
        env!("CARGO_PKG_VERSION")
    );

    let result = check(&config).await;

    match &result {
        Ok(outcome) => info!("Run finished: {}", outcome),
        Err(e) => error!("Run failed: {}", e),
    }

    // Flush any remaining traces
    telemetry::shutdown_tracing();

    result.map(|_| ())
}

async fn check(config: &Config) -> Result<reconcile::RunOutcome, Error> {
    let cluster = KubeClusterClient::try_default()
        .await
        .map_err(Error::KubeError)?;
    info!("Connected to Kubernetes cluster");

    let probe = TlsProbe::new()?;
    let reloader = HttpReloader::new()?;

    reconcile::run(config, &cluster, &probe, &reloader).await
}
