mod cli;

use clap::Parser;
use cli::Cli;
use tls_probe_engine::output::write_plan;
use tls_probe_engine::plan::plan_invalid_curve;
use tls_probe_engine::report::Report;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let invocation = cli.into_config()?;

    let report = Report::load(&invocation.snapshot).await?;
    let cfg = invocation.scan_config(&report);
    let plan = plan_invalid_curve(&report, &cfg);
    info!(target = %cfg.host, vectors = plan.len(), detail = %cfg.detail, "planned invalid curve vectors");

    let mut stdout = std::io::BufWriter::new(std::io::stdout());
    write_plan(invocation.output, &mut stdout, &plan)?;
    Ok(())
}
