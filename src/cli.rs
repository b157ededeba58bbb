use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::time::Duration;
use tls_probe_engine::model::{DetailLevel, OutputFormat, ScanConfig, DEFAULT_ERROR_PROBABILITY};
use tls_probe_engine::report::Report;

#[derive(Debug, Parser)]
#[command(author, version, about = "Plans TLS oracle probes from a report snapshot", long_about = None)]
pub struct Cli {
    /// JSON report snapshot holding the supported versions, groups and suites
    #[arg(short = 's', long = "snapshot", value_name = "FILE")]
    pub snapshot: PathBuf,

    /// Host name for SNI; defaults to the host stored in the snapshot
    #[arg(short = 'H', long = "host", value_name = "HOST")]
    pub host: Option<String>,

    /// How much of the parameter space to cover
    #[arg(long = "detail", default_value_t = DetailLevel::Normal)]
    pub detail: DetailLevel,

    /// Accepted false-negative probability per vector
    #[arg(long = "error-probability", default_value_t = DEFAULT_ERROR_PROBABILITY)]
    pub error_probability: f64,

    /// Probes running at the same time
    #[arg(long = "concurrency", default_value_t = 4)]
    pub concurrency: usize,

    /// Per-probe timeout in seconds
    #[arg(long = "probe-timeout", default_value_t = 600)]
    pub probe_timeout_secs: u64,

    /// Output format
    #[arg(long = "output", default_value_t = OutputFormat::Jsonl)]
    pub output: OutputFormat,

    /// Shorthand for --output pretty
    #[arg(long = "pretty", action = ArgAction::SetTrue)]
    pub pretty: bool,
}

/// Validated command line.
#[derive(Debug)]
pub struct Invocation {
    pub snapshot: PathBuf,
    pub output: OutputFormat,
    host: Option<String>,
    cfg: ScanConfig,
}

impl Invocation {
    /// Scan configuration, taking the host from `report` unless overridden.
    pub fn scan_config(&self, report: &Report) -> ScanConfig {
        ScanConfig {
            host: self
                .host
                .clone()
                .unwrap_or_else(|| report.host.clone()),
            ..self.cfg.clone()
        }
    }
}

impl Cli {
    pub fn into_config(self) -> anyhow::Result<Invocation> {
        if matches!(&self.host, Some(host) if host.trim().is_empty()) {
            anyhow::bail!("--host must not be empty");
        }

        let cfg = ScanConfig {
            host: self.host.clone().unwrap_or_default(),
            detail: self.detail,
            error_probability: self.error_probability,
            concurrency: self.concurrency,
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
        };
        cfg.validate()?;

        Ok(Invocation {
            snapshot: self.snapshot,
            output: if self.pretty {
                OutputFormat::Pretty
            } else {
                self.output
            },
            host: self.host,
            cfg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<Invocation> {
        let mut argv = vec!["tls-probe-engine"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn defaults_take_host_from_snapshot() {
        let invocation = parse(&["--snapshot", "report.json"]).unwrap();
        assert_eq!(invocation.output, OutputFormat::Jsonl);
        let cfg = invocation.scan_config(&Report::new("example.com"));
        assert_eq!(cfg.host, "example.com");
        assert_eq!(cfg.detail, DetailLevel::Normal);
    }

    #[test]
    fn rejects_bad_probability_and_concurrency() {
        assert!(parse(&["-s", "r.json", "--error-probability", "0"]).is_err());
        assert!(parse(&["-s", "r.json", "--concurrency", "0"]).is_err());
        assert!(parse(&["-s", "r.json", "--host", " "]).is_err());
    }

    #[test]
    fn pretty_flag_overrides_output() {
        let invocation = parse(&["-s", "r.json", "--pretty", "--detail", "all"]).unwrap();
        assert_eq!(invocation.output, OutputFormat::Pretty);
        assert_eq!(
            invocation.scan_config(&Report::default()).detail,
            DetailLevel::All
        );
    }
}
