use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default false-negative probability targeted by each oracle vector.
pub const DEFAULT_ERROR_PROBABILITY: f64 = 0.001;

/// Verdict attached to every queryable report property.
///
/// `Uncertain` and `ErrorDuringTest` are not "not vulnerable"; only `False` is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestResult {
    True,
    False,
    Uncertain,
    #[default]
    NotTestedYet,
    CouldNotTest,
    ErrorDuringTest,
}

impl TestResult {
    pub fn is_true(self) -> bool {
        matches!(self, TestResult::True)
    }

    /// True for the two authoritative verdicts.
    pub fn is_conclusive(self) -> bool {
        matches!(self, TestResult::True | TestResult::False)
    }
}

impl From<bool> for TestResult {
    fn from(value: bool) -> Self {
        if value {
            TestResult::True
        } else {
            TestResult::False
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TestResult::True => "true",
            TestResult::False => "false",
            TestResult::Uncertain => "uncertain",
            TestResult::NotTestedYet => "not tested yet",
            TestResult::CouldNotTest => "could not test",
            TestResult::ErrorDuringTest => "error during test",
        };
        write!(f, "{}", label)
    }
}

/// How much of the parameter space a probe explores.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Minimal,
    #[default]
    Normal,
    Detailed,
    All,
}

impl fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DetailLevel::Minimal => "minimal",
            DetailLevel::Normal => "normal",
            DetailLevel::Detailed => "detailed",
            DetailLevel::All => "all",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Host name used for SNI and the HTTP request line.
    pub host: String,
    pub detail: DetailLevel,
    pub error_probability: f64,
    pub concurrency: usize,
    pub probe_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            detail: DetailLevel::Normal,
            error_probability: DEFAULT_ERROR_PROBABILITY,
            concurrency: 4,
            probe_timeout: Duration::from_secs(600),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be greater than zero");
        }
        if !(self.error_probability > 0.0 && self.error_probability < 1.0) {
            anyhow::bail!(
                "error probability must lie strictly between 0 and 1, got {}",
                self.error_probability
            );
        }
        if self.probe_timeout.is_zero() {
            anyhow::bail!("probe timeout must be greater than zero");
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Jsonl,
    Pretty,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Jsonl => write!(f, "jsonl"),
            OutputFormat::Pretty => write!(f, "pretty"),
        }
    }
}
