use crate::model::OutputFormat;
use crate::plan::{total_trials, PlannedVector};
use std::io::Write;

/// Writes one line per vector, then a summary line in pretty mode.
pub fn write_plan<W: Write>(
    format: OutputFormat,
    writer: &mut W,
    plan: &[PlannedVector],
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for vector in plan {
                let line = serde_json::to_string(vector)?;
                writeln!(writer, "{line}")?;
            }
        }
        OutputFormat::Pretty => {
            for vector in plan {
                let trials = vector
                    .trials
                    .map(|trials| trials.to_string())
                    .unwrap_or_else(|| "-".into());
                writeln!(writer, "{:>5}  {}", trials, vector.parameter_set)?;
            }
            writeln!(
                writer,
                "{} vectors, {} handshakes",
                plan.len(),
                total_trials(plan)
            )?;
        }
    }

    writer.flush()?;
    Ok(())
}
