//! Plain-text result panels.

use std::fmt;

use crate::aggregate::DockingResult;
use crate::trajectory::FrameMetrics;

/// Message shown before any docking batch has produced results.
pub const NOT_RUN: &str = "Docking has not been run yet.";

/// Docking results as a text table, one block per result.
///
/// The block whose structure is currently displayed is marked with `*`.
#[derive(Debug, Clone, Copy)]
pub struct ResultsTable<'a> {
    results: &'a [DockingResult],
    selected: Option<&'a str>,
}

impl<'a> ResultsTable<'a> {
    /// Table over `results`, marking the one displaying `selected`.
    #[must_use]
    pub fn new(
        results: &'a [DockingResult],
        selected: Option<&'a str>,
    ) -> Self {
        Self { results, selected }
    }
}

fn cell(value: f64) -> String {
    if value.is_nan() {
        "-".to_owned()
    } else {
        format!("{value:.3}")
    }
}

impl fmt::Display for ResultsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.results.is_empty() {
            return writeln!(f, "{NOT_RUN}");
        }

        for (i, result) in self.results.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let selected =
                self.selected == Some(result.structure_path.as_str());
            let marker = if selected { "*" } else { " " };
            writeln!(
                f,
                "{marker} Bioactivity testing: {}",
                result.receptor_name
            )?;
            writeln!(f, "  Bioactive compound:  {}", result.ligand_label)?;
            writeln!(
                f,
                "  {:>4} | {:>19} | {:>9} | {:>9}",
                "Mode", "Affinity (kcal/mol)", "RMSD l.b.", "RMSD u.b."
            )?;
            for score in &result.scores {
                let mode = score
                    .mode
                    .map_or_else(|| "-".to_owned(), |m| m.to_string());
                writeln!(
                    f,
                    "  {mode:>4} | {:>19} | {:>9} | {:>9}",
                    cell(score.affinity),
                    cell(score.rmsd_lb),
                    cell(score.rmsd_ub)
                )?;
            }
        }
        Ok(())
    }
}

/// One trajectory frame's metrics as text.
#[derive(Debug, Clone, Copy)]
pub struct FrameSummary {
    metrics: FrameMetrics,
    frame_count: usize,
}

impl FrameSummary {
    /// Summary of `metrics` out of `frame_count` frames.
    #[must_use]
    pub fn new(metrics: FrameMetrics, frame_count: usize) -> Self {
        Self {
            metrics,
            frame_count,
        }
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.metrics;
        writeln!(
            f,
            "Frame: {} / {} | time: {:.3} ps",
            m.index,
            self.frame_count.saturating_sub(1),
            m.time
        )?;
        writeln!(
            f,
            "COG (Å): {:.3}, {:.3}, {:.3}",
            m.center.x, m.center.y, m.center.z
        )?;
        writeln!(f, "Rg total (Å): {:.3}", m.rg)?;
        writeln!(
            f,
            "Rg x/y/z (Å): {:.3} / {:.3} / {:.3}",
            m.rg_axes.x, m.rg_axes.y, m.rg_axes.z
        )
    }
}
