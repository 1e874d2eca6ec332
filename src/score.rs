//! Docking score tables.
//!
//! A score table is plain text with one pose per line and four
//! comma-separated fields, `mode,affinity,rmsd_lb,rmsd_ub`, no header row.
//! Parsing is lenient: a malformed numeric field degrades to a sentinel
//! (`NaN` for floats, `None` for the mode index) so one corrupt line never
//! discards the rest of the table.

use serde::{Deserialize, Serialize};

/// One docked pose's score record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseScore {
    /// 1-based pose mode index, `None` when the field was malformed.
    pub mode: Option<u32>,
    /// Predicted binding affinity in kcal/mol (more negative binds tighter).
    pub affinity: f64,
    /// RMSD lower bound relative to the best mode.
    pub rmsd_lb: f64,
    /// RMSD upper bound relative to the best mode.
    pub rmsd_ub: f64,
}

impl PoseScore {
    /// Parse a single table line. Missing fields parse as sentinels.
    #[must_use]
    pub fn parse_line(line: &str) -> Self {
        let mut fields = line.split(',').map(str::trim);
        let mode = fields.next().and_then(|f| f.parse::<u32>().ok());
        let mut next_f64 = || {
            fields
                .next()
                .and_then(|f| f.parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        let affinity = next_f64();
        let rmsd_lb = next_f64();
        let rmsd_ub = next_f64();
        Self {
            mode,
            affinity,
            rmsd_lb,
            rmsd_ub,
        }
    }

    /// Serialize back to the table's line format.
    ///
    /// Floats use the shortest representation that parses back to the same
    /// value, so well-formed lines are stable under re-parsing.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mode = self.mode.map_or_else(String::new, |m| m.to_string());
        format!(
            "{mode},{},{},{}",
            self.affinity, self.rmsd_lb, self.rmsd_ub
        )
    }

    /// Whether every field parsed successfully.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.mode.is_some()
            && !self.affinity.is_nan()
            && !self.rmsd_lb.is_nan()
            && !self.rmsd_ub.is_nan()
    }
}

/// Parse a whole score table, keeping file order. Blank lines are skipped;
/// empty input gives an empty table.
#[must_use]
pub fn parse_score_table(text: &str) -> Vec<PoseScore> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(PoseScore::parse_line)
        .collect()
}

/// Serialize a table, one record per line.
#[must_use]
pub fn write_score_table(scores: &[PoseScore]) -> String {
    let mut out = String::new();
    for score in scores {
        out.push_str(&score.to_line());
        out.push('\n');
    }
    out
}

/// Minimum affinity across the table, `+inf` when there is nothing to rank.
/// `NaN` affinities never win.
#[must_use]
pub fn best_affinity(scores: &[PoseScore]) -> f64 {
    best_pose(scores).map_or(f64::INFINITY, |s| s.affinity)
}

/// The pose with the minimum affinity; the first one wins on ties.
#[must_use]
pub fn best_pose(scores: &[PoseScore]) -> Option<&PoseScore> {
    scores
        .iter()
        .filter(|s| !s.affinity.is_nan())
        .fold(None, |best: Option<&PoseScore>, s| match best {
            Some(b) if b.affinity <= s.affinity => Some(b),
            _ => Some(s),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "1,-7.500,0.000,2.100\n2,-6.900,1.500,3.000\n";

    #[test]
    fn parses_records_in_file_order() {
        let scores = parse_score_table(TABLE);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].mode, Some(1));
        assert_eq!(scores[0].affinity, -7.5);
        assert_eq!(scores[0].rmsd_ub, 2.1);
        assert_eq!(scores[1].mode, Some(2));
        assert_eq!(scores[1].rmsd_lb, 1.5);
    }

    #[test]
    fn empty_and_blank_input_gives_empty_table() {
        assert!(parse_score_table("").is_empty());
        assert!(parse_score_table("\n\n  \n").is_empty());
    }

    #[test]
    fn malformed_field_degrades_to_sentinel() {
        let scores =
            parse_score_table("1,-7.5,0,2\nx,abc,1.0\n3,-5.0,2.0,4.0\n");
        assert_eq!(scores.len(), 3);
        assert_eq!(scores[1].mode, None);
        assert!(scores[1].affinity.is_nan());
        assert_eq!(scores[1].rmsd_lb, 1.0);
        assert!(scores[1].rmsd_ub.is_nan());
        assert!(!scores[1].is_well_formed());
        assert_eq!(scores[2].affinity, -5.0);
    }

    #[test]
    fn does_not_reorder_or_require_contiguous_modes() {
        let scores = parse_score_table("5,-3.0,0,0\n2,-9.0,0,0\n9,-4.0,0,0");
        let modes: Vec<_> = scores.iter().map(|s| s.mode).collect();
        assert_eq!(modes, vec![Some(5), Some(2), Some(9)]);
    }

    #[test]
    fn reparse_is_stable_for_well_formed_lines() {
        let first = parse_score_table(TABLE);
        let second = parse_score_table(&write_score_table(&first));
        assert_eq!(first, second);
    }

    #[test]
    fn best_affinity_is_minimum_or_infinity() {
        assert_eq!(best_affinity(&parse_score_table(TABLE)), -7.5);
        assert_eq!(best_affinity(&[]), f64::INFINITY);

        let with_nan = parse_score_table("1,oops,0,0\n2,-2.0,0,0\n");
        assert_eq!(best_affinity(&with_nan), -2.0);

        let all_nan = parse_score_table("1,oops,0,0\n");
        assert_eq!(best_affinity(&all_nan), f64::INFINITY);
    }

    #[test]
    fn best_pose_prefers_first_on_ties() {
        let scores = parse_score_table("1,-6.0,0,0\n2,-6.0,1,1\n");
        assert_eq!(best_pose(&scores).and_then(|s| s.mode), Some(1));
    }
}
