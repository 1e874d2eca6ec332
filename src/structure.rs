//! Multi-model PDB/PDBQT structure text.
//!
//! Docking output files hold several poses as `MODEL` ... `ENDMDL` blocks;
//! only one pose (by default the top-ranked first one) is shown at a time.
//! Coordinates come from the fixed-width ATOM/HETATM columns 31-38, 39-46
//! and 47-54.

use glam::Vec3;

/// End-of-model record separating poses.
pub const END_OF_MODEL: &str = "ENDMDL";

/// A single model extracted from a structure file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStructure {
    /// The model's records, without the `MODEL` header line.
    pub model_text: String,
    /// Number of ATOM/HETATM records with readable coordinates.
    pub atom_count: usize,
    /// Atom positions in file order.
    pub positions: Vec<Vec3>,
}

impl ParsedStructure {
    /// Build from a model's record text.
    #[must_use]
    pub fn from_model_text(model_text: &str) -> Self {
        let positions = parse_positions(model_text);
        Self {
            model_text: model_text.to_owned(),
            atom_count: positions.len(),
            positions,
        }
    }

    /// Whether no atom records were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atom_count == 0
    }

    /// Position of the most central atom, used as the label anchor when no
    /// anchor file is supplied.
    #[must_use]
    pub fn label_anchor(&self) -> Option<Vec3> {
        central_atom(&self.positions).map(|(_, p)| p)
    }
}

/// Whether a line is an ATOM or HETATM record.
#[must_use]
pub fn is_atom_record(line: &str) -> bool {
    line.starts_with("ATOM") || line.starts_with("HETATM")
}

/// Split structure text into model blocks.
///
/// Blocks are separated by `ENDMDL`; blocks without any atom record (the
/// trailing `END`, `CONECT` or remark-only tails) are dropped. A single-model
/// file without `ENDMDL` yields one block holding the whole text.
#[must_use]
pub fn split_models(text: &str) -> Vec<&str> {
    text.split(END_OF_MODEL)
        .filter(|block| block.lines().any(is_atom_record))
        .collect()
}

/// Extract model `model_number` (1-based) from multi-model text.
///
/// An out-of-range model number falls back to the first model. Text without
/// atom records yields an empty structure.
#[must_use]
pub fn extract_model(text: &str, model_number: usize) -> ParsedStructure {
    let models = split_models(text);
    let Some(first) = models.first() else {
        return ParsedStructure::default();
    };

    let block = match model_number.checked_sub(1).and_then(|i| models.get(i)) {
        Some(block) => block,
        None => {
            log::warn!(
                "model {model_number} out of range ({} models), \
                 showing model 1",
                models.len()
            );
            first
        }
    };

    ParsedStructure::from_model_text(&strip_model_header(block))
}

/// Extract the first (top-ranked) model.
#[must_use]
pub fn extract_first_model(text: &str) -> ParsedStructure {
    extract_model(text, 1)
}

fn strip_model_header(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    for line in block.lines() {
        if line.starts_with("MODEL") || line.trim().is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Parse the coordinate triple of one ATOM/HETATM record.
#[must_use]
pub fn parse_atom_position(line: &str) -> Option<Vec3> {
    if !is_atom_record(line) {
        return None;
    }
    let field = |range: std::ops::Range<usize>| {
        line.get(range)?.trim().parse::<f32>().ok()
    };
    Some(Vec3::new(field(30..38)?, field(38..46)?, field(46..54)?))
}

/// All atom positions in file order. Records with unreadable coordinates
/// are skipped.
#[must_use]
pub fn parse_positions(text: &str) -> Vec<Vec3> {
    text.lines().filter_map(parse_atom_position).collect()
}

/// Arithmetic mean of the positions.
#[must_use]
pub fn centroid(positions: &[Vec3]) -> Option<Vec3> {
    if positions.is_empty() {
        return None;
    }
    Some(positions.iter().copied().sum::<Vec3>() / positions.len() as f32)
}

/// The atom closest to the centroid, as `(index, position)`.
/// Ties resolve to the earliest atom in file order.
#[must_use]
pub fn central_atom(positions: &[Vec3]) -> Option<(usize, Vec3)> {
    let center = centroid(positions)?;
    let mut best: Option<(usize, Vec3, f32)> = None;
    for (i, &p) in positions.iter().enumerate() {
        let d = p.distance_squared(center);
        match best {
            Some((_, _, bd)) if bd <= d => {}
            _ => best = Some((i, p, d)),
        }
    }
    best.map(|(i, p, _)| (i, p))
}

/// Parse a label anchor file: a single `x,y,z` line.
#[must_use]
pub fn parse_anchor(text: &str) -> Option<Vec3> {
    let fields: Vec<&str> = text.trim().split(',').collect();
    let [x, y, z] = fields.as_slice() else {
        return None;
    };
    let parse =
        |s: &str| s.trim().parse::<f32>().ok().filter(|v| v.is_finite());
    Some(Vec3::new(parse(*x)?, parse(*y)?, parse(*z)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(serial: u32, x: f32, y: f32, z: f32) -> String {
        format!(
            "ATOM  {serial:>5}  C   LIG A   1    \
             {x:>8.3}{y:>8.3}{z:>8.3}  1.00  0.00     0.000 C\n"
        )
    }

    fn two_models() -> String {
        let mut text = String::from("MODEL 1\n");
        text.push_str(&atom(1, 1.0, 0.0, 0.0));
        text.push_str(&atom(2, 3.0, 0.0, 0.0));
        text.push_str("ENDMDL\nMODEL 2\n");
        text.push_str(&atom(1, 50.0, 50.0, 50.0));
        text.push_str("ENDMDL\nEND\n");
        text
    }

    #[test]
    fn reads_fixed_width_coordinates() {
        let line = atom(7, -12.5, 4.25, 100.125);
        assert_eq!(
            parse_atom_position(&line),
            Some(Vec3::new(-12.5, 4.25, 100.125))
        );
        assert_eq!(parse_atom_position("REMARK nothing here"), None);
        assert_eq!(parse_atom_position("ATOM      1  C"), None);
    }

    #[test]
    fn first_model_excludes_second_model_atoms() {
        let parsed = extract_first_model(&two_models());
        assert_eq!(parsed.atom_count, 2);
        assert!(!parsed.model_text.contains("MODEL"));
        assert!(!parsed.model_text.contains("50.000"));
        assert_eq!(parsed.positions[1], Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn trailing_end_block_is_not_a_model() {
        assert_eq!(split_models(&two_models()).len(), 2);
    }

    #[test]
    fn single_model_file_without_endmdl() {
        let text = format!("REMARK single\n{}END\n", atom(1, 1.0, 2.0, 3.0));
        let models = split_models(&text);
        assert_eq!(models.len(), 1);
        let parsed = extract_first_model(&text);
        assert_eq!(parsed.atom_count, 1);
    }

    #[test]
    fn out_of_range_model_falls_back_to_first() {
        let text = two_models();
        assert_eq!(extract_model(&text, 2).positions[0], Vec3::splat(50.0));
        assert_eq!(extract_model(&text, 9), extract_model(&text, 1));
        assert_eq!(extract_model(&text, 0), extract_model(&text, 1));
    }

    #[test]
    fn no_atoms_gives_empty_structure() {
        let parsed = extract_first_model("REMARK only\nEND\n");
        assert!(parsed.is_empty());
        assert_eq!(parsed.label_anchor(), None);
    }

    #[test]
    fn central_atom_is_nearest_to_centroid() {
        let positions = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(1.9, 0.1, 0.0),
            Vec3::new(2.0, 10.0, 0.0),
        ];
        let (idx, _) = central_atom(&positions).unwrap_or_default();
        assert_eq!(idx, 2);
    }

    #[test]
    fn central_atom_ties_resolve_to_first_occurrence() {
        let positions = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        for _ in 0..3 {
            assert_eq!(central_atom(&positions).map(|(i, _)| i), Some(0));
        }
        assert_eq!(central_atom(&[]), None);
    }

    #[test]
    fn anchor_file_parsing() {
        assert_eq!(parse_anchor("1.5,-2,3\n"), Some(Vec3::new(1.5, -2.0, 3.0)));
        assert_eq!(parse_anchor("1,2"), None);
        assert_eq!(parse_anchor("1,2,3,4"), None);
        assert_eq!(parse_anchor("a,2,3"), None);
        assert_eq!(parse_anchor(""), None);
    }
}
