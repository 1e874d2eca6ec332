//! Formulation (micelle) trajectories.
//!
//! A dataset is a multiframe PDB with one `MODEL`/`ENDMDL` block per frame
//! and a metrics document carrying per-frame center of geometry and radius
//! of gyration:
//!
//! ```json
//! { "name": "C12", "times": [..], "cx": [..], "cy": [..], "cz": [..],
//!   "rg": [..], "rgx": [..], "rgy": [..], "rgz": [..] }
//! ```

use std::time::Duration;

use glam::{DVec3, Vec3};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::error::DockviewError;
use crate::structure::{
    extract_model, parse_positions, split_models, ParsedStructure,
};

/// Per-frame micelle stability metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MicelleMetrics {
    /// Dataset name.
    #[serde(default)]
    pub name: Option<String>,
    /// Frame stride used when the trajectory was subsampled.
    #[serde(default)]
    pub stride: Option<u32>,
    /// Simulation time of each frame (ps).
    pub times: Vec<f64>,
    /// Center of geometry, x.
    pub cx: Vec<f64>,
    /// Center of geometry, y.
    pub cy: Vec<f64>,
    /// Center of geometry, z.
    pub cz: Vec<f64>,
    /// Radius of gyration (Å).
    pub rg: Vec<f64>,
    /// Gyration along x.
    pub rgx: Vec<f64>,
    /// Gyration along y.
    pub rgy: Vec<f64>,
    /// Gyration along z.
    pub rgz: Vec<f64>,
}

/// Metrics of a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetrics {
    /// Frame index.
    pub index: usize,
    /// Simulation time (ps).
    pub time: f64,
    /// Center of geometry.
    pub center: DVec3,
    /// Radius of gyration.
    pub rg: f64,
    /// Per-axis gyration.
    pub rg_axes: DVec3,
}

impl MicelleMetrics {
    /// Parse a metrics document and validate it.
    pub fn from_json(text: &str) -> Result<Self, DockviewError> {
        let metrics: Self = serde_json::from_str(text)
            .map_err(|e| DockviewError::Metrics(e.to_string()))?;
        let _ = metrics.validate()?;
        Ok(metrics)
    }

    /// Check that every series has the same length; returns the frame count.
    pub fn validate(&self) -> Result<usize, DockviewError> {
        let n = self.times.len();
        let series = [
            ("cx", &self.cx),
            ("cy", &self.cy),
            ("cz", &self.cz),
            ("rg", &self.rg),
            ("rgx", &self.rgx),
            ("rgy", &self.rgy),
            ("rgz", &self.rgz),
        ];
        for (name, values) in series {
            if values.len() != n {
                return Err(DockviewError::Metrics(format!(
                    "{name} has {} values, expected {n}",
                    values.len()
                )));
            }
        }
        Ok(n)
    }

    /// Number of frames (length of `times`).
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.times.len()
    }

    /// Metrics of frame `index`, clamped into range. `None` when empty or
    /// when the series are ragged.
    #[must_use]
    pub fn frame(&self, index: usize) -> Option<FrameMetrics> {
        let n = self.validate().ok()?;
        let i = index.min(n.checked_sub(1)?);
        Some(FrameMetrics {
            index: i,
            time: self.times[i],
            center: DVec3::new(self.cx[i], self.cy[i], self.cz[i]),
            rg: self.rg[i],
            rg_axes: DVec3::new(self.rgx[i], self.rgy[i], self.rgz[i]),
        })
    }

    /// Summary of the last frame.
    #[must_use]
    pub fn final_frame(&self) -> Option<FrameMetrics> {
        self.frame(usize::MAX)
    }

    /// Compute metrics from frame coordinates.
    ///
    /// Center of geometry is the mean position. The gyration tensor is
    /// `Xᵀ X / n` over centered positions; per-axis gyration is the square
    /// root of its diagonal and `rg` the square root of its trace. Frames
    /// without atoms are skipped.
    #[must_use]
    pub fn from_frames(frames: &[(f64, Vec<Vec3>)]) -> Self {
        let mut m = Self::default();
        for (time, positions) in frames {
            if positions.is_empty() {
                continue;
            }
            let n = positions.len() as f64;
            let center = positions
                .iter()
                .map(|p| p.as_dvec3())
                .sum::<DVec3>()
                / n;
            let diag = positions
                .iter()
                .map(|p| {
                    let d = p.as_dvec3() - center;
                    d * d
                })
                .sum::<DVec3>()
                / n;

            m.times.push(*time);
            m.cx.push(center.x);
            m.cy.push(center.y);
            m.cz.push(center.z);
            m.rg.push(diag.element_sum().sqrt());
            m.rgx.push(diag.x.max(0.0).sqrt());
            m.rgy.push(diag.y.max(0.0).sqrt());
            m.rgz.push(diag.z.max(0.0).sqrt());
        }
        m
    }
}

/// A loaded micelle dataset: frame structures plus their metrics.
#[derive(Debug, Clone)]
pub struct MicelleDataset {
    /// Display name.
    pub name: String,
    frames: Vec<String>,
    /// Per-frame metrics.
    pub metrics: MicelleMetrics,
}

impl MicelleDataset {
    /// Build from multiframe PDB text and a metrics document.
    pub fn parse(
        name: &str,
        multiframe: &str,
        metrics_json: &str,
    ) -> Result<Self, DockviewError> {
        let metrics = MicelleMetrics::from_json(metrics_json)?;
        let frames: Vec<String> =
            split_models(multiframe).into_iter().map(str::to_owned).collect();
        if frames.len() != metrics.frame_count() {
            log::warn!(
                "{name}: {} structure frames but {} metric frames",
                frames.len(),
                metrics.frame_count()
            );
        }
        Ok(Self {
            name: name.to_owned(),
            frames,
            metrics,
        })
    }

    /// Build from multiframe PDB text alone, computing the metrics from each
    /// frame's coordinates. Frame times are frame indices.
    #[must_use]
    pub fn from_structures(name: &str, multiframe: &str) -> Self {
        let frames: Vec<String> =
            split_models(multiframe).into_iter().map(str::to_owned).collect();
        let coordinates: Vec<(f64, Vec<Vec3>)> = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| (i as f64, parse_positions(frame)))
            .collect();
        let mut metrics = MicelleMetrics::from_frames(&coordinates);
        metrics.name = Some(name.to_owned());
        Self {
            name: name.to_owned(),
            frames,
            metrics,
        }
    }

    /// Number of frames that have both a structure and metrics.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len().min(self.metrics.frame_count())
    }

    /// Structure of frame `index`, clamped into range.
    #[must_use]
    pub fn structure(&self, index: usize) -> ParsedStructure {
        let Some(last) = self.frame_count().checked_sub(1) else {
            return ParsedStructure::default();
        };
        extract_model(&self.frames[index.min(last)], 1)
    }
}

/// Frame sequencer. Playback and stepping both wrap around at the ends.
#[derive(Debug, Clone)]
pub struct FramePlayer {
    frame_count: usize,
    current_frame: usize,
    last_advance: Instant,
    frame_duration: Duration,
    playing: bool,
}

impl FramePlayer {
    /// Paused player at frame 0, stepping every 120 ms when played.
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            current_frame: 0,
            last_advance: Instant::now(),
            frame_duration: Duration::from_millis(120),
            playing: false,
        }
    }

    /// Advance time; returns the new frame index if a step occurred.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if !self.playing || self.frame_count == 0 {
            return None;
        }
        if now.duration_since(self.last_advance) < self.frame_duration {
            return None;
        }
        self.last_advance = now;
        Some(self.step_forward())
    }

    /// Step one frame forward, wrapping to the start.
    pub fn step_forward(&mut self) -> usize {
        if self.frame_count > 0 {
            self.current_frame = (self.current_frame + 1) % self.frame_count;
        }
        self.current_frame
    }

    /// Step one frame back, wrapping to the end.
    pub fn step_back(&mut self) -> usize {
        if self.frame_count > 0 {
            self.current_frame = self
                .current_frame
                .checked_sub(1)
                .unwrap_or(self.frame_count - 1);
        }
        self.current_frame
    }

    /// Jump to a frame, clamped into range.
    pub fn seek(&mut self, frame: usize) {
        self.current_frame = frame.min(self.frame_count.saturating_sub(1));
    }

    /// Start or pause playback. The first step after starting comes one
    /// frame duration after `now`.
    pub fn toggle_playback(&mut self, now: Instant) {
        self.playing = !self.playing;
        self.last_advance = now;
    }

    /// Playback speed in frames per second, floored at 0.1.
    pub fn set_fps(&mut self, fps: f32) {
        self.frame_duration =
            Duration::from_secs_f64(1.0 / f64::from(fps.max(0.1)));
    }

    /// Index of the current frame.
    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Whether playback is running.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRICS: &str = r#"{
        "name": "C8",
        "stride": 5,
        "n_frames": 2,
        "times": [0.0, 10.0],
        "cx": [1.0, 2.0], "cy": [0.0, 0.0], "cz": [0.0, 0.5],
        "rg": [12.0, 11.5],
        "rgx": [7.0, 6.9], "rgy": [7.0, 6.6], "rgz": [6.9, 6.8]
    }"#;

    #[test]
    fn parses_and_validates() {
        let m = MicelleMetrics::from_json(METRICS).unwrap();
        assert_eq!(m.validate().unwrap(), 2);
        assert_eq!(m.name.as_deref(), Some("C8"));
    }

    #[test]
    fn ragged_series_rejected() {
        let text = METRICS.replace(r#""rgz": [6.9, 6.8]"#, r#""rgz": [6.9]"#);
        let err = MicelleMetrics::from_json(&text).unwrap_err();
        assert!(err.to_string().contains("rgz"));

        let missing = METRICS.replace(r#""rg": [12.0, 11.5],"#, "");
        assert!(matches!(
            MicelleMetrics::from_json(&missing),
            Err(DockviewError::Metrics(_))
        ));
    }

    #[test]
    fn frame_lookup_clamps() {
        let m = MicelleMetrics::from_json(METRICS).unwrap();
        let last = m.final_frame().unwrap();
        assert_eq!(last.index, 1);
        assert_eq!(last.rg, 11.5);
        assert_eq!(m.frame(99), m.final_frame());
        assert_eq!(m.frame(0).unwrap().center, DVec3::new(1.0, 0.0, 0.0));
        assert!(MicelleMetrics::default().frame(0).is_none());
    }

    #[test]
    fn gyration_from_coordinates() {
        let frame = vec![Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
        let m = MicelleMetrics::from_frames(&[(0.0, frame), (1.0, vec![])]);
        assert_eq!(m.validate().unwrap(), 1);
        assert_eq!(m.cx[0], 0.0);
        assert!((m.rgx[0] - 1.0).abs() < 1e-12);
        assert_eq!(m.rgy[0], 0.0);
        assert!((m.rg[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dataset_frames_clamp() {
        let atom = |x: f32| {
            format!(
                "ATOM      1  C   OCT A   1    {x:>8.3}   0.000   0.000  \
                 1.00  0.00           C\n"
            )
        };
        let text = format!(
            "MODEL 1\n{}ENDMDL\nMODEL 2\n{}ENDMDL\nEND\n",
            atom(1.0),
            atom(2.0)
        );
        let ds = MicelleDataset::parse("C8", &text, METRICS).unwrap();
        assert_eq!(ds.frame_count(), 2);
        assert_eq!(ds.structure(1).positions[0].x, 2.0);
        assert_eq!(ds.structure(7).positions[0].x, 2.0);
    }

    #[test]
    fn player_wraps() {
        let mut p = FramePlayer::new(3);
        assert_eq!(p.step_back(), 2);
        assert_eq!(p.step_forward(), 0);
        p.seek(10);
        assert_eq!(p.current_frame(), 2);

        let start = Instant::now();
        p.toggle_playback(start);
        assert!(p.is_playing());
        assert_eq!(p.tick(start + Duration::from_millis(50)), None);
        assert_eq!(p.tick(start + Duration::from_millis(120)), Some(0));
        assert_eq!(p.tick(start + Duration::from_millis(240)), Some(1));

        p.set_fps(1000.0);
        assert_eq!(p.tick(start + Duration::from_millis(242)), Some(2));
        p.toggle_playback(start);
        assert_eq!(p.tick(start + Duration::from_secs(9)), None);
    }

    #[test]
    fn empty_player_is_inert() {
        let mut p = FramePlayer::new(0);
        assert_eq!(p.step_forward(), 0);
        assert_eq!(p.step_back(), 0);
        let start = Instant::now();
        p.toggle_playback(start);
        assert_eq!(p.tick(start + Duration::from_secs(1)), None);
    }
}
