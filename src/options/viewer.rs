use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::aggregate::FailurePolicy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Viewer", inline)]
#[serde(default)]
/// Scene loading and camera behavior.
pub struct ViewerOptions {
    /// Start turntable rotation once every structure has settled.
    #[schemars(title = "Spin")]
    pub spin: bool,
    /// 1-based pose shown from multi-model ligand files. Out-of-range values
    /// fall back to the first model.
    #[schemars(title = "Model To Display", range(min = 1))]
    pub model_to_display: usize,
    /// Multiplicative zoom applied per zoom-in/zoom-out step.
    #[schemars(title = "Zoom Step", range(min = 1.01, max = 3.0))]
    pub zoom_step: f32,
    /// Vertical field of view in degrees, used when fitting the camera.
    #[schemars(title = "Field of View", range(min = 20.0, max = 90.0))]
    pub fovy: f32,
    /// Padding multiplier applied to the fitted camera distance.
    #[schemars(skip)]
    pub fit_padding: f32,
    /// Trajectory playback speed in frames per second.
    #[schemars(title = "Playback FPS", range(min = 0.1, max = 60.0))]
    pub playback_fps: f32,
    /// What a ligand failure does to the rest of the scene.
    #[schemars(skip)]
    pub failure_policy: FailurePolicy,
    /// Label appearance.
    pub labels: LabelOptions,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            spin: false,
            model_to_display: 1,
            zoom_step: 1.2,
            fovy: 45.0,
            fit_padding: 1.5,
            playback_fps: 1000.0 / 120.0,
            failure_policy: FailurePolicy::SkipFailed,
            labels: LabelOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Labels", inline)]
#[serde(default)]
/// Font and background settings for ligand labels.
pub struct LabelOptions {
    /// Font size in points.
    #[schemars(title = "Font Size", range(min = 6.0, max = 48.0))]
    pub font_size: f32,
    /// Font color for labels placed at an anchor point.
    pub font_color: [f32; 3],
    /// Font color for the on-model fallback label.
    pub fallback_font_color: [f32; 3],
    /// Background color for the on-model fallback label.
    pub fallback_background: [f32; 3],
    /// Background opacity for the on-model fallback label.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub fallback_background_opacity: f32,
}

impl Default for LabelOptions {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            font_color: [1.0, 1.0, 1.0],
            fallback_font_color: [0.0, 0.0, 0.0],
            fallback_background: [1.0, 1.0, 1.0],
            fallback_background_opacity: 0.8,
        }
    }
}
