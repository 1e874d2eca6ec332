//! Authoritative scene: receptor and ligand models, their labels, and the
//! orbital camera that frames them.
//!
//! Rendering is somebody else's job. Loading code talks to a [`Viewport`];
//! [`Scene`] is the in-memory implementation a renderer reads from.

pub mod camera;
pub mod loader;

use glam::Vec3;

use self::camera::CameraController;
use crate::options::{LabelOptions, ViewerOptions};
use crate::structure::ParsedStructure;

/// Which part of the docking complex a model is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelIdentity {
    /// The receptor (protein) structure.
    Receptor,
    /// The `k`-th ligand, in selection order starting at 0.
    Ligand(usize),
    /// A frame of a formulation trajectory.
    Frame(usize),
}

/// How a model is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderRole {
    /// Secondary-structure cartoon.
    CartoonBackbone,
    /// Ball-and-stick small molecule.
    StickLigand,
}

/// Where a label sits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelPlacement {
    /// Fixed world-space point, drawn in the anchor style.
    At(Vec3),
    /// Attached to the model itself, drawn in the fallback style.
    OnModel,
}

/// A text label in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Label text.
    pub text: String,
    /// Placement.
    pub placement: LabelPlacement,
}

/// Resolved appearance of a label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelStyle {
    /// Font size in points.
    pub font_size: f32,
    /// Font color (linear RGB).
    pub font_color: [f32; 3],
    /// Background color and opacity; `None` draws no background.
    pub background: Option<([f32; 3], f32)>,
}

impl LabelStyle {
    /// Style for a label with the given placement: anchored labels are bare
    /// text, on-model labels sit on a translucent background.
    #[must_use]
    pub fn for_placement(
        options: &LabelOptions,
        placement: LabelPlacement,
    ) -> Self {
        match placement {
            LabelPlacement::At(_) => Self {
                font_size: options.font_size,
                font_color: options.font_color,
                background: None,
            },
            LabelPlacement::OnModel => Self {
                font_size: options.font_size,
                font_color: options.fallback_font_color,
                background: Some((
                    options.fallback_background,
                    options.fallback_background_opacity,
                )),
            },
        }
    }
}

/// A structure placed in the scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneModel {
    /// Scene-unique id, assigned by the viewport.
    pub id: u32,
    /// Role in the complex.
    pub identity: ModelIdentity,
    /// Drawing style.
    pub role: RenderRole,
    /// Optional label.
    pub label: Option<Label>,
    /// Best docking affinity, when the score table was available.
    pub best_affinity: Option<f64>,
    /// Path the structure was loaded from.
    pub source_path: String,
    /// Parsed model.
    pub structure: ParsedStructure,
}

impl SceneModel {
    /// New unlabelled model. The id is assigned on insertion.
    #[must_use]
    pub fn new(
        identity: ModelIdentity,
        role: RenderRole,
        source_path: impl Into<String>,
        structure: ParsedStructure,
    ) -> Self {
        Self {
            id: 0,
            identity,
            role,
            label: None,
            best_affinity: None,
            source_path: source_path.into(),
            structure,
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// World-space label anchor, if the label has one.
    #[must_use]
    pub fn label_anchor(&self) -> Option<Vec3> {
        match self.label.as_ref()?.placement {
            LabelPlacement::At(p) => Some(p),
            LabelPlacement::OnModel => None,
        }
    }
}

/// Zoom direction for one zoom step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zoom {
    /// Move closer.
    In,
    /// Move away.
    Out,
}

/// A 3-D viewport the loader populates.
pub trait Viewport {
    /// Remove every model and label.
    fn clear(&mut self);
    /// Add a model; returns its assigned id.
    fn add_model(&mut self, model: SceneModel) -> u32;
    /// Reframe the camera to fit all loaded content.
    fn fit_to_content(&mut self);
    /// Turn the turntable spin on or off.
    fn set_spin(&mut self, spinning: bool);
    /// Apply one zoom step.
    fn zoom(&mut self, zoom: Zoom);
    /// Advance time-based state by `dt` seconds.
    fn tick(&mut self, dt: f32);
}

/// In-memory scene: models in insertion order plus a camera.
#[derive(Debug)]
pub struct Scene {
    models: Vec<SceneModel>,
    next_model_id: u32,
    /// Monotonically increasing generation; bumped on any mutation.
    generation: u64,
    /// Generation that was last consumed by the renderer.
    rendered_generation: u64,
    camera: CameraController,
    zoom_step: f32,
    label_options: LabelOptions,
}

impl Scene {
    /// Empty scene configured from viewer options.
    #[must_use]
    pub fn new(options: &ViewerOptions) -> Self {
        log::debug!("scene acquired");
        Self {
            models: Vec::new(),
            next_model_id: 0,
            generation: 0,
            rendered_generation: 0,
            camera: CameraController::new(options.fovy, options.fit_padding),
            zoom_step: options.zoom_step,
            label_options: options.labels.clone(),
        }
    }

    fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Whether scene data changed since last `mark_rendered()`.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.generation != self.rendered_generation
    }

    /// Mark current generation as rendered.
    pub fn mark_rendered(&mut self) {
        self.rendered_generation = self.generation;
    }

    /// All models, in insertion order.
    #[must_use]
    pub fn models(&self) -> &[SceneModel] {
        &self.models
    }

    /// Number of models.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    /// Model by id.
    #[must_use]
    pub fn model(&self, id: u32) -> Option<&SceneModel> {
        self.models.iter().find(|m| m.id == id)
    }

    /// The receptor model, if loaded.
    #[must_use]
    pub fn receptor(&self) -> Option<&SceneModel> {
        self.models
            .iter()
            .find(|m| m.identity == ModelIdentity::Receptor)
    }

    /// Ligand models in insertion order.
    #[must_use]
    pub fn ligands(&self) -> Vec<&SceneModel> {
        self.models
            .iter()
            .filter(|m| matches!(m.identity, ModelIdentity::Ligand(_)))
            .collect()
    }

    /// Every label in the scene.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.models.iter().filter_map(|m| m.label.as_ref())
    }

    /// How a label should be drawn.
    #[must_use]
    pub fn label_style(&self, label: &Label) -> LabelStyle {
        LabelStyle::for_placement(&self.label_options, label.placement)
    }

    /// All atom positions across all models (for camera fitting).
    #[must_use]
    pub fn all_positions(&self) -> Vec<Vec3> {
        self.models
            .iter()
            .flat_map(|m| m.structure.positions.iter().copied())
            .collect()
    }

    /// The camera.
    #[must_use]
    pub fn camera(&self) -> &CameraController {
        &self.camera
    }

}

impl Viewport for Scene {
    fn clear(&mut self) {
        self.models.clear();
        self.invalidate();
    }

    fn add_model(&mut self, mut model: SceneModel) -> u32 {
        let id = self.next_model_id;
        self.next_model_id += 1;
        model.id = id;
        log::debug!(
            "added {:?} ({} atoms) as model {id}",
            model.identity,
            model.structure.atom_count
        );
        self.models.push(model);
        self.invalidate();
        id
    }

    fn fit_to_content(&mut self) {
        let positions = self.all_positions();
        self.camera.fit_to_positions(&positions);
    }

    fn set_spin(&mut self, spinning: bool) {
        self.camera.set_spin(spinning);
    }

    fn zoom(&mut self, zoom: Zoom) {
        match zoom {
            Zoom::In => self.camera.zoom_by(self.zoom_step),
            Zoom::Out => self.camera.zoom_by(1.0 / self.zoom_step),
        }
    }

    fn tick(&mut self, dt: f32) {
        self.camera.tick(dt);
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        log::debug!("scene released ({} models)", self.models.len());
    }
}
