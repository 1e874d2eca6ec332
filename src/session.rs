//! Application state for one viewing session.
//!
//! A [`Session`] owns the artifact source, the current selection and its
//! results, and the viewport. The viewport is acquired on first use and
//! released on [`Session::release_viewport`] or when the session drops.

use std::cell::{Ref, RefCell};

use web_time::Instant;

use crate::aggregate::{Aggregator, DockingResult};
use crate::error::DockviewError;
use crate::fetch::ArtifactSource;
use crate::options::{Options, ViewerOptions};
use crate::resolve::{PathResolver, Selection};
use crate::scene::loader::{show_frame, LoadReport, SceneLoader};
use crate::scene::{Scene, Viewport, Zoom};
use crate::summary::{FrameSummary, ResultsTable};
use crate::trajectory::{FramePlayer, MicelleDataset};

/// Builds a viewport from viewer options.
pub type ViewportFactory<V> = fn(&ViewerOptions) -> V;

struct LoadedDataset {
    dataset: MicelleDataset,
    multiframe_path: String,
    player: FramePlayer,
}

/// Selection, results and viewport of one user session.
pub struct Session<S: ArtifactSource, V: Viewport = Scene> {
    options: Options,
    source: S,
    resolver: PathResolver,
    loader: SceneLoader,
    make_viewport: ViewportFactory<V>,
    viewport: Option<RefCell<V>>,
    spin: bool,

    selection: Option<Selection>,
    results: Vec<DockingResult>,
    displayed: Option<String>,
    dataset: Option<LoadedDataset>,
    last_tick: Option<Instant>,
}

impl<S: ArtifactSource> Session<S, Scene> {
    /// Session rendering into an in-memory [`Scene`].
    #[must_use]
    pub fn new(options: Options, source: S) -> Self {
        Self::with_viewport(options, source, Scene::new)
    }
}

impl<S: ArtifactSource, V: Viewport> Session<S, V> {
    /// Session whose viewport is built by `make_viewport` on first use.
    #[must_use]
    pub fn with_viewport(
        options: Options,
        source: S,
        make_viewport: ViewportFactory<V>,
    ) -> Self {
        Self {
            resolver: PathResolver::from_options(&options),
            loader: SceneLoader::new(&options.viewer),
            spin: options.viewer.spin,
            options,
            source,
            make_viewport,
            viewport: None,
            selection: None,
            results: Vec::new(),
            displayed: None,
            dataset: None,
            last_tick: None,
        }
    }

    /// Active options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Path resolver built from the options.
    #[must_use]
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// The scene loader.
    #[must_use]
    pub fn loader(&self) -> &SceneLoader {
        &self.loader
    }

    /// The artifact source.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Request behind the structure shown after the last docking batch.
    #[must_use]
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Results of the last successful docking batch.
    #[must_use]
    pub fn results(&self) -> &[DockingResult] {
        &self.results
    }

    /// Structure path currently shown.
    #[must_use]
    pub fn displayed(&self) -> Option<&str> {
        self.displayed.as_deref()
    }

    /// The viewport, if it has been acquired.
    #[must_use]
    pub fn viewport(&self) -> Option<Ref<'_, V>> {
        self.viewport.as_ref().map(RefCell::borrow)
    }

    /// Whether a viewport is currently held.
    #[must_use]
    pub fn has_viewport(&self) -> bool {
        self.viewport.is_some()
    }

    /// Drop the viewport. The next load acquires a fresh one.
    pub fn release_viewport(&mut self) {
        if self.viewport.take().is_some() {
            log::debug!("viewport released");
        }
    }

    /// Run a docking batch, then show its representative structure.
    ///
    /// Results are replaced wholesale. A batch that fails leaves no results
    /// behind.
    pub async fn run_docking(
        &mut self,
        batch: &[Selection],
    ) -> Result<LoadReport, DockviewError> {
        self.results.clear();
        self.displayed = None;

        let outcome = Aggregator::new(&self.source, &self.resolver)
            .with_policy(self.options.batch_failure_policy)
            .run(batch)
            .await?;

        self.results = outcome.results;
        self.selection = outcome.representative_request;
        match outcome.representative {
            Some(path) => self.select_result(&path).await,
            None => {
                log::warn!("docking batch produced no structure to show");
                Ok(LoadReport::default())
            }
        }
    }

    /// Show a result's structure next to the receptor it was docked
    /// against.
    pub async fn select_result(
        &mut self,
        structure_path: &str,
    ) -> Result<LoadReport, DockviewError> {
        let Some(result) = self
            .results
            .iter()
            .find(|r| r.structure_path == structure_path)
        else {
            return Err(DockviewError::Configuration(format!(
                "{structure_path} is not part of the current results"
            )));
        };
        let receptor = self.resolver.receptor_path(&result.receptor);
        self.displayed = None;
        self.dataset = None;
        let report = self
            .load(Some(receptor), vec![structure_path.to_owned()])
            .await?;
        self.displayed = Some(structure_path.to_owned());
        Ok(report)
    }

    /// Show a membrane-interaction protein set: the first protein as the
    /// receptor, the rest as companions.
    pub async fn show_membrane(
        &mut self,
        proteins: &[String],
    ) -> Result<LoadReport, DockviewError> {
        let mut paths = self.resolver.membrane_paths(proteins);
        if paths.is_empty() {
            return Err(DockviewError::Configuration(
                "no membrane proteins selected".into(),
            ));
        }
        let receptor = paths.remove(0);
        self.displayed = None;
        self.dataset = None;
        let report = self.load(Some(receptor.clone()), paths).await?;
        self.displayed = Some(receptor);
        Ok(report)
    }

    async fn load(
        &mut self,
        receptor: Option<String>,
        ligands: Vec<String>,
    ) -> Result<LoadReport, DockviewError> {
        let viewer = &self.options.viewer;
        let make = self.make_viewport;
        let viewport = self
            .viewport
            .get_or_insert_with(|| RefCell::new(make(viewer)));
        self.loader
            .load(
                &self.source,
                viewport,
                receptor.as_deref(),
                &ligands,
                self.spin,
            )
            .await
    }

    /// Load a formulation dataset and show `frame`.
    pub async fn show_dataset(
        &mut self,
        key: &str,
        frame: usize,
    ) -> Result<(), DockviewError> {
        let paths = self.resolver.dataset(key)?;
        self.displayed = None;
        self.dataset = None;
        let viewer = &self.options.viewer;
        let make = self.make_viewport;
        let viewport = self
            .viewport
            .get_or_insert_with(|| RefCell::new(make(viewer)));
        let loaded = self
            .loader
            .load_dataset(&self.source, viewport, &paths, frame, self.spin)
            .await?;

        if let Some(dataset) = loaded {
            let mut player = FramePlayer::new(dataset.frame_count());
            player.set_fps(self.options.viewer.playback_fps);
            player.seek(frame);
            self.displayed = Some(paths.multiframe.clone());
            self.dataset = Some(LoadedDataset {
                dataset,
                multiframe_path: paths.multiframe,
                player,
            });
        }
        Ok(())
    }

    /// Jump the loaded dataset to `frame` (clamped). Returns the frame shown.
    pub fn show_frame(&mut self, frame: usize) -> Option<usize> {
        let loaded = self.dataset.as_mut()?;
        loaded.player.seek(frame);
        let index = loaded.player.current_frame();
        if let Some(viewport) = &self.viewport {
            show_frame(
                &mut *viewport.borrow_mut(),
                &loaded.dataset,
                &loaded.multiframe_path,
                index,
            );
        }
        Some(index)
    }

    /// Step the loaded dataset forward (wrapping). Returns the frame shown.
    pub fn next_frame(&mut self) -> Option<usize> {
        let next = self.dataset.as_mut()?.player.step_forward();
        self.show_frame(next)
    }

    /// Step the loaded dataset back (wrapping). Returns the frame shown.
    pub fn previous_frame(&mut self) -> Option<usize> {
        let previous = self.dataset.as_mut()?.player.step_back();
        self.show_frame(previous)
    }

    /// Start or pause dataset playback. Returns whether it is now playing,
    /// or `None` without a dataset.
    pub fn toggle_playback(&mut self, now: Instant) -> Option<bool> {
        let player = &mut self.dataset.as_mut()?.player;
        player.toggle_playback(now);
        Some(player.is_playing())
    }

    /// Advance to `now`: spin the viewport and, while playing, step the
    /// dataset. Returns the frame shown when playback stepped.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let dt = self
            .last_tick
            .map_or(0.0, |last| now.duration_since(last).as_secs_f32());
        self.last_tick = Some(now);
        if let Some(viewport) = &self.viewport {
            viewport.borrow_mut().tick(dt);
        }
        let next = self.dataset.as_mut()?.player.tick(now)?;
        self.show_frame(next)
    }

    /// The loaded dataset.
    #[must_use]
    pub fn dataset(&self) -> Option<&MicelleDataset> {
        self.dataset.as_ref().map(|d| &d.dataset)
    }

    /// Turn the turntable spin on or off, now and for later loads.
    pub fn set_spin(&mut self, spin: bool) {
        self.spin = spin;
        if let Some(viewport) = &self.viewport {
            viewport.borrow_mut().set_spin(spin);
        }
    }

    /// Apply one zoom step to the viewport, if held.
    pub fn zoom(&self, zoom: Zoom) {
        if let Some(viewport) = &self.viewport {
            viewport.borrow_mut().zoom(zoom);
        }
    }

    /// Results panel text.
    #[must_use]
    pub fn results_summary(&self) -> String {
        ResultsTable::new(&self.results, self.displayed()).to_string()
    }

    /// Metrics panel text for the current dataset frame.
    #[must_use]
    pub fn frame_summary(&self) -> Option<String> {
        let loaded = self.dataset.as_ref()?;
        let frame = loaded.player.current_frame();
        let metrics = loaded.dataset.metrics.frame(frame)?;
        let count = loaded.dataset.frame_count();
        Some(FrameSummary::new(metrics, count).to_string())
    }
}

impl<S: ArtifactSource, V: Viewport> Drop for Session<S, V> {
    fn drop(&mut self) {
        self.release_viewport();
    }
}
