//! Incremental, failure-tolerant scene population.
//!
//! A load clears the viewport, then fetches the receptor and every ligand
//! (plus each ligand's `xyz/` anchor and `results/` score table)
//! concurrently. Each structure is added as soon as it arrives. Once every
//! fetch has settled the camera is refit and spin applied.
//!
//! Each load takes a new generation number. A completion whose generation
//! is no longer current belongs to a superseded selection and is dropped
//! before it can touch the viewport.

use std::cell::{Cell, RefCell};

use futures::future::{join, join3, join_all};
use web_time::Instant;

use super::{
    Label, LabelPlacement, ModelIdentity, RenderRole, SceneModel, Viewport,
};
use crate::aggregate::FailurePolicy;
use crate::error::DockviewError;
use crate::fetch::ArtifactSource;
use crate::options::ViewerOptions;
use crate::resolve::{companions, structure_label, DatasetPaths};
use crate::score::{best_affinity, parse_score_table};
use crate::structure::{extract_model, parse_anchor};
use crate::trajectory::MicelleDataset;

/// Loader progress for the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoadState {
    /// Nothing requested yet.
    #[default]
    Idle,
    /// Removing the previous selection's models.
    Clearing,
    /// Fetches outstanding.
    Loading {
        /// Structures not yet settled.
        pending: usize,
    },
    /// Every fetch settled and the camera was refit.
    Ready,
}

/// What one load did.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Generation of this load.
    pub generation: u64,
    /// Models added to the viewport.
    pub loaded: usize,
    /// Structures skipped because they could not be fetched.
    pub failures: Vec<DockviewError>,
    /// A newer load started before this one finished; nothing after the
    /// newer load's clear came from this one.
    pub superseded: bool,
}

enum Settled {
    Loaded,
    Failed(DockviewError),
    Stale,
}

/// Populates a [`Viewport`] from structure paths.
#[derive(Debug)]
pub struct SceneLoader {
    generation: Cell<u64>,
    state: Cell<LoadState>,
    model_to_display: usize,
    policy: FailurePolicy,
}

impl SceneLoader {
    /// Loader configured from viewer options.
    #[must_use]
    pub fn new(options: &ViewerOptions) -> Self {
        Self {
            generation: Cell::new(0),
            state: Cell::new(LoadState::Idle),
            model_to_display: options.model_to_display,
            policy: options.failure_policy,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LoadState {
        self.state.get()
    }

    /// Generation of the most recent load.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    fn begin<V: Viewport>(&self, viewport: &RefCell<V>, pending: usize) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        self.state.set(LoadState::Clearing);
        viewport.borrow_mut().clear();
        self.state.set(LoadState::Loading { pending });
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    fn settle_one(&self) {
        if let LoadState::Loading { pending } = self.state.get() {
            self.state.set(LoadState::Loading {
                pending: pending.saturating_sub(1),
            });
        }
    }

    /// Clear the viewport and load a receptor with ligands.
    ///
    /// Ligands are identified by their docked structure paths; label anchors
    /// and score tables are looked up next to them. Under
    /// [`FailurePolicy::SkipFailed`] unreachable structures are logged and
    /// skipped; under [`FailurePolicy::AbortBatch`] the first failure clears
    /// the viewport again and is returned once every fetch has settled.
    pub async fn load<S, V>(
        &self,
        source: &S,
        viewport: &RefCell<V>,
        receptor: Option<&str>,
        ligands: &[String],
        spin: bool,
    ) -> Result<LoadReport, DockviewError>
    where
        S: ArtifactSource,
        V: Viewport,
    {
        let started = Instant::now();
        let pending = ligands.len() + usize::from(receptor.is_some());
        let generation = self.begin(viewport, pending);
        log::info!(
            "load {generation}: receptor {:?}, {} ligand(s)",
            receptor,
            ligands.len()
        );

        let receptor_load = async {
            match receptor {
                Some(path) => Some(
                    self.load_receptor(source, viewport, generation, path)
                        .await,
                ),
                None => None,
            }
        };
        let ligand_loads = join_all(ligands.iter().enumerate().map(|(k, path)| {
            self.load_ligand(source, viewport, generation, k, path)
        }));
        let (receptor_settled, ligand_settled) =
            join(receptor_load, ligand_loads).await;

        let mut report = LoadReport {
            generation,
            ..LoadReport::default()
        };
        for settled in receptor_settled.into_iter().chain(ligand_settled) {
            match settled {
                Settled::Loaded => report.loaded += 1,
                Settled::Failed(e) => report.failures.push(e),
                Settled::Stale => report.superseded = true,
            }
        }

        if !self.is_current(generation) {
            report.superseded = true;
            log::debug!("load {generation} superseded");
            return Ok(report);
        }

        if self.policy == FailurePolicy::AbortBatch
            && !report.failures.is_empty()
        {
            viewport.borrow_mut().clear();
            self.state.set(LoadState::Idle);
            return Err(report.failures.swap_remove(0));
        }

        {
            let mut vp = viewport.borrow_mut();
            vp.fit_to_content();
            vp.set_spin(spin);
        }
        self.state.set(LoadState::Ready);
        log::info!(
            "load {generation}: {} loaded, {} skipped in {:.1?}",
            report.loaded,
            report.failures.len(),
            started.elapsed()
        );
        Ok(report)
    }

    async fn load_receptor<S, V>(
        &self,
        source: &S,
        viewport: &RefCell<V>,
        generation: u64,
        path: &str,
    ) -> Settled
    where
        S: ArtifactSource,
        V: Viewport,
    {
        let fetched = source.fetch_text(path).await;
        if !self.is_current(generation) {
            return Settled::Stale;
        }
        self.settle_one();

        match fetched {
            Ok(text) => {
                let model = SceneModel::new(
                    ModelIdentity::Receptor,
                    RenderRole::CartoonBackbone,
                    path,
                    extract_model(&text, 1),
                );
                let _ = viewport.borrow_mut().add_model(model);
                Settled::Loaded
            }
            Err(e) => {
                log::error!("skipping receptor: {e}");
                Settled::Failed(e)
            }
        }
    }

    async fn load_ligand<S, V>(
        &self,
        source: &S,
        viewport: &RefCell<V>,
        generation: u64,
        index: usize,
        path: &str,
    ) -> Settled
    where
        S: ArtifactSource,
        V: Viewport,
    {
        let siblings = companions(path);
        let (structure, anchor, scores) = join3(
            source.fetch_text(path),
            fetch_optional(
                source,
                siblings.as_ref().map(|c| c.label_anchor.as_str()),
            ),
            fetch_optional(
                source,
                siblings.as_ref().map(|c| c.score_table.as_str()),
            ),
        )
        .await;
        if !self.is_current(generation) {
            return Settled::Stale;
        }
        self.settle_one();

        let name = structure_label(path);
        let text = match structure {
            Ok(text) => text,
            Err(e) => {
                log::error!("skipping ligand {name}: {e}");
                return Settled::Failed(e);
            }
        };

        let parsed = extract_model(&text, self.model_to_display);
        if parsed.is_empty() {
            log::warn!("ligand {name}: no atom records in {path}");
        }

        let anchor = anchor.as_deref().and_then(parse_anchor);
        let placement = match anchor.or_else(|| parsed.label_anchor()) {
            Some(p) => LabelPlacement::At(p),
            None => {
                log::warn!("ligand {name}: no anchor, labelling on the model");
                LabelPlacement::OnModel
            }
        };
        let best = scores
            .map(|t| best_affinity(&parse_score_table(&t)))
            .filter(|a| a.is_finite());

        let mut model = SceneModel::new(
            ModelIdentity::Ligand(index),
            RenderRole::StickLigand,
            path,
            parsed,
        )
        .with_label(Label {
            text: name.to_owned(),
            placement,
        });
        model.best_affinity = best;
        let _ = viewport.borrow_mut().add_model(model);
        Settled::Loaded
    }

    /// Clear the viewport and load a formulation dataset, showing `frame`.
    ///
    /// The multiframe structure is required. Without a metrics document the
    /// metrics are computed from the frame coordinates; a malformed one is
    /// an error.
    pub async fn load_dataset<S, V>(
        &self,
        source: &S,
        viewport: &RefCell<V>,
        paths: &DatasetPaths,
        frame: usize,
        spin: bool,
    ) -> Result<Option<MicelleDataset>, DockviewError>
    where
        S: ArtifactSource,
        V: Viewport,
    {
        let generation = self.begin(viewport, 1);
        let (multiframe, metrics) = join(
            source.fetch_text(&paths.multiframe),
            source.fetch_text(&paths.metrics),
        )
        .await;
        if !self.is_current(generation) {
            return Ok(None);
        }
        self.settle_one();

        let loaded = multiframe.and_then(|text| match metrics {
            Ok(json) => MicelleDataset::parse(&paths.name, &text, &json),
            Err(e) => {
                log::warn!(
                    "dataset {}: {e}, computing metrics from coordinates",
                    paths.name
                );
                Ok(MicelleDataset::from_structures(&paths.name, &text))
            }
        });
        let dataset = match loaded {
            Ok(dataset) => dataset,
            Err(e) => {
                self.state.set(LoadState::Idle);
                return Err(e);
            }
        };

        {
            let mut vp = viewport.borrow_mut();
            show_frame(&mut *vp, &dataset, &paths.multiframe, frame);
            vp.fit_to_content();
            vp.set_spin(spin);
        }
        self.state.set(LoadState::Ready);
        log::info!(
            "dataset {}: {} frame(s), showing {}",
            dataset.name,
            dataset.frame_count(),
            frame.min(dataset.frame_count().saturating_sub(1))
        );
        Ok(Some(dataset))
    }
}

/// Fetch a companion artifact when there is one. A missing companion is
/// not an error.
async fn fetch_optional<S: ArtifactSource>(
    source: &S,
    path: Option<&str>,
) -> Option<String> {
    source.fetch_text(path?).await.ok()
}

/// Replace the viewport's content with one trajectory frame, keeping the
/// camera where it is.
pub fn show_frame<V: Viewport + ?Sized>(
    viewport: &mut V,
    dataset: &MicelleDataset,
    source_path: &str,
    frame: usize,
) {
    let index = frame.min(dataset.frame_count().saturating_sub(1));
    viewport.clear();
    let _ = viewport.add_model(SceneModel::new(
        ModelIdentity::Frame(index),
        RenderRole::CartoonBackbone,
        source_path,
        dataset.structure(index),
    ));
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use glam::Vec3;

    use super::*;
    use crate::fetch::MemorySource;
    use crate::scene::Scene;

    fn atom(x: f32, y: f32, z: f32) -> String {
        format!(
            "HETATM    1  C   LIG A   1    \
             {x:>8.3}{y:>8.3}{z:>8.3}  1.00  0.00     0.000 C\n"
        )
    }

    fn pose(x: f32) -> String {
        format!(
            "MODEL 1\n{}{}ENDMDL\nMODEL 2\n{}ENDMDL\n",
            atom(x, 0.0, 0.0),
            atom(x + 2.0, 0.0, 0.0),
            atom(99.0, 99.0, 99.0)
        )
    }

    fn scene() -> RefCell<Scene> {
        RefCell::new(Scene::new(&ViewerOptions::default()))
    }

    fn ligand(name: &str) -> String {
        format!("/tem04_out/outputs/COX-2_{name}.pdbqt")
    }

    #[test]
    fn failed_ligand_is_skipped() {
        let source = MemorySource::new()
            .with(
                "/data01/receptors/Anti-inflammation.pdbqt",
                atom(0.0, 0.0, 0.0),
            )
            .with(ligand("Curcumin"), pose(10.0))
            .with("/tem04_out/xyz/COX-2_Curcumin.txt", "4.5,5.5,6.5")
            .with("/tem04_out/results/COX-2_Curcumin.txt", "1,-7.5,0,0\n")
            .with(ligand("Quercetin"), pose(20.0));
        let ligands =
            vec![ligand("Curcumin"), ligand("Missing"), ligand("Quercetin")];
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();

        let report = pollster::block_on(loader.load(
            &source,
            &viewport,
            Some("/data01/receptors/Anti-inflammation.pdbqt"),
            &ligands,
            true,
        ))
        .unwrap();

        assert_eq!(report.loaded, 3);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.superseded);
        assert_eq!(loader.state(), LoadState::Ready);

        let scene = viewport.borrow();
        assert_eq!(scene.model_count(), 3);
        assert!(scene.camera().is_spinning());
        assert_eq!(
            scene.receptor().map(|m| m.role),
            Some(RenderRole::CartoonBackbone)
        );

        let ligands = scene.ligands();
        assert_eq!(ligands.len(), 2);
        assert_eq!(ligands[0].identity, ModelIdentity::Ligand(0));
        assert_eq!(ligands[1].identity, ModelIdentity::Ligand(2));
        assert_eq!(ligands[0].best_affinity, Some(-7.5));
        assert_eq!(ligands[0].structure.atom_count, 2);
        assert_eq!(ligands[0].label_anchor(), Some(Vec3::new(4.5, 5.5, 6.5)));
        // No anchor file: the atom nearest the centroid, first on ties.
        assert_eq!(ligands[1].label_anchor(), Some(Vec3::new(20.0, 0.0, 0.0)));
        assert_eq!(ligands[1].best_affinity, None);
        assert_eq!(
            ligands[1].label.as_ref().map(|l| l.text.as_str()),
            Some("Quercetin")
        );
    }

    #[test]
    fn failed_receptor_is_skipped() {
        let source = MemorySource::new().with(ligand("Curcumin"), pose(1.0));
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();

        let report = pollster::block_on(loader.load(
            &source,
            &viewport,
            Some("/data01/receptors/Anti-inflammation.pdbqt"),
            &[ligand("Curcumin")],
            false,
        ))
        .unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].is_fetch());
        assert_eq!(loader.state(), LoadState::Ready);
        let scene = viewport.borrow();
        assert!(scene.receptor().is_none());
        assert_eq!(scene.ligands().len(), 1);
    }

    #[test]
    fn structures_outside_outputs_fetch_no_siblings() {
        let source = MemorySource::new()
            .with("/a3/Receptor.pdb", atom(0.0, 0.0, 0.0))
            .with("/a3/Companion.pdb", atom(3.0, 0.0, 0.0));
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();

        let report = pollster::block_on(loader.load(
            &source,
            &viewport,
            Some("/a3/Receptor.pdb"),
            &["/a3/Companion.pdb".to_owned()],
            false,
        ))
        .unwrap();

        assert_eq!(report.loaded, 2);
        assert!(report.failures.is_empty());
        let mut requests = source.requests();
        requests.sort();
        assert_eq!(requests, vec!["/a3/Companion.pdb", "/a3/Receptor.pdb"]);
    }

    #[test]
    fn spin_stays_off_unless_requested() {
        let source = MemorySource::new().with(ligand("Curcumin"), pose(1.0));
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();
        let _ = pollster::block_on(loader.load(
            &source,
            &viewport,
            None,
            &[ligand("Curcumin")],
            false,
        ))
        .unwrap();
        assert!(!viewport.borrow().camera().is_spinning());
    }

    #[test]
    fn empty_structure_gets_on_model_label() {
        let source =
            MemorySource::new().with(ligand("Blank"), "REMARK empty\nEND\n");
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();
        let report = pollster::block_on(loader.load(
            &source,
            &viewport,
            None,
            &[ligand("Blank")],
            false,
        ))
        .unwrap();
        assert_eq!(report.loaded, 1);
        let scene = viewport.borrow();
        let label = scene.labels().next().cloned();
        assert_eq!(
            label,
            Some(Label {
                text: "Blank".into(),
                placement: LabelPlacement::OnModel,
            })
        );
    }

    #[test]
    fn configured_model_is_displayed() {
        let options = ViewerOptions {
            model_to_display: 2,
            ..ViewerOptions::default()
        };
        let source = MemorySource::new().with(ligand("Curcumin"), pose(1.0));
        let loader = SceneLoader::new(&options);
        let viewport = scene();
        let _ = pollster::block_on(loader.load(
            &source,
            &viewport,
            None,
            &[ligand("Curcumin")],
            false,
        ))
        .unwrap();
        let scene = viewport.borrow();
        assert_eq!(
            scene.ligands()[0].structure.positions,
            vec![Vec3::splat(99.0)]
        );
    }

    #[test]
    fn abort_policy_clears_partial_scene() {
        let options = ViewerOptions {
            failure_policy: FailurePolicy::AbortBatch,
            ..ViewerOptions::default()
        };
        let source = MemorySource::new().with(ligand("Curcumin"), pose(1.0));
        let loader = SceneLoader::new(&options);
        let viewport = scene();
        let err = pollster::block_on(loader.load(
            &source,
            &viewport,
            None,
            &[ligand("Curcumin"), ligand("Missing")],
            false,
        ))
        .unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(viewport.borrow().model_count(), 0);
        assert_eq!(loader.state(), LoadState::Idle);
    }

    /// Pending exactly once, then ready.
    struct YieldNow(bool);

    impl Future for YieldNow {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                Poll::Ready(())
            } else {
                self.0 = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }

    /// Source whose every fetch suspends once before answering.
    struct Deferred(MemorySource);

    impl ArtifactSource for Deferred {
        async fn fetch_text(
            &self,
            path: &str,
        ) -> Result<String, DockviewError> {
            YieldNow(false).await;
            self.0.fetch_text(path).await
        }
    }

    #[test]
    fn superseded_load_never_touches_scene() {
        let source = Deferred(
            MemorySource::new()
                .with(ligand("Old"), pose(1.0))
                .with(ligand("New"), pose(50.0)),
        );
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();
        let old = [ligand("Old")];
        let new = [ligand("New")];

        let (first, second) = pollster::block_on(join(
            loader.load(&source, &viewport, None, &old, true),
            loader.load(&source, &viewport, None, &new, false),
        ));
        let (first, second) = (first.unwrap(), second.unwrap());

        assert!(first.superseded);
        assert_eq!(first.loaded, 0);
        assert!(!second.superseded);
        assert_eq!(second.loaded, 1);
        assert_eq!(loader.generation(), 2);

        let scene = viewport.borrow();
        assert_eq!(scene.model_count(), 1);
        assert_eq!(scene.models()[0].source_path, ligand("New"));
        assert!(!scene.camera().is_spinning());
    }

    #[test]
    fn dataset_load_shows_clamped_frame() {
        let metrics = r#"{"times":[0,1],"cx":[0,0],"cy":[0,0],"cz":[0,0],
            "rg":[1,1],"rgx":[1,1],"rgy":[1,1],"rgz":[1,1]}"#;
        let multiframe = format!(
            "MODEL 1\n{}ENDMDL\nMODEL 2\n{}ENDMDL\n",
            atom(1.0, 0.0, 0.0),
            atom(2.0, 0.0, 0.0)
        );
        let paths = DatasetPaths {
            name: "C8".into(),
            multiframe: "/simatec101/a4/C8_multiframe.pdb".into(),
            metrics: "/simatec101/a4/C8_metrics.json".into(),
        };
        let source = MemorySource::new()
            .with(&paths.multiframe, multiframe)
            .with(&paths.metrics, metrics);
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();

        let dataset = pollster::block_on(
            loader.load_dataset(&source, &viewport, &paths, 5, false),
        )
        .unwrap()
        .unwrap();
        assert_eq!(dataset.frame_count(), 2);
        let scene = viewport.borrow();
        assert_eq!(scene.models()[0].identity, ModelIdentity::Frame(1));
        assert_eq!(scene.camera().focus_point(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn dataset_without_metrics_computes_them() {
        let paths = DatasetPaths {
            name: "C8".into(),
            multiframe: "/m.pdb".into(),
            metrics: "/m.json".into(),
        };
        let frame = format!("{}{}", atom(-1.0, 0.0, 0.0), atom(1.0, 0.0, 0.0));
        let source = MemorySource::new().with("/m.pdb", frame);
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();

        let dataset = pollster::block_on(
            loader.load_dataset(&source, &viewport, &paths, 0, false),
        )
        .unwrap()
        .unwrap();
        assert_eq!(dataset.frame_count(), 1);
        let first = dataset.metrics.frame(0).unwrap();
        assert_eq!(first.center.x, 0.0);
        assert!((first.rg - 1.0).abs() < 1e-6);
        assert_eq!(loader.state(), LoadState::Ready);
    }

    #[test]
    fn dataset_requires_structure() {
        let paths = DatasetPaths {
            name: "C8".into(),
            multiframe: "/m.pdb".into(),
            metrics: "/m.json".into(),
        };
        let source = MemorySource::new().with("/m.json", "{}");
        let loader = SceneLoader::new(&ViewerOptions::default());
        let viewport = scene();
        let err = pollster::block_on(
            loader.load_dataset(&source, &viewport, &paths, 0, false),
        )
        .unwrap_err();
        assert!(err.is_fetch());
        assert_eq!(loader.state(), LoadState::Idle);
    }
}
