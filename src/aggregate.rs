//! Batch docking result assembly.
//!
//! For each request in a batch the aggregator resolves artifact paths,
//! fetches every ligand's score table and docked structure, parses both and
//! builds one [`DockingResult`] per ligand. Ligands inside a request are
//! fetched concurrently; requests run one after another so a failure can
//! stop the rest of the batch before anything else is fetched.

use futures::future::{join, join_all};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::error::DockviewError;
use crate::fetch::ArtifactSource;
use crate::resolve::{
    ligand_label, receptor_display_name, ArtifactPaths, PathResolver, Selection,
};
use crate::score::{best_affinity, parse_score_table, PoseScore};
use crate::structure::split_models;

/// What a failed fetch does to the work around it.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// The first failure ends the whole batch and nothing is surfaced. A
    /// partial ranking would misrepresent the comparison.
    #[default]
    AbortBatch,
    /// Failures are logged and recorded, everything else proceeds.
    SkipFailed,
}

/// Scores and structure location of one docked ligand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DockingResult {
    /// Receptor file the ligand was docked against.
    pub receptor: String,
    /// Receptor display name.
    pub receptor_name: String,
    /// Ligand display label.
    pub ligand_label: String,
    /// Pose records in file order.
    pub scores: Vec<PoseScore>,
    /// Docked structure path, used by the viewer.
    pub structure_path: String,
    /// Minimum affinity across `scores`, `+inf` when there are none.
    pub best_affinity: f64,
    /// Number of poses found in the structure file.
    pub model_count: usize,
}

impl DockingResult {
    /// Build a result, deriving the receptor display name from its file
    /// and `best_affinity` from the scores.
    #[must_use]
    pub fn new(
        receptor: impl Into<String>,
        ligand_label: impl Into<String>,
        scores: Vec<PoseScore>,
        structure_path: impl Into<String>,
        model_count: usize,
    ) -> Self {
        let receptor = receptor.into();
        Self {
            receptor_name: receptor_display_name(&receptor).to_owned(),
            receptor,
            ligand_label: ligand_label.into(),
            best_affinity: best_affinity(&scores),
            scores,
            structure_path: structure_path.into(),
            model_count,
        }
    }
}

/// The lowest-`best_affinity` result; the earliest one wins ties.
#[must_use]
pub fn pick_representative(
    results: &[DockingResult],
) -> Option<&DockingResult> {
    let mut best: Option<&DockingResult> = None;
    for r in results {
        match best {
            Some(b) if b.best_affinity <= r.best_affinity => {}
            _ => best = Some(r),
        }
    }
    best
}

/// Everything one batch produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Results in request order, ligands in selection order.
    pub results: Vec<DockingResult>,
    /// Structure shown by default: the representative of the last request
    /// that produced any result.
    pub representative: Option<String>,
    /// Request the representative came from.
    pub representative_request: Option<Selection>,
    /// Failures skipped under [`FailurePolicy::SkipFailed`].
    pub failures: Vec<DockviewError>,
}

impl BatchOutcome {
    /// Results ordered by `best_affinity`, ties kept in request order.
    #[must_use]
    pub fn ranked(&self) -> Vec<&DockingResult> {
        let mut ranked: Vec<&DockingResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| a.best_affinity.total_cmp(&b.best_affinity));
        ranked
    }
}

/// Runs docking batches against an artifact source.
pub struct Aggregator<'a, S: ArtifactSource> {
    source: &'a S,
    resolver: &'a PathResolver,
    policy: FailurePolicy,
}

impl<'a, S: ArtifactSource> Aggregator<'a, S> {
    /// Aggregator with the all-or-nothing batch policy.
    pub fn new(source: &'a S, resolver: &'a PathResolver) -> Self {
        Self {
            source,
            resolver,
            policy: FailurePolicy::AbortBatch,
        }
    }

    /// Override the failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Process a batch of requests, one request at a time.
    pub async fn run(
        &self,
        batch: &[Selection],
    ) -> Result<BatchOutcome, DockviewError> {
        let started = Instant::now();
        let mut outcome = BatchOutcome::default();

        for selection in batch {
            let settled = match self.run_request(selection).await {
                Ok(settled) => settled,
                Err(e) => {
                    self.on_failure(e, &mut outcome)?;
                    continue;
                }
            };

            let mut group = Vec::with_capacity(settled.len());
            for result in settled {
                match result {
                    Ok(r) => group.push(r),
                    Err(e) => self.on_failure(e, &mut outcome)?,
                }
            }

            if let Some(rep) = pick_representative(&group) {
                log::debug!(
                    "representative for {}: {} ({:.3})",
                    selection.receptor,
                    rep.structure_path,
                    rep.best_affinity
                );
                outcome.representative = Some(rep.structure_path.clone());
                outcome.representative_request = Some(selection.clone());
            }
            outcome.results.extend(group);
        }

        log::info!(
            "batch of {} request(s) gave {} result(s) in {:.1?}",
            batch.len(),
            outcome.results.len(),
            started.elapsed()
        );
        Ok(outcome)
    }

    fn on_failure(
        &self,
        error: DockviewError,
        outcome: &mut BatchOutcome,
    ) -> Result<(), DockviewError> {
        match self.policy {
            FailurePolicy::AbortBatch => {
                log::error!("aborting batch: {error}");
                Err(error)
            }
            FailurePolicy::SkipFailed => {
                log::warn!("skipping: {error}");
                outcome.failures.push(error);
                Ok(())
            }
        }
    }

    /// Resolve one request and fetch all of its ligands concurrently.
    async fn run_request(
        &self,
        selection: &Selection,
    ) -> Result<Vec<Result<DockingResult, DockviewError>>, DockviewError> {
        let paths = self.resolver.resolve(selection)?;
        let receptor = selection.receptor.as_str();

        let fetches =
            selection.ligands.iter().zip(paths).map(|(ligand, paths)| {
                self.fetch_one(receptor, std::slice::from_ref(ligand), paths)
            });
        Ok(join_all(fetches).await)
    }

    async fn fetch_one(
        &self,
        receptor: &str,
        ligands: &[String],
        paths: ArtifactPaths,
    ) -> Result<DockingResult, DockviewError> {
        let (scores, structure) = join(
            self.source.fetch_text(&paths.score_table),
            self.source.fetch_text(&paths.structure),
        )
        .await;
        let label = ligand_label(ligands);
        let (scores, structure) = (scores?, structure?);

        let scores = parse_score_table(&scores);
        let model_count = split_models(&structure).len();
        log::debug!(
            "{label}: {} pose record(s), {model_count} model(s)",
            scores.len()
        );
        Ok(DockingResult::new(
            receptor,
            label,
            scores,
            paths.structure,
            model_count,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemorySource;
    use crate::options::Options;

    const POSE: &str = concat!(
        "MODEL 1\n",
        "ATOM      1  C   LIG A   1       1.000   2.000   3.000",
        "  1.00  0.00     0.000 C\n",
        "ENDMDL\n",
    );

    fn resolver() -> PathResolver {
        PathResolver::from_options(&Options::default())
    }

    fn with_run(
        source: MemorySource,
        prefix: &str,
        ligand: &str,
        table: &str,
    ) -> MemorySource {
        source
            .with(format!("/tem04_out/results/{prefix}_{ligand}.txt"), table)
            .with(format!("/tem04_out/outputs/{prefix}_{ligand}.pdbqt"), POSE)
    }

    #[test]
    fn single_ligand_end_to_end() {
        let source = with_run(
            MemorySource::new(),
            "COX-2",
            "Curcumin",
            "1,-7.500,0.000,2.100\n2,-6.900,1.500,3.000\n",
        );
        let resolver = resolver();
        let batch =
            [Selection::new("Anti-inflammation.pdbqt", ["Curcumin.pdbqt"])];
        let outcome =
            pollster::block_on(Aggregator::new(&source, &resolver).run(&batch))
                .unwrap();

        assert!(source
            .requests()
            .contains(&"/tem04_out/results/COX-2_Curcumin.txt".to_owned()));
        assert_eq!(outcome.results.len(), 1);
        let r = &outcome.results[0];
        assert_eq!(r.best_affinity, -7.5);
        assert_eq!(r.receptor, "Anti-inflammation.pdbqt");
        assert_eq!(r.receptor_name, "Anti-inflammation");
        assert_eq!(r.ligand_label, "Curcumin");
        assert_eq!(r.model_count, 1);
        assert!(outcome
            .representative
            .as_deref()
            .is_some_and(|p| p.ends_with("COX-2_Curcumin.pdbqt")));
    }

    #[test]
    fn pair_yields_independent_results_and_picks_stronger_binder() {
        let source =
            with_run(MemorySource::new(), "Lipase", "Curcumin", "1,-6.1,0,0\n");
        let source = with_run(
            source,
            "Lipase",
            "Oryzanol",
            "1,-8.4,0,0\n2,-7.0,1,2\n",
        );
        let resolver = resolver();
        let batch = [Selection::new(
            "Anti-lipase.pdbqt",
            ["Curcumin.pdbqt", "Oryzanol.pdbqt"],
        )];
        let outcome =
            pollster::block_on(Aggregator::new(&source, &resolver).run(&batch))
                .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].ligand_label, "Curcumin");
        assert_eq!(outcome.results[1].best_affinity, -8.4);
        assert_eq!(
            outcome.representative.as_deref(),
            Some("/tem04_out/outputs/Lipase_Oryzanol.pdbqt")
        );
        let ranked: Vec<_> =
            outcome.ranked().iter().map(|r| r.ligand_label.as_str()).collect();
        assert_eq!(ranked, vec!["Oryzanol", "Curcumin"]);
    }

    #[test]
    fn representative_ties_go_to_first() {
        let a = DockingResult::new("R", "A", vec![], "/a", 0);
        let b = DockingResult::new("R", "B", vec![], "/b", 0);
        assert_eq!(a.best_affinity, f64::INFINITY);
        let results = [a, b];
        assert_eq!(
            pick_representative(&results).map(|r| r.ligand_label.as_str()),
            Some("A")
        );
        assert!(pick_representative(&[]).is_none());
    }

    #[test]
    fn first_failure_aborts_remaining_requests() {
        // Oryzanol's score table is missing; the second request must never
        // be fetched.
        let source =
            with_run(MemorySource::new(), "Lipase", "Curcumin", "1,-6.1,0,0\n")
                .with("/tem04_out/outputs/Lipase_Oryzanol.pdbqt", POSE);
        let source = with_run(source, "Amylase", "Quercetin", "1,-5.0,0,0\n");
        let resolver = resolver();
        let batch = [
            Selection::new(
                "Anti-lipase.pdbqt",
                ["Curcumin.pdbqt", "Oryzanol.pdbqt"],
            ),
            Selection::new("Anti-amylase.pdbqt", ["Quercetin.pdbqt"]),
        ];
        let err =
            pollster::block_on(Aggregator::new(&source, &resolver).run(&batch))
                .unwrap_err();

        assert!(err.is_fetch());
        assert!(!source
            .requests()
            .iter()
            .any(|p| p.contains("Amylase")));
    }

    #[test]
    fn unregistered_receptor_aborts_batch() {
        let source = MemorySource::new();
        let resolver = resolver();
        let batch = [Selection::new("Unknown.pdbqt", ["Curcumin.pdbqt"])];
        let err =
            pollster::block_on(Aggregator::new(&source, &resolver).run(&batch))
                .unwrap_err();
        assert!(matches!(err, DockviewError::Configuration(_)));
        assert!(source.requests().is_empty());
    }

    #[test]
    fn skip_policy_keeps_successful_ligands() {
        let source =
            with_run(MemorySource::new(), "Lipase", "Curcumin", "1,-6.1,0,0\n");
        let resolver = resolver();
        let batch = [
            Selection::new(
                "Anti-lipase.pdbqt",
                ["Curcumin.pdbqt", "Missing.pdbqt"],
            ),
            Selection::new("Unknown.pdbqt", ["Curcumin.pdbqt"]),
        ];
        let outcome = pollster::block_on(
            Aggregator::new(&source, &resolver)
                .with_policy(FailurePolicy::SkipFailed)
                .run(&batch),
        )
        .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.failures.len(), 2);
        assert_eq!(
            outcome.representative.as_deref(),
            Some("/tem04_out/outputs/Lipase_Curcumin.pdbqt")
        );
        assert_eq!(
            outcome.representative_request.map(|s| s.receptor),
            Some("Anti-lipase.pdbqt".to_owned())
        );
    }
}
