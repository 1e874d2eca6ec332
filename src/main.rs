//! Command-line front end for inspecting pre-computed docking results.

#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dockview::catalog::{Catalog, SelectionDraft, DEFAULT_CATALOG_PATH};
use dockview::fetch::{ArtifactSource, ConfiguredSource};
use dockview::options::{Options, SourceKind};
use dockview::resolve::Selection;
use dockview::scene::{LabelPlacement, Scene};
use dockview::session::Session;
use dockview::DockviewError;

#[derive(Parser)]
#[command(name = "dockview", about = "Inspect pre-computed docking results")]
struct Cli {
    /// Options file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Serve artifacts from this directory instead of over HTTP.
    #[arg(long, global = true)]
    root_dir: Option<String>,
    /// Static file server base URL.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank docking results for a receptor and up to two ligands.
    Dock {
        /// Receptor file name, e.g. Anti-inflammation.pdbqt
        #[arg(long)]
        receptor: String,
        /// Ligand file name; repeat to compare two ligands.
        #[arg(long = "ligand", required = true)]
        ligands: Vec<String>,
        /// Category from the mapping document the selection must come from.
        #[arg(long)]
        category: Option<String>,
        /// Spin the scene once loaded.
        #[arg(long)]
        spin: bool,
    },
    /// List the categories of the mapping document.
    Catalog,
    /// Load a membrane-interaction protein set.
    Membrane {
        /// Protein file names.
        #[arg(required = true)]
        proteins: Vec<String>,
    },
    /// Show one frame of a formulation (micelle) dataset.
    Micelle {
        /// Dataset key, e.g. C12.
        dataset: String,
        /// Frame index (clamped to the last frame).
        #[arg(long, default_value_t = 0)]
        frame: usize,
    },
    /// Print the JSON schema of the options file.
    Schema,
}

fn load_options(cli: &Cli) -> Result<Options, DockviewError> {
    let mut options = match &cli.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if let Some(root) = &cli.root_dir {
        options.source.kind = SourceKind::Directory;
        options.source.root_dir = PathBuf::from(root);
    }
    if let Some(url) = &cli.base_url {
        options.source.kind = SourceKind::Http;
        options.source.base_url.clone_from(url);
    }
    Ok(options)
}

fn print_scene(scene: &Scene) {
    for model in scene.models() {
        let label = match &model.label {
            Some(label) => match label.placement {
                LabelPlacement::At(p) => format!(
                    "\"{}\" at ({:.3}, {:.3}, {:.3})",
                    label.text, p.x, p.y, p.z
                ),
                LabelPlacement::OnModel => {
                    format!("\"{}\" on model", label.text)
                }
            },
            None => "no label".to_owned(),
        };
        println!(
            "  [{}] {:?} {:?}: {} atoms, {label} ({})",
            model.id,
            model.identity,
            model.role,
            model.structure.atom_count,
            model.source_path
        );
    }
    let camera = scene.camera();
    let focus = camera.focus_point();
    println!(
        "  camera: focus ({:.3}, {:.3}, {:.3}), distance {:.3}, spin {}",
        focus.x,
        focus.y,
        focus.z,
        camera.distance(),
        camera.is_spinning()
    );
}

async fn check_catalog(
    source: &ConfiguredSource,
    category: &str,
    receptor: &str,
    ligands: &[String],
) -> Result<(), DockviewError> {
    let text = source.fetch_text(DEFAULT_CATALOG_PATH).await?;
    let catalog = Catalog::from_json(&text)?;
    let mut draft = SelectionDraft::new(&catalog);
    let _ = draft.toggle_receptor(category, receptor)?;
    for ligand in ligands {
        let _ = draft.toggle_ligand(category, ligand)?;
    }
    let _ = draft.submit()?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), DockviewError> {
    let options = load_options(cli)?;
    if matches!(cli.command, Command::Schema) {
        let schema = serde_json::to_string_pretty(&Options::json_schema())
            .map_err(|e| DockviewError::OptionsParse(e.to_string()))?;
        println!("{schema}");
        return Ok(());
    }

    let source = ConfiguredSource::from_options(&options.source)?;
    if matches!(cli.command, Command::Catalog) {
        let text = pollster::block_on(source.fetch_text(DEFAULT_CATALOG_PATH))?;
        let catalog = Catalog::from_json(&text)?;
        for name in catalog.categories() {
            println!("{name}");
            println!("  proteins: {}", catalog.proteins(name).join(", "));
            println!("  ligands:  {}", catalog.ligands(name).join(", "));
        }
        return Ok(());
    }

    let mut session = Session::new(options, source);
    match &cli.command {
        Command::Dock {
            receptor,
            ligands,
            category,
            spin,
        } => {
            if let Some(category) = category {
                pollster::block_on(check_catalog(
                    session.source(),
                    category,
                    receptor,
                    ligands,
                ))?;
            }
            let selection = Selection::new(receptor, ligands);
            selection.validate_pairwise()?;
            session.set_spin(*spin || session.options().viewer.spin);
            let report = pollster::block_on(session.run_docking(&[selection]))?;
            print!("{}", session.results_summary());
            println!();
            println!(
                "scene: {} model(s) loaded, {} skipped",
                report.loaded,
                report.failures.len()
            );
        }
        Command::Membrane { proteins } => {
            let report = pollster::block_on(session.show_membrane(proteins))?;
            println!(
                "scene: {} model(s) loaded, {} skipped",
                report.loaded,
                report.failures.len()
            );
        }
        Command::Micelle { dataset, frame } => {
            pollster::block_on(session.show_dataset(dataset, *frame))?;
            if let Some(summary) = session.frame_summary() {
                print!("{summary}");
            }
        }
        Command::Catalog | Command::Schema => {}
    }

    if let Some(scene) = session.viewport() {
        print_scene(&scene);
    }
    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
