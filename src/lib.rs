// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Resolve, parse, rank and stage pre-computed molecular docking results
//! for 3D viewing.
//!
//! A user picks a receptor and one or more ligands; dockview maps that
//! selection onto the artifact tree written by the docking runs, fetches
//! score tables and docked structures, ranks the poses, and populates a
//! scene with the receptor, the chosen poses and their labels.
//!
//! # Key entry points
//!
//! - [`resolve::PathResolver`] - selection → artifact paths
//! - [`aggregate::Aggregator`] - fetch, parse and rank a docking batch
//! - [`scene::loader::SceneLoader`] - incremental, failure-tolerant scene
//!   population
//! - [`session::Session`] - application state tying the above together
//! - [`options::Options`] - runtime configuration (source, storage layout,
//!   receptor registry, viewer)
//!
//! # Architecture
//!
//! Artifacts come from an [`fetch::ArtifactSource`] (static HTTP server,
//! local directory, or memory). Fetches are futures driven on one thread;
//! independent fetches overlap through `futures::future::join_all` and
//! nothing is shared across threads. The scene is reached only through the
//! [`scene::Viewport`] trait, so a GPU renderer can stand in for the
//! in-memory [`scene::Scene`].

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod options;
pub mod resolve;
pub mod scene;
pub mod score;
pub mod session;
pub mod structure;
pub mod summary;
pub mod trajectory;

pub use error::DockviewError;
