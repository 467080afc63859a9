// src/lib.rs

//! ros2nix
//!
//! Generates Nix expressions (`buildRosPackage` recipes) from ROS
//! `package.xml` manifests.
//!
//! # Architecture
//!
//! - Manifests are parsed and their conditional dependencies evaluated for
//!   one ROS distro
//! - Dependencies are resolved through rosdep and split into the Nix input
//!   categories
//! - With `--fetch`, the package source is pinned to the newest upstream
//!   git revision, optionally with local commits as patches
//! - Expressions and top-level files are written, or compared with the
//!   files on disk

pub mod command;
pub mod config;
pub mod context;
pub mod dependencies;
mod error;
pub mod generate;
pub mod manifest;
pub mod output;
pub mod provenance;
pub mod recipe;

pub use config::GenerateConfig;
pub use context::RunContext;
pub use dependencies::{CategorySets, DependencyClassifier, DependencyResolver};
pub use error::{Error, Result};
pub use generate::{GenerateReport, Generator};
pub use manifest::{PackageManifest, parse_manifest};
pub use provenance::{GitProvenance, GitProvenanceOptions, resolve_git_provenance};
pub use recipe::{NixExpression, RecipeOptions};
