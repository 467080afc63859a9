// src/dependencies/mod.rs

//! Dependency resolution and classification
//!
//! Turns the dependency declarations of a manifest into the Nix input
//! categories of the generated expression.

pub mod classifier;
pub mod resolver;

pub use classifier::{CategorySets, DependencyClassifier, ExtraInputs};
pub use resolver::{
    DependencyDatabase, DependencyResolver, Lookup, MemoryDatabase, NoDatabase, RosdepCli,
    RosdepYaml, TARGET_OS, normalize_name,
};
