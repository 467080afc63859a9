// src/recipe/mod.rs

//! Nix recipe generation
//!
//! Turns a classified manifest and its source into a `buildRosPackage`
//! expression, and renders the top-level files that make a set of such
//! expressions usable:
//!
//! - [`expression`]: per-package `buildRosPackage` expressions
//! - [`license`]: manifest license names to `lib.licenses` attributes
//! - [`boilerplate`]: `overlay.nix`, `default.nix`, `shell.nix`, `flake.nix`

pub mod boilerplate;
pub mod expression;
pub mod license;

pub use boilerplate::{default_nix, flake_nix, flakeref_to_expr, generated_by, overlay, shell_nix};
pub use expression::{NixExpression, RecipeOptions, escape_nix_string};
pub use license::License;

use crate::command::{CommandRunner, CommandSpec};
use crate::error::Result;

/// Pretty-print an expression with `nixfmt`
pub fn nixfmt(runner: &dyn CommandRunner, text: &str) -> Result<String> {
    let spec = CommandSpec::new("nixfmt").stdin(text);
    Ok(runner.run(&spec)?.stdout)
}
