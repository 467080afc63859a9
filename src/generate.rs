// src/generate.rs

//! Batch generation of Nix expressions
//!
//! Manifests are processed one after another in the given order. A failure
//! affects only its manifest unless the error is fatal for the run (see
//! [`crate::Error::is_fatal_for_run`]); the top-level files are generated from the
//! manifests that succeeded.

use crate::command::CommandRunner;
use crate::config::GenerateConfig;
use crate::context::RunContext;
use crate::dependencies::{
    DependencyClassifier, DependencyDatabase, DependencyResolver, normalize_name,
};
use crate::error::Result;
use crate::manifest::{ConditionContext, parse_manifest_file};
use crate::output::{OutputMode, OutputSink};
use crate::provenance::{SourceDescriptor, resolve_git_provenance};
use crate::recipe::{self, License, NixExpression, RecipeOptions};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A package whose expression was generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPackage {
    /// Nix package name
    pub name: String,
    pub output_file: PathBuf,
    /// Every input of the expression
    pub dependencies: BTreeSet<String>,
}

/// Outcome of a run that was not aborted
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub packages: Vec<GeneratedPackage>,
    /// Manifests that could not be turned into an expression
    pub failed: Vec<PathBuf>,
    /// Files differing from the generated content (compare mode)
    pub out_of_date: Vec<PathBuf>,
}

impl GenerateReport {
    /// 1 if a manifest failed, 2 if files are out of date, 0 otherwise
    pub fn exit_code(&self) -> i32 {
        if !self.failed.is_empty() {
            1
        } else if !self.out_of_date.is_empty() {
            2
        } else {
            0
        }
    }
}

pub struct Generator<'a> {
    config: &'a GenerateConfig,
    resolver: DependencyResolver<'a>,
    conditions: ConditionContext,
    runner: &'a dyn CommandRunner,
}

impl<'a> Generator<'a> {
    pub fn new(
        config: &'a GenerateConfig,
        db: &'a dyn DependencyDatabase,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config,
            resolver: DependencyResolver::new(db),
            conditions: ConditionContext::for_distro(&config.distro),
            runner,
        }
    }

    /// Generate all packages and the top-level files
    pub fn run(&self, ctx: &mut RunContext, sink: &mut OutputSink) -> Result<GenerateReport> {
        let mut report = GenerateReport::default();

        for source in &self.config.sources {
            match self.package(source, ctx, sink) {
                Ok(package) => report.packages.push(package),
                Err(e) if e.is_fatal_for_run() => {
                    error!("{}", e);
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        "Failed to prepare Nix expression from {}: {}",
                        source.display(),
                        e
                    );
                    report.failed.push(source.clone());
                }
            }
        }

        self.top_level(&report.packages, sink)?;
        report.out_of_date = sink.out_of_date().to_vec();
        if !report.out_of_date.is_empty() {
            error!("Some files are not up-to-date");
        }
        Ok(report)
    }

    /// Generate the expression (and patches) of the manifest at `source`
    pub fn package(
        &self,
        source: &Path,
        ctx: &mut RunContext,
        sink: &mut OutputSink,
    ) -> Result<GeneratedPackage> {
        let config = self.config;
        let manifest = parse_manifest_file(source)?;

        let classifier = DependencyClassifier::new(&self.resolver, &self.conditions);
        let mut inputs = classifier.classify(&manifest)?;
        inputs.extend(&config.extra_inputs);

        let mut patches = Vec::new();
        let src = if let Some(param) = &config.src_param {
            SourceDescriptor::Param {
                name: param.clone(),
            }
        } else if config.fetch {
            let package_dir = source
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let provenance =
                resolve_git_provenance(self.runner, package_dir, config.provenance_options(), ctx)?;
            patches = provenance.patches;
            SourceDescriptor::Git(provenance.source)
        } else {
            config.local_source(source)
        };

        let mut options = RecipeOptions::for_source(&src);
        if let Some(root) = config.source_root_for(&manifest.name) {
            options.source_root = Some(root);
        }
        if config.do_check {
            options.do_check = Some(true);
        }
        options.patches = patches
            .iter()
            .map(|patch| format!("./{}", patch.file_name))
            .collect();

        let expression = NixExpression {
            name: normalize_name(&manifest.name),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            licenses: manifest
                .licenses
                .iter()
                .map(|l| License::from_manifest(l))
                .collect(),
            distro: config.distro.clone(),
            build_type: manifest.build_type(&self.conditions).to_string(),
            src,
            inputs,
            options,
        };

        let mut text = recipe::generated_by(&config.command_line);
        text.push_str(&expression.render(
            config.copyright_holder.as_deref(),
            config.license.as_deref(),
        ));
        if config.nixfmt {
            text = recipe::nixfmt(self.runner, &text)?;
        }

        let output_file = config.output_file(source, &manifest.name);
        sink.emit(&output_file, text.as_bytes())?;

        let patch_dir = output_file.parent().unwrap_or(Path::new(""));
        for patch in &patches {
            let dest = patch_dir.join(&patch.file_name);
            ctx.patches.register(&dest)?;
            sink.emit(&dest, &patch.content)?;
        }

        if sink.mode() == OutputMode::Write {
            info!(
                "Successfully generated derivation for package '{}' as '{}'.",
                manifest.name,
                output_file.display()
            );
        }

        Ok(GeneratedPackage {
            name: expression.name,
            output_file,
            dependencies: expression.inputs.all().into_iter().map(str::to_string).collect(),
        })
    }

    /// Write the enabled top-level files for `packages`
    pub fn top_level(&self, packages: &[GeneratedPackage], sink: &mut OutputSink) -> Result<()> {
        let config = self.config;
        let dir = config.top_level_dir();

        if config.overlay {
            let entries: BTreeMap<String, String> = packages
                .iter()
                .map(|p| (p.name.clone(), config.overlay_entry(&p.output_file)))
                .collect();
            sink.emit(&dir.join("overlay.nix"), recipe::overlay(&entries).as_bytes())?;
        }

        if config.shell {
            let ours: BTreeSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();
            let external: BTreeSet<&str> = packages
                .iter()
                .flat_map(|p| p.dependencies.iter().map(String::as_str))
                .filter(|dep| !ours.contains(dep))
                .collect();
            let text = recipe::shell_nix(
                &config.nix_ros_overlay,
                &config.distro,
                external,
                &config.command_line,
            )?;
            sink.emit(&dir.join("shell.nix"), text.as_bytes())?;
        }

        if config.flake {
            let text = recipe::flake_nix(&config.nix_ros_overlay, &config.distro);
            sink.emit(&dir.join("flake.nix"), text.as_bytes())?;
        }

        if config.generate_default() {
            let text = recipe::default_nix(&config.nix_ros_overlay)?;
            sink.emit(&dir.join("default.nix"), text.as_bytes())?;
        }

        Ok(())
    }
}

/// Error for an unusable `--nix-ros-overlay`, checked before any work
pub fn check_top_level_config(config: &GenerateConfig) -> Result<()> {
    if config.shell || config.generate_default() {
        recipe::flakeref_to_expr(&config.nix_ros_overlay)?;
    }
    Ok(())
}
