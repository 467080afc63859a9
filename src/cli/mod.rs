// src/cli/mod.rs
//! CLI definitions for ros2nix
//!
//! This module contains the command-line interface definition using clap.
//! The command implementation is in the `commands` module.

use clap::Parser;
use ros2nix::config::{
    DEFAULT_DISTRO, DEFAULT_NIX_ROS_OVERLAY, DEFAULT_OUTPUT, DatabaseConfig, GenerateConfig,
    OutputNaming,
};
use ros2nix::dependencies::ExtraInputs;
use ros2nix::provenance::PrefetchCache;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ros2nix")]
#[command(version)]
#[command(about = "Generate Nix expressions for ROS packages", long_about = None)]
pub struct Cli {
    /// Path to package.xml
    #[arg(value_name = "package.xml", required = true)]
    pub sources: Vec<PathBuf>,

    /// Output filename
    #[arg(
        long,
        default_value = DEFAULT_OUTPUT,
        conflicts_with_all = ["output_as_ros_pkg_name", "output_as_nix_pkg_name"]
    )]
    pub output: String,

    /// Name output files based on ROS package name, e.g., package_name.nix. Implies --output-dir=.
    #[arg(long, conflicts_with = "output_as_nix_pkg_name")]
    pub output_as_ros_pkg_name: bool,

    /// Name output files based on Nix package name, e.g., package-name.nix. Implies --output-dir=.
    #[arg(long)]
    pub output_as_nix_pkg_name: bool,

    /// Directory to generate output files in. By default, package files are
    /// stored next to their corresponding package.xml, top-level files like
    /// overlay.nix in the current directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Use fetches like fetchFromGitHub in src attribute values. The fetch
    /// function and its parameters are determined from the local git work
    /// tree. sourceRoot is set if needed and not overridden by --source-root.
    #[arg(long)]
    pub fetch: bool,

    /// When using --fetch, fetch only the package sub-directory instead of
    /// the whole repo
    #[arg(long)]
    pub use_per_package_src: bool,

    /// Add local git commits not present in the remote "origin" as patches.
    /// Only allowed with --fetch.
    #[arg(long, overrides_with = "no_patches")]
    pub patches: bool,

    #[arg(long, overrides_with = "patches", hide = true)]
    pub no_patches: bool,

    /// ROS distro (context of package.xml conditions, part of the package
    /// name and of flake.nix)
    #[arg(long, default_value = DEFAULT_DISTRO)]
    pub distro: String,

    /// Add a parameter to the generated function and use it as src
    #[arg(long)]
    pub src_param: Option<String>,

    /// Set sourceRoot; '{package_name}' is replaced with the package name
    #[arg(long)]
    pub source_root: Option<String>,

    /// Don't reuse git checkout hashes across runs
    #[arg(long)]
    pub no_cache: bool,

    /// Set doCheck attribute to true
    #[arg(long)]
    pub do_check: bool,

    /// Additional buildInputs of every package
    #[arg(long, value_delimiter = ',', value_name = "DEP1,DEP2,...")]
    pub extra_build_inputs: Vec<String>,

    /// Additional propagatedBuildInputs of every package
    #[arg(long, value_delimiter = ',', value_name = "DEP1,DEP2,...")]
    pub extra_propagated_build_inputs: Vec<String>,

    /// Additional checkInputs of every package
    #[arg(long, value_delimiter = ',', value_name = "DEP1,DEP2,...")]
    pub extra_check_inputs: Vec<String>,

    /// Additional nativeBuildInputs of every package
    #[arg(long, value_delimiter = ',', value_name = "DEP1,DEP2,...")]
    pub extra_native_build_inputs: Vec<String>,

    /// Generate flake.nix instead of default.nix
    #[arg(long)]
    pub flake: bool,

    /// Enforce generation of default.nix
    #[arg(long, overrides_with = "no_default")]
    pub default: bool,

    /// Suppress generation of default.nix
    #[arg(long, overrides_with = "default")]
    pub no_default: bool,

    /// Generate overlay.nix (default)
    #[arg(long, overrides_with = "no_overlay")]
    pub overlay: bool,

    /// Don't generate overlay.nix
    #[arg(long, overrides_with = "overlay")]
    pub no_overlay: bool,

    /// Generate shell.nix (default)
    #[arg(long, overrides_with = "no_shell")]
    pub shell: bool,

    /// Don't generate shell.nix
    #[arg(long, overrides_with = "shell")]
    pub no_shell: bool,

    /// Flake reference of nix-ros-overlay
    #[arg(long, value_name = "FLAKEREF", default_value = DEFAULT_NIX_ROS_OVERLAY)]
    pub nix_ros_overlay: String,

    /// Format the resulting expressions with nixfmt
    #[arg(long)]
    pub nixfmt: bool,

    /// Don't write any file, only check whether writing would change
    /// existing files. Exit with code 2 if a change is detected.
    #[arg(long)]
    pub compare: bool,

    /// Copyright holder of the generated Nix expressions
    #[arg(long)]
    pub copyright_holder: Option<String>,

    /// License of the generated Nix expressions, e.g. 'BSD'
    #[arg(long)]
    pub license: Option<String>,

    /// Resolve system dependencies from this rosdep YAML file instead of
    /// the rosdep tool (repeatable, earlier files win)
    #[arg(long, value_name = "FILE", conflicts_with = "no_rosdep")]
    pub rosdep_yaml: Vec<PathBuf>,

    /// Treat every dependency as a package of the same package set
    #[arg(long)]
    pub no_rosdep: bool,
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

impl Cli {
    /// Translate parsed arguments into a run configuration
    pub fn into_config(self, command_line: String) -> GenerateConfig {
        let output_naming = if self.output_as_ros_pkg_name {
            OutputNaming::RosName
        } else if self.output_as_nix_pkg_name {
            OutputNaming::NixName
        } else {
            OutputNaming::Fixed(self.output)
        };
        let database = if self.no_rosdep {
            DatabaseConfig::None
        } else if !self.rosdep_yaml.is_empty() {
            DatabaseConfig::Yaml(self.rosdep_yaml)
        } else {
            DatabaseConfig::RosdepCli
        };
        let default = if self.default {
            Some(true)
        } else if self.no_default {
            Some(false)
        } else {
            None
        };

        GenerateConfig {
            sources: self.sources,
            output_naming,
            output_dir: self.output_dir,
            fetch: self.fetch,
            per_package_src: self.use_per_package_src,
            patches: self.patches,
            distro: self.distro,
            src_param: self.src_param,
            source_root: self.source_root,
            cache_path: if self.no_cache {
                None
            } else {
                PrefetchCache::default_path()
            },
            do_check: self.do_check,
            extra_inputs: ExtraInputs {
                build_inputs: clean_list(self.extra_build_inputs),
                propagated_build_inputs: clean_list(self.extra_propagated_build_inputs),
                check_inputs: clean_list(self.extra_check_inputs),
                native_build_inputs: clean_list(self.extra_native_build_inputs),
            },
            flake: self.flake,
            default,
            overlay: !self.no_overlay,
            shell: !self.no_shell,
            nix_ros_overlay: self.nix_ros_overlay,
            nixfmt: self.nixfmt,
            compare: self.compare,
            copyright_holder: self.copyright_holder,
            license: self.license,
            database,
            command_line,
        }
    }
}

/// Command line recorded in generated files
///
/// Manifest paths and `--compare` are left out so that the recorded line
/// does not depend on which packages were regenerated or on compare mode.
pub fn recorded_command_line(args: &[String]) -> String {
    let program = args
        .first()
        .and_then(|arg0| Path::new(arg0).file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ros2nix".to_string());
    std::iter::once(program)
        .chain(
            args.iter()
                .skip(1)
                .filter(|arg| {
                    !(arg.ends_with("package.xml") && Path::new(arg.as_str()).is_file())
                        && arg.as_str() != "--compare"
                })
                .cloned(),
        )
        .collect::<Vec<_>>()
        .join(" ")
}
