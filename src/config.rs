// src/config.rs

//! Configuration of a generate run
//!
//! The CLI is translated into a [`GenerateConfig`] once; everything after
//! that works on typed options only.

use crate::dependencies::{ExtraInputs, normalize_name};
use crate::error::{Error, Result};
use crate::provenance::{GitProvenanceOptions, SourceDescriptor};
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_DISTRO: &str = "rolling";
pub const DEFAULT_OUTPUT: &str = "package.nix";
pub const DEFAULT_NIX_ROS_OVERLAY: &str = "github:lopsided98/nix-ros-overlay/master";

/// How generated expression files are named
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// The same file name for every package
    Fixed(String),
    /// `<ros_name>.nix`
    RosName,
    /// `<nix-name>.nix`
    NixName,
}

/// Source of rosdep rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// Ask the `rosdep` tool
    RosdepCli,
    /// Read rules from YAML files, earlier files win
    Yaml(Vec<PathBuf>),
    /// Treat every dependency as a sibling package
    None,
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Manifests to process, in order
    pub sources: Vec<PathBuf>,
    pub output_naming: OutputNaming,
    /// Directory of generated files; next to each manifest when unset
    pub output_dir: Option<PathBuf>,
    /// Fetch sources from the git remote instead of using local paths
    pub fetch: bool,
    pub per_package_src: bool,
    pub patches: bool,
    pub distro: String,
    pub src_param: Option<String>,
    /// `sourceRoot` override, `{package_name}` is substituted
    pub source_root: Option<String>,
    /// Persistent prefetch cache file; `None` disables the cache
    pub cache_path: Option<PathBuf>,
    pub do_check: bool,
    pub extra_inputs: ExtraInputs,
    pub flake: bool,
    /// Force (`Some(true)`) or suppress `default.nix`; by default it is
    /// generated unless a flake is
    pub default: Option<bool>,
    pub overlay: bool,
    pub shell: bool,
    pub nix_ros_overlay: String,
    pub nixfmt: bool,
    pub compare: bool,
    pub copyright_holder: Option<String>,
    pub license: Option<String>,
    pub database: DatabaseConfig,
    /// Command line recorded in generated files
    pub command_line: String,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            output_naming: OutputNaming::Fixed(DEFAULT_OUTPUT.to_string()),
            output_dir: None,
            fetch: false,
            per_package_src: false,
            patches: false,
            distro: DEFAULT_DISTRO.to_string(),
            src_param: None,
            source_root: None,
            cache_path: None,
            do_check: false,
            extra_inputs: ExtraInputs::default(),
            flake: false,
            default: None,
            overlay: true,
            shell: true,
            nix_ros_overlay: DEFAULT_NIX_ROS_OVERLAY.to_string(),
            nixfmt: false,
            compare: false,
            copyright_holder: None,
            license: None,
            database: DatabaseConfig::RosdepCli,
            command_line: "ros2nix".to_string(),
        }
    }
}

impl GenerateConfig {
    /// Reject option combinations that cannot work together
    pub fn validate(&self) -> Result<()> {
        if self.patches && !self.fetch {
            return Err(Error::Config(
                "--patches cannot be used without --fetch".to_string(),
            ));
        }
        if self.sources.is_empty() {
            return Err(Error::Config("no package.xml given".to_string()));
        }
        Ok(())
    }

    /// Output directory after implied defaults: naming files after packages
    /// puts them all into the current directory
    pub fn effective_output_dir(&self) -> Option<PathBuf> {
        match (&self.output_dir, &self.output_naming) {
            (Some(dir), _) => Some(dir.clone()),
            (None, OutputNaming::Fixed(_)) => None,
            (None, _) => Some(PathBuf::from(".")),
        }
    }

    /// Directory receiving the top-level files
    pub fn top_level_dir(&self) -> PathBuf {
        self.effective_output_dir()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Generated expression file for the manifest at `source`
    pub fn output_file(&self, source: &Path, package_name: &str) -> PathBuf {
        let file_name = match &self.output_naming {
            OutputNaming::Fixed(name) => name.clone(),
            OutputNaming::RosName => format!("{}.nix", package_name),
            OutputNaming::NixName => format!("{}.nix", normalize_name(package_name)),
        };
        let dir = self
            .effective_output_dir()
            .unwrap_or_else(|| source.parent().map(Path::to_path_buf).unwrap_or_default());
        dir.join(file_name)
    }

    /// Path of a generated file as referenced from `overlay.nix`
    pub fn overlay_entry(&self, output_file: &Path) -> String {
        match self.effective_output_dir() {
            Some(_) => output_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            None => output_file.display().to_string(),
        }
    }

    /// Source of a package built from the local tree
    pub fn local_source(&self, source: &Path) -> SourceDescriptor {
        let Some(out_dir) = self.effective_output_dir() else {
            return SourceDescriptor::local(".");
        };
        let rel = relative_path(source, &out_dir);
        let rel_dir = rel
            .parent()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        SourceDescriptor::local(&rel_dir)
    }

    /// `sourceRoot` override for `package_name`, if configured
    pub fn source_root_for(&self, package_name: &str) -> Option<String> {
        self.source_root
            .as_ref()
            .map(|root| root.replace("{package_name}", package_name))
    }

    /// Whether `default.nix` is generated
    pub fn generate_default(&self) -> bool {
        self.default.unwrap_or(!self.flake)
    }

    pub fn provenance_options(&self) -> GitProvenanceOptions {
        GitProvenanceOptions {
            per_package_src: self.per_package_src,
            patches: self.patches,
        }
    }
}

/// Lexical path of `path` relative to `base`, both taken relative to the
/// current directory when not absolute
fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let absolute = |p: &Path| std::path::absolute(p).unwrap_or_else(|_| p.to_path_buf());
    let path = normalize(&absolute(path));
    let base = normalize(&absolute(base));

    let path_parts: Vec<Component> = path.components().collect();
    let base_parts: Vec<Component> = base.components().collect();
    let common = path_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &path_parts[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Resolve `.` and `..` components without touching the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
