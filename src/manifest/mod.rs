// src/manifest/mod.rs

//! ROS package manifests
//!
//! A `package.xml` declares the package identity and its dependencies. Each
//! dependency tag maps to one or more [`DependencyRole`]s and may carry a
//! [`Condition`] that decides whether it applies to the target distro.

pub mod condition;
pub mod parser;

pub use condition::{Condition, ConditionContext, is_active};
pub use parser::{parse_manifest, parse_manifest_file};

use std::collections::BTreeSet;
use std::fmt;

/// Build type used when the manifest does not export one
pub const DEFAULT_BUILD_TYPE: &str = "catkin";

/// The role a dependency plays, as declared in the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DependencyRole {
    Build,
    BuildTool,
    BuildExport,
    BuildToolExport,
    Exec,
    /// Format 1 `run_depend`, also recorded as build export and exec
    Run,
    Test,
    Doc,
}

impl DependencyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::BuildTool => "buildtool",
            Self::BuildExport => "build_export",
            Self::BuildToolExport => "buildtool_export",
            Self::Exec => "exec",
            Self::Run => "run",
            Self::Test => "test",
            Self::Doc => "doc",
        }
    }

    /// Roles implied by a manifest tag, or `None` for non-dependency tags
    pub fn from_tag(tag: &str, format: u8) -> Option<&'static [DependencyRole]> {
        use DependencyRole::*;
        let roles: &'static [DependencyRole] = match tag {
            "build_depend" => &[Build],
            "buildtool_depend" => &[BuildTool],
            "build_export_depend" => &[BuildExport],
            "buildtool_export_depend" => &[BuildToolExport],
            "exec_depend" => &[Exec],
            "test_depend" => &[Test],
            "doc_depend" => &[Doc],
            "depend" if format >= 2 => &[Build, BuildExport, Exec],
            "run_depend" if format == 1 => &[Run, BuildExport, Exec],
            _ => return None,
        };
        Some(roles)
    }
}

impl fmt::Display for DependencyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDeclaration {
    pub name: String,
    pub role: DependencyRole,
    pub condition: Option<Condition>,
}

impl DependencyDeclaration {
    pub fn new(name: impl Into<String>, role: DependencyRole) -> Self {
        Self {
            name: name.into(),
            role,
            condition: None,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Whether this declaration applies in `ctx`
    pub fn is_active(&self, ctx: &ConditionContext) -> bool {
        is_active(self.condition.as_ref(), ctx)
    }
}

/// A conditional `<build_type>` export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTypeExport {
    pub name: String,
    pub condition: Option<Condition>,
}

/// Parsed contents of a `package.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageManifest {
    pub format: u8,
    pub name: String,
    pub version: String,
    pub description: String,
    pub licenses: Vec<String>,
    pub build_types: Vec<BuildTypeExport>,
    pub dependencies: Vec<DependencyDeclaration>,
}

impl PackageManifest {
    /// Names of active dependencies declared with `role`
    pub fn dependency_names(&self, role: DependencyRole, ctx: &ConditionContext) -> BTreeSet<&str> {
        self.dependencies
            .iter()
            .filter(|d| d.role == role && d.is_active(ctx))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// The first build type whose condition holds, defaulting to catkin
    pub fn build_type(&self, ctx: &ConditionContext) -> &str {
        self.build_types
            .iter()
            .find(|b| is_active(b.condition.as_ref(), ctx))
            .map(|b| b.name.as_str())
            .unwrap_or(DEFAULT_BUILD_TYPE)
    }
}
