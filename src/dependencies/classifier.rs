// src/dependencies/classifier.rs

//! Dependency classification into Nix input categories
//!
//! Declared dependencies are filtered by their conditions, resolved per
//! group and then made disjoint:
//!
//! | category                | roles                                      |
//! |-------------------------|--------------------------------------------|
//! | `buildInputs`           | build, buildtool (minus propagated)        |
//! | `propagatedBuildInputs` | exec, build_export, buildtool_export       |
//! | `checkInputs`           | test (minus buildInputs)                   |
//! | `nativeBuildInputs`     | buildtool, buildtool_export                |
//!
//! Build tools land in both `buildInputs` and `nativeBuildInputs`. Some of
//! them (CMake) run at build time, others (ament_cmake_*) must be found on
//! `CMAKE_PREFIX_PATH`, and the manifest does not say which.

use super::resolver::DependencyResolver;
use crate::error::{Error, Result};
use crate::manifest::{ConditionContext, DependencyRole, PackageManifest};
use std::collections::BTreeSet;
use tracing::debug;

/// The four dependency categories of a Nix expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySets {
    pub build_inputs: BTreeSet<String>,
    pub propagated_build_inputs: BTreeSet<String>,
    pub check_inputs: BTreeSet<String>,
    pub native_build_inputs: BTreeSet<String>,
}

impl CategorySets {
    /// Union of all categories
    pub fn all(&self) -> BTreeSet<&str> {
        self.build_inputs
            .iter()
            .chain(&self.propagated_build_inputs)
            .chain(&self.check_inputs)
            .chain(&self.native_build_inputs)
            .map(String::as_str)
            .collect()
    }

    /// Add user supplied inputs on top of the classified ones
    pub fn extend(&mut self, extra: &ExtraInputs) {
        self.build_inputs.extend(extra.build_inputs.iter().cloned());
        self.propagated_build_inputs
            .extend(extra.propagated_build_inputs.iter().cloned());
        self.check_inputs.extend(extra.check_inputs.iter().cloned());
        self.native_build_inputs
            .extend(extra.native_build_inputs.iter().cloned());
    }
}

/// Inputs given on the command line, added to every package verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraInputs {
    pub build_inputs: Vec<String>,
    pub propagated_build_inputs: Vec<String>,
    pub check_inputs: Vec<String>,
    pub native_build_inputs: Vec<String>,
}

/// Classifies the dependencies of manifests for one distro
pub struct DependencyClassifier<'a> {
    resolver: &'a DependencyResolver<'a>,
    ctx: &'a ConditionContext,
}

impl<'a> DependencyClassifier<'a> {
    pub fn new(resolver: &'a DependencyResolver<'a>, ctx: &'a ConditionContext) -> Self {
        Self { resolver, ctx }
    }

    /// Resolve the union of the active dependencies of `roles`
    fn resolve_roles(
        &self,
        manifest: &PackageManifest,
        roles: &[DependencyRole],
    ) -> Result<BTreeSet<String>> {
        let mut resolved = BTreeSet::new();
        for role in roles {
            for name in manifest.dependency_names(*role, self.ctx) {
                let packages = self.resolver.resolve(name)?.ok_or_else(|| {
                    Error::UnresolvedDependency {
                        package: manifest.name.clone(),
                        name: name.to_string(),
                        role: role.to_string(),
                    }
                })?;
                resolved.extend(packages);
            }
        }
        Ok(resolved)
    }

    /// Compute the category sets of `manifest`
    pub fn classify(&self, manifest: &PackageManifest) -> Result<CategorySets> {
        use DependencyRole::*;

        let mut build_inputs = self.resolve_roles(manifest, &[Build, BuildTool])?;
        let propagated_build_inputs =
            self.resolve_roles(manifest, &[Exec, BuildExport, BuildToolExport])?;
        build_inputs.retain(|p| !propagated_build_inputs.contains(p));

        let mut check_inputs = self.resolve_roles(manifest, &[Test])?;
        check_inputs.retain(|p| !build_inputs.contains(p));

        let native_build_inputs = self.resolve_roles(manifest, &[BuildTool, BuildToolExport])?;

        debug!(
            "{}: {} build, {} propagated, {} check, {} native inputs",
            manifest.name,
            build_inputs.len(),
            propagated_build_inputs.len(),
            check_inputs.len(),
            native_build_inputs.len()
        );

        Ok(CategorySets {
            build_inputs,
            propagated_build_inputs,
            check_inputs,
            native_build_inputs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dependencies::resolver::{MemoryDatabase, NoDatabase};
    use crate::manifest::{Condition, DependencyDeclaration};

    fn manifest(deps: &[(&str, DependencyRole)]) -> PackageManifest {
        PackageManifest {
            format: 3,
            name: "demo_pkg".to_string(),
            version: "0.1.0".to_string(),
            description: "Demo".to_string(),
            licenses: vec!["MIT".to_string()],
            build_types: vec![],
            dependencies: deps
                .iter()
                .map(|(name, role)| DependencyDeclaration::new(*name, *role))
                .collect(),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn assert_disjoint(sets: &CategorySets) {
        assert!(sets.build_inputs.is_disjoint(&sets.propagated_build_inputs));
        assert!(sets.check_inputs.is_disjoint(&sets.build_inputs));
    }

    #[test]
    fn test_libfoo_moves_to_propagated() {
        let mut db = MemoryDatabase::new();
        db.insert("libfoo-dev", ["libfoo"]);
        db.insert("libfoo", ["libfoo"]);
        db.insert("gtest", ["gtest"]);
        let resolver = DependencyResolver::new(&db);
        let ctx = ConditionContext::for_distro("rolling");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let m = manifest(&[
            ("libfoo-dev", DependencyRole::Build),
            ("libfoo", DependencyRole::Exec),
            ("gtest", DependencyRole::Test),
        ]);
        let sets = classifier.classify(&m).unwrap();

        assert!(sets.build_inputs.is_empty());
        assert_eq!(sets.propagated_build_inputs, set(&["libfoo"]));
        assert_eq!(sets.check_inputs, set(&["gtest"]));
        assert!(sets.native_build_inputs.is_empty());
    }

    #[test]
    fn test_buildtool_in_build_and_native() {
        let resolver = DependencyResolver::new(&NoDatabase);
        let ctx = ConditionContext::for_distro("rolling");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let m = manifest(&[
            ("ament_cmake", DependencyRole::BuildTool),
            ("rosidl_default_generators", DependencyRole::BuildToolExport),
            ("rclcpp", DependencyRole::Build),
            ("rclcpp", DependencyRole::Test),
            ("ament_lint_auto", DependencyRole::Test),
            ("doxygen", DependencyRole::Doc),
        ]);
        let sets = classifier.classify(&m).unwrap();

        assert_eq!(sets.build_inputs, set(&["ament-cmake", "rclcpp"]));
        assert_eq!(sets.native_build_inputs, set(&["ament-cmake", "rosidl-default-generators"]));
        assert_eq!(sets.propagated_build_inputs, set(&["rosidl-default-generators"]));
        assert_eq!(sets.check_inputs, set(&["ament-lint-auto"]));
        assert!(!sets.all().contains("doxygen"));
        assert_disjoint(&sets);
    }

    #[test]
    fn test_check_may_overlap_propagated() {
        let resolver = DependencyResolver::new(&NoDatabase);
        let ctx = ConditionContext::for_distro("rolling");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let m = manifest(&[
            ("std_msgs", DependencyRole::Exec),
            ("std_msgs", DependencyRole::Test),
        ]);
        let sets = classifier.classify(&m).unwrap();
        assert_eq!(sets.check_inputs, set(&["std-msgs"]));
        assert_eq!(sets.propagated_build_inputs, set(&["std-msgs"]));
    }

    #[test]
    fn test_conditions_drop_declarations() {
        let resolver = DependencyResolver::new(&NoDatabase);
        let ctx = ConditionContext::for_distro("humble");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let mut m = manifest(&[("rclcpp", DependencyRole::Build)]);
        m.dependencies.push(
            DependencyDeclaration::new("roscpp", DependencyRole::Build)
                .with_condition(Condition::parse("$ROS_VERSION == 1").unwrap()),
        );
        let sets = classifier.classify(&m).unwrap();
        assert_eq!(sets.build_inputs, set(&["rclcpp"]));
    }

    #[test]
    fn test_unsatisfiable_reports_name_and_role() {
        let mut db = MemoryDatabase::new();
        db.insert_unsatisfiable("libwinsock");
        let resolver = DependencyResolver::new(&db);
        let ctx = ConditionContext::for_distro("rolling");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let m = manifest(&[("libwinsock", DependencyRole::BuildExport)]);
        match classifier.classify(&m) {
            Err(Error::UnresolvedDependency { package, name, role }) => {
                assert_eq!(package, "demo_pkg");
                assert_eq!(name, "libwinsock");
                assert_eq!(role, "build_export");
            }
            other => panic!("expected UnresolvedDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_invariants_hold_for_many_manifests() {
        use DependencyRole::*;
        let mut db = MemoryDatabase::new();
        db.insert("boost", ["boost"]);
        db.insert("libboost-dev", ["boost"]);
        db.insert("python3-yaml", ["python3Packages.pyyaml"]);
        db.insert("multi", ["a", "b"]);
        let resolver = DependencyResolver::new(&db);
        let ctx = ConditionContext::for_distro("jazzy");
        let classifier = DependencyClassifier::new(&resolver, &ctx);

        let names = ["boost", "libboost-dev", "python3-yaml", "multi", "rclcpp", "a"];
        let roles = [Build, BuildTool, BuildExport, BuildToolExport, Exec, Test];
        // Every combination of (name, role) pairs taken from a sliding window
        for start in 0..names.len() {
            for width in 1..=roles.len() {
                let deps: Vec<(&str, DependencyRole)> = (0..width)
                    .map(|i| (names[(start + i) % names.len()], roles[(start * 7 + i) % roles.len()]))
                    .collect();
                let sets = classifier.classify(&manifest(&deps)).unwrap();
                assert_disjoint(&sets);
            }
        }
    }

    #[test]
    fn test_extend_with_extra_inputs() {
        let mut sets = CategorySets::default();
        sets.extend(&ExtraInputs {
            build_inputs: vec!["pkg-config".to_string()],
            native_build_inputs: vec!["makeWrapper".to_string()],
            ..Default::default()
        });
        assert_eq!(sets.build_inputs, set(&["pkg-config"]));
        assert_eq!(sets.native_build_inputs, set(&["makeWrapper"]));
        assert_eq!(sets.all().len(), 2);
    }
}
