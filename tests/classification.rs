// tests/classification.rs

//! Dependency classification from package.xml to Nix input categories.

mod common;

use common::manifest;
use ros2nix::dependencies::{
    DependencyClassifier, DependencyResolver, MemoryDatabase, NoDatabase, RosdepYaml,
};
use ros2nix::manifest::{ConditionContext, parse_manifest};
use ros2nix::{CategorySets, Error};
use std::collections::BTreeSet;
use std::path::Path;

const ROSDEP_YAML: &str = r#"
libfoo-dev:
  ubuntu: [libfoo-dev]
  nixos: [libfoo]
libfoo:
  ubuntu: [libfoo1]
  nixos: [libfoo]
gtest:
  nixos:
    packages: [gtest]
eigen:
  nixos: [eigen]
python3-numpy:
  nixos:
    "*": [python3Packages.numpy]
boost:
  nixos: [boost, boost.dev]
windows-only:
  windows: [something]
nothing-needed:
  nixos: []
"#;

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn classify_with(
    db: &dyn ros2nix::dependencies::DependencyDatabase,
    distro: &str,
    deps: &str,
) -> ros2nix::Result<CategorySets> {
    let xml = manifest("demo_pkg", deps);
    let manifest = parse_manifest(&xml, Path::new("demo_pkg/package.xml")).unwrap();
    let resolver = DependencyResolver::new(db);
    let ctx = ConditionContext::for_distro(distro);
    DependencyClassifier::new(&resolver, &ctx).classify(&manifest)
}

fn classify(deps: &str) -> ros2nix::Result<CategorySets> {
    let db = RosdepYaml::parse(ROSDEP_YAML).unwrap();
    classify_with(&db, "jazzy", deps)
}

fn assert_disjoint(sets: &CategorySets) {
    assert!(sets.build_inputs.is_disjoint(&sets.propagated_build_inputs));
    assert!(sets.check_inputs.is_disjoint(&sets.build_inputs));
}

#[test]
fn test_exec_dependency_moves_to_propagated() {
    let sets = classify(
        "  <build_depend>libfoo-dev</build_depend>\n  <exec_depend>libfoo</exec_depend>\n  <test_depend>gtest</test_depend>",
    )
    .unwrap();
    assert_eq!(sets.build_inputs, set(&[]));
    assert_eq!(sets.propagated_build_inputs, set(&["libfoo"]));
    assert_eq!(sets.check_inputs, set(&["gtest"]));
    assert_eq!(sets.native_build_inputs, set(&[]));
}

#[test]
fn test_sibling_packages_are_normalized() {
    let sets = classify("  <depend>my_msgs</depend>\n  <buildtool_depend>ament_cmake</buildtool_depend>")
        .unwrap();
    assert_eq!(sets.propagated_build_inputs, set(&["my-msgs"]));
    assert_eq!(sets.build_inputs, set(&["ament-cmake"]));
    assert_eq!(sets.native_build_inputs, set(&["ament-cmake"]));
}

#[test]
fn test_rule_shapes() {
    let sets = classify(
        "  <build_depend>python3-numpy</build_depend>\n  <build_depend>boost</build_depend>\n  <build_depend>nothing-needed</build_depend>",
    )
    .unwrap();
    assert_eq!(
        sets.build_inputs,
        set(&["boost", "boost.dev", "python3Packages.numpy"])
    );
}

#[test]
fn test_check_may_overlap_propagated() {
    let sets = classify("  <exec_depend>eigen</exec_depend>\n  <test_depend>eigen</test_depend>").unwrap();
    assert_eq!(sets.propagated_build_inputs, set(&["eigen"]));
    assert_eq!(sets.check_inputs, set(&["eigen"]));
    assert_disjoint(&sets);
}

#[test]
fn test_check_excludes_build() {
    let sets = classify("  <build_depend>eigen</build_depend>\n  <test_depend>eigen</test_depend>").unwrap();
    assert_eq!(sets.build_inputs, set(&["eigen"]));
    assert!(sets.check_inputs.is_empty());
}

#[test]
fn test_conditions_follow_distro() {
    let deps = concat!(
        "  <depend condition=\"$ROS_VERSION == 1\">catkin</depend>\n",
        "  <depend condition=\"$ROS_VERSION == 2\">rclcpp</depend>\n",
        "  <exec_depend condition=\"$ROS_PYTHON_VERSION == 3\">python3-numpy</exec_depend>",
    );
    let db = RosdepYaml::parse(ROSDEP_YAML).unwrap();

    let ros2 = classify_with(&db, "humble", deps).unwrap();
    assert_eq!(
        ros2.propagated_build_inputs,
        set(&["python3Packages.numpy", "rclcpp"])
    );

    let ros1 = classify_with(&db, "melodic", deps).unwrap();
    assert_eq!(ros1.propagated_build_inputs, set(&["catkin"]));
}

#[test]
fn test_unsatisfiable_dependency_fails_manifest() {
    let err = classify("  <build_depend>windows-only</build_depend>").unwrap_err();
    match err {
        Error::UnresolvedDependency { package, name, .. } => {
            assert_eq!(package, "demo_pkg");
            assert_eq!(name, "windows-only");
        }
        other => panic!("expected unresolved dependency, got {:?}", other),
    }
}

#[test]
fn test_without_database_everything_is_a_sibling() {
    let sets = classify_with(&NoDatabase, "rolling", "  <build_depend>libfoo-dev</build_depend>").unwrap();
    assert_eq!(sets.build_inputs, set(&["libfoo-dev"]));
}

#[test]
fn test_invariants_hold_across_manifests() {
    let mut db = MemoryDatabase::new();
    db.insert("a", ["x", "y"]);
    db.insert("b", ["y", "z"]);
    db.insert("c", ["z"]);
    let tags = ["build_depend", "buildtool_depend", "build_export_depend", "exec_depend", "test_depend", "depend"];
    let names = ["a", "b", "c", "d_e"];

    for (i, first_tag) in tags.iter().enumerate() {
        for second_tag in &tags[i..] {
            for first in names {
                for second in names {
                    let deps = format!(
                        "  <{t1}>{n1}</{t1}>\n  <{t2}>{n2}</{t2}>\n  <test_depend>{n1}</test_depend>",
                        t1 = first_tag,
                        n1 = first,
                        t2 = second_tag,
                        n2 = second,
                    );
                    let sets = classify_with(&db, "rolling", &deps).unwrap();
                    assert_disjoint(&sets);
                }
            }
        }
    }
}
