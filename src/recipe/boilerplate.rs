// src/recipe/boilerplate.rs

//! Top-level files tying the generated packages together
//!
//! - `overlay.nix` adds every generated package to a ROS package set
//! - `default.nix` imports `nix-ros-overlay` with that overlay applied
//! - `shell.nix` is a development shell with all external dependencies
//! - `flake.nix` exposes packages, checks and the shell as a flake

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

/// `<type>:<owner>/<repo>[/<ref>]`
static FLAKEREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>.*?):(?P<owner>.*?)/(?P<repo>.*?)(?:/(?P<ref>.*))?$").unwrap()
});

/// Applies the package overlay to every distro of a `rosPackages` set
const ROS_DISTRO_OVERLAYS: &str = r#"applyDistroOverlay =
  rosOverlay: rosPackages:
  rosPackages
  // builtins.mapAttrs (
    rosDistro: rosPkgs: if rosPkgs ? overrideScope then rosPkgs.overrideScope rosOverlay else rosPkgs
  ) rosPackages;
rosDistroOverlays = final: prev: {
  # Apply the overlay to multiple ROS distributions
  rosPackages = applyDistroOverlay (import ./overlay.nix) prev.rosPackages;
};"#;

/// First line of every generated expression
pub fn generated_by(command_line: &str) -> String {
    format!("# Automatically generated by: {}\n", command_line)
}

/// Nix expression evaluating to the source of a flake reference
///
/// Only paths and `github:` references have a non-flake equivalent.
pub fn flakeref_to_expr(flakeref: &str) -> Result<String> {
    if flakeref.starts_with('.') || flakeref.starts_with('/') {
        return Ok(flakeref.to_string());
    }
    let unsupported = || Error::UnsupportedSourceReference(flakeref.to_string());
    let caps = FLAKEREF.captures(flakeref).ok_or_else(unsupported)?;
    if &caps["type"] != "github" {
        return Err(unsupported());
    }
    let git_ref = caps.name("ref").map_or("HEAD", |m| m.as_str());
    Ok(format!(
        "builtins.fetchTarball \"https://github.com/{}/{}/archive/{}.tar.gz\"",
        &caps["owner"], &caps["repo"], git_ref
    ))
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `overlay.nix` mapping Nix package names to their expression files
pub fn overlay(packages: &BTreeMap<String, String>) -> String {
    let mut out = String::from("final: prev:\n{\n");
    for (name, file) in packages {
        let _ = writeln!(out, "  {} = final.callPackage ./{} {{}};", name, file);
    }
    out.push_str("}\n");
    out
}

pub fn default_nix(nix_ros_overlay: &str) -> Result<String> {
    let overlay_expr = flakeref_to_expr(nix_ros_overlay)?;
    Ok(format!(
        r#"{{
  nix-ros-overlay ? {overlay_expr},
}}:
let
{defs}
in
import nix-ros-overlay {{
  overlays = [ rosDistroOverlays ];
}}
"#,
        defs = indent(ROS_DISTRO_OVERLAYS, "  "),
    ))
}

/// `shell.nix` providing `packages`, the dependencies that are not
/// generated themselves
pub fn shell_nix<'a, I>(
    nix_ros_overlay: &str,
    distro: &str,
    packages: I,
    command_line: &str,
) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let overlay_expr = flakeref_to_expr(nix_ros_overlay)?;
    let deps = indent(&packages.into_iter().collect::<Vec<_>>().join("\n"), "            ");
    Ok(format!(
        r#"{header}{{
  nix-ros-overlay ? {overlay_expr},
  pkgs ? import nix-ros-overlay {{ }},
  rosDistro ? "{distro}",
  extraPkgs ? {{ }},
  extraPaths ? [ ],
  withPackages ? _: [ ],
  extraShellHook ? "",
}}:
pkgs.mkShell {{
  name = "ros2nix ${{rosDistro}} shell";
  packages = [
    (pkgs.rosPackages.${{rosDistro}}.buildEnv {{
      wrapPrograms = false;
      paths =
        [
          pkgs.colcon
          pkgs.rosPackages.${{rosDistro}}.ros-core

          # Work around https://github.com/lopsided98/nix-ros-overlay/pull/624
          pkgs.rosPackages.${{rosDistro}}.ament-cmake-core
          pkgs.rosPackages.${{rosDistro}}.python-cmake-module
        ]
        ++ (
          with pkgs;
          with pkgs.rosPackages.${{rosDistro}};
          with extraPkgs;
          [
            # Dependencies from package.xml files
{deps}
          ]
        )
        ++ builtins.attrValues extraPkgs
        ++ extraPaths
        ++ withPackages (pkgs // pkgs.rosPackages.${{rosDistro}});
      }}
    )
  ];
  shellHook = ''
    # Setup ROS 2 shell completion. Doing it in direnv is useless.
    if [[ ! $DIRENV_IN_ENVRC ]]; then
        eval "$(${{pkgs.python3Packages.argcomplete}}/bin/register-python-argcomplete ros2)"
        eval "$(${{pkgs.python3Packages.argcomplete}}/bin/register-python-argcomplete colcon)"
    fi
  '' + extraShellHook;
}}
"#,
        header = generated_by(command_line),
    ))
}

/// `flake.nix`; the flake reference is used as the input URL unchanged
pub fn flake_nix(nix_ros_overlay: &str, distro: &str) -> String {
    format!(
        r#"
{{
  inputs = {{
    nix-ros-overlay.url = "{nix_ros_overlay}";
    nixpkgs.follows = "nix-ros-overlay/nixpkgs";  # IMPORTANT!!!
  }};
  outputs = {{ self, nix-ros-overlay, nixpkgs }}:
    nix-ros-overlay.inputs.flake-utils.lib.eachDefaultSystem (system:
      let
{defs}
        pkgs = import nixpkgs {{
          inherit system;
          overlays = [
            nix-ros-overlay.overlays.default
            rosDistroOverlays
          ];
        }};

        rosDistro = "{distro}";

      in {{
        legacyPackages = pkgs.rosPackages;
        packages = builtins.intersectAttrs (import ./overlay.nix null null) pkgs.rosPackages.${{rosDistro}};
        checks = builtins.intersectAttrs (import ./overlay.nix null null) pkgs.rosPackages.${{rosDistro}};
        devShells.default = import ./shell.nix {{
          inherit pkgs rosDistro;
          extraPkgs = {{ }};
          extraPaths = [ ];
        }};
      }});
  nixConfig = {{
    extra-substituters = [ "https://ros.cachix.org" ];
    extra-trusted-public-keys = [ "ros.cachix.org-1:dSyZxI8geDCJrwgvCOHDoAfOm5sV1wCPjBkKL+38Rvo=" ];
  }};
}}
"#,
        defs = indent(ROS_DISTRO_OVERLAYS, "        "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flakeref_paths_are_verbatim() {
        assert_eq!(flakeref_to_expr("./nix-ros-overlay").unwrap(), "./nix-ros-overlay");
        assert_eq!(flakeref_to_expr("/src/overlay").unwrap(), "/src/overlay");
    }

    #[test]
    fn test_flakeref_github() {
        assert_eq!(
            flakeref_to_expr("github:lopsided98/nix-ros-overlay/master").unwrap(),
            "builtins.fetchTarball \"https://github.com/lopsided98/nix-ros-overlay/archive/master.tar.gz\""
        );
        assert_eq!(
            flakeref_to_expr("github:lopsided98/nix-ros-overlay").unwrap(),
            "builtins.fetchTarball \"https://github.com/lopsided98/nix-ros-overlay/archive/HEAD.tar.gz\""
        );
    }

    #[test]
    fn test_flakeref_unsupported() {
        for flakeref in ["gitlab:acme/overlay", "nixpkgs", "git+https://example.com/x"] {
            match flakeref_to_expr(flakeref) {
                Err(Error::UnsupportedSourceReference(r)) => assert_eq!(r, flakeref),
                other => panic!("{}: expected unsupported, got {:?}", flakeref, other),
            }
        }
    }

    #[test]
    fn test_overlay_is_sorted() {
        let mut packages = BTreeMap::new();
        packages.insert("zeta".to_string(), "zeta/package.nix".to_string());
        packages.insert("alpha".to_string(), "alpha.nix".to_string());
        assert_eq!(
            overlay(&packages),
            "final: prev:\n{\n  alpha = final.callPackage ./alpha.nix {};\n  zeta = final.callPackage ./zeta/package.nix {};\n}\n"
        );
    }

    #[test]
    fn test_default_nix() {
        let text = default_nix("./overlay-src").unwrap();
        assert!(text.starts_with("{\n  nix-ros-overlay ? ./overlay-src,\n}:\nlet\n  applyDistroOverlay =\n"));
        assert!(text.contains("    rosPackages = applyDistroOverlay (import ./overlay.nix) prev.rosPackages;\n"));
        assert!(text.ends_with("in\nimport nix-ros-overlay {\n  overlays = [ rosDistroOverlays ];\n}\n"));
    }

    #[test]
    fn test_shell_lists_dependencies() {
        let text = shell_nix("./o", "jazzy", ["libfoo", "rclcpp"], "ros2nix --distro jazzy").unwrap();
        assert!(text.starts_with("# Automatically generated by: ros2nix --distro jazzy\n{\n"));
        assert!(text.contains("  rosDistro ? \"jazzy\",\n"));
        assert!(text.contains("  name = \"ros2nix ${rosDistro} shell\";\n"));
        assert!(text.contains(
            "            # Dependencies from package.xml files\n            libfoo\n            rclcpp\n          ]\n"
        ));
    }

    #[test]
    fn test_flake_nix() {
        let text = flake_nix("github:acme/overlay/develop", "humble");
        assert!(text.contains("    nix-ros-overlay.url = \"github:acme/overlay/develop\";\n"));
        assert!(text.contains("        rosDistro = \"humble\";\n"));
        assert!(text.contains("      let\n        applyDistroOverlay =\n"));
        assert!(text.contains("pkgs.rosPackages.${rosDistro};"));
    }
}
