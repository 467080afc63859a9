// src/recipe/expression.rs

//! `buildRosPackage` expression rendering
//!
//! A [`NixExpression`] is fully computed before rendering: categorized
//! inputs, the source descriptor and the optional attributes. Rendering
//! is a pure function of those plus the copyright notice, so the same
//! inputs always produce byte-identical output.

use super::license::License;
use crate::dependencies::CategorySets;
use crate::provenance::{GitHost, GitSource, SourceDescriptor};
use chrono::Datelike;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Escape a string for use inside a double-quoted Nix string
pub fn escape_nix_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace("${", "\\${")
        .replace('"', "\\\"")
}

/// Optional attributes of the generated expression
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeOptions {
    /// Extra function parameter providing the source
    pub src_param: Option<String>,
    pub source_root: Option<String>,
    pub do_check: Option<bool>,
    /// Patch paths relative to the expression, e.g. `./0001-Fix.patch`
    pub patches: Vec<String>,
}

impl RecipeOptions {
    /// Options implied by `src`: its function parameter and `sourceRoot`
    pub fn for_source(src: &SourceDescriptor) -> Self {
        Self {
            src_param: src.param().map(str::to_string),
            source_root: src.source_root(),
            ..Self::default()
        }
    }
}

/// A package recipe ready to be rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NixExpression {
    /// Nix package name (normalized)
    pub name: String,
    pub version: String,
    pub description: String,
    pub licenses: Vec<License>,
    pub distro: String,
    pub build_type: String,
    pub src: SourceDescriptor,
    pub inputs: CategorySets,
    pub options: RecipeOptions,
}

impl NixExpression {
    /// Function parameters: the fixed ones, the source parameter, then the
    /// first attribute path component of every input
    pub fn parameters(&self) -> Vec<String> {
        let mut params = vec!["lib".to_string(), "buildRosPackage".to_string()];
        if let Some(src_param) = &self.options.src_param {
            params.push(src_param.clone());
        }
        let inputs: BTreeSet<&str> = self
            .inputs
            .all()
            .into_iter()
            .map(|input| input.split('.').next().unwrap_or(input))
            .collect();
        params.extend(inputs.into_iter().map(str::to_string));
        params
    }

    /// Render the expression, with a copyright notice when either part of
    /// it is given
    pub fn render(&self, copyright_holder: Option<&str>, license: Option<&str>) -> String {
        let mut out = String::new();
        if copyright_holder.is_some() || license.is_some() {
            out.push_str(&copyright_header(
                chrono::Utc::now().year(),
                copyright_holder.unwrap_or_default(),
                license.unwrap_or_default(),
            ));
        }

        let _ = writeln!(out, "{{ {} }}:", self.parameters().join(", "));
        let _ = writeln!(out, "buildRosPackage rec {{");
        let _ = writeln!(out, "  pname = \"ros-{}-{}\";", self.distro, self.name);
        let _ = writeln!(out, "  version = \"{}\";", self.version);
        out.push('\n');
        let _ = writeln!(out, "  src = {};", render_src(&self.src));
        out.push('\n');
        let _ = writeln!(out, "  buildType = \"{}\";", self.build_type);

        if !self.options.patches.is_empty() {
            let _ = writeln!(
                out,
                "  patches = [\n    {}\n  ];",
                self.options.patches.join("\n    ")
            );
        }
        if let Some(root) = &self.options.source_root {
            let _ = writeln!(out, "  sourceRoot = \"{}\";", root);
        }
        if let Some(do_check) = self.options.do_check {
            let _ = writeln!(out, "  doCheck = {};", do_check);
        }

        let inputs = &self.inputs;
        for (attr, set) in [
            ("buildInputs", &inputs.build_inputs),
            ("checkInputs", &inputs.check_inputs),
            ("propagatedBuildInputs", &inputs.propagated_build_inputs),
            ("nativeBuildInputs", &inputs.native_build_inputs),
        ] {
            if !set.is_empty() {
                let _ = writeln!(out, "  {} = {};", attr, nix_list(set.iter()));
            }
        }

        out.push('\n');
        let _ = writeln!(out, "  meta = {{");
        let _ = writeln!(
            out,
            "    description = \"{}\";",
            escape_nix_string(&self.description)
        );
        let _ = writeln!(
            out,
            "    license = with lib.licenses; {};",
            nix_list(self.licenses.iter().map(License::to_string))
        );
        let _ = writeln!(out, "  }};");
        out.push_str("}\n");
        out
    }
}

fn copyright_header(year: i32, holder: &str, license: &str) -> String {
    format!(
        "\n# Copyright {} {}\n# Distributed under the terms of the {} license\n\n",
        year, holder, license
    )
}

fn nix_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from("[");
    for item in items {
        out.push(' ');
        out.push_str(item.as_ref());
    }
    out.push_str(" ]");
    out
}

/// The value of the `src` attribute
fn render_src(src: &SourceDescriptor) -> String {
    match src {
        SourceDescriptor::Param { name } => name.clone(),
        SourceDescriptor::Local { path } => path.clone(),
        SourceDescriptor::Git(git) => render_fetch(git),
    }
}

fn render_fetch(git: &GitSource) -> String {
    let mut attrs: Vec<String> = match &git.host {
        GitHost::GitHub { owner, repo } => vec![
            format!("owner = \"{}\";", owner),
            format!("repo = \"{}\";", repo),
        ],
        GitHost::Generic { url } => vec![format!("url = \"{}\";", url)],
    };
    attrs.push(format!("rev = \"{}\";", git.rev));
    attrs.push(format!("sha256 = \"{}\";", git.sha256));
    if let Some(path) = &git.sparse_checkout {
        attrs.push(format!("sparseCheckout = [\"{}\"];", path));
        attrs.push("nonConeMode = true;".to_string());
    }

    let mut out = format!("{} {{\n", git.host.fetcher());
    for attr in attrs {
        let _ = writeln!(out, "    {}", attr);
    }
    out.push_str("  }");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn expression(src: SourceDescriptor) -> NixExpression {
        NixExpression {
            name: "demo-pkg".to_string(),
            version: "1.2.3".to_string(),
            description: "Demo \"package\" for ${things}".to_string(),
            licenses: vec![License::from_manifest("Apache-2.0")],
            distro: "jazzy".to_string(),
            build_type: "ament_cmake".to_string(),
            options: RecipeOptions::for_source(&src),
            src,
            inputs: CategorySets {
                build_inputs: set(&["libfoo"]),
                propagated_build_inputs: set(&["rclcpp", "python3Packages.numpy"]),
                check_inputs: set(&["gtest"]),
                native_build_inputs: set(&["ament-cmake"]),
            },
        }
    }

    fn github_source(subdir: Option<&str>, sparse: bool) -> SourceDescriptor {
        SourceDescriptor::Git(GitSource {
            host: GitHost::detect("https://github.com/acme/ws.git"),
            rev: "0123abcd".to_string(),
            sha256: "sha256-hash".to_string(),
            subdir: subdir.map(str::to_string),
            sparse_checkout: sparse.then(|| subdir.unwrap_or_default().to_string()),
        })
    }

    #[test]
    fn test_escape_nix_string() {
        assert_eq!(escape_nix_string(r#"a\b"#), r#"a\\b"#);
        assert_eq!(escape_nix_string("${x}"), r"\${x}");
        assert_eq!(escape_nix_string(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_nix_string("$HOME"), "$HOME");
    }

    #[test]
    fn test_render_local_source() {
        let text = expression(SourceDescriptor::local(".")).render(None, None);
        let expected = r#"{ lib, buildRosPackage, ament-cmake, gtest, libfoo, python3Packages, rclcpp }:
buildRosPackage rec {
  pname = "ros-jazzy-demo-pkg";
  version = "1.2.3";

  src = ./.;

  buildType = "ament_cmake";
  buildInputs = [ libfoo ];
  checkInputs = [ gtest ];
  propagatedBuildInputs = [ python3Packages.numpy rclcpp ];
  nativeBuildInputs = [ ament-cmake ];

  meta = {
    description = "Demo \"package\" for \${things}";
    license = with lib.licenses; [ asl20 ];
  };
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_github_source_with_patches() {
        let mut expr = expression(github_source(Some("src/demo/"), true));
        expr.options.patches = vec!["./0001-One.patch".to_string(), "./0001-Two.patch".to_string()];
        expr.options.do_check = Some(true);
        let text = expr.render(None, None);

        assert!(text.starts_with("{ lib, buildRosPackage, fetchFromGitHub, ament-cmake,"));
        assert!(text.contains(
            "  src = fetchFromGitHub {\n    owner = \"acme\";\n    repo = \"ws\";\n    rev = \"0123abcd\";\n    sha256 = \"sha256-hash\";\n    sparseCheckout = [\"src/demo/\"];\n    nonConeMode = true;\n  };\n"
        ));
        assert!(text.contains("  patches = [\n    ./0001-One.patch\n    ./0001-Two.patch\n  ];\n"));
        assert!(text.contains("  sourceRoot = \"${src.name}/src/demo/\";\n"));
        assert!(text.contains("  doCheck = true;\n"));
    }

    #[test]
    fn test_render_generic_git_source() {
        let src = SourceDescriptor::Git(GitSource {
            host: GitHost::detect("https://gitlab.com/acme/ws.git"),
            rev: "r".to_string(),
            sha256: "h".to_string(),
            subdir: None,
            sparse_checkout: None,
        });
        let text = expression(src).render(None, None);
        assert!(text.contains(
            "  src = fetchgit {\n    url = \"https://gitlab.com/acme/ws.git\";\n    rev = \"r\";\n    sha256 = \"h\";\n  };\n"
        ));
        assert!(!text.contains("sourceRoot"));
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let mut expr = expression(SourceDescriptor::Param { name: "mySrc".to_string() });
        expr.inputs = CategorySets::default();
        expr.licenses = vec![License::from_manifest("Custom")];
        let text = expr.render(None, None);

        assert!(text.starts_with("{ lib, buildRosPackage, mySrc }:\n"));
        assert!(text.contains("  src = mySrc;\n"));
        assert!(!text.contains("Inputs"));
        assert!(text.contains("license = with lib.licenses; [ \"Custom\" ];"));
    }

    #[test]
    fn test_copyright_header() {
        assert_eq!(
            copyright_header(2024, "ACME", "BSD"),
            "\n# Copyright 2024 ACME\n# Distributed under the terms of the BSD license\n\n"
        );
        let text = expression(SourceDescriptor::local(".")).render(Some("ACME"), None);
        assert!(text.starts_with("\n# Copyright "));
        assert!(text.contains("ACME\n# Distributed under the terms of the  license\n\n{ lib,"));
    }
}
