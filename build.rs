// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Boolean flag with a long name only
fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).action(ArgAction::SetTrue).help(help)
}

/// Option taking one value
fn option(name: &'static str, value: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).value_name(value).help(help)
}

/// Repeatable option collecting its values
fn list_option(name: &'static str, value: &'static str, help: &'static str) -> Arg {
    option(name, value, help).action(ArgAction::Append)
}

/// Repeatable option whose values may also be comma-separated
fn comma_list_option(name: &'static str, help: &'static str) -> Arg {
    list_option(name, "DEP1,DEP2,...", help).value_delimiter(',')
}

fn build_cli() -> Command {
    Command::new("ros2nix")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate Nix expressions for ROS packages")
        .arg(
            Arg::new("package.xml")
                .required(true)
                .num_args(1..)
                .help("Path to package.xml"),
        )
        .arg(option("output", "FILE", "Output filename").default_value("package.nix"))
        .arg(flag(
            "output-as-ros-pkg-name",
            "Name output files based on ROS package name. Implies --output-dir=.",
        ))
        .arg(flag(
            "output-as-nix-pkg-name",
            "Name output files based on Nix package name. Implies --output-dir=.",
        ))
        .arg(option("output-dir", "DIR", "Directory to generate output files in"))
        .arg(flag("fetch", "Fetch sources from the git remote of the local work tree"))
        .arg(flag(
            "use-per-package-src",
            "With --fetch, fetch only the package sub-directory",
        ))
        .arg(flag("patches", "Add local git commits as patches (requires --fetch)"))
        .arg(flag("no-patches", "Don't add local git commits as patches").hide(true))
        .arg(option("distro", "DISTRO", "ROS distro").default_value("rolling"))
        .arg(option("src-param", "NAME", "Take src as a function parameter"))
        .arg(option(
            "source-root",
            "PATH",
            "Set sourceRoot; {package_name} is replaced with the package name",
        ))
        .arg(flag("no-cache", "Don't reuse git checkout hashes across runs"))
        .arg(flag("do-check", "Set doCheck attribute to true"))
        .arg(comma_list_option("extra-build-inputs", "Additional buildInputs"))
        .arg(comma_list_option(
            "extra-propagated-build-inputs",
            "Additional propagatedBuildInputs",
        ))
        .arg(comma_list_option("extra-check-inputs", "Additional checkInputs"))
        .arg(comma_list_option(
            "extra-native-build-inputs",
            "Additional nativeBuildInputs",
        ))
        .arg(flag("flake", "Generate flake.nix instead of default.nix"))
        .arg(flag("default", "Enforce generation of default.nix"))
        .arg(flag("no-default", "Suppress generation of default.nix"))
        .arg(flag("overlay", "Generate overlay.nix (default)"))
        .arg(flag("no-overlay", "Don't generate overlay.nix"))
        .arg(flag("shell", "Generate shell.nix (default)"))
        .arg(flag("no-shell", "Don't generate shell.nix"))
        .arg(
            option("nix-ros-overlay", "FLAKEREF", "Flake reference of nix-ros-overlay")
                .default_value("github:lopsided98/nix-ros-overlay/master"),
        )
        .arg(flag("nixfmt", "Format the resulting expressions with nixfmt"))
        .arg(flag(
            "compare",
            "Only check whether files are up-to-date; exit with 2 if not",
        ))
        .arg(option("copyright-holder", "NAME", "Copyright holder of the generated expressions"))
        .arg(option("license", "LICENSE", "License of the generated expressions"))
        .arg(
            list_option(
                "rosdep-yaml",
                "FILE",
                "Resolve system dependencies from a rosdep YAML file",
            )
            .conflicts_with("no-rosdep"),
        )
        .arg(flag("no-rosdep", "Treat every dependency as a ROS package"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("ros2nix.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
