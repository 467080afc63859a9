// src/commands/generate.rs

//! Generate Nix expressions from package.xml files

use anyhow::{Context, Result};
use ros2nix::command::SystemRunner;
use ros2nix::config::{DatabaseConfig, GenerateConfig};
use ros2nix::context::RunContext;
use ros2nix::dependencies::{DependencyDatabase, NoDatabase, RosdepCli, RosdepYaml};
use ros2nix::generate::{Generator, check_top_level_config};
use ros2nix::output::{OutputMode, OutputSink};
use ros2nix::provenance::PrefetchCache;
use tracing::{info, warn};

/// Open the configured rosdep database
fn open_database(config: &GenerateConfig) -> Result<Box<dyn DependencyDatabase>> {
    Ok(match &config.database {
        DatabaseConfig::RosdepCli => match which::which("rosdep") {
            Ok(path) => {
                info!("Resolving system dependencies with {}", path.display());
                Box::new(RosdepCli::new(SystemRunner, &config.distro))
            }
            Err(_) => {
                warn!("rosdep not found, treating all dependencies as ROS packages");
                Box::new(NoDatabase)
            }
        },
        DatabaseConfig::Yaml(paths) => {
            let db = RosdepYaml::from_files(paths.as_slice()).context("Failed to load rosdep rules")?;
            info!("Loaded {} rosdep rules", db.len());
            Box::new(db)
        }
        DatabaseConfig::None => Box::new(NoDatabase),
    })
}

/// Run a generate command and return the process exit status
///
/// 0 on success, 1 if any manifest failed, 2 in compare mode if any file
/// is out of date.
pub fn cmd_generate(config: &GenerateConfig) -> Result<i32> {
    config.validate()?;
    check_top_level_config(config)?;

    let db = open_database(config)?;
    let mut ctx = RunContext::new();
    if let Some(path) = &config.cache_path {
        ctx = ctx.with_prefetch_cache(PrefetchCache::load(path));
    }
    let mut sink = OutputSink::new(if config.compare {
        OutputMode::Compare
    } else {
        OutputMode::Write
    });

    let generator = Generator::new(config, db.as_ref(), &SystemRunner);
    let result = generator.run(&mut ctx, &mut sink);
    ctx.finish().context("Failed to save git cache")?;
    let report = result?;

    Ok(report.exit_code())
}
