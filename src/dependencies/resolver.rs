// src/dependencies/resolver.rs

//! Resolution of dependency names to Nix packages
//!
//! A dependency name is first looked up in a rosdep database for the target
//! OS. Names the database does not know are assumed to be ROS (or other
//! sibling) packages and are normalized to their Nix attribute name.

use crate::command::{CommandRunner, CommandSpec};
use crate::error::{Error, Result};
use serde_yaml::Value;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, trace};

/// rosdep OS key of the Nix target
pub const TARGET_OS: &str = "nixos";

/// Outcome of a database lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The database maps the name to these packages (possibly none)
    Found(BTreeSet<String>),
    /// The database has no entry for the name
    NotFound,
    /// The database has an entry, but no rule for the target OS
    Unsatisfiable,
}

/// A system dependency database keyed by (name, target OS)
pub trait DependencyDatabase {
    fn lookup(&self, name: &str, os: &str) -> Result<Lookup>;
}

/// Convert a ROS package name to its Nix attribute name
pub fn normalize_name(name: &str) -> String {
    name.replace('_', "-")
}

/// Database that knows nothing; every name falls back to a sibling package
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDatabase;

impl DependencyDatabase for NoDatabase {
    fn lookup(&self, _name: &str, _os: &str) -> Result<Lookup> {
        Ok(Lookup::NotFound)
    }
}

/// In-memory database, mostly useful for tests and fixed overrides
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    entries: HashMap<String, Option<BTreeSet<String>>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `name` to `packages` on every OS
    pub fn insert<I, S>(&mut self, name: &str, packages: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            name.to_string(),
            Some(packages.into_iter().map(Into::into).collect()),
        );
    }

    /// Record `name` as known but without a rule for any OS
    pub fn insert_unsatisfiable(&mut self, name: &str) {
        self.entries.insert(name.to_string(), None);
    }
}

impl DependencyDatabase for MemoryDatabase {
    fn lookup(&self, name: &str, _os: &str) -> Result<Lookup> {
        Ok(match self.entries.get(name) {
            None => Lookup::NotFound,
            Some(None) => Lookup::Unsatisfiable,
            Some(Some(packages)) => Lookup::Found(packages.clone()),
        })
    }
}

/// rosdep rules loaded from YAML files such as `base.yaml` and `python.yaml`
#[derive(Debug, Clone, Default)]
pub struct RosdepYaml {
    rules: HashMap<String, Value>,
}

impl RosdepYaml {
    /// Parse one rosdep YAML document
    pub fn parse(content: &str) -> Result<Self> {
        let mut db = Self::default();
        db.merge_str(content)?;
        Ok(db)
    }

    /// Load several files; a key defined in an earlier file wins
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut db = Self::default();
        for path in paths {
            let content = std::fs::read_to_string(path.as_ref())?;
            db.merge_str(&content)?;
            debug!("Loaded rosdep rules from {}", path.as_ref().display());
        }
        Ok(db)
    }

    fn merge_str(&mut self, content: &str) -> Result<()> {
        let doc: HashMap<String, Value> = serde_yaml::from_str(content)?;
        for (key, value) in doc {
            self.rules.entry(key).or_insert(value);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Extract package names from an OS rule
///
/// Rules are either a list, a whitespace separated string, a map with a
/// `packages` key, or a map keyed by OS version (`"*"` preferred).
fn rule_packages(rule: &Value) -> Option<BTreeSet<String>> {
    match rule {
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Value::String(s) => Some(s.split_whitespace().map(str::to_string).collect()),
        Value::Mapping(map) => {
            if let Some(packages) = map.get("packages") {
                return rule_packages(packages);
            }
            map.get("*")
                .or_else(|| map.values().next())
                .and_then(rule_packages)
        }
        _ => None,
    }
}

impl DependencyDatabase for RosdepYaml {
    fn lookup(&self, name: &str, os: &str) -> Result<Lookup> {
        let Some(entry) = self.rules.get(name) else {
            return Ok(Lookup::NotFound);
        };
        Ok(match entry.get(os).and_then(rule_packages) {
            Some(packages) => Lookup::Found(packages),
            None => Lookup::Unsatisfiable,
        })
    }
}

/// Queries the installed `rosdep` tool
pub struct RosdepCli<R: CommandRunner> {
    runner: R,
    distro: String,
    memo: RefCell<HashMap<String, Lookup>>,
}

impl<R: CommandRunner> RosdepCli<R> {
    pub fn new(runner: R, distro: &str) -> Self {
        Self {
            runner,
            distro: distro.to_string(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    fn query(&self, name: &str, os: &str) -> Result<Lookup> {
        let spec = CommandSpec::new("rosdep").args([
            "resolve".to_string(),
            format!("--os={}:_", os),
            format!("--rosdistro={}", self.distro),
            name.to_string(),
        ]);

        match self.runner.run(&spec) {
            Ok(output) => Ok(Lookup::Found(
                output
                    .stdout
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty() && !l.starts_with('#'))
                    .flat_map(str::split_whitespace)
                    .map(str::to_string)
                    .collect(),
            )),
            Err(Error::CommandFailed { stderr, .. })
                if stderr.to_lowercase().contains("no definition of") =>
            {
                Ok(Lookup::Unsatisfiable)
            }
            Err(Error::CommandFailed { stderr, .. })
                if stderr.to_lowercase().contains("cannot locate rosdep definition")
                    || stderr.to_lowercase().contains("no rosdep rule") =>
            {
                Ok(Lookup::NotFound)
            }
            Err(e) => Err(e),
        }
    }
}

impl<R: CommandRunner> DependencyDatabase for RosdepCli<R> {
    fn lookup(&self, name: &str, os: &str) -> Result<Lookup> {
        if let Some(hit) = self.memo.borrow().get(name) {
            return Ok(hit.clone());
        }
        let result = self.query(name, os)?;
        self.memo
            .borrow_mut()
            .insert(name.to_string(), result.clone());
        Ok(result)
    }
}

/// Maps dependency names to Nix package identifiers
pub struct DependencyResolver<'a> {
    db: &'a dyn DependencyDatabase,
    os: String,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(db: &'a dyn DependencyDatabase) -> Self {
        Self {
            db,
            os: TARGET_OS.to_string(),
        }
    }

    /// Resolve one name
    ///
    /// Returns `None` when the database knows the name but cannot satisfy it
    /// on the target OS. Names missing from the database never fail.
    pub fn resolve(&self, name: &str) -> Result<Option<BTreeSet<String>>> {
        let resolved = match self.db.lookup(name, &self.os)? {
            Lookup::Found(packages) => Some(packages),
            Lookup::NotFound => Some(BTreeSet::from([normalize_name(name)])),
            Lookup::Unsatisfiable => None,
        };
        trace!("Resolved {} -> {:?}", name, resolved);
        Ok(resolved)
    }
}
