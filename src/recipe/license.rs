// src/recipe/license.rs

//! License names from manifests mapped to `lib.licenses` attributes

use super::expression::escape_nix_string;
use std::fmt;

/// Spellings seen in the wild for licenses with a canonical name
const ALIASES: &[(&str, &str)] = &[
    ("Apache License 2.0", "Apache-2.0"),
    ("Apache License, Version 2.0", "Apache-2.0"),
    ("Apache 2.0", "Apache-2.0"),
    ("Apache2", "Apache-2.0"),
    ("Apache", "Apache-2.0"),
    ("BSD 2-Clause", "BSD-2"),
    ("BSD-2-Clause", "BSD-2"),
    ("BSD 3-Clause", "BSD-3-Clause"),
    ("BSD-3", "BSD-3-Clause"),
    ("Boost Software License 1.0", "Boost-1.0"),
    ("BSL-1.0", "Boost-1.0"),
    ("GPLv2", "GPL-2"),
    ("GPL-2.0", "GPL-2"),
    ("GPLv3", "GPL-3"),
    ("GPL-3.0", "GPL-3"),
    ("LGPLv2.1", "LGPL-2.1"),
    ("LGPL-2.1-only", "LGPL-2.1"),
    ("LGPLv3", "LGPL-3"),
    ("LGPL-3.0", "LGPL-3"),
    ("MPL 2.0", "MPL-2.0"),
    ("Public Domain", "PD"),
];

/// Canonical name to Nix attribute
const NIX_LICENSES: &[(&str, &str)] = &[
    ("Apache-2.0", "asl20"),
    ("ASL 2.0", "asl20"),
    ("Boost-1.0", "boost"),
    ("BSD-2", "bsd2"),
    ("BSD-3-Clause", "bsd3"),
    ("BSD", "bsdOriginal"),
    ("CC-BY-NC-SA-4.0", "cc-by-nc-sa-40"),
    ("GPL-1", "gpl1"),
    ("GPL-2", "gpl2"),
    ("GPL-3.0-only", "gpl3Only"),
    ("GPL-3", "gpl3"),
    ("LGPL-2.1", "lgpl21"),
    ("LGPL-2", "lgpl2"),
    ("LGPL-3.0-only", "lgpl3Only"),
    ("LGPL-3", "lgpl3"),
    ("MIT", "mit"),
    ("MPL-1.0", "mpl10"),
    ("MPL-1.1", "mpl11"),
    ("MPL-2.0", "mpl20"),
    ("PD", "publicDomain"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum License {
    /// Attribute of `lib.licenses`
    Known(&'static str),
    /// Anything else, rendered as a string literal
    Custom(String),
}

impl License {
    pub fn from_manifest(name: &str) -> Self {
        let name = name.trim();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name);
        NIX_LICENSES
            .iter()
            .find(|(known, _)| *known == canonical)
            .map(|(_, attr)| Self::Known(attr))
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }
}

impl fmt::Display for License {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(attr) => f.write_str(attr),
            Self::Custom(name) => write!(f, "\"{}\"", escape_nix_string(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_licenses() {
        assert_eq!(License::from_manifest("Apache-2.0"), License::Known("asl20"));
        assert_eq!(License::from_manifest("BSD"), License::Known("bsdOriginal"));
        assert_eq!(License::from_manifest(" MIT "), License::Known("mit"));
        assert_eq!(License::from_manifest("GPL-3.0-only"), License::Known("gpl3Only"));
    }

    #[test]
    fn test_aliases() {
        assert_eq!(License::from_manifest("Apache License 2.0"), License::Known("asl20"));
        assert_eq!(License::from_manifest("BSD 3-Clause"), License::Known("bsd3"));
        assert_eq!(License::from_manifest("lgplv2.1"), License::Known("lgpl21"));
    }

    #[test]
    fn test_unknown_license_is_quoted() {
        let license = License::from_manifest("Proprietary \"v2\"");
        assert_eq!(license, License::Custom("Proprietary \"v2\"".to_string()));
        assert_eq!(license.to_string(), r#""Proprietary \"v2\"""#);
        assert_eq!(License::Known("mit").to_string(), "mit");
    }
}
