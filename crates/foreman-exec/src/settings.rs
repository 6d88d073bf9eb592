//! Build parameter resolution
//!
//! Build parameters arrive as a loosely-typed property bag (persisted
//! configuration merged with per-request overrides). Resolution snapshots
//! the three tool-chain parameters once per build, substituting the declared
//! default for anything absent. An empty default means "omit this flag".

use std::collections::HashMap;

/// Property bag the parameters are resolved from
pub type PropertyBag = HashMap<String, String>;

/// Property key for the build configuration name
pub const KEY_CONFIGURATION: &str = "build.configuration";
/// Property key for the build target name
pub const KEY_TARGET: &str = "build.target";
/// Property key for the SDK/toolchain name
pub const KEY_SDK: &str = "build.sdk";

/// Default configuration name (empty: let the tool chain pick)
pub const DEFAULT_CONFIGURATION: &str = "";
/// Default target name (empty: let the tool chain pick)
pub const DEFAULT_TARGET: &str = "";
/// Default SDK name (empty: let the tool chain pick)
pub const DEFAULT_SDK: &str = "";

/// Resolved build parameters
///
/// A read-only snapshot computed once per build. Each field is `None` when
/// neither the property bag nor the default supplies a non-empty value, in
/// which case the corresponding flag pair is omitted from the argument
/// vector entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSettings {
    /// Configuration name passed as `-configuration <name>`
    pub configuration: Option<String>,
    /// Target name passed as `-target <name>`
    pub target: Option<String>,
    /// SDK name passed as `-sdk <name>`
    pub sdk: Option<String>,
}

impl BuildSettings {
    /// Resolve settings from a property bag
    ///
    /// Absent or empty values degrade to the declared defaults; resolution
    /// never fails.
    #[must_use]
    pub fn resolve(properties: &PropertyBag) -> Self {
        Self {
            configuration: lookup(properties, KEY_CONFIGURATION, DEFAULT_CONFIGURATION),
            target: lookup(properties, KEY_TARGET, DEFAULT_TARGET),
            sdk: lookup(properties, KEY_SDK, DEFAULT_SDK),
        }
    }

    /// Assemble the build-phase argument vector
    ///
    /// Each present parameter contributes a two-token flag pair, in the
    /// fixed order configuration, target, sdk. Absent parameters contribute
    /// nothing; an empty string is never passed.
    #[must_use]
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(ref configuration) = self.configuration {
            args.push("-configuration".to_string());
            args.push(configuration.clone());
        }
        if let Some(ref target) = self.target {
            args.push("-target".to_string());
            args.push(target.clone());
        }
        if let Some(ref sdk) = self.sdk {
            args.push("-sdk".to_string());
            args.push(sdk.clone());
        }

        args
    }
}

fn lookup(properties: &PropertyBag, key: &str, default: &str) -> Option<String> {
    let value = properties.get(key).map_or(default, String::as_str);
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
