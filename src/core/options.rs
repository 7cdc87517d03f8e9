//! Build options validation.
//!
//! Options arrive as a loosely typed mapping (an options file, CLI flags, or
//! both merged). [`ProjectOptions::validate`] checks it against the known
//! option set and produces an immutable [`BuildConfiguration`] together with
//! the collected errors and warnings. Validation never fails by itself; the
//! caller decides what to do with an invalid result.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::util::logger::LoggerSpec;

/// Recognized option keys.
pub mod keys {
    pub const COMPONENT_REFS: &str = "componentRefs";
    pub const EXTRA_REFS: &str = "extraRefs";
    pub const THEME_FILE: &str = "themeFile";
    pub const BUNDLE: &str = "bundle";
    pub const GENERATE_WRAPPER: &str = "generateWrapper";
    pub const WRAPPER_COMPONENTS: &str = "wrapperComponents";
    pub const BUNDLE_WRAPPER: &str = "bundleWrapper";
    pub const VERBOSE: &str = "verbose";
    pub const LOGGER: &str = "logger";
    pub const DESTINATION: &str = "destination";
}

/// Destination used when none is configured.
pub const DEFAULT_DESTINATION: &str = "build";

/// The kind of value an option expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// A list of strings.
    Sequence,
    Text,
    Boolean,
    Mapping,
}

impl OptionKind {
    /// Name used in validation messages.
    pub fn name(self) -> &'static str {
        match self {
            OptionKind::Sequence => "Array",
            OptionKind::Text => "String",
            OptionKind::Boolean => "Boolean",
            OptionKind::Mapping => "Object",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            OptionKind::Sequence => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            OptionKind::Text => value.is_string(),
            OptionKind::Boolean => value.is_boolean(),
            OptionKind::Mapping => value.is_object(),
        }
    }
}

/// Name of the kind of a raw value, in the same vocabulary as [`OptionKind::name`].
fn value_kind(value: &Value) -> String {
    match value {
        Value::Null => "Null".to_string(),
        Value::Bool(_) => "Boolean".to_string(),
        Value::Number(_) => "Number".to_string(),
        Value::String(_) => "String".to_string(),
        Value::Array(items) => match items.iter().find(|item| !item.is_string()) {
            Some(item) => format!("Array containing {}", value_kind(item)),
            None => "Array".to_string(),
        },
        Value::Object(_) => "Object".to_string(),
    }
}

/// A recognized option and its expected kind.
#[derive(Debug, Clone, Copy)]
pub struct OptionRule {
    pub name: &'static str,
    pub kind: OptionKind,
}

/// Every option the builder understands.
pub const KNOWN_OPTIONS: &[OptionRule] = &[
    OptionRule { name: keys::COMPONENT_REFS, kind: OptionKind::Sequence },
    OptionRule { name: keys::EXTRA_REFS, kind: OptionKind::Sequence },
    OptionRule { name: keys::THEME_FILE, kind: OptionKind::Text },
    OptionRule { name: keys::BUNDLE, kind: OptionKind::Boolean },
    OptionRule { name: keys::GENERATE_WRAPPER, kind: OptionKind::Boolean },
    OptionRule { name: keys::WRAPPER_COMPONENTS, kind: OptionKind::Sequence },
    OptionRule { name: keys::BUNDLE_WRAPPER, kind: OptionKind::Boolean },
    OptionRule { name: keys::VERBOSE, kind: OptionKind::Boolean },
    OptionRule { name: keys::LOGGER, kind: OptionKind::Mapping },
    OptionRule { name: keys::DESTINATION, kind: OptionKind::Text },
];

fn rule(name: &str) -> Option<&'static OptionRule> {
    KNOWN_OPTIONS.iter().find(|rule| rule.name == name)
}

/// Options did not pass validation.
#[derive(Debug, Clone, Error)]
#[error("options did not pass validation ({} error(s))", errors.len())]
pub struct ConfigurationError {
    pub errors: Vec<String>,
}

/// Validated configuration for a single build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfiguration {
    component_refs: Vec<String>,
    extra_refs: Vec<String>,
    theme_file: Option<PathBuf>,
    bundle: bool,
    generate_wrapper: bool,
    wrapper_components: Option<Vec<String>>,
    bundle_wrapper: bool,
    destination: PathBuf,
    verbose: bool,
    logger: Option<LoggerSpec>,
}

impl BuildConfiguration {
    /// Components from the default scope, as declared.
    pub fn component_refs(&self) -> &[String] {
        &self.component_refs
    }

    /// Components from arbitrary scopes, as declared.
    pub fn extra_refs(&self) -> &[String] {
        &self.extra_refs
    }

    pub fn theme_file(&self) -> Option<&Path> {
        self.theme_file.as_deref()
    }

    /// Whether the bundle stage runs. `false` is development mode.
    pub fn bundle(&self) -> bool {
        self.bundle
    }

    pub fn generate_wrapper(&self) -> bool {
        self.generate_wrapper
    }

    /// Components exposed to the wrapper generator; `None` means all.
    pub fn wrapper_components(&self) -> Option<&[String]> {
        self.wrapper_components.as_deref()
    }

    /// Whether the wrapper generator should also emit a combined bundle.
    pub fn bundle_wrapper(&self) -> bool {
        self.bundle_wrapper
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn logger(&self) -> Option<&LoggerSpec> {
        self.logger.as_ref()
    }
}

/// Result of validating a raw options mapping.
#[derive(Debug, Clone)]
pub struct ProjectOptions {
    config: BuildConfiguration,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ProjectOptions {
    /// Validate a raw options mapping. The mapping is not modified.
    pub fn validate(raw: &Map<String, Value>) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        validate_option_list(raw, &mut errors);
        validate_required(raw, &mut errors);

        let wrapper_components = validate_wrapper_options(raw, &mut warnings);
        let logger = validate_logger(raw, &mut warnings);

        let config = BuildConfiguration {
            component_refs: string_list(raw, keys::COMPONENT_REFS).unwrap_or_default(),
            extra_refs: string_list(raw, keys::EXTRA_REFS).unwrap_or_default(),
            theme_file: text(raw, keys::THEME_FILE).map(PathBuf::from),
            bundle: flag(raw, keys::BUNDLE),
            generate_wrapper: flag(raw, keys::GENERATE_WRAPPER),
            wrapper_components,
            bundle_wrapper: flag(raw, keys::BUNDLE_WRAPPER),
            destination: text(raw, keys::DESTINATION)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION)),
            verbose: flag(raw, keys::VERBOSE),
            logger,
        };

        ProjectOptions {
            config,
            errors,
            warnings,
        }
    }

    /// Validate an arbitrary JSON value; anything but an object is an error.
    pub fn validate_value(raw: &Value) -> Self {
        match raw {
            Value::Object(map) => Self::validate(map),
            other => {
                let mut options = Self::validate(&Map::new());
                options.errors.insert(
                    0,
                    format!("Options must be an Object but {} was given", value_kind(other)),
                );
                options
            }
        }
    }

    /// `true` when no validation error was found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The validated configuration, if the options are valid.
    pub fn config(&self) -> Option<&BuildConfiguration> {
        self.is_valid().then_some(&self.config)
    }

    /// Consume the options, returning the configuration or the collected errors.
    pub fn into_config(self) -> Result<BuildConfiguration, ConfigurationError> {
        if self.is_valid() {
            Ok(self.config)
        } else {
            Err(ConfigurationError {
                errors: self.errors,
            })
        }
    }
}

fn validate_option_list(raw: &Map<String, Value>, errors: &mut Vec<String>) {
    let mut unknown = Vec::new();
    let mut mismatches = Vec::new();

    for (name, value) in raw {
        match rule(name) {
            None => unknown.push(name.as_str()),
            Some(rule) if !rule.kind.matches(value) => {
                mismatches.push(format!(
                    "Type mismatch. Property {} expected to be a {} but {} was given",
                    name,
                    rule.kind.name(),
                    value_kind(value)
                ));
            }
            Some(_) => {}
        }
    }

    if !unknown.is_empty() {
        let noun = if unknown.len() > 1 {
            "Unknown options"
        } else {
            "Unknown option"
        };
        errors.push(format!("{}: {}", noun, unknown.join(", ")));
    }

    errors.extend(mismatches);
}

fn validate_required(raw: &Map<String, Value>, errors: &mut Vec<String>) {
    if !non_empty(raw.get(keys::COMPONENT_REFS)) && !non_empty(raw.get(keys::EXTRA_REFS)) {
        errors.push(format!(
            "Either {} or {} must be specified.",
            keys::COMPONENT_REFS,
            keys::EXTRA_REFS
        ));
    }
}

/// A list value counts as given when it has any length, whatever its type.
fn non_empty(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        _ => false,
    }
}

fn validate_wrapper_options(
    raw: &Map<String, Value>,
    warnings: &mut Vec<String>,
) -> Option<Vec<String>> {
    let components = string_list(raw, keys::WRAPPER_COMPONENTS)?;

    if !components.is_empty() && !flag(raw, keys::GENERATE_WRAPPER) {
        warnings.push(format!(
            "\"{}\" option given but \"{}\" is not set. This option will be ignored.",
            keys::WRAPPER_COMPONENTS,
            keys::GENERATE_WRAPPER
        ));
        return None;
    }

    Some(components)
}

fn validate_logger(raw: &Map<String, Value>, warnings: &mut Vec<String>) -> Option<LoggerSpec> {
    let mapping = raw.get(keys::LOGGER)?.as_object()?;

    match LoggerSpec::from_mapping(mapping) {
        Ok(spec) => Some(spec),
        Err(missing) => {
            warnings.push(format!(
                "Used logger is missing required capabilities: {}. The default logger will be used.",
                missing.join(", ")
            ));
            None
        }
    }
}

fn string_list(raw: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    raw.get(key)?
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn text<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    raw.get(key)?.as_str()
}

fn flag(raw: &Map<String, Value>, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}
