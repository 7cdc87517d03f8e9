//! Raw build options from an options file and command-line flags.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};

use crate::cli::OptionArgs;
use arc_builder::core::options::{keys, ProjectOptions};
use arc_builder::util::diagnostic::{emit, Diagnostic};
use arc_builder::util::fs::read_to_string;
use arc_builder::util::GlobalContext;

/// Merge the options file (if any) with flags; flags win.
pub fn raw_options(args: &OptionArgs, ctx: &GlobalContext) -> Result<Map<String, Value>> {
    let mut raw = match args.options {
        Some(ref path) => load_options_file(&ctx.resolve_path(path))?,
        None => Map::new(),
    };

    if !args.components.is_empty() {
        raw.insert(keys::COMPONENT_REFS.into(), string_array(&args.components));
    }
    if !args.extras.is_empty() {
        raw.insert(keys::EXTRA_REFS.into(), string_array(&args.extras));
    }
    if let Some(ref theme) = args.theme {
        raw.insert(keys::THEME_FILE.into(), path_value(theme));
    }
    if args.bundle {
        raw.insert(keys::BUNDLE.into(), Value::Bool(true));
    }
    if args.wrapper {
        raw.insert(keys::GENERATE_WRAPPER.into(), Value::Bool(true));
    }
    if !args.wrapper_components.is_empty() {
        raw.insert(
            keys::WRAPPER_COMPONENTS.into(),
            string_array(&args.wrapper_components),
        );
    }
    if args.bundle_wrapper {
        raw.insert(keys::BUNDLE_WRAPPER.into(), Value::Bool(true));
    }
    if let Some(ref dest) = args.dest {
        raw.insert(keys::DESTINATION.into(), path_value(dest));
    }
    if ctx.is_verbose() {
        raw.insert(keys::VERBOSE.into(), Value::Bool(true));
    }

    Ok(raw)
}

/// Read options from a `.toml` file, or JSON otherwise.
fn load_options_file(path: &Path) -> Result<Map<String, Value>> {
    let contents = read_to_string(path)?;

    let value: Value = if path.extension().is_some_and(|ext| ext == "toml") {
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse options file: {}", path.display()))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse options file: {}", path.display()))?
    };

    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("options file {} must contain an object", path.display()),
    }
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

fn path_value(path: &Path) -> Value {
    Value::String(path.to_string_lossy().into_owned())
}

/// Print every validation warning, pointing at the options file if one was read.
pub fn report_warnings(options: &ProjectOptions, args: &OptionArgs, ctx: &GlobalContext) {
    for warning in options.warnings() {
        emit(&located(Diagnostic::warning(warning.as_str()), args), ctx.color());
    }
}

/// Print every validation error, pointing at the options file if one was read.
pub fn report_errors(options: &ProjectOptions, args: &OptionArgs, ctx: &GlobalContext) {
    for error in options.errors() {
        emit(&located(Diagnostic::error(error.as_str()), args), ctx.color());
    }
}

fn located(diag: Diagnostic, args: &OptionArgs) -> Diagnostic {
    match args.options {
        Some(ref path) => diag.with_location(path),
        None => diag,
    }
}
