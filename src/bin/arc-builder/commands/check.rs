//! `arc-builder check` command

use anyhow::Result;

use crate::cli::CheckArgs;
use crate::commands::options::{raw_options, report_errors, report_warnings};
use arc_builder::core::options::ProjectOptions;
use arc_builder::util::GlobalContext;

pub fn execute(args: CheckArgs, ctx: &GlobalContext) -> Result<()> {
    let raw = raw_options(&args.options, ctx)?;
    let options = ProjectOptions::validate(&raw);

    report_warnings(&options, &args.options, ctx);
    report_errors(&options, &args.options, ctx);

    if !options.is_valid() {
        std::process::exit(1);
    }

    if let Some(config) = options.config() {
        let count = config.component_refs().len() + config.extra_refs().len();
        println!(
            "options are valid: {} component(s), output to {}",
            count,
            config.destination().display()
        );
    }

    Ok(())
}
