//! `arc-builder build` command

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::options::{raw_options, report_warnings};
use arc_builder::core::options::ProjectOptions;
use arc_builder::ops::arc_build::build;
use arc_builder::ops::BuildError;
use arc_builder::util::diagnostic::emit;
use arc_builder::util::GlobalContext;

pub fn execute(args: BuildArgs, ctx: &GlobalContext) -> Result<()> {
    let raw = raw_options(&args.options, ctx)?;
    let options = ProjectOptions::validate(&raw);

    report_warnings(&options, &args.options, ctx);

    let config = match options.into_config() {
        Ok(config) => config,
        Err(err) => {
            emit(
                &BuildError::from(err).to_diagnostic(&ctx.debug_log_path()),
                ctx.color(),
            );
            std::process::exit(1);
        }
    };

    match build(config, ctx) {
        Ok(result) => {
            eprintln!(
                "    Finished {} component(s) in {}{}{}",
                result.imports.saturating_sub(1),
                result.destination.display(),
                if result.bundled { ", bundled" } else { "" },
                if result.wrapper_generated {
                    ", with wrappers"
                } else {
                    ""
                }
            );
            Ok(())
        }
        Err(err) => {
            emit(&err.to_diagnostic(&ctx.debug_log_path()), ctx.color());
            std::process::exit(1);
        }
    }
}
