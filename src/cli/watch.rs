//! `pndconf watch`: recompile documents as they change.

use anyhow::Result;

use super::args::WatchArgs;
use crate::compile::PostProcessor;
use crate::config::Configuration;
use crate::log;
use crate::utils::path::expand_path;
use crate::watch::{self, WatchRules};

pub fn watch_dir(args: &WatchArgs, config: &Configuration, post: Option<&dyn PostProcessor>) -> Result<()> {
    let rules = watch_rules(args)?;
    log!("watch"; "output to {}", config.settings().output_dir.display());
    watch::run(&rules, config, &args.common.generation, post)
}

/// Build the watch rules from the command line.
pub fn watch_rules(args: &WatchArgs) -> Result<WatchRules> {
    let mut rules = WatchRules::new(&expand_path(&args.watch_dir));
    rules.set_extensions(&args.watch_extensions);
    rules.set_ignored(&args.ignore_extensions);
    rules.set_excluded_files(&args.exclude_files);
    rules.set_exclude_regexp(&args.exclude_regexp, !args.no_exclude_ignore_case)?;

    let inputs: Vec<_> = args
        .input_files
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| expand_path(f))
        .collect();
    if !inputs.is_empty() {
        rules.set_inputs(inputs);
    }
    Ok(rules)
}
