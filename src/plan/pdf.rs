//! PDF through LaTeX.
//!
//! ```text
//! [setup, clean]           unless same_output_dir
//! convert                  pandoc -> <out>/<stem>.tex
//! [shim]                   bibtex only
//! typeset                  <engine> ... <stem>.tex
//! [bibliography, typeset, typeset]   external processor
//! ```
//!
//! With `-o pdf` (or anything but `tex`/`latex`) pandoc writes the PDF
//! itself and the plan is a single command.

use super::{Command, CommandPlan, PlanError, Step, convert, output_dir, single};
use crate::bibliography;
use crate::config::Settings;
use crate::debug;
use crate::document::Document;
use crate::options::EffectiveOptions;
use std::path::Path;

/// TeX engines that accept the pdflatex command line.
const ENGINES: &[&str] = &["pdflatex", "xelatex", "lualatex"];

/// Auxiliary files removed before a fresh run.
const AUX_EXTENSIONS: &[&str] = &["aux", "bbl", "blg", "bcf", "run.xml", "log", "out", "toc"];

pub(super) fn build(
    document: &Document,
    mut options: EffectiveOptions,
    settings: &Settings,
) -> Result<CommandPlan, PlanError> {
    let stem = document.stem();
    let out_dir = output_dir(document, settings);

    if !matches!(options.output_extension(), Some("tex" | "latex")) {
        let output = out_dir.join(format!("{stem}.pdf"));
        return Ok(single(document, &options, settings, output));
    }

    let tex = out_dir.join(format!("{stem}.tex"));
    let bib = bibliography::plan(&mut options, document, settings, &tex)?;

    let files_dir = (!settings.same_output_dir).then(|| out_dir.join(format!("{stem}_files")));
    let typeset_dir = files_dir.as_deref().unwrap_or(&out_dir);

    let mut commands = Vec::new();
    if let Some(dir) = &files_dir {
        commands.push(
            Command::new(Step::Setup, "mkdir", document.dir())
                .arg("-p")
                .arg(dir.display().to_string()),
        );
        commands.push(
            Command::new(Step::Clean, "rm", dir)
                .arg("-f")
                .args(AUX_EXTENSIONS.iter().map(|ext| format!("{stem}.{ext}"))),
        );
    }

    commands.push(convert(document, &options, settings, &tex));
    commands.extend(bib.shim);

    let typeset = typeset_command(&options, &out_dir, files_dir.as_deref(), stem);
    commands.push(typeset.clone());

    if let Some(processor) = bib.processor
        && !settings.no_cite_cmd
    {
        commands.push(Command::new(Step::Bibliography, processor.program(), typeset_dir).arg(stem));
        commands.push(typeset.clone());
        commands.push(typeset);
    }

    Ok(CommandPlan {
        format: options.format().to_string(),
        input: document.path().to_path_buf(),
        output: typeset_dir.join(format!("{stem}.pdf")),
        files: bib.subset.into_iter().collect(),
        commands,
    })
}

/// `<engine> -file-line-error [-output-directory dir] ... <stem>.tex`, run next to the TeX source.
fn typeset_command(options: &EffectiveOptions, tex_dir: &Path, files_dir: Option<&Path>, stem: &str) -> Command {
    let engine = match options.long_str("pdf-engine") {
        Some(engine) if ENGINES.contains(&engine) => engine,
        Some(engine) => {
            debug!("plan"; "pdf-engine `{}` cannot typeset TeX sources, using pdflatex", engine);
            ENGINES[0]
        }
        None => ENGINES[0],
    };

    let mut command = Command::new(Step::Typeset, engine, tex_dir).arg("-file-line-error");
    if let Some(dir) = files_dir {
        command = command.args(["-output-directory".to_string(), dir.display().to_string()]);
    }
    command
        .args(["-interaction=nonstopmode", "-synctex=1"])
        .arg(format!("{stem}.tex"))
}
