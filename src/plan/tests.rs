use super::*;
use crate::bibliography::{BibProcessor, CitationMode};
use crate::config::Overrides;
use crate::document::FrontMatter;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

const CONFIG: &str = r#"
[html]
"-o" = "html"
"-s" = ""
"--toc" = true
"-V" = ["linkcolor=blue"]

[pdf]
"-o" = "tex"
"-s" = ""
"--citeproc" = ""

[docx]
"#;

struct Fixture {
    temp: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        self.temp.path().canonicalize().unwrap()
    }

    fn document(&self, header: Value, body: &str) -> Document {
        let front_matter = match header {
            Value::Object(map) => FrontMatter::from(map),
            _ => FrontMatter::default(),
        };
        Document::from_parts(&self.root().join("article.md"), front_matter, body)
    }

    fn settings(&self) -> Settings {
        Settings {
            output_dir: self.root().join("out"),
            ..Settings::default()
        }
    }

    fn config(&self, settings: Settings) -> Configuration {
        CONFIG.parse::<Configuration>().unwrap().with_settings(settings)
    }
}

fn plan<'a>(plans: &'a Plans, format: &str) -> &'a CommandPlan {
    match plans.get(format) {
        Some(Ok(plan)) => plan,
        other => panic!("no plan for {format}: {other:?}"),
    }
}

#[test]
fn test_pdf_and_html_without_bibliography() {
    let f = Fixture::new();
    let doc = f.document(json!({}), "No citations here.");
    let plans = build(&doc, &f.config(f.settings()), &["pdf", "html"]);

    assert_eq!(plans.formats().collect::<Vec<_>>(), ["pdf", "html"]);
    assert_eq!(plan(&plans, "html").len(), 1);
    assert_eq!(plan(&plans, "html").output, f.root().join("out/article.html"));
}

#[test]
fn test_html_command_order() {
    let f = Fixture::new();
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &f.config(f.settings()), &["html"]);
    let command = &plan(&plans, "html").commands[0];

    assert_eq!(command.step, Step::Convert);
    assert_eq!(command.program, "pandoc");
    assert_eq!(command.cwd, f.root());
    let input = doc.path().display().to_string();
    let output = f.root().join("out/article.html").display().to_string();
    assert_eq!(
        command.args,
        ["-s", "--toc", "-V", "linkcolor=blue", input.as_str(), "-o", output.as_str()]
    );
}

#[test]
fn test_integrated_pdf_typesets_once() {
    let f = Fixture::new();
    let doc = f.document(json!({}), "See @A.");
    let plans = build(&doc, &f.config(f.settings()), &["pdf"]);
    let pdf = plan(&plans, "pdf");

    assert_eq!(pdf.count(Step::Typeset), 1);
    assert_eq!(pdf.count(Step::Bibliography), 0);
    assert_eq!(pdf.steps(), [Step::Setup, Step::Clean, Step::Convert, Step::Typeset]);
    assert!(pdf.files.is_empty());
    assert_eq!(pdf.output, f.root().join("out/article_files/article.pdf"));
}

#[test]
fn test_bibtex_pdf_ordering() {
    let f = Fixture::new();
    let settings = Settings {
        citation: CitationMode::External(None),
        ..f.settings()
    };
    let doc = f.document(json!({}), "See @A.");
    let plans = build(&doc, &f.config(settings), &["pdf"]);
    let pdf = plan(&plans, "pdf");

    assert_eq!(
        pdf.steps(),
        [
            Step::Setup,
            Step::Clean,
            Step::Convert,
            Step::Shim,
            Step::Typeset,
            Step::Bibliography,
            Step::Typeset,
            Step::Typeset,
        ]
    );

    let files_dir = f.root().join("out/article_files");
    let bibtex = &pdf.commands[5];
    assert_eq!(bibtex.program, "bibtex");
    assert_eq!(bibtex.args, ["article"]);
    assert_eq!(bibtex.cwd, files_dir);

    let typeset = &pdf.commands[4];
    assert_eq!(typeset.program, "pdflatex");
    assert_eq!(typeset.cwd, f.root().join("out"));
    assert_eq!(
        typeset.args,
        [
            "-file-line-error".to_string(),
            "-output-directory".to_string(),
            files_dir.display().to_string(),
            "-interaction=nonstopmode".to_string(),
            "-synctex=1".to_string(),
            "article.tex".to_string(),
        ]
    );
    assert_eq!(pdf.commands[6], *typeset);
    assert_eq!(pdf.commands[7], *typeset);

    let convert = &pdf.commands[2];
    assert!(convert.args.contains(&"--natbib".to_string()));
    assert!(!convert.args.contains(&"--citeproc".to_string()));
}

#[test]
fn test_biber_pdf_has_no_shim() {
    let f = Fixture::new();
    let doc = f.document(json!({ "citation-processor": "biblatex" }), "");
    let plans = build(&doc, &f.config(f.settings()), &["pdf"]);
    let pdf = plan(&plans, "pdf");

    assert_eq!(pdf.count(Step::Shim), 0);
    assert_eq!(pdf.count(Step::Typeset), 3);
    assert_eq!(pdf.commands[4].program, "biber");
}

#[test]
fn test_same_output_dir_omits_setup() {
    let f = Fixture::new();
    let doc = f.document(json!({ "citation-processor": "bibtex" }), "");

    let separate = build(&doc, &f.config(f.settings()), &["pdf"]);
    let same = build(
        &doc,
        &f.config(Settings {
            same_output_dir: true,
            ..f.settings()
        }),
        &["pdf"],
    );
    let separate = plan(&separate, "pdf");
    let same = plan(&same, "pdf");

    assert_eq!(separate.len(), same.len() + 2);
    assert_eq!(same.count(Step::Setup) + same.count(Step::Clean), 0);
    assert!(same.commands.iter().all(|c| !c.args.contains(&"-output-directory".to_string())));
    assert_eq!(same.output, f.root().join("article.pdf"));
    assert!(same.commands.iter().all(|c| c.cwd == f.root()));
}

#[test]
fn test_no_cite_cmd_skips_bibliography_runs() {
    let f = Fixture::new();
    let settings = Settings {
        citation: CitationMode::External(Some(BibProcessor::BibTex)),
        no_cite_cmd: true,
        ..f.settings()
    };
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &f.config(settings), &["pdf"]);
    let pdf = plan(&plans, "pdf");

    assert_eq!(pdf.count(Step::Typeset), 1);
    assert_eq!(pdf.count(Step::Bibliography), 0);
    assert_eq!(pdf.count(Step::Shim), 1);
}

#[test]
fn test_direct_pdf_is_single_command() {
    let f = Fixture::new();
    let config = "[pdf]\n\"-o\" = \"pdf\"\n\"--pdf-engine\" = \"xelatex\"\n".parse::<Configuration>()
        .unwrap()
        .with_settings(f.settings());
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &config, &["pdf"]);
    let pdf = plan(&plans, "pdf");

    assert_eq!(pdf.steps(), [Step::Convert]);
    assert_eq!(pdf.output, f.root().join("out/article.pdf"));
}

#[test]
fn test_xelatex_engine() {
    let f = Fixture::new();
    let doc = f.document(json!({ "pdf-engine": "xelatex" }), "");
    let plans = build(&doc, &f.config(f.settings()), &["pdf"]);
    assert_eq!(plan(&plans, "pdf").commands[3].program, "xelatex");
}

#[test]
fn test_assets_resolved_to_absolute_paths() {
    let f = Fixture::new();
    let csl_dir = f.root().join("styles/csl");
    let templates_dir = f.root().join("styles/templates");
    fs::create_dir_all(&csl_dir).unwrap();
    fs::create_dir_all(&templates_dir).unwrap();
    fs::write(csl_dir.join("ieee.csl"), "").unwrap();
    fs::write(templates_dir.join("reveal.template"), "").unwrap();

    let settings = Settings {
        csl_dir: Some(csl_dir.clone()),
        templates_dir: Some(templates_dir.clone()),
        ..f.settings()
    };
    let doc = f.document(json!({ "csl": "ieee", "template": "reveal" }), "");
    let plans = build(&doc, &f.config(settings), &["html"]);
    let args = &plan(&plans, "html").commands[0].args;

    assert!(args.contains(&format!("--csl={}", csl_dir.join("ieee.csl").display())));
    assert!(args.contains(&format!("--template={}", templates_dir.join("reveal.template").display())));
}

#[test]
fn test_bibliography_error_is_local_to_pdf() {
    let f = Fixture::new();
    let settings = Settings {
        citation: CitationMode::External(None),
        ..f.settings()
    };
    let doc = f.document(json!({ "bibliography": "./missing.bib" }), "@A");
    let plans = build(&doc, &f.config(settings), &["pdf", "html"]);

    assert!(matches!(plans.get("pdf"), Some(Err(PlanError::Bibliography(_)))));
    assert!(matches!(plans.get("html"), Some(Ok(_))));
}

#[test]
fn test_external_citations_drop_citeproc_from_html() {
    let f = Fixture::new();
    let settings = Settings {
        citation: CitationMode::External(None),
        pandoc_version: "3.0".parse().unwrap(),
        ..f.settings()
    };
    let config = "[html]\n\"--filter\" = \"pandoc-citeproc\"\n\"--citeproc\" = \"\"\n"
        .parse::<Configuration>()
        .unwrap()
        .with_settings(settings);
    let doc = f.document(json!({}), "See @A.");
    let plans = build(&doc, &config, &["html"]);

    let input = doc.path().display().to_string();
    let output = f.root().join("out/article.html").display().to_string();
    assert_eq!(plan(&plans, "html").commands[0].args, [input.as_str(), "-o", output.as_str()]);
}

#[test]
fn test_header_citation_processor_applies_to_html() {
    let f = Fixture::new();
    let settings = Settings {
        pandoc_version: "3.0".parse().unwrap(),
        ..f.settings()
    };
    let config = "[html]\n\"--filter\" = \"pandoc-citeproc\"\n"
        .parse::<Configuration>()
        .unwrap()
        .with_settings(settings);

    let integrated = f.document(json!({}), "");
    let plans = build(&integrated, &config, &["html"]);
    assert!(plan(&plans, "html").commands[0].args.contains(&"--citeproc".to_string()));

    let external = f.document(json!({ "citation-processor": "biber" }), "");
    let plans = build(&external, &config, &["html"]);
    let args = &plan(&plans, "html").commands[0].args;
    assert!(!args.iter().any(|arg| arg.contains("citeproc")));
}

#[test]
fn test_unknown_processor_is_local_to_pdf() {
    let f = Fixture::new();
    let doc = f.document(json!({ "citation-processor": "simple" }), "");
    let plans = build(&doc, &f.config(f.settings()), &["html", "pdf"]);

    assert!(matches!(plans.get("pdf"), Some(Err(PlanError::UnknownProcessor(_)))));
    assert!(matches!(plans.get("html"), Some(Ok(_))));
}

#[test]
fn test_subset_registered_for_pdf() {
    let f = Fixture::new();
    fs::write(f.root().join("refs.bib"), "@misc{A, title={a}}\n@misc{B, title={b}}\n").unwrap();
    let settings = Settings {
        citation: CitationMode::External(None),
        ..f.settings()
    };
    let doc = f.document(json!({ "bibliography": "./refs.bib" }), "See @A.");
    let plans = build(&doc, &f.config(settings), &["pdf"]);
    let pdf = plan(&plans, "pdf");

    let subset = f.root().join("article-refs.bib");
    assert_eq!(pdf.files.len(), 1);
    assert_eq!(pdf.files[0].path, subset);
    assert!(pdf.files[0].contents.contains("@misc{A"));
    assert!(!pdf.files[0].contents.contains("@misc{B"));
    assert!(pdf.commands[2].args.contains(&format!("--bibliography={}", subset.display())));
}

#[test]
fn test_overrides_win_and_formats_dedupe() {
    let f = Fixture::new();
    let config = f
        .config(f.settings())
        .with_overrides(Overrides::parse(&["-V", "linkcolor=red", "--toc=", "--number-sections="]).unwrap());
    let doc = f.document(json!({ "toc": false }), "");
    let plans = build(&doc, &config, &["html", "html"]);

    assert_eq!(plans.len(), 1);
    let args = &plan(&plans, "html").commands[0].args;
    assert!(args.contains(&"--toc".to_string()));
    assert!(args.contains(&"--number-sections".to_string()));
    assert!(args.contains(&"linkcolor=red".to_string()));
    assert!(args.contains(&"linkcolor=blue".to_string()));
}

#[test]
fn test_unknown_format() {
    let f = Fixture::new();
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &f.config(f.settings()), &["epub"]);
    assert!(matches!(plans.get("epub"), Some(Err(PlanError::UnknownFormat(_)))));
}

#[test]
fn test_empty_section_uses_format_extension() {
    let f = Fixture::new();
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &f.config(f.settings()), &["docx"]);
    assert_eq!(plan(&plans, "docx").output, f.root().join("out/article.docx"));
}

#[test]
fn test_every_command_is_directory_qualified() {
    let f = Fixture::new();
    let settings = Settings {
        citation: CitationMode::External(None),
        ..f.settings()
    };
    let doc = f.document(json!({}), "");
    let plans = build(&doc, &f.config(settings), &["pdf", "html"]);

    for (_, result) in plans.iter() {
        let Ok(plan) = result else { panic!("plan failed") };
        for command in &plan.commands {
            assert!(command.cwd.is_absolute());
            assert!(command.to_shell().starts_with("cd "));
        }
    }
}
