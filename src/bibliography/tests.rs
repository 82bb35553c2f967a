use super::*;
use crate::document::FrontMatter;
use serde_json::{Value, json};
use tempfile::TempDir;

const REFS: &str = r#"
@string{acm = "ACM"}
@article{A, title = {Alpha}, publisher = acm}
@article{B, title = {Beta}}
@book{C, title = {Gamma}}
"#;

fn document(dir: &Path, header: Value, body: &str) -> Document {
    let front_matter = match header {
        Value::Object(map) => FrontMatter::from(map),
        _ => FrontMatter::default(),
    };
    Document::from_parts(&dir.join("article.md"), front_matter, body)
}

fn external() -> Settings {
    Settings {
        citation: CitationMode::External(None),
        ..Settings::default()
    }
}

fn pdf_options(bibliography: Option<&Path>) -> EffectiveOptions {
    let mut options = EffectiveOptions::new("pdf");
    options.set_output("tex");
    options.set_long("citeproc", OptionValue::Flag);
    if let Some(path) = bibliography {
        options.set_long("bibliography", OptionValue::Value(path.display().to_string()));
    }
    options
}

#[test]
fn test_citation_mode_names() {
    assert_eq!("citeproc".parse::<CitationMode>(), Ok(CitationMode::Integrated));
    assert_eq!("auto".parse::<CitationMode>(), Ok(CitationMode::External(None)));
    assert_eq!("natbib".parse::<CitationMode>(), Ok(CitationMode::External(Some(BibProcessor::BibTex))));
    assert_eq!("Biber".parse::<CitationMode>(), Ok(CitationMode::External(Some(BibProcessor::Biber))));
    assert!("simple".parse::<CitationMode>().is_err());
}

#[test]
fn test_integrated_plans_nothing() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({}), "See @A.");
    let mut options = pdf_options(None);
    let before = options.clone();

    let plan = plan(&mut options, &doc, &Settings::default(), &temp.path().join("article.tex")).unwrap();

    assert_eq!(plan, BibliographyPlan::default());
    assert_eq!(plan.style(), "citeproc");
    assert_eq!(options, before);
}

#[test]
fn test_default_processor_keeps_only_cited_entries() {
    let temp = TempDir::new().unwrap();
    let bib = temp.path().join("refs.bib");
    fs::write(&bib, REFS).unwrap();
    let doc = document(temp.path(), json!({}), "First [@A], then @C.\n");
    let mut options = pdf_options(Some(&bib));
    let tex = temp.path().join("article.tex");

    let plan = plan(&mut options, &doc, &external(), &tex).unwrap();

    assert_eq!(plan.processor, Some(BibProcessor::BibTex));
    assert_eq!(plan.style(), "natbib");
    assert!(!options.has_long("citeproc"));
    assert_eq!(options.long("natbib"), Some(&OptionValue::Flag));

    let shim = plan.shim.unwrap();
    assert_eq!(shim.step, Step::Shim);
    assert_eq!(shim.program, "sed");
    assert_eq!(shim.args.last().map(String::as_str), Some(tex.display().to_string().as_str()));

    let subset = plan.subset.unwrap();
    let keys: Vec<_> = parse_entries(subset.path(), &subset.contents)
        .unwrap()
        .into_iter()
        .filter_map(|e| e.key)
        .collect();
    assert_eq!(keys, ["A", "C"]);
    assert!(subset.contents.contains("@string{acm"));
    assert_eq!(
        options.long_str("bibliography"),
        Some(subset.path().display().to_string().as_str())
    );
}

#[test]
fn test_front_matter_selects_biber() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({ "citation-processor": "biber" }), "");
    let mut options = pdf_options(None);
    options.set_long("natbib", OptionValue::Flag);

    let plan = plan(&mut options, &doc, &Settings::default(), &temp.path().join("article.tex")).unwrap();

    assert_eq!(plan.processor, Some(BibProcessor::Biber));
    assert!(plan.shim.is_none());
    assert!(plan.subset.is_none());
    assert!(!options.has_long("natbib"));
    assert!(options.has_long("biblatex"));
}

#[test]
fn test_processor_detected_from_options() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({}), "");
    let mut options = pdf_options(None);
    options.set_long("biblatex", OptionValue::Flag);

    let plan = plan(&mut options, &doc, &external(), &temp.path().join("article.tex")).unwrap();
    assert_eq!(plan.processor, Some(BibProcessor::Biber));
}

#[test]
fn test_configured_default_processor() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({}), "");
    let settings = Settings {
        default_processor: BibProcessor::Biber,
        ..external()
    };

    let plan = plan(&mut pdf_options(None), &doc, &settings, &temp.path().join("article.tex")).unwrap();
    assert_eq!(plan.processor, Some(BibProcessor::Biber));
}

#[test]
fn test_unknown_processor() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({ "citation-processor": "simple" }), "");

    let err = plan(&mut pdf_options(None), &doc, &Settings::default(), &temp.path().join("a.tex")).unwrap_err();
    assert!(matches!(err, PlanError::UnknownProcessor(ref name) if name == "simple"));
}

#[test]
fn test_ambiguous_processor() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({}), "");
    let mut options = pdf_options(None);
    options.set_long("natbib", OptionValue::Flag);
    options.set_long("biblatex", OptionValue::Flag);

    let err = plan(&mut options, &doc, &external(), &temp.path().join("a.tex")).unwrap_err();
    assert!(matches!(err, PlanError::AmbiguousProcessor));
}

#[test]
fn test_missing_source() {
    let temp = TempDir::new().unwrap();
    let doc = document(temp.path(), json!({}), "@A");
    let mut options = pdf_options(Some(&temp.path().join("missing.bib")));

    let err = plan(&mut options, &doc, &external(), &temp.path().join("a.tex")).unwrap_err();
    assert!(matches!(err, PlanError::Bibliography(BibliographyError::Read { .. })));
}

#[test]
fn test_duplicate_keys() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first.bib");
    let same = temp.path().join("same.bib");
    let other = temp.path().join("other.bib");
    fs::write(&first, "@misc{A, title = {Alpha}}\n@misc{B, title = {Beta}}").unwrap();
    fs::write(&same, "@misc{A,\n  title = {Alpha}\n}").unwrap();
    fs::write(&other, "@misc{A, title = {Not alpha}}\n@misc{B, title = {Other}}").unwrap();

    let merged = extract_cited(&[first.clone(), same], "@A").unwrap();
    assert_eq!(merged.matches("@misc").count(), 1);

    // B differs too, but is not cited
    let err = extract_cited(&[first, other.clone()], "@A").unwrap_err();
    assert!(
        matches!(err, BibliographyError::DuplicateKey { ref key, ref second, .. } if key == "A" && *second == other)
    );
}
