use dansk::{corpus, vm::VmConfig};

const CORPUS: &str = include_str!("corpus/sprog.dk");

#[test]
fn test_corpus_parses() {
    let cases = corpus::parse(CORPUS, "sprog.dk");
    assert!(cases.errors.is_empty(), "{:?}", cases.errors);
    assert_eq!(cases.cases.len(), 15);
}

#[test]
fn test_corpus_passes() {
    let cases = corpus::parse(CORPUS, "sprog.dk");
    let failures: Vec<_> = corpus::run(&cases, "", VmConfig::default())
        .into_iter()
        .filter(|outcome| !outcome.passed())
        .collect();
    assert!(failures.is_empty(), "{failures:#?}");
}

#[test]
fn test_filter_by_name() {
    let cases = corpus::parse(CORPUS, "sprog.dk");
    let outcomes = corpus::run(&cases, "Rekursion", VmConfig::default());
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].actual, "120");
}
