//! Program/expected-output test files.
//!
//! A corpus file is a list of sections separated by runs of `═`. Each
//! section holds a name, a program and the expected output, separated by
//! runs of `─`. Surrounding whitespace of every part is ignored.

use crate::{
    compiler, numbers,
    vm::{Vm, VmConfig},
};

const SECTION_DELIMITER: char = '═';
const PART_DELIMITER: char = '─';

/// Spelled numbers and what they decode to.
pub const NUMBER_CASES: &[(&str, Option<i64>)] = &[
    ("nitten", Some(19)),
    ("ethundredefireogtredive", Some(134)),
    ("tretusindetohundrede", Some(3200)),
    ("tretusinde-tohundrede", Some(3200)),
    ("treogtredivehundredeogatten", Some(3318)),
    ("ettusind", Some(1000)),
    ("tusind", Some(1000)),
    ("tohundredeseksogtyvemillioner-tretusinde-syvoghalvtreds", Some(226_003_057)),
    (
        "to-tusind-seks-og-tyve-millioner-fire-og-tredive-tusind-seks-hundrede-fem-og-fyrre",
        Some(2_026_034_645),
    ),
    ("to-hundrede-seks-og-tyve-tusind", Some(226_000)),
    ("to-tusind-seks-og-tyve-millioner", Some(2_026_000_000)),
    ("et-tusind-to-hundrede-seks-og-tyve", Some(1226)),
    ("to-hundrede-millioner", Some(200_000_000)),
    ("toogfyrrea", None),
    ("og", None),
    ("-", None),
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CorpusError {
    #[error("Invalid test file format.\nFile path: {file}\nByte pos:  {offset}")]
    InvalidSection { file: String, offset: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    pub name: String,
    pub source: String,
    pub expected: String,
}

#[derive(Debug, Default)]
pub struct Corpus {
    pub cases: Vec<Case>,
    /// Sections that could not be split into name, program and output.
    pub errors: Vec<CorpusError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub name: String,
    pub expected: String,
    pub actual: String,
}

impl Outcome {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

/// Splits `text` around every maximal run of `delimiter`, keeping the byte
/// offset of each piece.
fn split_runs(text: &str, delimiter: char) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != delimiter {
            continue;
        }
        pieces.push((start, &text[start..i]));
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if next != delimiter {
                break;
            }
            end = j + next.len_utf8();
            chars.next();
        }
        start = end;
    }

    pieces.push((start, &text[start..]));
    pieces
}

pub fn parse(text: &str, file: &str) -> Corpus {
    let text = text.replace("\r\n", "\n");
    let mut corpus = Corpus::default();

    for (offset, section) in split_runs(&text, SECTION_DELIMITER) {
        if section.trim().is_empty() {
            continue;
        }

        match split_runs(section, PART_DELIMITER).as_slice() {
            [(_, name), (_, source), (_, expected), ..] => corpus.cases.push(Case {
                name: name.trim().to_string(),
                source: source.trim().to_string(),
                expected: expected.trim().to_string(),
            }),
            _ => {
                let leading = section.len() - section.trim_start().len();
                corpus.errors.push(CorpusError::InvalidSection {
                    file: file.to_string(),
                    offset: offset + leading,
                });
            }
        }
    }

    tracing::debug!(
        file,
        cases = corpus.cases.len(),
        errors = corpus.errors.len(),
        "parsed corpus"
    );
    corpus
}

/// Compiles and runs one case. A failed compilation produces the first
/// diagnostic's message, a runtime error its description.
pub fn run_case(case: &Case, config: VmConfig) -> Outcome {
    let actual = match compiler::compile(&case.source, &case.name) {
        Ok(program) => {
            let mut vm = Vm::new(&program, config);
            match vm.run() {
                Ok(()) => vm.into_output(),
                Err(e) => format!("{}{e}", vm.output()),
            }
        }
        Err(e) => e.first().map(|d| d.message()).unwrap_or_default(),
    };

    Outcome {
        name: case.name.clone(),
        expected: case.expected.clone(),
        actual: actual.trim().to_string(),
    }
}

/// Runs every case whose name contains `filter`.
pub fn run(corpus: &Corpus, filter: &str, config: VmConfig) -> Vec<Outcome> {
    corpus
        .cases
        .iter()
        .filter(|case| case.name.contains(filter))
        .map(|case| run_case(case, config))
        .collect()
}

fn number_text(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub fn run_number_cases() -> Vec<Outcome> {
    NUMBER_CASES
        .iter()
        .map(|&(input, expected)| Outcome {
            name: input.to_string(),
            expected: number_text(expected),
            actual: number_text(numbers::decode(input)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
════════
Print to
────────
Offentlig funktion hovedprogram tilbagegiver heltal.
Goddag.
    Print to.
Farvel.
────────
2
════════════════
kun navn
────
ingen output
════════
Ukendt funktion\r
──────\r
Offentlig funktion f tilbagegiver heltal. Goddag. Print Q. Farvel.\r
──────\r
Unresolved function\r
    Pattern: Print Q\r
";

    #[test]
    fn test_split_runs() {
        assert_eq!(split_runs("a══b═c", '═'), vec![(0, "a"), (7, "b"), (11, "c")]);
        assert_eq!(split_runs("abc", '═'), vec![(0, "abc")]);
    }

    #[test]
    fn test_parse_sections() {
        let corpus = parse(SAMPLE, "sample.dk");
        assert_eq!(corpus.cases.len(), 2);
        assert_eq!(corpus.cases[0].name, "Print to");
        assert!(corpus.cases[0].source.starts_with("Offentlig funktion"));
        assert_eq!(corpus.cases[0].expected, "2");
        assert_eq!(
            corpus.cases[1].expected,
            "Unresolved function\n    Pattern: Print Q"
        );

        assert_eq!(corpus.errors.len(), 1);
        let CorpusError::InvalidSection { file, offset } = &corpus.errors[0];
        assert_eq!(file, "sample.dk");
        assert!(SAMPLE.replace("\r\n", "\n")[*offset..].starts_with("kun navn"));
    }

    #[test]
    fn test_run_cases() {
        let corpus = parse(SAMPLE, "sample.dk");
        let outcomes = run(&corpus, "", VmConfig::default());
        assert_eq!(outcomes.len(), 2);
        for outcome in &outcomes {
            assert!(outcome.passed(), "{outcome:?}");
        }

        let filtered = run(&corpus, "Ukendt", VmConfig::default());
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_runtime_error_follows_output() {
        let case = Case {
            name: "Division".to_string(),
            source: "Offentlig funktion hovedprogram tilbagegiver heltal. Goddag. \
                     Print et. Print (del et med nul). Farvel."
                .to_string(),
            expected: "1\nInteger division by zero".to_string(),
        };
        let outcome = run_case(&case, VmConfig::default());
        assert!(outcome.passed(), "{outcome:?}");
    }

    #[test]
    fn test_number_cases() {
        for outcome in run_number_cases() {
            assert!(outcome.passed(), "{outcome:?}");
        }
    }
}
