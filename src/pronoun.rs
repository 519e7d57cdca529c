//! Folds the pronouns "det" and "den" into references to the clauses that
//! precede them, so "Læg to sammen med tre, og gem det i B" stores the sum.

use crate::{
    ast::{ClauseList, ClausePart, Statement},
    tokenizer::same_word,
};

fn is_pronoun(word: &str) -> bool {
    same_word(word, "det") || same_word(word, "den")
}

/// Rewrites the clause lists owned directly by `statements`. Nested blocks
/// are rewritten when they are parsed.
pub fn rewrite_statements(statements: &mut [Statement]) {
    for statement in statements {
        match statement {
            Statement::Declaration { .. } => {}
            Statement::Expression(list) | Statement::Return(list) => rewrite(list),
            Statement::If { condition, .. } | Statement::While { condition, .. } => {
                rewrite(condition)
            }
        }
    }
}

/// A pronoun in clause `i` becomes a nested list holding every clause before
/// it, and the list then starts at clause `i`. A pronoun with nothing before
/// it stays a plain word.
pub fn rewrite(list: &mut ClauseList) {
    let mut i = 0;
    while i < list.clauses.len() {
        for part_index in 0..list.clauses[i].parts.len() {
            let part = &mut list.clauses[i].parts[part_index];
            if let ClausePart::List(inner) = part {
                rewrite(inner);
                continue;
            }

            let found = matches!(part, ClausePart::Word(word) if is_pronoun(word));
            if found && i > 0 {
                let preceding = list.clauses.drain(..i).collect();
                i = 0;
                list.clauses[0].parts[part_index] = ClausePart::List(ClauseList {
                    clauses: preceding,
                });
            }
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use crate::{ast::Clause, span::Location};

    use super::*;

    fn clause<'a>(parts: Vec<ClausePart<'a>>) -> Clause<'a> {
        Clause {
            parts,
            location: Location::start("test.dk".into()),
        }
    }

    fn words<'a>(words: &[&'a str]) -> Clause<'a> {
        clause(words.iter().map(|w| ClausePart::Word(*w)).collect())
    }

    #[test]
    fn test_pronoun_takes_preceding_clauses() {
        let mut list = ClauseList {
            clauses: vec![words(&["A"]), words(&["B"]), words(&["print", "det"])],
        };
        rewrite(&mut list);

        let expected = ClauseList {
            clauses: vec![clause(vec![
                ClausePart::Word("print"),
                ClausePart::List(ClauseList {
                    clauses: vec![words(&["A"]), words(&["B"])],
                }),
            ])],
        };
        assert_eq!(list, expected);
    }

    #[test]
    fn test_chained_pronouns() {
        let mut list = ClauseList {
            clauses: vec![words(&["A"]), words(&["Den", "B"]), words(&["det", "C"])],
        };
        rewrite(&mut list);
        assert_eq!(list.to_string(), "((A) B) C");
    }

    #[test]
    fn test_pronoun_without_antecedent() {
        let mut list = ClauseList {
            clauses: vec![words(&["print", "det"]), words(&["B"])],
        };
        rewrite(&mut list);
        assert_eq!(list.to_string(), "print det, og B");
    }

    #[test]
    fn test_second_pronoun_in_clause_stays_word() {
        let mut list = ClauseList {
            clauses: vec![words(&["A"]), words(&["gem", "det", "i", "det"])],
        };
        rewrite(&mut list);
        assert_eq!(list.to_string(), "gem (A) i det");
    }

    #[test]
    fn test_rewrite_recurses_into_lists() {
        let inner = ClauseList {
            clauses: vec![words(&["A"]), words(&["print", "det"])],
        };
        let mut list = ClauseList {
            clauses: vec![clause(vec![ClausePart::Word("x"), ClausePart::List(inner)])],
        };
        rewrite(&mut list);
        assert_eq!(list.to_string(), "x (print (A))");
    }
}
