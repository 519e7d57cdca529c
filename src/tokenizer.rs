use std::{fmt::Display, rc::Rc};

use crate::{
    ast::Literal,
    diagnostic::{DiagnosticKind, Diagnostics},
    numbers,
    span::Location,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,

    // Punctuation
    Dot,
    Comma,
    ParenOpen,
    ParenClose,

    Literal,
    Word,
    Comment,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Eof => "end of input",
            TokenKind::Dot => "'.'",
            TokenKind::Comma => "','",
            TokenKind::ParenOpen => "'('",
            TokenKind::ParenClose => "')'",
            TokenKind::Literal => "literal",
            TokenKind::Word => "word",
            TokenKind::Comment => "comment",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub literal: Option<Literal>,
    pub location: Location,
}

impl Token<'_> {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Keyword test; keywords are matched on the raw text regardless of how
    /// the token was classified ("en" is also the number one).
    pub fn is_text(&self, text: &str) -> bool {
        same_word(self.text, text)
    }
}

/// Case-insensitive word comparison, including the Danish letters.
pub fn same_word(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

const FALSE_SPELLINGS: &[&str] = &["falsk", "falskt"];
const TRUE_SPELLINGS: &[&str] = &["sand", "sandt"];
const COMMENT_KEYWORD: &str = "bemærk";

pub struct Tokenizer<'src> {
    source: &'src str,
    location: Location,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str, file: Rc<str>) -> Self {
        Self {
            source,
            location: Location::start(file),
        }
    }

    fn peek0(&self) -> u8 {
        self.byte_at(self.location.pos)
    }

    fn peek1(&self) -> u8 {
        self.byte_at(self.location.pos + 1)
    }

    fn byte_at(&self, pos: usize) -> u8 {
        self.source.as_bytes().get(pos).copied().unwrap_or(0)
    }

    fn at_end(&self) -> bool {
        self.location.pos >= self.source.len()
    }

    fn eat(&mut self) {
        if self.peek0() == b'\n' {
            self.location.row += 1;
            self.location.col = 0;
        } else {
            self.location.col += 1;
        }
        self.location.pos += 1;
    }

    fn eat_while(&mut self, predicate: impl Fn(u8) -> bool) {
        while !self.at_end() && predicate(self.peek0()) {
            self.eat();
        }
    }

    fn text_from(&self, begin: &Location) -> &'src str {
        &self.source[begin.pos..self.location.pos]
    }

    /// Produces the next token, comments included. Malformed input is
    /// reported and skipped, so this always makes progress and always ends
    /// with `TokenKind::Eof`.
    pub fn next_token(&mut self, diagnostics: &mut Diagnostics) -> Token<'src> {
        loop {
            self.eat_while(|c| c.is_ascii_whitespace());

            let begin = self.location.clone();
            if self.at_end() {
                return self.token(TokenKind::Eof, None, begin);
            }

            let c = self.peek0();
            if is_word_start(c) {
                return self.word(begin);
            } else if c.is_ascii_punctuation() {
                self.eat();
                let kind = match c {
                    b'.' => TokenKind::Dot,
                    b',' => TokenKind::Comma,
                    b'(' => TokenKind::ParenOpen,
                    b')' => TokenKind::ParenClose,
                    _ => {
                        diagnostics.report(begin, DiagnosticKind::InvalidOperator);
                        continue;
                    }
                };
                return self.token(kind, None, begin);
            } else if c.is_ascii_digit() {
                match self.number(&begin) {
                    Ok(literal) => return self.token(TokenKind::Literal, Some(literal), begin),
                    Err(kind) => diagnostics.report(begin, kind),
                }
            } else {
                self.eat();
                diagnostics.report(begin, DiagnosticKind::UnexpectedCharacter);
            }
        }
    }

    fn token(&self, kind: TokenKind, literal: Option<Literal>, begin: Location) -> Token<'src> {
        Token {
            kind,
            text: self.text_from(&begin),
            literal,
            location: begin,
        }
    }

    fn word(&mut self, begin: Location) -> Token<'src> {
        self.eat_while(is_word_continue);
        let text = self.text_from(&begin);

        if same_word(text, COMMENT_KEYWORD) {
            self.eat_while(|c| c != b'\n');
            return self.token(TokenKind::Comment, None, begin);
        }

        let literal = if FALSE_SPELLINGS.iter().any(|s| same_word(text, s)) {
            Some(Literal::Boolean(false))
        } else if TRUE_SPELLINGS.iter().any(|s| same_word(text, s)) {
            Some(Literal::Boolean(true))
        } else {
            numbers::decode(text).map(Literal::Integer)
        };

        match literal {
            Some(literal) => self.token(TokenKind::Literal, Some(literal), begin),
            None => self.token(TokenKind::Word, None, begin),
        }
    }

    fn number(&mut self, begin: &Location) -> Result<Literal, DiagnosticKind> {
        let mut decimal = false;
        while self.peek0().is_ascii_digit() || (self.peek0() == b',' && self.peek1().is_ascii_digit()) {
            decimal |= self.peek0() == b',';
            self.eat();
        }

        let text = self.text_from(begin);
        if decimal {
            text.replace(',', ".")
                .parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| DiagnosticKind::InvalidFloat)
        } else {
            // No overflow check; large literals wrap.
            let value = text.bytes().fold(0i64, |acc, digit| {
                acc.wrapping_mul(10).wrapping_add(i64::from(digit - b'0'))
            });
            Ok(Literal::Integer(value))
        }
    }
}

fn is_word_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 128
}

fn is_word_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-' || c >= 128
}

/// Tokenizes a whole source, dropping comments.
pub fn tokens<'src>(source: &'src str, file: Rc<str>, diagnostics: &mut Diagnostics) -> Vec<Token<'src>> {
    let mut tokenizer = Tokenizer::new(source, file);
    let mut tokens = Vec::new();

    loop {
        let token = tokenizer.next_token(diagnostics);
        match token.kind {
            TokenKind::Comment => continue,
            TokenKind::Eof => {
                tokens.push(token);
                break;
            }
            _ => tokens.push(token),
        }
    }

    tracing::trace!(count = tokens.len(), "tokenized");
    tokens
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds_and_literals(source: &str) -> Vec<(TokenKind, Option<Literal>)> {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokens(source, Rc::from("test.dk"), &mut diagnostics);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        tokens.into_iter().map(|t| (t.kind, t.literal)).collect()
    }

    #[test]
    fn test_tokens() {
        let source = "Gem fem i A.";
        let expected = vec![
            (TokenKind::Word, None),
            (TokenKind::Literal, Some(Literal::Integer(5))),
            (TokenKind::Word, None),
            (TokenKind::Word, None),
            (TokenKind::Dot, None),
            (TokenKind::Eof, None),
        ];
        assert_eq!(kinds_and_literals(source), expected);
    }

    #[test]
    fn test_tokens_with_comments() {
        let source = "Bemærk: dette er (ikke) kode.\nPrint to.";
        let expected = vec![
            (TokenKind::Word, None),
            (TokenKind::Literal, Some(Literal::Integer(2))),
            (TokenKind::Dot, None),
            (TokenKind::Eof, None),
        ];
        assert_eq!(kinds_and_literals(source), expected);
    }

    #[test]
    fn test_comment_at_end_of_input() {
        let source = "Print to. bemærk slut";
        assert_eq!(kinds_and_literals(source).len(), 4);
    }

    #[test]
    fn test_tokens_with_numbers() {
        let source = "42 3,25 1, 2";
        let expected = vec![
            (TokenKind::Literal, Some(Literal::Integer(42))),
            (TokenKind::Literal, Some(Literal::Float(3.25))),
            (TokenKind::Literal, Some(Literal::Integer(1))),
            (TokenKind::Comma, None),
            (TokenKind::Literal, Some(Literal::Integer(2))),
            (TokenKind::Eof, None),
        ];
        assert_eq!(kinds_and_literals(source), expected);
    }

    #[test]
    fn test_tokens_with_booleans() {
        let source = "Sandt falsk SAND";
        let expected = vec![
            (TokenKind::Literal, Some(Literal::Boolean(true))),
            (TokenKind::Literal, Some(Literal::Boolean(false))),
            (TokenKind::Literal, Some(Literal::Boolean(true))),
            (TokenKind::Eof, None),
        ];
        assert_eq!(kinds_and_literals(source), expected);
    }

    #[test]
    fn test_danish_words() {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokens("læg påstand to-og-tyve", Rc::from("test.dk"), &mut diagnostics);
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["læg", "påstand", "to-og-tyve", ""]);
        assert_eq!(tokens[2].literal, Some(Literal::Integer(22)));
    }

    #[test]
    fn test_locations() {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokens("a\n  b.", Rc::from("test.dk"), &mut diagnostics);
        assert_eq!((tokens[1].location.row, tokens[1].location.col), (1, 2));
        assert_eq!(tokens[1].location.pos, 4);
        assert_eq!(tokens[3].location.pos, 6);
    }

    #[test]
    fn test_invalid_operator_recovers() {
        let mut diagnostics = Diagnostics::new();
        let tokens = tokens("a + b", Rc::from("test.dk"), &mut diagnostics);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.first().map(|d| d.location.col), Some(2));
        let texts: Vec<_> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["a", "b", ""]);
    }

    #[test]
    fn test_retokenizing_is_idempotent() {
        let source = "Offentlig funktion (X som heltal) tilbagegiver flyder. \
                      Gem 2,5 i A, og print det. tretusindetohundrede sandt (bemærk x\n)";
        let mut diagnostics = Diagnostics::new();
        let all = tokens(source, Rc::from("test.dk"), &mut diagnostics);
        for token in all.iter().filter(|t| !t.is(TokenKind::Eof)) {
            let again = tokens(token.text, Rc::from("test.dk"), &mut diagnostics);
            assert_eq!(again.len(), 2, "{:?}", token.text);
            assert_eq!(again[0].kind, token.kind);
            assert_eq!(again[0].literal, token.literal);
            assert_eq!(again[0].text, token.text);
        }
        assert!(diagnostics.is_empty());
    }
}
