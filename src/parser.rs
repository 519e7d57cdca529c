use crate::{
    ast::{Clause, ClauseList, ClausePart, Function, Module, Pattern, PatternPart, Statement},
    diagnostic::{DiagnosticKind, Diagnostics},
    pronoun,
    span::Location,
    tokenizer::{Token, TokenKind},
};

const BLOCK_BEGIN: &str = "goddag";
const BLOCK_END: &str = "farvel";
const RETURNS: &str = "tilbagegiver";

/// Parses a whole token stream into a module. Stops starting new top-level
/// declarations once any diagnostic has been reported.
pub fn module<'src>(tokens: &[Token<'src>], diagnostics: &mut Diagnostics) -> Module<'src> {
    let mut parser = Parser::new(tokens, diagnostics);
    let mut functions = Vec::new();

    while !parser.peek().is(TokenKind::Eof) && !parser.diagnostics.has_errors() {
        parser.consume_text("offentlig");
        if parser.consume_text_maybe("funktion") {
            functions.push(parser.function());
        }
    }

    tracing::debug!(functions = functions.len(), "parsed module");
    Module { functions }
}

struct Parser<'a, 'src> {
    tokens: &'a [Token<'src>],
    pos: usize,
    eof: Token<'src>,
    diagnostics: &'a mut Diagnostics,
}

impl<'a, 'src> Parser<'a, 'src> {
    fn new(tokens: &'a [Token<'src>], diagnostics: &'a mut Diagnostics) -> Self {
        let eof_location = tokens
            .last()
            .map(|token| token.location.clone())
            .unwrap_or_else(|| Location::start("".into()));
        let mut parser = Self {
            tokens,
            pos: 0,
            eof: Token {
                kind: TokenKind::Eof,
                text: "",
                literal: None,
                location: eof_location,
            },
            diagnostics,
        };
        parser.skip_comments();
        parser
    }

    fn peek(&self) -> &Token<'src> {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn skip_comments(&mut self) {
        while self.peek().is(TokenKind::Comment) {
            self.pos += 1;
        }
    }

    fn advance(&mut self) -> Token<'src> {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        self.skip_comments();
        token
    }

    fn consume(&mut self, kind: TokenKind) -> Token<'src> {
        let token = self.advance();
        if !token.is(kind) {
            self.diagnostics.report(
                token.location.clone(),
                DiagnosticKind::UnexpectedToken {
                    wanted: kind.to_string(),
                    given: token.kind.to_string(),
                },
            );
        }
        token
    }

    fn consume_text(&mut self, text: &str) -> Token<'src> {
        let token = self.advance();
        if !token.is_text(text) {
            let given = if token.is(TokenKind::Word) {
                token.text.to_string()
            } else {
                token.kind.to_string()
            };
            self.diagnostics.report(
                token.location.clone(),
                DiagnosticKind::UnexpectedToken {
                    wanted: text.to_string(),
                    given,
                },
            );
        }
        token
    }

    fn consume_kind_maybe(&mut self, kind: TokenKind) -> bool {
        if self.peek().is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume_text_maybe(&mut self, text: &str) -> bool {
        if self.peek().is_text(text) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn function(&mut self) -> Function<'src> {
        let location = self.peek().location.clone();

        let mut parts = Vec::new();
        while !self.peek().is(TokenKind::Eof) && !self.peek().is_text(RETURNS) {
            let kind = self.peek().kind;
            match kind {
                TokenKind::Word => parts.push(PatternPart {
                    name: self.advance().text,
                    type_name: None,
                }),
                TokenKind::ParenOpen => {
                    self.advance();
                    let name = self.consume(TokenKind::Word).text;
                    self.consume_text("som");
                    let type_name = self.consume(TokenKind::Word).text;
                    self.consume(TokenKind::ParenClose);
                    parts.push(PatternPart {
                        name,
                        type_name: Some(type_name),
                    });
                }
                _ => break,
            }
        }

        self.consume_text(RETURNS);
        let return_type_name = self.consume(TokenKind::Word).text;
        self.consume(TokenKind::Dot);
        let body = self.block();

        Function {
            pattern: Pattern { parts },
            return_type_name,
            body,
            location,
        }
    }

    fn block(&mut self) -> Vec<Statement<'src>> {
        self.consume_text(BLOCK_BEGIN);
        self.consume(TokenKind::Dot);

        let mut statements = Vec::new();
        while !self.peek().is(TokenKind::Eof) && !self.peek().is_text(BLOCK_END) {
            statements.push(self.statement());
        }

        self.consume_text(BLOCK_END);
        self.consume(TokenKind::Dot);

        pronoun::rewrite_statements(&mut statements);
        statements
    }

    fn statement(&mut self) -> Statement<'src> {
        let token = self.peek();

        if token.is_text("lad") {
            self.advance();
            let name = self.consume(TokenKind::Word);
            self.consume_text("være");
            self.consume_text_maybe("en");
            self.consume_text_maybe("et");
            let type_name = self.consume(TokenKind::Word).text;
            self.consume(TokenKind::Dot);
            Statement::Declaration {
                name: name.text,
                type_name,
                location: name.location,
            }
        } else if token.is_text("hvis") {
            self.advance();
            let condition = self.clause_list();
            self.consume(TokenKind::Dot);
            let then = self.block();
            let otherwise = if self.consume_text_maybe("ellers") {
                self.consume(TokenKind::Dot);
                Some(self.block())
            } else {
                None
            };
            Statement::If {
                condition,
                then,
                otherwise,
            }
        } else if token.is_text("imens") || token.is_text("imedens") {
            self.advance();
            let condition = self.clause_list();
            self.consume(TokenKind::Dot);
            let body = self.block();
            Statement::While { condition, body }
        } else if token.is_text("tilbagegiv") {
            self.advance();
            let list = self.clause_list();
            self.consume(TokenKind::Dot);
            Statement::Return(list)
        } else {
            let list = self.clause_list();
            self.consume(TokenKind::Dot);
            Statement::Expression(list)
        }
    }

    fn clause_list(&mut self) -> ClauseList<'src> {
        let mut clauses = vec![self.clause()];
        while self.consume_kind_maybe(TokenKind::Comma) {
            self.consume_text_maybe("og");
            clauses.push(self.clause());
        }
        ClauseList { clauses }
    }

    fn clause(&mut self) -> Clause<'src> {
        let location = self.peek().location.clone();

        let mut parts = Vec::new();
        loop {
            let (kind, literal) = {
                let token = self.peek();
                (token.kind, token.literal)
            };
            let part = match (kind, literal) {
                (TokenKind::Word, _) => ClausePart::Word(self.advance().text),
                (TokenKind::Literal, Some(literal)) => {
                    self.advance();
                    ClausePart::Literal(literal)
                }
                (TokenKind::ParenOpen, _) => {
                    self.advance();
                    let list = self.clause_list();
                    self.consume(TokenKind::ParenClose);
                    ClausePart::List(list)
                }
                _ => break,
            };
            parts.push(part);
        }

        if parts.is_empty() {
            self.diagnostics
                .report(location.clone(), DiagnosticKind::ExpectedClause);
        }

        Clause { parts, location }
    }
}
