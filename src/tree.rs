//! The checked program: resolved types, functions and typed bodies.

use std::fmt::Display;

use crate::{
    ast::{Literal, Pattern},
    bytecode::{Native, OpCode},
    span::Location,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub usize);

impl TypeId {
    pub const INTEGER: TypeId = TypeId(0);
    pub const FLOAT: TypeId = TypeId(1);
    pub const BOOLEAN: TypeId = TypeId(2);
    /// Wildcard accepted by the assignment builtin.
    pub const ANY: TypeId = TypeId(3);
    /// Result type of a call that could not be resolved.
    pub const NONE: TypeId = TypeId(4);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// Index into the owning function's locals, which is also its frame slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub name: &'static str,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local<'src> {
    pub name: &'src str,
    pub offset: usize,
    pub ty: TypeId,
    pub is_parameter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind<'src> {
    User {
        symbol_id: u32,
        locals: Vec<Local<'src>>,
        body: Vec<Statement>,
    },
    Intrinsic(OpCode),
    Native(Native),
    Assign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function<'src> {
    pub pattern: Pattern<'src>,
    pub return_type_name: &'src str,
    pub return_type: TypeId,
    /// Resolved types of the typed pattern parts, in pattern order.
    pub parameter_types: Vec<TypeId>,
    pub kind: FunctionKind<'src>,
    /// Declaration site; builtins have none.
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    If {
        condition: Expression,
        then: Vec<Statement>,
        otherwise: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    Return(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionKind {
    Call {
        function: FunctionId,
        arguments: Vec<Expression>,
    },
    Literal(Literal),
    Local(LocalId),
    Sequence(Vec<Expression>),
    Assign {
        target: LocalId,
        value: Box<Expression>,
    },
    /// Stands in for a call that failed to resolve. Only exists alongside a
    /// reported diagnostic, so it is never emitted.
    Unresolved { arguments: Vec<Expression> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree<'src> {
    pub types: Vec<Type>,
    pub functions: Vec<Function<'src>>,
}

impl<'src> Tree<'src> {
    pub fn with_builtin_types() -> Self {
        let types = vec![
            Type {
                name: "heltal",
                size: 8,
            },
            Type {
                name: "flyder",
                size: 8,
            },
            Type {
                name: "påstand",
                size: 1,
            },
            Type {
                name: "$any",
                size: 1,
            },
            Type {
                name: "$none",
                size: 0,
            },
        ];
        Self {
            types,
            functions: Vec::new(),
        }
    }

    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &Function<'src> {
        &self.functions[id.0]
    }

    pub fn user_functions(&self) -> impl Iterator<Item = &Function<'src>> {
        self.functions
            .iter()
            .filter(|function| matches!(function.kind, FunctionKind::User { .. }))
    }
}

impl Display for Tree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for function in self.user_functions() {
            let FunctionKind::User {
                symbol_id,
                locals,
                body,
            } = &function.kind
            else {
                continue;
            };
            writeln!(
                f,
                "@{symbol_id:#x} {} -> {}",
                function.pattern,
                self.ty(function.return_type).name
            )?;
            for local in locals {
                writeln!(
                    f,
                    "  #{} {}: {}{}",
                    local.offset,
                    local.name,
                    self.ty(local.ty).name,
                    if local.is_parameter { " (parameter)" } else { "" }
                )?;
            }
            for statement in body {
                self.write_statement(f, statement, 1)?;
            }
        }
        Ok(())
    }
}

impl Tree<'_> {
    fn write_statement(
        &self,
        f: &mut std::fmt::Formatter<'_>,
        statement: &Statement,
        depth: usize,
    ) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match statement {
            Statement::Expression(expression) => {
                writeln!(f, "{indent}{}", self.expression_text(expression))
            }
            Statement::Return(expression) => {
                writeln!(f, "{indent}return {}", self.expression_text(expression))
            }
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                writeln!(f, "{indent}if {}", self.expression_text(condition))?;
                for statement in then {
                    self.write_statement(f, statement, depth + 1)?;
                }
                if let Some(otherwise) = otherwise {
                    writeln!(f, "{indent}else")?;
                    for statement in otherwise {
                        self.write_statement(f, statement, depth + 1)?;
                    }
                }
                Ok(())
            }
            Statement::While { condition, body } => {
                writeln!(f, "{indent}while {}", self.expression_text(condition))?;
                for statement in body {
                    self.write_statement(f, statement, depth + 1)?;
                }
                Ok(())
            }
        }
    }

    /// Lisp-style rendering with the resolved type of every node.
    pub fn expression_text(&self, expression: &Expression) -> String {
        let ty = self.ty(expression.ty).name;
        match &expression.kind {
            ExpressionKind::Literal(literal) => format!("{literal}:{ty}"),
            ExpressionKind::Local(local) => format!("#{}:{ty}", local.0),
            ExpressionKind::Call {
                function,
                arguments,
            } => {
                let mut text = format!("({}", self.function(*function).pattern);
                for argument in arguments {
                    text.push(' ');
                    text.push_str(&self.expression_text(argument));
                }
                text.push_str(&format!("):{ty}"));
                text
            }
            ExpressionKind::Sequence(expressions) => {
                let parts: Vec<_> = expressions
                    .iter()
                    .map(|expression| self.expression_text(expression))
                    .collect();
                format!("[{}]:{ty}", parts.join(", "))
            }
            ExpressionKind::Assign { target, value } => {
                format!("(#{} = {})", target.0, self.expression_text(value))
            }
            ExpressionKind::Unresolved { .. } => format!("<unresolved>:{ty}"),
        }
    }
}
