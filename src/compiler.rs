use std::rc::Rc;

use crate::{
    ast::Literal,
    bytecode::{prefix, OpCode, OperandWidth, Program, Symbol},
    checker,
    diagnostic::{Diagnostic, Diagnostics},
    parser, tokenizer,
    tree::{Expression, ExpressionKind, FunctionKind, Statement, Tree, TypeId},
};

#[derive(Debug)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileError {
    /// The diagnostic reported first; later ones are often consequences of it.
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

impl std::error::Error for CompileError {}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Compile error: ")?;
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

/// Runs the whole front end and emits a program, or returns every diagnostic
/// reported along the way.
pub fn compile(source: &str, file_name: &str) -> Result<Program, CompileError> {
    let mut diagnostics = Diagnostics::new();

    let tokens = tokenizer::tokens(source, Rc::from(file_name), &mut diagnostics);
    let module = parser::module(&tokens, &mut diagnostics);
    let tree = checker::check(module, &mut diagnostics);

    if diagnostics.has_errors() {
        return Err(CompileError {
            diagnostics: diagnostics.into_vec(),
        });
    }

    tracing::trace!(%tree, "checked tree");
    let program = Emitter::new(&tree).emit();
    tracing::debug!(
        symbols = program.symbols.len(),
        bytes = program.code.len(),
        "emitted program"
    );

    #[cfg(feature = "disassemble")]
    println!("{program}");

    Ok(program)
}

/// Position of an 8-byte branch target awaiting its final value. Stored as an
/// index so it stays valid while the code buffer grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fixup(usize);

struct Emitter<'t, 'src> {
    tree: &'t Tree<'src>,
    program: Program,
}

impl<'t, 'src> Emitter<'t, 'src> {
    fn new(tree: &'t Tree<'src>) -> Self {
        Self {
            tree,
            program: Program::default(),
        }
    }

    fn position(&self) -> usize {
        self.program.code.len()
    }

    fn emit_opcode(&mut self, opcode: OpCode) {
        debug_assert!(!opcode.has_operand(), "{opcode:?} needs an operand");
        self.program.code.push(u8::from(opcode));
    }

    fn emit_operand(&mut self, opcode: OpCode, operand: u64) {
        debug_assert!(opcode.has_operand(), "{opcode:?} takes no operand");
        let width = OperandWidth::for_value(operand);
        self.program.code.push(prefix(opcode, width));
        self.program
            .code
            .extend_from_slice(&operand.to_le_bytes()[..width.bytes()]);
    }

    /// Emits a `br` with a full-width placeholder target.
    fn emit_branch_placeholder(&mut self) -> Fixup {
        self.program.code.push(prefix(OpCode::Br, OperandWidth::U64));
        let fixup = Fixup(self.position());
        self.program.code.extend_from_slice(&u64::MAX.to_le_bytes());
        fixup
    }

    fn patch(&mut self, fixup: Fixup, target: usize) {
        let target = target as u64;
        self.program.code[fixup.0..fixup.0 + 8].copy_from_slice(&target.to_le_bytes());
    }

    fn patch_here(&mut self, fixup: Fixup) {
        self.patch(fixup, self.position());
    }

    fn size_of(&self, ty: TypeId) -> usize {
        self.tree.ty(ty).size
    }

    fn emit(mut self) -> Program {
        let tree = self.tree;
        for function in tree.user_functions() {
            let FunctionKind::User {
                symbol_id,
                locals,
                body,
            } = &function.kind
            else {
                continue;
            };

            self.program.symbols.push(Symbol {
                id: *symbol_id,
                size: u32::try_from(locals.len() * 8).unwrap_or(u32::MAX),
                offset: self.position(),
            });

            // Arguments arrive with the last one on top.
            for parameter in locals.iter().filter(|local| local.is_parameter).rev() {
                self.emit_operand(OpCode::Stl, parameter.offset as u64);
            }

            self.statements(body);

            if self.size_of(function.return_type) > 0 {
                self.emit_operand(OpCode::Ldi, 0);
            }
            self.emit_opcode(OpCode::Ret);
        }
        self.program
    }

    fn statements(&mut self, statements: &[Statement]) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Expression(expression) => {
                self.expression(expression);
                if self.size_of(expression.ty) > 0 {
                    self.emit_opcode(OpCode::Pop);
                }
            }
            Statement::Return(expression) => {
                self.expression(expression);
                self.emit_opcode(OpCode::Ret);
            }
            Statement::If {
                condition,
                then,
                otherwise,
            } => {
                self.expression(condition);
                self.emit_opcode(OpCode::Not);
                let skip_then = self.emit_branch_placeholder();

                self.statements(then);

                match otherwise {
                    Some(otherwise) => {
                        self.emit_operand(OpCode::Ldi, 1);
                        let skip_else = self.emit_branch_placeholder();
                        self.patch_here(skip_then);
                        self.statements(otherwise);
                        self.patch_here(skip_else);
                    }
                    None => self.patch_here(skip_then),
                }
            }
            Statement::While { condition, body } => {
                let start = self.position();
                self.expression(condition);
                self.emit_opcode(OpCode::Not);
                let exit = self.emit_branch_placeholder();

                self.statements(body);

                self.emit_operand(OpCode::Ldi, 1);
                self.emit_operand(OpCode::Br, start as u64);
                self.patch_here(exit);
            }
        }
    }

    fn expression(&mut self, expression: &Expression) {
        match &expression.kind {
            ExpressionKind::Sequence(expressions) => {
                let count = expressions.len();
                for (i, expression) in expressions.iter().enumerate() {
                    self.expression(expression);
                    if i + 1 < count && self.size_of(expression.ty) > 0 {
                        self.emit_opcode(OpCode::Pop);
                    }
                }
            }
            ExpressionKind::Literal(literal) => {
                let bits = match *literal {
                    Literal::Integer(value) => value as u64,
                    Literal::Float(value) => value.to_bits(),
                    Literal::Boolean(value) => u64::from(value),
                };
                self.emit_operand(OpCode::Ldi, bits);
            }
            ExpressionKind::Local(local) => {
                self.emit_operand(OpCode::Ldl, local.0 as u64);
            }
            ExpressionKind::Call {
                function,
                arguments,
            } => {
                for argument in arguments {
                    self.expression(argument);
                }
                let tree = self.tree;
                match &tree.function(*function).kind {
                    FunctionKind::Intrinsic(opcode) => self.emit_opcode(*opcode),
                    FunctionKind::User { symbol_id, .. } => {
                        self.emit_operand(OpCode::Call, u64::from(*symbol_id))
                    }
                    FunctionKind::Native(native) => {
                        self.emit_operand(OpCode::Call, u64::from(native.id()))
                    }
                    // The checker turns calls to the assignment builtin into
                    // `ExpressionKind::Assign`.
                    FunctionKind::Assign => {}
                }
            }
            ExpressionKind::Assign { target, value } => {
                self.expression(value);
                self.emit_opcode(OpCode::Dup);
                self.emit_operand(OpCode::Stl, target.0 as u64);
            }
            ExpressionKind::Unresolved { .. } => {}
        }
    }
}
