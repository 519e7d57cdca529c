use crate::{
    ast::{self, Clause, ClauseList, ClausePart, Literal, Module, Pattern},
    bytecode::{Native, OpCode},
    diagnostic::{DiagnosticKind, Diagnostics},
    span::Location,
    tokenizer::same_word,
    tree::{
        Expression, ExpressionKind, Function, FunctionId, FunctionKind, Local, LocalId, Statement,
        Tree, TypeId,
    },
};

// Resolution is first match, so this order is also the priority order.
const INTRINSICS: &[(OpCode, &str, &str)] = &[
    // Arithmetic
    (OpCode::Add, "læg A:heltal sammen med B:heltal", "heltal"),
    (OpCode::Fadd, "læg A:flyder sammen med B:flyder", "flyder"),
    (OpCode::Sub, "træk A:heltal fra B:heltal", "heltal"),
    (OpCode::Fsub, "træk A:flyder fra B:flyder", "flyder"),
    (OpCode::Imul, "gang A:heltal med B:heltal", "heltal"),
    (OpCode::Fmul, "gang A:flyder med B:flyder", "flyder"),
    (OpCode::Idiv, "del A:heltal med B:heltal", "heltal"),
    (OpCode::Fdiv, "del A:flyder med B:flyder", "flyder"),
    // Comparison
    (OpCode::Lt, "A:heltal er mindre end B:heltal", "påstand"),
    (OpCode::Flt, "A:flyder er mindre end B:flyder", "påstand"),
    (OpCode::Gt, "A:heltal er større end B:heltal", "påstand"),
    (OpCode::Fgt, "A:flyder er større end B:flyder", "påstand"),
    (OpCode::Eq, "A:heltal er lig med B:heltal", "påstand"),
    (OpCode::Feq, "A:flyder er lig med B:flyder", "påstand"),
    // Boolean
    (OpCode::Or, "enten A:påstand eller B:påstand", "påstand"),
    (OpCode::And, "både A:påstand og B:påstand", "påstand"),
    (OpCode::Not, "ikke A:påstand", "påstand"),
    // Casts
    (OpCode::F2i, "støb A:flyder som heltal", "heltal"),
    (OpCode::I2f, "støb A:heltal som flyder", "flyder"),
];

const ASSIGN_PATTERN: &str = "gem src:$any i dst:$any";

const NATIVES: &[(Native, &str)] = &[
    (Native::PrintInteger, "print A:heltal"),
    (Native::PrintFloat, "print A:flyder"),
    (Native::PrintBoolean, "print A:påstand"),
];

/// One position of a call-site pattern.
#[derive(Debug, Clone, Copy)]
enum Requirement<'src> {
    Word(&'src str),
    Type(TypeId),
}

/// Checks a parsed module: resolves types, assigns symbol ids and resolves
/// every clause against the declared function patterns. Problems are
/// reported to `diagnostics`; the returned tree is only fit for emission when
/// none were reported.
pub fn check<'src>(module: Module<'src>, diagnostics: &mut Diagnostics) -> Tree<'src> {
    let mut checker = Checker::new(diagnostics);
    let bodies = checker.declare_functions(module);

    for index in 0..checker.tree.functions.len() {
        if checker.diagnostics.has_errors() {
            break;
        }
        checker.check_signature(FunctionId(index));
    }

    for (id, body) in bodies {
        if checker.diagnostics.has_errors() {
            break;
        }
        checker.check_body(id, &body);
    }

    tracing::debug!(
        functions = checker.tree.functions.len(),
        symbols = checker.next_symbol_id,
        "checked module"
    );
    checker.tree
}

struct Checker<'src, 'd> {
    tree: Tree<'src>,
    locals: Vec<Local<'src>>,
    next_symbol_id: u32,
    diagnostics: &'d mut Diagnostics,
}

impl<'src, 'd> Checker<'src, 'd> {
    fn new(diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            tree: Tree::with_builtin_types(),
            locals: Vec::new(),
            next_symbol_id: 0,
            diagnostics,
        }
    }

    fn builtin(&mut self, spec: &'static str, return_type_name: &'static str, kind: FunctionKind<'src>) {
        self.tree.functions.push(Function {
            pattern: Pattern::from_spec(spec),
            return_type_name,
            return_type: TypeId::NONE,
            parameter_types: Vec::new(),
            kind,
            location: None,
        });
    }

    /// Declares builtins ahead of user functions. Returns the user function
    /// bodies, still unchecked, in source order.
    fn declare_functions(&mut self, module: Module<'src>) -> Vec<(FunctionId, Vec<ast::Statement<'src>>)> {
        for &(opcode, spec, return_type_name) in INTRINSICS {
            self.builtin(spec, return_type_name, FunctionKind::Intrinsic(opcode));
        }
        self.builtin(ASSIGN_PATTERN, "heltal", FunctionKind::Assign);
        for &(native, spec) in NATIVES {
            self.builtin(spec, "heltal", FunctionKind::Native(native));
        }

        let mut bodies = Vec::with_capacity(module.functions.len());
        for function in module.functions {
            let id = FunctionId(self.tree.functions.len());
            self.tree.functions.push(Function {
                pattern: function.pattern,
                return_type_name: function.return_type_name,
                return_type: TypeId::NONE,
                parameter_types: Vec::new(),
                kind: FunctionKind::User {
                    symbol_id: 0,
                    locals: Vec::new(),
                    body: Vec::new(),
                },
                location: Some(function.location),
            });
            bodies.push((id, function.body));
        }
        bodies
    }

    fn resolve_type(&mut self, name: &str, location: Option<&Location>) -> TypeId {
        let found = self
            .tree
            .types
            .iter()
            .position(|ty| same_word(ty.name, name));
        match found {
            Some(index) => TypeId(index),
            None => {
                let location = location
                    .cloned()
                    .unwrap_or_else(|| Location::start("<builtin>".into()));
                self.diagnostics
                    .report(location, DiagnosticKind::UnresolvedType(name.to_string()));
                TypeId::NONE
            }
        }
    }

    fn check_signature(&mut self, id: FunctionId) {
        let function = &self.tree.functions[id.0];
        let location = function.location.clone();
        let return_type_name = function.return_type_name;
        let parameter_type_names: Vec<&str> = function
            .pattern
            .parameters()
            .filter_map(|part| part.type_name)
            .collect();

        let return_type = self.resolve_type(return_type_name, location.as_ref());
        let parameter_types = parameter_type_names
            .into_iter()
            .map(|name| self.resolve_type(name, location.as_ref()))
            .collect();

        let symbol_id = if matches!(self.tree.functions[id.0].kind, FunctionKind::User { .. }) {
            self.next_symbol_id += 1;
            Some(self.next_symbol_id)
        } else {
            None
        };

        let function = &mut self.tree.functions[id.0];
        function.return_type = return_type;
        function.parameter_types = parameter_types;
        if let (Some(id), FunctionKind::User { symbol_id, .. }) = (symbol_id, &mut function.kind) {
            *symbol_id = id;
        }
    }

    fn push_local(&mut self, name: &'src str, ty: TypeId, is_parameter: bool) {
        let offset = self.locals.len();
        self.locals.push(Local {
            name,
            offset,
            ty,
            is_parameter,
        });
    }

    /// First declaration wins when a name is declared twice.
    fn resolve_local(&self, name: &str) -> Option<&Local<'src>> {
        self.locals.iter().find(|local| same_word(local.name, name))
    }

    fn check_body(&mut self, id: FunctionId, body: &[ast::Statement<'src>]) {
        let saved = std::mem::take(&mut self.locals);

        let function = &self.tree.functions[id.0];
        let parameters: Vec<(&'src str, TypeId)> = function
            .pattern
            .parameters()
            .map(|part| part.name)
            .zip(function.parameter_types.iter().copied())
            .collect();
        for (name, ty) in parameters {
            self.push_local(name, ty, true);
        }

        let statements = self.statements(body);
        let locals = std::mem::replace(&mut self.locals, saved);

        if let FunctionKind::User {
            locals: function_locals,
            body: function_body,
            ..
        } = &mut self.tree.functions[id.0].kind
        {
            *function_locals = locals;
            *function_body = statements;
        }
    }

    fn statements(&mut self, statements: &[ast::Statement<'src>]) -> Vec<Statement> {
        statements
            .iter()
            .filter_map(|statement| self.statement(statement))
            .collect()
    }

    fn statement(&mut self, statement: &ast::Statement<'src>) -> Option<Statement> {
        let checked = match statement {
            ast::Statement::Declaration {
                name,
                type_name,
                location,
            } => {
                let ty = self.resolve_type(type_name, Some(location));
                self.push_local(*name, ty, false);
                return None;
            }
            ast::Statement::Expression(list) => Statement::Expression(self.clause_list(list)),
            ast::Statement::Return(list) => Statement::Return(self.clause_list(list)),
            ast::Statement::If {
                condition,
                then,
                otherwise,
            } => Statement::If {
                condition: self.clause_list(condition),
                then: self.statements(then),
                otherwise: otherwise.as_ref().map(|otherwise| self.statements(otherwise)),
            },
            ast::Statement::While { condition, body } => Statement::While {
                condition: self.clause_list(condition),
                body: self.statements(body),
            },
        };
        Some(checked)
    }

    fn clause_list(&mut self, list: &ClauseList<'src>) -> Expression {
        match list.clauses.as_slice() {
            [clause] => self.clause(clause),
            clauses => {
                let expressions: Vec<Expression> =
                    clauses.iter().map(|clause| self.clause(clause)).collect();
                let ty = expressions.last().map_or(TypeId::NONE, |last| last.ty);
                Expression {
                    kind: ExpressionKind::Sequence(expressions),
                    ty,
                }
            }
        }
    }

    fn clause(&mut self, clause: &Clause<'src>) -> Expression {
        let mut wanted = Vec::with_capacity(clause.parts.len());
        let mut arguments = Vec::new();

        for part in &clause.parts {
            let argument = match part {
                ClausePart::Word(word) => match self.resolve_local(word) {
                    Some(local) => Expression {
                        kind: ExpressionKind::Local(LocalId(local.offset)),
                        ty: local.ty,
                    },
                    None => {
                        wanted.push(Requirement::Word(*word));
                        continue;
                    }
                },
                ClausePart::Literal(literal) => literal_expression(*literal),
                ClausePart::List(list) => self.clause_list(list),
            };
            wanted.push(Requirement::Type(argument.ty));
            arguments.push(argument);
        }

        if clause.parts.len() == 1 && arguments.len() == 1 {
            if let Some(argument) = arguments.pop() {
                return argument;
            }
        }

        if clause.parts.is_empty() {
            // Already reported by the parser.
            return unresolved(arguments);
        }

        // A nested clause that failed to resolve has already been reported.
        if arguments.iter().any(|argument| argument.ty == TypeId::NONE) {
            return unresolved(arguments);
        }

        let Some(id) = self.resolve_function(&wanted, &clause.location) else {
            return unresolved(arguments);
        };

        let function = &self.tree.functions[id.0];
        if matches!(function.kind, FunctionKind::Assign) {
            return self.assignment(arguments, &clause.location);
        }
        Expression {
            kind: ExpressionKind::Call {
                function: id,
                arguments,
            },
            ty: function.return_type,
        }
    }

    fn assignment(&mut self, arguments: Vec<Expression>, location: &Location) -> Expression {
        let mut arguments = arguments.into_iter();
        let (Some(value), Some(target)) = (arguments.next(), arguments.next_back()) else {
            return unresolved(Vec::new());
        };

        let ExpressionKind::Local(target_local) = target.kind else {
            self.diagnostics
                .report(location.clone(), DiagnosticKind::InvalidAssignmentTarget);
            return unresolved(vec![value, target]);
        };

        let placeholder = value.ty == TypeId::NONE || target.ty == TypeId::NONE;
        if value.ty != target.ty && !placeholder {
            self.diagnostics.report(
                location.clone(),
                DiagnosticKind::TypeMismatch {
                    wanted: self.tree.ty(target.ty).name.to_string(),
                    given: self.tree.ty(value.ty).name.to_string(),
                },
            );
        }

        Expression {
            kind: ExpressionKind::Assign {
                target: target_local,
                value: Box::new(value),
            },
            ty: TypeId::INTEGER,
        }
    }

    fn resolve_function(&mut self, wanted: &[Requirement<'src>], location: &Location) -> Option<FunctionId> {
        let found = self
            .tree
            .functions
            .iter()
            .position(|function| self.matches(function, wanted));

        if found.is_none() {
            let pattern = self.pattern_text(wanted);
            self.diagnostics
                .report(location.clone(), DiagnosticKind::UnresolvedFunction(pattern));
        }
        found.map(FunctionId)
    }

    fn matches(&self, function: &Function, wanted: &[Requirement]) -> bool {
        function.pattern.parts.len() == wanted.len()
            && function
                .pattern
                .parts
                .iter()
                .zip(wanted)
                .all(|(part, requirement)| match (requirement, part.type_name) {
                    (Requirement::Type(ty), Some(type_name)) => {
                        same_word(type_name, self.tree.ty(TypeId::ANY).name)
                            || same_word(type_name, self.tree.ty(*ty).name)
                    }
                    (Requirement::Word(word), None) => same_word(part.name, word),
                    _ => false,
                })
    }

    fn pattern_text(&self, wanted: &[Requirement]) -> String {
        wanted
            .iter()
            .map(|requirement| match requirement {
                Requirement::Word(word) => word.to_string(),
                Requirement::Type(ty) => format!("<{}>", self.tree.ty(*ty).name),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn literal_expression(literal: Literal) -> Expression {
    let ty = match literal {
        Literal::Integer(_) => TypeId::INTEGER,
        Literal::Float(_) => TypeId::FLOAT,
        Literal::Boolean(_) => TypeId::BOOLEAN,
    };
    Expression {
        kind: ExpressionKind::Literal(literal),
        ty,
    }
}

fn unresolved(arguments: Vec<Expression>) -> Expression {
    Expression {
        kind: ExpressionKind::Unresolved { arguments },
        ty: TypeId::NONE,
    }
}
