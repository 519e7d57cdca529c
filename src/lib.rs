pub mod ast;
pub mod bytecode;
pub mod checker;
pub mod compiler;
pub mod corpus;
pub mod diagnostic;
pub mod numbers;
pub mod parser;
pub mod pronoun;
pub mod span;
pub mod tokenizer;
pub mod tree;
pub mod vm;
