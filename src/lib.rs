// Declare modules publicly so they are part of the library interface
pub mod config;
pub mod environment;
pub mod evaluator;
pub mod heap;
pub mod interpreter;
pub mod lexer;
pub mod pretty_print;
pub mod primitives;
pub mod printer;
pub mod reader;
pub mod source;
pub mod symbol;
pub mod trace;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{Config, ConfigError};
pub use environment::Environment;
pub use evaluator::{ErrorKind, EvalError, EvalResult};
pub use interpreter::Interpreter;
pub use lexer::{LexError, Token, TokenKind, tokenize};
pub use reader::{ReadError, Reader};
pub use source::Span;
pub use trace::{TraceLevel, Tracer};
pub use types::Value;
