use std::io;
use std::ops::Range;

use ariadne::{Config, Label, Report, ReportKind, Source};

use crate::{EvalError, ReadError, Span};

type SourceSpan<'a> = (&'a str, Range<usize>);

fn build<'a>(
    source_id: &'a str,
    span: Span,
    message: String,
    label: String,
    color: bool,
) -> Report<'a, SourceSpan<'a>> {
    Report::build(ReportKind::Error, (source_id, span.to_range()))
        .with_config(Config::default().with_color(color))
        .with_message(message)
        .with_label(Label::new((source_id, span.to_range())).with_message(label))
        .finish()
}

impl ReadError {
    pub fn report<'a>(&self, source_id: &'a str, color: bool) -> Report<'a, SourceSpan<'a>> {
        let (message, label) = match self {
            ReadError::Lex(lex_err) => ("Lexer Error".to_string(), lex_err.error.to_string()),
            ReadError::UnexpectedEof(span) if span.start == span.end => (
                "Unexpected EOF".to_string(),
                "expected an expression".to_string(),
            ),
            ReadError::UnexpectedEof(_) => (
                "Unexpected EOF".to_string(),
                "this list is never closed".to_string(),
            ),
            ReadError::UnmatchedClose(_) => (
                "Unexpected ')'".to_string(),
                "no list is open here".to_string(),
            ),
            ReadError::IllegalDot(_) => (
                "Invalid Dot Syntax".to_string(),
                "a dot must sit between the last two elements of a list".to_string(),
            ),
            ReadError::TooDeep { limit, .. } => (
                "Nesting too deep".to_string(),
                format!("more than {} levels of nesting", limit),
            ),
        };
        build(source_id, self.span(), message, label, color)
    }

    pub fn pretty_print(&self, source_id: &str, input: &str) -> io::Result<()> {
        self.report(source_id, true)
            .eprint((source_id, Source::from(input)))
    }
}

impl EvalError {
    /// `span` is the top-level expression that was being evaluated. Read errors
    /// carry their own span and ignore it.
    pub fn report<'a>(
        &self,
        source_id: &'a str,
        span: Span,
        color: bool,
    ) -> Report<'a, SourceSpan<'a>> {
        let label = match self {
            EvalError::Read(read_err) => return read_err.report(source_id, color),
            EvalError::UnboundSymbol(_) => "a symbol here is not defined",
            EvalError::Unevaluable(_) => "this expression cannot be evaluated",
            EvalError::TypeMismatch { .. } => "an argument here has the wrong shape",
            EvalError::StackExhausted(_) => "evaluating this recursed too deeply",
            EvalError::Io(_) => "while evaluating this",
        };
        build(source_id, span, self.to_string(), label.to_string(), color)
    }

    pub fn pretty_print(&self, source_id: &str, input: &str, span: Span) -> io::Result<()> {
        self.report(source_id, span, true)
            .eprint((source_id, Source::from(input)))
    }
}
