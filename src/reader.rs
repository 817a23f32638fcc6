use thiserror::Error;

use crate::Span;
use crate::config::DEFAULT_MAX_DEPTH;
use crate::heap::Heap;
use crate::lexer::{self, LexError, Token, TokenKind};
use crate::symbol::{SymbolTable, sym};
use crate::trace::{TraceLevel, Tracer};
use crate::types::Value;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReadError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("cannot read list, missing ')'?")]
    UnexpectedEof(Span),
    #[error("unexpected ')'")]
    UnmatchedClose(Span),
    #[error("illegal dotted list")]
    IllegalDot(Span),
    #[error("expression nested deeper than {limit} levels")]
    TooDeep { limit: usize, span: Span },
}

impl ReadError {
    pub fn span(&self) -> Span {
        match self {
            ReadError::Lex(err) => err.span,
            ReadError::UnexpectedEof(span)
            | ReadError::UnmatchedClose(span)
            | ReadError::IllegalDot(span)
            | ReadError::TooDeep { span, .. } => *span,
        }
    }
}

// Result type alias for convenience
pub type ReadResult<T> = Result<T, ReadError>;

/// Reads expressions one at a time from an input text, remembering how far it got,
/// so that a later read (the `read` primitive) continues after the last expression.
#[derive(Debug, Clone)]
pub struct Reader {
    source: String,
    pos: usize,
    max_depth: usize,
}

impl Reader {
    pub fn new(source: impl Into<String>) -> Self {
        Reader {
            source: source.into(),
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replaces the input and rewinds to its start.
    pub fn reset(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.pos = 0;
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte offset just after the last token consumed.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Whether anything but whitespace and comments is left. A lexing error
    /// counts as input, so the next read reports it.
    pub fn has_more(&self) -> bool {
        !matches!(lexer::next_token(&self.source[self.pos..]), Ok(None))
    }

    /// Reads the next top-level expression, interning its symbols and allocating its
    /// pairs. Returns the value and the span of text it came from.
    pub fn read(
        &mut self,
        symbols: &mut SymbolTable,
        heap: &mut Heap,
        tracer: &mut Tracer,
    ) -> ReadResult<(Value, Span)> {
        let mut parser = Parser {
            reader: self,
            symbols,
            heap,
            tracer,
        };
        let token = parser.next_token()?;
        parser.parse_expr_with_token(token, 0)
    }
}

/// Parsing state for one top-level read.
struct Parser<'a> {
    reader: &'a mut Reader,
    symbols: &'a mut SymbolTable,
    heap: &'a mut Heap,
    tracer: &'a mut Tracer,
}

impl Parser<'_> {
    // Consumes the next token if available.
    fn next_token(&mut self) -> ReadResult<Option<Token>> {
        let start = self.reader.pos;
        match lexer::next_token(&self.reader.source[start..]) {
            Ok(Some((token, used))) => {
                self.reader.pos = start + used;
                if self.tracer.enabled(TraceLevel::Lex) {
                    self.tracer
                        .line(0, format_args!("*** token |{}|", token.kind));
                }
                Ok(Some(Token {
                    kind: token.kind,
                    span: token.span.offset(start),
                }))
            }
            Ok(None) => {
                self.reader.pos = self.reader.source.len();
                Ok(None)
            }
            Err(err) => Err(LexError {
                error: err.error,
                span: err.span.offset(start),
            }
            .into()),
        }
    }

    fn eof_span(&self) -> Span {
        let end = self.reader.source.len();
        Span::new(end, end)
    }

    /// Parses a single expression starting with `token`.
    fn parse_expr_with_token(
        &mut self,
        token: Option<Token>,
        depth: usize,
    ) -> ReadResult<(Value, Span)> {
        let Some(token) = token else {
            return Err(ReadError::UnexpectedEof(self.eof_span()));
        };
        if depth > self.reader.max_depth {
            return Err(ReadError::TooDeep {
                limit: self.reader.max_depth,
                span: token.span,
            });
        }
        match token.kind {
            TokenKind::LParen => self.parse_list(token.span, depth + 1),
            TokenKind::RParen => Err(ReadError::UnmatchedClose(token.span)),
            TokenKind::Dot => Err(ReadError::IllegalDot(token.span)),
            TokenKind::Quote => self.parse_quoted_expr(token.span, depth + 1),
            TokenKind::Symbol(name) => match self.symbols.intern(&name) {
                sym::NIL => Ok((Value::Nil, token.span)),
                symbol => Ok((Value::Symbol(symbol), token.span)),
            },
        }
    }

    fn parse_expr(&mut self, depth: usize) -> ReadResult<(Value, Span)> {
        let token = self.next_token()?;
        self.parse_expr_with_token(token, depth)
    }

    /// Parses the elements of a list whose `(` has been consumed, up to and including
    /// the matching `)`. `(a b . c)` ends the chain with `c` instead of nil.
    fn parse_list(&mut self, open: Span, depth: usize) -> ReadResult<(Value, Span)> {
        let mut elements = Vec::new();
        let (tail, close) = loop {
            match self.next_token()? {
                None => {
                    return Err(ReadError::UnexpectedEof(open.merge(self.eof_span())));
                }
                Some(Token {
                    kind: TokenKind::RParen,
                    span,
                }) => break (Value::Nil, span),
                Some(Token {
                    kind: TokenKind::Dot,
                    span,
                }) => {
                    if elements.is_empty() {
                        return Err(ReadError::IllegalDot(span));
                    }
                    let (tail, _) = self.parse_expr(depth)?;
                    match self.next_token()? {
                        Some(Token {
                            kind: TokenKind::RParen,
                            span: close,
                        }) => break (tail, close),
                        Some(extra) => return Err(ReadError::IllegalDot(span.merge(extra.span))),
                        None => {
                            return Err(ReadError::UnexpectedEof(open.merge(self.eof_span())));
                        }
                    }
                }
                token => {
                    let (element, _) = self.parse_expr_with_token(token, depth)?;
                    elements.push(element);
                }
            }
        };
        let list = elements
            .into_iter()
            .rev()
            .fold(tail, |rest, first| self.heap.cons(first, rest));
        Ok((list, open.merge(close)))
    }

    /// `'expr` reads as `(quote expr)`.
    fn parse_quoted_expr(&mut self, quote: Span, depth: usize) -> ReadResult<(Value, Span)> {
        let (quoted, span) = self.parse_expr(depth)?;
        let list = self.heap.list(&[Value::Symbol(sym::QUOTE), quoted]);
        Ok((list, quote.merge(span)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LexErrorKind;
    use crate::printer::Printer;
    use crate::testing::Capture;
    use std::io;

    struct Fixture {
        symbols: SymbolTable,
        heap: Heap,
        tracer: Tracer,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                symbols: SymbolTable::new(),
                heap: Heap::new(),
                tracer: Tracer::new(TraceLevel::None, Box::new(io::sink())),
            }
        }

        fn read(&mut self, reader: &mut Reader) -> ReadResult<(Value, Span)> {
            reader.read(&mut self.symbols, &mut self.heap, &mut self.tracer)
        }

        fn print(&self, value: Value) -> String {
            Printer::new(&self.heap, &self.symbols).print(value)
        }

        // Structural equality over acyclic values
        fn same_shape(&self, a: Value, b: Value) -> bool {
            match (a, b) {
                (Value::Pair(x), Value::Pair(y)) => {
                    self.same_shape(self.heap.first(x), self.heap.first(y))
                        && self.same_shape(self.heap.rest(x), self.heap.rest(y))
                }
                _ => a == b,
            }
        }
    }

    // Helper for asserting successful reads by their printed form
    fn assert_read(input: &str, expected: &str) {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new(input);
        match fixture.read(&mut reader) {
            Ok((value, _)) => assert_eq!(fixture.print(value), expected, "Input: '{}'", input),
            Err(e) => panic!("Reading failed for input '{}': {}", input, e),
        }
    }

    // Helper for asserting read errors, comparing variants only
    fn assert_read_error(input: &str, expected_error_variant: ReadError) {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new(input);
        match fixture.read(&mut reader) {
            Ok((value, _)) => panic!(
                "Expected reading to fail for input '{}', but got: {}",
                input,
                fixture.print(value)
            ),
            Err(e) => assert_eq!(
                std::mem::discriminant(&e),
                std::mem::discriminant(&expected_error_variant),
                "Input: '{}', Expected error variant like {:?}, got: {:?}",
                input,
                expected_error_variant,
                e
            ),
        }
    }

    #[test]
    fn test_read_atoms() {
        assert_read("symbol", "symbol");
        assert_read("  pair?  ", "pair?");
        assert_read("()", "nil");
        assert_read("( )", "nil");
    }

    #[test]
    fn test_read_lists() {
        assert_read("(a b c)", "(a b c)");
        assert_read("(a (b c) d)", "(a (b c) d)");
        assert_read("(()())", "(nil nil)");
        assert_read("((a))", "((a))");
    }

    #[test]
    fn test_read_quote_sugar() {
        assert_read("'a", "(quote a)");
        assert_read("'(a b c)", "(quote (a b c))");
        assert_read("'('a b c)", "(quote ((quote a) b c))");
        assert_read("''a", "(quote (quote a))");
    }

    #[test]
    fn test_read_dotted() {
        assert_read("(a . b)", "(a . b)");
        assert_read("(a b c . d)", "(a b c . d)");
        assert_read("(a . (b . (c . d)))", "(a b c . d)");
        assert_read("((a b) . (c d))", "((a b) c d)");
        assert_read("(a . ())", "(a)");
    }

    #[test]
    fn test_read_escapes() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new(r"(\( b)");
        let (list, _) = fixture.read(&mut reader).unwrap();
        let items: Vec<Value> = fixture.heap.iter(list).collect();
        assert_eq!(items.len(), 2);
        let paren = fixture.symbols.lookup("(").expect("'(' must be interned");
        assert_eq!(items[0], Value::Symbol(paren));
        assert_eq!(fixture.print(list), "(|(| b)");

        assert_read(r"(\'a b c)", "(|'a| b c)");
        assert_read(r"(a \. b)", "(a |.| b)");
    }

    #[test]
    fn test_read_is_case_insensitive() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new("(Foo FOO foo)");
        let (list, _) = fixture.read(&mut reader).unwrap();
        let items: Vec<Value> = fixture.heap.iter(list).collect();
        assert_eq!(items[0], items[1]);
        assert_eq!(items[1], items[2]);
    }

    #[test]
    fn test_overlong_names_share_a_handle() {
        let prefix = "x".repeat(40);
        let input = format!("({}aaa {}bbb)", prefix, prefix);
        let mut fixture = Fixture::new();
        let mut reader = Reader::new(input);
        let (list, _) = fixture.read(&mut reader).unwrap();
        let items: Vec<Value> = fixture.heap.iter(list).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], items[1]);
    }

    #[test]
    fn test_read_errors() {
        assert_read_error("(a b", ReadError::UnexpectedEof(Span::default()));
        assert_read_error("(", ReadError::UnexpectedEof(Span::default()));
        assert_read_error("", ReadError::UnexpectedEof(Span::default()));
        assert_read_error("  ; just a comment", ReadError::UnexpectedEof(Span::default()));
        assert_read_error("'", ReadError::UnexpectedEof(Span::default()));
        assert_read_error(")", ReadError::UnmatchedClose(Span::default()));
        assert_read_error("(')", ReadError::UnmatchedClose(Span::default()));
        assert_read_error("(a b . c d)", ReadError::IllegalDot(Span::default()));
        assert_read_error("(. a)", ReadError::IllegalDot(Span::default()));
        assert_read_error(".", ReadError::IllegalDot(Span::default()));
    }

    #[test]
    fn test_error_spans() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new("\n\n  )  \n\n");
        let err = fixture.read(&mut reader).unwrap_err();
        assert_eq!(err, ReadError::UnmatchedClose(Span::new(4, 5)));

        let mut reader = Reader::new("(a b");
        let err = fixture.read(&mut reader).unwrap_err();
        assert_eq!(err.span(), Span::new(0, 4));

        let mut reader = Reader::new("(a \\");
        let err = fixture.read(&mut reader).unwrap_err();
        assert_eq!(
            err,
            ReadError::Lex(LexError {
                error: LexErrorKind::InvalidEscape,
                span: Span::new(3, 4),
            })
        );
    }

    #[test]
    fn test_sequential_reads_continue_after_last_expression() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new("(a b) c ; trailing\n (d)");
        let (first, span) = fixture.read(&mut reader).unwrap();
        assert_eq!(fixture.print(first), "(a b)");
        assert_eq!(span, Span::new(0, 5));
        assert_eq!(reader.position(), 5);
        assert!(reader.has_more());

        let (second, _) = fixture.read(&mut reader).unwrap();
        assert_eq!(fixture.print(second), "c");
        let (third, _) = fixture.read(&mut reader).unwrap();
        assert_eq!(fixture.print(third), "(d)");
        assert!(!reader.has_more());
    }

    #[test]
    fn test_reset() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new("a");
        fixture.read(&mut reader).unwrap();
        assert!(!reader.has_more());
        reader.reset("b");
        assert_eq!(reader.source(), "b");
        let (value, _) = fixture.read(&mut reader).unwrap();
        assert_eq!(fixture.print(value), "b");
    }

    #[test]
    fn test_nesting_limit() {
        let mut fixture = Fixture::new();
        let deep = format!("{}{}", "(".repeat(20), ")".repeat(20));
        let mut reader = Reader::new(deep.clone()).with_max_depth(10);
        let err = fixture.read(&mut reader).unwrap_err();
        assert!(matches!(err, ReadError::TooDeep { limit: 10, .. }));

        let mut reader = Reader::new(deep).with_max_depth(30);
        assert!(fixture.read(&mut reader).is_ok());
    }

    #[test]
    fn test_token_trace() {
        let capture = Capture::default();
        let mut fixture = Fixture::new();
        fixture.tracer = Tracer::new(TraceLevel::Lex, Box::new(capture.clone()));
        let mut reader = Reader::new("(a \\( )");
        fixture.read(&mut reader).unwrap();
        assert_eq!(
            capture.contents(),
            "*** token |(|\n*** token |a|\n*** token |(|\n*** token |)|\n"
        );
    }

    #[test]
    fn test_round_trip() {
        for input in [
            "(a b c)",
            "(a . b)",
            "(a b . c)",
            "((a . b) (c d) . e)",
            "(quote (x y))",
            r"(\( \) \' \; a\ b)",
            "(a ())",
            "(() . a)",
            "(a . nil)",
            "(nil NIL . |nil|)",
        ] {
            let mut fixture = Fixture::new();
            let mut reader = Reader::new(input);
            let (value, _) = fixture.read(&mut reader).unwrap();
            let printed = fixture.print(value);

            let mut again = Reader::new(printed.clone());
            let (reread, _) = fixture.read(&mut again).unwrap();
            assert_eq!(fixture.print(reread), printed, "Input: '{}'", input);
            assert!(fixture.same_shape(value, reread), "Input: '{}'", input);
        }
    }

    #[test]
    fn test_nil_reads_as_empty_list() {
        let mut fixture = Fixture::new();
        let mut reader = Reader::new("nil NIL |nil| () ( )");
        for _ in 0..5 {
            let (value, _) = fixture.read(&mut reader).unwrap();
            assert_eq!(value, Value::Nil);
        }
        assert_read("(a . nil)", "(a)");
        assert_read("(nil)", "(nil)");
        assert_read("'nil", "(quote nil)");
    }
}
