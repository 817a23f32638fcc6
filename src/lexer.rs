use logos::Logos;
use std::fmt;
use thiserror::Error;

use crate::Span;

/// Longest symbol name kept, plus one. Longer names are cut to `SYMBOL_MAX - 1` characters.
pub const SYMBOL_MAX: usize = 32;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")] // Skip whitespace
#[logos(skip r";[^\n]*")] // Skip comments
#[logos(error = LexErrorKind)]
pub enum TokenKind {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(".", priority = 3)]
    Dot,
    #[token("'")]
    Quote,
    // Anything up to whitespace, a paren, a quote or a comment. A backslash makes
    // the next character part of the name whatever it is, and `|...|` takes
    // everything up to the closing bar literally.
    #[regex(r"([^ \t\n\r();'\\|]|\\[\s\S]|\|[^|]*\|)+", |lex| symbol_text(lex.slice()))]
    Symbol(String),
}

/// Removes escapes and bars and applies the length cap.
fn symbol_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    let mut kept = 0;
    let mut in_bars = false;
    while let Some(c) = chars.next() {
        let c = match c {
            '|' => {
                in_bars = !in_bars;
                continue;
            }
            '\\' if !in_bars => match chars.next() {
                Some(escaped) => escaped,
                None => break,
            },
            c => c,
        };
        if kept < SYMBOL_MAX - 1 {
            text.push(c);
            kept += 1;
        }
    }
    text
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Quote => write!(f, "'"),
            TokenKind::Symbol(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Default, Debug, Clone, PartialEq, Error)]
pub enum LexErrorKind {
    // The symbol rule accepts every other character, so the only ways to fail are
    // a backslash with nothing after it and a '|' that is never closed.
    #[default]
    #[error("dangling '\\' or unterminated '|' in symbol")]
    InvalidEscape,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{error}")]
pub struct LexError {
    pub error: LexErrorKind,
    pub span: Span,
}

// Result type alias for convenience
pub type LexResult<T> = Result<T, LexError>;

/// Lexes the first token of `input`, returning it together with the number of
/// bytes consumed (skipped whitespace and comments included).
/// `Ok(None)` means only whitespace and comments were left.
pub fn next_token(input: &str) -> LexResult<Option<(Token, usize)>> {
    let mut lexer = TokenKind::lexer(input);
    match lexer.next() {
        None => Ok(None),
        Some(result) => {
            let range = lexer.span();
            let span = Span::new(range.start, range.end);
            match result {
                Ok(kind) => Ok(Some((Token { kind, span }, range.end))),
                Err(error) => Err(LexError { error, span }),
            }
        }
    }
}

// Helper function to tokenize a string directly (useful for tests, the REPL and benches)
pub fn tokenize(input: &str) -> LexResult<Vec<Token>> {
    TokenKind::lexer(input)
        .spanned()
        .map(|(result, range)| {
            let span = Span::new(range.start, range.end);
            match result {
                Ok(kind) => Ok(Token { kind, span }),
                Err(error) => Err(LexError { error, span }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol(s: &str) -> TokenKind {
        TokenKind::Symbol(s.to_string())
    }

    // Helper to simplify testing token sequences
    fn assert_tokens(input: &str, expected: Vec<TokenKind>) {
        match tokenize(input) {
            Ok(tokens) => {
                let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
                assert_eq!(kinds, expected, "Input: '{}'", input);
            }
            Err(e) => panic!("Lexing failed for input '{}': {}", input, e),
        }
    }

    #[test]
    fn test_empty_input() {
        assert_tokens("", vec![]);
        assert_tokens("  \t\r\n ", vec![]);
    }

    #[test]
    fn test_parentheses_and_quote() {
        assert_tokens("()", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens("( )", vec![TokenKind::LParen, TokenKind::RParen]);
        assert_tokens(" ' ", vec![TokenKind::Quote]);
        assert_tokens(
            "'(a)",
            vec![
                TokenKind::Quote,
                TokenKind::LParen,
                symbol("a"),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_symbols() {
        assert_tokens("foo", vec![symbol("foo")]);
        assert_tokens("pair?", vec![symbol("pair?")]);
        assert_tokens("+", vec![symbol("+")]);
        assert_tokens("123", vec![symbol("123")]);
        assert_tokens("#<foo>", vec![symbol("#<foo>")]);
        assert_tokens("a'b", vec![symbol("a"), TokenKind::Quote, symbol("b")]);
    }

    #[test]
    fn test_dot() {
        assert_tokens(".", vec![TokenKind::Dot]);
        assert_tokens(
            " a . b ",
            vec![symbol("a"), TokenKind::Dot, symbol("b")],
        );
        assert_tokens("sym.bol", vec![symbol("sym.bol")]);
        assert_tokens("...", vec![symbol("...")]);
    }

    #[test]
    fn test_escapes() {
        assert_tokens(r"\(", vec![symbol("(")]);
        assert_tokens(r"\'a", vec![symbol("'a")]);
        assert_tokens(r"a\ b", vec![symbol("a b")]);
        assert_tokens(r"\.", vec![symbol(".")]);
        assert_tokens(r"\;x", vec![symbol(";x")]);
        assert_tokens(r"\\", vec![symbol("\\")]);
        assert_tokens(
            r"(\( b)",
            vec![
                TokenKind::LParen,
                symbol("("),
                symbol("b"),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_bar_quoting() {
        assert_tokens("|(|", vec![symbol("(")]);
        assert_tokens("|a b|c", vec![symbol("a bc")]);
        assert_tokens(r"|a\|", vec![symbol(r"a\")]);
        assert_tokens("||", vec![symbol("")]);
        assert_tokens(
            "(|'a| b)",
            vec![
                TokenKind::LParen,
                symbol("'a"),
                symbol("b"),
                TokenKind::RParen,
            ],
        );
    }

    #[test]
    fn test_comments() {
        let input = "
            (car x) ; take the car
            ; Another comment line
              y  ; trailing
              ; Final comment";
        assert_tokens(
            input,
            vec![
                TokenKind::LParen,
                symbol("car"),
                symbol("x"),
                TokenKind::RParen,
                symbol("y"),
            ],
        );
        assert_tokens("; only comment", vec![]);
        assert_tokens(";", vec![]);
        assert_tokens("token;comment", vec![symbol("token")]);
    }

    #[test]
    fn test_symbol_length_cap() {
        let long = "a".repeat(40);
        let tokens = tokenize(&long).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, symbol(&"a".repeat(SYMBOL_MAX - 1)));
        // the whole run is consumed, not just the kept prefix
        assert_eq!(tokens[0].span, Span::new(0, 40));

        let capped = "b".repeat(SYMBOL_MAX - 1);
        assert_tokens(&capped, vec![symbol(&capped)]);
    }

    #[test]
    fn test_invalid_escapes() {
        let err = tokenize("abc \\").unwrap_err();
        assert_eq!(err.error, LexErrorKind::InvalidEscape);
        assert_eq!(err.span, Span::new(4, 5));

        let err = tokenize("(|abc").unwrap_err();
        assert_eq!(err.error, LexErrorKind::InvalidEscape);
    }

    #[test]
    fn test_next_token_reports_consumed_length() {
        let (token, used) = next_token("  ; c\n foo bar").unwrap().unwrap();
        assert_eq!(token.kind, symbol("foo"));
        assert_eq!(token.span, Span::new(7, 10));
        assert_eq!(used, 10);
        assert_eq!(next_token("   ; nothing").unwrap(), None);
    }

    #[test]
    fn test_tokenize_spans() {
        let tokens = tokenize("(car x)").expect("Should tokenize successfully");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].span, Span::new(0, 1));
        assert_eq!(tokens[1].span, Span::new(1, 4));
        assert_eq!(tokens[2].span, Span::new(5, 6));
        assert_eq!(tokens[3].span, Span::new(6, 7));
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::LParen.to_string(), "(");
        assert_eq!(TokenKind::Dot.to_string(), ".");
        assert_eq!(symbol("abc").to_string(), "abc");
    }
}
