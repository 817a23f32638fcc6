use std::borrow::Cow;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};

use lambda::symbol::sym;
use lambda::{Config, Interpreter, TokenKind, tokenize};

const HISTORY_FILE: &str = "lambda_history.txt";

/// Byte offsets of the parentheses that delimit lists, skipping escaped
/// characters, `|...|` names and comments. The flag is true while a `|` is
/// still open at the end of the input.
fn structural_parens(input: &str) -> (Vec<(usize, char)>, bool) {
    let mut parens = Vec::new();
    let mut chars = input.char_indices();
    let mut in_bars = false;
    while let Some((i, c)) = chars.next() {
        if in_bars {
            if c == '|' {
                in_bars = false;
            }
            continue;
        }
        match c {
            '\\' => {
                chars.next();
            }
            '|' => in_bars = true,
            ';' => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | ')' => parens.push((i, c)),
            _ => {}
        }
    }
    (parens, in_bars)
}

struct LambdaCompleter {
    interp: Rc<RefCell<Interpreter>>,
}

impl rustyline::completion::Completer for LambdaCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]) {
            Ok(tokens) => match tokens.last() {
                Some(token) if token.span.end == pos => match &token.kind {
                    TokenKind::Symbol(prefix) => prefix.to_lowercase(),
                    _ => return Ok((pos, vec![])),
                },
                _ => return Ok((pos, vec![])),
            },
            Err(_) => return Ok((pos, vec![])),
        };
        let interp = self.interp.borrow();
        let mut names = interp.bound_names();
        for form in sym::SPECIAL_FORMS {
            names.push(interp.symbols().name(form).to_string());
        }
        names.sort();
        names.dedup();
        let candidates = names
            .into_iter()
            .filter(|name| name.starts_with(&prefix) && name.len() > prefix.len())
            .map(|name| name[prefix.len()..].to_string())
            .collect();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputValidator {
    #[rustyline(Validator)]
    validator: LambdaValidator,
    #[rustyline(Highlighter)]
    highlighter: LambdaHighlighter,
    #[rustyline(Completer)]
    completer: LambdaCompleter,
}

struct LambdaValidator;

impl Validator for LambdaValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let (parens, open_bar) = structural_parens(ctx.input());
        let mut depth = 0usize;
        for (i, c) in parens {
            if c == '(' {
                depth += 1;
            } else if depth == 0 {
                return Ok(ValidationResult::Invalid(Some(format!(
                    "  - Unmatched ')' at position {}",
                    i
                ))));
            } else {
                depth -= 1;
            }
        }
        if depth > 0 || open_bar {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct LambdaHighlighter;

impl Highlighter for LambdaHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        let (parens, _) = structural_parens(line);
        let mut stack: Vec<usize> = Vec::new();
        let mut matched: Vec<usize> = Vec::new();
        let mut unmatched: Vec<usize> = Vec::new();
        for (i, c) in parens {
            if c == '(' {
                stack.push(i);
            } else if let Some(open) = stack.pop() {
                // Highlight the pair the cursor sits next to.
                if [open, i].iter().any(|&p| p == pos || p + 1 == pos) {
                    matched.extend([open, i]);
                }
            } else {
                unmatched.push(i);
            }
        }
        if matched.is_empty() && unmatched.is_empty() {
            return Cow::Borrowed(line);
        }

        let mut highlighted = String::with_capacity(line.len() + 16);
        for (i, c) in line.char_indices() {
            if matched.contains(&i) {
                highlighted.push_str(&format!("\x1b[1;34m{}\x1b[0m", c)); // Blue for matching parens
            } else if unmatched.contains(&i) {
                highlighted.push_str(&format!("\x1b[31m{}\x1b[0m", c)); // Red for unmatched closing parens
            } else {
                highlighted.push(c);
            }
        }
        Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

/// Evaluates every expression on `line` in turn, printing each result.
/// Stops at the first error.
fn eval_line(interp: &Rc<RefCell<Interpreter>>, line: &str) {
    let mut interp = interp.borrow_mut();
    interp.reset(line);
    while interp.has_more() {
        let result = interp.interpret();
        let _ = interp.flush();
        match result {
            Ok(printed) => println!("{}", printed),
            Err(e) => {
                let span = interp.last_span().unwrap_or_default();
                if e.pretty_print("REPL", line, span).is_err() {
                    eprintln!("Error: {}", e);
                }
                break;
            }
        }
    }
}

fn main() -> rustyline::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    println!("lambda REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Ignoring environment settings: {}", e);
        Config::default()
    });
    let interp = Rc::new(RefCell::new(Interpreter::with_config(
        "",
        Box::new(io::stdout()),
        &config,
    )));
    let h = InputValidator {
        highlighter: LambdaHighlighter,
        validator: LambdaValidator,
        completer: LambdaCompleter {
            interp: interp.clone(),
        },
    };
    let editor_config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(editor_config)?;
    rl.set_helper(Some(h));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("lambda> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let trimmed_input = line.trim();
                if trimmed_input.is_empty() {
                    continue;
                }
                if trimmed_input.eq_ignore_ascii_case("exit") {
                    break;
                }
                eval_line(&interp, &line);
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}
