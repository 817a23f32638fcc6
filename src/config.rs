use std::path::PathBuf;
use thiserror::Error;

use crate::trace::TraceLevel;

/// Default limit on evaluation depth and reader nesting. Fits the 2 MiB stack of
/// a spawned thread in a debug build; raise it with `--max-depth` on bigger stacks.
pub const DEFAULT_MAX_DEPTH: usize = 200;

pub const TRACE_ENV: &str = "LAMBDA_TRACE";
pub const MAX_DEPTH_ENV: &str = "LAMBDA_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid trace level '{0}', expected none, lex, eval, prim or 0-3")]
    InvalidTraceLevel(String),
    #[error("invalid maximum depth '{0}', expected a positive integer")]
    InvalidMaxDepth(String),
    #[error("option '{0}' needs a value")]
    MissingValue(String),
    #[error("unknown option '{0}'")]
    UnknownOption(String),
    #[error("unexpected argument '{0}', only one input file is accepted")]
    UnexpectedArgument(String),
}

/// Interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub trace: TraceLevel,
    /// Deepest evaluation (and reader nesting) allowed before `StackExhausted`.
    pub max_depth: usize,
    /// Program file; `None` reads standard input.
    pub input: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trace: TraceLevel::None,
            max_depth: DEFAULT_MAX_DEPTH,
            input: None,
        }
    }
}

fn parse_max_depth(text: &str) -> Result<usize, ConfigError> {
    match text.trim().parse::<usize>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(ConfigError::InvalidMaxDepth(text.to_string())),
    }
}

impl Config {
    pub fn with_trace(mut self, trace: TraceLevel) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads `LAMBDA_TRACE` and `LAMBDA_MAX_DEPTH`, falling back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(trace) = var(TRACE_ENV) {
            self.trace = trace.parse()?;
        }
        if let Some(depth) = var(MAX_DEPTH_ENV) {
            self.max_depth = parse_max_depth(&depth)?;
        }
        Ok(self)
    }

    /// Applies command-line arguments (program name already stripped) on top of `self`:
    /// `--trace LEVEL`, `--max-depth N` and at most one input path.
    pub fn with_args<I, S>(mut self, args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = args.into_iter().map(Into::into);
        // "-" names standard input, which leaves `input` empty
        let mut seen_input = self.input.is_some();
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) if arg.starts_with("--") => {
                    (flag.to_string(), Some(value.to_string()))
                }
                _ => (arg.clone(), None),
            };
            match flag.as_str() {
                "--trace" | "-t" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| ConfigError::MissingValue(flag.clone()))?;
                    self.trace = value.parse()?;
                }
                "--max-depth" => {
                    let value = inline
                        .or_else(|| args.next())
                        .ok_or_else(|| ConfigError::MissingValue(flag.clone()))?;
                    self.max_depth = parse_max_depth(&value)?;
                }
                _ if flag.starts_with('-') && flag != "-" => {
                    return Err(ConfigError::UnknownOption(flag));
                }
                _ => {
                    if seen_input {
                        return Err(ConfigError::UnexpectedArgument(arg));
                    }
                    seen_input = true;
                    if arg != "-" {
                        self.input = Some(PathBuf::from(arg));
                    }
                }
            }
        }
        Ok(self)
    }

    /// Environment first, then the process arguments.
    pub fn from_env_and_args() -> Result<Self, ConfigError> {
        Self::from_env()?.with_args(std::env::args().skip(1))
    }
}
