use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use crate::config::ConfigError;

/// How much the interpreter reports about its own work. Each level includes
/// everything the lower levels report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum TraceLevel {
    #[default]
    None,
    /// Every token the reader consumes.
    Lex,
    /// Every evaluation step, with its expression and environment.
    Eval,
    /// Every primitive invocation, with its arguments.
    Prim,
}

impl FromStr for TraceLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "0" => Ok(TraceLevel::None),
            "lex" | "1" => Ok(TraceLevel::Lex),
            "eval" | "2" => Ok(TraceLevel::Eval),
            "prim" | "3" => Ok(TraceLevel::Prim),
            _ => Err(ConfigError::InvalidTraceLevel(s.to_string())),
        }
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceLevel::None => "none",
            TraceLevel::Lex => "lex",
            TraceLevel::Eval => "eval",
            TraceLevel::Prim => "prim",
        };
        write!(f, "{}", name)
    }
}

/// Writes trace lines to a diagnostic stream kept apart from program output.
/// Tracing is observational only: write failures are dropped.
pub struct Tracer {
    level: TraceLevel,
    sink: Box<dyn Write>,
}

impl Tracer {
    pub fn new(level: TraceLevel, sink: Box<dyn Write>) -> Self {
        Tracer { level, sink }
    }

    pub fn stderr(level: TraceLevel) -> Self {
        Tracer::new(level, Box::new(io::stderr()))
    }

    pub fn level(&self) -> TraceLevel {
        self.level
    }

    #[inline]
    pub fn enabled(&self, level: TraceLevel) -> bool {
        level != TraceLevel::None && self.level >= level
    }

    /// Writes one line indented two spaces per evaluation depth.
    pub fn line(&mut self, depth: usize, args: fmt::Arguments<'_>) {
        let _ = writeln!(self.sink, "{:width$}{}", "", args, width = depth * 2);
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer").field("level", &self.level).finish()
    }
}
