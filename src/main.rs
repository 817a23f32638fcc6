use std::io::{self, Read};
use std::process::ExitCode;
use std::{fs, thread};

use lambda::{Config, EvalError, Interpreter};

// Deep recursion in the interpreter runs on this thread, not the main one.
const STACK_SIZE: usize = 256 * 1024 * 1024;

fn read_input(config: &Config) -> io::Result<(String, String)> {
    match &config.input {
        Some(path) => Ok((path.display().to_string(), fs::read_to_string(path)?)),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(("stdin".to_string(), text))
        }
    }
}

/// Reads one expression, evaluates it and prints the result.
fn run(config: Config) -> ExitCode {
    let (source_id, input) = match read_input(&config) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: cannot read input: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut interp = Interpreter::with_config(input.clone(), Box::new(io::stdout()), &config);
    let result = interp.interpret();
    let result = result.and_then(|printed| {
        interp.flush()?;
        Ok(printed)
    });
    match result {
        Ok(printed) => {
            println!("{}", printed);
            ExitCode::SUCCESS
        }
        Err(e) => {
            // Any partial `write` output goes out before the report.
            let _ = interp.flush();
            report(&e, &source_id, &input, &interp);
            ExitCode::FAILURE
        }
    }
}

fn report(err: &EvalError, source_id: &str, input: &str, interp: &Interpreter) {
    let span = interp.last_span().unwrap_or_default();
    if err.pretty_print(source_id, input, span).is_err() {
        eprintln!("Error: {}", err);
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match Config::from_env_and_args() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("usage: lambda [--trace none|lex|eval|prim] [--max-depth N] [FILE]");
            return ExitCode::FAILURE;
        }
    };
    log::debug!("starting with {:?}", config);

    let worker = thread::Builder::new()
        .stack_size(STACK_SIZE)
        .spawn(move || run(config));
    match worker.map(|handle| handle.join()) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => {
            eprintln!("Error: interpreter thread panicked");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: cannot start interpreter thread: {}", e);
            ExitCode::FAILURE
        }
    }
}
