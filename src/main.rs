use std::env;
use std::fs;
use std::process::ExitCode;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rlox::Lox;

const EXIT_USAGE: u8 = 64;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: rlox [script]");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Could not read '{path}': {error}");
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let mut lox = Lox::new();
    ExitCode::from(lox.run(&source) as u8)
}

fn run_prompt() -> ExitCode {
    let mut lox = Lox::new();
    let mut editor = DefaultEditor::new().expect("terminal line editor to initialize");

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                if line.trim() == "exit()" {
                    break;
                }
                let _ = editor.add_history_entry(line.as_str());
                lox.run_repl_line(&line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(error) => {
                eprintln!("Readline error: {error}");
                break;
            }
        }
    }

    ExitCode::SUCCESS
}
