mod builtins;
mod classes;
mod condition;
mod config;
mod env;
mod error;
mod eval;
mod generic;
mod interpreter;
mod macros;
mod reader;
mod special_forms;
mod symbol;
mod transfer;
mod value;

use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};

use interpreter::Interpreter;
use value::Value;

/// An ISLISP-family Lisp interpreter core.
#[derive(Parser, Debug)]
#[command(name = "islisp-core")]
#[command(version = config::VERSION)]
#[command(about = "An ISLISP-family Lisp interpreter core")]
struct CliArgs {
    /// Script file to execute (optional - if not provided, starts REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let interp = Interpreter::new();

    if let Some(script_path) = args.script {
        run_script(&script_path, &interp)?;
        return Ok(());
    }

    run_repl(&interp)
}

/// Evaluates every top-level form in `expr`, reporting an unhandled
/// condition to stderr via `report-condition` instead of panicking.
fn eval_source(src: &str, interp: &Rc<Interpreter>) -> Result<Vec<Value>, String> {
    let forms = reader::read_all(src).map_err(|e| e.to_string())?;
    let mut results = Vec::with_capacity(forms.len());
    for form in &forms {
        match eval::eval(form, &interp.global, interp) {
            Ok(v) => results.push(v),
            Err(transfer::Transfer::Condition(c)) => return Err(condition::report_condition(&c)),
            Err(_) => return Err("non-local control transfer escaped top level".to_string()),
        }
    }
    Ok(results)
}

fn run_script(path: &PathBuf, interp: &Rc<Interpreter>) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;
    eval_source(&contents, interp).map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;
    Ok(())
}

fn run_repl(interp: &Rc<Interpreter>) -> Result<(), Box<dyn std::error::Error>> {
    let repl_config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::with_config(repl_config)
        .map_err(|e| format!("failed to initialize REPL: {e}"))?;

    let history_file = ".islisp_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    loop {
        let readline = rl.readline("islisp> ");
        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "(exit)" || trimmed == "(quit)" {
                    break;
                }
                match eval_source(&line, interp) {
                    Ok(results) => {
                        for result in results {
                            println!("=> {result}");
                        }
                    }
                    Err(message) => eprintln!("error: {message}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}
