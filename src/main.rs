use clap::Parser;
use rill::config;
use rill::env::Environment;
use rill::eval::Evaluator;
use rill::frontend;
use rill::highlighter::ReplHelper;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::path::{Path, PathBuf};

/// Interpreter for the Rill scripting language
#[derive(Parser, Debug)]
#[command(name = "rill")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter for the Rill scripting language")]
struct CliArgs {
    /// Script file to evaluate (starts the REPL when omitted)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    match args.script {
        Some(path) => run_file(&path),
        None => run_repl(),
    }
}

/// Evaluates a source file end-to-end. Unreadable files and parse errors
/// exit non-zero; a runtime error prints with its `ERROR: ` prefix and the
/// process still exits normally.
fn run_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let path = absolutize(path)?;

    let program = match frontend::build(&path) {
        Ok(program) => program,
        Err(diagnostics) => {
            for diagnostic in &diagnostics {
                eprintln!("\t{}", diagnostic);
            }
            std::process::exit(1);
        }
    };

    let env = Environment::new();
    let module_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut evaluator = Evaluator::new(module_dir);
    // The entry file is itself a module; seeding the cache lets a script
    // importing its own path resolve to the running module.
    evaluator.register_module(path, env.clone());

    let result = evaluator.eval_program(&program, &env);
    if result.is_error() {
        eprintln!("\t{}", result);
    }
    Ok(())
}

fn run_repl() -> Result<(), Box<dyn std::error::Error>> {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::with_config(rl_config)
        .map_err(|err| format!("failed to initialize the REPL: {}", err))?;
    rl.set_helper(Some(ReplHelper::new()));
    let _ = rl.load_history(config::HISTORY_FILE);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);
    println!("{}", config::WELCOME_FOOTER);

    // One environment and one evaluator for the whole session, so bindings
    // and the module cache persist across lines.
    let env = Environment::new();
    let module_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut evaluator = Evaluator::new(module_dir);

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                match frontend::parse(&line) {
                    Ok(program) => {
                        let result = evaluator.eval_program(&program, &env);
                        println!("{}", result);
                    }
                    Err(diagnostics) => {
                        for diagnostic in &diagnostics {
                            eprintln!("\t{}", diagnostic);
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
    Ok(())
}

fn absolutize(path: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
