use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use teddy::ast::{Function, Value};
use teddy::evaluator::{self, Environment};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
Commands: :help  :env  :quit (or :exit, Ctrl+C, Ctrl+D)
Each line is an implicit S-expression; ; starts a comment.
Examples:
  + 1 2.5
  def {add} (\\ {a b} {+ a b})
  (add 3) 4
  if (> 2 1) {head {1 2}} {0}";

fn main() -> rustyline::Result<()> {
    // RUST_LOG=teddy=trace shows every call
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    println!("Teddy Lisp. Type :help for commands.");

    let mut rl = DefaultEditor::new()?;
    let env = evaluator::create_global_env();

    loop {
        let line = match rl.readline("teddy> ") {
            Ok(line) => line,
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => return Err(err),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        rl.add_history_entry(line)?;

        match line {
            ":help" => println!("{HELP}"),
            ":env" => print_environment(&env),
            ":quit" | ":exit" => break,
            _ => match teddy::run(&env, line) {
                Ok(result) => println!("{result}"),
                Err(e) => println!("{e}"),
            },
        }
    }
    Ok(())
}

/// User bindings with their values, builtins by name only
fn print_environment(env: &Environment) {
    let (builtins, user): (Vec<_>, Vec<_>) = env
        .get_all_bindings()
        .into_iter()
        .partition(|(_, value)| matches!(value, Value::Function(Function::Builtin(_))));

    let names: Vec<String> = builtins.into_iter().map(|(name, _)| name).collect();
    println!("builtins: {}", names.join(" "));
    for (name, value) in user {
        println!("{name} = {value}");
    }
}
