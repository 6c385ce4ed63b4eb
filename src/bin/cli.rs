//! OpalDB - interactive CLI

use std::io::{self, BufRead, Write};

use tracing_subscriber::EnvFilter;

use opaldb::Engine;

/// Print welcome banner
fn print_banner() {
    println!(
        r#"
  ___                   _  ____   ____
 / _ \  _ __    __ _  | ||  _ \ | __ )
| | | || '_ \  / _` | | || | | ||  _ \
| |_| || |_) || (_| | | || |_| || |_) |
 \___/ | .__/  \__,_| |_||____/ |____/
       |_|

 An embedded SQL database engine in Rust
 Statements end with ';'. Type 'exit' to quit, 'history' to list input.
"#
    );
}

/// Main REPL loop: accumulate lines until a terminating semicolon, keep
/// per-session history, and ignore blank lines between statements.
fn run_repl(mut engine: Engine) -> io::Result<()> {
    print_banner();

    let stdin = io::stdin();
    let mut history: Vec<String> = Vec::new();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "opaldb> " } else { "   ...> " };
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let trimmed = line.trim();

        if buffer.is_empty() {
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.eq_ignore_ascii_case("exit") {
                break;
            }
            if trimmed.eq_ignore_ascii_case("history") {
                for (i, entry) in history.iter().enumerate() {
                    println!("{:4}  {}", i + 1, entry);
                }
                continue;
            }
        }

        buffer.push_str(&line);

        if trimmed.ends_with(';') {
            let sql = std::mem::take(&mut buffer);
            history.push(sql.trim().to_string());
            println!("{}", engine.execute(&sql));
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let engine = match std::env::args().nth(1) {
        Some(path) => match Engine::open(path) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        None => Engine::in_memory(),
    };

    run_repl(engine)
}
