use clap::{Parser, Subcommand};
use diacheck::config;
use diacheck::{generate_answer, ChatSession, Classifier, Role, XgbClassifier};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "diacheck")]
#[command(author, version, about = "Load diabetes health data into SQLite and chat with a diabetes classifier")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Show debug logs (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replace-load a CSV file into an SQLite table
    Load {
        /// CSV file to load
        #[arg(long, env = "DIACHECK_CSV", default_value = config::DEFAULT_CSV_PATH)]
        csv: PathBuf,

        /// SQLite database (created if absent)
        #[arg(long, env = "DIACHECK_DB", default_value = config::DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Destination table, dropped and recreated
        #[arg(long, env = "DIACHECK_TABLE", default_value = config::DEFAULT_TABLE)]
        table: String,

        /// Rows to read back after loading
        #[arg(long, default_value_t = config::DEFAULT_PREVIEW_ROWS)]
        preview: usize,
    },

    /// Chat with the classifier in the terminal
    Chat {
        /// XGBoost JSON model
        #[arg(short, long, env = "DIACHECK_MODEL", default_value = config::DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },

    /// Answer a single message and exit
    Predict {
        /// Five comma-separated values: hba1c, glucose_postprandial, glucose_fasting, family_history_diabetes, age
        input: String,

        /// XGBoost JSON model
        #[arg(short, long, env = "DIACHECK_MODEL", default_value = config::DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },

    /// Start the browser chat
    Serve {
        /// XGBoost JSON model
        #[arg(short, long, env = "DIACHECK_MODEL", default_value = config::DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Port to listen on
        #[arg(short, long, env = "DIACHECK_PORT", default_value_t = config::DEFAULT_PORT)]
        port: u16,

        /// Don't open a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Print model metadata as JSON
    Inspect {
        /// XGBoost JSON model
        #[arg(short, long, env = "DIACHECK_MODEL", default_value = config::DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter(args.verbose))),
        )
        .with_writer(io::stderr)
        .init();

    match args.command {
        Command::Load { csv, db, table, preview } => run_load(csv, db, &table, preview),
        Command::Chat { model } => run_chat(&open_model(&model)),
        Command::Predict { input, model } => {
            let model = open_model(&model);
            match generate_answer(&input, &model) {
                Ok(answer) => println!("{}", answer),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Command::Serve { model, port, no_open } => {
            let model = open_model(&model);
            if let Err(e) = diacheck::serve::start(port, &model, !no_open) {
                eprintln!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Command::Inspect { model } => {
            let model = open_model(&model);
            match serde_json::to_string_pretty(model.info()) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Error serializing model info: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn open_model(path: &Path) -> XgbClassifier {
    match XgbClassifier::open(path) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Failed to load model: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_load(csv: PathBuf, db: PathBuf, table: &str, preview: usize) {
    eprintln!("\x1b[1mdiacheck - bulk load\x1b[0m");
    eprintln!("{}", "─".repeat(70));
    eprintln!("  {} → {} (table {})\n", csv.display(), db.display(), table);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    let result = diacheck::loader::load_with_progress(&csv, &db, table, preview, |done, total| {
        if done % 500 == 0 || done == total {
            pb.set_message(format!("inserted {}/{} rows", done, total));
            pb.tick();
        }
    });
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("\x1b[31mLoad failed:\x1b[0m {}", e);
            std::process::exit(1);
        }
    };

    eprintln!(
        "\x1b[32m✓ Wrote {} rows, {} columns\x1b[0m\n",
        report.rows_written,
        report.columns.len()
    );

    // Read-back check
    let header: Vec<&str> = report.columns.iter().map(|c| c.name.as_str()).collect();
    println!("{}", header.join("\t"));
    for row in &report.preview {
        let cells: Vec<String> = row
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Null => "NULL".to_string(),
                other => other.to_string(),
            })
            .collect();
        println!("{}", cells.join("\t"));
    }
}

fn run_chat<C: Classifier>(model: &C) {
    eprintln!("\x1b[1mDiabetes Check Chatbot\x1b[0m");
    eprintln!("{}", "─".repeat(70));
    eprintln!("\x1b[90mType 'quit' or press Ctrl-D to leave.\x1b[0m\n");

    let mut session = ChatSession::new();
    print_message(Role::Assistant, &session.messages()[0].content);

    let stdin = io::stdin();
    loop {
        print!("\x1b[1myou>\x1b[0m ");
        io::stdout().flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read input: {}", e);
                break;
            }
        }

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = session.handle_turn(text, model);
        print_message(reply.role, &reply.content);
    }

    eprintln!("\n\x1b[90m{} messages in this session.\x1b[0m", session.messages().len());
}

fn print_message(role: Role, content: &str) {
    match role {
        Role::Assistant => println!("\x1b[33mbot>\x1b[0m {}", content),
        Role::User => println!("\x1b[1myou>\x1b[0m {}", content),
    }
}
