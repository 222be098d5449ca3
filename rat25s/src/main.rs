use std::fs;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use rat25s::{CompileError, Options, report};

#[derive(Parser)]
#[command(name = "rat25s")]
#[command(about = "Rat25S to stack machine translator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a source file and print the full report
    Compile {
        /// Source file
        input: String,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Leave the production trace out of the report
        #[arg(long)]
        no_trace: bool,
    },

    /// Tokenize a source file and print the token listing
    Tokens {
        /// Source file
        input: String,
    },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", report::render_error(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<(), CompileError> {
    match command {
        Commands::Compile {
            input,
            output,
            no_trace,
        } => {
            info!("translating {}", input);
            let source = fs::read_to_string(&input)?;
            let options = Options { trace: !no_trace };
            let translation = rat25s::translate(&source, &options)?;
            let text = report::render(&translation);

            match output {
                Some(path) => {
                    fs::write(&path, &text)?;
                    println!("Report written to: {}", path);
                    println!("Instructions: {}", translation.instructions.len());
                }
                None => print!("{}", text),
            }
        }
        Commands::Tokens { input } => {
            let source = fs::read_to_string(&input)?;
            let tokens = rat25s::parser::lexer::tokenize(&source)?;
            print!("{}", report::render_tokens(&tokens));
        }
    }

    Ok(())
}
