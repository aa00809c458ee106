//! Schema Markdown compiler command line.
//!
//! Thin wrapper over schemark-core: reads schema files, compiles them
//! to a type-model, and optionally validates a JSON value against a
//! named type. All diagnostics go to stderr; a non-zero exit code means
//! the schema or the value had errors.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use schemark_core::{validate_type, SchemaParser, Types, Value};

/// Schema Markdown compiler toolchain.
#[derive(Parser)]
#[command(name = "schemark", version, about = "Schema Markdown compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile schema files to a type-model JSON document
    Compile {
        /// Paths to the Schema Markdown source files, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Emit compact JSON instead of pretty-printed
        #[arg(long)]
        compact: bool,
    },

    /// Parse and finalize schema files, reporting diagnostics only
    Check {
        /// Paths to the Schema Markdown source files, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Validate a JSON value file against a named type
    Validate {
        /// Path to the Schema Markdown source file
        schema: PathBuf,
        /// The type name to validate against
        #[arg(long = "type")]
        type_name: String,
        /// Path to the JSON value file
        #[arg(long)]
        value: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Compile { files, compact } => cmd_compile(&files, compact),
        Commands::Check { files } => cmd_check(&files),
        Commands::Validate {
            schema,
            type_name,
            value,
        } => cmd_validate(&schema, &type_name, &value),
    };
    process::exit(code);
}

/// Parse all files into one accumulating model, finalize, and print
/// diagnostics. Returns the model only when there were none.
fn compile_files(files: &[PathBuf]) -> Result<Types, i32> {
    let mut parser = SchemaParser::new();
    for file in files {
        let source = match fs::read_to_string(file) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("schemark: {}: {}", file.display(), err);
                return Err(2);
            }
        };
        parser.parse(&source, &file.display().to_string());
    }
    parser.finalize();
    let errors = parser.errors();
    if errors.is_empty() {
        Ok(parser.into_types())
    } else {
        for error in &errors {
            eprintln!("{}", error);
        }
        Err(1)
    }
}

fn cmd_compile(files: &[PathBuf], compact: bool) -> i32 {
    let types = match compile_files(files) {
        Ok(types) => types,
        Err(code) => return code,
    };
    let rendered = if compact {
        serde_json::to_string(&types)
    } else {
        serde_json::to_string_pretty(&types)
    };
    match rendered {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(err) => {
            eprintln!("schemark: {}", err);
            2
        }
    }
}

fn cmd_check(files: &[PathBuf]) -> i32 {
    match compile_files(files) {
        Ok(_) => 0,
        Err(code) => code,
    }
}

fn cmd_validate(schema: &PathBuf, type_name: &str, value_path: &PathBuf) -> i32 {
    let types = match compile_files(std::slice::from_ref(schema)) {
        Ok(types) => types,
        Err(code) => return code,
    };
    let value_source = match fs::read_to_string(value_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("schemark: {}: {}", value_path.display(), err);
            return 2;
        }
    };
    let json: serde_json::Value = match serde_json::from_str(&value_source) {
        Ok(json) => json,
        Err(err) => {
            eprintln!("schemark: {}: {}", value_path.display(), err);
            return 2;
        }
    };
    match validate_type(&types, type_name, &Value::from(json)) {
        Ok(validated) => {
            match serde_json::to_string_pretty(&validated) {
                Ok(text) => println!("{}", text),
                Err(err) => {
                    eprintln!("schemark: {}", err);
                    return 2;
                }
            }
            0
        }
        Err(err) => {
            eprintln!("schemark: {}", err);
            1
        }
    }
}
