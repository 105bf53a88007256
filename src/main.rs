use clap::Parser;
use jsonschema4::{Configuration, Validator};
use serde_json::Value;
use std::{fs, path::PathBuf, process::ExitCode};

/// Validate JSON instances against a JSON Schema Draft 4 document.
#[derive(Parser)]
#[command(name = "jsonschema4", version, about)]
struct Cli {
    /// Path to the schema document (JSON, or YAML if built with the `yaml` feature).
    schema: PathBuf,
    /// Path to an instance document to validate. May be repeated.
    #[arg(short = 'i', long = "instance", required = true)]
    instances: Vec<PathBuf>,
}

fn read_json(path: &PathBuf) -> anyhow::Result<Value> {
    let body = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&body)?)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Configuration::from_env();
    let debug = config.debug;

    let schema = match read_json(&cli.schema) {
        Ok(schema) => schema,
        Err(error) => {
            eprintln!("error: failed to read schema '{}': {}", cli.schema.display(), error);
            return ExitCode::FAILURE;
        }
    };

    let validator = match Validator::with_configuration(&schema, config) {
        Ok(validator) => validator,
        Err(error) => {
            eprintln!("error: invalid schema: {}", error);
            return ExitCode::FAILURE;
        }
    };

    let mut all_valid = true;
    for instance_path in &cli.instances {
        if debug {
            eprintln!("debug: validating '{}'", instance_path.display());
        }
        let instance = match read_json(instance_path) {
            Ok(instance) => instance,
            Err(error) => {
                eprintln!("error: failed to read instance '{}': {}", instance_path.display(), error);
                all_valid = false;
                continue;
            }
        };
        let errors = validator.validate(&instance);
        if errors.is_empty() {
            println!("{}: OK", instance_path.display());
        } else {
            all_valid = false;
            println!("{}: FAILED", instance_path.display());
            for error in &errors {
                println!("  {}", error);
            }
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
