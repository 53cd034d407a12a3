use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "cadence", about = "Run linear automation workflows", version)]
pub struct Cli {
    /// Configuration file; accepted before or after the subcommand.
    #[arg(long, default_value = "cadence.toml", global = true)]
    pub config: String,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List stored workflows
    List,
    /// Print one workflow definition
    Show { name: String },
    /// Create or replace a workflow from a YAML or JSON file
    Create {
        name: String,
        #[arg(long)]
        file: String,
    },
    /// Delete a workflow; fails if no workflow has that name
    Delete { name: String },
    /// Run a workflow
    Run {
        name: String,
        /// Runtime input as key=value; values are parsed as JSON when possible
        #[arg(long = "input", value_parser = parse_input)]
        inputs: Vec<(String, Value)>,
        /// Print run events as they happen
        #[arg(long)]
        follow: bool,
    },
    /// List registered actions
    Actions,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<bool> for OutputFormat {
    fn from(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn parse_input(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("input key must not be empty in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inputs_parse_as_json_then_fall_back_to_text() {
        assert_eq!(parse_input("count=3"), Ok(("count".to_owned(), json!(3))));
        assert_eq!(parse_input("loud=true"), Ok(("loud".to_owned(), json!(true))));
        assert_eq!(parse_input("city=NYC"), Ok(("city".to_owned(), json!("NYC"))));
        assert_eq!(
            parse_input("query=a=b"),
            Ok(("query".to_owned(), json!("a=b")))
        );
        assert_eq!(parse_input("empty="), Ok(("empty".to_owned(), json!(""))));
        assert!(parse_input("novalue").is_err());
        assert!(parse_input("=x").is_err());
    }

    #[test]
    fn run_accepts_repeated_inputs() {
        let cli = Cli::try_parse_from([
            "cadence", "--json", "run", "morning", "--input", "city=Oslo", "--input", "n=2",
            "--follow",
        ])
        .expect("args should parse");

        assert!(cli.json);
        match cli.command {
            Command::Run {
                name,
                inputs,
                follow,
            } => {
                assert_eq!(name, "morning");
                assert_eq!(inputs.len(), 2);
                assert!(follow);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from(["cadence", "run", "x", "--config", "y.toml"])
            .expect("args should parse");
        assert_eq!(cli.config, "y.toml");
        assert!(matches!(cli.command, Command::Run { ref name, .. } if name == "x"));

        let cli = Cli::try_parse_from(["cadence", "list"]).expect("args should parse");
        assert_eq!(cli.config, "cadence.toml");
    }
}
