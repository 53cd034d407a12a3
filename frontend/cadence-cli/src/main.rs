mod cli;
mod renderer;

use std::path::{Path, PathBuf};
use std::thread;

use cadence_core::workflows::WorkflowLoader;
use cadence_core::{Cadence, Error};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::cli::OutputFormat;
use crate::renderer::Renderer;

fn main() {
    if let Err(error) = run() {
        eprintln!("cadence failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> cadence_core::Result<()> {
    let args = cli::Cli::parse_args();
    let config_path = PathBuf::from(&args.config);
    let renderer = Renderer::new(OutputFormat::from(args.json));

    let config = cadence_core::config::load(Some(config_path.as_path()))?;
    cadence_core::logging::init_tracing(&config.logging.level, config.logging.format);
    debug!(config = %config_path.display(), workflows = %config.workflows.path, "configuration loaded");

    let app = Cadence::new(config)?;

    match args.command {
        cli::Command::List => renderer.render_summaries(&app.engine().list()?),
        cli::Command::Show { name } => {
            let definition = app
                .engine()
                .get(&name)?
                .ok_or_else(|| Error::NotFound(format!("workflow '{name}' not found")))?;
            renderer.render_definition(&definition);
        }
        cli::Command::Create { name, file } => {
            let raw = WorkflowLoader::load_definition_file(Path::new(&file))?;
            let definition = app.engine().create_or_update(&name, raw)?;
            renderer.render_message(&format!(
                "Saved workflow '{name}' ({} steps)",
                definition.steps.len()
            ));
        }
        cli::Command::Delete { name } => {
            if !app.engine().delete(&name)? {
                return Err(Error::NotFound(format!("workflow '{name}' not found")));
            }
            renderer.render_message(&format!("Deleted workflow '{name}'"));
        }
        cli::Command::Run {
            name,
            inputs,
            follow,
        } => {
            let inputs = inputs.into_iter().collect::<Map<String, Value>>();
            if follow {
                run_following(app, &name, inputs, renderer)?;
            } else {
                let result = app.engine().run(&name, inputs)?;
                renderer.render_run(&result);
            }
        }
        cli::Command::Actions => renderer.render_names(&app.engine().actions().names()),
    }

    Ok(())
}

/// Streams run events from a subscriber thread while the run blocks this one.
fn run_following(
    app: Cadence,
    name: &str,
    inputs: Map<String, Value>,
    renderer: Renderer,
) -> cadence_core::Result<()> {
    let mut receiver = app.events().subscribe();

    let follower = thread::spawn(move || loop {
        match receiver.blocking_recv() {
            Ok(event) => {
                renderer.render_event(&event);
                if event.is_terminal() {
                    break;
                }
            }
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    });

    let outcome = app.engine().run(name, inputs);
    // Dropping the app closes the bus, so the follower also stops when the
    // run failed before publishing anything.
    drop(app);
    if follower.join().is_err() {
        eprintln!("event follower panicked");
    }

    let result = outcome?;
    if renderer.output_format() == OutputFormat::Json {
        renderer.render_run(&result);
    }
    Ok(())
}
