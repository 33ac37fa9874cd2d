//! CLI for exercising the recognition and actuation pipeline without a host
//! application: type what you would say, watch what it does to a demo form.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use voxact::config::VoiceControlConfig;
use voxact::events::{EventBus, SessionEvent};
use voxact::intent::CommandRegistry;
use voxact::surface::{ControlKind, ControlSurface, InputKind, SelectOption};
use voxact::{Actuator, build_recognizer};

/// Voxact: voice command recognition and control actuation.
#[derive(Parser)]
#[command(name = "voxctl", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Read commands from stdin and run them against a demo form.
    Repl,
    /// Print the built-in command vocabulary.
    Vocabulary,
    /// Validate a configuration file.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("voxact=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => VoiceControlConfig::load(path)?,
        None => VoiceControlConfig::default(),
    };
    config.validate()?;

    match cli.command.unwrap_or(Command::Repl) {
        Command::Repl => run_repl(config).await,
        Command::Vocabulary => {
            print_vocabulary();
            Ok(())
        }
        Command::Check => {
            println!("configuration is valid");
            Ok(())
        }
    }
}

fn print_vocabulary() {
    let registry = CommandRegistry::with_defaults();
    for template in registry.templates() {
        println!("{}", template.intent);
        for pattern in &template.utterance_patterns {
            println!("    {pattern}");
        }
    }
}

async fn run_repl(config: VoiceControlConfig) -> anyhow::Result<()> {
    let bus = EventBus::new();
    let mut rx = bus.subscribe();
    let recognizer = build_recognizer(&config, CommandRegistry::with_defaults())?;
    let actuator = Actuator::new(config.actuator.clone(), bus.clone());
    let mut surface = demo_form();

    println!("voxctl v{}", env!("CARGO_PKG_VERSION"));
    println!("Demo form loaded; try \"fill email as john at example dot com\".");
    println!("Empty line quits.\n");
    print_surface(&surface);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        let intents = recognizer.recognize(line).await;
        actuator.perform_actions(&mut surface, &intents).await;

        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::ActionPerformed { intent, entities } => {
                    println!("  performed {intent} {entities:?}");
                }
                SessionEvent::ActionPaused { intent, reason } => {
                    println!("  paused {intent}: {reason}");
                }
                _ => {}
            }
        }
        print_surface(&surface);
    }
    Ok(())
}

fn demo_form() -> ControlSurface {
    let mut surface = ControlSurface::new();
    surface.navigate_to("registration");
    surface.add("Submit Button", None, ControlKind::Button);
    surface.add(
        "Email",
        None,
        ControlKind::TextInput {
            input: InputKind::Email,
            value: String::new(),
            min: None,
            max: None,
        },
    );
    surface.add(
        "Date of Birth",
        None,
        ControlKind::TextInput {
            input: InputKind::Date,
            value: String::new(),
            min: None,
            max: None,
        },
    );
    surface.add("Newsletter", Some("consents"), ControlKind::Checkbox { checked: false });
    surface.add("Terms of Service", Some("consents"), ControlKind::Checkbox { checked: false });
    surface.add(
        "Country",
        Some("country"),
        ControlKind::Dropdown {
            options: vec![
                SelectOption::labeled("France"),
                SelectOption::labeled("Germany"),
                SelectOption::labeled("Spain"),
            ],
            selected: None,
            expanded: false,
        },
    );
    surface
}

fn print_surface(surface: &ControlSurface) {
    for control in surface.controls() {
        let state = match &control.kind {
            ControlKind::Button | ControlKind::Link => String::new(),
            ControlKind::TextInput { value, .. } => format!(" = {value:?}"),
            ControlKind::Checkbox { checked } => {
                format!(" [{}]", if *checked { "x" } else { " " })
            }
            ControlKind::Radio { selected } => {
                format!(" ({})", if *selected { "*" } else { " " })
            }
            ControlKind::Dropdown { options, selected, .. } => match selected {
                Some(i) => format!(" = {}", options[*i].label),
                None => " = (none)".to_owned(),
            },
        };
        println!("  {}{state}", control.voice_name);
    }
    println!();
}
