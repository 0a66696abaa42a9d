//! commit-quest - CLI entry point.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use dialoguer::{Confirm, Input, Select};
use tracing_subscriber::EnvFilter;

use commit_quest::commit::{CommitMessage, CommitType, MessageLength};
use commit_quest::config::{ConfigStore, ProjectConfig, Settings, default_project_dir};
use commit_quest::error::SessionError;
use commit_quest::llm::{TextGenerator, build_generator};
use commit_quest::server::{self, AppState, DEFAULT_PORT};
use commit_quest::session::{Proposal, ProposalRequest, RepoStatus, Session, SessionOptions};

/// Suggest commit messages for your unstaged changes, and earn experience doing it.
#[derive(Parser, Debug)]
#[command(name = "commit-quest")]
#[command(about = "Suggest commit messages for unstaged git changes")]
#[command(version)]
#[command(group(ArgGroup::new("mode").args(["generate", "setup", "serve"])))]
struct Cli {
    /// Generate a commit message for the unstaged changes
    #[arg(long)]
    generate: bool,

    /// Create or update the project configuration
    #[arg(long)]
    setup: bool,

    /// Run the HTTP endpoint
    #[arg(long)]
    serve: bool,

    /// Commit type: feat, fix, chore or another lowercase word
    #[arg(long = "type", value_name = "TYPE", default_value = "feat")]
    commit_type: CommitType,

    /// Use this message instead of generating one
    #[arg(short, long)]
    message: Option<String>,

    /// Message length: brief or detailed
    #[arg(long, default_value = "brief")]
    length: MessageLength,

    /// Number of suggestions to generate
    #[arg(long, default_value_t = 1)]
    variants: usize,

    /// Stage all changes and commit with the chosen message
    #[arg(long)]
    auto_commit: bool,

    /// Initialize a git repository if the project directory has none
    #[arg(long)]
    init_repo: bool,

    /// Review suggestions interactively (choose, regenerate or decline)
    #[arg(short, long)]
    interactive: bool,

    /// Project language (setup)
    #[arg(long)]
    language: Option<String>,

    /// Project framework (setup)
    #[arg(long)]
    framework: Option<String>,

    /// Your specialization, e.g. backend or machine learning (setup)
    #[arg(long)]
    specialization: Option<String>,

    /// Port for --serve
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Project directory (defaults to a persistent temp directory)
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

const CLASSES: [(&str, &str); 3] = [
    ("feat", "[feat] Magician - Adds new features"),
    ("fix", "[fix] Warrior - Fixes bugs"),
    ("chore", "[chore] Archer - General maintenance"),
];

const HELP_TEXT: &str = "Commands:
- generate: Begin your quest to generate a commit message.
- setup: Configure project settings.
- help: Show available commands.
- exit: Exit the quest.";

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    let project_dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => default_project_dir().context("Failed to create the default project directory")?,
    };

    if cli.setup {
        let config = setup_config(&cli, &project_dir)?;
        println!("Configuration saved to {}", ConfigStore::new(&project_dir).path().display());
        println!(
            "Language: {}, framework: {}, specialization: {}",
            config.language, config.framework, config.specialization
        );
        return Ok(());
    }

    let generator =
        build_generator(&settings).context("Failed to set up the text generation backend")?;
    let options = SessionOptions::from(&settings);

    if cli.serve {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, cli.port));
        let state = AppState {
            generator,
            options,
            default_project_dir: project_dir,
        };
        eprintln!("Serving commit-quest on http://{addr}");
        server::serve(addr, state)
            .await
            .with_context(|| format!("HTTP server on {addr} failed"))?;
        return Ok(());
    }

    if cli.generate {
        return run_generate(&cli, &project_dir, generator, options).await;
    }

    run_quest(&project_dir, generator, options).await
}

/// `--setup`: use flag values, prompting only for the ones not given.
fn setup_config(cli: &Cli, project_dir: &Path) -> Result<ProjectConfig> {
    let store = ConfigStore::new(project_dir);
    let existing = store
        .load()
        .context("Failed to read the existing configuration")?;

    let config = match (&cli.language, &cli.framework, &cli.specialization) {
        (Some(language), Some(framework), Some(specialization)) => {
            ProjectConfig::new(language, framework, specialization)
        }
        _ => prompt_config(
            existing.as_ref(),
            cli.language.as_deref(),
            cli.framework.as_deref(),
            cli.specialization.as_deref(),
        )?,
    };

    store.save(&config).context("Failed to save the configuration")?;
    Ok(config)
}

fn prompt_config(
    existing: Option<&ProjectConfig>,
    language: Option<&str>,
    framework: Option<&str>,
    specialization: Option<&str>,
) -> Result<ProjectConfig> {
    let language = match language {
        Some(value) => value.to_string(),
        None => ask(
            "Enter the programming language (e.g., Python, JavaScript)",
            existing.map(|c| c.language.as_str()),
        )?,
    };
    let framework = match framework {
        Some(value) => value.to_string(),
        None => ask(
            "Enter the framework (e.g., Django, React, None)",
            existing.map(|c| c.framework.as_str()),
        )?,
    };
    let specialization = match specialization {
        Some(value) => value.to_string(),
        None => ask(
            "Enter your specialization (e.g., Front-end, Backend, Machine Learning)",
            existing.map(|c| c.specialization.as_str()),
        )?,
    };

    Ok(ProjectConfig::new(language, framework, specialization))
}

fn ask(prompt: &str, default: Option<&str>) -> Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt).allow_empty(true);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    Ok(input.interact_text()?)
}

/// Load the config, or (interactively) run setup when there is none.
fn ensure_config(session: &mut Session, interactive: bool) -> Result<()> {
    match session.load_config() {
        Ok(_) => Ok(()),
        Err(SessionError::ConfigMissing(dir)) if interactive => {
            eprintln!("No configuration found in {}. Let's set one up.", dir.display());
            let config = prompt_config(None, None, None, None)?;
            session.setup(config).context("Failed to save the configuration")?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Open the repository, offering to initialize one when interactive.
fn ensure_repository(session: &mut Session, init_repo: bool, interactive: bool) -> Result<()> {
    let status = match session.open_repository(init_repo) {
        Ok(status) => status,
        Err(SessionError::RepoMissing(dir)) if interactive => {
            let initialize = Confirm::new()
                .with_prompt(format!(
                    "No git repository found in {}. Initialize one here?",
                    dir.display()
                ))
                .default(false)
                .interact()?;
            if !initialize {
                anyhow::bail!("A git repository is required to generate commit messages");
            }
            session.open_repository(true)?
        }
        Err(e) => return Err(e.into()),
    };

    if status == RepoStatus::Initialized {
        eprintln!("Initialized a new git repository.");
    }
    Ok(())
}

enum Review {
    Chosen(usize),
    Regenerate,
    Decline,
}

fn review(messages: &[CommitMessage]) -> Result<Review> {
    let mut items: Vec<String> = messages
        .iter()
        .enumerate()
        .map(|(idx, message)| format!("{}. {}", idx + 1, message))
        .collect();
    items.push("Regenerate".to_string());
    items.push("Decline".to_string());

    let choice = Select::new()
        .with_prompt("Choose a commit message")
        .default(0)
        .items(&items)
        .interact()?;

    Ok(match choice {
        idx if idx < messages.len() => Review::Chosen(idx),
        idx if idx == messages.len() => Review::Regenerate,
        _ => Review::Decline,
    })
}

fn print_quest_result(message: &CommitMessage, proposal: &Proposal) {
    let score = &proposal.score;
    if !score.boost_message.is_empty() {
        eprintln!("{}", score.boost_message);
    }
    eprintln!("\n--- Quest Result ---");
    eprintln!("Commit Message: {message}");
    eprintln!(
        "You gained {} experience points and slayed {} enemies.",
        score.total_experience(),
        score.enemies_slain
    );
    eprintln!("Specialization Boost: {}", score.boost);
    eprintln!("--------------------\n");
}

/// `--generate`: print the chosen message on stdout.
async fn run_generate(
    cli: &Cli,
    project_dir: &Path,
    generator: Arc<dyn TextGenerator>,
    options: SessionOptions,
) -> Result<()> {
    let mut session = Session::new(project_dir, generator, options)?;
    ensure_config(&mut session, cli.interactive)?;
    ensure_repository(&mut session, cli.init_repo, cli.interactive)?;

    let mut request = ProposalRequest {
        commit_type: cli.commit_type.clone(),
        custom_message: cli.message.clone().unwrap_or_default(),
        length: cli.length,
        variants: cli.variants,
        refresh: false,
    };

    loop {
        let proposal = session
            .propose(&request)
            .await
            .context("Failed to generate a commit message")?;

        let chosen = if cli.interactive {
            review(&proposal.messages)?
        } else {
            Review::Chosen(0)
        };

        match chosen {
            Review::Chosen(idx) => {
                let message = &proposal.messages[idx];
                println!("{message}");
                if let Some(oid) = session
                    .accept(message, cli.auto_commit)
                    .context("Failed to commit the changes")?
                {
                    eprintln!("Committed {oid}");
                }
                print_quest_result(message, &proposal);
                return Ok(());
            }
            Review::Regenerate => request.refresh = true,
            Review::Decline => {
                session.decline();
                eprintln!("No commit message selected.");
                return Ok(());
            }
        }
    }
}

/// The interactive quest loop used when no mode flag is given.
async fn run_quest(
    project_dir: &Path,
    generator: Arc<dyn TextGenerator>,
    options: SessionOptions,
) -> Result<()> {
    println!("Welcome to Commit Message Quest!");
    println!("Type 'generate' to start your quest.\n");

    loop {
        let command: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;

        match command.trim().to_lowercase().as_str() {
            "generate" => {
                if let Err(e) = quest_round(project_dir, generator.clone(), options).await {
                    eprintln!("Error: {e:#}");
                }
            }
            "setup" => {
                let store = ConfigStore::new(project_dir);
                let existing = store.load().ok().flatten();
                let config = prompt_config(existing.as_ref(), None, None, None)?;
                match store.save(&config) {
                    Ok(()) => println!("Configuration completed.\n"),
                    Err(e) => eprintln!("Error: {e}"),
                }
            }
            "help" => println!("{HELP_TEXT}"),
            "exit" => {
                println!("Farewell, brave coder! Until next time.");
                return Ok(());
            }
            "" => {}
            _ => println!("Unknown command. Type 'help' to see available commands."),
        }
    }
}

async fn quest_round(
    project_dir: &Path,
    generator: Arc<dyn TextGenerator>,
    options: SessionOptions,
) -> Result<()> {
    let mut session = Session::new(project_dir, generator, options)?;
    ensure_config(&mut session, true)?;
    ensure_repository(&mut session, false, true)?;

    let labels: Vec<&str> = CLASSES.iter().map(|(_, label)| *label).collect();
    let class = Select::new()
        .with_prompt("Choose your class")
        .default(0)
        .items(&labels)
        .interact()?;
    let commit_type: CommitType = CLASSES[class].0.parse()?;

    let custom_message: String = Input::new()
        .with_prompt("Enter your commit message (or leave blank to auto-generate)")
        .allow_empty(true)
        .interact_text()?;

    let request = ProposalRequest {
        commit_type,
        custom_message,
        ..ProposalRequest::default()
    };
    let proposal = session.propose(&request).await?;
    let message = &proposal.messages[0];
    print_quest_result(message, &proposal);

    let commit = Confirm::new()
        .with_prompt("Commit your changes with this message?")
        .default(false)
        .interact()?;
    if commit {
        if let Some(oid) = session.accept(message, true)? {
            println!("Committed {oid}");
        }
    } else {
        session.decline();
    }
    Ok(())
}
