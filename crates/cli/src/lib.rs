pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roulette_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};
use roulette_core::GroupFilter;
use tracing::Level;
use uuid::Uuid;

use commands::pick::PickArgs;
use commands::{ChannelScope, CommandResult};

#[derive(Debug, Parser)]
#[command(
    name = "roulette",
    about = "Review roulette operator CLI",
    long_about = "Manage review candidates per channel and draw reviewers with fair rotation.",
    after_help = "Examples:\n  roulette add --team T1 --channel C1 --group backend U123 U456\n  roulette pick --team T1 --channel C1 --asking-user U123 --count 2\n  roulette doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a roulette.toml config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the document path (storage.data_path)")]
    data: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "List the candidates and rotation state of a channel")]
    Ls {
        #[command(flatten)]
        scope: ChannelScope,
    },
    #[command(about = "Add candidates to a channel, or add groups to existing candidates")]
    Add {
        #[command(flatten)]
        scope: ChannelScope,
        #[arg(long = "group", short = 'g', help = "Group to tag the candidates with (repeatable)")]
        groups: Vec<String>,
        #[arg(required = true, help = "Candidate user ids")]
        names: Vec<String>,
    },
    #[command(about = "Remove candidates from a channel")]
    Rm {
        #[command(flatten)]
        scope: ChannelScope,
        #[arg(required = true, help = "Candidate user ids")]
        names: Vec<String>,
    },
    #[command(about = "Remove groups from candidates without removing the candidates")]
    Ungroup {
        #[command(flatten)]
        scope: ChannelScope,
        #[arg(long = "group", short = 'g', required = true, help = "Group to remove (repeatable)")]
        groups: Vec<String>,
        #[arg(required = true, help = "Candidate user ids")]
        names: Vec<String>,
    },
    #[command(about = "List the groups available to a requester")]
    Groups {
        #[command(flatten)]
        scope: ChannelScope,
        #[arg(long, help = "User asking for a review")]
        asking_user: String,
    },
    #[command(about = "Draw reviewers for a requester")]
    Pick {
        #[command(flatten)]
        scope: ChannelScope,
        #[arg(long, help = "User asking for a review; never selected")]
        asking_user: String,
        #[arg(long, default_value_t = 1, help = "Number of reviewers to draw")]
        count: usize,
        #[arg(
            long,
            default_value = GroupFilter::ANY_KEYWORD,
            help = "Group to draw from, or `all`"
        )]
        group: String,
        #[arg(long, help = "Seed the random source for a reproducible draw")]
        seed: Option<u64>,
    },
    #[command(about = "Create or update a team's installation data")]
    Team {
        #[arg(long, help = "Workspace (team) identifier")]
        team: String,
        #[arg(long, help = "Bearer token for the workspace")]
        token: Option<String>,
        #[arg(long, help = "Display name of the workspace")]
        name: Option<String>,
    },
    #[command(about = "Upgrade the stored document to the current schema")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Check configuration, document readability and schema version")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config.clone(),
        overrides: ConfigOverrides { data_path: cli.data.clone(), ..ConfigOverrides::default() },
    };
    let config = AppConfig::load(options);
    if let Ok(config) = &config {
        init_logging(config);
    }

    let name = command_name(&cli.command);
    let span = tracing::info_span!(
        "command",
        command = name,
        correlation_id = %Uuid::new_v4()
    );
    let _entered = span.enter();

    let result = match (cli.command, config) {
        (Command::Doctor { json }, config) => {
            let output = commands::doctor::run(config.as_ref(), json);
            CommandResult { exit_code: 0, output }
        }
        (_, Err(error)) => CommandResult::failure(
            name,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        ),
        (Command::Config, Ok(config)) => {
            let flag_keys: &[&str] =
                if cli.data.is_some() { &["storage.data_path"] } else { &[] };
            let output = commands::config::run(&config, cli.config.as_deref(), flag_keys);
            CommandResult { exit_code: 0, output }
        }
        (Command::Ls { scope }, Ok(config)) => commands::channel::list(&config, &scope),
        (Command::Add { scope, groups, names }, Ok(config)) => {
            commands::channel::add(&config, &scope, &names, &groups)
        }
        (Command::Rm { scope, names }, Ok(config)) => {
            commands::channel::remove(&config, &scope, &names)
        }
        (Command::Ungroup { scope, groups, names }, Ok(config)) => {
            commands::channel::ungroup(&config, &scope, &names, &groups)
        }
        (Command::Groups { scope, asking_user }, Ok(config)) => {
            commands::channel::groups(&config, &scope, &asking_user)
        }
        (Command::Pick { scope, asking_user, count, group, seed }, Ok(config)) => {
            let group = group.parse::<GroupFilter>().unwrap_or_default();
            let args = PickArgs { asking_user, count, group, seed };
            commands::pick::run(&config, &scope, &args)
        }
        (Command::Team { team, token, name }, Ok(config)) => {
            commands::team::run(&config, &team, token, name)
        }
        (Command::Migrate, Ok(config)) => commands::migrate::run(&config),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Ls { .. } => "ls",
        Command::Add { .. } => "add",
        Command::Rm { .. } => "rm",
        Command::Ungroup { .. } => "ungroup",
        Command::Groups { .. } => "groups",
        Command::Pick { .. } => "pick",
        Command::Team { .. } => "team",
        Command::Migrate => "migrate",
        Command::Config => "config",
        Command::Doctor { .. } => "doctor",
    }
}

fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}
