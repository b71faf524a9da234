//! release-ledger - CLI entry point.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use release_ledger::config::Config;
use release_ledger::errata::{CurlFetcher, advisory_url, list_errata};
use release_ledger::jira::{IssueReferenceExtractor, JiraClient, get_jira_token};
use release_ledger::konflux::{KonfluxClient, discover_server, discover_token};
use release_ledger::release::plan::open_release_epics_jql;
use release_ledger::release::{ReleasePlanSchedule, ReleaseTickets, parse_plan_version};
use release_ledger::{CandidateRequest, KonfluxError, ReleaseCandidate, Version};

/// Track and assemble component releases.
#[derive(Parser, Debug)]
#[command(name = "release-ledger")]
#[command(about = "Resolve release contents and manage release tickets")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Jira project owning release tickets (overrides config)
    #[arg(long, global = true)]
    project: Option<String>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage releases
    #[command(subcommand)]
    Release(ReleaseCommand),
}

#[derive(Subcommand, Debug)]
enum ReleaseCommand {
    /// Current status of a potential release
    Status {
        #[command(flatten)]
        target: TargetArgs,

        /// Tail commit of the release, bypassing tag lookup
        #[arg(long)]
        tail: Option<String>,

        /// Also write the Release manifest to this file
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Update a release task with the current release contents
    Update {
        /// Ticket to update
        #[arg(long)]
        issue: String,

        #[command(flatten)]
        target: TargetArgs,

        /// Tail commit of the release
        #[arg(long)]
        tail: String,

        /// Planned release date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Create the Jira epic and task tracking a new release
    New {
        /// Semver of the release
        #[arg(long)]
        version: String,

        /// Planned release date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        /// Patch (z-stream) release with a shorter QE period
        #[arg(long)]
        patch: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List pending releases
    List,

    /// List pending errata
    ListErrata,
}

#[derive(Args, Debug)]
struct TargetArgs {
    /// Konflux release plan
    #[arg(long)]
    releaseplan: String,

    /// Version being released (vX.Y.Z)
    #[arg(long)]
    version: Version,

    /// Konflux namespace (overrides config)
    #[arg(long)]
    namespace: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(project) = cli.project {
        config.jira.project = project;
    }

    let Command::Release(command) = cli.command;
    match command {
        ReleaseCommand::Status {
            target,
            tail,
            output,
        } => {
            let candidate = build_candidate(&config, &target, tail).await?;

            let stdout = io::stdout();
            candidate
                .write_report(&mut stdout.lock())
                .context("Failed to print status report")?;
            let yaml = candidate.manifest.to_yaml()?;
            println!("\n{}", yaml);

            if let Some(path) = output {
                candidate
                    .manifest
                    .write_to(&path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }

        ReleaseCommand::Update {
            issue,
            target,
            tail,
            date,
        } => {
            let candidate = build_candidate(&config, &target, Some(tail)).await?;

            let version = parse_plan_version(&target.version.to_string())?;
            let date = date.unwrap_or_else(|| Local::now().date_naive());
            let schedule = ReleasePlanSchedule::new(date, target.version.is_patch_release());
            let tickets = ReleaseTickets::new(&config.jira.project, version, schedule)
                .with_manifest(candidate.manifest);

            println!(
                "Updating ticket with description:\n{}",
                tickets.task_description()?
            );
            tickets
                .update(&jira_client(&config)?, &issue)
                .await
                .with_context(|| format!("Failed to update {}", issue))?;
        }

        ReleaseCommand::New {
            version,
            date,
            patch,
            yes,
        } => {
            let version = parse_plan_version(&version)?;
            let schedule = ReleasePlanSchedule::new(date, patch);
            let tickets = ReleaseTickets::new(&config.jira.project, version, schedule);

            println!("Project:     {}", tickets.project);
            println!("Version:     {}", tickets.version);
            println!("QE handover: {}", schedule.handover);
            println!("Release:     {}", schedule.release);

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Create release epic and task?")
                    .default(false)
                    .interact()
                    .context("Confirmation prompt failed")?;
                if !confirmed {
                    println!("Aborted.");
                    return Ok(());
                }
            }

            let client = jira_client(&config)?;
            let (epic, task) = tickets
                .create(&client)
                .await
                .context("Failed to create release tickets")?;
            println!("Created epic {}: {}", epic, client.browse_url(&epic));
            println!("Created task {}: {}", task, client.browse_url(&task));
        }

        ReleaseCommand::List => {
            let client = jira_client(&config)?;
            let epics = client
                .search(&open_release_epics_jql(&config.jira.project))
                .await
                .context("Failed to search release epics")?;

            for epic in epics {
                let links = client
                    .remote_links(&epic.key)
                    .await
                    .with_context(|| format!("Failed to fetch links of {}", epic.key))?;
                let links: Vec<String> = links
                    .iter()
                    .map(|l| format!("{} <{}>", l.object.title, l.object.url))
                    .collect();
                println!("{}: {} | {}", epic.key, epic.fields.epic_name, links.join(", "));
            }
        }

        ReleaseCommand::ListErrata => {
            let errata = list_errata(&CurlFetcher, &config.errata)
                .await
                .context("Failed to list errata")?;
            println!("ID\tNAME\tURL");
            for e in errata {
                println!("{}\t{}\t{}", e.id, e.synopsis, advisory_url(&config.errata, e.id));
            }
        }
    }

    Ok(())
}

/// Resolve the release candidate for a release plan.
async fn build_candidate(
    config: &Config,
    target: &TargetArgs,
    tail: Option<String>,
) -> Result<ReleaseCandidate> {
    // Step 1: Konflux access
    let Some(namespace) = target
        .namespace
        .clone()
        .or_else(|| config.konflux.namespace.clone())
    else {
        bail!("No Konflux namespace given. Pass --namespace or set [konflux] namespace");
    };
    let server =
        discover_server(config.konflux.server.as_deref()).ok_or(KonfluxError::MissingServer)?;
    let konflux = KonfluxClient::new(
        &server,
        discover_token(),
        config.konflux.insecure_skip_tls_verify,
    )
    .context("Failed to create Konflux client")?;

    // Step 2: Issue tracker
    let extractor =
        IssueReferenceExtractor::new(&config.jira.issue_projects(), jira_client(config)?)?;

    // Step 3: Resolve
    let request = CandidateRequest {
        namespace,
        release_plan: target.releaseplan.clone(),
        version: target.version,
        tail_override: tail,
    };
    ReleaseCandidate::build(&konflux, &extractor, &request)
        .await
        .with_context(|| format!("Failed to resolve release for {}", target.releaseplan))
}

fn jira_client(config: &Config) -> Result<JiraClient> {
    let token = get_jira_token()?;
    JiraClient::new(&config.jira.url, token).context("Failed to create Jira client")
}
