//! Command-line interface
//!
//! The CLI is the data-entry surface for the pipeline: mutation commands
//! are thin callers of `Publisher::publish_on_update`, and `build` /
//! `publish` expose the two recovery steps individually.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::Config;
use crate::data::{Database, MeasureKind, Mutation, NewCheckIn, NewGoal, RecordStore};
use crate::publish::{GitTransport, PublishError, PublishReport, Publisher};
use crate::site::SiteBuilder;
use crate::util;

#[derive(Parser)]
#[command(name = "stride", version, about = "Track yearly goals and publish a read-only progress site")]
pub struct Cli {
    /// Override the data directory (default: ~/.stride)
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the data directory, database, and a config stub
    Init,
    /// Manage goals
    Goal {
        #[command(subcommand)]
        command: GoalCommand,
    },
    /// Manage check-ins
    Checkin {
        #[command(subcommand)]
        command: CheckinCommand,
    },
    /// Rebuild the local site from the current record (no transport)
    Build,
    /// Push the current local site to the hosting branch (no rebuild)
    Publish,
}

#[derive(Subcommand)]
pub enum GoalCommand {
    /// Create a new goal
    Add {
        /// Display title
        title: String,
        /// Measurement kind: binary, numeric, or percent
        #[arg(long)]
        kind: String,
        /// Target value (required for numeric goals)
        #[arg(long)]
        target: Option<f64>,
        /// Unit label for display, e.g. "books"
        #[arg(long)]
        unit: Option<String>,
        /// Longer description for the detail page
        #[arg(long, default_value = "")]
        description: String,
        /// Explicit slug (default: derived from the title)
        #[arg(long)]
        slug: Option<String>,
        /// Commit and rebuild locally, but skip the push
        #[arg(long)]
        no_publish: bool,
    },
    /// Archive a goal (kept in history, removed from the overview)
    Archive {
        slug: String,
        #[arg(long)]
        no_publish: bool,
    },
    /// Bring an archived goal back to the overview
    Reactivate {
        slug: String,
        #[arg(long)]
        no_publish: bool,
    },
    /// List goals
    List {
        /// Include archived goals
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum CheckinCommand {
    /// Record a progress observation against a goal
    Add {
        /// Slug of the goal
        slug: String,
        /// Value: 0/1 for binary, a delta for numeric, an absolute
        /// percentage for percent goals
        #[arg(long)]
        value: f64,
        /// Observation date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Free-text note
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        no_publish: bool,
    },
    /// Delete a mistakenly entered check-in
    Delete {
        id: Uuid,
        #[arg(long)]
        no_publish: bool,
    },
}

/// Run the parsed CLI command
pub fn run(cli: Cli) -> Result<()> {
    util::init_data_dir(cli.data_dir.clone());
    let config = Config::load();

    match cli.command {
        Command::Init => init(&config),
        Command::Goal { command } => match command {
            GoalCommand::Add {
                title,
                kind,
                target,
                unit,
                description,
                slug,
                no_publish,
            } => {
                let kind: MeasureKind = kind
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))
                    .context("--kind must be binary, numeric, or percent")?;
                let slug = slug.unwrap_or_else(|| util::make_slug(&title));
                let mutation = Mutation::CreateGoal(NewGoal {
                    slug: slug.clone(),
                    title,
                    description,
                    kind,
                    target,
                    unit,
                });
                let report = apply(&config, &mutation, no_publish)?;
                println!("Created goal '{slug}'");
                print_deploy(&report);
                Ok(())
            }
            GoalCommand::Archive { slug, no_publish } => {
                let report = apply(&config, &Mutation::ArchiveGoal { slug: slug.clone() }, no_publish)?;
                println!("Archived goal '{slug}'");
                print_deploy(&report);
                Ok(())
            }
            GoalCommand::Reactivate { slug, no_publish } => {
                let report = apply(
                    &config,
                    &Mutation::ReactivateGoal { slug: slug.clone() },
                    no_publish,
                )?;
                println!("Reactivated goal '{slug}'");
                print_deploy(&report);
                Ok(())
            }
            GoalCommand::List { all } => list_goals(&config, all),
        },
        Command::Checkin { command } => match command {
            CheckinCommand::Add {
                slug,
                value,
                date,
                note,
                no_publish,
            } => {
                let mutation = Mutation::RecordCheckIn(NewCheckIn {
                    goal_slug: slug.clone(),
                    date: date.unwrap_or_else(|| Local::now().date_naive()),
                    value,
                    note,
                });
                let report = apply(&config, &mutation, no_publish)?;
                if let Some(id) = report.receipt.check_in_id {
                    println!("Recorded check-in {id} for '{slug}'");
                }
                print_deploy(&report);
                Ok(())
            }
            CheckinCommand::Delete { id, no_publish } => {
                let report = apply(&config, &Mutation::DeleteCheckIn { id }, no_publish)?;
                println!("Deleted check-in {id}");
                print_deploy(&report);
                Ok(())
            }
        },
        Command::Build => {
            let publisher = make_publisher(&config, true)?;
            publisher.rebuild().map_err(pipeline_error)?;
            println!("Rebuilt site at {}", config.site_dir.display());
            Ok(())
        }
        Command::Publish => {
            let publisher = make_publisher(&config, false)?;
            let deploy = publisher.publish_site().map_err(pipeline_error)?;
            println!("{}", deploy.message);
            Ok(())
        }
    }
}

fn init(config: &Config) -> Result<()> {
    std::fs::create_dir_all(util::data_dir())
        .with_context(|| format!("creating {}", util::data_dir().display()))?;
    Database::open(config.db_path.clone())?;

    let config_path = util::config_path();
    if !config_path.exists() {
        std::fs::write(
            &config_path,
            "# Stride configuration\n\
             #\n\
             # [publish]\n\
             # repo-dir = \"/path/to/site-repo\"\n\
             # remote = \"origin\"\n\
             # branch = \"gh-pages\"\n",
        )?;
    }

    println!("Initialized {}", util::data_dir().display());
    Ok(())
}

fn apply(config: &Config, mutation: &Mutation, no_publish: bool) -> Result<PublishReport> {
    let publisher = make_publisher(config, no_publish)?;
    publisher
        .publish_on_update(mutation)
        .map_err(pipeline_error)
}

fn make_publisher(config: &Config, local_only: bool) -> Result<Publisher> {
    let db = Database::open(config.db_path.clone())?;
    let store = RecordStore::new(db.connection());
    let builder = SiteBuilder::new(config.staging_dir.clone());

    let transport = if local_only {
        None
    } else {
        config.publish.as_ref().map(|p| {
            GitTransport::new(p.repo_dir.clone(), p.remote.clone(), p.branch.clone())
        })
    };

    Ok(Publisher::new(store, builder, config.site_dir.clone(), transport))
}

fn list_goals(config: &Config, all: bool) -> Result<()> {
    let db = Database::open(config.db_path.clone())?;
    let store = RecordStore::new(db.connection());
    let state = store.read_all()?;

    if state.goals.is_empty() {
        println!("No goals yet. Create one with `stride goal add`.");
        return Ok(());
    }

    for goal in &state.goals {
        if goal.is_archived() && !all {
            continue;
        }
        let status = if goal.is_archived() { " (archived)" } else { "" };
        let target = match goal.target {
            Some(t) => format!(" target {t}"),
            None => String::new(),
        };
        println!(
            "{:<24} {:<8}{} {} check-ins{}",
            goal.slug,
            goal.kind.as_str(),
            target,
            state.check_ins_for(goal.id).len(),
            status,
        );
    }
    Ok(())
}

fn print_deploy(report: &PublishReport) {
    match &report.deploy {
        Some(deploy) => println!("{}", deploy.message),
        None => println!("Site rebuilt locally; run `stride publish` to push it."),
    }
}

/// Surface which pipeline step failed so the user knows what to retry.
fn pipeline_error(e: PublishError) -> anyhow::Error {
    match e.stage() {
        "commit" => anyhow::anyhow!("{e}\nNothing was changed."),
        "build" => anyhow::anyhow!(
            "{e}\nThe record was updated; run `stride build` to retry the site build."
        ),
        _ => anyhow::anyhow!(
            "{e}\nThe site was built locally; run `stride publish` to retry the push."
        ),
    }
}
