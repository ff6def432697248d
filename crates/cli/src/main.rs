//! SkillPath CLI - learning roadmaps from known skills to a target role.

mod catalog;

use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use skillpath_core::{ModuleId, ProgressStatus, RoadmapId, SkillpathConfig, UserId, UserSkillProfile};
use skillpath_planner::{BasicRoadmapPlanner, GapAnalysis, RoadmapPlanner};
use skillpath_progress::{BasicProgressTracker, ProgressTracker, ProgressUpdate, TimeCalculation};
use skillpath_storage::{JsonStorage, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skillpath")]
#[command(about = "Personalised learning roadmaps", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file
    #[arg(short, long, default_value = "skillpath.json")]
    config: PathBuf,

    /// Storage path (overrides the config file)
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a skill catalog
    Import {
        /// Catalog JSON file
        file: PathBuf,
    },
    /// Set the skills a user already knows
    Profile {
        /// User ID
        user: String,
        /// Known skills (slugs or ids)
        skills: Vec<String>,
    },
    /// Show the skill gap for a target role
    Gap {
        /// User ID
        user: String,
        /// Target role
        role: String,
    },
    /// Generate a roadmap
    Generate {
        /// User ID
        user: String,
        /// Target role
        role: String,
    },
    /// Show roadmap modules
    Show {
        /// Roadmap ID
        roadmap: String,
    },
    /// Estimate roadmap learning time
    Estimate {
        /// Roadmap ID
        roadmap: String,
    },
    /// Update progress on a module
    Progress {
        /// User ID
        user: String,
        /// Roadmap ID
        roadmap: String,
        /// Module ID
        module: String,
        /// not_started | in_progress | completed | skipped
        status: String,
        /// Time spent, in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Skip a module (or un-skip it)
    Skip {
        /// Roadmap ID
        roadmap: String,
        /// Module ID
        module: String,
        /// Clear the skip flag instead
        #[arg(long)]
        undo: bool,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = SkillpathConfig::load(&cli.config)?;
    let storage_path = cli.storage.clone().unwrap_or_else(|| config.storage_path.clone());
    let storage = Arc::new(JsonStorage::new(&storage_path).await?);
    info!("Using storage at {}", storage_path.display());

    let planner = BasicRoadmapPlanner::new(storage.clone())
        .with_sequencer_config(config.sequencer)
        .with_time_config(config.time);
    let tracker = BasicProgressTracker::new(storage.clone()).with_time_config(config.time);

    match cli.command {
        Commands::Import { file } => {
            let raw = std::fs::read_to_string(&file)?;
            let summary = catalog::import(storage.as_ref(), serde_json::from_str(&raw)?).await?;
            println!(
                "Imported {} skills, {} dependencies, {} resources",
                summary.skills, summary.dependencies, summary.resources
            );
        }
        Commands::Profile { user, skills } => {
            let profile = UserSkillProfile {
                user_id: UserId::new(user),
                known_skills: skills,
                updated_at: Utc::now(),
            };
            storage.save_profile(&profile).await?;
            println!("Saved {} known skills for {}", profile.known_skills.len(), profile.user_id);
        }
        Commands::Gap { user, role } => {
            let gap = planner.analyze_gap(&UserId::new(user), &role).await?;
            if cli.json {
                print_json(&gap)?;
            } else {
                print_gap(&gap);
            }
        }
        Commands::Generate { user, role } => {
            let generated = planner.generate_roadmap(&UserId::new(user), &role).await?;
            if cli.json {
                print_json(&generated)?;
            } else {
                println!("Roadmap: {}", generated.roadmap.id);
                print_gap(&generated.analysis);
                print_time(&generated.time);
            }
        }
        Commands::Show { roadmap } => {
            let roadmap_id = parse_roadmap(&roadmap)?;
            let Some(roadmap) = storage.load_roadmap(roadmap_id).await? else {
                println!("Roadmap not found");
                return Ok(());
            };
            let modules = storage.list_modules(roadmap_id).await?;
            if cli.json {
                print_json(&serde_json::json!({ "roadmap": roadmap, "modules": modules }))?;
                return Ok(());
            }

            println!("Roadmap: {} ({})", roadmap.id, roadmap.target_role);
            println!("  Estimated: {:.1}h", roadmap.estimated_hours);
            println!("  Completed: {:.1}h", roadmap.completed_hours);
            for module in modules {
                let progress = storage.load_progress(&roadmap.user_id, module.id).await?;
                println!(
                    "  {:>3}. {} | {} | {}{}",
                    module.sequence_order,
                    module.id,
                    progress.map_or(ProgressStatus::NotStarted, |p| p.status),
                    if module.is_locked { "LOCKED" } else { "open" },
                    if module.is_skipped { " (skipped)" } else { "" },
                );
            }
        }
        Commands::Estimate { roadmap } => {
            let time = tracker.estimate_roadmap(parse_roadmap(&roadmap)?).await?;
            if cli.json {
                print_json(&time)?;
            } else {
                print_time(&time);
            }
        }
        Commands::Progress { user, roadmap, module, status, minutes, notes } => {
            let status: ProgressStatus = status.parse().map_err(|e: String| anyhow!(e))?;
            let outcome = tracker
                .update_module_progress(ProgressUpdate {
                    user_id: UserId::new(user),
                    roadmap_id: parse_roadmap(&roadmap)?,
                    module_id: parse_module(&module)?,
                    status,
                    time_spent_minutes: minutes,
                    notes,
                })
                .await?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("Module {} is now {}", outcome.progress.module_id, outcome.progress.status);
                for unlocked in &outcome.unlocked_modules {
                    println!("  Unlocked module #{}: {}", unlocked.sequence_order, unlocked.id);
                }
                println!("  Completed hours: {:.1}", outcome.completed_hours);
            }
        }
        Commands::Skip { roadmap, module, undo } => {
            let time = tracker
                .set_module_skipped(parse_roadmap(&roadmap)?, parse_module(&module)?, !undo)
                .await?;
            if cli.json {
                print_json(&time)?;
            } else {
                print_time(&time);
            }
        }
    }

    Ok(())
}

fn parse_roadmap(s: &str) -> Result<RoadmapId> {
    s.parse().map_err(|_| anyhow!("Invalid roadmap ID: {}", s))
}

fn parse_module(s: &str) -> Result<ModuleId> {
    s.parse().map_err(|_| anyhow!("Invalid module ID: {}", s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_gap(gap: &GapAnalysis) {
    println!("Missing skills ({}), {:.1}h", gap.missing_skills.len(), gap.total_hours);
    for group in &gap.phase_groups {
        println!("  {} ({:.1}h)", group.phase, group.total_hours);
        for s in &group.skills {
            println!("    {:>3}. {} ({:.1}h)", s.sequence_order, s.skill.slug, s.skill.estimated_hours);
        }
    }
    if let Some(path) = &gap.circular_dependency_path {
        println!("  Warning: circular dependency {}", path.join(" -> "));
    }
}

fn print_time(time: &TimeCalculation) {
    println!("Time estimate");
    for line in &time.module_breakdown {
        println!(
            "  {} | {:.1}h{}",
            line.slug,
            line.time.total_time_hours,
            if line.is_skipped { " (skipped)" } else { "" }
        );
    }
    println!("  Resources: {:.1}h", time.total_resource_time_hours);
    println!("  Practice:  {:.1}h", time.total_practice_time_hours);
    println!("  Buffer:    {:.1}h", time.buffer_hours);
    println!("  Total:     {:.1}h (~{}h)", time.total_estimated_hours, time.rounded_total_hours);
}
