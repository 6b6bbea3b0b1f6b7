use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use graphdesk_app::{
    CatalogKind, HttpJobService, HttpTutorBackend, JobMonitor, MemoryGraphService,
    StudioController, StudioSettings,
};
use graphdesk_core::NodeId;
use graphdesk_events::Event;
use graphdesk_graph::{FilterState, LayoutMode, render_evidence_text};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LayoutArg {
    Force,
    Hierarchical,
    Tiered,
    Radial,
}

impl From<LayoutArg> for LayoutMode {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Force => LayoutMode::ForceDirected,
            LayoutArg::Hierarchical => LayoutMode::Hierarchical,
            LayoutArg::Tiered => LayoutMode::Tiered,
            LayoutArg::Radial => LayoutMode::Radial,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Query and project a property graph", long_about = None)]
struct Args {
    /// JSON graph fixture to load into the in-memory store
    #[arg(short, long)]
    fixture: PathBuf,

    /// Settings file (defaults to the platform config directory)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Restrict to nodes carrying this label (repeatable)
    #[arg(long = "label")]
    labels: Vec<String>,

    /// Restrict to relationships of this type (repeatable)
    #[arg(long = "rel-type")]
    rel_types: Vec<String>,

    #[arg(long, value_enum)]
    layout: Option<LayoutArg>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Newest nodes with their neighbours
    Overview,
    /// Overview, then the neighbours of one node merged in
    Expand { id: String },
    /// Traversals from the first node matching KEYWORD
    Paths {
        keyword: String,
        #[arg(long)]
        depth: Option<u32>,
    },
    /// Nodes matching KEYWORD, without touching the canvas
    Search {
        keyword: String,
        #[arg(long)]
        label: Option<String>,
    },
    /// Tutor evidence gathered around nodes matching QUERY
    Evidence {
        query: String,
        /// Print the prompt text instead of JSON
        #[arg(long)]
        text: bool,
    },
    /// Distinct labels and relationship types
    Catalog,
    /// Ask the tutor backend a question grounded in the overview
    Ask { question: String },
    /// Prerequisite concepts and practice tasks for a skill
    SkillPlan { id: String },
    /// Indicators and behaviours for a competency
    Guide { id: String },
    /// Poll ingestion jobs until all of them finish
    WatchJobs {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Upload a document for ingestion and wait for its job
    Upload {
        file: PathBuf,
        /// Target database (defaults to the configured one)
        #[arg(long)]
        db: Option<String>,
    },
}

fn job_monitor(settings: &StudioSettings, controller: &StudioController) -> Result<Arc<JobMonitor>> {
    let jobs = HttpJobService::new(&settings.jobs.base_url, settings.jobs.timeout())
        .context("Invalid job service URL")?;
    Ok(Arc::new(JobMonitor::new(
        Arc::new(jobs),
        controller.event_bus().clone(),
        settings.jobs.poll_interval(),
    )))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => StudioSettings::load(path)?,
        None => StudioSettings::load_default()?,
    };
    if let Some(layout) = args.layout {
        settings.layout.mode = layout.into();
    }

    let service = MemoryGraphService::load(&args.fixture)?;
    tracing::info!(
        "Loaded {} nodes and {} relationships from {:?}",
        service.node_count(),
        service.relation_count(),
        args.fixture
    );

    let tutor = HttpTutorBackend::new(&settings.tutor.base_url, settings.tutor.timeout())
        .context("Invalid tutor backend URL")?;
    let controller = StudioController::new(Arc::new(service), settings.clone())
        .with_tutor(Arc::new(tutor))
        .with_filter(FilterState::new(args.labels, args.rel_types));

    match args.command {
        Command::Overview => {
            controller.load_overview().await?;
            print_json(&controller.frame())?;
        }
        Command::Expand { id } => {
            controller.load_overview().await?;
            controller.expand(&NodeId::new(id)).await?;
            print_json(&controller.frame())?;
        }
        Command::Paths { keyword, depth } => {
            controller.search_paths(&keyword, depth).await?;
            print_json(&controller.frame())?;
        }
        Command::Search { keyword, label } => {
            let nodes = controller.search_nodes(&keyword, label.as_deref()).await?;
            print_json(&nodes)?;
        }
        Command::Evidence { query, text } => {
            controller.load_overview().await?;
            let evidence = controller.evidence_for(&query);
            if text {
                println!("{}", render_evidence_text(&evidence));
            } else {
                print_json(&evidence)?;
            }
        }
        Command::Catalog => {
            let labels = controller.catalog(CatalogKind::Labels).await?;
            let rel_types = controller.catalog(CatalogKind::RelationshipTypes).await?;
            print_json(&json!({ "labels": labels, "relationshipTypes": rel_types }))?;
        }
        Command::Ask { question } => {
            controller.load_overview().await?;
            println!("{}", controller.ask_tutor(&question).await?);
        }
        Command::SkillPlan { id } => {
            let plan = controller.skill_plan(&NodeId::new(id)).await?;
            println!("{}", plan.summary());
        }
        Command::Guide { id } => {
            let guide = controller.competency_guide(&NodeId::new(id)).await?;
            println!("{}", guide.summary());
        }
        Command::WatchJobs { ids } => {
            let monitor = job_monitor(&settings, &controller)?;
            for id in &ids {
                monitor.track(id.clone(), id.clone());
            }
            monitor.spawn().await.context("Job monitor stopped unexpectedly")?;
            print_json(&monitor.jobs())?;
        }
        Command::Upload { file, db } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let filename = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string());
            let database = db.unwrap_or_else(|| settings.jobs.database.clone());

            let monitor = job_monitor(&settings, &controller)?;
            monitor.submit(&filename, &bytes, &database).await?;
            monitor.spawn().await.context("Job monitor stopped unexpectedly")?;
            print_json(&monitor.jobs())?;
        }
    }

    for event in controller.event_bus().drain() {
        match event {
            Event::NoFurtherNeighbors { center } => {
                eprintln!("No further neighbours for {center}")
            }
            Event::JobUpdated {
                job_id,
                state,
                message,
            } => {
                tracing::info!("Job {} is {:?} {}", job_id, state, message.unwrap_or_default())
            }
            other => tracing::debug!("{:?}", other),
        }
    }

    Ok(())
}
