use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::info;

use copus_tracker::config::AppConfig;
use copus_tracker::error::AppError;
use copus_tracker::telemetry;
use copus_tracker::workflows::observation::{
    aggregate, legacy_breakdown, observation_router, score, EvaluationService, LoggingAuditSink,
    MemoryCompletionLedger, MemoryIdentityDirectory, MemoryRecordRepository,
    MemoryScheduleRepository, ObservationApi, PersonId, PersonRef, PersonRole, SchedulingService,
};
use copus_tracker::workflows::sheet::ObservationSheetImporter;

#[derive(Clone)]
struct HealthState {
    readiness: Arc<AtomicBool>,
}

#[derive(Parser, Debug)]
#[command(
    name = "copus-tracker",
    about = "Schedule COPUS classroom observations and score interval sheets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score an exported interval sheet without touching any schedule
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// CSV interval sheet exported from the observation form
    #[arg(long)]
    sheet: PathBuf,
    /// Include the legacy four-sub-metric breakdown
    #[arg(long)]
    legacy: bool,
    /// Emit the full evaluation as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Score(args) => run_score(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let schedules = Arc::new(MemoryScheduleRepository::default());
    let records = Arc::new(MemoryRecordRepository::default());
    let completion = Arc::new(MemoryCompletionLedger::default());
    let identity = Arc::new(MemoryIdentityDirectory::default());
    let audit = Arc::new(LoggingAuditSink);

    // Demo roster; a deployment wires the campus identity collaborator here.
    seed_demo_roster(&identity);

    let api = Arc::new(ObservationApi {
        scheduling: SchedulingService::new(
            schedules.clone(),
            completion.clone(),
            identity,
            audit.clone(),
        ),
        evaluation: EvaluationService::new(schedules, records, completion, audit),
    });

    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = HealthState {
        readiness: readiness_flag.clone(),
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .with_state(state)
        .merge(observation_router(api));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "copus tracker ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let intervals = ObservationSheetImporter::from_path(&args.sheet)?;
    let counts = aggregate(&intervals)?;
    let legacy = if args.legacy {
        Some(legacy_breakdown(&counts)?)
    } else {
        None
    };
    let evaluation = score(counts)?;

    if args.json {
        let payload = json!({
            "evaluation": evaluation,
            "legacy_breakdown": legacy,
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
        return Ok(());
    }

    println!("Interval sheet: {}", args.sheet.display());
    println!("Intervals scored: {}", evaluation.counts.total_intervals);
    println!("\nPercentages");
    println!("- Student actions: {}", evaluation.student_action_percentage);
    println!("- Teacher actions: {}", evaluation.teacher_action_percentage);
    println!("- Engagement: {}", evaluation.engagement_level_percentage);
    println!("- Overall: {}", evaluation.overall_percentage);
    println!("\nRating: {}", evaluation.rating.label());

    if let Some(legacy) = legacy {
        println!("\nLegacy breakdown (display-only)");
        println!("- Engagement: {}", legacy.engagement);
        println!("- Facilitation: {}", legacy.facilitation);
        println!("- Interaction: {}", legacy.interaction);
        println!("- Presentation: {}", legacy.presentation);
        println!("- Legacy average: {}", legacy.legacy_average);
    }

    Ok(())
}

fn seed_demo_roster(identity: &MemoryIdentityDirectory) {
    let roster = [
        ("fac-101", "Dr. Elena Reyes", PersonRole::Faculty, "Chemistry"),
        ("fac-102", "Dr. Samuel Okafor", PersonRole::Faculty, "Physics"),
        ("obs-301", "Priya Natarajan", PersonRole::Observer, "Center for Teaching"),
        ("coord-001", "Marcus Webb", PersonRole::Coordinator, "Center for Teaching"),
    ];
    for (id, name, role, department) in roster {
        identity.seed(PersonRef {
            id: PersonId(id.to_string()),
            name: name.to_string(),
            role,
            department: department.to_string(),
        });
    }
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<HealthState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}
