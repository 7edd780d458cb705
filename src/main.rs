use std::process::ExitCode;

use chrono::Utc;
use serde::Serialize;

use mastery_engine::config::{AppConfig, EngineConfig};
use mastery_engine::logging::init_tracing;
use mastery_engine::{
    CalibrationReport, EngineContext, EngineResult, JsonContentLoader, JsonFileStore, ProgressStore,
    ProgressTracker, WeaknessAnalysis,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    generated_at: String,
    tracked_items: usize,
    migrated_items: usize,
    due_count: usize,
    due_items: Vec<String>,
    graph_edges: Option<usize>,
    weakness_summary: String,
    weaknesses: WeaknessAnalysis,
    calibration: CalibrationReport,
}

fn load_engine_config(app: &AppConfig) -> EngineResult<EngineConfig> {
    let config = match &app.engine_config_path {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::from_env(),
    };
    config.validate()?;
    Ok(config)
}

async fn run(app: AppConfig) -> EngineResult<Report> {
    let config = load_engine_config(&app)?;
    let store = JsonFileStore::open(&app.data_dir)?;
    let now = Utc::now();

    let mut tracker = ProgressTracker::new(store, config.clone());
    let migrated_items = tracker.migrate(now)?;

    let mut graph_edges = None;
    if let Some(manifest_path) = &app.manifest_path {
        let loader = JsonContentLoader::new(manifest_path.clone(), app.vocabulary_path.clone());
        let context = EngineContext::new(loader, config.graph.clone());
        match context.graph().await {
            Ok(graph) => {
                graph_edges = Some(graph.edge_count());
                tracker = tracker.with_graph(graph);
            }
            Err(e) => tracing::warn!(error = %e, "graph unavailable, continuing without it"),
        }
    }

    let tracked_items = tracker.store().get_progress().word_mastery.len();
    let due_items = tracker.due_items(now);
    let weaknesses = tracker.analyze_weaknesses(now);

    Ok(Report {
        generated_at: now.to_rfc3339(),
        tracked_items,
        migrated_items,
        due_count: due_items.len(),
        due_items,
        graph_edges,
        weakness_summary: mastery_engine::weakness::get_weakness_summary(&weaknesses),
        weaknesses,
        calibration: tracker.calibration(),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let app = AppConfig::from_env();
    let _log_guard = init_tracing(&app.log_level, app.log_dir.as_deref());

    tracing::info!(data_dir = %app.data_dir.display(), "building mastery report");

    let report = match run(app).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "report failed");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize report");
            ExitCode::FAILURE
        }
    }
}
