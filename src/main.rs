use anyhow::Result;
use tracing::info;

use dayboard::repository::{database, Repository};
use dayboard::services::{BoardService, PlannerService, SettingsService};
use dayboard::sync::GoogleTasksClient;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let pool = database::init_database("dayboard.db").await?;
    let repo = Repository::new(pool);

    let sync = GoogleTasksClient::new(std::env::var("GOOGLE_TASKS_TOKEN").ok());
    if sync.is_enabled() {
        info!("google tasks sync enabled");
    }

    let board = BoardService::new(repo.clone(), sync);
    let planner = PlannerService::new(repo.clone());
    let settings = SettingsService::new(repo.clone());

    let (tasks, sections) = board.load().await?;
    let plans = planner.list_active().await?;
    let view = settings
        .last_active_view()
        .await?
        .unwrap_or_else(|| "board".to_string());

    info!(
        tasks = tasks.tasks().len(),
        sections = sections.len(),
        plans = plans.len(),
        %view,
        "dayboard ready"
    );
    Ok(())
}
