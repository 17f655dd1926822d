use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;

use mentorbot::config;
use mentorbot::db::Database;
use mentorbot::scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Begin logger
    env_logger::init();

    dotenv().ok();

    // Initialize database
    let db = Arc::new(Database::open(config::database_path())?);
    log::info!("Database initialized");

    // The progression jobs run for the lifetime of the process, next to the
    // interactive handlers, sharing only the database handle.
    let mut scheduler = Scheduler::new(Arc::clone(&db));
    scheduler.start()?;

    let result = mentorbot::bot::run_bot(db).await;

    scheduler.shutdown();
    result
}
