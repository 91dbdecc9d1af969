mod cli;
mod infra;
mod report_cmd;
mod routes;
mod server;

use opsboard::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
