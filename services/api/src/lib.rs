mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use aura_diagnosis::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
