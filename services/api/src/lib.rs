mod cli;
mod export;
mod infra;
mod routes;
mod server;

use belt_exam::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
