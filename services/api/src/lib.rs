mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use dealer_reviews::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
