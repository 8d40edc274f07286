//! Standalone job board service: the open CRUD catalog next to the
//! marketplace API, listening on its own port.

mod infra;
mod server;

use internlink::error::AppError;

pub async fn run() -> Result<(), AppError> {
    server::run().await
}
