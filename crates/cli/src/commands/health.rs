//! Backend health check.

use super::{CliError, Context};

/// Check the backend and report the result.
///
/// # Errors
///
/// Returns an error if the backend is unreachable or unhealthy.
pub async fn check(ctx: &Context) -> Result<(), CliError> {
    ctx.client.health().await?;
    tracing::info!("Backend is healthy");
    Ok(())
}
