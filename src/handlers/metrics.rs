use tracing::error;

use crate::error::ApiError;
use crate::metrics::gather_text;

pub async fn metrics_handler() -> Result<String, ApiError> {
    gather_text().map_err(|e| {
        error!(error = %e, "failed to encode metrics");
        ApiError::Internal
    })
}
