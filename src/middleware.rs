use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::metrics::{QUOTA_ADMITTED, QUOTA_REJECTED, REQUEST_TOTAL};
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const QUOTA_EXCEEDED_BODY: &str = "Quota exceeded. Try again later.";

/// Quota check run ahead of every handler.
///
/// Calls carrying an `x-api-key` header are charged against that key's
/// window; over-quota calls get a 429 and never reach the handler. Calls
/// without the header pass straight through and are left to the handler's
/// own key validation.
pub async fn enforce_quota(State(state): State<AppState>, request: Request, next: Next) -> Response {
    REQUEST_TOTAL.inc();

    let admitted = match request.headers().get(API_KEY_HEADER) {
        Some(value) if !value.is_empty() => {
            let identity = String::from_utf8_lossy(value.as_bytes());
            let admitted = state.gate.try_acquire(&identity, state.clock.now());
            if !admitted {
                warn!(
                    key = %redact(&identity),
                    limit = state.gate.limit(),
                    window = ?state.gate.window(),
                    "quota exceeded"
                );
            }
            Some(admitted)
        }
        _ => None,
    };

    match admitted {
        Some(false) => {
            QUOTA_REJECTED.inc();
            (StatusCode::TOO_MANY_REQUESTS, QUOTA_EXCEEDED_BODY).into_response()
        }
        Some(true) => {
            QUOTA_ADMITTED.inc();
            next.run(request).await
        }
        None => next.run(request).await,
    }
}

// Only the first few characters of a key go to the logs
fn redact(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}***")
}
