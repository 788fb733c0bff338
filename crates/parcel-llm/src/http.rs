//! HTTP failure classification shared by the provider clients

use parcel_domain::{FatalKind, GenerationError};
use std::time::Duration;

/// Default timeout for generation requests (60 seconds)
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Map a non-success HTTP status onto the generation error taxonomy
pub(crate) fn classify_status(
    status: u16,
    body: &str,
    retry_after: Option<Duration>,
) -> GenerationError {
    let message = format!("HTTP {}: {}", status, body);
    match status {
        429 => GenerationError::RateLimited { retry_after },
        401 | 403 => GenerationError::fatal(FatalKind::Authentication, message),
        404 => GenerationError::fatal(FatalKind::ModelNotAvailable, message),
        408 | 409 | 425 => GenerationError::Transient(message),
        500..=599 => GenerationError::Transient(message),
        _ => GenerationError::fatal(FatalKind::MalformedRequest, message),
    }
}

/// Map a transport-level reqwest failure onto the generation error taxonomy
pub(crate) fn classify_transport(error: &reqwest::Error) -> GenerationError {
    if error.is_decode() {
        GenerationError::fatal(FatalKind::InvalidResponse, error.to_string())
    } else if error.is_builder() {
        GenerationError::fatal(FatalKind::MalformedRequest, error.to_string())
    } else {
        GenerationError::Transient(format!("Request failed: {}", error))
    }
}

/// Parse a `retry-after` header given in whole seconds
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Send a prepared request and return the body of a successful response
pub(crate) async fn send(request: reqwest::RequestBuilder) -> Result<String, GenerationError> {
    let response = request.send().await.map_err(|e| classify_transport(&e))?;
    let status = response.status();
    let wait = retry_after(response.headers());
    let body = response.text().await.map_err(|e| classify_transport(&e))?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(classify_status(status.as_u16(), &body, wait))
    }
}
