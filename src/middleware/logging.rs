use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::{error, info};

use crate::error::ErrorReport;

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<ErrorReport>() {
        Some(report) => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            error = %report.0,
            "Failed to process request"
        ),
        None => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
    }

    response
}
