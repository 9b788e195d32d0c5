//! Tracking HTTP API
//!
//! `GET /<tracking_number>` returns the extracted record as JSON.
//! Also serves a usage page at `/`, `/health` and Prometheus text at `/metrics`.
//! Uses hyper for the HTTP server.

use crate::domain::TrackingNumber;
use crate::infra::metrics::{MetricsSummary, RequestOutcome, FETCH_BUCKET_BOUNDS};
use crate::io::fetcher::DocumentFetcher;
use crate::services::tracking::{TrackError, TrackingService};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::fmt::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info};
use uuid::Uuid;

const USAGE_HTML: &str = r#"<h1>USPS Tracking API</h1>
<p>Usage: Go to <code>/&lt;tracking_number&gt;</code> to get tracking information.</p>
<p>Example: <a href="/9400150105501041088569">/9400150105501041088569</a></p>
"#;

const INVALID_TRACKING_NUMBER: &str = "Invalid tracking number format.";

type ApiResponse = Response<Full<Bytes>>;

fn json_response(status: StatusCode, body: String) -> ApiResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("static response should not fail")
}

fn error_response(status: StatusCode, message: &str) -> ApiResponse {
    json_response(status, serde_json::json!({ "error": message }).to_string())
}

fn text_response(status: StatusCode, content_type: &str, body: impl Into<Bytes>) -> ApiResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", content_type)
        .body(Full::new(body.into()))
        .expect("static response should not fail")
}

/// HTTP status for a failed tracking request
pub fn status_for(err: &TrackError) -> StatusCode {
    match err {
        TrackError::Fetch(_) => StatusCode::BAD_GATEWAY,
        TrackError::Extraction(_) => StatusCode::NOT_FOUND,
    }
}

/// Write a counter with HELP/TYPE header
fn write_counter(output: &mut String, name: &str, help: &str, val: u64) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} counter");
    let _ = writeln!(output, "{name} {val}");
}

/// Format metrics in Prometheus text exposition format
fn format_prometheus_metrics(summary: &MetricsSummary) -> String {
    let mut output = String::with_capacity(2048);

    let _ = writeln!(output, "# HELP tracking_requests_total Tracking requests by outcome");
    let _ = writeln!(output, "# TYPE tracking_requests_total counter");
    for (outcome, val) in [
        (RequestOutcome::Success, summary.success_total),
        (RequestOutcome::NotFound, summary.not_found_total),
        (RequestOutcome::Empty, summary.empty_total),
        (RequestOutcome::FetchFailed, summary.fetch_failed_total),
        (RequestOutcome::InvalidInput, summary.invalid_total),
    ] {
        let _ = writeln!(output, "tracking_requests_total{{outcome=\"{}\"}} {val}", outcome.as_str());
    }

    write_counter(
        &mut output,
        "tracking_fetches_total",
        "Upstream page fetches attempted",
        summary.fetch_count,
    );

    let name = "tracking_fetch_latency_ms";
    let _ = writeln!(output, "# HELP {name} Upstream fetch latency in milliseconds");
    let _ = writeln!(output, "# TYPE {name} histogram");
    let mut cumulative = 0u64;
    for (i, &bound) in FETCH_BUCKET_BOUNDS.iter().enumerate() {
        cumulative += summary.fetch_buckets[i];
        let _ = writeln!(output, "{name}_bucket{{le=\"{bound}\"}} {cumulative}");
    }
    cumulative += summary.fetch_buckets[FETCH_BUCKET_BOUNDS.len()];
    let _ = writeln!(output, "{name}_bucket{{le=\"+Inf\"}} {cumulative}");
    let _ = writeln!(output, "{name}_sum {}", summary.fetch_latency_sum_ms);
    let _ = writeln!(output, "{name}_count {}", summary.fetch_count);

    output
}

/// Route one request. Split from the hyper plumbing so tests can call it directly.
pub async fn route<F: DocumentFetcher>(
    method: &Method,
    path: &str,
    service: &TrackingService<F>,
) -> ApiResponse {
    if *method != Method::GET {
        return Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("Allow", "GET")
            .body(Full::new(Bytes::from("Method Not Allowed")))
            .expect("static response should not fail");
    }

    match path {
        "/" => text_response(StatusCode::OK, "text/html; charset=utf-8", USAGE_HTML),
        "/favicon.ico" => text_response(StatusCode::NO_CONTENT, "image/x-icon", Bytes::new()),
        "/health" => text_response(StatusCode::OK, "text/plain", "ok"),
        "/metrics" => {
            let body = format_prometheus_metrics(&service.metrics().report());
            text_response(StatusCode::OK, "text/plain; version=0.0.4; charset=utf-8", body)
        }
        _ => {
            let segment = path.trim_start_matches('/');
            if segment.contains('/') {
                return text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found");
            }
            track_segment(segment, service).await
        }
    }
}

async fn track_segment<F: DocumentFetcher>(
    segment: &str,
    service: &TrackingService<F>,
) -> ApiResponse {
    let number = match TrackingNumber::parse(segment) {
        Ok(number) => number,
        Err(e) => {
            service.metrics().record_request(RequestOutcome::InvalidInput);
            debug!(segment = %segment, error = %e, "tracking_number_rejected");
            return error_response(StatusCode::BAD_REQUEST, INVALID_TRACKING_NUMBER);
        }
    };

    match service.track(&number).await {
        Ok(record) => json_response(StatusCode::OK, record.to_json()),
        Err(e) => error_response(status_for(&e), &e.to_string()),
    }
}

/// Handle HTTP requests
async fn handle_request<F: DocumentFetcher>(
    req: Request<hyper::body::Incoming>,
    service: Arc<TrackingService<F>>,
) -> Result<ApiResponse, Infallible> {
    let request_id = Uuid::now_v7();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    drop(req);

    let response = route(&method, &path, service.as_ref()).await;
    debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        "http_request"
    );
    Ok(response)
}

/// Start the tracking API HTTP server
pub async fn start_api_server<F: DocumentFetcher + 'static>(
    addr: SocketAddr,
    service: Arc<TrackingService<F>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, service, &mut shutdown).await
}

/// Accept loop on an already-bound listener
pub async fn serve<F: DocumentFetcher + 'static>(
    listener: TcpListener,
    service: Arc<TrackingService<F>>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!(addr = %listener.local_addr()?, "api_server_started");

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        let io = TokioIo::new(stream);
                        let service = service.clone();

                        tokio::spawn(async move {
                            let svc = service_fn(move |req| {
                                let service = service.clone();
                                async move { handle_request(req, service).await }
                            });

                            if let Err(e) = http1::Builder::new()
                                .serve_connection(io, svc)
                                .await
                            {
                                error!(error = %e, "api_http_error");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "api_accept_error");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("api_server_shutdown");
                    return Ok(());
                }
            }
        }
    }
}
