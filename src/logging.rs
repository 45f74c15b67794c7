use axum::{
    body::Body,
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        Method,
    },
    middleware::Next,
    response::Response,
};
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// JSON bodies larger than this are not echoed into the request log.
const MAX_LOGGED_BODY: usize = 16 * 1024;

const REDACTED_KEYS: &[&str] = &["password"];

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("portfolio_api=info,tower_http=warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

pub async fn request_logger(mut request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let is_static = path.starts_with("/galeria/")
        || path.ends_with(".js")
        || path.ends_with(".css")
        || path.ends_with(".ico");
    let payload = extract_compact_payload(&mut request).await;

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    if is_static {
        return response;
    }

    let log_line = format!(
        "{} {} {} {:05.2}ms {}",
        method,
        path,
        status.as_u16(),
        duration.as_secs_f64() * 1000.0,
        payload.unwrap_or_else(|| "{}".to_string())
    );

    match status.as_u16() {
        200..=299 => info!("{}", log_line),
        400..=499 => warn!("{}", log_line),
        500..=599 => error!("{}", log_line),
        _ => info!("{}", log_line),
    }

    response
}

/// Only small JSON POST bodies are read. Multipart uploads pass through untouched.
async fn extract_compact_payload(request: &mut Request<Body>) -> Option<String> {
    if request.method() != Method::POST {
        return None;
    }

    let headers = request.headers();
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false);
    let small = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())
        .map(|len| len <= MAX_LOGGED_BODY)
        .unwrap_or(false);
    if !is_json || !small {
        return None;
    }

    let body = std::mem::replace(request.body_mut(), Body::empty());
    let bytes = match axum::body::to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(_) => return None,
    };

    let compact = match serde_json::from_slice::<Value>(&bytes) {
        Ok(mut value) => {
            redact(&mut value);
            value.to_string()
        }
        // Never echo a body that could not be redacted.
        Err(_) => format!("<unparseable {} bytes>", bytes.len()),
    };

    *request.body_mut() = Body::from(bytes);

    Some(compact)
}

fn redact(value: &mut Value) {
    if let Value::Object(map) = value {
        for key in REDACTED_KEYS {
            if let Some(field) = map.get_mut(*key) {
                *field = Value::String("***".to_string());
            }
        }
    }
}

pub fn log_panic(info: &std::panic::PanicHookInfo) {
    let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic payload".to_string()
    };

    let location = match info.location() {
        Some(loc) => format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
        None => "unknown location".to_string(),
    };

    error!("PANIC at {}: {}", location, payload);
}

pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));
}
