//! `depcapture fetch` command.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use http::{HeaderName, HeaderValue, Method, Request, Response};
use parking_lot::Mutex;
use tracing::info;

use crate::adapters::live::ReqwestTransport;
use crate::adapters::recording::{CassetteSink, MockIds, StaticProbe};
use crate::adapters::replaying::CassetteReplay;
use crate::body::Body;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::InterceptorConfig;
use crate::context::Mode;
use crate::error::InterceptError;
use crate::interceptor::{Interceptor, StreamDelivery};

/// Arguments of the `fetch` command.
#[derive(Debug)]
pub struct FetchArgs<'a> {
    /// Request URL.
    pub url: &'a str,
    /// Request method.
    pub method: &'a str,
    /// Request body, if any.
    pub data: Option<&'a str>,
    /// Raw `name: value` headers.
    pub headers: &'a [String],
    /// Mode override.
    pub mode: Option<&'a str>,
    /// Test identifier override.
    pub test_id: Option<&'a str>,
    /// Cassette override.
    pub cassette: Option<&'a Path>,
}

/// Execute the `fetch` command.
///
/// # Errors
///
/// Returns an error string if configuration is invalid, the request cannot be
/// built, or the intercepted call fails.
pub fn run(args: &FetchArgs<'_>) -> Result<(), String> {
    let config = resolve_config(args)?;
    let request = build_request(args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start async runtime: {e}"))?;
    let response = runtime.block_on(fetch_with_config(&config, request))?;
    print_response(response)
}

/// Environment configuration with command-line overrides applied.
fn resolve_config(args: &FetchArgs<'_>) -> Result<InterceptorConfig, String> {
    let mut config = InterceptorConfig::from_env().map_err(|e| e.to_string())?;
    if let Some(mode) = args.mode {
        config.mode = mode.parse().map_err(|e: InterceptError| e.to_string())?;
    }
    if let Some(test_id) = args.test_id {
        config.test_id = test_id.to_string();
    }
    if let Some(cassette) = args.cassette {
        config.mock_path = Some(cassette.to_path_buf());
    }
    Ok(config)
}

fn build_request(args: &FetchArgs<'_>) -> Result<Request<Body>, String> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|e| format!("Invalid method {}: {e}", args.method))?;
    let mut builder = Request::builder().method(method).uri(args.url);
    for raw in args.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("Invalid header {raw:?}: expected `name: value`"))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| format!("Invalid header name {name:?}: {e}"))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| format!("Invalid header value {value:?}: {e}"))?;
        builder = builder.header(name, value);
    }
    let body = args.data.map_or(Body::Absent, |data| Body::from_bytes(data.to_string()));
    builder.body(body).map_err(|e| format!("Invalid request: {e}"))
}

/// Sends one request through an interceptor wired from `config`.
///
/// In record mode with a cassette, captured records are written to it after
/// the call, whether the call succeeded or not. In test mode the cassette is
/// the replay source and the network is never used.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded or written, or
/// the intercepted call fails.
pub async fn fetch_with_config(
    config: &InterceptorConfig,
    request: Request<Body>,
) -> Result<Response<Body>, String> {
    let ctx = config.context();
    let transport =
        ReqwestTransport::new().map_err(|e| format!("Failed to build HTTP client: {e}"))?;
    let mut interceptor = Interceptor::new(Arc::new(transport)).with_context(ctx.clone());

    let recorder = match (config.mode, config.mock_path.as_deref()) {
        (Mode::Test, Some(path)) => {
            interceptor = interceptor.with_replay(Arc::new(CassetteReplay::load(path)?));
            None
        }
        (Mode::Test, None) => {
            return Err("test mode requires a cassette (--cassette or DEPCAPTURE_MOCK_PATH)".into())
        }
        (Mode::Record, Some(path)) => {
            Some(Arc::new(Mutex::new(CassetteRecorder::new(path, config.test_id.clone()))))
        }
        (Mode::Record | Mode::Off, _) => None,
    };

    if let (Some(recorder), true) = (&recorder, config.file_export) {
        let destination = recorder.lock().path().display().to_string();
        interceptor = interceptor.with_delivery(StreamDelivery {
            sink: Arc::new(CassetteSink::new(Arc::clone(recorder))),
            dedup: Arc::new(MockIds::new()),
            probe: Arc::new(StaticProbe(config.collector)),
            destination,
        });
    }

    let result = interceptor.intercept(request).await;

    if let Some(recorder) = recorder {
        // Drop the interceptor first to release the sink's reference.
        drop(interceptor);
        let mut recorder = Arc::try_unwrap(recorder)
            .map_err(|_| "Cassette recorder still has references".to_string())?
            .into_inner();
        recorder.extend(ctx.mocks());
        let path = recorder.finish().map_err(|e| format!("Failed to write cassette: {e}"))?;
        info!(path = %path.display(), test_id = ctx.test_id(), "cassette written");
    }

    result.map_err(|e| e.to_string())
}

fn print_response(response: Response<Body>) -> Result<(), String> {
    let status = response.status();
    let body = response.into_body().into_bytes().map_err(|e| format!("Failed to read body: {e}"))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{status}").map_err(|e| e.to_string())?;
    stdout.write_all(&body).map_err(|e| e.to_string())?;
    writeln!(stdout).map_err(|e| e.to_string())
}
