use anyhow::Result;
use futures::TryStreamExt;
use serde_json::json;
use sheetpress::{
    config::Settings, response::ApiResponse, Conversion, ConvertError, Converter,
};
use std::{convert::Infallible, io, sync::Arc, time::Instant};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};
use warp::{
    http::StatusCode,
    hyper::body::Buf,
    multipart::FormData,
    reject::Rejection,
    reply::{self, Reply},
    Filter,
};

/// Multipart field carrying the spreadsheet.
const UPLOAD_FIELD: &str = "excel_file";

struct AppState {
    converter: Converter,
    expose_details: bool,
}

fn status_for(err: &ConvertError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(reply::json(&json!({
        "status": "healthy",
        "service": "sheetpress"
    })))
}

/// Pulls the upload field out of the form, buffering its bytes.
async fn read_upload_field(form: FormData) -> Result<(String, Vec<u8>), ConvertError> {
    let upload_err = |e: warp::Error| ConvertError::Upload {
        context: "reading multipart body".to_string(),
        source: io::Error::other(e),
    };

    let mut form = Box::pin(form);
    while let Some(part) = form.try_next().await.map_err(upload_err)? {
        if part.name() != UPLOAD_FIELD {
            continue;
        }
        let name = part.filename().unwrap_or_default().to_string();
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, mut buf| async move {
                while buf.has_remaining() {
                    let chunk = buf.chunk();
                    let len = chunk.len();
                    acc.extend_from_slice(chunk);
                    buf.advance(len);
                }
                Ok(acc)
            })
            .await
            .map_err(upload_err)?;
        return Ok((name, bytes));
    }
    Err(ConvertError::MissingInput("No file uploaded".to_string()))
}

async fn receive_and_convert(form: FormData, state: &AppState) -> Result<Conversion, ConvertError> {
    let (name, bytes) = read_upload_field(form).await?;
    info!(file = %name, bytes = bytes.len(), "received upload");

    // offload parsing and compression to the blocking pool
    let converter = state.converter.clone();
    tokio::task::spawn_blocking(move || {
        let input = converter.stage(&name, bytes.as_slice())?;
        converter.convert(input)
    })
    .await
    .map_err(|e| ConvertError::Upload {
        context: "conversion task".to_string(),
        source: io::Error::other(e),
    })?
}

async fn upload(form: FormData, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    let start = Instant::now();

    let (response, status) = match receive_and_convert(form, &state).await {
        Ok(conversion) => {
            info!(
                "✅ converted → {} ({} rows) in {:.3}s",
                conversion.archive_name(),
                conversion.summary.rows_written,
                start.elapsed().as_secs_f64()
            );
            (ApiResponse::converted(&conversion), StatusCode::OK)
        }
        Err(err) => {
            warn!(
                kind = err.kind(),
                "❌ conversion failed after {:.3}s: {}",
                start.elapsed().as_secs_f64(),
                err.details()
            );
            (
                ApiResponse::failed(&err, state.expose_details),
                status_for(&err),
            )
        }
    };

    Ok(reply::with_status(reply::json(&response), status))
}

async fn download(name: String, state: Arc<AppState>) -> Result<reply::Response, Rejection> {
    let not_found = |message: String| {
        reply::with_status(reply::json(&ApiResponse::message(message)), StatusCode::NOT_FOUND)
            .into_response()
    };

    let Some(path) = state.converter.archive_for_download(&name) else {
        return Ok(not_found(format!("File not found: {}", name)));
    };
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let zip = reply::with_header(bytes, "content-type", "application/zip");
            let zip = reply::with_header(
                zip,
                "content-disposition",
                format!("attachment; filename=\"{}\"", name),
            );
            Ok(zip.into_response())
        }
        Err(e) => Ok(not_found(format!("File not found: {}", e))),
    }
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "File too large")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        warn!("rejected request: {:?}", err);
        (StatusCode::BAD_REQUEST, "Invalid request")
    };
    Ok(reply::with_status(
        reply::json(&ApiResponse::message(message)),
        status,
    ))
}

fn routes(
    state: Arc<AppState>,
    max_upload_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let health_route = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let upload_route = warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_state.clone())
        .and_then(upload);

    let download_route = warp::path!("uploads" / String)
        .and(warp::get())
        .and(with_state)
        .and_then(download);

    health_route
        .or(upload_route)
        .or(download_route)
        .recover(handle_rejection)
        .with(warp::trace::request())
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(settings.log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    info!("Starting spreadsheet conversion service");

    let converter = Converter::new(&settings.upload_dir)?;
    let state = Arc::new(AppState {
        converter,
        expose_details: settings.expose_error_details,
    });

    let port = settings.port;
    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/health", port);
    info!("Upload endpoint: POST http://localhost:{}/upload", port);
    info!("Archives: GET http://localhost:{}/uploads/<file>", port);

    warp::serve(routes(state, settings.max_upload_bytes()))
        .run(([0, 0, 0, 0], port))
        .await;

    Ok(())
}
