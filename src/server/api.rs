use crate::cli::Args;
use crate::llm::ChatClient;
use crate::models::chat::{ ApiError, ChatResponse, Message };
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use axum::{
    routing::any,
    Router,
    Json,
    body::Bytes,
    extract::State,
    http::{ Method, StatusCode },
    response::{ IntoResponse, Response },
};
use serde_json::Value;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, error };

pub const METHOD_NOT_ALLOWED_ERROR: &str = "Método no permitido";
pub const EMPTY_HISTORY_ERROR: &str = "El historial está vacío o malformado.";
pub const UPSTREAM_ERROR: &str = "Ocurrió un error procesando la solicitud.";
pub const EMPTY_COMPLETION_FALLBACK: &str = "No se recibió respuesta de la IA.";

#[derive(Clone)]
struct AppState {
    client: Arc<dyn ChatClient>,
}

/// The API surface: one stateless proxy route.
///
/// The route is registered for every method so that non-POST requests get
/// the JSON 405 body instead of axum's bare rejection.
pub fn router(client: Arc<dyn ChatClient>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", any(chat_handler))
        .layer(cors)
        .with_state(AppState { client })
}

pub async fn start_http_server(
    addr: &str,
    client: Arc<dyn ChatClient>,
    args: &Args,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    let app = router(client);

    if args.enable_tls && args.tls_cert_path.is_some() && args.tls_key_path.is_some() {
        let cert_path = args.tls_cert_path.as_ref().unwrap();
        let key_path = args.tls_key_path.as_ref().unwrap();

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
            cert_path,
            key_path
        ).await?;

        info!("Starting HTTPS API server on: https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await?;
    } else {
        info!("Starting HTTP API server on: http://{}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app.into_make_service()).await?;
    }

    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    method: Method,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return error_response(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_ERROR);
    }

    let history = match parse_history(&body) {
        Some(history) => history,
        None => return error_response(StatusCode::BAD_REQUEST, EMPTY_HISTORY_ERROR),
    };

    match state.client.complete(&history).await {
        Ok(content) => {
            let response = content.unwrap_or_else(|| EMPTY_COMPLETION_FALLBACK.to_string());
            (StatusCode::OK, Json(ChatResponse { response })).into_response()
        }
        Err(e) => {
            error!("Error al llamar al proveedor de completado: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, UPSTREAM_ERROR)
        }
    }
}

/// `history` must be a non-empty array of well-formed messages; anything
/// else collapses to the single 400 response.
fn parse_history(body: &[u8]) -> Option<Vec<Message>> {
    let value = serde_json::from_slice::<Value>(body).ok()?;
    let history = value.get("history")?;
    let entries = history.as_array()?;
    if entries.is_empty() {
        return None;
    }
    serde_json::from_value(history.clone()).ok()
}

fn error_response(code: StatusCode, message: &str) -> Response {
    (code, Json(ApiError { error: message.to_string() })).into_response()
}
