//! API router setup with Swagger UI and middleware.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{self, ErrorResponse, HealthResponse, SttResponse};
use super::state::ApiState;

/// Upper bound on an uploaded clip (64 MiB). axum's default multipart limit
/// is too small for real recordings.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "sttd API",
        version = "1.0.0",
        description = "Speech-to-text HTTP service powered by Whisper",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(handlers::stt, handlers::health),
    components(schemas(SttResponse, HealthResponse, ErrorResponse)),
    tags(
        (name = "Transcription", description = "Audio transcription endpoints"),
        (name = "Health", description = "Health check endpoints"),
    )
)]
struct ApiDoc;

/// Create the API router with all routes and middleware.
pub fn create_router(state: ApiState, swagger_ui: bool) -> Router {
    let mut router = Router::new()
        .route("/stt", post(handlers::stt))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    if swagger_ui {
        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    // The service is meant to sit behind browser clients on arbitrary
    // origins, so CORS is wide open.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}
