use actix_web::http::header;
use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use wheel_core::{ANIMATION_MS, POLL_IDLE_MS, POLL_SPINNING_MS, RECONNECT_DELAY_MS};
use wheel_host::{SpinCoordinator, SpinError, SpinState, Transport};

const INDEX_HTML: &str = include_str!("../static/index.html");

// Response types

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct SpinResponse {
    message: &'static str,
    #[serde(flatten)]
    state: SpinState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConfigResponse {
    entries: Vec<String>,
    transport: Transport,
    spin_duration_ms: u64,
    animation_ms: u32,
    reconnect_ms: u32,
    poll_spinning_ms: u32,
    poll_idle_ms: u32,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health))
        .route("/config", web::get().to(wheel_config))
        .service(
            web::resource("/wheel")
                .route(web::get().to(watch))
                .route(web::post().to(spin))
                .default_service(web::to(method_not_allowed)),
        );
}

// API Handlers

/// GET /wheel
/// Push: long-lived event stream starting with the current state.
/// Pull: the current state as one JSON document.
async fn watch(coordinator: web::Data<SpinCoordinator>) -> HttpResponse {
    match coordinator.config().transport {
        Transport::Push => {
            let subscription = coordinator.subscribe();
            tracing::info!(
                "Viewer {} connected ({} watching)",
                subscription.id(),
                coordinator.distributor().viewer_count()
            );

            // The stream ends when the viewer is dropped from the registry;
            // actix drops it (and with it the subscription) when the client goes away.
            let stream = futures_util::stream::unfold(subscription, |mut subscription| async move {
                let event = subscription.recv().await?;
                let frame = web::Bytes::from(event.to_sse_frame());
                Some((Ok::<_, actix_web::Error>(frame), subscription))
            });

            HttpResponse::Ok()
                .content_type("text/event-stream")
                .insert_header((header::CACHE_CONTROL, "no-cache"))
                .insert_header(("X-Accel-Buffering", "no"))
                .streaming(stream)
        }
        Transport::Pull => HttpResponse::Ok()
            .insert_header((header::CACHE_CONTROL, "no-cache"))
            .json(coordinator.snapshot()),
    }
}

/// POST /wheel
/// Start a spin
async fn spin(coordinator: web::Data<SpinCoordinator>) -> HttpResponse {
    spin_response(coordinator.request_spin())
}

fn spin_response(result: Result<SpinState, SpinError>) -> HttpResponse {
    match result {
        Ok(state) => {
            tracing::info!("Spin accepted, rotating to {}", state.rotation);
            HttpResponse::Ok().json(SpinResponse {
                message: "Wheel is spinning",
                state,
            })
        }
        Err(SpinError::AlreadySpinning) => {
            tracing::info!("Spin rejected: wheel already spinning");
            HttpResponse::BadRequest().json(MessageResponse {
                message: "Wheel is already spinning",
            })
        }
        Err(SpinError::Internal(reason)) => {
            tracing::error!("Failed to spin wheel: {}", reason);
            HttpResponse::InternalServerError().json(MessageResponse {
                message: "Error spinning wheel",
            })
        }
    }
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(MessageResponse {
        message: "Method not allowed",
    })
}

/// GET /config
/// Settings the renderer needs to draw and follow the wheel
async fn wheel_config(coordinator: web::Data<SpinCoordinator>) -> impl Responder {
    let config = coordinator.config();
    HttpResponse::Ok().json(ConfigResponse {
        entries: config.entries.clone(),
        transport: config.transport,
        spin_duration_ms: config.spin_duration.as_millis() as u64,
        animation_ms: ANIMATION_MS,
        reconnect_ms: RECONNECT_DELAY_MS,
        poll_spinning_ms: POLL_SPINNING_MS,
        poll_idle_ms: POLL_IDLE_MS,
    })
}

/// GET /health
/// Health check endpoint
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "giveaway-wheel-api"
    }))
}

/// GET /
/// Browser renderer
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}
