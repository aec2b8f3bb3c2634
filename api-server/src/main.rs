use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use wheel_host::{SpinCoordinator, WheelConfig};

mod routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Giveaway Wheel API Server");

    let config = WheelConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    tracing::info!(
        "Transport: {}, spin duration: {:?}, {} entries",
        config.transport,
        config.spin_duration,
        config.entries.len()
    );

    let bind_address = config.bind_address.clone();
    let keepalive_every = config.keepalive;

    let coordinator = SpinCoordinator::new(config).map_err(|e| {
        tracing::error!("Failed to create spin coordinator: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;
    let keepalive = coordinator.distributor().spawn_keepalive(keepalive_every);
    let coordinator = web::Data::new(coordinator);

    tracing::info!("Binding to {}", bind_address);

    let result = HttpServer::new(move || {
        // Configure CORS to allow all origins
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .max_age(86400);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(coordinator.clone())
            .configure(routes::configure)
    })
    .bind(bind_address)?
    .run()
    .await;

    keepalive.abort();
    result
}
