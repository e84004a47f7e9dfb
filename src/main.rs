use std::error::Error;
use std::sync::Arc;

use futures::future::FutureExt;
use slog::info;
use tokio::sync::mpsc;
use warp::Filter;

use doctor_registry::config::{get_port, get_variable};
use doctor_registry::db::PgDb;
use doctor_registry::environment::Environment;
use doctor_registry::log::initialize_logger;
use doctor_registry::routes;
use doctor_registry::store::DiskStore;

/// Uploaded license files land here, relative to the working
/// directory. The directory must exist before startup.
const UPLOAD_DIRECTORY: &str = "uploads";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port = get_port("PORT", 3000);
    let admin_port = get_port("REGISTRY_ADMIN_PORT", 3001);

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port);
    let logger = Arc::new(logger);

    info!(logger, "Creating database pool...");
    let connection_string = get_variable("REGISTRY_DB_CONNECTION_STRING");
    let pool = sqlx::Pool::connect(&connection_string)
        .await
        .expect("create database pool from REGISTRY_DB_CONNECTION_STRING");
    let db = Arc::new(PgDb::new(pool));

    let store = Arc::new(DiskStore::new(UPLOAD_DIRECTORY));

    let environment = Environment::new(logger.clone(), db, store);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            let termination_sender = termination_sender.clone();
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            let terminate = terminate.clone();

            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let register_route = routes::make_register_route(environment.clone());
        let index_route = routes::make_index_route();

        let routes = register_route
            .or(index_route)
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
