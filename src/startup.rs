//! src/startup.rs

use crate::configuration::{ApplicationSettings, DatabaseSettings, Settings};
use crate::dispatcher::Dispatcher;
use crate::error::SyncResult;
use crate::ledger::PgRequestLedger;
use crate::record_store::PgRecordStore;
use crate::routes::{health_check, update_users};
use actix_web::{dev::Server, web, web::Data, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Wire the Postgres stores and the third-party API client into a dispatcher and bind the server.
    pub async fn build(configuration: Settings) -> SyncResult<Self> {
        let connection_pool = get_connection_pool(&configuration.database);
        let limits = configuration
            .dispatch
            .limits()
            .context("Invalid dispatch configuration.")?;
        let dispatcher = Dispatcher::new(
            Arc::new(PgRecordStore::new(connection_pool.clone())),
            Arc::new(PgRequestLedger::new(connection_pool)),
            Arc::new(configuration.third_party_api.client()),
            limits,
        );
        Self::build_with_dispatcher(&configuration.application, dispatcher)
    }

    pub fn build_with_dispatcher(
        configuration: &ApplicationSettings,
        dispatcher: Dispatcher,
    ) -> SyncResult<Self> {
        let address = format!("{}:{}", configuration.host, configuration.port);
        let listener = TcpListener::bind(&address)
            .with_context(|| format!("Failed to bind to {}.", address))?;
        let port = listener
            .local_addr()
            .context("Failed to read the local address of the listener.")?
            .port();
        let server = run(listener, dispatcher).context("Failed to start the HTTP server.")?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    // A more expressive name that makes it clear that
    // this function only returns when the application is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn get_connection_pool(configuration: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new().connect_lazy_with(configuration.with_db())
}

pub fn run(listener: TcpListener, dispatcher: Dispatcher) -> Result<Server, std::io::Error> {
    // Runs share one dispatcher, so they are serialised within this process
    let dispatcher = Data::new(dispatcher);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/update-users", web::post().to(update_users))
            .app_data(dispatcher.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
