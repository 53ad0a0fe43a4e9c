//! tests/api/helpers.rs

use once_cell::sync::Lazy;
use profile_sync::configuration::ApplicationSettings;
use profile_sync::dispatcher::Dispatcher;
use profile_sync::domain::{DispatchLimits, SourceRecord};
use profile_sync::ledger::InMemoryRequestLedger;
use profile_sync::record_store::InMemoryRecordStore;
use profile_sync::startup::Application;
use profile_sync::telemetry::{get_subscriber, init_subscriber};
use profile_sync::transport::HttpTransport;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use wiremock::MockServer;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // We cannot assign the output of `get_subscriber` to a variable based on the
    // value TEST_LOG` because the sink is part of the type returned by
    // `get_subscriber`, therefore they are not the same type.
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub third_party_server: MockServer,
    pub record_store: Arc<InMemoryRecordStore>,
    pub ledger: Arc<InMemoryRequestLedger>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    /// helper for sending a POST /update-users request
    pub async fn post_update_users(&self) -> reqwest::Response {
        self.api_client
            .post(&format!("{}/update-users", &self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// helper to add `n` users that need an update
    pub fn add_pending_users(&self, n: usize) {
        for i in 0..n {
            self.record_store.insert(pending_user(i));
        }
    }

    /// helper to collect the requests the third-party API got on `path`
    pub async fn received_requests_on(&self, path: &str) -> Vec<wiremock::Request> {
        self.third_party_server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }
}

pub fn pending_user(i: usize) -> SourceRecord {
    SourceRecord {
        id: Uuid::new_v4(),
        email: format!("user{}@example.com", i),
        time_zone: "CET".to_string(),
        first_name: format!("First{}", i),
        last_name: format!("Last{}", i),
    }
}

pub fn limits(batch_size: usize, batch_ceiling: u64, individual_ceiling: u64) -> DispatchLimits {
    DispatchLimits {
        max_batch_size: NonZeroUsize::new(batch_size).unwrap(),
        max_batch_requests_per_hour: batch_ceiling,
        max_individual_requests_per_hour: individual_ceiling,
    }
}

/// Spin up an instance of our application with default limits
pub async fn spawn_app() -> TestApp {
    spawn_app_with_limits(DispatchLimits::default()).await
}

/// Spin up an instance of our application
/// backed by in-memory stores and a mock third-party API
pub async fn spawn_app_with_limits(limits: DispatchLimits) -> TestApp {
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    // Launch a mock server to stand in for the third-party API
    let third_party_server = MockServer::start().await;

    let record_store = Arc::new(InMemoryRecordStore::new());
    let ledger = Arc::new(InMemoryRequestLedger::new());
    let transport = HttpTransport::new(
        third_party_server.uri(),
        None,
        Duration::from_millis(500),
    );
    let dispatcher = Dispatcher::new(
        record_store.clone(),
        ledger.clone(),
        Arc::new(transport),
        limits,
    );

    // use a random OS port
    let configuration = ApplicationSettings {
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let application = Application::build_with_dispatcher(&configuration, dispatcher)
        .expect("Failed to build application");
    let application_port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", application_port),
        third_party_server,
        record_store,
        ledger,
        api_client: reqwest::Client::new(),
    }
}
