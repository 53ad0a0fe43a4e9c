//! src/bin/seed.rs

use anyhow::Context;
use profile_sync::configuration::get_configuration;
use profile_sync::seed::{generate_seed_users, seed_users, DEFAULT_SEED_COUNT};
use profile_sync::startup::get_connection_pool;
use profile_sync::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("seed".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let count = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("`{}` is not a valid number of users.", arg))?,
        None => DEFAULT_SEED_COUNT,
    };

    let configuration = get_configuration().context("Failed to read configuration.")?;
    let pool = get_connection_pool(&configuration.database);
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate the database.")?;

    let users = generate_seed_users(count, &mut rand::thread_rng());
    let inserted = seed_users(&pool, &users).await?;
    tracing::info!(inserted, requested = count, "Seeded users");
    Ok(())
}
