//! src/seed.rs

use anyhow::Context;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

pub const SEED_TIME_ZONES: [&str; 3] = ["CET", "CST", "GMT+1"];
pub const DEFAULT_SEED_COUNT: usize = 20;

/// Demo user, flagged as needing an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub time_zone: String,
}

/// Generate `count` demo users `First{i} Last{i}` with address `user{i}@example.com`.
pub fn generate_seed_users<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<SeedUser> {
    (0..count)
        .map(|i| SeedUser {
            first_name: format!("First{}", i),
            last_name: format!("Last{}", i),
            email: format!("user{}@example.com", i),
            time_zone: SEED_TIME_ZONES
                .choose(rng)
                .copied()
                .unwrap_or(SEED_TIME_ZONES[0])
                .to_string(),
        })
        .collect()
}

/// Store demo users. Users whose email is already taken are skipped.
///
/// Returns the number of inserted users.
#[tracing::instrument(name = "Seed users", skip_all, fields(count = users.len()))]
pub async fn seed_users(pool: &PgPool, users: &[SeedUser]) -> Result<u64, anyhow::Error> {
    let mut transaction = pool
        .begin()
        .await
        .context("Failed to acquire a Postgres connection from the pool")?;
    let mut inserted = 0;
    for user in users {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, email, time_zone, needs_update)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.time_zone)
        .execute(&mut *transaction)
        .await
        .with_context(|| format!("Failed to insert seed user {}.", user.email))?;
        inserted += result.rows_affected();
    }
    transaction
        .commit()
        .await
        .context("Failed to commit SQL transaction to store seed users.")?;
    Ok(inserted)
}
