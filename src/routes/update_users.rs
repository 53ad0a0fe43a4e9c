//! src/routes/update_users.rs

use actix_web::{web, HttpResponse};

use crate::dispatcher::{DispatchReport, Dispatcher, RunOutcome};
use crate::error::SyncResult;

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct UpdateUsersResponse {
    pub message: String,
    pub report: DispatchReport,
}

/// Push all users that need an update to the third-party API.
///
/// Responds with `429 Too Many Requests` if an hourly ceiling stopped the run.
#[tracing::instrument(name = "Update users", skip_all)]
pub async fn update_users(dispatcher: web::Data<Dispatcher>) -> SyncResult<HttpResponse> {
    // a client disconnect must not cut a run between a send and its ledger entry
    let response = match dispatcher.into_inner().run_detached().await? {
        RunOutcome::Success(report) => HttpResponse::Ok().json(UpdateUsersResponse {
            message: "User updates sent successfully.".to_string(),
            report,
        }),
        RunOutcome::RateLimited { scope, report } => {
            HttpResponse::TooManyRequests().json(UpdateUsersResponse {
                message: format!("Rate limit exceeded for {} requests.", scope),
                report,
            })
        }
    };
    Ok(response)
}
