//! End-user request handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use taskpay_store::{UserRecord, WithdrawalRecord};
use taskpay_types::{Amount, TaskId};
use taskpay_ledger::VerifyOutcome;

use crate::extract::Caller;
use crate::{AppState, RpcError};

// ── Current user ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub balance: f64,
    pub referral_earnings: f64,
    pub referrer: Option<String>,
    pub completed_tasks: usize,
    pub referral_count: usize,
}

impl From<UserRecord> for MeResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            balance: user.balance.to_major(),
            referral_earnings: user.referral_earnings.to_major(),
            referrer: user.referrer.map(|r| r.to_string()),
            completed_tasks: user.completed_tasks.len(),
            referral_count: user.referrals.len(),
        }
    }
}

pub async fn me(Caller(user): Caller) -> Json<MeResponse> {
    Json(user.into())
}

// ── Tasks ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TaskResponse {
    pub id: u64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub reward: f64,
    pub status: String,
}

pub async fn tasks(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<Vec<TaskResponse>>, RpcError> {
    let views = state.ledger.tasks_for(&user.id)?;
    let response = views
        .into_iter()
        .map(|v| TaskResponse {
            id: v.id.value(),
            title: v.title,
            link: v.link,
            description: v.description,
            reward: v.reward.to_major(),
            status: match v.status {
                taskpay_types::TaskStatus::Pending => "pending".into(),
                taskpay_types::TaskStatus::Completed => "completed".into(),
            },
        })
        .collect();
    Ok(Json(response))
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    pub already_completed: bool,
}

pub async fn verify_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Caller(user): Caller,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, RpcError> {
    let outcome = state
        .ledger
        .verify_task(&user.id, TaskId::new(id), &req.code)?;
    let response = match outcome {
        VerifyOutcome::Credited { reward, commission } => {
            state.metrics.tasks_verified.inc();
            state.metrics.rewards_credited_cents.inc_by(reward.raw());
            if let Some(cut) = commission {
                state.metrics.commissions_credited_cents.inc_by(cut.raw());
            }
            VerifyResponse {
                ok: true,
                reward: Some(reward.to_major()),
                already_completed: false,
            }
        }
        VerifyOutcome::AlreadyCompleted => VerifyResponse {
            ok: true,
            reward: None,
            already_completed: true,
        },
    };
    Ok(Json(response))
}

// ── Referrals ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ReferralsResponse {
    pub link: String,
    pub web_link: String,
    pub referrals: Vec<ReferredUserResponse>,
    pub earnings: f64,
}

#[derive(Serialize)]
pub struct ReferredUserResponse {
    pub id: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
}

pub async fn referrals(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<ReferralsResponse>, RpcError> {
    let overview = state.ledger.referral_overview(&user.id)?;
    Ok(Json(ReferralsResponse {
        link: format!(
            "https://t.me/{}?startapp=ref_{}",
            state.bot_username, user.id
        ),
        web_link: format!(
            "{}/?ref={}",
            state.public_url.trim_end_matches('/'),
            user.id
        ),
        referrals: overview
            .referred
            .into_iter()
            .map(|r| ReferredUserResponse {
                id: r.id.to_string(),
                first_name: r.first_name,
                username: r.username,
            })
            .collect(),
        earnings: overview.earnings.to_major(),
    }))
}

// ── Withdrawals ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WithdrawRequest {
    pub amount: f64,
    #[serde(default)]
    pub method: Option<String>,
    /// Older clients send the payout target as `address`.
    #[serde(default, alias = "address")]
    pub details: Option<String>,
}

#[derive(Serialize)]
pub struct WithdrawalResponse {
    pub id: u64,
    pub amount: f64,
    pub method: String,
    pub details: String,
    pub status: String,
    pub created_at: u64,
}

impl From<WithdrawalRecord> for WithdrawalResponse {
    fn from(record: WithdrawalRecord) -> Self {
        Self {
            id: record.id.value(),
            amount: record.amount.to_major(),
            method: record.method,
            details: record.details,
            status: record.status.as_str().to_owned(),
            created_at: record.created_at.as_secs(),
        }
    }
}

pub async fn request_withdrawal(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<WithdrawalResponse>, RpcError> {
    let amount = Amount::from_major(req.amount)
        .ok_or_else(|| RpcError::InvalidRequest("amount is not a valid number".into()))?;
    let record = state.ledger.request_withdrawal(
        &user.id,
        amount,
        req.method.as_deref().unwrap_or("wallet"),
        req.details.as_deref().unwrap_or_default(),
    )?;
    state.metrics.withdrawals_requested.inc();
    Ok(Json(record.into()))
}

pub async fn withdrawals(
    State(state): State<Arc<AppState>>,
    Caller(user): Caller,
) -> Result<Json<Vec<WithdrawalResponse>>, RpcError> {
    let records = state.ledger.withdrawals_for(&user.id)?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

// ── Service ──────────────────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "OK"
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String, RpcError> {
    use prometheus::TextEncoder;
    TextEncoder::new()
        .encode_to_string(&state.metrics.registry.gather())
        .map_err(|e| RpcError::Server(e.to_string()))
}
