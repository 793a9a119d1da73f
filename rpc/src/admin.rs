//! Administrative request handlers, gated by the admin shared secret.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use taskpay_auth::verify_admin_secret;
use taskpay_ledger::TaskDraft;
use taskpay_store::TaskRecord;
use taskpay_types::{Amount, TaskId, WithdrawalId, WithdrawalStatus};

use crate::extract::AdminGate;
use crate::handlers::WithdrawalResponse;
use crate::{AppState, RpcError};

// ── Login ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub secret: String,
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Validates the secret so the console can store it client-side; every later
/// admin request re-checks the header anyway.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    if !verify_admin_secret(&state.admin_secret, &req.secret) {
        return Err(RpcError::Unauthorized);
    }
    Ok(Json(OkResponse { ok: true }))
}

// ── Tasks ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct TaskPayload {
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub description: String,
    pub reward: f64,
    pub code: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Admin view of a task — includes the secret code and the active flag.
#[derive(Serialize)]
pub struct AdminTaskResponse {
    pub id: u64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub reward: f64,
    pub code: String,
    pub active: bool,
    pub created_at: u64,
}

impl From<TaskRecord> for AdminTaskResponse {
    fn from(task: TaskRecord) -> Self {
        Self {
            id: task.id.value(),
            title: task.title,
            link: task.link,
            description: task.description,
            reward: task.reward.to_major(),
            code: task.code,
            active: task.active,
            created_at: task.created_at.as_secs(),
        }
    }
}

fn draft_from(payload: TaskPayload) -> Result<TaskDraft, RpcError> {
    let reward = Amount::from_major(payload.reward)
        .ok_or_else(|| RpcError::InvalidRequest("reward is not a valid amount".into()))?;
    Ok(TaskDraft {
        title: payload.title,
        link: payload.link,
        description: payload.description,
        reward,
        code: payload.code,
        active: payload.active,
    })
}

pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    _gate: AdminGate,
) -> Result<Json<Vec<AdminTaskResponse>>, RpcError> {
    let tasks = state.ledger.list_tasks()?;
    Ok(Json(tasks.into_iter().map(Into::into).collect()))
}

pub async fn create_task(
    State(state): State<Arc<AppState>>,
    _gate: AdminGate,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<AdminTaskResponse>, RpcError> {
    let record = state.ledger.create_task(draft_from(payload)?)?;
    Ok(Json(record.into()))
}

pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    _gate: AdminGate,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<AdminTaskResponse>, RpcError> {
    let record = state.ledger.update_task(TaskId::new(id), draft_from(payload)?)?;
    Ok(Json(record.into()))
}

pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    _gate: AdminGate,
) -> Result<Json<OkResponse>, RpcError> {
    state.ledger.delete_task(TaskId::new(id))?;
    Ok(Json(OkResponse { ok: true }))
}

// ── Users ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AdminUserResponse {
    pub id: String,
    pub first_name: Option<String>,
    pub username: Option<String>,
    pub balance: f64,
    pub referral_earnings: f64,
    pub referrer: Option<String>,
    pub referral_count: usize,
    pub completed_tasks: usize,
    pub created_at: u64,
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _gate: AdminGate,
) -> Result<Json<Vec<AdminUserResponse>>, RpcError> {
    let users = state.ledger.list_users()?;
    Ok(Json(
        users
            .into_iter()
            .map(|u| AdminUserResponse {
                id: u.id.to_string(),
                first_name: u.first_name,
                username: u.username,
                balance: u.balance.to_major(),
                referral_earnings: u.referral_earnings.to_major(),
                referrer: u.referrer.map(|r| r.to_string()),
                referral_count: u.referrals.len(),
                completed_tasks: u.completed_tasks.len(),
                created_at: u.created_at.as_secs(),
            })
            .collect(),
    ))
}

// ── Withdrawals ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    _gate: AdminGate,
) -> Result<Json<Vec<AdminWithdrawalResponse>>, RpcError> {
    let records = state.ledger.list_withdrawals()?;
    Ok(Json(
        records
            .into_iter()
            .map(|record| AdminWithdrawalResponse {
                user: record.user.to_string(),
                withdrawal: record.into(),
            })
            .collect(),
    ))
}

#[derive(Serialize)]
pub struct AdminWithdrawalResponse {
    pub user: String,
    #[serde(flatten)]
    pub withdrawal: WithdrawalResponse,
}

pub async fn update_withdrawal_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    _gate: AdminGate,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<AdminWithdrawalResponse>, RpcError> {
    let status = WithdrawalStatus::parse(&req.status)
        .ok_or_else(|| RpcError::InvalidRequest(format!("unknown status: {}", req.status)))?;
    let record = state
        .ledger
        .set_withdrawal_status(WithdrawalId::new(id), status)?;
    Ok(Json(AdminWithdrawalResponse {
        user: record.user.to_string(),
        withdrawal: record.into(),
    }))
}

// ── Stats ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct StatsResponse {
    pub users: u64,
    pub tasks: u64,
    pub total_balance: f64,
    pub total_referral_earnings: f64,
    pub pending_withdrawals: u64,
    pub pending_amount: f64,
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
    _gate: AdminGate,
) -> Result<Json<StatsResponse>, RpcError> {
    let stats = state.ledger.stats()?;
    Ok(Json(StatsResponse {
        users: stats.users,
        tasks: stats.tasks,
        total_balance: stats.total_balance.to_major(),
        total_referral_earnings: stats.total_referral_earnings.to_major(),
        pending_withdrawals: stats.pending_withdrawals,
        pending_amount: stats.pending_amount.to_major(),
    }))
}
