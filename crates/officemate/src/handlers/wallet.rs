use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use officemate_auth::CurrentUser;
use officemate_core::storage::{Page, PageRequest, DEFAULT_PAGE_SIZE};
use officemate_core::wallet::{
    TransactionFilter, TransactionType, WalletQrCode, WalletStatus, WalletTransaction,
};

use crate::handlers::AppError;
use crate::services::{
    AddFundsRequest, AddPaymentMethodRequest, AutoReloadRequest, LinkBankAccountRequest,
    WithdrawRequest,
};
use crate::state::AppState;

const DEFAULT_RECENT_LIMIT: usize = 10;
const MAX_RECENT_LIMIT: usize = 50;

/// Query string of the transaction history endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl HistoryQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            transaction_type: self.transaction_type,
            from: self.from,
            to: self.to,
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateQrCodeRequest {
    pub qr_code_data: String,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Open the user's wallet (POST /api/users/{user_id}/wallet).
pub async fn initialize_wallet(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WalletStatus>), AppError> {
    current.ensure_owner(user_id)?;
    let wallet = state.wallets.initialize_wallet(user_id).await?;
    Ok((StatusCode::CREATED, Json(WalletStatus::from(&wallet))))
}

/// GET /api/users/{user_id}/wallet
pub async fn wallet_status(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.wallets.wallet_status(user_id).await?))
}

/// POST /api/users/{user_id}/wallet/payment-methods
pub async fn add_payment_method(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AddPaymentMethodRequest>,
) -> Result<(StatusCode, Json<WalletStatus>), AppError> {
    current.ensure_owner(user_id)?;
    let status = state.wallets.add_payment_method(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// POST /api/users/{user_id}/wallet/payment-methods/{method_id}/verify
pub async fn verify_payment_method(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, method_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .wallets
            .verify_payment_method(user_id, method_id)
            .await?,
    ))
}

/// PUT /api/users/{user_id}/wallet/payment-methods/{method_id}/primary
pub async fn set_primary_payment_method(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, method_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .wallets
            .set_primary_payment_method(user_id, method_id)
            .await?,
    ))
}

/// PUT /api/users/{user_id}/wallet/auto-reload
pub async fn configure_auto_reload(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AutoReloadRequest>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state.wallets.configure_auto_reload(user_id, request).await?,
    ))
}

/// DELETE /api/users/{user_id}/wallet/auto-reload
pub async fn disable_auto_reload(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.wallets.disable_auto_reload(user_id).await?))
}

/// Top up now if the balance is under the threshold
/// (POST /api/users/{user_id}/wallet/auto-reload/process).
pub async fn process_auto_reload(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    current.ensure_owner(user_id)?;
    let transaction = state.wallets.process_auto_reload(user_id).await?;
    Ok(Json(json!({
        "reloaded": transaction.is_some(),
        "transaction": transaction,
    })))
}

/// POST /api/users/{user_id}/wallet/bank-account
pub async fn link_bank_account(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<LinkBankAccountRequest>,
) -> Result<Json<WalletStatus>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.wallets.link_bank_account(user_id, request).await?))
}

/// POST /api/users/{user_id}/wallet/add-funds
pub async fn add_funds(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AddFundsRequest>,
) -> Result<(StatusCode, Json<WalletTransaction>), AppError> {
    current.ensure_owner(user_id)?;
    let transaction = state.wallets.add_funds(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// POST /api/users/{user_id}/wallet/withdraw
pub async fn withdraw_funds(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<WithdrawRequest>,
) -> Result<(StatusCode, Json<WalletTransaction>), AppError> {
    current.ensure_owner(user_id)?;
    let transaction = state.wallets.withdraw_funds(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// Paged history, optionally by type and date range
/// (GET /api/users/{user_id}/wallet/transactions).
pub async fn transaction_history(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Page<WalletTransaction>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .wallets
            .transaction_history(user_id, &query.filter(), query.page())
            .await?,
    ))
}

/// GET /api/users/{user_id}/wallet/transactions/recent
pub async fn recent_transactions(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<WalletTransaction>>, AppError> {
    current.ensure_owner(user_id)?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_RECENT_LIMIT);
    Ok(Json(
        state.wallets.recent_transactions(user_id, limit).await?,
    ))
}

/// POST /api/users/{user_id}/wallet/qr-code
pub async fn generate_qr_code(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WalletQrCode>), AppError> {
    current.ensure_owner(user_id)?;
    let code = state.qr_codes.generate_qr_code(user_id).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

/// GET /api/users/{user_id}/wallet/qr-code
pub async fn active_qr_code(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<WalletQrCode>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.qr_codes.active_qr_code(user_id).await?))
}

/// POST /api/users/{user_id}/wallet/qr-code/regenerate
pub async fn regenerate_qr_code(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<WalletQrCode>), AppError> {
    current.ensure_owner(user_id)?;
    let code = state.qr_codes.regenerate_qr_code(user_id).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

/// DELETE /api/users/{user_id}/wallet/qr-code/{qr_code_id}
pub async fn deactivate_qr_code(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, qr_code_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<WalletQrCode>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .qr_codes
            .deactivate_qr_code(user_id, qr_code_id)
            .await?,
    ))
}

/// Any signed-in user may resolve a scanned code (POST /api/qr-codes/validate).
pub async fn validate_qr_code(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(request): Json<ValidateQrCodeRequest>,
) -> Result<Json<Value>, AppError> {
    let code = state.qr_codes.validate_qr_code(&request.qr_code_data).await?;
    Ok(Json(json!({
        "valid": true,
        "qr_code_id": code.qr_code_id,
        "wallet_id": code.wallet_id,
    })))
}
