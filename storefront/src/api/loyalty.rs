use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{not_found, ApiError, AppState};
use crate::model::{LoyaltyUser, PointsTransaction};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: LoyaltyUser,
    pub created: bool,
    pub referral_applied: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReferralRequest {
    pub referral_code: String,
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReferralResponse {
    pub success: bool,
    pub message: String,
}

pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<Response, ApiError> {
    let registration = state
        .loyalty
        .register(&request.email, &request.name, request.referral_code.as_deref())
        .await?;
    let status = if registration.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(RegisterResponse {
            user: registration.user,
            created: registration.created,
            referral_applied: registration.referral_applied,
        }),
    )
        .into_response())
}

pub async fn get_user(State(state): State<AppState>, Path(email): Path<String>) -> Result<Response, ApiError> {
    match state.loyalty.get_user_by_email(&email).await? {
        Some(user) => Ok(Json(user).into_response()),
        None => Ok(not_found("Loyalty user")),
    }
}

pub async fn transactions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PointsTransaction>>, ApiError> {
    Ok(Json(state.loyalty.transactions_for_user(&user_id).await?))
}

pub async fn redeem_referral(
    State(state): State<AppState>,
    Json(request): Json<ReferralRequest>,
) -> Result<Json<ReferralResponse>, ApiError> {
    let success = state
        .loyalty
        .process_referral(&request.referral_code, &request.email)
        .await?;
    let message = if success {
        "Referral applied, your friend has been credited".to_string()
    } else {
        "Invalid referral code".to_string()
    };
    Ok(Json(ReferralResponse { success, message }))
}
