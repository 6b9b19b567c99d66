use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::warn;
use voting_cli::{VoteError, WalletError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Vote(err) => match err {
                VoteError::AlreadyVoted => StatusCode::CONFLICT,
                VoteError::InvalidCandidate => StatusCode::BAD_REQUEST,
                VoteError::UserDeclined => StatusCode::FORBIDDEN,
                VoteError::NotConnected | VoteError::TransportUnavailable(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                VoteError::SubmissionPending => StatusCode::TOO_MANY_REQUESTS,
                VoteError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Wallet(WalletError::Declined) => StatusCode::FORBIDDEN,
            ApiError::Wallet(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Vote(err) => err.kind(),
            ApiError::Wallet(WalletError::Declined) => "wallet_declined",
            ApiError::Wallet(_) => "wallet_unavailable",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self);
        }
        let body = Json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
