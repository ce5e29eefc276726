//! HTTP error envelope.
//!
//! Every failure leaves the API as `{"error": {"code", "message"}}`. Domain
//! errors keep their own code, status and message; database failures are
//! logged and reported as a generic 500.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledgerline_core::accounts::AccountError;
use ledgerline_core::budget::BudgetError;
use ledgerline_core::fiscal::FiscalError;
use ledgerline_core::ledger::LedgerError;
use ledgerline_core::reconciliation::ReconciliationError;
use ledgerline_core::vat::VatError;
use ledgerline_db::repositories::{
    AccountRepoError, BankRepoError, BudgetRepoError, FiscalRepoError, JournalRepoError,
    VatRepoError,
};
use ledgerline_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::{error, warn};

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// 400 with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 401 with a message.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(AppError::Unauthorized(message.into()))
    }

    /// 403 with a message.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(AppError::Forbidden(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

macro_rules! domain_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for ApiError {
                fn from(err: $error) -> Self {
                    Self(AppError::domain(
                        err.http_status_code(),
                        err.error_code(),
                        err.to_string(),
                    ))
                }
            }
        )+
    };
}

domain_error!(
    AccountError,
    FiscalError,
    LedgerError,
    BudgetError,
    ReconciliationError,
    VatError,
);

impl From<AccountRepoError> for ApiError {
    fn from(err: AccountRepoError) -> Self {
        match err {
            AccountRepoError::Account(e) => e.into(),
            AccountRepoError::Database(e) => e.into(),
        }
    }
}

impl From<FiscalRepoError> for ApiError {
    fn from(err: FiscalRepoError) -> Self {
        match err {
            FiscalRepoError::Fiscal(e) => e.into(),
            FiscalRepoError::Database(e) => e.into(),
        }
    }
}

impl From<JournalRepoError> for ApiError {
    fn from(err: JournalRepoError) -> Self {
        match err {
            JournalRepoError::Ledger(e) => e.into(),
            JournalRepoError::Database(e) => e.into(),
        }
    }
}

impl From<BudgetRepoError> for ApiError {
    fn from(err: BudgetRepoError) -> Self {
        match err {
            BudgetRepoError::Budget(e) => e.into(),
            BudgetRepoError::Account(e) => e.into(),
            BudgetRepoError::Fiscal(e) => e.into(),
            BudgetRepoError::Database(e) => e.into(),
        }
    }
}

impl From<BankRepoError> for ApiError {
    fn from(err: BankRepoError) -> Self {
        match err {
            BankRepoError::Reconciliation(e) => e.into(),
            BankRepoError::Database(e) => e.into(),
        }
    }
}

impl From<VatRepoError> for ApiError {
    fn from(err: VatRepoError) -> Self {
        match err {
            VatRepoError::Vat(e) => e.into(),
            VatRepoError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(error = %self.0, code = self.0.error_code(), "Request conflicted");
        }

        (
            status,
            Json(json!({
                "error": {
                    "code": self.0.error_code(),
                    "message": self.0.public_message(),
                }
            })),
        )
            .into_response()
    }
}
