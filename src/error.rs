use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ApiResponse;

// Failures while loading the stock data files at startup
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("history row {id} references unknown company {company_code}")]
    UnknownCompany { id: i64, company_code: String },
}

// Request failures, each mapped to a client-visible status
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("API Key is missing")]
    MissingApiKey,
    #[error("Invalid API Key")]
    InvalidApiKey,
    #[error("startDate cannot be after endDate")]
    InvalidDateRange,
    #[error("One or more companies not found")]
    CompanyNotFound,
    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_)
            | ApiError::InvalidParameter(_)
            | ApiError::MissingApiKey
            | ApiError::InvalidDateRange => StatusCode::BAD_REQUEST,
            ApiError::InvalidApiKey => StatusCode::FORBIDDEN,
            ApiError::CompanyNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.to_string());
        (self.status(), Json(body)).into_response()
    }
}
