use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::NaiveDate;
use std::time::Instant;
use tracing::debug;

use crate::error::ApiError;
use crate::metrics::REQUEST_LATENCY;
use crate::middleware::API_KEY_HEADER;
use crate::models::{ApiResponse, ResponseFormat, StockResponse, StocksByCompany};
use crate::render::stocks_response;
use crate::state::AppState;

// Raw query string as ordered pairs, so repeated companyCode keys survive
type QueryPairs = Query<Vec<(String, String)>>;

// Parameters shared by the single and multiple lookups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StocksQuery {
    pub company_codes: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub api_key: Option<String>,
    pub format: ResponseFormat,
}

impl StocksQuery {
    // One company; repeated companyCode values are joined with commas,
    // so they name no real company and end in a 404
    pub fn single(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let code = all(pairs, "companyCode").collect::<Vec<_>>().join(",");
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::MissingParameter("companyCode"));
        }
        Self::with_codes(pairs, vec![code.to_string()])
    }

    // Many companies: repeated and/or comma-separated companyCode values
    pub fn multiple(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut codes: Vec<String> = Vec::new();
        for value in all(pairs, "companyCode") {
            for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                if !codes.iter().any(|c| c == code) {
                    codes.push(code.to_string());
                }
            }
        }
        if codes.is_empty() {
            return Err(ApiError::MissingParameter("companyCode"));
        }
        Self::with_codes(pairs, codes)
    }

    fn with_codes(pairs: &[(String, String)], company_codes: Vec<String>) -> Result<Self, ApiError> {
        Ok(Self {
            company_codes,
            start_date: date_param(pairs, "startDate")?,
            end_date: date_param(pairs, "endDate")?,
            api_key: first(pairs, "apikey").map(str::to_string),
            format: first(pairs, "format").map(ResponseFormat::parse).unwrap_or_default(),
        })
    }
}

fn first<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn all<'a>(pairs: &'a [(String, String)], name: &'static str) -> impl Iterator<Item = &'a str> {
    pairs
        .iter()
        .filter(move |(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

fn date_param(pairs: &[(String, String)], name: &'static str) -> Result<NaiveDate, ApiError> {
    let raw = first(pairs, name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::MissingParameter(name))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| ApiError::InvalidParameter(name))
}

// GET /api/v1/stocks/single
pub async fn single_stock_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): QueryPairs,
) -> Result<Response, ApiError> {
    let query = StocksQuery::single(&pairs)?;
    fetch_stocks(&state, &headers, query)
}

// GET /api/v1/stocks/multiple
pub async fn multiple_stocks_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(pairs): QueryPairs,
) -> Result<Response, ApiError> {
    let query = StocksQuery::multiple(&pairs)?;
    fetch_stocks(&state, &headers, query)
}

fn fetch_stocks(state: &AppState, headers: &HeaderMap, query: StocksQuery) -> Result<Response, ApiError> {
    let start_time = Instant::now();

    // header wins over the query parameter
    let api_key = headers
        .get(API_KEY_HEADER)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .or(query.api_key)
        .ok_or(ApiError::MissingApiKey)?;

    if api_key.as_str() != &*state.api_key {
        return Err(ApiError::InvalidApiKey);
    }

    if query.start_date > query.end_date {
        return Err(ApiError::InvalidDateRange);
    }

    let mut data = StocksByCompany::new();
    for code in &query.company_codes {
        let company = state
            .store
            .company_by_code(code)
            .ok_or(ApiError::CompanyNotFound)?;
        let records = state
            .store
            .history_between(code, query.start_date, query.end_date)
            .into_iter()
            .map(|history| StockResponse::new(company, history))
            .collect();
        data.insert(code.clone(), records);
    }

    debug!(
        companies = data.len(),
        start = %query.start_date,
        end = %query.end_date,
        "stock history fetched"
    );
    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());

    let body = ApiResponse::success("Data fetched successfully", data);
    Ok(stocks_response(query.format, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_single_query() {
        let query = StocksQuery::single(&pairs(&[
            ("companyCode", "AAPL"),
            ("startDate", "2024-01-01"),
            ("endDate", "2024-01-31"),
            ("format", "XML"),
        ]))
        .unwrap();

        assert_eq!(query.company_codes, vec!["AAPL"]);
        assert_eq!(query.start_date, date(2024, 1, 1));
        assert_eq!(query.end_date, date(2024, 1, 31));
        assert_eq!(query.format, ResponseFormat::Xml);
        assert_eq!(query.api_key, None);
    }

    #[test]
    fn single_joins_repeated_codes() {
        let query = StocksQuery::single(&pairs(&[
            ("companyCode", "AAPL"),
            ("companyCode", "GOOGL"),
            ("startDate", "2024-01-01"),
            ("endDate", "2024-01-31"),
        ]))
        .unwrap();

        assert_eq!(query.company_codes, vec!["AAPL,GOOGL"]);
    }

    #[test]
    fn multiple_accepts_repeated_and_comma_separated_codes() {
        let query = StocksQuery::multiple(&pairs(&[
            ("companyCode", "AAPL"),
            ("companyCode", "GOOGL, MSFT"),
            ("companyCode", "AAPL"),
            ("startDate", "2024-01-01"),
            ("endDate", "2024-01-31"),
            ("apikey", "k"),
        ]))
        .unwrap();

        assert_eq!(query.company_codes, vec!["AAPL", "GOOGL", "MSFT"]);
        assert_eq!(query.api_key.as_deref(), Some("k"));
        assert_eq!(query.format, ResponseFormat::Json);
    }

    #[test]
    fn reports_first_missing_parameter() {
        let err = StocksQuery::single(&pairs(&[("startDate", "2024-01-01")])).unwrap_err();
        assert_eq!(err, ApiError::MissingParameter("companyCode"));

        let err = StocksQuery::single(&pairs(&[("companyCode", "AAPL"), ("startDate", "2024-01-01")]))
            .unwrap_err();
        assert_eq!(err, ApiError::MissingParameter("endDate"));

        let err = StocksQuery::multiple(&pairs(&[("companyCode", " , ")])).unwrap_err();
        assert_eq!(err, ApiError::MissingParameter("companyCode"));
    }

    #[test]
    fn rejects_malformed_dates() {
        let err = StocksQuery::single(&pairs(&[
            ("companyCode", "AAPL"),
            ("startDate", "01/01/2024"),
            ("endDate", "2024-01-31"),
        ]))
        .unwrap_err();
        assert_eq!(err, ApiError::InvalidParameter("startDate"));
    }
}
