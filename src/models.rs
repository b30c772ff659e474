use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// A listed company
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Company {
    pub company_code: String,
    pub company_name: String,
}

// One daily closing price
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockHistory {
    pub id: i64,
    pub company_code: String,
    pub trade_date: NaiveDate,
    pub close_price: i64,
}

// Stock record as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub company_name: String,
    pub trade_date: String,
    pub closing_price: i64,
}

impl StockResponse {
    pub fn new(company: &Company, history: &StockHistory) -> Self {
        Self {
            company_name: company.company_name.clone(),
            trade_date: history.trade_date.format("%Y-%m-%d").to_string(),
            closing_price: history.close_price,
        }
    }
}

// Company code -> its records in the requested range
pub type StocksByCompany = BTreeMap<String, Vec<StockResponse>>;

// Envelope for every API body
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            data: None,
        }
    }
}

// Body format selected by the `format` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
}

impl ResponseFormat {
    // anything other than "xml" falls back to json
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("xml") {
            Self::Xml
        } else {
            Self::Json
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_response_uses_camel_case() {
        let company = Company {
            company_code: "AAPL".into(),
            company_name: "Apple Inc.".into(),
        };
        let history = StockHistory {
            id: 1,
            company_code: "AAPL".into(),
            trade_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            close_price: 150,
        };

        let json = serde_json::to_value(StockResponse::new(&company, &history)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "companyName": "Apple Inc.",
                "tradeDate": "2024-01-01",
                "closingPrice": 150
            })
        );
    }

    #[test]
    fn error_envelope_has_null_data() {
        let json = serde_json::to_value(ApiResponse::<()>::error("Invalid API Key")).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "Invalid API Key");
        assert!(json["data"].is_null());
    }

    #[test]
    fn format_parsing_is_case_insensitive() {
        assert_eq!(ResponseFormat::parse("XML"), ResponseFormat::Xml);
        assert_eq!(ResponseFormat::parse("json"), ResponseFormat::Json);
        assert_eq!(ResponseFormat::parse("yaml"), ResponseFormat::Json);
    }
}
