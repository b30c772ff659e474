use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt::Write;

use crate::models::{ApiResponse, ResponseFormat, StockResponse, StocksByCompany};

// Success body in the format the client asked for
pub fn stocks_response(format: ResponseFormat, body: ApiResponse<StocksByCompany>) -> Response {
    match format {
        ResponseFormat::Json => Json(body).into_response(),
        ResponseFormat::Xml => (
            [(header::CONTENT_TYPE, format.content_type())],
            stocks_xml(&body),
        )
            .into_response(),
    }
}

/// Serialise a stocks envelope as XML.
///
/// Every record becomes an element named after its company code, so a
/// company with three rows yields three sibling `<AAPL>` elements under
/// `<data>`.
pub fn stocks_xml(body: &ApiResponse<StocksByCompany>) -> String {
    let mut out = String::from("<ApiResponse>");
    push_text(&mut out, "status", body.status);
    push_text(&mut out, "message", &body.message);

    match &body.data {
        Some(data) => {
            out.push_str("<data>");
            for (code, records) in data {
                let tag = element_name(code);
                for record in records {
                    push_record(&mut out, &tag, record);
                }
            }
            out.push_str("</data>");
        }
        None => out.push_str("<data/>"),
    }

    out.push_str("</ApiResponse>");
    out
}

fn push_record(out: &mut String, tag: &str, record: &StockResponse) {
    let _ = write!(out, "<{tag}>");
    push_text(out, "companyName", &record.company_name);
    push_text(out, "tradeDate", &record.trade_date);
    push_text(out, "closingPrice", &record.closing_price.to_string());
    let _ = write!(out, "</{tag}>");
}

fn push_text(out: &mut String, tag: &str, text: &str) {
    let _ = write!(out, "<{tag}>{}</{tag}>", escape(text));
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// Company codes are user-supplied, keep only characters legal in a tag name
fn element_name(code: &str) -> String {
    let mut name: String = code
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        name.insert(0, '_');
    }
    name
}
