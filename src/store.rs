use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::LoadError;
use crate::models::{Company, StockHistory};

pub const COMPANIES_FILE: &str = "companies.csv";
pub const HISTORY_FILE: &str = "stocks_history.csv";

// Read-only stock data loaded from companies.csv and stocks_history.csv,
// history per company sorted by trade date
#[derive(Debug, Default)]
pub struct StockStore {
    companies: HashMap<String, Company>,
    history: HashMap<String, Vec<StockHistory>>,
}

impl StockStore {
    pub fn new(companies: Vec<Company>, history: Vec<StockHistory>) -> Result<Self, LoadError> {
        let companies: HashMap<String, Company> = companies
            .into_iter()
            .map(|c| (c.company_code.clone(), c))
            .collect();

        let mut by_company: HashMap<String, Vec<StockHistory>> = HashMap::new();
        for row in history {
            if !companies.contains_key(&row.company_code) {
                return Err(LoadError::UnknownCompany {
                    id: row.id,
                    company_code: row.company_code,
                });
            }
            by_company.entry(row.company_code.clone()).or_default().push(row);
        }

        for rows in by_company.values_mut() {
            rows.sort_by_key(|r| (r.trade_date, r.id));
        }

        Ok(Self {
            companies,
            history: by_company,
        })
    }

    // Load both files from a data directory
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let dir = dir.as_ref();
        let companies = open(&dir.join(COMPANIES_FILE))?;
        let history = open(&dir.join(HISTORY_FILE))?;
        Self::from_csv_readers(companies, history)
    }

    pub fn from_csv_readers<C: Read, H: Read>(
        companies: csv::Reader<C>,
        history: csv::Reader<H>,
    ) -> Result<Self, LoadError> {
        let companies = read_rows::<Company, C>(companies)?;
        let history = read_rows::<StockHistory, H>(history)?;
        Self::new(companies, history)
    }

    pub fn company_by_code(&self, code: &str) -> Option<&Company> {
        self.companies.get(code)
    }

    /// Records for `code` with `start <= trade_date <= end`, oldest first.
    pub fn history_between(&self, code: &str, start: NaiveDate, end: NaiveDate) -> Vec<&StockHistory> {
        let Some(rows) = self.history.get(code) else {
            return Vec::new();
        };
        let from = rows.partition_point(|r| r.trade_date < start);
        let to = rows.partition_point(|r| r.trade_date <= end);
        if from >= to {
            return Vec::new();
        }
        rows[from..to].iter().collect()
    }

    pub fn company_count(&self) -> usize {
        self.companies.len()
    }

    pub fn record_count(&self) -> usize {
        self.history.values().map(Vec::len).sum()
    }
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>, LoadError> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoadError::Open {
            path: path.display().to_string(),
            source,
        })
}

fn read_rows<T, R>(mut reader: csv::Reader<R>) -> Result<Vec<T>, LoadError>
where
    T: serde::de::DeserializeOwned,
    R: Read,
{
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record?);
    }
    Ok(rows)
}
