//! Registration sheet encoders.
//!
//! Both encoders share one layout: the title across rows 1-2 over every
//! column, headings on row 3, one row per resolved entry after that.

mod delimited;
mod xlsx;

use super::pipeline::RegistrationSheet;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Zero-based row holding the column headings.
pub(crate) const HEADER_ROW: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Xlsx,
    Csv,
}

impl DocumentFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Xlsx => XLSX_CONTENT_TYPE,
            DocumentFormat::Csv => CSV_CONTENT_TYPE,
        }
    }

    pub fn render(&self, sheet: &RegistrationSheet) -> Result<Vec<u8>, RenderError> {
        match self {
            DocumentFormat::Xlsx => xlsx::render(sheet),
            DocumentFormat::Csv => delimited::render(sheet),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV buffer: {0}")]
    Io(#[from] std::io::Error),
}
