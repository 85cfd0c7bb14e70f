use super::render::DocumentFormat;
use chrono::NaiveDateTime;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// RFC 5987 `attr-char` subset left unescaped in `filename*`.
const EXTENDED_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_');

/// How the exam code is turned into a download name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilenameStyle {
    /// `<prefix>_<exam code>.<ext>`
    #[default]
    ExamCode,
    /// `<prefix>_Quy_<q>_Nam_<year>.<ext>` for `YYYY-Q<d>` codes, otherwise as `ExamCode`.
    Quarter,
}

impl FilenameStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exam-code" | "exam_code" | "default" => Some(Self::ExamCode),
            "quarter" => Some(Self::Quarter),
            _ => None,
        }
    }
}

pub fn derive_filename(
    prefix: &str,
    exam_code: &str,
    format: DocumentFormat,
    style: FilenameStyle,
    stamp: Option<NaiveDateTime>,
) -> String {
    let stem = match style {
        FilenameStyle::Quarter => match parse_quarter(exam_code) {
            Some((year, quarter)) => format!("{prefix}_Quy_{quarter}_Nam_{year}"),
            None => format!("{prefix}_{exam_code}"),
        },
        FilenameStyle::ExamCode => format!("{prefix}_{exam_code}"),
    };
    let stem = path_component(&stem);

    match stamp {
        Some(stamp) => format!(
            "{stem}_{}.{}",
            stamp.format("%Y%m%d-%H%M%S"),
            format.extension()
        ),
        None => format!("{stem}.{}", format.extension()),
    }
}

/// Exam codes are opaque; keep the name a single portable path component.
fn path_component(stem: &str) -> String {
    stem.replace("..", "_")
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Splits `2025-Q3` into `("2025", '3')`.
fn parse_quarter(exam_code: &str) -> Option<(&str, char)> {
    let (year, quarter) = exam_code.trim().split_once("-Q")?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut digits = quarter.chars();
    match (digits.next(), digits.next()) {
        (Some(digit), None) if digit.is_ascii_digit() => Some((year, digit)),
        _ => None,
    }
}

/// `Content-Disposition` value: an ASCII fallback `filename` plus the exact
/// UTF-8 name as RFC 5987 `filename*`.
pub fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded = utf8_percent_encode(filename, EXTENDED_VALUE);
    format!("attachment; filename=\"{safe}\"; filename*=UTF-8''{encoded}")
}
