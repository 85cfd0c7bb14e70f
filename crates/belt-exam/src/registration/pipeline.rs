use super::filename::FilenameStyle;
use super::rank::{self, RankSortKey, RegistrationRank};
use super::roster::{Roster, RosterEntry, RosterError};
use super::render::{DocumentFormat, RenderError};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Column headings of the registration sheet, in output order.
pub const HEADER_LABELS: [&str; 6] = [
    "STT",
    "Mã kỳ thi",
    "Mã Đơn vị",
    "Mã CLB",
    "Mã hội viên",
    "Cấp đăng ký dự thi",
];

pub const DEFAULT_ORG_CODE: &str = "TNIN";
pub const DEFAULT_CLUB_CODE: &str = "CLB_01102";
pub const DEFAULT_FILE_PREFIX: &str = "DST";
pub const DEFAULT_ROSTER_PATH: &str = "static/data.csv";

pub fn default_title(club_code: &str) -> String {
    format!("DANH SÁCH ĐĂNG KÝ THAM DỰ THI THĂNG CẤP ĐAI TAEKWONDO {club_code}")
}

/// Row ordering applied before sequence numbers are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingPolicy {
    /// Keep the order the codes were selected in.
    #[default]
    Selection,
    /// Stable sort by rank key, ties keep selection order.
    RankThenSelection,
}

impl OrderingPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "selection" => Some(Self::Selection),
            "rank" | "rank-then-selection" | "rank_then_selection" => {
                Some(Self::RankThenSelection)
            }
            _ => None,
        }
    }
}

/// Deployment-level settings for one exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSettings {
    pub roster_path: PathBuf,
    pub org_code: String,
    pub club_code: String,
    pub title: String,
    pub file_prefix: String,
    pub ordering: OrderingPolicy,
    pub default_format: DocumentFormat,
    pub filename_style: FilenameStyle,
    pub timestamp_filenames: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            roster_path: PathBuf::from(DEFAULT_ROSTER_PATH),
            org_code: DEFAULT_ORG_CODE.to_string(),
            club_code: DEFAULT_CLUB_CODE.to_string(),
            title: default_title(DEFAULT_CLUB_CODE),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            ordering: OrderingPolicy::default(),
            default_format: DocumentFormat::default(),
            filename_style: FilenameStyle::default(),
            timestamp_filenames: false,
        }
    }
}

/// Member codes picked for an exam, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub exam_code: String,
    pub selected_codes: Vec<String>,
}

impl SelectionRequest {
    pub fn new<I, S>(exam_code: impl Into<String>, selected_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exam_code: exam_code.into(),
            selected_codes: selected_codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the trimmed exam code.
    pub fn validate(&self) -> Result<&str, ValidationError> {
        let exam_code = self.exam_code.trim();
        if exam_code.is_empty() {
            return Err(ValidationError::MissingExamCode);
        }
        if self.selected_codes.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        Ok(exam_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field `exam_code`")]
    MissingExamCode,
    #[error("missing required field `selected`: no member codes were selected")]
    EmptySelection,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingExamCode => "exam_code",
            ValidationError::EmptySelection => "selected",
        }
    }
}

/// Caller-facing failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Io,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no selected member could be resolved against the roster")]
    NotFound { requested: usize },
    #[error("failed to read roster")]
    Roster(#[source] RosterError),
    #[error("failed to render document")]
    Render(#[source] RenderError),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExportError::Validation(_) => ErrorKind::Validation,
            ExportError::NotFound { .. } => ErrorKind::NotFound,
            ExportError::Roster(_) | ExportError::Render(_) => ErrorKind::Io,
        }
    }
}

impl From<RosterError> for ExportError {
    fn from(value: RosterError) -> Self {
        Self::Roster(value)
    }
}

impl From<RenderError> for ExportError {
    fn from(value: RenderError) -> Self {
        Self::Render(value)
    }
}

/// One row of the registration sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub sequence_number: usize,
    pub exam_code: String,
    pub org_code: String,
    pub club_code: String,
    pub member_code: String,
    pub registration_rank: RegistrationRank,
}

/// Title, headings and rows ready for a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSheet {
    pub title: String,
    pub headers: [&'static str; 6],
    pub exam_code: String,
    pub rows: Vec<ResolvedEntry>,
}

struct Candidate<'a> {
    member_code: String,
    entry: &'a RosterEntry,
    registration_rank: RegistrationRank,
    sort_key: RankSortKey,
    selection_order: usize,
}

/// Stateless resolver from a selection plus roster snapshot to a sheet.
#[derive(Debug, Clone, Default)]
pub struct ExportPipeline {
    settings: ExportSettings,
}

impl ExportPipeline {
    pub fn new(settings: ExportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn resolve(
        &self,
        request: &SelectionRequest,
        roster: &Roster,
    ) -> Result<RegistrationSheet, ExportError> {
        let exam_code = request.validate()?;
        info!(
            exam_code,
            selected = request.selected_codes.len(),
            roster = roster.len(),
            "resolving exam registration"
        );

        let index = roster.index();
        let mut candidates = Vec::with_capacity(request.selected_codes.len());
        for (selection_order, code) in request.selected_codes.iter().enumerate() {
            let member_code = code.trim();
            let Some(entry) = index.find(member_code) else {
                warn!(member_code, "selected member code not found in roster");
                continue;
            };

            let outcome = rank::transform(&entry.rank_label);
            candidates.push(Candidate {
                member_code: member_code.to_string(),
                entry,
                registration_rank: outcome.registration_rank,
                sort_key: outcome.sort_key,
                selection_order,
            });
        }

        if candidates.is_empty() {
            error!(exam_code, "no selected member could be resolved");
            debug!(selected = ?request.selected_codes, "unresolved selection");
            return Err(ExportError::NotFound {
                requested: request.selected_codes.len(),
            });
        }

        if self.settings.ordering == OrderingPolicy::RankThenSelection {
            // `sort_by_key` is stable; selection_order is the explicit tie-break.
            candidates.sort_by_key(|candidate| (candidate.sort_key, candidate.selection_order));
        }

        let rows: Vec<ResolvedEntry> = candidates
            .into_iter()
            .enumerate()
            .map(|(position, candidate)| {
                debug!(
                    member_code = %candidate.member_code,
                    name = %candidate.entry.name,
                    rank_label = %candidate.entry.rank_label,
                    "resolved member"
                );
                ResolvedEntry {
                    sequence_number: position + 1,
                    exam_code: exam_code.to_string(),
                    org_code: self.settings.org_code.clone(),
                    club_code: self.settings.club_code.clone(),
                    member_code: candidate.member_code,
                    registration_rank: candidate.registration_rank,
                }
            })
            .collect();

        info!(
            exam_code,
            rows = rows.len(),
            ordering = ?self.settings.ordering,
            "registration sheet ready"
        );

        Ok(RegistrationSheet {
            title: self.settings.title.clone(),
            headers: HEADER_LABELS,
            exam_code: exam_code.to_string(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(vec![
            RosterEntry::new("Alice", "M1", "Cấp 9"),
            RosterEntry::new("Bob", "M2", "Cấp 5"),
            RosterEntry::new("Chi", "M3", "1 Đẳng"),
            RosterEntry::new("Dung", "M4", "HLV"),
        ])
    }

    fn pipeline(ordering: OrderingPolicy) -> ExportPipeline {
        ExportPipeline::new(ExportSettings {
            ordering,
            ..ExportSettings::default()
        })
    }

    fn member_codes(sheet: &RegistrationSheet) -> Vec<&str> {
        sheet.rows.iter().map(|row| row.member_code.as_str()).collect()
    }

    #[test]
    fn validation_names_missing_exam_code_first() {
        let request = SelectionRequest::new("   ", Vec::<String>::new());
        assert_eq!(request.validate(), Err(ValidationError::MissingExamCode));
        assert_eq!(ValidationError::MissingExamCode.field(), "exam_code");
    }

    #[test]
    fn validation_rejects_empty_selection() {
        let request = SelectionRequest::new("2025-Q3", Vec::<String>::new());
        let error = pipeline(OrderingPolicy::Selection)
            .resolve(&request, &roster())
            .expect_err("empty selection rejected");
        assert!(matches!(
            error,
            ExportError::Validation(ValidationError::EmptySelection)
        ));
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn selected_codes_are_trimmed_and_unmatched_dropped() {
        let request = SelectionRequest::new(" 2025-Q3 ", [" M2 ", "M9", "M1"]);
        let sheet = pipeline(OrderingPolicy::Selection)
            .resolve(&request, &roster())
            .expect("sheet resolves");

        assert_eq!(member_codes(&sheet), vec!["M2", "M1"]);
        assert_eq!(sheet.exam_code, "2025-Q3");
        assert!(sheet.rows.iter().all(|row| row.exam_code == "2025-Q3"));
    }

    #[test]
    fn duplicates_emit_one_row_each() {
        let request = SelectionRequest::new("KT", ["M1", "M1"]);
        let sheet = pipeline(OrderingPolicy::Selection)
            .resolve(&request, &roster())
            .expect("sheet resolves");
        assert_eq!(member_codes(&sheet), vec!["M1", "M1"]);
        let sequence: Vec<usize> = sheet.rows.iter().map(|row| row.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2]);
    }

    #[test]
    fn rank_policy_orders_groups_and_keeps_ties_in_selection_order() {
        let request = SelectionRequest::new("KT", ["M4", "M3", "M2", "M1", "M2"]);
        let sheet = pipeline(OrderingPolicy::RankThenSelection)
            .resolve(&request, &roster())
            .expect("sheet resolves");

        assert_eq!(member_codes(&sheet), vec!["M1", "M2", "M2", "M3", "M4"]);
        let sequence: Vec<usize> = sheet.rows.iter().map(|row| row.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn org_and_club_codes_come_from_settings() {
        let settings = ExportSettings {
            org_code: "HCM".to_string(),
            club_code: "CLB_9".to_string(),
            title: default_title("CLB_9"),
            ..ExportSettings::default()
        };
        let sheet = ExportPipeline::new(settings)
            .resolve(&SelectionRequest::new("KT", ["M3"]), &roster())
            .expect("sheet resolves");

        let row = &sheet.rows[0];
        assert_eq!(row.org_code, "HCM");
        assert_eq!(row.club_code, "CLB_9");
        assert_eq!(row.registration_rank, RegistrationRank::Label("1 Đẳng".into()));
        assert!(sheet.title.ends_with("CLB_9"));
        assert_eq!(sheet.headers, HEADER_LABELS);
    }

    #[test]
    fn ordering_policies_parse_from_config_values() {
        assert_eq!(OrderingPolicy::parse("Selection"), Some(OrderingPolicy::Selection));
        assert_eq!(
            OrderingPolicy::parse("rank"),
            Some(OrderingPolicy::RankThenSelection)
        );
        assert_eq!(OrderingPolicy::parse("alphabetical"), None);
    }
}
