use crate::infra::{parse_format, parse_ordering};
use belt_exam::config::AppConfig;
use belt_exam::error::AppError;
use belt_exam::registration::{
    CsvRosterFile, DocumentFormat, ExportDocument, ExportPipeline, ExportSettings,
    OrderingPolicy, RegistrationExporter, SelectionRequest,
};
use belt_exam::telemetry;
use clap::Args;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Exam code written into every row and the file name
    #[arg(long)]
    pub(crate) exam_code: String,
    /// Member code to register; repeat in the order members should appear
    #[arg(long = "member", required = true)]
    pub(crate) members: Vec<String>,
    /// Roster CSV to read instead of the configured one
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// Output encoding (xlsx or csv)
    #[arg(long, value_parser = parse_format)]
    pub(crate) format: Option<DocumentFormat>,
    /// Row ordering (selection or rank)
    #[arg(long, value_parser = parse_ordering)]
    pub(crate) ordering: Option<OrderingPolicy>,
    /// Directory the document is written to
    #[arg(long, default_value = ".")]
    pub(crate) output_dir: PathBuf,
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let ExportArgs {
        exam_code,
        members,
        roster,
        format,
        ordering,
        output_dir,
    } = args;

    let settings = apply_overrides(config.export, roster, ordering);
    let exporter = RegistrationExporter::new(
        Arc::new(CsvRosterFile::new(settings.roster_path.clone())),
        ExportPipeline::new(settings),
    );

    let request = SelectionRequest::new(exam_code, members);
    let document = exporter.export(&request, format)?;
    let path = write_document(&output_dir, &document)?;

    println!("Registration sheet written to {}", path.display());
    Ok(())
}

fn apply_overrides(
    mut settings: ExportSettings,
    roster: Option<PathBuf>,
    ordering: Option<OrderingPolicy>,
) -> ExportSettings {
    if let Some(roster) = roster {
        settings.roster_path = roster;
    }
    if let Some(ordering) = ordering {
        settings.ordering = ordering;
    }
    settings
}

fn write_document(output_dir: &Path, document: &ExportDocument) -> Result<PathBuf, AppError> {
    let mut components = Path::new(&document.filename).components();
    let single_file = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_file {
        return Err(AppError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("refusing to write '{}' outside the output directory", document.filename),
        )));
    }

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(&document.filename);
    std::fs::write(&path, &document.bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use belt_exam::registration::{Roster, RosterEntry};

    #[test]
    fn overrides_replace_roster_and_ordering() {
        let settings = apply_overrides(
            ExportSettings::default(),
            Some(PathBuf::from("/srv/roster.csv")),
            Some(OrderingPolicy::RankThenSelection),
        );
        assert_eq!(settings.roster_path, PathBuf::from("/srv/roster.csv"));
        assert_eq!(settings.ordering, OrderingPolicy::RankThenSelection);
    }

    #[test]
    fn missing_overrides_keep_configured_values() {
        let settings = apply_overrides(ExportSettings::default(), None, None);
        assert_eq!(settings, ExportSettings::default());
    }

    fn exporter() -> RegistrationExporter<Roster> {
        let roster = Roster::new(vec![RosterEntry::new("Alice", "M1", "Cấp 9")]);
        RegistrationExporter::new(Arc::new(roster), ExportPipeline::default())
    }

    #[test]
    fn exam_codes_with_separators_stay_inside_output_dir() {
        let dir = std::env::temp_dir().join(format!("belt-exam-codes-{}", std::process::id()));
        let exporter = exporter();

        for (exam_code, expected) in [
            ("2025/Q3", "DST_2025_Q3.xlsx"),
            ("../../escaped", "DST____escaped.xlsx"),
        ] {
            let document = exporter
                .export(&SelectionRequest::new(exam_code, ["M1"]), None)
                .expect("export succeeds");
            let path = write_document(&dir, &document).expect("document written");
            assert_eq!(path, dir.join(expected));
            assert_eq!(path.parent(), Some(dir.as_path()));
            assert!(path.is_file());
        }

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn write_document_rejects_nested_names() {
        let dir = std::env::temp_dir().join(format!("belt-exam-nested-{}", std::process::id()));
        for filename in ["../DST_KT.csv", "sub/DST_KT.csv", "/tmp/DST_KT.csv", ".."] {
            let document = ExportDocument {
                filename: filename.to_string(),
                format: DocumentFormat::Csv,
                bytes: Vec::new(),
            };
            match write_document(&dir, &document) {
                Err(AppError::Io(err)) => {
                    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput)
                }
                other => panic!("expected invalid input for {filename}, got {other:?}"),
            }
        }
        assert!(!dir.exists());
    }

    #[test]
    fn write_document_places_file_under_output_dir() {
        let dir = std::env::temp_dir().join(format!("belt-exam-export-{}", std::process::id()));
        let document = ExportDocument {
            filename: "DST_KT.csv".to_string(),
            format: DocumentFormat::Csv,
            bytes: b"\xEF\xBB\xBFSTT".to_vec(),
        };

        let path = write_document(&dir, &document).expect("document written");
        assert_eq!(path, dir.join("DST_KT.csv"));
        assert_eq!(std::fs::read(&path).expect("file readable"), document.bytes);

        std::fs::remove_dir_all(&dir).ok();
    }
}
