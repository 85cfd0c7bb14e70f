use std::sync::Arc;

use chrono::Local;
use tracing::{error, info};

use super::filename::derive_filename;
use super::pipeline::{ExportError, ExportPipeline, SelectionRequest};
use super::render::DocumentFormat;
use super::roster::{RosterEntry, RosterSource};

/// Rendered registration sheet ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub filename: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl ExportDocument {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Couples a roster source with the resolution pipeline.
pub struct RegistrationExporter<S> {
    source: Arc<S>,
    pipeline: ExportPipeline,
}

impl<S> RegistrationExporter<S>
where
    S: RosterSource + 'static,
{
    pub fn new(source: Arc<S>, pipeline: ExportPipeline) -> Self {
        Self { source, pipeline }
    }

    pub fn pipeline(&self) -> &ExportPipeline {
        &self.pipeline
    }

    /// Loads a fresh roster snapshot, resolves the selection and renders it.
    pub fn export(
        &self,
        request: &SelectionRequest,
        format: Option<DocumentFormat>,
    ) -> Result<ExportDocument, ExportError> {
        let settings = self.pipeline.settings();
        let format = format.unwrap_or(settings.default_format);

        let roster = self.source.load().map_err(|err| {
            error!(error = %err, "roster load failed");
            ExportError::from(err)
        })?;
        let sheet = self.pipeline.resolve(request, &roster)?;

        let bytes = format.render(&sheet).map_err(|err| {
            error!(error = %err, ?format, "document render failed");
            ExportError::from(err)
        })?;

        let stamp = settings
            .timestamp_filenames
            .then(|| Local::now().naive_local());
        let filename = derive_filename(
            &settings.file_prefix,
            &sheet.exam_code,
            format,
            settings.filename_style,
            stamp,
        );

        info!(%filename, bytes = bytes.len(), "registration document rendered");
        Ok(ExportDocument {
            filename,
            format,
            bytes,
        })
    }

    /// Current roster contents for the member picker.
    pub fn members(&self) -> Result<Vec<RosterEntry>, ExportError> {
        let roster = self.source.load().map_err(|err| {
            error!(error = %err, "roster load failed");
            ExportError::from(err)
        })?;
        Ok(roster.entries().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::pipeline::{ErrorKind, ExportSettings};
    use crate::registration::roster::{CsvRosterFile, Roster};

    fn exporter() -> RegistrationExporter<Roster> {
        let roster = Roster::new(vec![
            RosterEntry::new("Alice", "M1", "Cấp 9"),
            RosterEntry::new("Bob", "M2", "Cấp 5"),
        ]);
        RegistrationExporter::new(Arc::new(roster), ExportPipeline::default())
    }

    #[test]
    fn export_uses_default_format_and_filename() {
        let document = exporter()
            .export(&SelectionRequest::new("2025-Q3", ["M2", "M1"]), None)
            .expect("export succeeds");
        assert_eq!(document.filename, "DST_2025-Q3.xlsx");
        assert_eq!(document.format, DocumentFormat::Xlsx);
        assert!(!document.bytes.is_empty());
    }

    #[test]
    fn export_honours_requested_format() {
        let document = exporter()
            .export(
                &SelectionRequest::new("2025-Q3", ["M1"]),
                Some(DocumentFormat::Csv),
            )
            .expect("export succeeds");
        assert_eq!(document.filename, "DST_2025-Q3.csv");
        assert!(document.content_type().starts_with("text/csv"));
    }

    #[test]
    fn missing_roster_file_is_an_io_failure() {
        let exporter = RegistrationExporter::new(
            Arc::new(CsvRosterFile::new("./missing-roster.csv")),
            ExportPipeline::new(ExportSettings::default()),
        );
        let error = exporter
            .export(&SelectionRequest::new("KT", ["M1"]), None)
            .expect_err("missing roster fails");
        assert_eq!(error.kind(), ErrorKind::Io);
        assert_eq!(error.to_string(), "failed to read roster");
    }

    #[test]
    fn members_lists_the_roster() {
        let members = exporter().members().expect("members load");
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].member_code, "M2");
    }
}
