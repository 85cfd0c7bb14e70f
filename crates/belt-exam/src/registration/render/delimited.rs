use super::RenderError;
use crate::registration::pipeline::RegistrationSheet;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// UTF-8 CSV with a BOM so spreadsheet tools pick the right encoding.
pub(super) fn render(sheet: &RegistrationSheet) -> Result<Vec<u8>, RenderError> {
    let width = sheet.headers.len();
    let mut writer = csv::WriterBuilder::new().from_writer(UTF8_BOM.to_vec());

    let mut title_row = vec![String::new(); width];
    title_row[0] = sheet.title.clone();
    writer.write_record(&title_row)?;
    writer.write_record(vec![""; width])?;
    writer.write_record(sheet.headers)?;

    for entry in &sheet.rows {
        writer.write_record([
            entry.sequence_number.to_string(),
            entry.exam_code.clone(),
            entry.org_code.clone(),
            entry.club_code.clone(),
            entry.member_code.clone(),
            entry.registration_rank.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|err| RenderError::Io(err.into_error()))
}
