use super::{RenderError, HEADER_ROW};
use crate::registration::pipeline::RegistrationSheet;
use crate::registration::rank::RegistrationRank;
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook};

const SHEET_NAME: &str = "DST";
const FONT: &str = "Times New Roman";
const COLUMN_WIDTHS: [f64; 6] = [8.0, 18.0, 15.0, 15.0, 25.0, 28.0];

pub(super) fn render(sheet: &RegistrationSheet) -> Result<Vec<u8>, RenderError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let title_format = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_font_name(FONT)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let header_format = Format::new()
        .set_bold()
        .set_font_size(11)
        .set_font_name(FONT)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let data_format = Format::new()
        .set_font_name(FONT)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);

    let last_column = (sheet.headers.len() - 1) as u16;
    worksheet.merge_range(0, 0, 1, last_column, &sheet.title, &title_format)?;

    for (column, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(column as u16, *width)?;
    }

    for (column, label) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(HEADER_ROW, column as u16, *label, &header_format)?;
    }

    for (offset, entry) in sheet.rows.iter().enumerate() {
        let row = HEADER_ROW + 1 + offset as u32;
        worksheet.write_number_with_format(row, 0, entry.sequence_number as f64, &data_format)?;
        worksheet.write_string_with_format(row, 1, &entry.exam_code, &data_format)?;
        worksheet.write_string_with_format(row, 2, &entry.org_code, &data_format)?;
        worksheet.write_string_with_format(row, 3, &entry.club_code, &data_format)?;
        worksheet.write_string_with_format(row, 4, &entry.member_code, &data_format)?;
        match &entry.registration_rank {
            RegistrationRank::Grade(value) => {
                worksheet.write_number_with_format(row, 5, *value as f64, &data_format)?;
            }
            RegistrationRank::Label(label) => {
                worksheet.write_string_with_format(row, 5, label, &data_format)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
