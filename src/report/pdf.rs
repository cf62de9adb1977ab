use printpdf::lopdf::{Object, StringFormat, content::Operation};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use super::{ReportError, ReportHeading, ReportRenderer};
use crate::model::time_record::TimeRecordView;

const LAYER: &str = "Layer 1";
const HEADERS: [&str; 5] = ["Date", "Status", "Entry", "Exit", "Worked hours"];

/// A4 portrait table, one line per record, paginated.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReportRenderer;

fn render_err<E: std::fmt::Debug>(e: E) -> ReportError {
    ReportError::Render(format!("{e:?}"))
}

/// Windows-1252 bytes for `text`, the encoding the built-in fonts declare.
/// Characters outside it become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            ' '..='~' | '\u{a0}'..='\u{ff}' => ch as u8,
            '€' => 0x80,
            '‚' => 0x82,
            'ƒ' => 0x83,
            '„' => 0x84,
            '…' => 0x85,
            '†' => 0x86,
            '‡' => 0x87,
            'ˆ' => 0x88,
            '‰' => 0x89,
            'Š' => 0x8a,
            '‹' => 0x8b,
            'Œ' => 0x8c,
            'Ž' => 0x8e,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '˜' => 0x98,
            '™' => 0x99,
            'š' => 0x9a,
            '›' => 0x9b,
            'œ' => 0x9c,
            'ž' => 0x9e,
            'Ÿ' => 0x9f,
            _ => b'?',
        })
        .collect()
}

fn put_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    size: f32,
    x: Mm,
    y: Mm,
    text: &str,
) {
    layer.begin_text_section();
    layer.set_font(font, size);
    layer.set_text_cursor(x, y);
    layer.add_operation(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Hexadecimal)],
    ));
    layer.end_text_section();
}

fn write_row(layer: &PdfLayerReference, font: &IndirectFontRef, y: Mm, cells: &[String; 5]) {
    let columns = [15.0, 45.0, 75.0, 115.0, 155.0];
    for (x, cell) in columns.into_iter().zip(cells.iter()) {
        put_text(layer, font, 9.0, Mm(x), y, cell);
    }
}

fn cells_for(record: &TimeRecordView) -> [String; 5] {
    [
        record.date.format("%d/%m/%Y").to_string(),
        record.status.to_string(),
        record.entry_time.format("%H:%M").to_string(),
        record
            .exit_time
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default(),
        record
            .worked_hours
            .map(|h| h.to_string())
            .unwrap_or_default(),
    ]
}

impl ReportRenderer for PdfReportRenderer {
    fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    fn file_extension(&self) -> &'static str {
        "pdf"
    }

    fn render(
        &self,
        heading: &ReportHeading,
        records: &[TimeRecordView],
    ) -> Result<Vec<u8>, ReportError> {
        let title = format!("Time records - {}", heading.employee_name);
        let (doc, page, layer) = PdfDocument::new(&title, Mm(210.0), Mm(297.0), LAYER);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_err)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_err)?;

        let mut current = doc.get_page(page).get_layer(layer);
        put_text(&current, &bold, 14.0, Mm(15.0), Mm(280.0), &title);
        let period = format!(
            "Period: {} to {}",
            heading.date_from.format("%d/%m/%Y"),
            heading.date_to.format("%d/%m/%Y")
        );
        put_text(&current, &font, 10.0, Mm(15.0), Mm(272.0), &period);

        let header_cells = HEADERS.map(String::from);
        let mut y = Mm(260.0);
        write_row(&current, &bold, y, &header_cells);

        if records.is_empty() {
            let y = Mm(y.0 - 8.0);
            put_text(&current, &font, 9.0, Mm(15.0), y, "No records in this period.");
        }

        for record in records {
            y = Mm(y.0 - 7.0);
            if y.0 < 20.0 {
                let (next_page, next_layer) = doc.add_page(Mm(210.0), Mm(297.0), LAYER);
                current = doc.get_page(next_page).get_layer(next_layer);
                y = Mm(280.0);
                write_row(&current, &bold, y, &header_cells);
                y = Mm(y.0 - 7.0);
            }
            write_row(&current, &font, y, &cells_for(record));
        }

        doc.save_to_bytes().map_err(render_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::time_record::TimeRecord;
    use chrono::{Duration, NaiveDate};

    fn heading() -> ReportHeading {
        ReportHeading {
            employee_name: "Maria Souza".to_string(),
            date_from: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            date_to: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
        }
    }

    fn views(count: u64) -> Vec<TimeRecordView> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        (0..count)
            .map(|i| {
                let entry = start + Duration::days(i as i64);
                let exit = (i % 3 != 0).then(|| entry + Duration::minutes(510));
                TimeRecordView::from(TimeRecord {
                    id: i + 1,
                    employee_id: 1,
                    date: entry.date(),
                    entry_time: entry,
                    exit_time: exit,
                })
            })
            .collect()
    }

    #[test]
    fn renders_a_pdf_document() {
        let bytes = PdfReportRenderer.render(&heading(), &views(5)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn renders_empty_period() {
        let bytes = PdfReportRenderer.render(&heading(), &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_reports_spill_onto_more_pages() {
        let short = PdfReportRenderer.render(&heading(), &views(3)).unwrap();
        let long = PdfReportRenderer.render(&heading(), &views(90)).unwrap();
        assert!(long.len() > short.len());
    }

    #[test]
    fn open_rows_leave_exit_and_hours_blank() {
        let rows = views(2);
        let open = cells_for(&rows[0]);
        let closed = cells_for(&rows[1]);

        assert_eq!(open[1], "open");
        assert!(open[3].is_empty() && open[4].is_empty());
        assert_eq!(closed[4], "08:30");
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn accented_text_is_encoded_as_win_ansi() {
        assert_eq!(win_ansi("João"), vec![b'J', b'o', 0xe3, b'o']);
        assert_eq!(win_ansi("Conceição – 100€"), b"Concei\xe7\xe3o \x96 100\x80".to_vec());
        assert_eq!(win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn heading_name_is_written_in_the_font_encoding() {
        let heading = ReportHeading {
            employee_name: "João Conceição".to_string(),
            ..heading()
        };
        let bytes = PdfReportRenderer.render(&heading, &views(1)).unwrap();

        // "João Conceição" in Windows-1252, as a hex string operand
        assert!(contains(&bytes, b"4A6FE36F20436F6E636569E7E36F"));
        assert!(!contains(&bytes, b"4A6FC3A36F"));
    }

    #[test]
    fn file_stem_carries_the_range() {
        assert_eq!(heading().file_stem(), "time-records-20250101-20250331");
    }
}
