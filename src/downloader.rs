#![cfg(not(tarpaulin_include))]

use crate::activity::RegionalActivity;
use crate::dataset::RegionSummaryEntry;
use crate::evaluator::RegionForecastTable;

/// Convert forecast tables to CSV format
///
/// One line per cluster. Each forecast period contributes three columns:
/// the actual stage, the forecast stage and the verdict. Absent values are
/// written as empty cells.
///
/// # Examples
/// ```no_run
/// use dashboard::downloader::forecast_to_csv;
/// use dashboard::evaluator::PeriodAlignment;
/// use dashboard::loader::from_json;
///
/// let data = from_json("data/dashboard.json").unwrap();
/// let tables = data.forecast_tables(0..usize::MAX, PeriodAlignment::IndexDoubling);
/// let csv = forecast_to_csv(&tables);
/// println!("CSV generated: {} bytes", csv.len());
/// ```
pub fn forecast_to_csv(tables: &[RegionForecastTable]) -> String {
    let mut csv_content = String::new();
    for record in forecast_records(tables) {
        push_record(&mut csv_content, &record);
    }
    csv_content
}

fn forecast_records(tables: &[RegionForecastTable]) -> Vec<Vec<String>> {
    let mut header = vec![
        "Region".to_string(),
        "Grouping".to_string(),
        "Cluster".to_string(),
    ];
    if let Some(first) = tables.first() {
        for period in &first.periods {
            header.push(format!("{} actual", period));
            header.push(format!("{} forecast", period));
            header.push(format!("{} verdict", period));
        }
    }

    let mut records = vec![header];
    for table in tables {
        for row in &table.rows {
            let mut record = vec![table.region.clone(), row.grouping.clone(), row.cluster.clone()];
            for cell in &row.cells {
                record.push(cell.actual.map(|s| s.to_string()).unwrap_or_default());
                record.push(cell.forecast.map(|s| s.to_string()).unwrap_or_default());
                record.push(cell.verdict.map(|v| v.to_string()).unwrap_or_default());
            }
            records.push(record);
        }
    }
    records
}

/// Convert regional activity rows, plus a totals row, to CSV format.
pub fn regional_to_csv(rows: &[RegionalActivity]) -> String {
    let mut csv_content = String::new();
    push_record(
        &mut csv_content,
        &[
            "Region",
            "CC No.",
            "CC Participants",
            "CC Friends",
            "JYG No.",
            "JYG Participants",
            "JYG Friends",
            "SC No.",
            "SC Participants",
            "SC Friends",
        ]
        .map(String::from),
    );

    for row in crate::activity::regional_table(rows) {
        let mut record = vec![row.region.clone()];
        for count in [row.childrens_classes, row.junior_youth_groups, row.study_circles] {
            record.push(count.count.to_string());
            record.push(count.participants.to_string());
            record.push(count.friends.to_string());
        }
        push_record(&mut csv_content, &record);
    }

    csv_content
}

pub fn summaries_to_csv(summaries: &[RegionSummaryEntry]) -> String {
    let mut csv_content = String::new();
    push_record(
        &mut csv_content,
        &["Region", "IPG+", "IPG", "PG", "Other", "Total"].map(String::from),
    );

    for entry in summaries {
        let s = &entry.summary;
        push_record(
            &mut csv_content,
            &[
                entry.region.clone(),
                s.ipg_plus.to_string(),
                s.ipg.to_string(),
                s.pg.to_string(),
                s.unclassified().to_string(),
                s.total.to_string(),
            ],
        );
    }

    csv_content
}

/// Convert forecast tables to XLSX format
///
/// Writes the same layout as [`forecast_to_csv`] into a single worksheet
/// using the rust_xlsxwriter library.
#[cfg(feature = "web")]
pub fn forecast_to_xlsx(tables: &[RegionForecastTable]) -> crate::error::Result<Vec<u8>> {
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();
    let bold = Format::new().set_bold();

    for (row, record) in forecast_records(tables).iter().enumerate() {
        for (col, value) in record.iter().enumerate() {
            if row == 0 {
                worksheet.write_string_with_format(row as u32, col as u16, value.as_str(), &bold)?;
            } else if !value.is_empty() {
                worksheet.write_string(row as u32, col as u16, value.as_str())?;
            }
        }
    }

    workbook.push_worksheet(worksheet);
    let buffer = workbook.save_to_buffer()?;
    Ok(buffer)
}

fn push_record(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

// Escape commas, quotes, newlines as needed
fn escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
