//! Workbook export of the current allocations

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::board::{Board, BucketId};
use crate::error::{AllocationError, Result};

pub const HEADER: [&str; 4] = ["Name", "Pickup Location", "Number of People", "Time"];
const COLUMN_WIDTHS: [f64; 4] = [25.0, 40.0, 20.0, 20.0];
const MAX_SHEET_NAME_CHARS: usize = 31;

/// One data row; the time column is always written blank
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub name: String,
    pub location: String,
    pub people: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<ExportRow>,
}

/// Cell as written to the worksheet
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(u32),
    Blank,
}

impl SheetData {
    /// Header row followed by one row per request
    pub fn cells(&self) -> Vec<[Cell; 4]> {
        let header = HEADER.map(|title| Cell::Text(title.to_string()));
        std::iter::once(header)
            .chain(self.rows.iter().map(|row| {
                [
                    Cell::Text(row.name.clone()),
                    Cell::Text(row.location.clone()),
                    Cell::Number(row.people),
                    Cell::Blank,
                ]
            }))
            .collect()
    }
}

fn sheet_name(raw: &str) -> String {
    raw.chars().take(MAX_SHEET_NAME_CHARS).collect()
}

fn sheet_for(board: &Board, bucket: BucketId) -> Option<SheetData> {
    let items = &board.bucket(bucket).items;
    if items.is_empty() {
        return None;
    }
    Some(SheetData {
        name: sheet_name(bucket.sheet_name()),
        rows: items
            .iter()
            .map(|p| ExportRow {
                name: p.name.clone(),
                location: p.location.clone(),
                people: p.group_size,
            })
            .collect(),
    })
}

/// One sheet per non-empty load in fixed order, then the unassigned pool
pub fn build_sheets(board: &Board) -> Result<Vec<SheetData>> {
    if board.is_empty() {
        return Err(AllocationError::NothingToAllocate);
    }
    Ok(BucketId::LOADS
        .iter()
        .chain(std::iter::once(&BucketId::Unassigned))
        .filter_map(|&bucket| sheet_for(board, bucket))
        .collect())
}

pub fn write_workbook(sheets: &[SheetData]) -> Result<Workbook> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for data in sheets {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&data.name)?;

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }

        for (r, row) in data.cells().iter().enumerate() {
            let r = r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(text) if r == 0 => {
                        sheet.write_string_with_format(r, c, text, &header_format)?;
                    }
                    Cell::Text(text) => {
                        sheet.write_string(r, c, text)?;
                    }
                    Cell::Number(n) => {
                        sheet.write_number(r, c, f64::from(*n))?;
                    }
                    Cell::Blank => {}
                }
            }
        }
    }

    Ok(workbook)
}

pub fn export_to_buffer(board: &Board) -> Result<Vec<u8>> {
    let sheets = build_sheets(board)?;
    let mut workbook = write_workbook(&sheets)?;
    let bytes = workbook.save_to_buffer()?;
    info!(sheets = sheets.len(), bytes = bytes.len(), "generated allocation workbook");
    Ok(bytes)
}

pub fn export_to_file(board: &Board, output_path: &Path) -> Result<()> {
    let sheets = build_sheets(board)?;
    let mut workbook = write_workbook(&sheets)?;
    workbook.save(output_path)?;
    info!(sheets = sheets.len(), path = %output_path.display(), "saved allocation workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Person, PersonId};

    fn person(n: usize, name: &str, location: &str, size: u32) -> Person {
        Person {
            id: PersonId(n),
            name: name.into(),
            location: location.into(),
            group_size: size,
            priority: false,
        }
    }

    #[test]
    fn single_taxi_passenger_yields_one_sheet() {
        let mut board = Board::new();
        board.push(
            BucketId::SpecialTaxi1,
            person(0, "Jane Doe", "Total Garage Braamfontein", 2),
        );

        let sheets = build_sheets(&board).expect("sheets");
        assert_eq!(
            sheets,
            vec![SheetData {
                name: "Special Taxi Load 1".into(),
                rows: vec![ExportRow {
                    name: "Jane Doe".into(),
                    location: "Total Garage Braamfontein".into(),
                    people: 2,
                }],
            }]
        );

        let cells = sheets[0].cells();
        assert_eq!(
            cells,
            vec![
                [
                    Cell::Text("Name".into()),
                    Cell::Text("Pickup Location".into()),
                    Cell::Text("Number of People".into()),
                    Cell::Text("Time".into()),
                ],
                [
                    Cell::Text("Jane Doe".into()),
                    Cell::Text("Total Garage Braamfontein".into()),
                    Cell::Number(2),
                    Cell::Blank,
                ],
            ]
        );
    }

    #[test]
    fn sheets_follow_fixed_order_with_pool_last() {
        let mut board = Board::new();
        board.push(BucketId::Unassigned, person(0, "A", "Melville", 1));
        board.push(BucketId::SpecialTaxi2, person(1, "B", "15 Yale Road", 3));
        board.push(BucketId::ChurchBus3, person(2, "C", "Parktown", 4));
        board.push(BucketId::ChurchBus3, person(3, "D", "Parktown", 1));

        let names: Vec<String> = build_sheets(&board)
            .expect("sheets")
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            names,
            vec!["Church Bus Load 3", "Special Taxi Load 2", "Private Lifts & Uber"]
        );
    }

    #[test]
    fn empty_board_has_nothing_to_allocate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Transport_Allocations.xlsx");

        let err = export_to_file(&Board::new(), &path).unwrap_err();
        assert!(matches!(err, AllocationError::NothingToAllocate));
        assert_eq!(err.to_string(), "There is no one to allocate.");
        assert!(!path.exists());
    }

    #[test]
    fn long_sheet_names_are_truncated() {
        let name = sheet_name("Church Bus Load 1 for the evening service");
        assert_eq!(name.chars().count(), 31);
        assert_eq!(sheet_name("Short"), "Short");
    }

    #[test]
    fn workbook_is_written_as_xlsx() {
        let mut board = Board::new();
        board.push(BucketId::ChurchBus1, person(0, "Jane Doe", "Melville", 2));
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.xlsx");

        export_to_file(&board, &path).expect("export");
        let bytes = std::fs::read(&path).expect("read");
        assert!(bytes.starts_with(b"PK"));

        let buffer = export_to_buffer(&board).expect("buffer");
        assert!(buffer.starts_with(b"PK"));
    }
}
