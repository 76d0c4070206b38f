//! Directory listing table parser.
//!
//! The listing is a single `<table id="table">`. Each data row carries:
//!
//! | index | content                                  |
//! |-------|------------------------------------------|
//! | 1     | `<a href="...">file id</a>`              |
//! | 2     | description                              |
//! | 3     | size label                               |
//! | 4     | upload time, `YY/MM/DD<glyph>HH:mm:ss`   |
//! | 7     | file name                                |
//!
//! The header row repeats the column names, so it is recognized by its size
//! cell reading `サイズ`.
//!
//! Uploaders often leave the comment empty. Blank description, size and name
//! cells are shown as `-`; a blank id, link or time is still an error.

use scraper::{ElementRef, Html, Selector};
use upwatch_core::{RecordFields, TimeConverter, UploadRecord};
use upwatch_logging::watch_debug;

use crate::ParseError;

const TABLE_SELECTOR: &str = "table#table";
const ROW_SELECTOR: &str = "tr";
const CELL_SELECTOR: &str = "td";
const LINK_SELECTOR: &str = "a";

const COL_FILE_ID: usize = 1;
const COL_DESCRIPTION: usize = 2;
const COL_SIZE: usize = 3;
const COL_PUBLISHED: usize = 4;
const COL_FILE_NAME: usize = 7;

const SIZE_HEADER: &str = "サイズ";
const BLANK_CELL: &str = "-";

struct Selectors {
    table: Selector,
    row: Selector,
    cell: Selector,
    link: Selector,
}

impl Selectors {
    fn build() -> Result<Self, ParseError> {
        Ok(Self {
            table: compile(TABLE_SELECTOR)?,
            row: compile(ROW_SELECTOR)?,
            cell: compile(CELL_SELECTOR)?,
            link: compile(LINK_SELECTOR)?,
        })
    }
}

fn compile(css: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|err| ParseError::InvalidSelector {
        selector: css,
        reason: err.to_string(),
    })
}

/// Turns one source page's listing html into records, in document order.
#[derive(Debug, Clone)]
pub struct TableParser<'a> {
    base_url: &'a str,
    time: &'a TimeConverter,
}

impl<'a> TableParser<'a> {
    /// `base_url` prefixes the relative links found in the table.
    pub fn new(base_url: &'a str, time: &'a TimeConverter) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/'),
            time,
        }
    }

    pub fn parse(&self, html: &str) -> Result<Vec<UploadRecord>, ParseError> {
        let selectors = Selectors::build()?;
        let doc = Html::parse_document(html);
        let table = doc
            .select(&selectors.table)
            .next()
            .ok_or(ParseError::TableNotFound {
                selector: TABLE_SELECTOR,
            })?;

        let mut records = Vec::new();
        for (index, row) in table.select(&selectors.row).enumerate() {
            let row_number = index + 1;
            let cells: Vec<ElementRef> = row.select(&selectors.cell).collect();
            if cells.is_empty() {
                continue;
            }
            if cell_text(&cells, COL_SIZE, row_number)? == SIZE_HEADER {
                continue;
            }
            records.push(self.parse_row(&cells, &selectors, row_number)?);
        }
        Ok(records)
    }

    fn parse_row(
        &self,
        cells: &[ElementRef],
        selectors: &Selectors,
        row: usize,
    ) -> Result<UploadRecord, ParseError> {
        let id_cell = cells.get(COL_FILE_ID).ok_or(ParseError::MissingColumn {
            row,
            column: COL_FILE_ID,
        })?;
        let link = id_cell
            .select(&selectors.link)
            .next()
            .ok_or(ParseError::MissingLink { row })?;
        let href = link.value().attr("href").ok_or(ParseError::MissingLink { row })?;

        let raw_time = cell_text(cells, COL_PUBLISHED, row)?;
        let published_at = self
            .time
            .normalize(&raw_time)
            .map_err(|source| ParseError::Timestamp { row, source })?;

        let fields = RecordFields {
            source_url: self.resolve(href),
            file_id: link.text().collect::<String>().trim().to_string(),
            file_name: display_text(cells, COL_FILE_NAME, row)?,
            size_label: display_text(cells, COL_SIZE, row)?,
            published_at,
            description: display_text(cells, COL_DESCRIPTION, row)?,
        };
        UploadRecord::new(fields).map_err(|err| ParseError::EmptyField {
            row,
            field: err.field,
        })
    }

    fn resolve(&self, href: &str) -> String {
        let href = href.trim();
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        let relative = href.trim_start_matches("./").trim_start_matches('/');
        format!("{}/{}", self.base_url, relative)
    }
}

fn cell_text(cells: &[ElementRef], column: usize, row: usize) -> Result<String, ParseError> {
    cells
        .get(column)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .ok_or(ParseError::MissingColumn { row, column })
}

/// Like [`cell_text`], but a blank cell reads as [`BLANK_CELL`].
fn display_text(cells: &[ElementRef], column: usize, row: usize) -> Result<String, ParseError> {
    let text = cell_text(cells, column, row)?;
    if text.is_empty() {
        watch_debug!("row {}: column {} is blank", row, column);
        return Ok(BLANK_CELL.to_string());
    }
    Ok(text)
}
