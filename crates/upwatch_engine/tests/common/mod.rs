#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{TimeZone, Utc};
use upwatch_core::{FixedClock, RecordFields, TimeConverter, UploadRecord};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(upwatch_logging::initialize_for_tests);
}

/// Clock at 2023-06-23 14:30:00 Asia/Shanghai (15:30 in Tokyo).
pub fn converter() -> TimeConverter {
    let instant = Utc.with_ymd_and_hms(2023, 6, 23, 6, 30, 0).unwrap();
    TimeConverter::new(Arc::new(FixedClock::new(instant)))
}

/// Tokyo-time raw stamps relative to [`converter`].
pub const THREE_DAYS_AGO: &str = "23/06/20㈫10:00:00";
pub const THIS_HOUR_EARLY: &str = "23/06/23㈮15:05:00";
pub const THIS_HOUR_LATE: &str = "23/06/23㈮15:20:00";
pub const LAST_HOUR: &str = "23/06/23㈮14:45:00";

#[derive(Debug, Clone)]
pub struct Row {
    pub id: String,
    pub description: String,
    pub size: String,
    pub time: String,
    pub name: String,
}

pub fn row(id: &str, time: &str) -> Row {
    Row {
        id: id.to_string(),
        description: format!("notes for {id}"),
        size: "1.2MB".to_string(),
        time: time.to_string(),
        name: format!("{id}_game.zip"),
    }
}

const HEADER: &str = "<tr><td>DEL</td><td>File</td><td>COMMENT</td><td>サイズ</td>\
<td>DATE</td><td>MIME</td><td>ORIG</td><td>NAME</td></tr>";

/// A listing page shaped like the real one: header row, then data rows.
pub fn listing_html(rows: &[Row]) -> String {
    let body: String = rows
        .iter()
        .map(|r| {
            format!(
                "<tr><td><input type=\"checkbox\"></td>\
                 <td><a href=\"src/{id}.zip\">{id}</a></td>\
                 <td>{desc}</td><td>{size}</td><td>{time}</td>\
                 <td>application/zip</td><td>orig.zip</td><td>{name}</td></tr>",
                id = r.id,
                desc = r.description,
                size = r.size,
                time = r.time,
                name = r.name,
            )
        })
        .collect();
    format!(
        "<html><head><meta charset=\"utf-8\"><title>up</title></head><body>\
         <table id=\"table\">{HEADER}{body}</table></body></html>"
    )
}

pub fn record(id: &str, published_at: &str) -> UploadRecord {
    UploadRecord::new(RecordFields {
        source_url: format!("http://example.com/up/src/{id}.zip"),
        file_id: id.to_string(),
        file_name: format!("{id}_game.zip"),
        size_label: "1.2MB".to_string(),
        published_at: published_at.to_string(),
        description: format!("notes for {id}"),
    })
    .unwrap()
}

pub fn records(count: usize) -> Vec<UploadRecord> {
    (0..count)
        .map(|i| record(&format!("era{i:04}"), "2023-06-23 14:10:00"))
        .collect()
}
