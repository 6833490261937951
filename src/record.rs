//! Record codec for the task store
//!
//! Converts between raw CSV rows and [`Task`] records. The first row of a
//! store is always the header `ID,Title,CreatedAt,CompletedAt`; every other
//! row is one task, oldest first.

use std::collections::HashSet;
use std::io::{Read, Write};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Error, Result};

/// Column schema of the store file
pub const HEADER: [&str; 4] = ["ID", "Title", "CreatedAt", "CompletedAt"];

/// On-disk timestamp format (`2024-05-01 09:30:00`)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A raw CSV row
pub type Row = Vec<String>;

/// One tracked item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub created_at: NaiveDateTime,
    /// `None` until the task is completed
    pub completed_at: Option<NaiveDateTime>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.title.clone(),
            format_timestamp(&self.created_at),
            self.completed_at
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_default(),
        ]
    }
}

/// The fixed header as an owned row
pub fn header_row() -> Row {
    HEADER.iter().map(|column| column.to_string()).collect()
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).ok()
}

/// Parse a user-supplied task ID
pub fn parse_task_id(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::InvalidInput("please provide task ID".to_string()));
    }
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(Error::InvalidInput(format!(
            "task ID must be a positive integer, got '{raw}'"
        ))),
    }
}

/// Decode raw rows into the header and the task list.
///
/// Row numbers in errors are 1-based and count the header as row 1.
pub fn decode(rows: &[Row]) -> Result<(Row, Vec<Task>)> {
    let (header, body) = match rows.split_first() {
        Some(split) => split,
        None => {
            return Err(Error::MalformedStore {
                path: Default::default(),
                reason: "store has no header row".to_string(),
            })
        }
    };

    if header.len() != HEADER.len() || header.iter().zip(HEADER).any(|(have, want)| have != want)
    {
        return Err(Error::MalformedStore {
            path: Default::default(),
            reason: format!(
                "expected header '{}', found '{}'",
                HEADER.join(","),
                header.join(",")
            ),
        });
    }

    let mut seen = HashSet::with_capacity(body.len());
    let mut tasks = Vec::with_capacity(body.len());
    for (idx, row) in body.iter().enumerate() {
        let row_number = idx + 2;
        let task = decode_row(row_number, row)?;
        if !seen.insert(task.id) {
            return Err(Error::CorruptRecord {
                row: row_number,
                reason: format!("duplicate task ID {}", task.id),
            });
        }
        tasks.push(task);
    }

    Ok((header.clone(), tasks))
}

fn decode_row(row_number: usize, row: &[String]) -> Result<Task> {
    let corrupt = |reason: String| Error::CorruptRecord {
        row: row_number,
        reason,
    };

    if row.len() != HEADER.len() {
        return Err(corrupt(format!(
            "expected {} fields, found {}",
            HEADER.len(),
            row.len()
        )));
    }

    let id = match row[0].parse::<u64>() {
        Ok(id) if id > 0 => id,
        _ => return Err(corrupt(format!("invalid task ID '{}'", row[0]))),
    };
    if row[1].is_empty() {
        return Err(corrupt("empty title".to_string()));
    }
    let created_at = parse_timestamp(&row[2])
        .ok_or_else(|| corrupt(format!("invalid CreatedAt '{}'", row[2])))?;
    let completed_at = if row[3].is_empty() {
        None
    } else {
        Some(
            parse_timestamp(&row[3])
                .ok_or_else(|| corrupt(format!("invalid CompletedAt '{}'", row[3])))?,
        )
    };

    Ok(Task {
        id,
        title: row[1].clone(),
        created_at,
        completed_at,
    })
}

/// Encode a header and tasks back into rows, preserving task order
pub fn encode(header: &[String], tasks: &[Task]) -> Vec<Row> {
    let mut rows = Vec::with_capacity(tasks.len() + 1);
    rows.push(header.to_vec());
    rows.extend(tasks.iter().map(Task::to_row));
    rows
}

/// Read every row of a CSV stream.
///
/// Rows of any arity are accepted here; [`decode`] reports arity errors
/// with the row number.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<Row>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Write rows as CSV with standard quoting
pub fn write_rows<W: Write>(writer: W, rows: &[Row]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    for row in rows {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
