// Primitives for reading the CSV list of votes to cast.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use log::debug;
use snafu::prelude::*;

use crate::backfill::*;

pub const TOPIC_ID_COLUMN: &str = "topic_id";
pub const USERNAME_COLUMN: &str = "username";

/// One vote to cast: the topic, and the user to cast it as.
///
/// Both fields are trimmed. The topic id is kept as written in the file and
/// only parsed when a request is built.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRow {
    pub topic_id: String,
    pub username: String,
}

impl VoteRow {
    /// Checks that the row can be sent and returns the numeric topic id.
    pub fn validate(&self) -> Result<u64, String> {
        let topic_id = self
            .topic_id
            .parse::<u64>()
            .map_err(|_| format!("topic_id {:?} is not an integer", self.topic_id))?;
        if self.username.is_empty() {
            return Err("username is empty".to_string());
        }
        Ok(topic_id)
    }
}

pub fn read_rows(path: &Path) -> BackfillResult<Vec<VoteRow>> {
    let path_s = path.display().to_string();
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return InputNotFoundSnafu { path: path_s }.fail()
        }
        Err(e) => return Err(csv::Error::from(e)).context(InputUnreadableSnafu { path: path_s }),
    };

    // Extra columns are ignored and short lines give empty fields.
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);
    let header = rdr
        .headers()
        .context(InputUnreadableSnafu { path: &path_s })?
        .clone();
    debug!("read_rows: header: {:?}", header);

    let mut records: Vec<csv::StringRecord> = Vec::new();
    for line_r in rdr.records() {
        let line = line_r.context(InputUnreadableSnafu { path: &path_s })?;
        records.push(line);
    }
    if records.is_empty() {
        return InputEmptySnafu { path: path_s }.fail();
    }

    let col_index = |name: &str| header.iter().position(|h| h == name);
    let (topic_idx, username_idx) = match (col_index(TOPIC_ID_COLUMN), col_index(USERNAME_COLUMN)) {
        (Some(t), Some(u)) => (t, u),
        _ => {
            return SchemaSnafu {
                found: header.iter().map(|h| h.to_string()).collect::<Vec<String>>(),
            }
            .fail()
        }
    };

    let rows: Vec<VoteRow> = records
        .iter()
        .map(|line| VoteRow {
            topic_id: line.get(topic_idx).unwrap_or("").trim().to_string(),
            username: line.get(username_idx).unwrap_or("").trim().to_string(),
        })
        .collect();
    debug!("read_rows: {} rows", rows.len());
    Ok(rows)
}
