use std::io::Read;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};

use super::mapping;
use crate::marketplace::postings::PostingDraft;

/// One CSV record paired with the spreadsheet row it came from. The header
/// sits on row 1, so the first data row reports as row 2.
pub(crate) fn parse_rows<R: Read>(reader: R) -> Result<Vec<(usize, PostingRow)>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<PostingRow>().enumerate() {
        rows.push((index + 2, record?));
    }

    Ok(rows)
}

/// Raw posting row as exported by applicant tracking systems.
#[derive(Debug, Deserialize)]
pub(crate) struct PostingRow {
    #[serde(rename = "Title")]
    title: String,
    #[serde(
        rename = "Location",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    location: Option<String>,
    #[serde(rename = "Field", default, deserialize_with = "empty_string_as_none")]
    field: Option<String>,
    #[serde(
        rename = "Stipend",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    stipend: Option<String>,
    #[serde(
        rename = "Openings",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    openings: Option<String>,
    #[serde(
        rename = "Deadline",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    deadline: Option<String>,
    #[serde(rename = "Skills", default, deserialize_with = "empty_string_as_none")]
    skills: Option<String>,
    #[serde(
        rename = "Description",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    description: Option<String>,
}

impl PostingRow {
    /// Turn the raw cells into a posting draft, or explain why the row
    /// cannot be used.
    pub(crate) fn into_draft(self) -> Result<PostingDraft, String> {
        if self.title.is_empty() {
            return Err("title is empty".to_string());
        }
        let location = self.location.ok_or_else(|| "location is empty".to_string())?;
        let description = self
            .description
            .ok_or_else(|| "description is empty".to_string())?;
        let deadline_cell = self.deadline.ok_or_else(|| "deadline is empty".to_string())?;
        let deadline = parse_deadline(&deadline_cell)
            .ok_or_else(|| format!("deadline {deadline_cell:?} is not a date"))?;

        let stipend = match self.stipend {
            Some(cell) => cell
                .parse::<u32>()
                .map_err(|_| format!("stipend {cell:?} is not a number"))?,
            None => 0,
        };
        let openings = match self.openings {
            Some(cell) => cell
                .parse::<u16>()
                .map_err(|_| format!("openings {cell:?} is not a number"))?,
            None => 1,
        };
        if openings == 0 {
            return Err("openings must be at least 1".to_string());
        }

        Ok(PostingDraft {
            title: self.title,
            description,
            location,
            field: mapping::field_for_label(self.field.as_deref().unwrap_or("")),
            stipend,
            openings,
            deadline,
            skills: self.skills.map(split_skills).unwrap_or_default(),
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

/// Deadlines arrive either as plain dates or as full RFC 3339 timestamps,
/// depending on the exporting system.
fn parse_deadline(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

fn split_skills(cell: String) -> Vec<String> {
    cell.split([';', ','])
        .map(str::trim)
        .filter(|skill| !skill.is_empty())
        .map(str::to_string)
        .collect()
}
