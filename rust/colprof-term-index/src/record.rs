//! Term records and their on-disk line formats.
//!
//! A finished term index holds one `id<TAB>value<TAB>type<TAB>columns` line per
//! term. Sorted runs written while the index is being built omit the id:
//! `value<TAB>type<TAB>columns`. Both are ordered by value.

use std::io::Write;

use colprof_common::{
    ColumnFrequencies, Result, TermId, error::Error, fs::LineLocation, records::split_fields,
};

use crate::data_type::DataType;

/// A term without an id, as held in memory and in sorted runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermEntry {
    pub value: String,
    pub data_type: DataType,
    pub columns: ColumnFrequencies,
}

impl TermEntry {
    pub fn parse(line: &str, location: LineLocation<'_>) -> Result<TermEntry> {
        let [value, type_id, columns] = split_fields::<3>(line, location)?;
        parse_entry(value, type_id, columns, location)
    }

    pub fn write_line(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}\t{}\t{}",
            self.value,
            self.data_type.id(),
            self.columns
        )
    }

    pub fn with_id(self, id: TermId) -> TermRecord {
        TermRecord {
            id,
            value: self.value,
            data_type: self.data_type,
            columns: self.columns,
        }
    }
}

/// A term of a finished term index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRecord {
    pub id: TermId,
    pub value: String,
    pub data_type: DataType,
    pub columns: ColumnFrequencies,
}

impl TermRecord {
    pub fn new(id: TermId, value: impl Into<String>, columns: ColumnFrequencies) -> TermRecord {
        let value = value.into();
        TermRecord {
            id,
            data_type: DataType::detect(&value),
            value,
            columns,
        }
    }

    pub fn parse(line: &str, location: LineLocation<'_>) -> Result<TermRecord> {
        let [id, value, type_id, columns] = split_fields::<4>(line, location)?;
        let id = id.parse::<TermId>().map_err(|_| {
            Error::invalid_format(location.to_string(), format!("bad term id '{id}'"))
        })?;
        Ok(parse_entry(value, type_id, columns, location)?.with_id(id))
    }

    pub fn write_line(&self, writer: &mut impl Write) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            self.id,
            self.value,
            self.data_type.id(),
            self.columns
        )
    }

    pub fn into_entry(self) -> TermEntry {
        TermEntry {
            value: self.value,
            data_type: self.data_type,
            columns: self.columns,
        }
    }
}

fn parse_entry(
    value: &str,
    type_id: &str,
    columns: &str,
    location: LineLocation<'_>,
) -> Result<TermEntry> {
    let data_type = type_id
        .parse::<u8>()
        .map_err(|_| ())
        .and_then(|id| DataType::from_id(id).map_err(|_| ()))
        .map_err(|_| {
            Error::invalid_format(location.to_string(), format!("bad type id '{type_id}'"))
        })?;
    let columns = ColumnFrequencies::parse(columns, &location)?;
    if columns.is_empty() {
        return Err(Error::invalid_format(
            location.to_string(),
            format!("term '{value}' has no columns"),
        ));
    }
    Ok(TermEntry {
        value: value.to_string(),
        data_type,
        columns,
    })
}
