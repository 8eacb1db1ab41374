use anyhow::{Context, Result, anyhow};
use log::{debug, trace};
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_till};
use nom::character::complete::{char, line_ending};
use nom::combinator::value;
use nom::multi::{many, separated_list1};
use nom::sequence::delimited;
use nom::{IResult, Parser};
use std::fs;
use std::path::Path;

/// A CSV file held in memory, with its header row split off.
#[derive(Debug, Clone)]
pub struct CsvTable {
    header: Vec<String>,
    records: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Reading CSV file {path:?}");
        let text = fs::read_to_string(path).with_context(|| format!("Failed to read {path:?}"))?;
        Self::parse(&text).with_context(|| format!("Failed to parse {path:?}"))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut records = parse_records(text)?.into_iter();
        let header = records.next().ok_or_else(|| anyhow!("Missing header row"))?;
        let header = header.into_iter().map(|h| h.trim().to_owned()).collect();
        Ok(CsvTable {
            header,
            records: records.collect(),
        })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Missing column {name:?} (header: {:?})", self.header))
    }

    pub fn optional_column(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.records.iter().enumerate().map(|(i, fields)| Record {
            // Line 1 is the header.
            line: i + 2,
            fields,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub line: usize,
    fields: &'a [String],
}

impl<'a> Record<'a> {
    pub fn get(&self, column: usize) -> Result<&'a str> {
        self.fields
            .get(column)
            .map(|f| f.trim())
            .ok_or_else(|| anyhow!("Line {}: missing field #{column}", self.line))
    }

    pub fn parse<T>(&self, column: usize) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let field = self.get(column)?;
        field
            .parse()
            .map_err(|e| anyhow!("Line {}: invalid value {field:?}: {e}", self.line))
    }
}

fn parse_records(text: &str) -> Result<Vec<Vec<String>>> {
    let mut input = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = Vec::new();
    while !input.is_empty() {
        let (rest, fields) = record(input).map_err(|e| anyhow!("Failed to parse: {e:?}"))?;
        input = match line_ending::<&str, nom::error::Error<&str>>(rest) {
            Ok((rest, _)) => rest,
            Err(_) if rest.is_empty() => rest,
            Err(_) => {
                let context: String = rest.chars().take(20).collect();
                return Err(anyhow!("Unexpected data after record: {context:?}"));
            }
        };

        if fields.len() == 1 && fields[0].trim().is_empty() {
            trace!("Skipping blank line");
            continue;
        }
        records.push(fields);
    }
    Ok(records)
}

fn record(i: &str) -> IResult<&str, Vec<String>> {
    separated_list1(char(','), field).parse(i)
}

fn field(i: &str) -> IResult<&str, String> {
    alt((
        quoted,
        take_till(|c: char| c == ',' || c == '\n' || c == '\r').map(|s: &str| s.to_owned()),
    ))
    .parse(i)
}

fn quoted(i: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        many(0.., alt((is_not("\""), value("\"", tag("\"\""))))),
        char('"'),
    )
    .map(|parts: Vec<&str>| parts.concat())
    .parse(i)
}
