//! Parsers for observed solar-activity series.
//!
//! Malformed lines are logged and skipped; only I/O failures abort a parse.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::io::BufRead;

use crate::error::PipelineResult;
use crate::models::{FluxObservation, SunspotObservation};

/// A line that could not be turned into a row.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub content: String,
    pub reason: String,
}

/// Parsed rows plus everything that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedLine>,
}

impl<T> Default for IngestReport<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> IngestReport<T> {
    fn skip(&mut self, line_number: usize, content: impl Into<String>, reason: impl Into<String>) {
        let content = content.into();
        let reason = reason.into();
        log::warn!("Skipping line {}: {} ({})", line_number, content.trim(), reason);
        self.skipped.push(SkippedLine {
            line_number,
            content,
            reason,
        });
    }
}

fn parse_flux_line(line: &str) -> Result<FluxObservation, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 7 {
        return Err(format!("expected 7 fields, found {}", fields.len()));
    }

    let number = |idx: usize, name: &str| -> Result<f64, String> {
        fields[idx]
            .parse::<f64>()
            .map_err(|_| format!("{} '{}' is not a number", name, fields[idx]))
    };

    let date = NaiveDate::parse_from_str(fields[0], "%Y%m%d")
        .map_err(|e| format!("bad date '{}': {}", fields[0], e))?;
    let time = NaiveTime::parse_from_str(fields[1], "%H%M%S")
        .map_err(|e| format!("bad time '{}': {}", fields[1], e))?;

    Ok(FluxObservation {
        date,
        time,
        julian_date: number(2, "julian date")?,
        carrington_rotation: number(3, "carrington rotation")?,
        observed_flux: number(4, "observed flux")?,
        adjusted_flux: number(5, "adjusted flux")?,
        ursi_flux: number(6, "URSI flux")?,
    })
}

/// Parse a Penticton flux table (`fluxdate fluxtime fluxjulian fluxcarrington
/// fluxobsflux fluxadjflux fluxursi`, whitespace separated). Header and
/// separator lines are skipped like any other malformed line.
pub fn parse_flux_table<R: BufRead>(reader: R) -> PipelineResult<IngestReport<FluxObservation>> {
    let mut report = IngestReport::default();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_flux_line(&line) {
            Ok(row) => report.rows.push(row),
            Err(reason) => report.skip(idx + 1, line, reason),
        }
    }

    log::info!(
        "Parsed {} flux observations ({} lines skipped)",
        report.rows.len(),
        report.skipped.len()
    );
    Ok(report)
}

/// Column layout of the daily total sunspot number file.
#[derive(Debug, Deserialize)]
struct SunspotCsvRow {
    year: i32,
    month: u32,
    day: u32,
    decimal_year: f64,
    sunspot_number: f64,
    std_dev: f64,
    observations: i32,
    definitive: u8,
}

/// Parse the `;`-separated daily sunspot series
/// (`Year;Month;Day;DecimalDate;Sunspots;StdDev;NumObs;Definitive`).
/// Days with the `-1` missing marker are skipped.
pub fn parse_sunspot_csv<R: BufRead>(reader: R) -> PipelineResult<IngestReport<SunspotObservation>> {
    let mut report = IngestReport::default();
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    for result in csv_reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if let csv::ErrorKind::Io(_) = e.kind() {
                    return Err(crate::error::PipelineError::Ingestion(e.to_string()));
                }
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                report.skip(line, String::new(), e.to_string());
                continue;
            }
        };
        let line_number = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let content = record.iter().collect::<Vec<_>>().join(";");

        let row: SunspotCsvRow = match record.deserialize(None) {
            Ok(row) => row,
            Err(e) => {
                report.skip(line_number, content, e.to_string());
                continue;
            }
        };

        if row.sunspot_number < 0.0 {
            report.skip(line_number, content, "missing sunspot number");
            continue;
        }

        let Some(date) = NaiveDate::from_ymd_opt(row.year, row.month, row.day) else {
            report.skip(line_number, content, "invalid calendar date");
            continue;
        };

        report.rows.push(SunspotObservation {
            date,
            decimal_year: row.decimal_year,
            sunspot_number: row.sunspot_number,
            std_dev: (row.std_dev >= 0.0).then_some(row.std_dev),
            observations: (row.observations >= 0).then_some(row.observations),
            definitive: row.definitive == 1,
        });
    }

    log::info!(
        "Parsed {} sunspot observations ({} lines skipped)",
        report.rows.len(),
        report.skipped.len()
    );
    Ok(report)
}
