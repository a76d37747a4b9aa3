//! Delimited time series loader.
//!
//! Reads a (time, depth) series from a text file with one header row and a
//! single-character separator:
//!
//! ```text
//! Time	Depth
//! 2020-03-04 00:00:00	1.02
//! 2020-03-04 01:00:00	1.31
//! 2020-03-04 02:00:00
//! ```
//!
//! Empty or `NaN` depth fields are kept as missing samples.

use std::fmt;
use std::fs::{self, File};
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::analysis::{ObservationSample, ObservationSeries};
use crate::error::{Result, TideError};

/// Field separator of the input file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Separator {
    #[default]
    Tab,
    Comma,
    Space,
    Semicolon,
}

impl Separator {
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Tab => b'\t',
            Self::Comma => b',',
            Self::Space => b' ',
            Self::Semicolon => b';',
        }
    }

    pub fn as_char(&self) -> char {
        self.as_byte() as char
    }
}

impl FromStr for Separator {
    type Err = TideError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "\t" | "\\t" => return Ok(Self::Tab),
            "," => return Ok(Self::Comma),
            " " => return Ok(Self::Space),
            ";" => return Ok(Self::Semicolon),
            _ => {}
        }
        match s.trim().to_lowercase().as_str() {
            "tab" => Ok(Self::Tab),
            "comma" => Ok(Self::Comma),
            "space" => Ok(Self::Space),
            "semicolon" => Ok(Self::Semicolon),
            _ => Err(TideError::configuration(
                "separator",
                format!("unsupported separator '{s}', expected tab, comma, space or semicolon"),
            )),
        }
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tab => "tab",
            Self::Comma => "comma",
            Self::Space => "space",
            Self::Semicolon => "semicolon",
        };
        write!(f, "{name}")
    }
}

/// How to read an observation file.
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderOptions {
    /// Header name of the timestamp column
    pub time_column: String,
    /// Header name of the depth column
    pub depth_column: String,
    pub separator: Separator,
    /// Read ambiguous numeric dates as day/month rather than month/day
    pub day_first: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            time_column: "Time".to_string(),
            depth_column: "Depth".to_string(),
            separator: Separator::Tab,
            day_first: false,
        }
    }
}

impl LoaderOptions {
    pub fn new(time_column: impl Into<String>, depth_column: impl Into<String>) -> Self {
        Self {
            time_column: time_column.into(),
            depth_column: depth_column.into(),
            ..Default::default()
        }
    }

    pub fn with_separator(mut self, separator: Separator) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_day_first(mut self, day_first: bool) -> Self {
        self.day_first = day_first;
        self
    }
}

/// Load an observation series from a delimited text file.
///
/// # Errors
///
/// - `Io` if the file cannot be opened or read
/// - `DataFormat` for a missing column, a malformed row, an unparsable
///   timestamp or depth, or timestamps that are not strictly increasing
pub fn load_observations(path: &Path, options: &LoaderOptions) -> Result<ObservationSeries> {
    let file = File::open(path).map_err(|e| TideError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.separator.as_byte())
        .has_headers(true)
        .quoting(false)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .clone();
    debug!(path = %path.display(), columns = ?headers, "read header");

    let time_idx = column_index(path, &headers, &options.time_column)?;
    let depth_idx = column_index(path, &headers, &options.depth_column)?;

    let mut samples: Vec<ObservationSample> = Vec::new();
    let mut swapped_rows = 0usize;

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| csv_error(path, e))?;
        // header is line 1
        let row = record.position().map_or(i + 2, |p| p.line() as usize);

        let time_text = record.get(time_idx).unwrap_or("").trim();
        let (time, swapped) = parse_timestamp_ordered(time_text, options.day_first)
            .ok_or_else(|| {
                TideError::bad_field(
                    path,
                    row,
                    &options.time_column,
                    format!("cannot parse '{time_text}' as a date/time"),
                )
            })?;
        if swapped {
            if swapped_rows == 0 {
                warn!(
                    row,
                    value = time_text,
                    day_first = options.day_first,
                    "date is impossible in the requested day/month order, using the other order"
                );
            }
            swapped_rows += 1;
        }

        let depth_text = record.get(depth_idx).unwrap_or("").trim();
        let depth = parse_depth(depth_text).ok_or_else(|| {
            TideError::bad_field(
                path,
                row,
                &options.depth_column,
                format!("'{depth_text}' is not a number"),
            )
        })?;

        if let Some(prev) = samples.last() {
            if time <= prev.time {
                return Err(TideError::bad_field(
                    path,
                    row,
                    &options.time_column,
                    format!("timestamp {time} does not follow {}", prev.time),
                ));
            }
        }

        samples.push(ObservationSample { time, depth });
    }

    if swapped_rows > 1 {
        warn!(rows = swapped_rows, "day/month order swapped on several rows");
    }

    let mut series = ObservationSeries::from_samples(samples)?;
    if let Some(stem) = path.file_stem() {
        series = series.with_name(stem.to_string_lossy());
    }

    info!(
        path = %path.display(),
        samples = series.len(),
        missing = series.len() - series.valid_count(),
        "loaded observations"
    );

    Ok(series)
}

/// Parse a timestamp, using `day_first` for numeric day/month dates.
pub fn parse_timestamp(text: &str, day_first: bool) -> Option<NaiveDateTime> {
    parse_timestamp_ordered(text, day_first).map(|(t, _)| t)
}

/// Render a series as delimited text with a header row.
///
/// Timestamps are written `YYYY-MM-DD HH:MM:SS` (with a `T` instead of the
/// space when the separator is a space), missing depths as `NaN`.
pub fn format_observations(
    series: &ObservationSeries,
    separator: Separator,
    time_column: &str,
    depth_column: &str,
) -> String {
    let sep = separator.as_char();
    let time_format = match separator {
        Separator::Space => "%Y-%m-%dT%H:%M:%S%.f",
        _ => "%Y-%m-%d %H:%M:%S%.f",
    };

    let mut out = format!("{time_column}{sep}{depth_column}\n");
    for s in series.samples() {
        out.push_str(&format!("{}{sep}{}\n", s.time.format(time_format), s.depth));
    }
    out
}

/// Write a series to a delimited text file.
pub fn write_observations(
    path: &Path,
    series: &ObservationSeries,
    options: &LoaderOptions,
) -> Result<()> {
    let text = format_observations(
        series,
        options.separator,
        &options.time_column,
        &options.depth_column,
    );
    fs::write(path, text).map_err(|e| TideError::io(path, e))
}

fn column_index(path: &Path, headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| TideError::DataFormat {
            path: path.to_path_buf(),
            row: Some(1),
            column: Some(name.to_string()),
            message: format!(
                "column not found (available: {})",
                headers.iter().collect::<Vec<_>>().join(", ")
            ),
        })
}

fn csv_error(path: &Path, err: csv::Error) -> TideError {
    let row = err.position().map(|p| p.line() as usize);
    match err.into_kind() {
        csv::ErrorKind::Io(e) => TideError::io(path, e),
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => TideError::DataFormat {
            path: path.to_path_buf(),
            row,
            column: None,
            message: format!("expected {expected_len} fields, found {len}"),
        },
        other => TideError::DataFormat {
            path: path.to_path_buf(),
            row,
            column: None,
            message: format!("{other:?}"),
        },
    }
}

fn parse_depth(text: &str) -> Option<f64> {
    if text.is_empty() || text.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    text.parse::<f64>().ok()
}

/// Parse a timestamp; the flag is set when the day/month order had to be
/// swapped to get a valid date.
fn parse_timestamp_ordered(text: &str, day_first: bool) -> Option<(NaiveDateTime, bool)> {
    let text = text.trim().trim_end_matches('Z');
    if text.is_empty() {
        return None;
    }

    let (date_part, time_part) = match text.find(['T', ' ']) {
        Some(i) => (&text[..i], text[i + 1..].trim()),
        None => (text, ""),
    };

    let time = if time_part.is_empty() {
        NaiveTime::MIN
    } else {
        parse_time_of_day(time_part)?
    };

    let fields: Vec<&str> = date_part.split(['/', '-', '.']).collect();
    let [first, second, third] = fields[..] else {
        return None;
    };
    let numbers = |s: &str| -> Option<u32> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            None
        } else {
            s.parse().ok()
        }
    };

    // year first: unambiguous
    if first.len() == 4 {
        let year = numbers(first)? as i32;
        let date = NaiveDate::from_ymd_opt(year, numbers(second)?, numbers(third)?)?;
        return Some((date.and_time(time), false));
    }

    let (a, b) = (numbers(first)?, numbers(second)?);
    let year = match numbers(third)? {
        y if third.len() <= 2 => expand_two_digit_year(y),
        y => y as i32,
    };
    let (day, month) = if day_first { (a, b) } else { (b, a) };

    if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        return Some((date.and_time(time), false));
    }
    NaiveDate::from_ymd_opt(year, day, month).map(|date| (date.and_time(time), true))
}

/// Two-digit years below this pivot are 20xx, the rest 19xx.
const TWO_DIGIT_YEAR_PIVOT: u32 = 69;

fn expand_two_digit_year(y: u32) -> i32 {
    if y < TWO_DIGIT_YEAR_PIVOT {
        2000 + y as i32
    } else {
        1900 + y as i32
    }
}

fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_day_first_ordering() {
        let dmy = parse_timestamp("03/04/2020", true).unwrap();
        assert_eq!((dmy.day(), dmy.month(), dmy.year()), (3, 4, 2020));

        let mdy = parse_timestamp("03/04/2020", false).unwrap();
        assert_eq!((mdy.day(), mdy.month(), mdy.year()), (4, 3, 2020));
    }

    #[test]
    fn test_impossible_order_falls_back() {
        let (t, swapped) = parse_timestamp_ordered("13/04/2020 06:30", false).unwrap();
        assert!(swapped);
        assert_eq!((t.day(), t.month(), t.hour(), t.minute()), (13, 4, 6, 30));

        let (_, swapped) = parse_timestamp_ordered("12/04/2020", false).unwrap();
        assert!(!swapped);
        assert!(parse_timestamp("32/13/2020", true).is_none());
    }

    #[test]
    fn test_two_digit_years() {
        let t = parse_timestamp("03/04/99", true).unwrap();
        assert_eq!((t.day(), t.month(), t.year()), (3, 4, 1999));
        let t = parse_timestamp("03/04/20", false).unwrap();
        assert_eq!((t.day(), t.month(), t.year()), (4, 3, 2020));
        assert_eq!(parse_timestamp("01.02.68", true).unwrap().year(), 2068);
        assert_eq!(parse_timestamp("01.02.69", true).unwrap().year(), 1969);
    }

    #[test]
    fn test_iso_formats() {
        let t = parse_timestamp("2020-03-04 05:06:07", true).unwrap();
        assert_eq!((t.month(), t.day(), t.second()), (3, 4, 7));
        let t = parse_timestamp("2020-03-04T05:06:07.250Z", false).unwrap();
        assert_eq!(t.nanosecond(), 250_000_000);
        let t = parse_timestamp("2020/03/04", false).unwrap();
        assert_eq!((t.month(), t.day(), t.hour()), (3, 4, 0));
        assert!(parse_timestamp("yesterday", false).is_none());
        assert!(parse_timestamp("", false).is_none());
    }

    #[test]
    fn test_separator_from_str() {
        assert_eq!("tab".parse::<Separator>().unwrap(), Separator::Tab);
        assert_eq!(";".parse::<Separator>().unwrap(), Separator::Semicolon);
        assert_eq!("Comma".parse::<Separator>().unwrap(), Separator::Comma);
        assert_eq!(" ".parse::<Separator>().unwrap(), Separator::Space);
        let err = "pipe".parse::<Separator>().unwrap_err();
        assert!(matches!(err, TideError::Configuration { ref field, .. } if field == "separator"));
    }

    #[test]
    fn test_load_with_missing_values() {
        let f = write_file(concat!(
            "Time\tDepth\n",
            "2020-01-01 00:00:00\t1.5\n",
            "2020-01-01 01:00:00\t\n",
            "2020-01-01 02:00:00\tNaN\n",
            "2020-01-01 03:00:00\t1.7\n",
        ));
        let series = load_observations(f.path(), &LoaderOptions::default()).unwrap();
        assert_eq!(series.len(), 4);
        assert_eq!(series.valid_count(), 2);
        assert!(series.depths()[1].is_nan());
    }

    #[test]
    fn test_missing_column() {
        let f = write_file("Date,Level\n2020-01-01,1.0\n");
        let options = LoaderOptions::new("Time", "Level").with_separator(Separator::Comma);
        let err = load_observations(f.path(), &options).unwrap_err();
        match err {
            TideError::DataFormat { column, .. } => assert_eq!(column.as_deref(), Some("Time")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_depth_reports_row() {
        let f = write_file("Time;Depth\n2020-01-01 00:00;1.0\n2020-01-01 01:00;high\n");
        let options = LoaderOptions::default().with_separator(Separator::Semicolon);
        let err = load_observations(f.path(), &options).unwrap_err();
        match err {
            TideError::DataFormat { row, column, .. } => {
                assert_eq!(row, Some(3));
                assert_eq!(column.as_deref(), Some("Depth"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_bad_time_reports_row_and_column() {
        let f = write_file("Time\tDepth\n2020-01-01 00:00\t1\nnot-a-date\t2\n");
        let err = load_observations(f.path(), &LoaderOptions::default()).unwrap_err();
        match err {
            TideError::DataFormat { row, column, .. } => {
                assert_eq!(row, Some(3));
                assert_eq!(column.as_deref(), Some("Time"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_wrong_field_count() {
        let f = write_file("Time,Depth\n2020-01-01 00:00,1.0,9\n");
        let options = LoaderOptions::default().with_separator(Separator::Comma);
        let err = load_observations(f.path(), &options).unwrap_err();
        assert!(matches!(err, TideError::DataFormat { .. }));
    }

    #[test]
    fn test_non_increasing_times() {
        let f = write_file("Time\tDepth\n2020-01-01 01:00\t1.0\n2020-01-01 00:00\t1.1\n");
        let err = load_observations(f.path(), &LoaderOptions::default()).unwrap_err();
        assert!(matches!(err, TideError::DataFormat { row: Some(3), .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_observations(Path::new("/nonexistent/obs.txt"), &LoaderOptions::default())
            .unwrap_err();
        assert!(matches!(err, TideError::Io { .. }));
    }

    #[test]
    fn test_round_trip_all_separators() {
        let f = write_file(concat!(
            "Time\tDepth\n",
            "2021-06-01 00:00:00\t0.125\n",
            "2021-06-01 00:30:00\t-1.0000001\n",
            "2021-06-01 01:00:00.500\t3\n",
        ));
        let original = load_observations(f.path(), &LoaderOptions::default()).unwrap();

        for sep in [Separator::Tab, Separator::Comma, Separator::Space, Separator::Semicolon] {
            let options = LoaderOptions::new("t", "h").with_separator(sep);
            let out = NamedTempFile::new().unwrap();
            write_observations(out.path(), &original, &options).unwrap();
            let back = load_observations(out.path(), &options).unwrap();
            assert_eq!(back.times(), original.times(), "separator {sep}");
            assert_eq!(back.depths(), original.depths(), "separator {sep}");
        }
    }

    #[test]
    fn test_series_named_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bergen.txt");
        fs::write(&path, "Time\tDepth\n2020-01-01 00:00\t1\n").unwrap();
        let series = load_observations(&path, &LoaderOptions::default()).unwrap();
        assert_eq!(series.name.as_deref(), Some("bergen"));
    }
}
