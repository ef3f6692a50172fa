//! Reader for `write_power_profile` dumps.
//!
//! A dump is a block of `#` header lines followed by a whitespace-separated
//! matrix whose first column is the sample time. The header declares the
//! column identifiers (`-ykeylabel`) and the time and power units
//! (`-xlabel`, `-ylabel`). Frame boundaries come from the companion
//! `.frames.start_times.txt` and `.frames.end_times.txt` files written by the
//! frame-info dump.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use crate::config::Segmentation;
use crate::error::PowerError;
use crate::paths;
use crate::units::{PowerValue, TimeValue};
use crate::Result;

/// Identifies one column of the profile matrix.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct ColumnKey {
    pub hier: String,
    pub power_category: String,
    pub power_type: String,
}

impl ColumnKey {
    const DEFAULT_CATEGORY: &'static str = "total";

    /// Parses `hier:category:type` or `hier:type`.
    pub fn parse(id: &str) -> Self {
        let parts: Vec<&str> = id.split(':').collect();
        let power_category = if parts.len() == 3 {
            parts[1].replace("__cat_", "")
        } else {
            Self::DEFAULT_CATEGORY.to_string()
        };
        Self {
            hier: parts[0].to_string(),
            power_category,
            power_type: parts[parts.len() - 1].to_string(),
        }
    }
}

/// Row label: sample time and the frame it summarizes, in nanoseconds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct FrameIndex {
    pub time_ns: i64,
    pub start_ns: i64,
    pub end_ns: i64,
}

/// Profile matrix in canonical units: one row per frame, powers in mW.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesFrame {
    pub index: Vec<FrameIndex>,
    pub columns: Vec<ColumnKey>,
    pub values: Vec<Vec<f64>>,
}

impl TimeSeriesFrame {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().map(move |row| row[idx])
    }
}

/// Where frame boundaries come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBounds {
    /// Boundaries listed in the companion timing files.
    Explicit { start_ns: Vec<i64>, end_ns: Vec<i64> },
    /// Frames of a known width centred on each sample.
    Interval { width_ns: f64 },
    /// Boundaries halfway between neighbouring samples, with the first frame
    /// starting at zero and the last ending at its own sample.
    ///
    /// This is an approximation. Toggle- and count-based frames have no fixed
    /// width, and the true toggle times are not recoverable from the profile.
    Midpoint,
}

impl FrameBounds {
    /// Frames implied by a segmentation setting.
    ///
    /// An interval list gives the boundaries directly: `n` times bound `n - 1`
    /// consecutive frames.
    pub fn from_segmentation(seg: &Segmentation) -> Self {
        match seg {
            Segmentation::IntervalSize(width) => Self::Interval {
                width_ns: width.ns(),
            },
            Segmentation::IntervalList(list) => {
                let ns: Vec<i64> = list.iter().map(|t| t.ns().round() as i64).collect();
                let frames = ns.len().saturating_sub(1);
                Self::Explicit {
                    start_ns: ns[..frames].to_vec(),
                    end_ns: ns.iter().skip(1).copied().collect(),
                }
            }
            Segmentation::Toggles { .. } | Segmentation::FrameCount(_) => Self::Midpoint,
        }
    }

    /// Labels each sample time with its frame.
    pub fn index(&self, time_ns: &[i64]) -> std::result::Result<Vec<FrameIndex>, PowerError> {
        match self {
            Self::Explicit { start_ns, end_ns } => {
                if start_ns.len() != time_ns.len() || end_ns.len() != time_ns.len() {
                    return Err(PowerError::FrameMismatch {
                        rows: time_ns.len(),
                        frames: start_ns.len().min(end_ns.len()),
                    });
                }
                Ok(time_ns
                    .iter()
                    .zip(start_ns.iter().zip(end_ns.iter()))
                    .map(|(&time_ns, (&start_ns, &end_ns))| FrameIndex {
                        time_ns,
                        start_ns,
                        end_ns,
                    })
                    .collect())
            }
            Self::Interval { width_ns } => {
                let half = (width_ns / 2.0).floor() as i64;
                Ok(time_ns
                    .iter()
                    .map(|&t| FrameIndex {
                        time_ns: t,
                        start_ns: t - half,
                        end_ns: t + half,
                    })
                    .collect())
            }
            Self::Midpoint => {
                let n = time_ns.len();
                Ok((0..n)
                    .map(|i| {
                        let t = time_ns[i];
                        FrameIndex {
                            time_ns: t,
                            start_ns: if i == 0 {
                                0
                            } else {
                                (time_ns[i - 1] + t).div_euclid(2)
                            },
                            end_ns: if i + 1 == n {
                                t
                            } else {
                                (t + time_ns[i + 1]).div_euclid(2)
                            },
                        }
                    })
                    .collect())
            }
        }
    }
}

struct Header {
    columns: Vec<ColumnKey>,
    time_unit: String,
    power_unit: String,
}

/// Contents of the first `(...)` or `[...]` group in a header field.
fn bracketed(field: &str) -> Option<&str> {
    let open = field.find(&['(', '['][..])? + 1;
    let close = open + field[open..].find(&[')', ']'][..])?;
    Some(field[open..close].trim())
}

fn parse_header(lines: &[&str]) -> std::result::Result<Header, PowerError> {
    let mut columns = Vec::new();
    let mut xlabel = None;
    let mut ylabel = None;

    for (i, line) in lines.iter().enumerate() {
        let fields = line
            .trim_start_matches('#')
            .split(" -")
            .map(|f| f.trim().trim_start_matches('-'));
        for field in fields {
            if let Some(ids) = field.strip_prefix("ykeylabel ") {
                columns.extend(ids.split_whitespace().map(ColumnKey::parse));
            } else if field.starts_with("xlabel") {
                xlabel.get_or_insert((i + 1, field));
            } else if field.starts_with("ylabel") {
                ylabel.get_or_insert((i + 1, field));
            }
        }
    }

    // A missing label is reported against the last header line.
    let unit = |label: Option<(usize, &str)>, name: &str| -> std::result::Result<String, PowerError> {
        let (line, label) = label.ok_or_else(|| {
            PowerError::parse(lines.len(), format!("profile header has no {name}"))
        })?;
        bracketed(label)
            .map(str::to_string)
            .ok_or_else(|| PowerError::parse(line, format!("no unit in {name} `{label}`")))
    };

    Ok(Header {
        columns,
        time_unit: unit(xlabel, "xlabel")?,
        power_unit: unit(ylabel, "ylabel")?,
    })
}

/// Profile values before frame boundaries are attached.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProfileData {
    pub columns: Vec<ColumnKey>,
    pub time_ns: Vec<i64>,
    pub power: Vec<Vec<f64>>,
}

impl ProfileData {
    pub(crate) fn into_frame(self, index: Vec<FrameIndex>) -> TimeSeriesFrame {
        TimeSeriesFrame {
            index,
            columns: self.columns,
            values: self.power,
        }
    }
}

/// Reads the matrix, rescaled to ns and mW.
///
/// Returns `Ok(None)` when the file has no header or nothing follows it.
pub(crate) fn parse_profile_data(
    lines: &[&str],
) -> std::result::Result<Option<ProfileData>, PowerError> {
    let header_len = lines.iter().take_while(|l| l.starts_with('#')).count();
    if header_len == 0 || header_len == lines.len() {
        return Ok(None);
    }
    let header = parse_header(&lines[..header_len])?;

    let time_scale = TimeValue::from_ns(1.0).value_in_units(&header.time_unit)?;
    let power_scale = PowerValue::from_mw(1.0).value_in_units(&header.power_unit)?;

    let width = header.columns.len() + 1;
    let mut time_ns = Vec::new();
    let mut power = Vec::new();

    for (i, line) in lines.iter().enumerate().skip(header_len) {
        if line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != width {
            continue;
        }

        let value = |tok: &str| {
            tok.parse::<f64>()
                .map_err(|_| PowerError::parse(i + 1, format!("expected a number, found `{tok}`")))
        };
        time_ns.push((value(tokens[0])? / time_scale).round() as i64);
        power.push(
            tokens[1..]
                .iter()
                .map(|tok| value(tok).map(|p| p / power_scale))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        );
    }

    Ok(Some(ProfileData {
        columns: header.columns,
        time_ns,
        power,
    }))
}

/// Parses profile text with caller-provided frame boundaries.
pub fn parse_profile_text(
    lines: &[&str],
    bounds: &FrameBounds,
) -> std::result::Result<Option<TimeSeriesFrame>, PowerError> {
    match parse_profile_data(lines)? {
        Some(data) => {
            let index = bounds.index(&data.time_ns)?;
            Ok(Some(data.into_frame(index)))
        }
        None => Ok(None),
    }
}

/// Reads a frame timing file. Values are in seconds.
pub fn read_frame_times(path: impl AsRef<Path>) -> Result<Vec<i64>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading frame timing file {path:?}"))?;
    let times = text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .map(|s| TimeValue::from_seconds(s).ns().round() as i64)
                .with_context(|| format!("Invalid frame time `{tok}` in {path:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(times)
}

/// Frame boundaries for a profile, from its companion files if both exist.
pub fn frame_bounds(
    profile: impl AsRef<Path>,
    segmentation: Option<&Segmentation>,
) -> Result<FrameBounds> {
    let profile = profile.as_ref();
    let stem = paths::profile_stem(profile);
    let start = paths::frames_start_times(&stem);
    let end = paths::frames_end_times(&stem);

    if start.is_file() && end.is_file() {
        return Ok(FrameBounds::Explicit {
            start_ns: read_frame_times(start)?,
            end_ns: read_frame_times(end)?,
        });
    }

    match segmentation {
        Some(seg) => {
            log::debug!("No frame timing files for {profile:?}, reconstructing from {seg:?}");
            Ok(FrameBounds::from_segmentation(seg))
        }
        None => Err(PowerError::MissingFrames(profile.to_path_buf()).into()),
    }
}

pub fn parse_profile_file(
    path: impl AsRef<Path>,
    segmentation: Option<&Segmentation>,
) -> Result<Option<TimeSeriesFrame>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Error reading profile {path:?}"))?;
    let lines: Vec<&str> = text.lines().collect();

    let data = match parse_profile_data(&lines)? {
        Some(data) => data,
        None => {
            log::debug!("Profile {path:?} has no data");
            return Ok(None);
        }
    };
    let bounds = frame_bounds(path, segmentation)?;
    let index = bounds.index(&data.time_ns)?;
    Ok(Some(data.into_frame(index)))
}
