use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::units::TimeValue;

/// Kinds of output a report request can ask the tool for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Report,
    Activity,
    Ppa,
    Area,
    Profile,
    PlotProfile,
    WriteProfile,
    All,
}

/// How a stimulus is divided into frames.
///
/// At most one is honored per request, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segmentation {
    IntervalSize(TimeValue),
    IntervalList(Vec<TimeValue>),
    Toggles {
        count: u64,
        signal: Option<String>,
    },
    FrameCount(u64),
}

/// One power-report request.
#[derive(Debug, Clone, Default, PartialEq, Builder, Serialize, Deserialize)]
#[builder(derive(Debug), default)]
pub struct ReportRequest {
    #[builder(setter(into))]
    pub waveform_path: PathBuf,
    #[builder(setter(into, strip_option))]
    pub inst: Option<String>,
    #[builder(setter(into, strip_option))]
    pub module: Option<String>,
    #[builder(setter(into, strip_option))]
    pub levels: Option<String>,
    #[builder(setter(strip_option))]
    pub start_time: Option<TimeValue>,
    #[builder(setter(strip_option))]
    pub end_time: Option<TimeValue>,
    #[builder(setter(strip_option))]
    pub interval_size: Option<TimeValue>,
    #[builder(setter(strip_option))]
    pub interval_list: Option<Vec<TimeValue>>,
    #[builder(setter(into, strip_option))]
    pub toggle_signal: Option<String>,
    #[builder(setter(strip_option))]
    pub num_toggles: Option<u64>,
    #[builder(setter(strip_option))]
    pub frame_count: Option<u64>,
    #[builder(setter(into, strip_option))]
    pub power_type: Option<String>,
    #[builder(setter(into, strip_option))]
    pub report_stem: Option<String>,
    #[builder(setter(into, strip_option))]
    pub output_formats: Option<Vec<OutputFormat>>,
    #[builder(setter(into, strip_option))]
    pub tcl_cmd: Option<String>,
    #[builder(setter(into, strip_option))]
    pub tcl_args: Option<String>,
}

impl ReportRequest {
    #[inline]
    pub fn builder() -> ReportRequestBuilder {
        ReportRequestBuilder::default()
    }

    /// The request generated for every design waveform or SAIF file.
    pub fn for_waveform(path: impl AsRef<Path>) -> Self {
        Self {
            waveform_path: path.as_ref().to_owned(),
            output_formats: Some(vec![OutputFormat::Report]),
            ..Default::default()
        }
    }

    /// Number of segmentation fields that are set.
    pub fn segmentation_count(&self) -> usize {
        [
            self.interval_size.is_some(),
            self.interval_list.is_some(),
            self.num_toggles.is_some(),
            self.frame_count.is_some(),
        ]
        .into_iter()
        .filter(|x| *x)
        .count()
    }

    /// The highest-priority segmentation field, if any.
    pub fn segmentation(&self) -> Option<Segmentation> {
        if let Some(size) = self.interval_size {
            Some(Segmentation::IntervalSize(size))
        } else if let Some(list) = &self.interval_list {
            Some(Segmentation::IntervalList(list.clone()))
        } else if let Some(count) = self.num_toggles {
            Some(Segmentation::Toggles {
                count,
                signal: self.toggle_signal.clone(),
            })
        } else {
            self.frame_count.map(Segmentation::FrameCount)
        }
    }

    /// Requested formats with the defaults applied.
    pub fn formats(&self) -> BTreeSet<OutputFormat> {
        match &self.output_formats {
            Some(formats) => formats.iter().copied().collect(),
            None if self.tcl_args.is_none() => BTreeSet::from([OutputFormat::Report]),
            None => BTreeSet::new(),
        }
    }

    /// The output basename, defaulting to the waveform's file name.
    pub fn stem(&self) -> String {
        match &self.report_stem {
            Some(stem) => stem.clone(),
            None => self
                .waveform_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}
