use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const FRAMES_START_SUFFIX: &str = ".frames.start_times.txt";
pub const FRAMES_END_SUFFIX: &str = ".frames.end_times.txt";
pub const FRAMES_DURATION_SUFFIX: &str = ".frames.duration.txt";

fn with_suffix(stem: impl AsRef<Path>, suffix: &str) -> PathBuf {
    let mut s = OsString::from(stem.as_ref().as_os_str());
    s.push(suffix);
    PathBuf::from(s)
}

pub fn out_power_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".power.rpt")
}

pub fn out_hier_power_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".hier.power.rpt")
}

pub fn out_activity_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".activity.rpt")
}

pub fn out_hier_activity_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".hier.activity.rpt")
}

pub fn out_ppa_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".ppa.rpt")
}

pub fn out_area_rpt(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".area.rpt")
}

pub fn out_profile_png(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".profile.png")
}

pub fn out_profile(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, ".profile")
}

/// The matrix file the tool writes next to a `write_power_profile` output.
pub fn profile_data(profile: impl AsRef<Path>) -> PathBuf {
    with_suffix(profile, ".data")
}

pub fn frames_start_times(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, FRAMES_START_SUFFIX)
}

pub fn frames_end_times(stem: impl AsRef<Path>) -> PathBuf {
    with_suffix(stem, FRAMES_END_SUFFIX)
}

/// Recovers the report stem from a profile path such as `<stem>.profile.data`.
pub fn profile_stem(profile: impl AsRef<Path>) -> PathBuf {
    let s = profile.as_ref().to_string_lossy();
    match s.rfind(".profile.") {
        Some(idx) => PathBuf::from(&s[..idx]),
        None => PathBuf::from(s.trim_end_matches(".profile")),
    }
}

/// Destination of a parsed export: `<dir>/parsed/<file name>.<ext>[.gz]`.
pub fn out_parsed(report: impl AsRef<Path>, ext: &str, compress: bool) -> PathBuf {
    let report = report.as_ref();
    let dir = report
        .parent()
        .map(|p| p.join("parsed"))
        .unwrap_or_else(|| PathBuf::from("parsed"));
    let mut name = report
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("report"));
    name.push(".");
    name.push(ext);
    if compress {
        name.push(".gz");
    }
    dir.join(name)
}
