//! Instrument PV label translation.

use std::collections::HashMap;

/// Default display labels for the instrument run-information PVs.
pub const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("RUNSTATE", "Run Status"),
    ("RUNNUMBER", "Run Number"),
    ("_RBNUMBER", "RB Number"),
    ("_USERNAME", "User(s)"),
    ("TITLE", "Title"),
    ("TITLEDISP", "Show Title"),
    ("STARTTIME", "Start Time"),
    ("RUNDURATION", "Total Run Time"),
    ("RUNDURATION_PD", "Period Run Time"),
    ("GOODFRAMES", "Good Frames (Total)"),
    ("GOODFRAMES_PD", "Good Frames (Period)"),
    ("RAWFRAMES", "Raw Frames (Total)"),
    ("RAWFRAMES_PD", "Raw Frames (Period)"),
    ("PERIOD", "Current Period"),
    ("NUMPERIODS", "Number of Periods"),
    ("PERIODSEQ", "Period Sequence"),
    ("BEAMCURRENT", "Beam Current"),
    ("TOTALUAMPS", "Total Uamps"),
    ("COUNTRATE", "Count Rate"),
    ("DAEMEMORYUSED", "DAE Memory Used"),
    ("TOTALCOUNTS", "Total DAE Counts"),
    ("DAETIMINGSOURCE", "DAE Timing Source"),
    ("MONITORCOUNTS", "Monitor Counts"),
    ("MONITORSPECTRUM", "Monitor Spectrum"),
    ("MONITORFROM", "Monitor From"),
    ("MONITORTO", "Monitor To"),
    ("NUMTIMECHANNELS", "Number of Time Channels"),
    ("NUMSPECTRA", "Number of Spectra"),
];

/// Immutable PV key → label mapping.
///
/// Keys without an entry display under their raw key.
#[derive(Debug, Clone)]
pub struct LabelTable {
    labels: HashMap<String, String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        DEFAULT_LABELS.iter().copied().collect()
    }
}

impl LabelTable {
    /// Table with no translations; every key displays as itself.
    pub fn empty() -> Self {
        Self {
            labels: HashMap::new(),
        }
    }

    /// Returns a copy of this table with `overrides` added or replacing existing entries.
    pub fn with_overrides<K, V>(mut self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, label) in overrides {
            self.labels.insert(key.into(), label.into());
        }
        self
    }

    /// Label for `key`, falling back to the key itself.
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.labels.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LabelTable::empty().with_overrides(iter)
    }
}

/// Parses a `KEY=Label` override as given on the command line.
pub fn parse_label_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, label)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), label.trim().to_string()))
        }
        _ => Err(format!("expected KEY=Label, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_translates_known_keys() {
        let table = LabelTable::default();
        assert_eq!(table.label_for("TITLE"), "Title");
        assert_eq!(table.label_for("_USERNAME"), "User(s)");
        assert_eq!(table.label_for("NUMSPECTRA"), "Number of Spectra");
        assert_eq!(table.len(), DEFAULT_LABELS.len());
    }

    #[test]
    fn test_unknown_key_falls_back_to_raw_key() {
        let table = LabelTable::default();
        assert_eq!(table.label_for("SHUTTER"), "SHUTTER");
        assert!(!table.contains("SHUTTER"));
    }

    #[test]
    fn test_overrides_replace_and_extend() {
        let table =
            LabelTable::default().with_overrides([("TITLE", "Experiment"), ("SHUTTER", "Shutter")]);
        assert_eq!(table.label_for("TITLE"), "Experiment");
        assert_eq!(table.label_for("SHUTTER"), "Shutter");
        assert_eq!(table.label_for("RUNSTATE"), "Run Status");
    }

    #[test]
    fn test_parse_label_override() {
        assert_eq!(
            parse_label_override("SHUTTER=Shutter State").unwrap(),
            ("SHUTTER".to_string(), "Shutter State".to_string())
        );
        assert!(parse_label_override("no-equals").is_err());
        assert!(parse_label_override("=Label").is_err());
    }
}
