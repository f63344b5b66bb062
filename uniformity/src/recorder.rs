//! Trial rows, the append-only backup file and the CSV rewrite.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::condition::{BlockType, StimulusFamily, TrialCondition};
use crate::error::RecorderError;

pub const FIELDS: [&str; 17] = [
    "Sub_ID",
    "Block_n",
    "Block_type",
    "Trial_n",
    "Trial_Rep_n",
    "Rep_n",
    "Trial_index",
    "Stimuli",
    "Condition",
    "Exp",
    "Catch_UI",
    "Catch_latency",
    "Cent_size",
    "Cent_opacity",
    "RT",
    "Reproduction",
    "Uniformity",
];

const MISSING: &str = "NaN";

#[derive(Debug, Clone, PartialEq)]
pub struct TrialRecord {
    pub participant: String,
    /// 1-based; `None` for practice sets.
    pub block_number: Option<u32>,
    pub block_type: BlockType,
    /// Executed trials so far in the session, this one included.
    pub trial_number: u32,
    /// 1-based position within the repetition.
    pub trial_in_repetition: u32,
    /// 1-based.
    pub repetition: u32,
    /// 1-based index into the trial list.
    pub trial_index: u32,
    pub condition: TrialCondition,
    pub latency_catch: bool,
    pub reference_size: Option<f32>,
    pub reference_opacity: Option<f32>,
    pub reaction_time: Option<f64>,
    pub reproduction: Option<f32>,
    pub uniformity_seen: bool,
}

impl TrialRecord {
    pub fn family(&self) -> StimulusFamily {
        self.condition.family()
    }

    pub fn fields(&self) -> [String; 17] {
        [
            self.participant.clone(),
            opt(self.block_number),
            self.block_type.label().to_owned(),
            self.trial_number.to_string(),
            self.trial_in_repetition.to_string(),
            self.repetition.to_string(),
            self.trial_index.to_string(),
            self.family().label().to_owned(),
            self.condition.tag_string(),
            flag(self.condition.is_experimental()),
            flag(self.condition.is_catch()),
            flag(self.latency_catch),
            opt_num(self.reference_size.map(f64::from)),
            opt_num(self.reference_opacity.map(f64::from)),
            opt_num(self.reaction_time),
            opt_num(self.reproduction.map(f64::from)),
            flag(self.uniformity_seen),
        ]
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

fn opt(value: Option<u32>) -> String {
    value.map_or_else(|| MISSING.to_owned(), |v| v.to_string())
}

fn opt_num(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_owned(), format_number)
}

/// Four decimals at most, without trailing zeros.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_owned();
    }
    let text = format!("{value:.4}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_owned(),
        other => other.to_owned(),
    }
}

pub fn quote(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

pub fn csv_line<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&quote(field.as_ref()));
    }
    line
}

/// `<participant>_<experiment>_<date>`, shared by the CSV and its backup.
pub fn file_stem(participant: &str, experiment: &str, date: &str) -> String {
    format!("{participant}_{experiment}_{date}")
}

/// Accumulates trial rows for the session.
///
/// Every row goes to the backup file as soon as it is recorded; the CSV holds the whole
/// table and is rewritten on [`DataRecorder::flush_csv`].
#[derive(Debug)]
pub struct DataRecorder {
    rows: Vec<TrialRecord>,
    csv_path: PathBuf,
    backup_path: PathBuf,
    backup: File,
}

impl DataRecorder {
    pub fn create(dir: &Path, stem: &str) -> Result<Self, RecorderError> {
        fs::create_dir_all(dir).map_err(|source| RecorderError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let csv_path = dir.join(format!("{stem}.csv"));
        let backup_path = dir.join(format!("{stem}.csv_backUp.txt"));
        let backup = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&backup_path)
            .map_err(|source| RecorderError::OpenBackup {
                path: backup_path.clone(),
                source,
            })?;
        let mut recorder = Self {
            rows: Vec::new(),
            csv_path,
            backup_path,
            backup,
        };
        recorder.append_backup_line(&csv_line(&FIELDS))?;
        Ok(recorder)
    }

    pub fn rows(&self) -> &[TrialRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn record(&mut self, record: TrialRecord) -> Result<(), RecorderError> {
        let line = csv_line(&record.fields());
        self.rows.push(record);
        self.append_backup_line(&line)
    }

    fn append_backup_line(&mut self, line: &str) -> Result<(), RecorderError> {
        writeln!(self.backup, "{line}")
            .and_then(|()| self.backup.flush())
            .map_err(|source| RecorderError::AppendBackup {
                path: self.backup_path.clone(),
                source,
            })
    }

    pub fn to_csv(&self) -> String {
        let mut out = csv_line(&FIELDS);
        out.push('\n');
        for row in &self.rows {
            out.push_str(&csv_line(&row.fields()));
            out.push('\n');
        }
        out
    }

    pub fn flush_csv(&self) -> Result<(), RecorderError> {
        fs::write(&self.csv_path, self.to_csv()).map_err(|source| RecorderError::WriteCsv {
            path: self.csv_path.clone(),
            source,
        })?;
        debug!(rows = self.rows.len(), path = %self.csv_path.display(), "csv written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{CentreChange, ColourPattern, TrialKind};

    fn record() -> TrialRecord {
        TrialRecord {
            participant: "p01".into(),
            block_number: None,
            block_type: BlockType::BlackOut,
            trial_number: 3,
            trial_in_repetition: 1,
            repetition: 2,
            trial_index: 1,
            condition: TrialCondition::Colour {
                kind: TrialKind::Experimental,
                pattern: ColourPattern::GreenOnRed,
                change: CentreChange::BlackOut,
            },
            latency_catch: true,
            reference_size: None,
            reference_opacity: Some(1.0),
            reaction_time: None,
            reproduction: Some(0.62),
            uniformity_seen: true,
        }
    }

    #[test]
    fn fields_line_up_with_header() {
        let fields = record().fields();
        let row: Vec<(&str, &str)> = FIELDS
            .iter()
            .copied()
            .zip(fields.iter().map(String::as_str))
            .collect();
        assert_eq!(
            row,
            vec![
                ("Sub_ID", "p01"),
                ("Block_n", "NaN"),
                ("Block_type", "blackOut"),
                ("Trial_n", "3"),
                ("Trial_Rep_n", "1"),
                ("Rep_n", "2"),
                ("Trial_index", "1"),
                ("Stimuli", "Colour"),
                ("Condition", "Exp|010|blackOut"),
                ("Exp", "1"),
                ("Catch_UI", "0"),
                ("Catch_latency", "1"),
                ("Cent_size", "NaN"),
                ("Cent_opacity", "1"),
                ("RT", "NaN"),
                ("Reproduction", "0.62"),
                ("Uniformity", "1"),
            ]
        );
    }

    #[test]
    fn numbers_are_trimmed_to_four_decimals() {
        assert_eq!(format_number(0.07700001), "0.077");
        assert_eq!(format_number(0.41234567), "0.4123");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn free_text_is_quoted() {
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_line(&["x", "y,z"]), "x,\"y,z\"");
    }

    #[test]
    fn backup_gets_header_and_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = DataRecorder::create(dir.path(), "p01_test_date").unwrap();
        recorder.record(record()).unwrap();
        recorder.record(record()).unwrap();

        let backup = fs::read_to_string(recorder.backup_path()).unwrap();
        let lines: Vec<&str> = backup.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Sub_ID,Block_n,"));

        assert!(!recorder.csv_path().exists());
        recorder.flush_csv().unwrap();
        let csv = fs::read_to_string(recorder.csv_path()).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert_eq!(csv.lines().nth(1), Some(lines[1]));
    }
}
