use serde::Serialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

const NAME_COLUMN: usize = 0;
const MEMBER_CODE_COLUMN: usize = 1;
const RANK_LABEL_COLUMN: usize = 2;
const REQUIRED_COLUMNS: usize = 3;

/// One member as recorded in the club roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub name: String,
    pub member_code: String,
    pub rank_label: String,
}

impl RosterEntry {
    pub fn new(
        name: impl Into<String>,
        member_code: impl Into<String>,
        rank_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            member_code: member_code.into(),
            rank_label: rank_label.into(),
        }
    }
}

/// Immutable, ordered snapshot of the roster for a single export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookup table by member code; duplicate codes resolve to the first entry.
    pub fn index(&self) -> RosterIndex<'_> {
        let mut by_code = HashMap::with_capacity(self.entries.len());
        for entry in &self.entries {
            by_code.entry(entry.member_code.as_str()).or_insert(entry);
        }
        RosterIndex { by_code }
    }
}

/// Exact, case-sensitive member code lookup over a [`Roster`].
#[derive(Debug)]
pub struct RosterIndex<'a> {
    by_code: HashMap<&'a str, &'a RosterEntry>,
}

impl<'a> RosterIndex<'a> {
    pub fn find(&self, code: &str) -> Option<&'a RosterEntry> {
        self.by_code.get(code).copied()
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<I: IntoIterator<Item = RosterEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("failed to open roster {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid roster CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("roster row {row} has {found} column(s); expected name, member code and rank")]
    MissingColumns { row: usize, found: usize },
}

/// Where a roster snapshot comes from.
pub trait RosterSource: Send + Sync {
    fn load(&self) -> Result<Roster, RosterError>;
}

impl RosterSource for Roster {
    fn load(&self) -> Result<Roster, RosterError> {
        Ok(self.clone())
    }
}

/// Headerless `name,member code,rank` CSV on disk, re-read on every load.
#[derive(Debug, Clone)]
pub struct CsvRosterFile {
    path: PathBuf,
}

impl CsvRosterFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterSource for CsvRosterFile {
    fn load(&self) -> Result<Roster, RosterError> {
        let file = std::fs::File::open(&self.path).map_err(|source| RosterError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_roster(file)
    }
}

pub fn parse_roster<R: Read>(reader: R) -> Result<Roster, RosterError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        if record.len() < REQUIRED_COLUMNS {
            return Err(RosterError::MissingColumns {
                row: index + 1,
                found: record.len(),
            });
        }

        entries.push(RosterEntry {
            name: clean_cell(&record[NAME_COLUMN]),
            member_code: clean_cell(&record[MEMBER_CODE_COLUMN]),
            rank_label: clean_cell(&record[RANK_LABEL_COLUMN]),
        });
    }

    Ok(Roster::new(entries))
}

fn clean_cell(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}
