/*!
 * Master-data CSV files.
 *
 * Each file kind has a fixed name and a set of required columns. A file is
 * read completely when opened, so structural problems surface before any
 * row reaches the store.
 */

use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::database::models::{ClusterInput, TriggerInput, VideoInput, parse_publish_flag};
use crate::database::repository::{MembershipInput, TriggerMappingInput};
use crate::errors::ImportError;

/// The five master-data files, in import order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// `trigger_master.csv`
    Triggers,
    /// `video_master.csv`
    Videos,
    /// `video_cluster_master.csv`
    Clusters,
    /// `video_cluster_video_master.csv`
    ClusterVideos,
    /// `video_trigger_map_master.csv`
    TriggerVideos,
}

impl FileKind {
    /// Every kind in dependency order
    pub const ALL: [FileKind; 5] = [
        FileKind::Triggers,
        FileKind::Videos,
        FileKind::Clusters,
        FileKind::ClusterVideos,
        FileKind::TriggerVideos,
    ];

    /// Fixed file name inside the import directory
    pub fn file_name(&self) -> &'static str {
        match self {
            FileKind::Triggers => "trigger_master.csv",
            FileKind::Videos => "video_master.csv",
            FileKind::Clusters => "video_cluster_master.csv",
            FileKind::ClusterVideos => "video_cluster_video_master.csv",
            FileKind::TriggerVideos => "video_trigger_map_master.csv",
        }
    }

    /// Columns the header row must contain
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            FileKind::Triggers => &["trigger_code", "title"],
            FileKind::Videos => &["video_code", "title", "url"],
            FileKind::Clusters => &["cluster_code", "title"],
            FileKind::ClusterVideos => &["cluster_code", "video_code", "position"],
            FileKind::TriggerVideos => &["trigger_code", "video_code"],
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for FileKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase().replace('-', "_");
        let name = name.strip_suffix(".csv").unwrap_or(&name);
        match name {
            "triggers" | "trigger_master" => Ok(FileKind::Triggers),
            "videos" | "video_master" => Ok(FileKind::Videos),
            "clusters" | "video_cluster_master" => Ok(FileKind::Clusters),
            "cluster_videos" | "video_cluster_video_master" => Ok(FileKind::ClusterVideos),
            "trigger_videos" | "video_trigger_map_master" => Ok(FileKind::TriggerVideos),
            _ => Err(anyhow::anyhow!(
                "Unknown file kind '{}' (expected triggers, videos, clusters, cluster-videos or trigger-videos)",
                s
            )),
        }
    }
}

/// One data row with its 1-based row number
#[derive(Debug, Clone)]
pub struct CsvRow<'a> {
    /// 1-based data row number (the header is not counted)
    pub number: usize,
    record: &'a StringRecord,
    columns: &'a HashMap<String, usize>,
}

impl CsvRow<'_> {
    /// Trimmed cell value, empty when the column is absent
    pub fn get(&self, column: &str) -> &str {
        self.columns
            .get(column)
            .and_then(|index| self.record.get(*index))
            .map(str::trim)
            .unwrap_or("")
    }

    /// Non-empty cell value, or a skip reason naming the column
    pub fn require(&self, column: &str) -> Result<String, String> {
        match self.get(column) {
            "" => Err(format!("empty {}", column)),
            value => Ok(value.to_string()),
        }
    }
}

/// A fully read master-data file with a validated header
#[derive(Debug, Clone)]
pub struct CsvTable {
    /// Kind of file
    pub kind: FileKind,
    /// Where the file was read from
    pub path: PathBuf,
    columns: HashMap<String, usize>,
    records: Vec<Result<StringRecord, String>>,
}

impl CsvTable {
    /// Open the file of `kind` inside `dir`
    pub fn open_in(dir: &Path, kind: FileKind) -> Result<Self, ImportError> {
        Self::open(&dir.join(kind.file_name()), kind)
    }

    /// Read and validate a file of `kind`
    pub fn open(path: &Path, kind: FileKind) -> Result<Self, ImportError> {
        if !path.is_file() {
            return Err(ImportError::MissingFile(path.to_path_buf()));
        }

        let unreadable = |message: String| ImportError::Unreadable {
            path: path.to_path_buf(),
            message,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::Headers)
            .from_path(path)
            .map_err(|e| unreadable(e.to_string()))?;

        let headers = reader.headers().map_err(|e| unreadable(e.to_string()))?.clone();
        let mut columns = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let name = header.trim_start_matches('\u{feff}').trim().to_lowercase();
            columns.entry(name).or_insert(index);
        }

        for column in kind.required_columns() {
            if !columns.contains_key(*column) {
                return Err(ImportError::MissingColumn {
                    file: kind.file_name().to_string(),
                    column: column.to_string(),
                });
            }
        }

        let records = reader
            .records()
            .map(|record| record.map_err(|e| format!("malformed record: {}", e)))
            .collect();

        Ok(Self {
            kind,
            path: path.to_path_buf(),
            columns,
            records,
        })
    }

    /// Number of data rows, including malformed ones
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the file has no data rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Data rows in file order; malformed records carry their skip reason
    pub fn rows(&self) -> impl Iterator<Item = (usize, Result<CsvRow<'_>, String>)> {
        self.records.iter().enumerate().map(|(index, record)| {
            let number = index + 1;
            let row = record.as_ref().map_err(Clone::clone).map(|record| CsvRow {
                number,
                record,
                columns: &self.columns,
            });
            (number, row)
        })
    }
}

fn publish_flag(row: &CsvRow<'_>) -> Result<Option<bool>, String> {
    parse_publish_flag(row.get("is_published"))
}

/// Parse a `trigger_master.csv` row
pub fn parse_trigger(row: &CsvRow<'_>) -> Result<TriggerInput, String> {
    Ok(TriggerInput {
        code: row.require("trigger_code")?,
        title: row.require("title")?,
        is_published: publish_flag(row)?,
    })
}

/// Parse a `video_master.csv` row
pub fn parse_video(row: &CsvRow<'_>) -> Result<VideoInput, String> {
    Ok(VideoInput {
        code: row.require("video_code")?,
        title: row.require("title")?,
        url: row.require("url")?,
        is_published: publish_flag(row)?,
    })
}

/// Parse a `video_cluster_master.csv` row
pub fn parse_cluster(row: &CsvRow<'_>) -> Result<ClusterInput, String> {
    Ok(ClusterInput {
        code: row.require("cluster_code")?,
        title: row.require("title")?,
        is_published: publish_flag(row)?,
    })
}

/// Parse a `video_cluster_video_master.csv` row
pub fn parse_membership(row: &CsvRow<'_>) -> Result<MembershipInput, String> {
    let cluster_code = row.require("cluster_code")?;
    let video_code = row.require("video_code")?;
    let raw = row.require("position")?;
    let position = match raw.parse::<i64>() {
        Ok(position) if position >= 0 => position,
        _ => return Err(format!("invalid position '{}'", raw)),
    };

    Ok(MembershipInput {
        cluster_code,
        video_code,
        position,
    })
}

/// Parse a `video_trigger_map_master.csv` row
pub fn parse_trigger_mapping(row: &CsvRow<'_>) -> Result<TriggerMappingInput, String> {
    Ok(TriggerMappingInput {
        trigger_code: row.require("trigger_code")?,
        video_code: row.require("video_code")?,
    })
}
