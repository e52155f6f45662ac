use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Charts exposed by the music-metadata API that the ETL knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    TopArtists,
    TopTracks,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::TopArtists, ChartKind::TopTracks];

    pub fn shape(self) -> &'static RecordShape {
        match self {
            Self::TopArtists => &TOP_ARTISTS,
            Self::TopTracks => &TOP_TRACKS,
        }
    }

    pub fn table_name(self) -> &'static str {
        self.shape().table_name
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

impl FromStr for ChartKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        RecordShape::for_table(value.trim())
            .map(|shape| shape.kind)
            .ok_or_else(|| format!("unknown chart table: {value}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    /// Filled with the run date, never read from the API.
    Date,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
            Self::Date => "DATE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn text(name: &'static str) -> Column {
    Column {
        name,
        column_type: ColumnType::Text,
    }
}

const fn integer(name: &'static str) -> Column {
    Column {
        name,
        column_type: ColumnType::Integer,
    }
}

const fn date(name: &'static str) -> Column {
    Column {
        name,
        column_type: ColumnType::Date,
    }
}

/// Describes one chart: where its items live in the API response, which
/// field identifies an item, and the destination table columns in order.
#[derive(Debug, PartialEq, Eq)]
pub struct RecordShape {
    pub kind: ChartKind,
    pub table_name: &'static str,
    pub api_method: &'static str,
    /// Top-level response key, e.g. `artists`.
    pub collection_key: &'static str,
    /// Key of the item list under the collection, e.g. `artist`.
    pub item_key: &'static str,
    pub identity: &'static str,
    pub columns: &'static [Column],
}

pub static TOP_ARTISTS: RecordShape = RecordShape {
    kind: ChartKind::TopArtists,
    table_name: "top_artists",
    api_method: "chart.gettopartists",
    collection_key: "artists",
    item_key: "artist",
    identity: "url",
    columns: &[
        text("name"),
        integer("playcount"),
        integer("listeners"),
        text("mbid"),
        date("extract_date"),
        text("url"),
    ],
};

pub static TOP_TRACKS: RecordShape = RecordShape {
    kind: ChartKind::TopTracks,
    table_name: "top_tracks",
    api_method: "chart.gettoptracks",
    collection_key: "tracks",
    item_key: "track",
    identity: "url",
    columns: &[
        text("name"),
        integer("duration"),
        integer("playcount"),
        integer("listeners"),
        text("mbid"),
        date("extract_date"),
        text("url"),
    ],
};

impl RecordShape {
    pub fn for_table(table_name: &str) -> Option<&'static RecordShape> {
        ChartKind::ALL
            .iter()
            .map(|kind| kind.shape())
            .find(|shape| shape.table_name == table_name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.iter().map(|column| column.name)
    }

    pub fn integer_columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .filter(|column| column.column_type == ColumnType::Integer)
            .map(|column| column.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

/// A chart item ready to be appended to its destination table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRow {
    pub identity: String,
    /// Values in the shape's column order.
    pub values: Vec<(&'static str, FieldValue)>,
}

impl PersistedRow {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }
}
