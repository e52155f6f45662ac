#![allow(dead_code)]

use std::path::PathBuf;

use chart_core::{FieldValue, PersistedRow};
use chart_db::Db;
use chrono::NaiveDate;
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("test.sqlite");
    let db = Db::open(&path).expect("open db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

pub fn extract_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
}

pub fn make_artist_row(name: &str, playcount: i64, url: &str) -> PersistedRow {
    PersistedRow {
        identity: url.to_string(),
        values: vec![
            ("name", FieldValue::Text(name.to_string())),
            ("playcount", FieldValue::Integer(playcount)),
            ("listeners", FieldValue::Integer(playcount / 2)),
            ("mbid", FieldValue::Null),
            ("extract_date", FieldValue::Date(extract_date())),
            ("url", FieldValue::Text(url.to_string())),
        ],
    }
}

pub fn make_track_row(name: &str, duration: i64, url: &str) -> PersistedRow {
    PersistedRow {
        identity: url.to_string(),
        values: vec![
            ("name", FieldValue::Text(name.to_string())),
            ("duration", FieldValue::Integer(duration)),
            ("playcount", FieldValue::Integer(100)),
            ("listeners", FieldValue::Integer(10)),
            ("mbid", FieldValue::Text("mbid-1".to_string())),
            ("extract_date", FieldValue::Date(extract_date())),
            ("url", FieldValue::Text(url.to_string())),
        ],
    }
}
