#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::rc::Rc;
use std::thread::{self, JoinHandle};

use chart_db::Db;
use ingest::{PageResponse, PageSource, Result};
use serde_json::{Value, json};
use tempfile::TempDir;

pub struct TestDb {
    pub _dir: TempDir,
    pub db: Db,
    pub path: PathBuf,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("openapi.sqlite");
    let db = Db::open(&path).expect("open db");
    TestDb {
        _dir: dir,
        db,
        path,
    }
}

/// Serves canned pages and records which pages were requested.
pub struct ScriptedSource {
    pages: HashMap<u32, PageResponse>,
    pub requested: Rc<RefCell<Vec<u32>>>,
    pub released: Rc<Cell<bool>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requested: Rc::new(RefCell::new(Vec::new())),
            released: Rc::new(Cell::new(false)),
        }
    }

    pub fn page(mut self, page: u32, body: Value) -> Self {
        self.pages.insert(
            page,
            PageResponse {
                status: 200,
                body: body.to_string(),
                from_cache: false,
            },
        );
        self
    }

    pub fn cached_page(mut self, page: u32, body: Value) -> Self {
        self.pages.insert(
            page,
            PageResponse {
                status: 200,
                body: body.to_string(),
                from_cache: true,
            },
        );
        self
    }

    pub fn error_page(mut self, page: u32, status: u16, body: &str) -> Self {
        self.pages.insert(
            page,
            PageResponse {
                status,
                body: body.to_string(),
                from_cache: false,
            },
        );
        self
    }
}

impl PageSource for ScriptedSource {
    fn fetch_page(&mut self, page: u32) -> Result<PageResponse> {
        self.requested.borrow_mut().push(page);
        Ok(self.pages.get(&page).cloned().unwrap_or_else(|| PageResponse {
            status: 404,
            body: r#"{"error":6,"message":"page not scripted"}"#.to_string(),
            from_cache: false,
        }))
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

pub fn artist(name: &str, playcount: &str, url: &str) -> Value {
    json!({
        "name": name,
        "playcount": playcount,
        "listeners": "10",
        "mbid": "",
        "url": url,
        "streamable": "0"
    })
}

pub fn track(name: &str, duration: &str, url: &str) -> Value {
    json!({
        "name": name,
        "duration": duration,
        "playcount": "100",
        "listeners": "20",
        "mbid": "",
        "url": url,
        "artist": {"name": "Someone", "url": "https://www.last.fm/music/Someone"}
    })
}

pub fn artists_page(page: u32, total_pages: u32, artists: Vec<Value>) -> Value {
    json!({
        "artists": {
            "artist": artists,
            "@attr": {
                "page": page.to_string(),
                "perPage": "2",
                "totalPages": total_pages.to_string(),
                "total": "6"
            }
        }
    })
}

pub fn tracks_page(page: u32, total_pages: u32, tracks: Vec<Value>) -> Value {
    json!({
        "tracks": {
            "track": tracks,
            "@attr": {
                "page": page.to_string(),
                "perPage": "2",
                "totalPages": total_pages.to_string(),
                "total": "4"
            }
        }
    })
}

/// Answers exactly one HTTP request with `status` and `body`, then returns
/// the raw request head it received.
pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let body = body.to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).expect("read request");
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        let reason = if status == 200 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush");
        String::from_utf8_lossy(&request).to_string()
    });
    (format!("http://{addr}/2.0/"), handle)
}
