//! Shared fixtures for connector integration tests
//!
//! - `ArchiveServer`: local HTTP/1.1 server with canned replies
//! - `zip_archive` / `trade_csv`: in-memory archive fixtures

#![allow(dead_code)]

use parking_lot::Mutex;
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use visiontape_providers::ConnectorConfig;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const CSV_HEADER: &str =
    "TradeId,Price,Quantity,QuoteQuantity,Timestamp,IsBuyerMaker,IsBestMatch\n";

/// Canned response for every request the server accepts
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with `Content-Length`
    Body(Vec<u8>),
    /// Bare status line, empty body
    Status(u16),
    /// 200 with no `Content-Length`; the body ends when the socket closes
    CloseDelimited(Vec<u8>),
    /// 200 advertising `declared` bytes
    Declared { declared: u64, body: Vec<u8> },
    /// Accept the request and never answer
    Hang,
}

pub struct ArchiveServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

impl ArchiveServer {
    pub async fn start(reply: Reply) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/data/spot/daily/trades", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let reply = reply.clone();
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    serve(stream, reply, seen).await;
                });
            }
        });

        Self {
            base_url,
            requests,
            handle,
        }
    }

    /// Raw request heads received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Request targets (`GET <path>`) received so far
    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|head| head.lines().next())
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(str::to_string)
            .collect()
    }

    pub fn config(&self) -> ConnectorConfig {
        ConnectorConfig {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(10),
            ..ConnectorConfig::default()
        }
    }
}

impl Drop for ArchiveServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, reply: Reply, seen: Arc<Mutex<Vec<String>>>) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    seen.lock().push(String::from_utf8_lossy(&head).into_owned());

    let (status_line, headers, body) = match reply {
        Reply::Body(body) => (
            "200 OK".to_string(),
            format!("Content-Length: {}\r\n", body.len()),
            body,
        ),
        Reply::Status(code) => (
            format!("{code} Status"),
            "Content-Length: 0\r\n".to_string(),
            Vec::new(),
        ),
        Reply::CloseDelimited(body) => ("200 OK".to_string(), String::new(), body),
        Reply::Declared { declared, body } => (
            "200 OK".to_string(),
            format!("Content-Length: {declared}\r\n"),
            body,
        ),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            return;
        }
    };

    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/zip\r\nConnection: close\r\n{headers}\r\n"
    );
    if stream.write_all(response.as_bytes()).await.is_err() {
        return;
    }
    let _ = stream.write_all(&body).await;
    let _ = stream.shutdown().await;
}

/// Build a zip archive in memory
pub fn zip_archive(members: &[(&str, String)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, content) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// `rows` trade rows with ids starting at `first_id`, optionally headed
pub fn trade_csv(first_id: i64, rows: usize, with_header: bool) -> String {
    let mut csv = if with_header {
        CSV_HEADER.to_string()
    } else {
        String::new()
    };
    for i in 0..rows as i64 {
        let id = first_id + i;
        csv.push_str(&format!(
            "{id},42283.{i},0.001,42.283,{},{},true\n",
            1_704_067_200_000 + id,
            i % 2 == 0
        ));
    }
    csv
}
