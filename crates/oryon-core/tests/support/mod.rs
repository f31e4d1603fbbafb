//! Shared fixtures: an in-process HTTP server and in-memory tarballs.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;
use tiny_http::{Header, Response, Server, StatusCode};

pub enum Route {
    Body(Vec<u8>),
    Redirect(String),
}

/// HTTP server on a random local port answering from a fixed route table.
/// Unknown paths get a 404.
pub struct TestServer {
    pub url: String,
    _server: Arc<Server>,
    _handle: std::thread::JoinHandle<()>,
}

impl TestServer {
    pub fn start(routes: HashMap<&str, Route>) -> Self {
        let routes: HashMap<String, Route> = routes
            .into_iter()
            .map(|(path, route)| (path.to_string(), route))
            .collect();
        Self::start_with(move |_| routes)
    }

    /// Start a server whose routes may embed its own base URL.
    pub fn start_with<F>(routes: F) -> Self
    where
        F: FnOnce(&str) -> HashMap<String, Route>,
    {
        let server =
            Arc::new(Server::http("127.0.0.1:0").expect("failed to bind test HTTP server"));
        let port = server.server_addr().to_ip().expect("not an IP addr").port();
        let url = format!("http://127.0.0.1:{port}");
        let routes = routes(&url);

        let srv = Arc::clone(&server);
        let handle = std::thread::spawn(move || {
            for request in srv.incoming_requests() {
                let _ = match routes.get(request.url()) {
                    Some(Route::Body(data)) => {
                        let header = Header::from_bytes("Content-Type", "application/octet-stream")
                            .expect("valid header");
                        request.respond(Response::from_data(data.clone()).with_header(header))
                    }
                    Some(Route::Redirect(location)) => {
                        let header = Header::from_bytes("Location", location.as_str())
                            .expect("valid header");
                        request.respond(Response::empty(StatusCode(302)).with_header(header))
                    }
                    None => request.respond(
                        Response::from_string("not found").with_status_code(StatusCode(404)),
                    ),
                };
            }
        });

        Self {
            url,
            _server: server,
            _handle: handle,
        }
    }
}

/// Gzipped tarball with one directory entry per `dirs` and the given files.
pub fn tarball(dirs: &[&str], files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for dir in dirs {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        header.set_cksum();
        builder
            .append_data(&mut header, dir, std::io::empty())
            .expect("append dir");
    }
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(content.len() as u64);
        header.set_cksum();
        builder
            .append_data(&mut header, path, content.as_bytes())
            .expect("append file");
    }

    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// Archive of a module called `sample` at version 0.1.0.
pub fn sample_tarball() -> Vec<u8> {
    tarball(
        &["sample-0.1.0/", "sample-0.1.0/lib/"],
        &[
            (
                "sample-0.1.0/manifest.json",
                r#"{"name": "sample", "version": "0.1.0", "main": "index.js"}"#,
            ),
            ("sample-0.1.0/index.js", "module.exports = 1;\n"),
            ("sample-0.1.0/lib/util.js", "module.exports = {};\n"),
        ],
    )
}

/// True when `path` is missing or has no entries.
pub fn dir_is_empty(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}
