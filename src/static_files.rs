//! Serving files from a directory.
//!
//! This is an ordinary [`Handler`]; the server knows nothing about files.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use log::debug;

use crate::parser::HttpRequest;
use crate::server::{Error, Handler, HttpResponse, StatusCode};

/// Placeholder replaced with the current time in templated files.
pub const TIME_PLACEHOLDER: &str = "{time}";

/// Serves `base_dir/<request path>` with a Content-Type guessed from the extension.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
    templates: HashSet<String>,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
            templates: HashSet::new(),
        }
    }

    /// Treat the file at request path `url_path` as a template: every
    /// `{time}` in it is replaced with the current time when served.
    pub fn with_template(mut self, url_path: impl Into<String>) -> Self {
        self.templates.insert(url_path.into());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a request path onto the base directory, refusing anything that
    /// would climb out of it.
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }

    /// Guess the media type from the file extension.
    pub fn content_type(path: &Path) -> &'static str {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "js" => "text/javascript",
            "json" => "application/json",
            "txt" => "text/plain",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            _ => "application/octet-stream",
        }
    }

    /// Load the file for `url_path`, rendering it if it is a template.
    pub fn load(&self, url_path: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .map_path(url_path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid path"))?;
        if !path.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }

        let content_type = Self::content_type(&path);
        if self.templates.contains(url_path) {
            let source = fs::read_to_string(&path)?;
            let now = httpdate::fmt_http_date(SystemTime::now());
            return Ok((source.replace(TIME_PLACEHOLDER, &now).into_bytes(), content_type));
        }

        Ok((fs::read(&path)?, content_type))
    }
}

impl Handler for StaticFiles {
    fn handle(&self, request: &HttpRequest, out: &mut dyn Write) -> Result<(), Error> {
        let response = match self.load(&request.path) {
            Ok((bytes, content_type)) => HttpResponse::new(StatusCode::Ok)
                .with_content_type(content_type)
                .with_body_bytes(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No file for {}: {e}", request.path);
                HttpResponse::new(StatusCode::NotFound)
            }
            Err(e) => return Err(e.into()),
        };
        response.write_to(out)?;
        Ok(())
    }
}
