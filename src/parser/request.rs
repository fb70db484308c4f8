//! HTTP request parsing and representation.

use std::collections::HashMap;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::parser::error::Error;
use crate::parser::form::{self, Params, FORM_CONTENT_TYPE};
use crate::parser::frame::{find, RawFrame, HEADERS_DELIMITER};
use crate::parser::method::Method;
use crate::parser::options::ParseOptions;

/// Represents a parsed HTTP request.
///
/// A request is built once per connection and handed to the handler by
/// reference; nothing mutates it after parsing.
#[derive(Debug, Clone, Serialize)]
pub struct HttpRequest {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The request path, never containing `?`
    pub path: String,
    /// Everything after the first `?` of the target, empty if absent
    pub query_string: String,
    /// The version token from the request line, carried verbatim
    pub version: String,
    /// Decoded query parameters
    pub query_params: Params,
    /// The HTTP headers; on duplicate names the last one wins
    pub headers: HashMap<String, String>,
    /// The request body
    #[serde(skip)]
    pub body: Vec<u8>,
    /// Decoded form parameters from the body
    pub body_params: Params,
}

impl HttpRequest {
    /// Get a header value.
    ///
    /// # Arguments
    ///
    /// * `name` - The header name
    ///
    /// # Returns
    ///
    /// The header value, if it exists
    pub fn get_header(&self, name: &str) -> Option<&String> {
        header_value(&self.headers, name)
    }

    /// Check if a header exists.
    pub fn has_header(&self, name: &str) -> bool {
        self.get_header(name).is_some()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get_header("Content-Type").map(String::as_str)
    }

    /// The first value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        first_value(&self.query_params, name)
    }

    /// All values of a query parameter, in the order they were sent.
    pub fn query_param_values(&self, name: &str) -> &[String] {
        all_values(&self.query_params, name)
    }

    /// The first value of a form body parameter.
    pub fn body_param(&self, name: &str) -> Option<&str> {
        first_value(&self.body_params, name)
    }

    pub fn body_param_values(&self, name: &str) -> &[String] {
        all_values(&self.body_params, name)
    }

    /// The request target: the path, plus `?` and the query string when one was sent.
    pub fn target(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Reconstruct the request line, without its CRLF.
    pub fn request_line(&self) -> String {
        format!("{} {} {}", self.method, self.target(), self.version)
    }

    /// Parse the request body as JSON.
    ///
    /// # Returns
    ///
    /// The parsed JSON value, or an error if the body is not valid JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let json = serde_json::from_slice(&self.body)?;
        Ok(json)
    }

    /// Check if the Content-Type header is application/json.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|content_type| content_type.starts_with("application/json"))
    }

    /// Whether the body is treated as form data: the Content-Type is
    /// form-encoded or was not sent at all.
    pub fn is_form(&self) -> bool {
        is_form_body(&self.headers)
    }
}

/// Everything known about a request once its head has been parsed.
#[derive(Debug)]
struct RequestHead {
    method: Method,
    path: String,
    query_string: String,
    version: String,
    headers: HashMap<String, String>,
}

impl RequestHead {
    fn into_request(self, body: Vec<u8>) -> HttpRequest {
        let query_params = form::decode_str(&self.query_string);
        let body_params = if !body.is_empty() && is_form_body(&self.headers) {
            form::decode_bytes(&body)
        } else {
            Params::new()
        };

        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            version: self.version,
            query_params,
            headers: self.headers,
            body,
            body_params,
        }
    }
}

/// Parse an HTTP request from a byte slice with the default options.
///
/// # Arguments
///
/// * `input` - A byte slice containing the complete HTTP request
///
/// # Returns
///
/// The parsed HTTP request, or an error if the request is invalid
pub fn parse_request(input: &[u8]) -> Result<HttpRequest, Error> {
    parse_request_with(input, &ParseOptions::default())
}

/// Parse a complete request held in memory.
///
/// The head must fit in `options.max_frame_size` bytes and the body declared
/// by `Content-Length` must be fully present in `input`.
pub fn parse_request_with(input: &[u8], options: &ParseOptions) -> Result<HttpRequest, Error> {
    if input.is_empty() {
        return Err(Error::EmptyRequest);
    }

    let frame = RawFrame::scan(input, options.max_frame_size)?;
    let head = parse_head(&frame, options)?;
    let expected = declared_body_length(&head, options)?;

    let available = &input[frame.head_len()..];
    if available.len() < expected {
        return Err(Error::TruncatedBody {
            expected,
            received: available.len(),
        });
    }

    Ok(head.into_request(available[..expected].to_vec()))
}

/// Read and parse one request from a connection.
///
/// The head is read into a buffer of `options.max_frame_size` bytes; reads
/// continue until the blank line after the headers arrives, the peer stops
/// sending, or the buffer is full. The body is then read until exactly
/// `Content-Length` bytes have been received.
pub async fn read_request<R>(reader: &mut R, options: &ParseOptions) -> Result<HttpRequest, Error>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = vec![0; options.max_frame_size];
    let read = read_head(reader, &mut buffer).await?;
    if read == 0 {
        return Err(Error::EmptyRequest);
    }

    let frame = RawFrame::scan(&buffer[..read], options.max_frame_size)?;
    let head = parse_head(&frame, options)?;
    let expected = declared_body_length(&head, options)?;
    let body = read_body(reader, frame.body_prefix(), expected).await?;

    Ok(head.into_request(body))
}

/// Fill `buffer` until it holds a complete head, the peer stops sending, or it is full.
async fn read_head<R>(reader: &mut R, buffer: &mut [u8]) -> Result<usize, Error>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..]).await?;
        if n == 0 {
            break;
        }
        // The terminator may straddle two reads.
        let search_from = filled.saturating_sub(HEADERS_DELIMITER.len() - 1);
        filled += n;
        if find(buffer, HEADERS_DELIMITER, search_from, filled).is_some() {
            break;
        }
    }
    Ok(filled)
}

async fn read_body<R>(reader: &mut R, prefix: &[u8], expected: usize) -> Result<Vec<u8>, Error>
where
    R: AsyncRead + Unpin,
{
    if prefix.len() >= expected {
        return Ok(prefix[..expected].to_vec());
    }

    let mut body = vec![0; expected];
    body[..prefix.len()].copy_from_slice(prefix);
    let mut received = prefix.len();
    while received < expected {
        let n = reader.read(&mut body[received..]).await?;
        if n == 0 {
            return Err(Error::TruncatedBody { expected, received });
        }
        received += n;
    }
    Ok(body)
}

fn parse_head(frame: &RawFrame<'_>, options: &ParseOptions) -> Result<RequestHead, Error> {
    let line = std::str::from_utf8(frame.request_line()).map_err(|_| {
        Error::MalformedRequestLine("request line is not valid UTF-8".to_string())
    })?;

    // Exactly three tokens separated by single spaces.
    let parts: Vec<&str> = line.split(' ').collect();
    let &[method, target, version] = parts.as_slice() else {
        return Err(Error::MalformedRequestLine(line.to_string()));
    };
    if version.is_empty() {
        return Err(Error::MalformedRequestLine(line.to_string()));
    }

    let method = Method::from_str(method)?;
    if !options.allows(method) {
        return Err(Error::UnsupportedMethod(method.to_string()));
    }

    if !target.starts_with('/') {
        return Err(Error::InvalidPath(target.to_string()));
    }
    let (path, query_string) = target.split_once('?').unwrap_or((target, ""));

    let headers = parse_headers(frame.headers())?;

    Ok(RequestHead {
        method,
        path: path.to_string(),
        query_string: query_string.to_string(),
        version: version.to_string(),
        headers,
    })
}

/// Parse a header block (lines separated by CRLF, no terminating blank line).
///
/// Each non-empty line is split on its first `:`; name and value are trimmed.
/// A repeated name replaces the earlier value.
pub fn parse_headers(block: &[u8]) -> Result<HashMap<String, String>, Error> {
    let block = std::str::from_utf8(block)
        .map_err(|_| Error::MalformedHeaders("header block is not valid UTF-8".to_string()))?;

    let mut headers = HashMap::new();
    for line in block.split("\r\n") {
        if line.is_empty() {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::MalformedHeaders(line.to_string()));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::MalformedHeaders(line.to_string()));
        }

        // Names are case-insensitive; a later spelling replaces an earlier one.
        headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.to_string(), value.trim().to_string());
    }
    Ok(headers)
}

/// The number of body bytes to read for this request.
fn declared_body_length(head: &RequestHead, options: &ParseOptions) -> Result<usize, Error> {
    if head.method.is_bodyless() {
        return Ok(0);
    }

    let Some(raw) = header_value(&head.headers, "Content-Length") else {
        return Ok(0);
    };
    let declared: usize = raw
        .parse()
        .map_err(|_| Error::InvalidContentLength(raw.clone()))?;

    if declared > options.max_body_size {
        return Err(Error::BodyTooLarge {
            declared,
            limit: options.max_body_size,
        });
    }
    Ok(declared)
}

fn header_value<'a>(headers: &'a HashMap<String, String>, name: &str) -> Option<&'a String> {
    // Headers are case-insensitive, so we need to do a case-insensitive lookup
    headers
        .iter()
        .find_map(|(k, v)| k.eq_ignore_ascii_case(name).then_some(v))
}

fn is_form_body(headers: &HashMap<String, String>) -> bool {
    match header_value(headers, "Content-Type") {
        None => true,
        Some(content_type) => content_type
            .split(';')
            .next()
            .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE)),
    }
}

fn first_value<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .get(name)
        .and_then(|values| values.first())
        .map(String::as_str)
}

fn all_values<'a>(params: &'a Params, name: &str) -> &'a [String] {
    params.get(name).map(Vec::as_slice).unwrap_or(&[])
}
