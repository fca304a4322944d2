use crate::domain::entities::{Connection, Method, Request};
use crate::domain::value_objects::{JsonBody, Url};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::str::FromStr;

pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<Url>,
    headers: BTreeMap<String, String>,
    body: Option<JsonBody>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            url: None,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Starts a request addressed at `path` on `connection`, carrying its headers
    /// and, when present, its token as a bearer credential.
    ///
    /// An absolute `http(s)://` path is used as-is instead of being joined. It
    /// only gets the connection's headers and token when it points at the same
    /// origin as the service URL.
    pub fn for_connection(connection: &Connection, path: &str) -> Result<Self> {
        let mut builder = Self::new();
        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::new(path)?;
            let same_origin =
                Url::new(&connection.service_url).is_ok_and(|base| base.same_origin(&url));
            builder.url = Some(url);
            if !same_origin {
                return Ok(builder);
            }
        } else {
            builder.url = Some(Url::join(&connection.service_url, path)?);
        }

        for (name, value) in &connection.headers {
            builder.insert_header(name, value);
        }
        if !connection.auth_token.is_empty() {
            builder.insert_header("Authorization", &format!("Bearer {}", connection.auth_token));
        }
        Ok(builder)
    }

    /// Header names are case-insensitive: a later value replaces an earlier one
    /// whatever its spelling.
    fn insert_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_string(), value.to_string());
    }

    pub fn method(mut self, method: &str) -> Result<Self> {
        self.method = Some(Method::from_str(method)?);
        Ok(self)
    }

    pub fn headers(mut self, raw_headers: &[String]) -> Result<Self> {
        for raw in raw_headers {
            let parts: Vec<&str> = raw.splitn(2, ':').collect();
            if parts.len() != 2 {
                return Err(anyhow!(
                    "Invalid header format: '{}'. Use 'Key: Value'",
                    raw
                ));
            }
            self.insert_header(parts[0].trim(), parts[1].trim());
        }
        Ok(self)
    }

    pub fn body(mut self, json: &Option<String>) -> Result<Self> {
        if let Some(data) = json {
            self.body = Some(JsonBody::new(data)?);
        }
        Ok(self)
    }

    pub fn build(self) -> Result<Request> {
        Ok(Request {
            method: self.method.ok_or_else(|| anyhow!("Method is required"))?,
            url: self.url.ok_or_else(|| anyhow!("URL is required"))?,
            headers: self.headers.into_iter().collect(),
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
