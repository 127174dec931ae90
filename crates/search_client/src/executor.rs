use reqwest::header::{
    ACCEPT,
    CONTENT_LENGTH,
    CONTENT_TYPE,
    HeaderMap,
    HeaderName,
    HeaderValue,
};
use reqwest::{
    Client,
    Method,
};
use serde_json::Value;
use tracing::{
    debug,
    error,
    warn,
};

use crate::config::ServiceConfig;
use crate::consts::{
    API_KEY_HEADER,
    API_VERSION_PARAM,
};
use crate::error::{
    Error,
    StatusKind,
};
use crate::request::RequestSpec;

const APPLICATION_JSON: &str = "application/json";
const TEXT_PLAIN: &str = "text/plain";

/// A decoded, non-empty success body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// Returned untouched when the request asked for `Accept: text/plain`.
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            ResponseBody::Json(_) => None,
        }
    }
}

fn default_headers(config: &ServiceConfig, payload_len: usize) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(HeaderName::from_static(API_KEY_HEADER), config.api_key().clone());
    headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
    headers.insert(CONTENT_LENGTH, HeaderValue::from(payload_len));
    headers
}

/// Issues one request and interprets the response.
///
/// The status is classified before the body is looked at, so a parse error can only come out
/// of a success status. `Ok(None)` means the service sent an empty body.
pub(crate) async fn execute(
    http: &Client,
    config: &ServiceConfig,
    spec: RequestSpec,
) -> Result<Option<ResponseBody>, Error> {
    let RequestSpec {
        path,
        method,
        body,
        header_overrides,
    } = spec;

    let path = path.param(API_VERSION_PARAM, config.api_version());
    let path_and_query = path.to_path_and_query();

    let payload = match &body {
        Some(body) => serde_json::to_vec(body)?,
        None => Vec::new(),
    };

    let mut headers = default_headers(config, payload.len());
    for (name, value) in &header_overrides {
        headers.insert(name.clone(), value.clone());
    }
    let plain_text = headers
        .get(ACCEPT)
        .is_some_and(|accept| accept.as_bytes() == TEXT_PLAIN.as_bytes());

    let mut url = config.origin().clone();
    url.set_path(&path.path());
    url.set_query(Some(&path.query()));

    debug!(%method, path = %path_and_query, payload_len = payload.len(), "Sending request");

    let transport_error = |method: &Method, source: reqwest::Error| {
        error!(%method, path = %path_and_query, %source, "Request failed");
        Error::Transport {
            method: method.clone(),
            path: path_and_query.clone(),
            source,
        }
    };

    let mut request = http.request(method.clone(), url).headers(headers);
    if !payload.is_empty() {
        request = request.body(payload);
    }

    let response = request.send().await.map_err(|err| transport_error(&method, err))?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(|err| transport_error(&method, err))?;

    debug!(%method, path = %path_and_query, status, body_len = bytes.len(), "Received response");

    if let Some(kind) = StatusKind::classify(status) {
        warn!(%method, path = %path_and_query, status, "{kind}");
        return Err(Error::Status { status, kind });
    }

    if bytes.is_empty() {
        return Ok(None);
    }

    let text = String::from_utf8_lossy(&bytes).into_owned();
    if plain_text {
        return Ok(Some(ResponseBody::Text(text)));
    }

    match serde_json::from_str(&text) {
        Ok(value) => Ok(Some(ResponseBody::Json(value))),
        Err(err) => Err(Error::Parse {
            message: err.to_string(),
            body: text,
        }),
    }
}
