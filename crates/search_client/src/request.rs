use reqwest::Method;
use reqwest::header::{
    HeaderMap,
    HeaderName,
    HeaderValue,
};
use serde_json::Value;

use crate::path::RequestPath;

/// Everything the executor needs to issue one request. Built fresh for each call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub path: RequestPath,
    pub method: Method,
    pub body: Option<Value>,
    /// Replace the default header with the same name.
    pub header_overrides: HeaderMap,
}

impl RequestSpec {
    pub fn new(method: Method, path: RequestPath) -> Self {
        Self {
            path,
            method,
            body: None,
            header_overrides: HeaderMap::new(),
        }
    }

    pub fn get(path: RequestPath) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: RequestPath, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: RequestPath, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: RequestPath) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.header_overrides.insert(name, value);
        self
    }
}
