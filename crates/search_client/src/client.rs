use std::sync::Arc;

use reqwest::header::{
    ACCEPT,
    HeaderValue,
};
use serde_json::{
    Value,
    json,
};
use tracing::debug;

use crate::config::ServiceConfig;
use crate::error::Error;
use crate::executor::{
    self,
    ResponseBody,
};
use crate::path::{
    Query,
    RequestPath,
};
use crate::request::RequestSpec;
use crate::reqwest_client::reqwest_client;

/// One method per REST endpoint of the search service.
///
/// Cloning is cheap and clones share the same configuration and connection pool, so calls can
/// be issued concurrently without coordination.
#[derive(Debug, Clone)]
pub struct SearchClient {
    config: Arc<ServiceConfig>,
    http: reqwest::Client,
}

fn require(value: &str, name: &'static str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(Error::MissingArgument(name));
    }
    Ok(())
}

fn require_value(value: &Value, name: &'static str) -> Result<(), Error> {
    if value.is_null() {
        return Err(Error::MissingArgument(name));
    }
    Ok(())
}

fn require_documents(documents: &Value) -> Result<(), Error> {
    match documents {
        Value::Null => Err(Error::MissingArgument("documents")),
        Value::Array(items) if items.is_empty() => Err(Error::MissingArgument("documents")),
        _ => Ok(()),
    }
}

fn require_query(query: &Query) -> Result<(), Error> {
    if query.is_empty() {
        return Err(Error::MissingArgument("query"));
    }
    Ok(())
}

/// JSON truthiness, which decides whether an `error` field counts as an embedded error.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Surfaces an `error` field the service put in a success body.
fn check_embedded_error(body: Option<ResponseBody>) -> Result<Option<Value>, Error> {
    match body {
        Some(ResponseBody::Json(mut value)) => {
            if let Some(error) = value.get_mut("error") {
                if is_truthy(error) {
                    return Err(Error::Service(error.take()));
                }
            }
            Ok(Some(value))
        },
        Some(ResponseBody::Text(text)) => Ok(Some(Value::String(text))),
        None => Ok(None),
    }
}

/// Unwraps the `{ "value": [...] }` envelope listings come in.
fn unwrap_envelope(body: Option<ResponseBody>) -> Result<Vec<Value>, Error> {
    match check_embedded_error(body)? {
        Some(Value::Object(mut envelope)) => match envelope.remove("value") {
            Some(Value::Array(values)) => Ok(values),
            Some(other) => Err(Error::UnexpectedResponse(format!(
                "expected the value field to be an array, got {other}"
            ))),
            None => Err(Error::UnexpectedResponse("response has no value field".into())),
        },
        Some(other) => Err(Error::UnexpectedResponse(format!(
            "expected an object with a value field, got {other}"
        ))),
        None => Err(Error::UnexpectedResponse("response body is empty".into())),
    }
}

fn parse_count(body: Option<ResponseBody>) -> Result<u64, Error> {
    let text = match body {
        Some(ResponseBody::Text(text)) => text,
        Some(ResponseBody::Json(value)) => value.to_string(),
        None => String::new(),
    };

    let trimmed = text.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    trimmed.parse::<u64>().map_err(|err| Error::Parse {
        message: err.to_string(),
        body: text.clone(),
    })
}

impl SearchClient {
    /// Uses the shared http client, falling back to a default one if TLS setup failed.
    pub fn new(config: ServiceConfig) -> Self {
        let http = reqwest_client(true).cloned().unwrap_or_default();
        Self::with_http_client(config, http)
    }

    pub fn with_http_client(config: ServiceConfig, http: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs an arbitrary request through the same pipeline the named operations use.
    pub async fn execute(&self, spec: RequestSpec) -> Result<Option<ResponseBody>, Error> {
        executor::execute(&self.http, &self.config, spec).await
    }

    async fn execute_checked(&self, spec: RequestSpec) -> Result<Option<Value>, Error> {
        check_embedded_error(self.execute(spec).await?)
    }

    fn index_path(index_name: &str) -> RequestPath {
        RequestPath::new().segments(["indexes", index_name])
    }

    pub async fn list_indexes(&self) -> Result<Vec<Value>, Error> {
        let spec = RequestSpec::get(RequestPath::new().segment("indexes"));
        unwrap_envelope(self.execute(spec).await?)
    }

    pub async fn create_index(&self, schema: Value) -> Result<Option<Value>, Error> {
        require_value(&schema, "schema")?;
        self.execute_checked(RequestSpec::post(RequestPath::new().segment("indexes"), schema))
            .await
    }

    pub async fn get_index(&self, index_name: &str) -> Result<Option<Value>, Error> {
        require(index_name, "index_name")?;
        self.execute_checked(RequestSpec::get(Self::index_path(index_name)))
            .await
    }

    pub async fn get_index_stats(&self, index_name: &str) -> Result<Option<Value>, Error> {
        require(index_name, "index_name")?;
        self.execute_checked(RequestSpec::get(Self::index_path(index_name).segment("stats")))
            .await
    }

    /// The service answers a successful delete with no content, i.e. `Ok(None)`.
    pub async fn delete_index(&self, index_name: &str) -> Result<Option<Value>, Error> {
        require(index_name, "index_name")?;
        self.execute_checked(RequestSpec::delete(Self::index_path(index_name)))
            .await
    }

    /// Uploads `documents` as `{ "value": documents }` and returns the per-document results.
    pub async fn add_documents(&self, index_name: &str, documents: Value) -> Result<Vec<Value>, Error> {
        require(index_name, "index_name")?;
        require_documents(&documents)?;
        debug!(index_name, "Adding documents");
        let spec = RequestSpec::post(
            Self::index_path(index_name).segments(["docs", "index"]),
            json!({ "value": documents }),
        );
        unwrap_envelope(self.execute(spec).await?)
    }

    pub async fn search(&self, index_name: &str, query: &Query) -> Result<Vec<Value>, Error> {
        require(index_name, "index_name")?;
        require_query(query)?;
        let spec = RequestSpec::get(Self::index_path(index_name).segment("docs").extend(query));
        unwrap_envelope(self.execute(spec).await?)
    }

    /// Fetches a single document by its key.
    pub async fn lookup(&self, index_name: &str, key: &str) -> Result<Option<Value>, Error> {
        require(index_name, "index_name")?;
        require(key, "key")?;
        let spec = RequestSpec::get(Self::index_path(index_name).segment(format!("docs('{key}')")));
        self.execute_checked(spec).await
    }

    /// The number of documents in the index.
    pub async fn count(&self, index_name: &str) -> Result<u64, Error> {
        require(index_name, "index_name")?;
        let spec = RequestSpec::get(Self::index_path(index_name).segments(["docs", "$count"]))
            .with_header(ACCEPT, HeaderValue::from_static("text/plain"));
        parse_count(self.execute(spec).await?)
    }

    pub async fn suggest(&self, index_name: &str, query: &Query) -> Result<Vec<Value>, Error> {
        require(index_name, "index_name")?;
        require_query(query)?;
        let spec = RequestSpec::get(
            Self::index_path(index_name)
                .segments(["docs", "suggest"])
                .extend(query),
        );
        unwrap_envelope(self.execute(spec).await?)
    }
}

#[cfg(test)]
mod tests {
    use mockito::Matcher;

    use super::*;
    use crate::error::StatusKind;

    const VERSION: &str = "api-version=2014-07-31-Preview";

    fn client(server: &mockito::Server) -> SearchClient {
        let config = ServiceConfig::new("https://example.search.windows.net", "secret")
            .unwrap()
            .with_origin(server.url().parse().unwrap());
        SearchClient::with_http_client(config, reqwest::Client::new())
    }

    async fn mock_get(server: &mut mockito::Server, path: &str, status: usize, body: &str) -> mockito::Mock {
        server
            .mock("GET", format!("{path}?{VERSION}").as_str())
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_list_indexes_unwraps_envelope() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_get(&mut server, "/indexes", 200, r#"{"value":[{"name":"idx1"}]}"#).await;

        let indexes = client(&server).list_indexes().await.unwrap();
        assert_eq!(indexes, vec![json!({ "name": "idx1" })]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_indexes_status_errors() {
        for (status, kind) in [
            (401, StatusKind::Unauthorized),
            (404, StatusKind::NotFound),
            (500, StatusKind::ServerError),
            (430, StatusKind::BadRequest),
        ] {
            let mut server = mockito::Server::new_async().await;
            let _mock = mock_get(&mut server, "/indexes", status, r#"{"value":[{"name":"idx1"}]}"#).await;

            match client(&server).list_indexes().await {
                Err(Error::Status { kind: got, .. }) => assert_eq!(got, kind),
                other => panic!("unexpected outcome for {status}: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_embedded_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_get(
            &mut server,
            "/indexes/hotels",
            200,
            r#"{"error":{"code":"","message":"Index is busy"}}"#,
        )
        .await;

        match client(&server).get_index("hotels").await {
            Err(Error::Service(error)) => assert_eq!(error["message"], "Index is busy"),
            other => panic!("expected a service error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_falsy_error_field_is_not_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_get(&mut server, "/indexes/hotels/stats", 200, r#"{"documentCount":3,"error":null}"#).await;

        let stats = client(&server).get_index_stats("hotels").await.unwrap().unwrap();
        assert_eq!(stats["documentCount"], 3);
    }

    #[tokio::test]
    async fn test_create_index() {
        let mut server = mockito::Server::new_async().await;
        let schema = json!({ "name": "hotels", "fields": [{ "name": "id", "type": "Edm.String", "key": true }] });
        let mock = server
            .mock("POST", format!("/indexes?{VERSION}").as_str())
            .match_body(Matcher::Json(schema.clone()))
            .with_status(201)
            .with_body(schema.to_string())
            .create_async()
            .await;

        let created = client(&server).create_index(schema.clone()).await.unwrap();
        assert_eq!(created, Some(schema));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_index_no_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", format!("/indexes/hotels?{VERSION}").as_str())
            .with_status(204)
            .create_async()
            .await;

        assert_eq!(client(&server).delete_index("hotels").await.unwrap(), None);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_arguments_send_nothing() {
        let mut server = mockito::Server::new_async().await;
        let mut mocks = Vec::new();
        for method in ["GET", "POST", "DELETE"] {
            mocks.push(server.mock(method, Matcher::Any).expect(0).create_async().await);
        }
        let client = client(&server);

        assert!(matches!(
            client.delete_index("").await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.get_index("").await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.create_index(Value::Null).await,
            Err(Error::MissingArgument("schema"))
        ));
        assert!(matches!(
            client.add_documents("hotels", Value::Null).await,
            Err(Error::MissingArgument("documents"))
        ));
        assert!(matches!(
            client.add_documents("hotels", json!([])).await,
            Err(Error::MissingArgument("documents"))
        ));
        assert!(matches!(
            client.add_documents("", json!([{ "id": "1" }])).await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.get_index_stats("").await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.search("hotels", &Query::new()).await,
            Err(Error::MissingArgument("query"))
        ));
        assert!(matches!(
            client.search("", &Query::new().param("search", "budget")).await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.suggest("hotels", &Query::new()).await,
            Err(Error::MissingArgument("query"))
        ));
        assert!(matches!(
            client.suggest("", &Query::new().param("search", "bud")).await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.lookup("", "42").await,
            Err(Error::MissingArgument("index_name"))
        ));
        assert!(matches!(
            client.lookup("hotels", "").await,
            Err(Error::MissingArgument("key"))
        ));
        assert!(matches!(client.count("").await, Err(Error::MissingArgument("index_name"))));
        for mock in mocks {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_add_documents_wraps_value() {
        let mut server = mockito::Server::new_async().await;
        let docs = json!([{ "@search.action": "upload", "id": "1" }]);
        let mock = server
            .mock("POST", format!("/indexes/hotels/docs/index?{VERSION}").as_str())
            .match_body(Matcher::Json(json!({ "value": docs.clone() })))
            .with_status(200)
            .with_body(r#"{"value":[{"key":"1","status":true}]}"#)
            .create_async()
            .await;

        let results = client(&server).add_documents("hotels", docs).await.unwrap();
        assert_eq!(results, vec![json!({ "key": "1", "status": true })]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_forwards_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                format!("/indexes/hotels/docs?search=budget%20hotel&$top=2&{VERSION}").as_str(),
            )
            .with_status(200)
            .with_body(r#"{"value":[{"id":"1"},{"id":"2"}]}"#)
            .create_async()
            .await;

        let query = Query::new().param("search", "budget hotel").param("$top", 2);
        let hits = client(&server).search("hotels", &query).await.unwrap();
        assert_eq!(hits.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_suggest_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock(
                "GET",
                format!("/indexes/hotels/docs/suggest?search=bud&suggesterName=sg&{VERSION}").as_str(),
            )
            .with_status(200)
            .with_body(r#"{"value":[{"@search.text":"budget"}]}"#)
            .create_async()
            .await;

        let query = Query::new().param("search", "bud").param("suggesterName", "sg");
        let suggestions = client(&server).suggest("hotels", &query).await.unwrap();
        assert_eq!(suggestions, vec![json!({ "@search.text": "budget" })]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_by_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = mock_get(&mut server, "/indexes/hotels/docs('42')", 200, r#"{"id":"42"}"#).await;

        let doc = client(&server).lookup("hotels", "42").await.unwrap();
        assert_eq!(doc, Some(json!({ "id": "42" })));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_count() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/indexes/idx1/docs/$count?{VERSION}").as_str())
            .match_header("accept", "text/plain")
            .with_status(200)
            .with_body("\u{feff}42\r\n")
            .create_async()
            .await;

        assert_eq!(client(&server).count("idx1").await.unwrap(), 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_count_not_a_number() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_get(&mut server, "/indexes/idx1/docs/$count", 200, "many").await;

        match client(&server).count("idx1").await {
            Err(Error::Parse { body, .. }) => assert_eq!(body, "many"),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_listing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_get(&mut server, "/indexes", 200, "{bad json").await;

        match client(&server).list_indexes().await {
            Err(Error::Parse { body, .. }) => assert_eq!(body, "{bad json"),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listing_without_envelope() {
        let mut server = mockito::Server::new_async().await;
        let _mock = mock_get(&mut server, "/indexes", 200, r#"{"name":"idx1"}"#).await;

        assert!(matches!(
            client(&server).list_indexes().await,
            Err(Error::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_calls() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", format!("/indexes/hotels/docs/$count?{VERSION}").as_str())
            .with_status(200)
            .with_body("7")
            .expect(4)
            .create_async()
            .await;

        let client = client(&server);
        let handles = (0..4)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.count("hotels").await })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 7);
        }
        mock.assert_async().await;
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("boom")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
    }
}
