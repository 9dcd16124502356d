//! End-to-end tests of the registry with a recording client.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};

use assert2::{check, let_assert};
use bytes::Bytes;
use rink_core::{
    Api, ApiDefinition, Body, ContentType, Error, ErrorKind, HttpClient, Method, Request, Response,
    Result, params,
};
use serde_json::{Value, json};

/// Records every request it receives and answers with a canned response.
#[derive(Clone)]
struct Recorder {
    status: u16,
    body: &'static str,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl Recorder {
    fn ok(body: &'static str) -> Self {
        Self::with_status(200, body)
    }

    fn with_status(status: u16, body: &'static str) -> Self {
        Self {
            status,
            body,
            requests: Arc::default(),
        }
    }

    fn calls(&self) -> usize {
        self.requests.lock().expect("lock").len()
    }

    fn take(&self) -> Request {
        self.requests.lock().expect("lock").pop().expect("one request")
    }
}

impl HttpClient for Recorder {
    async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        self.requests.lock().expect("lock").push(request);
        Ok(Response::new(
            self.status,
            HashMap::new(),
            Bytes::from_static(self.body.as_bytes()),
        ))
    }
}

fn api(definition: Value, client: &Recorder) -> Api<Recorder> {
    let definition = ApiDefinition::from_value(definition).expect("definition");
    Api::new(definition, client.clone()).expect("api")
}

fn items_api(client: &Recorder) -> Api<Recorder> {
    api(
        json!({
            "name": "items",
            "base": "https://api.example.test",
            "endpoints": {
                "get_item": {
                    "path": "/items/:id",
                    "contentType": "application/json",
                    "params": {
                        "id": { "required": true, "place": "path" },
                        "expand": {}
                    }
                }
            }
        }),
        client,
    )
}

#[tokio::test]
async fn get_item_places_path_and_query() {
    let client = Recorder::ok(r#"{"id":"42","name":"widget"}"#);
    let api = items_api(&client);

    let value = api
        .call("get_item", params([("id", "42"), ("expand", "owner")]))
        .await
        .expect("call");

    check!(value == json!({ "id": "42", "name": "widget" }));
    check!(client.calls() == 1);

    let request = client.take();
    check!(request.endpoint() == "get_item");
    check!(request.method() == Method::Get);
    check!(request.url().as_str() == "https://api.example.test/items/42");
    check!(request.query()["expand"] == "owner");
    check!(request.body().is_empty());
}

#[tokio::test]
async fn missing_required_parameter_never_reaches_transport() {
    let client = Recorder::ok("{}");
    let api = items_api(&client);

    let err = api
        .call("get_item", params([("expand", "owner")]))
        .await
        .expect_err("id is required");

    check!(err.to_string() == "missing required parameter `id` for endpoint `get_item`");
    check!(err.is_validation());
    check!(client.calls() == 0);
}

#[tokio::test]
async fn unknown_parameter_and_endpoint() {
    let client = Recorder::ok("{}");
    let api = items_api(&client);

    let_assert!(
        Err(Error::UnknownParameter { name, .. }) = api
            .call("get_item", params([("id", "1"), ("colour", "red")]))
            .await
    );
    check!(name == "colour");

    let_assert!(Err(Error::UnknownEndpoint(name)) = api.call("delete_item", params::<&str, &str>([])).await);
    check!(name == "delete_item");
    check!(client.calls() == 0);
}

#[tokio::test]
async fn path_values_are_percent_encoded() {
    let client = Recorder::ok("{}");
    let api = items_api(&client);

    api.call("get_item", params([("id", "a b/c")]))
        .await
        .expect("call");

    check!(client.take().url().path() == "/items/a%20b%2Fc");
}

#[tokio::test]
async fn form_endpoint_defaults_parameters_to_body() {
    let client = Recorder::ok(r#"{"title":"My App"}"#);
    let api = api(
        json!({
            "base": "https://api.example.test",
            "endpoints": {
                "create_app": {
                    "path": "/apps/new",
                    "method": "post",
                    "contentType": "application/x-www-form-urlencoded",
                    "params": {
                        "title": { "required": true },
                        "bundle_identifier": { "required": true },
                        "platform": {}
                    }
                }
            }
        }),
        &client,
    );

    api.call(
        "create_app",
        params([("title", "My App"), ("bundle_identifier", "com.example.app")]),
    )
    .await
    .expect("call");

    let request = client.take();
    check!(request.method() == Method::Post);
    check!(request.query().is_empty());
    let_assert!(Body::Form(fields) = request.body());
    check!(fields["title"] == "My App");
    check!(fields["bundle_identifier"] == "com.example.app");
    check!(!fields.contains_key("platform"));
}

#[tokio::test]
async fn multipart_file_upload() {
    let mut ipa = tempfile::Builder::new()
        .suffix(".ipa")
        .tempfile()
        .expect("temp file");
    ipa.write_all(b"PK\x03\x04").expect("write");
    let ipa_path = ipa.path().to_string_lossy().into_owned();

    let client = Recorder::ok(r#"{"id":7}"#);
    let api = api(
        json!({
            "base": "https://rink.example.test/api/2",
            "endpoints": {
                "upload_version": {
                    "path": "/apps/:app_id/app_versions/upload",
                    "method": "post",
                    "params": {
                        "app_id": { "required": true, "place": "path" },
                        "ipa": { "type": "file", "required": true },
                        "notes": {}
                    }
                }
            }
        }),
        &client,
    );

    api.call(
        "upload_version",
        params([
            ("app_id", json!("1234abcd")),
            ("ipa", json!(ipa_path)),
            ("notes", json!("Fixed crash")),
        ]),
    )
    .await
    .expect("call");

    let request = client.take();
    check!(request.content_type() == &ContentType::Multipart);
    let_assert!(Body::Multipart(fields) = request.body());
    let_assert!(Some(stream) = fields["ipa"].as_file());
    check!(stream.path() == ipa.path());
    check!(fields["notes"].to_text().as_deref() == Some("Fixed crash"));
}

#[tokio::test]
async fn missing_file_fails_before_sending() {
    let client = Recorder::ok("{}");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "endpoints": {
                "upload": { "method": "post", "params": { "ipa": { "type": "file" } } }
            }
        }),
        &client,
    );

    let err = api
        .call("upload", params([("ipa", "/no/such/MyApp.ipa")]))
        .await
        .expect_err("missing file");

    let_assert!(Error::File { parameter, .. } = &err);
    check!(parameter == "ipa");
    check!(err.kind() == ErrorKind::Serialization);
    check!(client.calls() == 0);
}

#[tokio::test]
async fn enum_values_are_mapped_and_checked() {
    let client = Recorder::ok("{}");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "dataTypes": {
                "release_type": { "type": "enum", "values": { "beta": 0, "store": 1, "alpha": 2 } }
            },
            "endpoints": {
                "list": {
                    "contentType": "application/json",
                    "params": { "release_type": { "type": "release_type" } }
                }
            }
        }),
        &client,
    );

    api.call("list", params([("release_type", "store")]))
        .await
        .expect("call");
    check!(client.take().query()["release_type"] == "1");

    let err = api
        .call("list", params([("release_type", "enterprise")]))
        .await
        .expect_err("not a release type");
    check!(err.to_string() == "invalid enum value `enterprise` for parameter `release_type`");
    check!(client.calls() == 0);
}

#[tokio::test]
async fn derivation_chain_behaves_like_its_root() {
    let client = Recorder::ok("{}");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "dataTypes": {
                "status": { "type": "enum", "values": { "available": 2, "unavailable": 1 } },
                "download_status": { "type": "status" },
                "public_download_status": { "type": "download_status" }
            },
            "endpoints": {
                "update": {
                    "method": "put",
                    "contentType": "application/json",
                    "params": { "status": { "type": "public_download_status", "place": "body" } }
                }
            }
        }),
        &client,
    );

    api.call("update", params([("status", "available")]))
        .await
        .expect("call");

    let request = client.take();
    let_assert!(Body::Json(object) = request.body());
    check!(object["status"] == json!(2));
}

#[test]
fn type_cycle_fails_at_load() {
    let definition = ApiDefinition::from_value(json!({
        "base": "https://api.example.test",
        "dataTypes": {
            "a": { "type": "b" },
            "b": { "type": "c" },
            "c": { "type": "a" }
        },
        "endpoints": { "e": { "params": { "p": { "type": "b" } } } }
    }))
    .expect("definition");

    let err = Api::new(definition, Recorder::ok("{}")).expect_err("cycle");
    check!(err.to_string() == "data type cycle: b -> c -> a -> b");
    check!(err.kind() == ErrorKind::Configuration);
}

#[tokio::test]
async fn default_parameters_apply_unless_redeclared() {
    let client = Recorder::ok("[]");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "defaults": {
                "contentType": "application/json",
                "params": {
                    "token": { "required": true, "place": "header", "internalName": "X-Token" }
                }
            },
            "endpoints": {
                "list_apps": { "path": "/apps" },
                "public_feed": { "path": "/feed", "params": { "token": { "place": "query" } } }
            }
        }),
        &client,
    );

    let err = api
        .call("list_apps", params::<&str, &str>([]))
        .await
        .expect_err("token required by default");
    let_assert!(Error::MissingParameter { name, .. } = err);
    check!(name == "token");

    api.call("list_apps", params([("token", "abcd")]))
        .await
        .expect("call");
    check!(client.take().header("X-Token") == Some("abcd"));

    api.call("public_feed", params::<&str, &str>([]))
        .await
        .expect("token optional here");
    api.call("public_feed", params([("token", "abcd")]))
        .await
        .expect("call");
    let request = client.take();
    check!(request.headers().is_empty());
    check!(request.query()["token"] == "abcd");
}

#[tokio::test]
async fn auth_parameters_become_credentials() {
    let client = Recorder::ok("{}");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "endpoints": {
                "auth_tokens": {
                    "contentType": "application/json",
                    "params": {
                        "user": { "required": true, "place": "auth" },
                        "pass": { "required": true, "place": "auth" }
                    }
                }
            }
        }),
        &client,
    );

    api.call("auth_tokens", params([("user", "jane"), ("pass", "s3cret")]))
        .await
        .expect("call");

    let request = client.take();
    check!(request.headers().is_empty());
    check!(request.query().is_empty());
    let_assert!(Some(credentials) = request.credentials());
    check!(credentials.basic() == Some(("jane", Some("s3cret"))));
}

#[tokio::test]
async fn http_error_status_is_an_error() {
    let client = Recorder::with_status(404, r#"{"errors":"not found"}"#);
    let api = items_api(&client);

    let err = api
        .call("get_item", params([("id", "404")]))
        .await
        .expect_err("not found");

    check!(err.status() == Some(404));
    check!(err.is_client_error());
    let_assert!(Some(Ok(body)) = err.decode_body::<Value>());
    check!(body == json!({ "errors": "not found" }));
    check!(client.calls() == 1);
}

#[tokio::test]
async fn unsupported_content_type_with_body_fails_before_sending() {
    let client = Recorder::ok("");
    let api = api(
        json!({
            "base": "https://api.example.test",
            "endpoints": {
                "put_notes": {
                    "method": "put",
                    "contentType": "text/plain",
                    "responseType": "text/plain",
                    "params": { "notes": { "place": "body" }, "lang": {} }
                }
            }
        }),
        &client,
    );

    let_assert!(
        Err(Error::UnsupportedContentType(content_type)) =
            api.call("put_notes", params([("notes", "hello")])).await
    );
    check!(content_type == "text/plain");
    check!(client.calls() == 0);

    // Without body fields the content type is never used
    let value = api
        .call("put_notes", params([("lang", "en")]))
        .await
        .expect("call");
    check!(value == Value::Null);
}

#[tokio::test]
async fn bound_endpoint_is_reusable() {
    let client = Recorder::ok("{}");
    let api = items_api(&client);

    let get_item = api.get("get_item").expect("endpoint");
    check!(get_item.endpoint().path() == "/items/:id");

    for id in ["1", "2", "3"] {
        get_item.call(params([("id", id)])).await.expect("call");
    }
    check!(client.calls() == 3);
}
