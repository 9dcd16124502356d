//! Wire encoding of compiled requests.
//!
//! Turns a [`Request`] into an `http::Request`: query pairs are appended to
//! the URL, the body is encoded for its content type, files are read, and
//! credentials are presented as an `Authorization` header.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use http_body_util::Full;
use rink_core::{Body, ContentType, Credentials, Form, Part, WireValue, text_of};
use tokio::io::AsyncReadExt;
use tracing::{trace, warn};

use crate::{ClientConfig, Error, Request, Result};

const CREDENTIAL_NAMES: [&str; 5] = ["bearer", "user", "username", "pass", "password"];

/// Encode `request` for hyper.
///
/// # Errors
///
/// - [`Error::File`] when a multipart file cannot be read
/// - [`Error::InvalidRequest`] for header names or values HTTP rejects
pub async fn encode(request: Request, config: &ClientConfig) -> Result<http::Request<Full<Bytes>>> {
    let method = http::Method::from(request.method());
    let url = request.full_url();
    let mut headers: Vec<(String, String)> = request
        .headers()
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    if !has_header(&headers, ACCEPT.as_str()) {
        headers.push((ACCEPT.to_string(), request.response_type().to_string()));
    }
    if let Some(user_agent) = &config.user_agent
        && !has_header(&headers, USER_AGENT.as_str())
    {
        headers.push((USER_AGENT.to_string(), user_agent.clone()));
    }
    if let Some(credentials) = request.credentials()
        && !has_header(&headers, AUTHORIZATION.as_str())
        && let Some(value) = authorization(credentials)
    {
        headers.push((AUTHORIZATION.to_string(), value));
    }

    let content_type = request.content_type().clone();
    let (body_type, body) = encode_body(request.into_body(), &content_type).await?;
    if let Some(body_type) = body_type {
        headers.push((CONTENT_TYPE.to_string(), body_type));
    }

    trace!(%method, %url, headers = headers.len(), body_len = body.len(), "encoded request");

    let mut builder = http::Request::builder().method(method).uri(url.as_str());
    for (name, value) in &headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Full::new(body))
        .map_err(|e| Error::invalid_request(e.to_string()))
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers
        .iter()
        .any(|(header, _)| header.eq_ignore_ascii_case(name))
}

/// `Authorization` value for `credentials`.
///
/// A bearer token wins over user and password.
#[must_use]
pub fn authorization(credentials: &Credentials) -> Option<String> {
    for (name, _) in credentials.iter() {
        if !CREDENTIAL_NAMES.contains(&name) {
            warn!(credential = name, "ignoring credential the transport cannot present");
        }
    }

    if let Some(token) = credentials.bearer() {
        return Some(format!("Bearer {token}"));
    }
    credentials.basic().map(|(user, password)| {
        let encoded = STANDARD.encode(format!("{user}:{}", password.unwrap_or_default()));
        format!("Basic {encoded}")
    })
}

async fn encode_body(body: Body, content_type: &ContentType) -> Result<(Option<String>, Bytes)> {
    let encoded = match body {
        Body::Empty => (None, Bytes::new()),
        Body::Json(object) => (
            Some(ContentType::Json.to_string()),
            rink_core::to_json(&object)?,
        ),
        Body::Raw(payload) => (Some(content_type.to_string()), Bytes::from(payload)),
        Body::Form(fields) => (
            Some(ContentType::FormUrlEncoded.to_string()),
            rink_core::to_form(&fields)?,
        ),
        Body::Multipart(fields) => {
            let (multipart_type, body) = multipart(fields).await?.into_body();
            (Some(multipart_type), body)
        }
    };
    Ok(encoded)
}

async fn multipart(fields: BTreeMap<String, WireValue>) -> Result<Form> {
    let mut form = Form::new();
    for (name, value) in fields {
        let part = match value {
            WireValue::Json(value) => Part::text(name, text_of(&value)),
            WireValue::File(stream) => {
                let file_name = stream.file_name();
                let path = stream.path().to_path_buf();
                let mut file = tokio::fs::File::from_std(stream.into_file());
                let mut data = Vec::new();
                if let Err(source) = file.read_to_end(&mut data).await {
                    return Err(Error::File {
                        parameter: name,
                        path,
                        source,
                    });
                }
                Part::file(name, file_name, data)
            }
        };
        form = form.part(part);
    }
    Ok(form)
}
