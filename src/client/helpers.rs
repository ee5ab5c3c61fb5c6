//! GET, POST and multipart POST on top of [`Call::send`].

use super::request::{Headers, RequestBody};
use super::session::{Call, HttpClient};
use crate::error::{ClientError, Result};
use crate::protocol::constants::{content_types, FILE_MARKER};
use crate::protocol::{add_params, collect_params, encode_params, has_file_param, Params};
use http::header::CONTENT_TYPE;
use http::Method;
use reqwest::multipart::{Form, Part};
use std::path::Path;

impl Call {
    /// `GET url` with `params` appended to the query string.
    pub async fn get<I, K, V>(self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let url = add_params(url, &collect_params(params))?;
        self.send(Method::GET, &url, &Headers::new(), RequestBody::Empty)
            .await
    }

    /// `POST url` with `params` as the body.
    ///
    /// If any key starts with `@` the request goes out as
    /// [`post_multipart`](Call::post_multipart); otherwise the body is
    /// `application/x-www-form-urlencoded`.
    pub async fn post<I, K, V>(self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = collect_params(params);
        if has_file_param(&params) {
            return self.send_multipart(url, &params).await;
        }

        let body = encode_params(&params)?;
        let headers = Headers::from([(
            CONTENT_TYPE.as_str().to_string(),
            content_types::FORM_URLENCODED.to_string(),
        )]);
        self.send(Method::POST, url, &headers, body).await
    }

    /// `POST url` as `multipart/form-data`.
    ///
    /// A key `@name` uploads the file at its value as part `name`, with the
    /// path's base name as file name. Other keys become text fields.
    pub async fn post_multipart<I, K, V>(self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let params = collect_params(params);
        self.send_multipart(url, &params).await
    }

    async fn send_multipart(self, url: &str, params: &Params) -> Result<reqwest::Response> {
        let form = multipart_form(params).await?;
        self.send(Method::POST, url, &Headers::new(), form).await
    }
}

impl HttpClient {
    /// `GET` with no one-time overrides. See [`Call::get`].
    pub async fn get<I, K, V>(&self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.call().get(url, params).await
    }

    /// `POST` with no one-time overrides. See [`Call::post`].
    pub async fn post<I, K, V>(&self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.call().post(url, params).await
    }

    /// Multipart `POST` with no one-time overrides. See [`Call::post_multipart`].
    pub async fn post_multipart<I, K, V>(&self, url: &str, params: I) -> Result<reqwest::Response>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.call().post_multipart(url, params).await
    }
}

pub(crate) async fn multipart_form(params: &Params) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in params {
        form = match key.strip_prefix(FILE_MARKER) {
            Some(name) => form.part(name.to_string(), file_part(value).await?),
            None => form.text(key.clone(), value.clone()),
        };
    }
    Ok(form)
}

async fn file_part(path: &str) -> Result<Part> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|source| ClientError::FileAccess {
            path: path.into(),
            source,
        })?;
    let len = file.metadata().await?.len();

    let file_name = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    tracing::trace!(path, bytes = len, "streaming multipart file");

    // Streamed with a known length so the form keeps a Content-Length.
    Ok(Part::stream_with_length(reqwest::Body::from(file), len)
        .file_name(file_name)
        .mime_str(content_types::OCTET_STREAM)?)
}
