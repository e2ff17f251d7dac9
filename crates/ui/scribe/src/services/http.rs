//! HTTP implementation of [`FormService`].
//!
//! Endpoints, relative to the configured base URL:
//! - `GET  posts/1`: source record the field configuration is derived from
//! - `POST posts`:   submit and autosave, JSON body is the value snapshot

use std::time::Duration;

use async_trait::async_trait;
use form_engine::{FieldDescriptor, FormService, FormValues, ServiceError, SubmitReceipt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

pub const CONFIG_PATH: &str = "posts/1";
pub const SUBMIT_PATH: &str = "posts";

/// Record the field configuration is built from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Post {
    pub title: String,
    pub body: String,
}

/// Field configuration derived from a fetched [`Post`]: the name field takes
/// its label from the title and its description from the body.
pub fn build_descriptors(post: &Post) -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::text("name_8066616423", post.title.clone())
            .required(true)
            .placeholder("Enter your name")
            .description(post.body.clone()),
        FieldDescriptor::number("age_12345", "Age")
            .required(true)
            .placeholder("Enter your age"),
        FieldDescriptor::checkbox("terms_001", "Agree to terms")
            .required(true)
            .checked(false),
    ]
}

#[derive(Debug, Clone)]
pub struct HttpFormService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFormService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_values<T: DeserializeOwned>(
        &self,
        values: &FormValues,
    ) -> Result<T, ServiceError> {
        let response = self
            .client
            .post(self.endpoint(SUBMIT_PATH))
            .json(values)
            .send()
            .await
            .map_err(map_transport)?;
        decode(response).await
    }
}

#[async_trait]
impl FormService for HttpFormService {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn fetch_field_config(&self) -> Result<Vec<FieldDescriptor>, ServiceError> {
        let response = self
            .client
            .get(self.endpoint(CONFIG_PATH))
            .send()
            .await
            .map_err(map_transport)?;
        let post: Post = decode(response).await?;
        debug!(title = %post.title, "field configuration fetched");
        Ok(build_descriptors(&post))
    }

    #[instrument(skip_all, fields(fields = values.len()))]
    async fn submit_form(&self, values: FormValues) -> Result<SubmitReceipt, ServiceError> {
        self.post_values(&values).await
    }

    #[instrument(skip_all, fields(fields = values.len()))]
    async fn autosave(&self, values: FormValues) -> Result<FormValues, ServiceError> {
        self.post_values(&values).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ServiceError::Status {
            code: status.as_u16(),
        });
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

fn map_transport(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Unavailable(format!("request timed out: {err}"))
    } else if err.is_connect() {
        ServiceError::Unavailable(err.to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}
