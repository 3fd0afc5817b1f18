use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use carewatch_core::endpoints;
use carewatch_core::models::assessment::RiskAssessmentRecord;
use carewatch_core::models::patient::{Patient, PatientDraft};
use carewatch_core::models::room::{NewRoom, Room, RoomPatch};
use carewatch_core::{PatientId, RoomId};

use crate::error::{RemoteError, extract_message, format_err_chain};
use crate::store::{BoxFuture, RemoteStore};
use crate::submission::AssessmentSubmission;

/// [`RemoteStore`] over the remote REST API.
///
/// The request timeout applies to every call. A timed out call fails with
/// [`RemoteError::Timeout`] and is not retried.
pub struct HttpStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpStore {
    /// `base_url` is the API root, e.g. `https://clinic.example.org/api/`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let mut base = base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| RemoteError::InvalidUrl(format!("{base}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(RemoteError::InvalidUrl(format!(
                "{base}: scheme must be http or https"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unreachable(format_err_chain(&e)))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint_url(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::InvalidUrl(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, RemoteError> {
        let url = self.endpoint_url(path)?;
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req)
    }

    /// Send the request and return the body of a 2xx response.
    async fn execute(&self, req: RequestBuilder, path: &str) -> Result<String, RemoteError> {
        let resp = req.send().await.map_err(|e| transport_error(&e, path))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| transport_error(&e, path))?;

        if status.is_success() {
            Ok(body)
        } else {
            debug!(path, status = status.as_u16(), "remote rejected request");
            Err(status_error(status, path, &body))
        }
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        path: &str,
        decode: fn(&str, &str) -> Result<Vec<T>, RemoteError>,
    ) -> Result<Vec<T>, RemoteError> {
        debug!(path, "fetching");
        let req = self.request(Method::GET, path)?;
        let body = self.execute(req, path).await?;
        decode(path, &body)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.request(method, path)?.json(body);
        let text = self.execute(req, path).await?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Decode a JSON array record by record. Records that do not match `T` are
/// dropped with a warning instead of failing the whole list.
pub fn decode_list<T: DeserializeOwned>(path: &str, body: &str) -> Result<Vec<T>, RemoteError> {
    let items = decode_array(path, body)?;

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!(path, index, error = %e, "skipping malformed record"),
        }
    }
    Ok(records)
}

/// Decode a JSON array, failing on the first record that does not match
/// `T`. Used where a partial list would be wrong rather than incomplete.
pub fn decode_all<T: DeserializeOwned>(path: &str, body: &str) -> Result<Vec<T>, RemoteError> {
    decode_array(path, body)?
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| RemoteError::Decode {
                path: path.to_string(),
                message: format!("record {index}: {e}"),
            })
        })
        .collect()
}

fn decode_array(path: &str, body: &str) -> Result<Vec<serde_json::Value>, RemoteError> {
    serde_json::from_str(body).map_err(|e| RemoteError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn transport_error(err: &reqwest::Error, path: &str) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout {
            path: path.to_string(),
        }
    } else {
        RemoteError::Unreachable(format_err_chain(err))
    }
}

fn status_error(status: StatusCode, path: &str, body: &str) -> RemoteError {
    let path = path.to_string();
    match status {
        StatusCode::NOT_FOUND => RemoteError::NotFound { path },
        StatusCode::CONFLICT => RemoteError::Conflict {
            path,
            message: extract_message(body),
        },
        _ => RemoteError::Status {
            status: status.as_u16(),
            path,
            message: extract_message(body),
        },
    }
}

impl RemoteStore for HttpStore {
    fn fetch_patients(&self) -> BoxFuture<'_, Result<Vec<Patient>, RemoteError>> {
        Box::pin(self.fetch_list(endpoints::PATIENTS, decode_list::<Patient>))
    }

    /// Occupancy checks need every room, so one undecodable room fails the
    /// whole fetch.
    fn fetch_rooms(&self) -> BoxFuture<'_, Result<Vec<Room>, RemoteError>> {
        Box::pin(self.fetch_list(endpoints::ROOMS, decode_all::<Room>))
    }

    fn fetch_assessments(&self) -> BoxFuture<'_, Result<Vec<RiskAssessmentRecord>, RemoteError>> {
        Box::pin(self.fetch_list(
            endpoints::RISK_ASSESSMENT_HISTORY,
            decode_list::<RiskAssessmentRecord>,
        ))
    }

    fn create_patient<'a>(
        &'a self,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>> {
        Box::pin(self.send_json(Method::POST, endpoints::PATIENTS, draft))
    }

    fn update_patient<'a>(
        &'a self,
        id: &'a PatientId,
        draft: &'a PatientDraft,
    ) -> BoxFuture<'a, Result<Patient, RemoteError>> {
        Box::pin(async move {
            let path = endpoints::patient(id);
            self.send_json(Method::PUT, &path, draft).await
        })
    }

    fn delete_patient<'a>(&'a self, id: &'a PatientId) -> BoxFuture<'a, Result<(), RemoteError>> {
        Box::pin(async move {
            let path = endpoints::patient(id);
            let req = self.request(Method::DELETE, &path)?;
            self.execute(req, &path).await?;
            Ok(())
        })
    }

    fn patch_room<'a>(
        &'a self,
        id: &'a RoomId,
        patch: &'a RoomPatch,
    ) -> BoxFuture<'a, Result<Room, RemoteError>> {
        Box::pin(async move {
            let path = endpoints::room(id);
            self.send_json(Method::PATCH, &path, patch).await
        })
    }

    fn create_room<'a>(&'a self, room: &'a NewRoom) -> BoxFuture<'a, Result<Room, RemoteError>> {
        Box::pin(self.send_json(Method::POST, endpoints::ROOMS, room))
    }

    fn submit_assessment<'a>(
        &'a self,
        submission: &'a AssessmentSubmission,
    ) -> BoxFuture<'a, Result<RiskAssessmentRecord, RemoteError>> {
        Box::pin(self.send_json(Method::POST, endpoints::RISK_ASSESSMENT, submission))
    }
}
