use crate::cookie::TokenProvider;
use crate::form::VehicleForm;
use crate::types::LookupRequest;
use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, error, info};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use url::Url;

pub const LOOKUP_PATH: &str = "/api/v1/vehicles/get-by-plate/";
pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, Fail)]
pub enum LookupError {
    #[fail(display = "lookup request failed: {}", _0)]
    Transport(String),
    #[fail(display = "lookup response is not JSON: {}", _0)]
    Decode(String),
}

/// Sends one lookup. The call itself happens when `post` is invoked; the
/// returned future only resolves it.
pub trait LookupTransport: Send + Sync {
    fn post(
        &self,
        request: &LookupRequest,
        token: Option<String>,
    ) -> BoxFuture<'static, Result<Value, LookupError>>;
}

/// Full-page navigation on the host side.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str);
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(base: &Url) -> Result<HttpTransport, url::ParseError> {
        Ok(HttpTransport {
            client: reqwest::Client::new(),
            endpoint: base.join(LOOKUP_PATH)?,
        })
    }
}

impl LookupTransport for HttpTransport {
    fn post(
        &self,
        request: &LookupRequest,
        token: Option<String>,
    ) -> BoxFuture<'static, Result<Value, LookupError>> {
        // A missing token still goes out, as an empty header.
        let send = self
            .client
            .post(self.endpoint.clone())
            .header(CSRF_HEADER, token.unwrap_or_default())
            .json(&request.to_json())
            .send();
        async move {
            let response = send
                .await
                .map_err(|e| LookupError::Transport(e.to_string()))?;
            // Status is not checked; error bodies simply carry no admin_url.
            let body = response
                .bytes()
                .await
                .map_err(|e| LookupError::Transport(e.to_string()))?;
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode(e.to_string()))
        }
        .boxed()
    }
}

/// Remembers every destination instead of leaving the page. Terminal mode
/// reports the last one.
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        match self.visited.lock() {
            Ok(visited) => visited.clone(),
            Err(_) => vec![],
        }
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, url: &str) {
        info!("Navigating to {}", url);
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(url.to_string());
        }
    }
}

/// Looks the plate up when its field loses focus and jumps to the matching
/// vehicle's admin page.
pub struct LookupTrigger {
    form: VehicleForm,
    tokens: Arc<dyn TokenProvider>,
    transport: Arc<dyn LookupTransport>,
    navigator: Arc<dyn Navigator>,
}

impl LookupTrigger {
    /// Returns `None` when the form has no plate input; nothing is bound.
    pub fn bind(
        form: VehicleForm,
        tokens: Arc<dyn TokenProvider>,
        transport: Arc<dyn LookupTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> Option<LookupTrigger> {
        if form.license_plate.is_none() {
            debug!("No license plate field, lookup not bound");
            return None;
        }
        Some(LookupTrigger {
            form,
            tokens,
            transport,
            navigator,
        })
    }

    pub fn request(&self) -> Option<LookupRequest> {
        Some(LookupRequest {
            license_plate: self.form.plate()?,
            vehicle_type: self.form.vehicle_type_id(),
            owner: self.form.owner_id(),
        })
    }

    /// Issues the lookup and spawns its resolution. Blank plates issue
    /// nothing. Concurrent lookups are neither deduplicated nor cancelled,
    /// so every matching response navigates in the order it resolves.
    pub fn on_blur(&self) -> Option<JoinHandle<()>> {
        let request = self.request()?;
        info!("Looking up plate {}", request.license_plate);
        let response = self.transport.post(&request, self.tokens.token());
        let navigator = self.navigator.clone();
        Some(tokio::spawn(async move {
            match response.await {
                Ok(value) => match admin_url(&value) {
                    Some(url) => navigator.navigate(url),
                    None => debug!("No vehicle found for plate {}", request.license_plate),
                },
                Err(e) => error!("Error looking up vehicle: {}", e),
            }
        }))
    }
}

fn admin_url(value: &Value) -> Option<&str> {
    value["admin_url"].as_str().filter(|url| !url.is_empty())
}
