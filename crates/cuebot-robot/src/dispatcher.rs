//! Transport to the actuator controller.

use std::future::Future;
use std::time::Duration;

use cuebot_core::{DeviceConfig, MotionCommand, StrikeCommand};
use reqwest::{Client, Url};

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid device endpoint: {0}")]
    Endpoint(String),
}

/// Destination for motion and strike commands.
///
/// Implementations return the device's plain-text acknowledgment.
pub trait CommandSink: Send + Sync + 'static {
    fn send_move(
        &self,
        cmd: MotionCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send;

    fn send_strike(
        &self,
        cmd: StrikeCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send;
}

/// HTTP GET client for the stepper firmware.
#[derive(Clone, Debug)]
pub struct HttpDispatcher {
    client: Client,
    base: Url,
}

impl HttpDispatcher {
    pub fn new(device: &DeviceConfig) -> Result<Self, DispatchError> {
        let base = parse_endpoint(&device.address)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(device.timeout_ms))
            .build()?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `/control?stepsX=..&speedX=..&stepsY=..&speedY=..&stepsZ=..&speedZ=..`
    pub fn control_url(&self, cmd: &MotionCommand) -> Url {
        let mut url = self.base.clone();
        url.set_path("/control");
        url.query_pairs_mut()
            .clear()
            .append_pair("stepsX", &cmd.steps_x.to_string())
            .append_pair("speedX", &cmd.speed_x.to_string())
            .append_pair("stepsY", &cmd.steps_y.to_string())
            .append_pair("speedY", &cmd.speed_y.to_string())
            .append_pair("stepsZ", &cmd.steps_z.to_string())
            .append_pair("speedZ", &cmd.speed_z.to_string());
        url
    }

    /// `/strike?chargeDuration=..`
    pub fn strike_url(&self, cmd: &StrikeCommand) -> Url {
        let mut url = self.base.clone();
        url.set_path("/strike");
        url.query_pairs_mut()
            .clear()
            .append_pair("chargeDuration", &cmd.charge_duration_ms.to_string());
        url
    }

    async fn get_text(client: Client, url: Url) -> Result<String, DispatchError> {
        log::debug!("GET {url}");
        let resp = client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

impl CommandSink for HttpDispatcher {
    fn send_move(
        &self,
        cmd: MotionCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send {
        Self::get_text(self.client.clone(), self.control_url(&cmd))
    }

    fn send_strike(
        &self,
        cmd: StrikeCommand,
    ) -> impl Future<Output = Result<String, DispatchError>> + Send {
        Self::get_text(self.client.clone(), self.strike_url(&cmd))
    }
}

/// Accepts a bare `host[:port]` or a full `http(s)://` URL.
fn parse_endpoint(address: &str) -> Result<Url, DispatchError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DispatchError::Endpoint("empty address".to_string()));
    }
    let raw = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{address}")
    };
    let url = Url::parse(&raw).map_err(|e| DispatchError::Endpoint(format!("{address}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(DispatchError::Endpoint(format!(
            "{address}: expected an http host"
        )));
    }
    Ok(url)
}
