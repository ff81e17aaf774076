use bollard::models::ContainerSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    pub db_type: Option<String>,
    pub port: Option<PortValue>,
    pub password: Option<String>,
}

/// The page posts the raw `<input type="number">` value, which arrives as a
/// string; API clients usually send a number.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    pub fn to_port(&self) -> Option<u16> {
        let raw = match self {
            PortValue::Number(n) => *n,
            PortValue::Text(s) => s.trim().parse::<i64>().ok()?,
        };
        u16::try_from(raw).ok().filter(|port| *port != 0)
    }
}

#[derive(Debug, Deserialize)]
pub struct StopRequest {
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Messages pushed to browsers over `/ws`.
#[derive(Serialize, Clone, Debug)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "status-update")]
    StatusUpdate(Vec<ContainerSummary>),
}
