use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type DeviceId = String;

/// An outage as reported by the service. Timestamps are kept as the text the
/// service sent so that submitted records echo them unchanged.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Outage {
    pub id: DeviceId,
    pub begin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    // Fields this client does not know about are passed through on submit.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Outage {
    pub fn new<I, B, E>(id: I, begin: B, end: E) -> Self
    where
        I: Into<String>,
        B: Into<String>,
        E: Into<String>,
    {
        Outage {
            id: id.into(),
            begin: begin.into(),
            end: Some(end.into()),
            extra: Map::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: String,
}

impl Device {
    pub fn new<I, N>(id: I, name: N) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Device {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct SiteInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// An outage annotated with the name of the device it belongs to. Serialized
/// flat, i.e. `{"id", "begin", "end", ..., "name"}`. The device name replaces
/// any `name` the service sent with the outage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SiteOutage {
    #[serde(flatten)]
    pub outage: Outage,
    pub name: String,
}

impl SiteOutage {
    pub fn new(mut outage: Outage, name: impl Into<String>) -> Self {
        outage.extra.remove("name");
        SiteOutage {
            outage,
            name: name.into(),
        }
    }
}
