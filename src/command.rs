//! Commands other windows send to a manager as JSON.
//!
//! ```json
//! { "method": "openWindow", "params": { "link": "https://example.test", "name": "report" } }
//! { "method": "popThisWindowFromParent", "params": { "childWindowName": "report" } }
//! { "method": "recursivelyCloseChildren", "params": { "id": 0 } }
//! ```
//!
//! Parameters are checked before anything runs, so a rejected command never
//! leaves a manager half-updated.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::host::WindowId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerCommand {
    OpenWindow { link: String, name: Option<String> },
    PopChild { name: String },
    RecursivelyClose { depth: u32 },
}

/// What a dispatched command produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// `openWindow` result; `None` when the host declined or the restore
    /// attempt was discarded.
    Opened(Option<WindowId>),
    Done,
}

#[derive(Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct OpenWindowParams {
    link: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopChildParams {
    child_window_name: String,
}

#[derive(Deserialize)]
struct RecursivelyCloseParams {
    #[serde(default)]
    id: u32,
}

impl ManagerCommand {
    pub fn from_value(value: &Value) -> Result<Self> {
        let envelope: Envelope = serde_json::from_value(value.clone())
            .map_err(|e| Error::contract(format!("malformed command: {}", e)))?;

        match envelope.method.as_str() {
            "openWindow" => {
                let params: OpenWindowParams = parse_params(
                    &envelope,
                    "link as a string and name as a string or null",
                )?;
                Ok(ManagerCommand::OpenWindow {
                    link: params.link,
                    name: params.name,
                })
            }
            "popThisWindowFromParent" => {
                let params: PopChildParams =
                    parse_params(&envelope, "childWindowName as a string")?;
                Ok(ManagerCommand::PopChild {
                    name: params.child_window_name,
                })
            }
            "recursivelyCloseChildren" => {
                let params: RecursivelyCloseParams =
                    parse_params(&envelope, "id as a non-negative integer")?;
                Ok(ManagerCommand::RecursivelyClose { depth: params.id })
            }
            "newUnloadCallback" => Err(Error::contract(
                "newUnloadCallback requires a callable and cannot be sent as data",
            )),
            other => Err(Error::contract(format!("unknown method {:?}", other))),
        }
    }
}

fn parse_params<T: DeserializeOwned>(envelope: &Envelope, expected: &str) -> Result<T> {
    let raw = match &envelope.params {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(raw).map_err(|e| {
        Error::contract(format!("{} requires {}: {}", envelope.method, expected, e))
    })
}
