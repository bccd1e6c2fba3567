//! Request/response client for modular device controllers.
//!
//! Wire format, one message per line:
//!
//! ```text
//! → ["moveBy",0,12.5]
//! ← {"id":"moveBy","result":null}
//! → ["getPositions"]
//! ← {"id":"getPositions","result":[316.0,0.0]}
//! → ["moveTo",0]
//! ← {"id":"moveTo","error":{"message":"Invalid params","code":-32602}}
//! ```

use nozzle_common::actuator::ActuatorError;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::{BufRead, Write};
use tracing::trace;

/// Upper bound on blank lines skipped while waiting for a reply.
const MAX_BLANK_LINES: usize = 16;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<DeviceErrorBody>,
}

#[derive(Debug, Deserialize)]
struct DeviceErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: i64,
}

/// Blocking JSON client over a split reader/writer pair.
pub struct ModularClient<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> ModularClient<R, W> {
    /// Wrap an already-open transport.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::with_capacity(256),
        }
    }

    /// Invoke `method` with positional `args` and return the `result` field.
    ///
    /// # Errors
    /// - `CommunicationError` on I/O failure or end of stream.
    /// - `ProtocolError` if the reply is not a JSON response object.
    /// - `DeviceError` if the device replied with an `error` object.
    pub fn call(&mut self, method: &str, args: &[Value]) -> Result<Value, ActuatorError> {
        let mut request = Vec::with_capacity(args.len() + 1);
        request.push(Value::from(method));
        request.extend_from_slice(args);
        let request = Value::Array(request);

        trace!("→ {}", request);
        serde_json::to_writer(&mut self.writer, &request).map_err(|e| comm(method, e))?;
        self.writer.write_all(b"\n").map_err(|e| comm(method, e))?;
        self.writer.flush().map_err(|e| comm(method, e))?;

        let reply = self.read_reply(method)?;
        trace!("← {}", reply);

        let response: Response =
            serde_json::from_str(reply).map_err(|e| ActuatorError::ProtocolError {
                method: method.to_string(),
                detail: format!("malformed reply {reply:?}: {e}"),
            })?;

        if let Some(error) = response.error {
            return Err(ActuatorError::DeviceError {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    fn read_reply(&mut self, method: &str) -> Result<&str, ActuatorError> {
        for _ in 0..MAX_BLANK_LINES {
            self.line.clear();
            let n = self
                .reader
                .read_line(&mut self.line)
                .map_err(|e| comm(method, e))?;
            if n == 0 {
                return Err(ActuatorError::CommunicationError(format!(
                    "connection closed while waiting for '{method}' reply"
                )));
            }
            if !self.line.trim().is_empty() {
                return Ok(self.line.trim());
            }
        }
        Err(ActuatorError::ProtocolError {
            method: method.to_string(),
            detail: "no reply, only blank lines".to_string(),
        })
    }

    /// Set a device property, e.g. `velocityMax`.
    pub fn set_property(&mut self, property: &str, value: f64) -> Result<(), ActuatorError> {
        self.call(property, &[json!("setValue"), json!([value])])
            .map(|_| ())
    }

    /// Absolute move of one axis.
    pub fn move_to(&mut self, axis: usize, angle: f64) -> Result<(), ActuatorError> {
        self.call("moveTo", &[json!(axis), json!(angle)]).map(|_| ())
    }

    /// Relative move of one axis.
    pub fn move_by(&mut self, axis: usize, delta: f64) -> Result<(), ActuatorError> {
        self.call("moveBy", &[json!(axis), json!(delta)]).map(|_| ())
    }

    /// Current position of every axis.
    pub fn get_positions(&mut self) -> Result<Vec<f64>, ActuatorError> {
        let result = self.call("getPositions", &[])?;
        serde_json::from_value(result.clone()).map_err(|_| ActuatorError::ProtocolError {
            method: "getPositions".to_string(),
            detail: format!("expected an array of numbers, got {result}"),
        })
    }

    /// Flush pending output and return the transport.
    pub fn into_parts(mut self) -> Result<(R, W), ActuatorError> {
        self.writer.flush().map_err(|e| comm("close", e))?;
        Ok((self.reader, self.writer))
    }
}

fn comm(method: &str, e: impl std::fmt::Display) -> ActuatorError {
    ActuatorError::CommunicationError(format!("'{method}': {e}"))
}
