//! JSON shapes exchanged with the object server.
//!
//! Encoding is total: every model value maps to a JSON object through its
//! `Serialize` impl, with whole numbers written as JSON integers. Decoding walks
//! an already-parsed [`Value`] and reports the first missing or mistyped key.
//! Actions are only ever encoded, responses only ever decoded.

use serde_json::{json, Map, Value};

use crate::error::CodecError;
use crate::model::{Action, ManagedObject, PhysicsOptions, RequestId, Vector2, Volume};

pub fn encode_vector2(v: &Vector2) -> Value {
    json!(v)
}

pub fn encode_volume(volume: &Volume) -> Value {
    json!(volume)
}

pub fn encode_physics_options(physics: &PhysicsOptions) -> Value {
    json!(physics)
}

pub fn encode_object(object: &ManagedObject) -> Value {
    json!(object)
}

/// Fields shared by every request: the correlation id and the method name.
pub fn encode_action_header(action: &Action) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("id".to_string(), json!(action.id()));
    map.insert("method".to_string(), json!(action.method()));
    map
}

/// Full request object, `params` always being a one-element array.
pub fn encode_action(action: &Action) -> Value {
    let mut map = encode_action_header(action);
    let param = match action {
        Action::CreateObject { object, .. } => encode_object(object),
        Action::DeleteObject { object_id, .. } | Action::QueryObject { object_id, .. } => {
            json!(object_id)
        }
    };
    map.insert("params".to_string(), Value::Array(vec![param]));
    Value::Object(map)
}

/// Serialize an action as one newline-terminated line, ready for a single write.
pub fn encode_line(action: &Action) -> Result<Vec<u8>, CodecError> {
    let mut line = serde_json::to_vec(&encode_action(action))?;
    line.push(b'\n');
    Ok(line)
}

fn field<'a>(json: &'a Value, name: &'static str) -> Result<&'a Value, CodecError> {
    json.get(name).ok_or(CodecError::MissingField(name))
}

fn number(json: &Value, name: &'static str) -> Result<f64, CodecError> {
    field(json, name)?
        .as_f64()
        .ok_or(CodecError::InvalidField {
            field: name,
            expected: "a number",
        })
}

pub fn decode_vector2(json: &Value) -> Result<Vector2, CodecError> {
    Ok(Vector2 {
        x: number(json, "x")?,
        y: number(json, "y")?,
    })
}

pub fn decode_volume(json: &Value) -> Result<Volume, CodecError> {
    Ok(Volume {
        position: decode_vector2(field(json, "Position")?)?,
        width: number(json, "Width")?,
        height: number(json, "Height")?,
    })
}

/// `Velocity` wins when a payload carries both keys.
pub fn decode_physics_options(json: &Value) -> Result<PhysicsOptions, CodecError> {
    if let Some(vector) = json.get("Velocity") {
        return Ok(PhysicsOptions::Velocity {
            vector: decode_vector2(vector)?,
        });
    }
    if let Some(target) = json.get("Destination") {
        return Ok(PhysicsOptions::Destination {
            target: decode_vector2(target)?,
        });
    }
    Err(CodecError::UnknownVariant)
}

pub fn decode_object(json: &Value) -> Result<ManagedObject, CodecError> {
    Ok(ManagedObject {
        volume: decode_volume(field(json, "Volume")?)?,
        physics: decode_physics_options(field(json, "PhysicsOptions")?)?,
    })
}

/// Payload of a server reply.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Result(Value),
    Error(Value),
}

/// One inbound line: `{"id": n, "result": v}` or `{"id": n, "error": v}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: Option<RequestId>,
    pub body: ResponseBody,
}

impl Response {
    /// Parse a single raw response line. `result` takes precedence over `error`.
    ///
    /// Bytes that are not UTF-8 fail like any other malformed JSON.
    pub fn parse(line: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let json: Value = serde_json::from_slice(line.as_ref())?;
        let Value::Object(mut map) = json else {
            return Err(CodecError::InvalidField {
                field: "response",
                expected: "a JSON object",
            });
        };

        let id = map.get("id").and_then(Value::as_u64);
        let body = match (map.remove("result"), map.remove("error")) {
            (Some(result), _) => ResponseBody::Result(result),
            (None, Some(error)) => ResponseBody::Error(error),
            (None, None) => return Err(CodecError::MissingField("result")),
        };

        Ok(Self { id, body })
    }
}
