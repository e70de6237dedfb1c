use serde::{Serialize, Serializer};

/// Correlation id linking a request to the response the server sends back.
pub type RequestId = u64;

/// Identifier the object server assigns to a created object.
pub type ObjectId = u64;

/// Plain 2D vector in server world units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Vector2 {
    #[serde(serialize_with = "whole_or_fraction")]
    pub x: f64,
    #[serde(serialize_with = "whole_or_fraction")]
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box anchored at its top-left `position`.
///
/// Width and height are not validated; the server decides what to do with
/// degenerate or negative extents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Volume {
    pub position: Vector2,
    #[serde(serialize_with = "whole_or_fraction")]
    pub width: f64,
    #[serde(serialize_with = "whole_or_fraction")]
    pub height: f64,
}

impl Volume {
    pub fn new(position: Vector2, width: f64, height: f64) -> Self {
        Self {
            position,
            width,
            height,
        }
    }
}

/// How the server should move an object. Exactly one variant is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhysicsOptions {
    /// Steer the object towards a fixed point.
    Destination { target: Vector2 },
    /// Move the object with a constant velocity.
    Velocity { vector: Vector2 },
}

// Externally tagged on the wire: `{"Destination": {"x": .., "y": ..}}`.
impl Serialize for PhysicsOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PhysicsOptions::Destination { target } => {
                serializer.serialize_newtype_variant("PhysicsOptions", 0, "Destination", target)
            }
            PhysicsOptions::Velocity { vector } => {
                serializer.serialize_newtype_variant("PhysicsOptions", 1, "Velocity", vector)
            }
        }
    }
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        PhysicsOptions::Destination {
            target: Vector2::default(),
        }
    }
}

/// Client-side description of a simulated entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ManagedObject {
    #[serde(rename = "Volume")]
    pub volume: Volume,
    #[serde(rename = "PhysicsOptions")]
    pub physics: PhysicsOptions,
}

impl ManagedObject {
    pub fn new(volume: Volume, physics: PhysicsOptions) -> Self {
        Self { volume, physics }
    }

    /// Object that travels towards its own current position (i.e. stays put).
    pub fn anchored(volume: Volume) -> Self {
        Self {
            volume,
            physics: PhysicsOptions::Destination {
                target: volume.position,
            },
        }
    }
}

/// Outbound request understood by the object server.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    CreateObject { id: RequestId, object: ManagedObject },
    DeleteObject { id: RequestId, object_id: ObjectId },
    QueryObject { id: RequestId, object_id: ObjectId },
}

impl Action {
    /// Correlation id carried by the request.
    pub fn id(&self) -> RequestId {
        match self {
            Action::CreateObject { id, .. }
            | Action::DeleteObject { id, .. }
            | Action::QueryObject { id, .. } => *id,
        }
    }

    /// RPC method name the server dispatches on.
    pub fn method(&self) -> &'static str {
        match self {
            Action::CreateObject { .. } => "Server.CreateObject",
            Action::DeleteObject { .. } => "Server.DeleteObject",
            Action::QueryObject { .. } => "Server.QueryObject",
        }
    }
}

/// Largest magnitude below which every whole `f64` is an exact integer.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// Whole coordinates go out as JSON integers (`500`, not `500.0`).
fn whole_or_fraction<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_physics_targets_origin() {
        assert_eq!(
            PhysicsOptions::default(),
            PhysicsOptions::Destination {
                target: Vector2::new(0.0, 0.0)
            }
        );
    }

    #[test]
    fn anchored_object_targets_its_position() {
        let volume = Volume::new(Vector2::new(300.0, 410.0), 40.0, 60.0);
        let object = ManagedObject::anchored(volume);
        assert_eq!(
            object.physics,
            PhysicsOptions::Destination {
                target: Vector2::new(300.0, 410.0)
            }
        );
    }

    #[test]
    fn whole_numbers_serialize_as_integers() {
        let volume = Volume::new(Vector2::new(425.0, -3.5), 150.0, 0.25);
        assert_eq!(
            serde_json::to_string(&volume).unwrap(),
            r#"{"Position":{"x":425,"y":-3.5},"Width":150,"Height":0.25}"#
        );
    }

    #[test]
    fn physics_options_are_externally_tagged() {
        let velocity = PhysicsOptions::Velocity {
            vector: Vector2::new(1.0, 0.5),
        };
        assert_eq!(
            serde_json::to_string(&velocity).unwrap(),
            r#"{"Velocity":{"x":1,"y":0.5}}"#
        );
    }

    #[test]
    fn actions_report_method_and_id() {
        let create = Action::CreateObject {
            id: 1,
            object: ManagedObject::default(),
        };
        let delete = Action::DeleteObject {
            id: 0,
            object_id: 9,
        };
        let query = Action::QueryObject {
            id: 2,
            object_id: 9,
        };

        assert_eq!(create.method(), "Server.CreateObject");
        assert_eq!(delete.method(), "Server.DeleteObject");
        assert_eq!(query.method(), "Server.QueryObject");
        assert_eq!((create.id(), delete.id(), query.id()), (1, 0, 2));
    }
}
