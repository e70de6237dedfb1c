use ppm_driver::codec::{decode_object, encode_action, encode_object};
use ppm_driver::{Action, ManagedObject, PhysicsOptions, Vector2, Volume};
use proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = f64> {
    -1.0e6..1.0e6f64
}

fn vector() -> impl Strategy<Value = Vector2> {
    (coordinate(), coordinate()).prop_map(|(x, y)| Vector2::new(x, y))
}

fn volume() -> impl Strategy<Value = Volume> {
    (vector(), 0.0..1.0e4f64, 0.0..1.0e4f64)
        .prop_map(|(position, width, height)| Volume::new(position, width, height))
}

fn physics() -> impl Strategy<Value = PhysicsOptions> {
    prop_oneof![
        vector().prop_map(|target| PhysicsOptions::Destination { target }),
        vector().prop_map(|vector| PhysicsOptions::Velocity { vector }),
    ]
}

fn object() -> impl Strategy<Value = ManagedObject> {
    (volume(), physics()).prop_map(|(volume, physics)| ManagedObject::new(volume, physics))
}

// Whole units keep the text round trip exact regardless of float parsing.
fn whole_unit_object() -> impl Strategy<Value = ManagedObject> {
    (-10_000i32..10_000, -10_000i32..10_000, 0u32..1_000, 0u32..1_000, any::<bool>()).prop_map(
        |(x, y, width, height, moving)| {
            let position = Vector2::new(f64::from(x), f64::from(y));
            let physics = if moving {
                PhysicsOptions::Velocity { vector: position }
            } else {
                PhysicsOptions::Destination { target: position }
            };
            ManagedObject::new(
                Volume::new(position, f64::from(width), f64::from(height)),
                physics,
            )
        },
    )
}

proptest! {
    #[test]
    fn objects_survive_encode_then_decode(object in object()) {
        let decoded = decode_object(&encode_object(&object)).unwrap();
        prop_assert_eq!(decoded, object);
    }

    #[test]
    fn whole_unit_objects_survive_the_text_wire(object in whole_unit_object()) {
        let text = serde_json::to_string(&encode_object(&object)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        prop_assert_eq!(decode_object(&parsed).unwrap(), object);
    }

    #[test]
    fn encoding_is_deterministic(object in object(), id in any::<u64>()) {
        let action = Action::CreateObject { id, object };
        prop_assert_eq!(encode_action(&action), encode_action(&action));
    }
}
