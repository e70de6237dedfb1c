use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{ManagedObject, PhysicsOptions, Vector2};

/// Draws fresh placements for the object the driver keeps recycling.
#[derive(Debug)]
pub struct ObjectRandomizer {
    rng: StdRng,
    size_range: Range<u32>,
    position_range: Range<u32>,
}

impl ObjectRandomizer {
    /// Seeded when `seed` is given, otherwise seeded from OS entropy.
    pub fn new(seed: Option<u64>, size_range: Range<u32>, position_range: Range<u32>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            size_range,
            position_range,
        }
    }

    /// Re-roll size and position in place and aim the object at its new position.
    pub fn randomize(&mut self, object: &mut ManagedObject) {
        let width = self.draw(self.size_range.clone());
        let height = self.draw(self.size_range.clone());
        let position = Vector2::new(
            self.draw(self.position_range.clone()),
            self.draw(self.position_range.clone()),
        );

        object.volume.width = width;
        object.volume.height = height;
        object.volume.position = position;
        object.physics = PhysicsOptions::Destination { target: position };
    }

    // Empty ranges collapse to their start instead of panicking in gen_range.
    fn draw(&mut self, range: Range<u32>) -> f64 {
        if range.is_empty() {
            return f64::from(range.start);
        }
        f64::from(self.rng.gen_range(range))
    }
}
