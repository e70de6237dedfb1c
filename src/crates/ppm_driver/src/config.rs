use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::model::RequestId;

/// Tunables for the create/delete driver loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Correlation id stamped on create requests.
    pub create_id: RequestId,
    /// Correlation id stamped on delete requests.
    pub delete_id: RequestId,
    /// Correlation id stamped on query requests.
    pub query_id: RequestId,
    /// Pause between receiving a created object's id and deleting it.
    pub cooldown: Duration,
    /// Granularity at which the cooldown checks for cancellation.
    pub poll_interval: Duration,
    /// Range width and height are drawn from.
    pub size_range: Range<u32>,
    /// Range each position coordinate is drawn from.
    pub position_range: Range<u32>,
    /// Optional seed for reproducible placement.
    pub seed: Option<u64>,
    /// Stop after this many create/delete cycles.
    pub max_cycles: Option<u64>,
    /// Append every inbound response line to this file.
    pub transcript_path: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverConfig {
    pub const COOLDOWN_ENV: &'static str = "PPM_DRIVER_COOLDOWN_MS";
    pub const SEED_ENV: &'static str = "PPM_DRIVER_SEED";
    pub const MAX_CYCLES_ENV: &'static str = "PPM_DRIVER_MAX_CYCLES";
    pub const TRANSCRIPT_ENV: &'static str = "PPM_DRIVER_TRANSCRIPT";

    /// Defaults matching the stock plugin: create id 1, delete id 0, 2s cooldown.
    pub fn new() -> Self {
        Self {
            create_id: 1,
            delete_id: 0,
            query_id: 2,
            cooldown: Duration::from_secs(2),
            poll_interval: Duration::from_millis(50),
            size_range: 20..120,
            position_range: 100..900,
            seed: None,
            max_cycles: None,
            transcript_path: None,
        }
    }

    /// Defaults with `PPM_DRIVER_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::new().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparsable values are skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = parse_var::<u64>(&lookup, Self::COOLDOWN_ENV) {
            self.cooldown = Duration::from_millis(ms);
        }
        if let Some(seed) = parse_var::<u64>(&lookup, Self::SEED_ENV) {
            self.seed = Some(seed);
        }
        if let Some(cycles) = parse_var::<u64>(&lookup, Self::MAX_CYCLES_ENV) {
            self.max_cycles = Some(cycles);
        }
        if let Some(path) = lookup(Self::TRANSCRIPT_ENV).filter(|value| !value.is_empty()) {
            self.transcript_path = Some(PathBuf::from(path));
        }
        self
    }

    /// Override the correlation ids used for create and delete requests.
    pub fn with_ids(mut self, create_id: RequestId, delete_id: RequestId) -> Self {
        self.create_id = create_id;
        self.delete_id = delete_id;
        self
    }

    /// Override the correlation id used for query requests.
    pub fn with_query_id(mut self, query_id: RequestId) -> Self {
        self.query_id = query_id;
        self
    }

    /// Override the pause between create and delete.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Override how often the cooldown checks for cancellation.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the range object sizes are drawn from.
    pub fn with_size_range(mut self, range: Range<u32>) -> Self {
        self.size_range = range;
        self
    }

    /// Override the range object positions are drawn from.
    pub fn with_position_range(mut self, range: Range<u32>) -> Self {
        self.position_range = range;
        self
    }

    /// Seed the placement RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Stop after a fixed number of cycles.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Record inbound responses to a file.
    pub fn with_transcript_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.transcript_path = Some(path.into());
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable override");
            None
        }
    }
}
