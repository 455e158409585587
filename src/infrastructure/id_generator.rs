// ID Generator - Snowflake-like IDs with embedded shard information

use std::sync::Mutex;

const MAX_SHARDS: u16 = 1024;
const SEQUENCE_MASK: u64 = 0xFFF;

/// 64-bit ID format: [timestamp:42][shard_id:10][sequence:12]
/// This allows for 1024 shards and 4096 IDs per millisecond per shard.
/// IDs from one generator are strictly increasing, which the follower
/// pagination and comment tie-breaking rely on.
#[derive(Debug)]
pub struct IdGenerator {
    shard_id: u16,
    // (last timestamp used, next sequence within that millisecond)
    state: Mutex<(u64, u64)>,
}

impl IdGenerator {
    /// Create new ID generator for given shard
    pub fn new(shard_id: u16) -> Self {
        assert!(shard_id < MAX_SHARDS, "Shard ID must be less than 1024");

        Self {
            shard_id,
            state: Mutex::new((0, 0)),
        }
    }

    /// Generate next unique ID with embedded shard information
    pub fn next_id(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (last_ts, next_seq) = *state;

        // Never go backwards, even if the wall clock does
        let (timestamp, sequence) = if now > last_ts {
            (now, 0)
        } else if next_seq > SEQUENCE_MASK {
            // Sequence exhausted: borrow the next millisecond
            (last_ts + 1, 0)
        } else {
            (last_ts, next_seq)
        };
        *state = (timestamp, sequence + 1);

        let id = ((timestamp & 0x3FF_FFFF_FFFF) << 22)
            | ((self.shard_id as u64) << 12)
            | (sequence & SEQUENCE_MASK);

        id as i64
    }
}
