use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use uuid::{Builder, Uuid};

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a reminder identifier: a v4 UUID from the OS entropy source, or a
/// v4-shaped UUID from a seeded non-cryptographic generator if the OS source
/// fails. Collisions are not checked.
pub fn generate_id() -> String {
    generate_uuid().to_string()
}

pub fn generate_uuid() -> Uuid {
    match secure_uuid() {
        Some(id) => id,
        None => {
            tracing::warn!("OS entropy unavailable, using pseudo-random reminder id");
            fallback_uuid()
        }
    }
}

fn secure_uuid() -> Option<Uuid> {
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes).ok()?;
    Some(Builder::from_random_bytes(bytes).into_uuid())
}

pub fn fallback_uuid() -> Uuid {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let seq = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut rng = SmallRng::seed_from_u64(nanos ^ seq.rotate_left(32));
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}
