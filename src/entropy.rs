//! Random byte acquisition for salt generation.
//!
//! The primary source is the operating system's CSPRNG via `getrandom`. When
//! that fails, salts are synthesized from an evolving per-hasher state by
//! chaining MD5 digests.
//!
//! # Security Warning
//!
//! The fallback chain is **not cryptographically secure**. It exists purely
//! so that hashing never fails outright on platforms without a usable random
//! device. Deployments that care about salt unpredictability must ensure the
//! OS source is available.

use md5::{Digest, Md5};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Deterministic byte generator used when the OS random source is
/// unavailable.
///
/// Each request evolves the internal state (`state = MD5(state)`) and
/// appends `MD5(state)` to the output until enough bytes have accumulated.
/// The state is never reset or persisted.
pub(crate) struct FallbackRng {
    state: Vec<u8>,
}

impl FallbackRng {
    /// Seed the state from the clock and the process id.
    pub(crate) fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let mut state = Vec::with_capacity(20);
        state.extend_from_slice(&nanos.to_le_bytes());
        state.extend_from_slice(&process::id().to_le_bytes());
        Self { state }
    }

    #[cfg(test)]
    pub(crate) fn from_seed(seed: &[u8]) -> Self {
        Self {
            state: seed.to_vec(),
        }
    }

    /// Fill `buf` with synthesized bytes, mutating the state.
    pub(crate) fn fill(&mut self, buf: &mut [u8]) {
        let mut filled = 0;
        while filled < buf.len() {
            self.state = Md5::digest(&self.state).to_vec();
            let block = Md5::digest(&self.state);
            let n = (buf.len() - filled).min(block.len());
            buf[filled..filled + n].copy_from_slice(&block[..n]);
            filled += n;
        }
    }
}
