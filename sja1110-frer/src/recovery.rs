//! Sequence recovery models
//!
//! Executable models of the 802.1CB elimination function, mirroring what
//! the chip's recovery instances do with the sequence numbers carried in
//! R-TAGs. The codec itself never runs these at build time; they exist
//! so the acceptance semantics written into the recovery table have a
//! testable reference.
//!
//! Acceptance rule: a sequence number is accepted if it falls within
//! `[last_accepted - window, last_accepted + window]` modulo the 16-bit
//! wrap, and has not been accepted before. Exact duplicates and
//! out-of-window stragglers are rejected, not queued.

use std::collections::HashSet;

use sja1110_core::{Error, Result};

/// Upper bound on the window; beyond half the sequence space the
/// forward/backward distinction becomes ambiguous.
pub const MAX_WINDOW: u16 = 0x7FFF;

/// Vector recovery: sliding history over the window
///
/// # Examples
///
/// ```
/// use sja1110_frer::recovery::VectorRecovery;
///
/// let mut recovery = VectorRecovery::new(256).unwrap();
/// assert!(recovery.accept(10));
/// assert!(!recovery.accept(10)); // duplicate from the second path
/// assert!(recovery.accept(11));
/// ```
#[derive(Debug, Clone)]
pub struct VectorRecovery {
    window: u16,
    last_accepted: Option<u16>,
    seen: HashSet<u16>,
}

impl VectorRecovery {
    /// Create an instance with the given history window
    pub fn new(window: u16) -> Result<Self> {
        if window == 0 || window > MAX_WINDOW {
            return Err(Error::parameter(
                "window",
                format!("recovery window {} out of range 1-{}", window, MAX_WINDOW),
            ));
        }
        Ok(Self {
            window,
            last_accepted: None,
            seen: HashSet::new(),
        })
    }

    /// Offer one received sequence number; returns whether the frame passes
    pub fn accept(&mut self, seq: u16) -> bool {
        let last = match self.last_accepted {
            // First frame of the stream is always accepted.
            None => {
                self.last_accepted = Some(seq);
                self.seen.insert(seq);
                return true;
            }
            Some(last) => last,
        };

        let forward = seq.wrapping_sub(last);
        let backward = last.wrapping_sub(seq);

        if seq == last {
            false
        } else if forward <= self.window {
            // New frame ahead of the history; advance and drop history
            // that fell out of the window.
            self.last_accepted = Some(seq);
            self.seen.insert(seq);
            let window = self.window;
            self.seen.retain(|&s| seq.wrapping_sub(s) <= window);
            true
        } else if backward <= self.window {
            // Straggler from the slower path: pass it exactly once.
            self.seen.insert(seq)
        } else {
            false
        }
    }

    /// Reset the instance, as the chip does after the recovery timeout
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.seen.clear();
    }
}

/// Match recovery: direct duplicate elimination
///
/// Accepts everything except an exact repeat of the last accepted
/// sequence number. Cheaper than vector recovery, but only safe when
/// the paths cannot reorder frames.
#[derive(Debug, Clone, Default)]
pub struct MatchRecovery {
    last_accepted: Option<u16>,
}

impl MatchRecovery {
    /// Create an instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one received sequence number; returns whether the frame passes
    pub fn accept(&mut self, seq: u16) -> bool {
        if self.last_accepted == Some(seq) {
            return false;
        }
        self.last_accepted = Some(seq);
        true
    }

    /// Reset the instance
    pub fn reset(&mut self) {
        self.last_accepted = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bounds() {
        assert!(VectorRecovery::new(0).is_err());
        assert!(VectorRecovery::new(MAX_WINDOW + 1).is_err());
        assert!(VectorRecovery::new(256).is_ok());
    }

    #[test]
    fn test_first_frame_always_accepted() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(5000));
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(1));
        assert!(r.accept(2));
        assert!(!r.accept(1));
        assert!(!r.accept(2));
    }

    #[test]
    fn test_straggler_within_window_accepted_once() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(10));
        assert!(r.accept(12));
        // 11 arrives late from the redundant path.
        assert!(r.accept(11));
        assert!(!r.accept(11));
    }

    #[test]
    fn test_out_of_window_rejected() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(100));
        assert!(!r.accept(80)); // 20 behind, window is 8
        assert!(!r.accept(200)); // 100 ahead
    }

    #[test]
    fn test_wraparound() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(0xFFFE));
        assert!(r.accept(0x0002)); // 4 ahead across the wrap
        assert!(r.accept(0xFFFF)); // straggler across the wrap
        assert!(!r.accept(0xFFFE)); // duplicate across the wrap
    }

    #[test]
    fn test_interleaved_dual_path() {
        // Two copies of each frame, slightly out of phase; exactly one
        // of each pair must pass.
        let mut r = VectorRecovery::new(256).unwrap();
        let mut passed = 0;
        for seq in 0u16..100 {
            if r.accept(seq) {
                passed += 1;
            }
            if r.accept(seq.wrapping_sub(1)) {
                passed += 1;
            }
        }
        // seq 0..100 from path A, seq -1..99 from path B; every number
        // in -1..100 passes exactly once.
        assert_eq!(passed, 101);
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut r = VectorRecovery::new(8).unwrap();
        assert!(r.accept(42));
        r.reset();
        assert!(r.accept(42));
    }

    #[test]
    fn test_match_recovery() {
        let mut r = MatchRecovery::new();
        assert!(r.accept(7));
        assert!(!r.accept(7));
        assert!(r.accept(8));
        assert!(r.accept(7)); // match recovery only remembers the last
    }
}
