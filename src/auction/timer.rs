//! Lot countdown timers.
//!
//! Each active lot carries a generation counter. Arming (or re-arming on
//! a bid) bumps the generation, so an expiry task that slept through a
//! bid observes a stale generation and does nothing. The database row
//! lock taken at finalization is the authority; the generation check
//! just keeps stale wakeups from contending for it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Clone, Copy, Debug)]
struct TimerState {
    generation: u64,
    deadline: Instant,
}

#[derive(Clone, Default)]
pub struct AuctionTimers {
    lots: Arc<Mutex<HashMap<Uuid, TimerState>>>,
}

impl AuctionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the countdown for a lot, invalidating any prior
    /// generation. Returns the new generation for the expiry task to
    /// check against when it wakes.
    pub fn arm(&self, lot_id: Uuid, duration: Duration) -> u64 {
        let mut lots = self.lots.lock().unwrap_or_else(|e| e.into_inner());
        let entry = lots.entry(lot_id).or_insert(TimerState {
            generation: 0,
            deadline: Instant::now(),
        });
        entry.generation += 1;
        entry.deadline = Instant::now() + duration;
        entry.generation
    }

    /// Whether `generation` is still the live countdown for this lot.
    pub fn is_current(&self, lot_id: Uuid, generation: u64) -> bool {
        let lots = self.lots.lock().unwrap_or_else(|e| e.into_inner());
        lots.get(&lot_id)
            .map(|s| s.generation == generation)
            .unwrap_or(false)
    }

    /// Drop the countdown for a finalized lot.
    pub fn clear(&self, lot_id: Uuid) {
        let mut lots = self.lots.lock().unwrap_or_else(|e| e.into_inner());
        lots.remove(&lot_id);
    }

    /// Whole seconds left on the lot's countdown, if one is armed.
    pub fn remaining_secs(&self, lot_id: Uuid) -> Option<u64> {
        let lots = self.lots.lock().unwrap_or_else(|e| e.into_inner());
        lots.get(&lot_id)
            .map(|s| s.deadline.saturating_duration_since(Instant::now()).as_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arm_bumps_generation() {
        let timers = AuctionTimers::new();
        let lot = Uuid::new_v4();
        let g1 = timers.arm(lot, Duration::from_secs(30));
        let g2 = timers.arm(lot, Duration::from_secs(30));
        assert!(g2 > g1);
        assert!(!timers.is_current(lot, g1));
        assert!(timers.is_current(lot, g2));
    }

    #[tokio::test]
    async fn test_clear_invalidates_all_generations() {
        let timers = AuctionTimers::new();
        let lot = Uuid::new_v4();
        let gen = timers.arm(lot, Duration::from_secs(30));
        timers.clear(lot);
        assert!(!timers.is_current(lot, gen));
        assert_eq!(timers.remaining_secs(lot), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_secs_counts_down() {
        let timers = AuctionTimers::new();
        let lot = Uuid::new_v4();
        timers.arm(lot, Duration::from_secs(30));
        assert_eq!(timers.remaining_secs(lot), Some(30));
        tokio::time::advance(Duration::from_secs(12)).await;
        assert_eq!(timers.remaining_secs(lot), Some(18));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(timers.remaining_secs(lot), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_resets_deadline() {
        let timers = AuctionTimers::new();
        let lot = Uuid::new_v4();
        timers.arm(lot, Duration::from_secs(30));
        tokio::time::advance(Duration::from_secs(25)).await;
        timers.arm(lot, Duration::from_secs(30));
        assert_eq!(timers.remaining_secs(lot), Some(30));
    }

    #[tokio::test]
    async fn test_lots_are_independent() {
        let timers = AuctionTimers::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let ga = timers.arm(a, Duration::from_secs(30));
        let gb = timers.arm(b, Duration::from_secs(30));
        timers.clear(a);
        assert!(!timers.is_current(a, ga));
        assert!(timers.is_current(b, gb));
    }
}
