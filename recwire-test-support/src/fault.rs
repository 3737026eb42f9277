//! Datagram fault patterns.
//!
//! A [`FaultPlan`] is asked about each datagram in turn (keyed by a
//! per-direction counter) and decides whether to drop it. The same
//! machinery drives duplication: a "drop" decision from a duplication plan
//! means "deliver twice".

use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Decision for one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropDecision {
    Drop,
    Pass,
}

/// Pattern for fault generation.
#[derive(Debug, Clone)]
pub enum FaultPattern {
    /// No faults - pass everything
    None,
    /// Affect every Nth datagram
    Periodic { every_n: u64 },
    /// Affect datagrams randomly with given probability (0.0-1.0)
    Random { probability: f64 },
    /// Affect the first N datagrams
    FirstN { n: u64 },
    /// Affect specific datagram indices
    Specific { indices: HashSet<u64> },
}

/// Stateful fault generator for one direction of traffic.
pub struct FaultPlan {
    pattern: FaultPattern,
    count: u64,
    rng: rand::rngs::StdRng,
}

impl FaultPlan {
    pub fn new(pattern: FaultPattern) -> Self {
        Self {
            pattern,
            count: 0,
            rng: rand::rngs::StdRng::from_entropy(),
        }
    }

    /// A plan that affects nothing.
    pub fn none() -> Self {
        Self::new(FaultPattern::None)
    }

    /// Affect every Nth datagram.
    pub fn periodic(every_n: u64) -> Self {
        Self::new(FaultPattern::Periodic { every_n })
    }

    /// Affect datagrams with the given probability.
    pub fn random(probability: f64) -> Self {
        Self::new(FaultPattern::Random {
            probability: probability.clamp(0.0, 1.0),
        })
    }

    /// Affect the first `n` datagrams.
    pub fn first_n(n: u64) -> Self {
        Self::new(FaultPattern::FirstN { n })
    }

    /// Affect exactly these datagram indices (0-based).
    pub fn specific(indices: impl IntoIterator<Item = u64>) -> Self {
        Self::new(FaultPattern::Specific {
            indices: indices.into_iter().collect(),
        })
    }

    /// Decide the fate of the next datagram.
    pub fn decide(&mut self) -> DropDecision {
        let index = self.count;
        self.count += 1;

        match &self.pattern {
            FaultPattern::None => DropDecision::Pass,
            FaultPattern::Periodic { every_n } => {
                if *every_n > 0 && (index + 1) % every_n == 0 {
                    DropDecision::Drop
                } else {
                    DropDecision::Pass
                }
            }
            FaultPattern::Random { probability } => {
                if self.rng.gen_bool(*probability) {
                    DropDecision::Drop
                } else {
                    DropDecision::Pass
                }
            }
            FaultPattern::FirstN { n } => {
                if index < *n {
                    DropDecision::Drop
                } else {
                    DropDecision::Pass
                }
            }
            FaultPattern::Specific { indices } => {
                if indices.contains(&index) {
                    DropDecision::Drop
                } else {
                    DropDecision::Pass
                }
            }
        }
    }

    /// Number of datagrams decided so far.
    pub fn seen(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decisions(mut plan: FaultPlan, n: u64) -> Vec<DropDecision> {
        (0..n).map(|_| plan.decide()).collect()
    }

    #[test]
    fn test_none_passes_everything() {
        assert!(decisions(FaultPlan::none(), 50)
            .iter()
            .all(|d| *d == DropDecision::Pass));
    }

    #[test]
    fn test_periodic_drops_every_nth() {
        let d = decisions(FaultPlan::periodic(3), 9);
        assert_eq!(d[2], DropDecision::Drop);
        assert_eq!(d[5], DropDecision::Drop);
        assert_eq!(d[8], DropDecision::Drop);
        assert_eq!(d.iter().filter(|x| **x == DropDecision::Drop).count(), 3);
    }

    #[test]
    fn test_first_n_then_passes() {
        let d = decisions(FaultPlan::first_n(2), 5);
        assert_eq!(d[0], DropDecision::Drop);
        assert_eq!(d[1], DropDecision::Drop);
        assert!(d[2..].iter().all(|x| *x == DropDecision::Pass));
    }

    #[test]
    fn test_specific_indices() {
        let d = decisions(FaultPlan::specific([1, 3]), 5);
        assert_eq!(d[0], DropDecision::Pass);
        assert_eq!(d[1], DropDecision::Drop);
        assert_eq!(d[2], DropDecision::Pass);
        assert_eq!(d[3], DropDecision::Drop);
    }

    #[test]
    fn test_random_extremes() {
        assert!(decisions(FaultPlan::random(0.0), 100)
            .iter()
            .all(|d| *d == DropDecision::Pass));
        assert!(decisions(FaultPlan::random(1.0), 100)
            .iter()
            .all(|d| *d == DropDecision::Drop));
    }
}
