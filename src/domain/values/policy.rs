use serde::{Deserialize, Serialize};

/// Which eligible expiry the short leg sits on, and how far the prober may
/// walk from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortLegPolicy {
    /// Index into the eligible (dte >= `min_dte`) expiries.
    pub base_rank: usize,
    pub min_dte: u32,
    /// Number of ranks probed starting at `base_rank`.
    pub probe_count: usize,
}

impl Default for ShortLegPolicy {
    fn default() -> Self {
        Self {
            base_rank: 1,
            min_dte: 3,
            probe_count: 3,
        }
    }
}

impl ShortLegPolicy {
    /// Contiguous ranks `base_rank..base_rank + probe_count`; a single rank
    /// when `probe_count <= 1`.
    pub fn probe_ranks(&self) -> Vec<usize> {
        if self.probe_count <= 1 {
            return vec![self.base_rank];
        }
        (self.base_rank..self.base_rank.saturating_add(self.probe_count)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_ranks_default() {
        assert_eq!(ShortLegPolicy::default().probe_ranks(), vec![1, 2, 3]);
    }

    #[test]
    fn test_probe_ranks_degenerate() {
        let p = ShortLegPolicy {
            base_rank: 2,
            min_dte: 3,
            probe_count: 0,
        };
        assert_eq!(p.probe_ranks(), vec![2]);
    }

    #[test]
    fn test_probe_ranks_saturate_at_max_rank() {
        let p = ShortLegPolicy {
            base_rank: usize::MAX - 1,
            min_dte: 3,
            probe_count: 3,
        };
        assert_eq!(p.probe_ranks(), vec![usize::MAX - 1]);
    }
}
