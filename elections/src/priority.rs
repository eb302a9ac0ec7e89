//! Deterministic ranking of audit servers.
//!
//! Every node ranks the audit set on its own and reaches the same answer,
//! so no vote is needed to decide who volunteers. A candidate's weight is a
//! keyed Blake2b digest of its identity and the election coordinates; the
//! round is part of the key, so each new round reshuffles the ranking and a
//! dead top candidate is eventually passed over.

use fedelect_crypto::blake2b_256_multi;
use fedelect_types::{Server, ServerId};

const DOMAIN: &[u8] = b"fedelect/priority/v1";

/// Weight of one audit server for `(height, minute, slot, round)`.
pub fn weight(server: &ServerId, height: u32, minute: u8, slot: usize, round: u32) -> u64 {
    // usize never exceeds 64 bits on supported targets.
    let slot = u64::try_from(slot).unwrap_or(u64::MAX);
    let digest = blake2b_256_multi(&[
        DOMAIN,
        server.as_bytes(),
        &height.to_be_bytes(),
        &[minute],
        &slot.to_be_bytes(),
        &round.to_be_bytes(),
    ]);
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head)
}

/// Weights of every audit server, index-aligned with `audit`.
pub fn order(audit: &[Server], height: u32, minute: u8, slot: usize, round: u32) -> Vec<u64> {
    audit
        .iter()
        .map(|s| weight(&s.id, height, minute, slot, round))
        .collect()
}

/// Index of the largest weight. Ties go to the lowest index.
pub fn max_idx(weights: &[u64]) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, &w) in weights.iter().enumerate() {
        match best {
            Some((_, top)) if w <= top => {}
            _ => best = Some((i, w)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fedelect_crypto::server_id_from_name;

    fn audit(n: usize) -> Vec<Server> {
        (0..n)
            .map(|i| {
                let name = format!("audit-{i}");
                Server::new(server_id_from_name(&name), name).unwrap()
            })
            .collect()
    }

    #[test]
    fn max_idx_picks_largest() {
        assert_eq!(max_idx(&[7, 3]), Some(0));
        assert_eq!(max_idx(&[1, 9, 4]), Some(1));
    }

    #[test]
    fn max_idx_ties_go_to_lowest_index() {
        assert_eq!(max_idx(&[5, 9, 9, 2]), Some(1));
        assert_eq!(max_idx(&[4, 4, 4]), Some(0));
    }

    #[test]
    fn max_idx_of_empty_is_none() {
        assert_eq!(max_idx(&[]), None);
    }

    #[test]
    fn order_is_index_aligned_and_deterministic() {
        let a = audit(4);
        let w1 = order(&a, 10, 3, 1, 1);
        let w2 = order(&a, 10, 3, 1, 1);
        assert_eq!(w1.len(), 4);
        assert_eq!(w1, w2);
        assert_eq!(w1[2], weight(&a[2].id, 10, 3, 1, 1));
    }

    #[test]
    fn every_coordinate_changes_the_weights() {
        let a = audit(3);
        let base = order(&a, 10, 3, 1, 1);
        assert_ne!(base, order(&a, 11, 3, 1, 1));
        assert_ne!(base, order(&a, 10, 4, 1, 1));
        assert_ne!(base, order(&a, 10, 3, 2, 1));
        assert_ne!(base, order(&a, 10, 3, 1, 2));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn wide_slots_are_not_truncated() {
        let a = audit(1);
        let wrapped = (1usize << 32) + 1;
        assert_ne!(weight(&a[0].id, 10, 3, wrapped, 1), weight(&a[0].id, 10, 3, 1, 1));
    }

    #[test]
    fn rounds_rotate_the_top_candidate() {
        let a = audit(3);
        let tops: std::collections::HashSet<usize> = (1..=32)
            .filter_map(|round| max_idx(&order(&a, 10, 3, 1, round)))
            .collect();
        assert_eq!(tops.len(), 3, "every candidate should lead some round");
    }
}
