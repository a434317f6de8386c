use rand::seq::SliceRandom;

use quorumfs_core::{NodeId, QfsError, Result};

/// Draws `k` distinct node ids uniformly at random, without replacement,
/// from `all` minus `exclude`.
///
/// Fails with `QuorumUnavailable` if fewer than `k` nodes remain eligible.
/// The coordinator is never added automatically — it appears in the
/// result only if the random draw happens to pick it (§4.4.1).
pub fn sample_quorum(all: &[NodeId], exclude: Option<&NodeId>, k: usize) -> Result<Vec<NodeId>> {
    let mut eligible: Vec<NodeId> = all
        .iter()
        .filter(|id| Some(*id) != exclude)
        .cloned()
        .collect();

    if eligible.len() < k {
        return Err(QfsError::QuorumUnavailable(format!(
            "need {k} eligible nodes, only {} available",
            eligible.len()
        )));
    }

    let mut rng = rand::thread_rng();
    eligible.shuffle(&mut rng);
    eligible.truncate(k);
    Ok(eligible)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(ids: &[&str]) -> Vec<NodeId> {
        ids.iter().map(|s| NodeId::from(*s)).collect()
    }

    #[test]
    fn samples_exact_count_and_distinct_members() {
        let all = ids(&["1", "2", "3", "4", "5"]);
        let quorum = sample_quorum(&all, None, 3).unwrap();
        assert_eq!(quorum.len(), 3);
        let unique: std::collections::HashSet<_> = quorum.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn excludes_the_given_node() {
        let all = ids(&["1", "2", "3"]);
        let excluded = NodeId::from("1");
        let quorum = sample_quorum(&all, Some(&excluded), 2).unwrap();
        assert_eq!(quorum.len(), 2);
        assert!(!quorum.contains(&excluded));
    }

    #[test]
    fn fails_when_too_few_eligible_nodes() {
        let all = ids(&["1", "2"]);
        let excluded = NodeId::from("1");
        assert!(sample_quorum(&all, Some(&excluded), 2).is_err());
    }
}
