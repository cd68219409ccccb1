//! Ordering of the candidate set.

use crate::model::MessageRecord;

/// Order records by size, largest first.
///
/// The sort is stable: records of equal size keep their arrival order.
pub fn rank_by_size(mut records: Vec<MessageRecord>) -> Vec<MessageRecord> {
    records.sort_by(|a, b| b.size().cmp(&a.size()));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, size: u64) -> MessageRecord {
        MessageRecord::new(id, size)
    }

    fn ids(records: &[MessageRecord]) -> Vec<&str> {
        records.iter().map(MessageRecord::remote_id).collect()
    }

    #[test]
    fn test_largest_first() {
        let ranked = rank_by_size(vec![rec("A", 500), rec("B", 100), rec("C", 300)]);
        assert_eq!(ids(&ranked), vec!["A", "C", "B"]);
    }

    #[test]
    fn test_sizes_non_increasing() {
        let sizes = [7, 3, 9, 9, 0, 42, 1, 3, 18];
        let input: Vec<_> = sizes
            .iter()
            .enumerate()
            .map(|(i, &s)| rec(&i.to_string(), s))
            .collect();
        let ranked = rank_by_size(input);
        assert!(ranked.windows(2).all(|w| w[0].size() >= w[1].size()));
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let ranked = rank_by_size(vec![rec("x", 5), rec("big", 9), rec("y", 5), rec("z", 5)]);
        assert_eq!(ids(&ranked), vec!["big", "x", "y", "z"]);
    }

    #[test]
    fn test_ranking_is_a_permutation() {
        let a = vec![rec("p", 10), rec("q", 30), rec("r", 20), rec("s", 30)];
        let mut b = a.clone();
        b.reverse();

        let mut ra: Vec<_> = rank_by_size(a).into_iter().map(|r| r.remote_id().to_string()).collect();
        let mut rb: Vec<_> = rank_by_size(b).into_iter().map(|r| r.remote_id().to_string()).collect();
        ra.sort();
        rb.sort();
        assert_eq!(ra, rb);
        assert_eq!(ra, vec!["p", "q", "r", "s"]);
    }

    #[test]
    fn test_empty() {
        assert!(rank_by_size(Vec::new()).is_empty());
    }
}
