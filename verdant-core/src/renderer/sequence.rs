//! Longest increasing subsequence.
//!
//! Used by keyed reconciliation to find the largest set of children that can
//! stay where they are; every other child is moved.

/// Indices of a longest strictly increasing subsequence of the `Some`
/// entries of `values`. `None` entries never take part.
///
/// Runs in O(n log n).
pub(crate) fn longest_increasing_subsequence(values: &[Option<usize>]) -> Vec<usize> {
    let mut predecessors: Vec<Option<usize>> = vec![None; values.len()];
    // tails[k] = (value, index) ending the best subsequence of length k + 1.
    let mut tails: Vec<(usize, usize)> = Vec::new();

    for (index, value) in values.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        let position = tails.partition_point(|&(tail, _)| tail < value);
        if position > 0 {
            predecessors[index] = Some(tails[position - 1].1);
        }
        if position == tails.len() {
            tails.push((value, index));
        } else {
            tails[position] = (value, index);
        }
    }

    let mut sequence = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().map(|&(_, index)| index);
    while let Some(index) = cursor {
        sequence.push(index);
        cursor = predecessors[index];
    }
    sequence.reverse();
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lis(values: &[usize]) -> Vec<usize> {
        let values: Vec<Option<usize>> = values.iter().copied().map(Some).collect();
        longest_increasing_subsequence(&values)
    }

    #[test]
    fn finds_a_longest_run() {
        assert_eq!(lis(&[4, 2, 3, 1, 5]), vec![1, 2, 4]);
        assert_eq!(lis(&[0, 1, 2]), vec![0, 1, 2]);
        assert_eq!(lis(&[2, 1, 0]).len(), 1);
        assert!(lis(&[]).is_empty());
    }

    #[test]
    fn skips_missing_entries() {
        let values = [None, Some(3), Some(1), Some(2), None];
        assert_eq!(longest_increasing_subsequence(&values), vec![2, 3]);
    }

    #[test]
    fn zero_is_a_valid_position() {
        let values = [Some(2), Some(0), Some(1)];
        assert_eq!(longest_increasing_subsequence(&values), vec![1, 2]);
    }
}
