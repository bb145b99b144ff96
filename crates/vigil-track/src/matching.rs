//! Bipartite min-cost assignment between tracks and detections.

use ndarray::Array2;

/// Sentinel cost for (track, detection) pairs that must never match:
/// cross-class pairs and pairs beyond the IoU gate. Large but finite so
/// the solver always operates on a well-formed matrix.
pub const INFEASIBLE_COST: f32 = 1e3;

#[derive(Debug, Clone)]
pub struct AssignmentResult {
    /// Matched (track_index, detection_index) pairs
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Solve the assignment restricted to pairs with cost <= `feasible_max`.
///
/// The matrix is padded square for LAPJV; padded assignments and matches
/// whose underlying cost exceeds `feasible_max` are reported unmatched.
pub fn min_cost_assignment(cost_matrix: &Array2<f32>, feasible_max: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: vec![],
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    if num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: vec![],
        };
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);

    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx >= num_cols {
                    unmatched_tracks.push(row_idx);
                } else if cost_matrix[[row_idx, col_idx]] <= feasible_max {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(_) => {
            // Does not occur for finite matrices; treat everything as
            // unmatched rather than dropping detections on the floor.
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_identity_assignment() {
        let cost = array![[0.1f32, 0.9], [0.9, 0.1]];
        let result = min_cost_assignment(&cost, 0.7);
        assert_eq!(result.matches, vec![(0, 0), (1, 1)]);
        assert!(result.unmatched_tracks.is_empty());
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_crossed_assignment_is_optimal() {
        // Greedy would pick (0,0) at 0.2 and strand row 1; optimal crosses.
        let cost = array![[0.2f32, 0.3], [0.25, INFEASIBLE_COST]];
        let result = min_cost_assignment(&cost, 0.7);
        assert_eq!(result.matches, vec![(0, 1), (1, 0)]);
    }

    #[test]
    fn test_infeasible_pairs_stay_unmatched() {
        let cost = array![[INFEASIBLE_COST, INFEASIBLE_COST]];
        let result = min_cost_assignment(&cost, 0.7);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0, 1]);
    }

    #[test]
    fn test_rectangular_more_detections() {
        let cost = array![[0.1f32, 0.5, 0.6]];
        let result = min_cost_assignment(&cost, 0.7);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_detections, vec![1, 2]);
    }

    #[test]
    fn test_empty_sides() {
        let cost = Array2::<f32>::zeros((0, 3));
        let result = min_cost_assignment(&cost, 0.7);
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);

        let cost = Array2::<f32>::zeros((2, 0));
        let result = min_cost_assignment(&cost, 0.7);
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
    }
}
