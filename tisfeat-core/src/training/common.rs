use crate::constants::NUM_BASES;
use crate::scoring::ScoringMatrix;

/// Background nucleotide probabilities from column-averaged frequencies.
///
/// Each column with at least one observation is normalized to frequencies,
/// the frequencies are averaged over those columns and the result is
/// renormalized across the four bases. Without any observation the
/// background is uniform.
#[must_use]
pub fn background_distribution(columns: &[[f64; NUM_BASES]]) -> [f64; NUM_BASES] {
    let mut averaged = [0.0; NUM_BASES];
    let mut observed_columns = 0usize;

    for column in columns {
        let total: f64 = column.iter().sum();
        if total <= 0.0 {
            continue;
        }
        for (acc, count) in averaged.iter_mut().zip(column) {
            *acc += count / total;
        }
        observed_columns += 1;
    }

    if observed_columns == 0 {
        return [1.0 / NUM_BASES as f64; NUM_BASES];
    }

    let total: f64 = averaged.iter().sum();
    for value in &mut averaged {
        *value /= total;
    }
    averaged
}

/// Normalize each column to frequencies and convert to log2 odds against
/// the background.
///
/// Columns without observations and bases with a zero background
/// probability receive `degenerate_score`. A base never seen in an observed
/// column keeps its log-odds of negative infinity, so it always ranks below
/// a base seen at least once.
#[must_use]
pub fn log_odds_matrix(
    columns: &[[f64; NUM_BASES]],
    background: &[f64; NUM_BASES],
    degenerate_score: f64,
) -> ScoringMatrix {
    let scores = columns
        .iter()
        .map(|column| {
            let total: f64 = column.iter().sum();
            let mut scores = [degenerate_score; NUM_BASES];
            if total <= 0.0 {
                return scores;
            }
            for ((score, count), prior) in scores.iter_mut().zip(column).zip(background) {
                if *prior > 0.0 {
                    *score = (count / total / prior).log2();
                }
            }
            scores
        })
        .collect();
    ScoringMatrix::from_columns(scores)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNIFORM: [f64; NUM_BASES] = [0.25; NUM_BASES];

    #[test]
    fn test_background_sums_to_one() {
        let columns = vec![[3.0, 1.0, 0.0, 4.0], [1.0, 1.0, 1.0, 5.0], [0.0; 4]];
        let background = background_distribution(&columns);
        let total: f64 = background.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(background.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_background_is_column_average() {
        let columns = vec![[2.0, 2.0, 0.0, 0.0], [0.0, 0.0, 1.0, 3.0]];
        let background = background_distribution(&columns);
        assert!((background[0] - 0.25).abs() < 1e-12);
        assert!((background[1] - 0.25).abs() < 1e-12);
        assert!((background[2] - 0.125).abs() < 1e-12);
        assert!((background[3] - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_background_without_observations_is_uniform() {
        assert_eq!(background_distribution(&[[0.0; 4]; 3]), UNIFORM);
        assert_eq!(background_distribution(&[]), UNIFORM);
    }

    #[test]
    fn test_log_odds_basic() {
        let columns = vec![[2.0, 1.0, 1.0, 0.0]];
        let matrix = log_odds_matrix(&columns, &UNIFORM, 0.0);
        let scores = matrix.columns()[0];
        assert!((scores[0] - 1.0).abs() < 1e-12);
        assert!(scores[1].abs() < 1e-12);
        assert!(scores[2].abs() < 1e-12);
        assert_eq!(scores[3], f64::NEG_INFINITY);
    }

    #[test]
    fn test_unseen_base_ranks_below_rare_base() {
        let matrix = log_odds_matrix(&[[100.0, 1.0, 0.0, 0.0]], &UNIFORM, 0.0);
        let scores = matrix.columns()[0];
        assert!(scores[0] > 0.0);
        assert!(scores[1] < 0.0 && scores[1].is_finite());
        assert!(scores[2] < scores[1]);
        assert_eq!(scores[3], f64::NEG_INFINITY);
        assert!(matrix.score(b"C").unwrap() < matrix.score(b"T").unwrap());
    }

    #[test]
    fn test_sentinel_only_for_empty_columns() {
        let matrix = log_odds_matrix(&[[0.0; 4], [3.0, 0.0, 1.0, 0.0]], &UNIFORM, -2.5);
        assert_eq!(matrix.columns()[0], [-2.5; NUM_BASES]);
        assert_eq!(matrix.columns()[1][1], f64::NEG_INFINITY);
        assert_eq!(matrix.columns()[1][3], f64::NEG_INFINITY);
    }

    #[test]
    fn test_log_odds_degenerate_column_uses_sentinel() {
        let columns = vec![[0.0; 4], [1.0, 1.0, 1.0, 1.0]];
        let matrix = log_odds_matrix(&columns, &UNIFORM, f64::NEG_INFINITY);
        assert!(matrix.columns()[0].iter().all(|&s| s == f64::NEG_INFINITY));
        assert!(matrix.columns()[1].iter().all(|&s| s.abs() < 1e-12));
    }

    #[test]
    fn test_log_odds_zero_background_uses_sentinel() {
        let columns = vec![[1.0, 1.0, 1.0, 1.0]];
        let background = [0.5, 0.5, 0.0, 0.0];
        let matrix = log_odds_matrix(&columns, &background, -7.5);
        let scores = matrix.columns()[0];
        assert!((scores[0] + 1.0).abs() < 1e-12);
        assert_eq!(scores[2], -7.5);
        assert_eq!(scores[3], -7.5);
    }
}
