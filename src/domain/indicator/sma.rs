//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i..i+n]). Output length is `len - n + 1`.

pub fn calculate_sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let mut values = Vec::with_capacity(data.len() - period + 1);
    let mut sum: f64 = data[..period].iter().sum();
    values.push(sum / period as f64);

    for i in period..data.len() {
        sum += data[i] - data[i - period];
        values.push(sum / period as f64);
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sma_basic() {
        let sma = calculate_sma(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(sma.len(), 3);
        assert_relative_eq!(sma[0], 2.0);
        assert_relative_eq!(sma[1], 3.0);
        assert_relative_eq!(sma[2], 4.0);
    }

    #[test]
    fn sma_period_equals_length() {
        let sma = calculate_sma(&[10.0, 20.0, 30.0], 3);
        assert_eq!(sma, vec![20.0]);
    }

    #[test]
    fn sma_insufficient_data_is_empty() {
        assert!(calculate_sma(&[1.0, 2.0], 3).is_empty());
        assert!(calculate_sma(&[], 1).is_empty());
    }

    #[test]
    fn sma_period_0() {
        assert!(calculate_sma(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn sma_period_1_is_identity() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(calculate_sma(&data, 1), data.to_vec());
    }

    #[test]
    fn sma_rolling_sum_matches_direct_mean() {
        let data: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let sma = calculate_sma(&data, 7);
        for (j, value) in sma.iter().enumerate() {
            let direct = data[j..j + 7].iter().sum::<f64>() / 7.0;
            assert_relative_eq!(*value, direct, epsilon = 1e-9);
        }
    }

    #[test]
    fn sma_does_not_mutate_input() {
        let data = vec![5.0, 6.0, 7.0];
        let copy = data.clone();
        let _ = calculate_sma(&data, 2);
        assert_eq!(data, copy);
    }
}
