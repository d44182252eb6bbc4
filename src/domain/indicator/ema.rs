//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n closes, then
//! EMA[i] = C[i]*k + EMA[i-1]*(1-k). Output length is `len - n + 1`.

pub fn calculate_ema(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut values = Vec::with_capacity(data.len() - period + 1);
    let mut ema = data[..period].iter().sum::<f64>() / period as f64;
    values.push(ema);

    for &price in &data[period..] {
        ema = price * k + ema * (1.0 - k);
        values.push(ema);
    }

    values
}
