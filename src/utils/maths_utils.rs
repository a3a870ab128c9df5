/// Population mean and standard deviation of a sample.
/// Returns (0.0, 0.0) for an empty slice.
pub fn mean_and_stddev(data: &[f64]) -> (f64, f64) {
    let count = data.len();
    if count == 0 {
        return (0.0, 0.0);
    }

    let sum: f64 = data.iter().sum();
    let mean = sum / count as f64;

    let variance: f64 = data
        .iter()
        .map(|value| {
            let diff = mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    (mean, variance.sqrt())
}
