use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    /// Seconds
    pub mean: f64,
    /// Sample variance in seconds², zero for a single sample
    pub variance: f64,
}

impl Summary {
    /// `None` when there is nothing to summarize.
    pub fn of(samples: &[Duration]) -> Option<Summary> {
        if samples.is_empty() {
            return None;
        }
        let count = samples.len();
        let secs = samples.iter().map(Duration::as_secs_f64);
        let mean = secs.clone().sum::<f64>() / count as f64;
        let variance = if count > 1 {
            secs.map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64
        } else {
            0.0
        };
        Some(Summary {
            count,
            mean,
            variance,
        })
    }

    pub fn stddev(&self) -> f64 {
        self.variance.sqrt()
    }
}
