/// Exponential moving average, updated one observation at a time.
///
/// The first observation seeds the average; after that
/// `value = α·x + (1−α)·value` with `α = 2/(window+1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    alpha: f64,
    value: f64,
    window: usize,
    count: usize,
}

impl Ema {
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window.max(1) as f64 + 1.0),
            value: 0.0,
            window,
            count: 0,
        }
    }

    pub fn update(&mut self, x: f64) -> f64 {
        self.value = if self.count == 0 {
            x
        } else {
            self.alpha * x + (1.0 - self.alpha) * self.value
        };
        self.count += 1;
        self.value
    }

    /// True once `window` observations have been seen.
    pub fn is_warm(&self) -> bool {
        self.count >= self.window
    }
}
