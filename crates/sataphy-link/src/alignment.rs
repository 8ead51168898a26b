/// Counts consecutive valid recognitions since the last resynchronization.
///
/// The count saturates at the threshold; any framing error resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentCounter {
    count: u16,
    threshold: u16,
}

impl AlignmentCounter {
    /// Creates a counter that reports alignment after `threshold` recognitions.
    pub fn new(threshold: u16) -> Self {
        Self { count: 0, threshold }
    }

    /// Records one valid recognition. Returns true when the threshold is reached.
    pub fn record_valid(&mut self) -> bool {
        if self.count < self.threshold {
            self.count += 1;
        }
        self.is_aligned()
    }

    /// Starts counting from zero again.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Returns true once the threshold has been reached.
    pub fn is_aligned(&self) -> bool {
        self.count >= self.threshold
    }

    /// Current consecutive count.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Configured threshold.
    pub fn threshold(&self) -> u16 {
        self.threshold
    }
}
