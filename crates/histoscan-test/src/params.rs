//! Regression test parameters and operations

use histoscan_core::Histogram;

/// Regression test mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegTestMode {
    /// Compare results and record failures (default)
    #[default]
    Compare,
    /// Compare, and also print every compared histogram
    Display,
}

impl RegTestMode {
    /// Parse mode from the `REGTEST_MODE` environment variable
    pub fn from_env() -> Self {
        match std::env::var("REGTEST_MODE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "display" => Self::Display,
            _ => Self::Compare,
        }
    }
}

/// Regression test parameters
///
/// This structure tracks the state of a regression test, including
/// the test name, current index, mode, and success status.
pub struct RegParams {
    /// Name of the test (e.g., "conservation")
    pub test_name: String,
    /// Current test index (incremented before each test)
    index: usize,
    /// Test mode
    pub mode: RegTestMode,
    /// Overall success status
    success: bool,
    /// Recorded failures
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    ///
    /// # Arguments
    ///
    /// * `test_name` - Name of the test (e.g., "conservation")
    pub fn new(test_name: &str) -> Self {
        let mode = RegTestMode::from_env();

        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");
        eprintln!("Mode: {:?}", mode);

        Self {
            test_name: test_name.to_string(),
            index: 0,
            mode,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Check if in display mode
    pub fn display(&self) -> bool {
        self.mode == RegTestMode::Display
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// # Arguments
    ///
    /// * `expected` - Expected value
    /// * `actual` - Actual computed value
    /// * `delta` - Maximum allowed difference
    ///
    /// # Returns
    ///
    /// `true` if values match within delta, `false` otherwise.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();

        if diff > delta {
            let msg = format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            );
            self.fail(msg)
        } else {
            true
        }
    }

    /// Compare two count arrays for exact equality
    ///
    /// Reports the first differing position.
    pub fn compare_counts(&mut self, expected: &[u32], actual: &[u32]) -> bool {
        self.index += 1;

        if expected.len() != actual.len() {
            let msg = format!(
                "Failure in {}_reg: count comparison for index {} - length {} vs {}",
                self.test_name,
                self.index,
                expected.len(),
                actual.len()
            );
            return self.fail(msg);
        }
        match expected.iter().zip(actual).position(|(e, a)| e != a) {
            Some(pos) => {
                let msg = format!(
                    "Failure in {}_reg: count comparison for index {} - position {}: expected {}, actual {}",
                    self.test_name, self.index, pos, expected[pos], actual[pos]
                );
                self.fail(msg)
            }
            None => true,
        }
    }

    /// Compare two histograms: shape, then every count
    pub fn compare_histograms(&mut self, expected: &Histogram, actual: &Histogram) -> bool {
        if self.display() {
            eprintln!("[{:02}] expected {}", self.index + 1, summarize(expected));
            eprintln!("[{:02}] actual   {}", self.index + 1, summarize(actual));
        }
        if expected.dims() != actual.dims() {
            self.index += 1;
            let msg = format!(
                "Failure in {}_reg: histogram comparison for index {} - shape {:?} vs {:?}",
                self.test_name,
                self.index,
                expected.dims().shape(),
                actual.dims().shape()
            );
            return self.fail(msg);
        }
        self.compare_counts(expected.counts(), actual.counts())
    }

    /// Clean up and report results
    ///
    /// # Returns
    ///
    /// `true` if all tests passed, `false` if any failed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();

        self.success
    }

    /// Check if all tests have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// Shape, per-row totals and the first few occupied bins.
fn summarize(hist: &Histogram) -> String {
    let rows: Vec<String> = (0..hist.rows())
        .map(|r| {
            let occupied: Vec<String> = hist
                .row(r)
                .iter()
                .enumerate()
                .filter(|&(_, &c)| c != 0)
                .take(8)
                .map(|(bin, c)| format!("{bin}:{c}"))
                .collect();
            format!("total={} [{}]", hist.total(r), occupied.join(" "))
        })
        .collect();
    format!("{:?} {}", hist.dims().shape(), rows.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use histoscan_core::HistogramDims;

    #[test]
    fn test_mode_from_env() {
        let mode = RegTestMode::from_env();
        assert!(matches!(mode, RegTestMode::Compare | RegTestMode::Display));
    }

    #[test]
    fn test_compare_values_success() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_values(100.0, 100.0, 0.0));
        assert!(rp.is_success());
    }

    #[test]
    fn test_compare_values_failure() {
        let mut rp = RegParams::new("test");
        assert!(!rp.compare_values(100.0, 200.0, 0.0));
        assert!(!rp.is_success());
        assert_eq!(rp.failures().len(), 1);
    }

    #[test]
    fn test_compare_counts() {
        let mut rp = RegParams::new("test");
        assert!(rp.compare_counts(&[1, 2, 3], &[1, 2, 3]));
        assert!(!rp.compare_counts(&[1, 2, 3], &[1, 5, 3]));
        assert!(rp.failures()[0].contains("position 1"));
        assert!(!rp.compare_counts(&[1], &[1, 2]));
        assert_eq!(rp.index(), 3);
    }

    #[test]
    fn test_compare_histograms_shape() {
        let mut rp = RegParams::new("test");
        let flat = Histogram::zeros(HistogramDims::Flat { bins: 4 });
        let rows = Histogram::zeros(HistogramDims::Rows { rows: 1, bins: 4 });
        assert!(rp.compare_histograms(&flat, &flat.clone()));
        assert!(!rp.compare_histograms(&flat, &rows));
        assert!(!rp.cleanup());
    }
}
