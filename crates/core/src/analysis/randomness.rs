use std::collections::HashMap;

/// Measures how random or unstructured a string looks.
///
/// The scorer treats the returned value as one additive signal.
pub trait RandomnessDetector {
    fn score(&self, text: &str) -> f64;
}

/// Shannon entropy in bits per character.
///
/// Printable text stays well below 7 bits, so values never reach the
/// scorer's clamp threshold of 10.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntropyDetector;

impl RandomnessDetector for EntropyDetector {
    fn score(&self, text: &str) -> f64 {
        let mut counts: HashMap<char, usize> = HashMap::new();
        let mut total = 0usize;
        for c in text.chars() {
            *counts.entry(c).or_insert(0) += 1;
            total += 1;
        }
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        counts
            .values()
            .map(|&n| {
                let p = n as f64 / total;
                -p * p.log2()
            })
            .sum()
    }
}

/// Detector that always reports the same value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedDetector(pub f64);

impl RandomnessDetector for FixedDetector {
    fn score(&self, _text: &str) -> f64 {
        self.0
    }
}

impl<T: RandomnessDetector + ?Sized> RandomnessDetector for Box<T> {
    fn score(&self, text: &str) -> f64 {
        (**self).score(text)
    }
}
