/// Frame tally used for durations: sleep delay, jump duration, attack
/// duration. Counts up to a fixed target and reports when it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    target: u32,
    tally: u32,
}

impl Counter {
    pub fn new(target: u32) -> Self {
        Self { target, tally: 0 }
    }

    /// Advance by one frame and report whether the target is reached.
    pub fn update(&mut self) -> bool {
        self.update_by(1)
    }

    pub fn update_by(&mut self, amount: u32) -> bool {
        self.tally = self.tally.saturating_add(amount);
        self.evaluate()
    }

    /// Report without incrementing.
    pub fn evaluate(&self) -> bool {
        self.tally >= self.target
    }

    pub fn reset(&mut self) -> &mut Self {
        self.tally = 0;
        self
    }

    pub fn target(&self) -> u32 {
        self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaches_target_after_exact_updates() {
        let mut counter = Counter::new(3);
        assert!(!counter.update());
        assert!(!counter.update());
        assert!(counter.update());
    }

    #[test]
    fn evaluate_does_not_increment() {
        let mut counter = Counter::new(2);
        counter.update();
        assert!(!counter.evaluate());
        assert!(!counter.evaluate());
        assert!(counter.update());
    }

    #[test]
    fn reset_chains() {
        let mut counter = Counter::new(1);
        counter.update();
        assert!(!counter.reset().evaluate());
    }

    #[test]
    fn update_by_counts_in_bulk() {
        let mut counter = Counter::new(10);
        assert!(!counter.update_by(9));
        assert!(counter.update_by(1));
    }
}
