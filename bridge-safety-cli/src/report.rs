//! Replay summary accounting and printing

use bridge_safety::SafetyValidator;

/// Counters accumulated over one replay
#[derive(Debug, Default, Clone)]
pub struct ReplaySummary {
    pub observations: usize,
    pub tx_allowed: usize,
    pub tx_blocked: usize,
    pub forwarded: usize,
    pub dropped: usize,
}

impl ReplaySummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_observation(&mut self) {
        self.observations += 1;
    }

    pub fn record_tx(&mut self, allowed: bool) {
        if allowed {
            self.tx_allowed += 1;
        } else {
            self.tx_blocked += 1;
        }
    }

    pub fn record_forward(&mut self, relayed: bool) {
        if relayed {
            self.forwarded += 1;
        } else {
            self.dropped += 1;
        }
    }

    pub fn total_records(&self) -> usize {
        self.observations + self.tx_allowed + self.tx_blocked + self.forwarded + self.dropped
    }

    /// Print the end-of-replay report
    pub fn print(&self, validator: &SafetyValidator) {
        println!("\n───────────────────────────────────────────────");
        println!("  Replay Summary - {}", validator.profile().name);
        println!("───────────────────────────────────────────────");
        println!("  Records replayed:  {}", self.total_records());
        println!("  Observations:      {}", self.observations);
        println!("  Tx allowed:        {}", self.tx_allowed);
        println!("  Tx blocked:        {}", self.tx_blocked);
        println!("  Forwarded:         {}", self.forwarded);
        println!("  Dropped:           {}", self.dropped);
        println!(
            "  Final state:       controls_allowed={} relay_malfunction={}",
            validator.controls_allowed(),
            validator.relay_malfunction()
        );
    }
}
