use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ThrottleConfig;

/// Longest reply that counts toward the cadence, in bytes.
pub const PLATFORM_LIMIT: usize = 140;
/// Countdown after (re)start. Keeps the bot quiet for roughly this many replies.
pub const INITIAL_COUNTDOWN: i64 = 1000;
pub const RESET_BASE: i64 = 25;
pub const RESET_JITTER: i64 = 10;

/// Countdown that decides how often a generated reply gets published.
///
/// Only replies short enough to publish count down. Once the countdown drops
/// below zero the next `consume_if_ready` fires and rearms it to
/// `reset_base + [0, reset_jitter)`.
#[derive(Debug)]
pub struct ThrottleController {
    countdown: i64,
    reset_base: i64,
    reset_jitter: i64,
    max_reply_len: usize,
    rng: StdRng,
}

impl Default for ThrottleController {
    fn default() -> Self {
        Self::new(&ThrottleConfig::default())
    }
}

impl ThrottleController {
    pub fn new(config: &ThrottleConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &ThrottleConfig, rng: StdRng) -> Self {
        Self {
            countdown: config.initial_countdown,
            reset_base: config.reset_base,
            reset_jitter: config.reset_jitter.max(1),
            max_reply_len: config.max_reply_len,
            rng,
        }
    }

    /// Count a produced reply of `reply_len` bytes.
    /// Returns true if the reply was short enough to count.
    pub fn tick(&mut self, reply_len: usize) -> bool {
        if reply_len > self.max_reply_len {
            return false;
        }
        self.countdown -= 1;
        true
    }

    /// If the countdown has gone negative, rearm it and return true.
    pub fn consume_if_ready(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.countdown = self.reset_base + self.rng.gen_range(0..self.reset_jitter);
        true
    }

    pub fn is_ready(&self) -> bool {
        self.countdown < 0
    }

    pub fn countdown(&self) -> i64 {
        self.countdown
    }
}
