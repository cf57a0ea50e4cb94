pub mod markov;

pub use markov::MarkovLearner;

/// Incrementally trained text model the bot learns from and replies with.
///
/// Only ever driven from the poll loop, one call at a time.
pub trait Learner {
    /// Generate a reply to `text` from the current model state.
    fn reply(&mut self, text: &str) -> String;
    /// Train on `text`.
    fn learn(&mut self, text: &str);
    /// Flush learned state to durable storage, if the learner keeps any.
    fn persist(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}
