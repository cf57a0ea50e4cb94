//! Word-level, order-2 Markov chain learner.

use anyhow::{Context as _, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::Learner;
use crate::config::LearnerConfig;

/// Two-word context. The empty string marks the start or end of a sentence.
type Context = (String, String);

const BRAIN_VERSION: u32 = 1;

/// On-disk form of the chain. JSON objects need string keys, so contexts are stored as entries.
#[derive(Debug, Serialize, Deserialize)]
struct BrainFile {
    version: u32,
    entries: Vec<ChainEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChainEntry {
    context: Context,
    next: Vec<String>,
}

pub struct MarkovLearner {
    /// context -> observed next words (duplicates carry the frequency)
    chain: HashMap<Context, Vec<String>>,
    max_reply_words: usize,
    rng: StdRng,
    brain_path: Option<PathBuf>,
    /// Learned something since the last save.
    dirty: bool,
}

impl MarkovLearner {
    pub fn new(config: &LearnerConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_rng(config: &LearnerConfig, rng: StdRng) -> Self {
        Self {
            chain: HashMap::new(),
            max_reply_words: config.max_reply_words.max(1),
            rng,
            brain_path: config
                .brain_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            dirty: false,
        }
    }

    /// Build a learner, restoring the chain from `brain_path` if the file exists.
    pub fn open(config: &LearnerConfig) -> Result<Self> {
        let mut learner = Self::new(config);
        if let Some(path) = learner.brain_path.clone() {
            if path.exists() {
                learner.load(&path)?;
                tracing::info!(
                    path = %path.display(),
                    contexts = learner.context_count(),
                    "restored learner state"
                );
            }
        }
        Ok(learner)
    }

    /// Replace the chain with the one stored at `path`.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read brain file: {}", path.display()))?;
        let brain: BrainFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse brain file: {}", path.display()))?;
        if brain.version != BRAIN_VERSION {
            anyhow::bail!(
                "unsupported brain file version {} in {}",
                brain.version,
                path.display()
            );
        }
        self.chain = brain
            .entries
            .into_iter()
            .map(|e| (e.context, e.next))
            .collect();
        self.dirty = false;
        Ok(())
    }

    /// Write the chain to `path`, going through a temp file so a crash never leaves half a brain.
    pub fn save(&self, path: &Path) -> Result<()> {
        let brain = BrainFile {
            version: BRAIN_VERSION,
            entries: self
                .chain
                .iter()
                .map(|(context, next)| ChainEntry {
                    context: context.clone(),
                    next: next.clone(),
                })
                .collect(),
        };
        let json = serde_json::to_string(&brain).context("failed to serialize brain")?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write brain file: {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace brain file: {}", path.display()))?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Number of distinct contexts learned.
    pub fn context_count(&self) -> usize {
        self.chain.len()
    }

    fn start_context() -> Context {
        (String::new(), String::new())
    }
}

impl Learner for MarkovLearner {
    fn learn(&mut self, text: &str) {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return;
        }
        self.dirty = true;

        let mut context = Self::start_context();
        for word in words
            .into_iter()
            .map(str::to_string)
            .chain(std::iter::once(String::new()))
        {
            self.chain.entry(context.clone()).or_default().push(word.clone());
            context = (context.1, word);
        }
    }

    /// Starts from a learned sentence opener that appears in `text` when one
    /// exists, otherwise from any opener. Empty model -> empty reply.
    fn reply(&mut self, text: &str) -> String {
        let Some(starts) = self.chain.get(&Self::start_context()) else {
            return String::new();
        };

        let keywords: HashSet<&str> = text.split_whitespace().collect();
        let preferred: Vec<&String> = starts
            .iter()
            .filter(|w| keywords.contains(w.as_str()))
            .collect();
        let first = match preferred.choose(&mut self.rng) {
            Some(w) => (*w).clone(),
            None => match starts.choose(&mut self.rng) {
                Some(w) => w.clone(),
                None => return String::new(),
            },
        };

        let mut context = (String::new(), first.clone());
        let mut out = vec![first];
        while out.len() < self.max_reply_words {
            let Some(next) = self.chain.get(&context).and_then(|n| n.choose(&mut self.rng)) else {
                break;
            };
            if next.is_empty() {
                break;
            }
            out.push(next.clone());
            context = (context.1, next.clone());
        }
        out.join(" ")
    }

    fn persist(&mut self) -> Result<()> {
        let Some(path) = &self.brain_path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        self.save(path)?;
        self.dirty = false;
        Ok(())
    }
}
