//! The poll-respond loop: fetch new posts, learn from them, and now and then reply.

use anyhow::Context;

use crate::config::Config;
use crate::engine::{is_quiet, normalize, FeedCursor, ResponseFormatter, ThrottleController};
use crate::feed::types::{Post, SearchFilter};
use crate::feed::FeedClient;
use crate::learner::Learner;
use chrono::NaiveDateTime;
use std::time::Duration;

/// Source of local wall-clock time for the quiet-hours gate.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Why a cycle stopped early. State already applied for earlier posts stays applied.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("fetching posts failed: {0:#}")]
    Fetch(anyhow::Error),
    #[error("publishing reply failed: {0:#}")]
    Publish(anyhow::Error),
}

/// State carried from one cycle to the next. Lost on restart.
#[derive(Debug)]
pub struct BotState {
    pub cursor: FeedCursor,
    pub throttle: ThrottleController,
}

/// Summary of one cycle, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    /// Replies short enough to count down the throttle.
    pub counted: usize,
    pub published: Vec<String>,
    /// Ready signals consumed during quiet hours.
    pub suppressed_quiet: usize,
    /// Ready signals consumed in dry-run mode.
    pub dry_run: usize,
    pub cursor: u64,
}

pub struct PollRespondLoop<F, L, C> {
    feed: F,
    learner: L,
    clock: C,
    filter: SearchFilter,
    formatter: ResponseFormatter,
    state: BotState,
    dry_run: bool,
    poll_interval: Duration,
    max_consecutive_failures: u32,
}

impl<F: FeedClient, L: Learner, C: Clock> PollRespondLoop<F, L, C> {
    pub fn new(config: &Config, feed: F, learner: L, clock: C) -> Self {
        Self {
            feed,
            learner,
            clock,
            filter: SearchFilter::from_config(&config.feed),
            formatter: ResponseFormatter::from_config(&config.response),
            state: BotState {
                cursor: FeedCursor::default(),
                throttle: ThrottleController::new(&config.throttle),
            },
            dry_run: config.bot.dry_run,
            poll_interval: Duration::from_secs(config.bot.poll_interval_s),
            max_consecutive_failures: config.bot.max_consecutive_failures,
        }
    }

    pub fn with_throttle(mut self, throttle: ThrottleController) -> Self {
        self.state.throttle = throttle;
        self
    }

    pub fn with_cursor(mut self, cursor: FeedCursor) -> Self {
        self.state.cursor = cursor;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    /// Run cycles forever, sleeping `poll_interval` between them.
    ///
    /// The learner is persisted after every cycle; a failed save ends the loop.
    /// Otherwise returns only when more than `max_consecutive_failures` cycles fail in a row.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut failures: u32 = 0;
        loop {
            let outcome = self.run_cycle().await;
            // Posts learned before a failure are saved too.
            self.learner
                .persist()
                .context("failed to save learner state")?;
            match outcome {
                Ok(report) => {
                    failures = 0;
                    tracing::info!(
                        fetched = report.fetched,
                        published = report.published.len(),
                        cursor = report.cursor,
                        countdown = self.state.throttle.countdown(),
                        "cycle complete"
                    );
                }
                Err(e) => {
                    failures += 1;
                    if failures > self.max_consecutive_failures {
                        tracing::error!(error = %e, failures, "cycle failed, giving up");
                        return Err(e.into());
                    }
                    tracing::warn!(
                        error = %e,
                        failures,
                        limit = self.max_consecutive_failures,
                        "cycle failed, retrying next interval"
                    );
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Fetch everything newer than the cursor and process it in received order.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, CycleError> {
        let since_id = self.state.cursor.value();
        let posts = self
            .feed
            .fetch_since(&self.filter, since_id)
            .await
            .map_err(CycleError::Fetch)?;

        let mut report = CycleReport {
            fetched: posts.len(),
            ..CycleReport::default()
        };
        for post in &posts {
            self.process_post(post, &mut report).await?;
        }
        report.cursor = self.state.cursor.value();
        Ok(report)
    }

    // Order matters: reply before learn, learn unconditionally, tick whether or
    // not the gate lets a publish through, and advance the cursor per post.
    async fn process_post(&mut self, post: &Post, report: &mut CycleReport) -> Result<(), CycleError> {
        let clean = normalize(&post.raw_text);
        let generated = self.learner.reply(&clean);
        self.learner.learn(&clean);

        let response = self.formatter.format(&generated);
        // Bytes, not characters.
        let reply_len = response.len();
        if self.state.throttle.tick(reply_len) {
            report.counted += 1;
        }

        tracing::debug!(
            id = post.id,
            author = %post.author,
            text = %clean,
            reply_len,
            response = %response,
            countdown = self.state.throttle.countdown(),
            "processed post"
        );

        if self.state.throttle.consume_if_ready() {
            if is_quiet(&self.clock.now()) {
                // A missed window is dropped, not queued.
                report.suppressed_quiet += 1;
                tracing::info!(response = %response, "quiet hours, reply not published");
            } else if self.dry_run {
                report.dry_run += 1;
                tracing::warn!(response = %response, "DRY RUN: would publish reply");
            } else {
                self.feed
                    .publish(&response)
                    .await
                    .map_err(CycleError::Publish)?;
                tracing::info!(response = %response, "reply published");
                report.published.push(response);
            }
        }

        self.state.cursor.advance(post.id);
        Ok(())
    }
}
