use crate::commands::address::quote_out;
use crate::commands::Out;
use crate::{Config, Mode, Quoter, Result};
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info};

/// Counts of what happened during a session.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Addresses read from the input.
    pub submitted: usize,
    /// Quotes that completed while they were still the latest submission.
    pub quoted: usize,
    /// Quotes that were discarded because a newer address arrived first.
    pub superseded: usize,
}

/// Handles the `quote session` command, which quotes addresses read from stdin.
pub async fn session(config: &Config, mode: Mode) -> Result<Out<SessionSummary>> {
    let quoter = Arc::new(Quoter::from_config(config, mode).await?);
    quoter
        .delivery_days()
        .settled_within(config.request_timeout())
        .await;
    info!("Enter one address per line, end with Ctrl-D");
    let summary = run_session(quoter, BufReader::new(tokio::io::stdin())).await?;
    Ok(Out::new(
        format!(
            "Quoted {} of {} addresses",
            summary.quoted, summary.submitted
        ),
        summary,
    ))
}

/// Submits each non-empty line of `input` as soon as it is read, without waiting for earlier
/// quotes to finish. Each quote is printed when it completes, unless a later line superseded it.
pub async fn run_session<R>(quoter: Arc<Quoter>, input: R) -> Result<SessionSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut session = Session::new(quoter);

    while let Some(line) = lines
        .next_line()
        .await
        .context("Unable to read an address")?
    {
        session.reap()?;
        let address = line.trim();
        if address.is_empty() {
            continue;
        }
        session.submit(address).await;
    }
    session.finish().await
}

/// The quotes in flight for one session and the tally of those that have finished.
struct Session {
    quoter: Arc<Quoter>,
    tasks: JoinSet<bool>,
    summary: SessionSummary,
}

impl Session {
    fn new(quoter: Arc<Quoter>) -> Self {
        Self {
            quoter,
            tasks: JoinSet::new(),
            summary: SessionSummary::default(),
        }
    }

    async fn submit(&mut self, address: &str) {
        self.summary.submitted += 1;
        // The token is taken here so that submissions are ordered by input line.
        let submission = self.quoter.begin().await;
        let quoter = self.quoter.clone();
        let address = address.to_string();
        self.tasks.spawn(async move {
            match quoter.run(submission, &address).await {
                Some(quote) => {
                    quote_out(&address, quote).print();
                    true
                }
                None => {
                    debug!("Discarded the quote for '{address}'");
                    false
                }
            }
        });
    }

    /// Counts the quotes that have already finished without waiting for the rest.
    fn reap(&mut self) -> Result<()> {
        while let Some(result) = self.tasks.try_join_next() {
            self.tally(result)?;
        }
        Ok(())
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    fn tally(&mut self, result: std::result::Result<bool, JoinError>) -> Result<()> {
        if result.context("A quote task failed")? {
            self.summary.quoted += 1;
        } else {
            self.summary.superseded += 1;
        }
        Ok(())
    }

    async fn finish(mut self) -> Result<SessionSummary> {
        while let Some(result) = self.tasks.join_next().await {
            self.tally(result)?;
        }
        Ok(self.summary)
    }
}
