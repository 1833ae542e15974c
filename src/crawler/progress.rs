/// Receives crawl progress as a whole percentage
pub trait ProgressReporter: Send + Sync {
    fn render(&self, percent: u8);

    /// Shows the terminal "complete" state
    fn render_complete(&self);

    /// Removes the indicator without a completion state
    fn dismiss(&self);
}

/// Reports progress through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn render(&self, percent: u8) {
        tracing::info!("Crawl progress: {}%", percent);
    }

    fn render_complete(&self) {
        tracing::info!("Crawl complete");
    }

    fn dismiss(&self) {
        tracing::debug!("Progress indicator dismissed");
    }
}

/// Discards all progress updates
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn render(&self, _percent: u8) {}
    fn render_complete(&self) {}
    fn dismiss(&self) {}
}
