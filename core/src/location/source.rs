//! Accuracy-filtered location stream.
//!
//! The platform positioning adapter owns a [`LocationFeed`] and pushes every
//! batch of readings it receives. Exactly one [`LocationStream`] exists per
//! source; it ends only when every feed handle has been dropped and cannot be
//! restarted afterwards.

use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::model::LocationFix;
use crate::prelude::SessionConfig;
use crate::telemetry::{LogManager, SessionMetrics};

pub struct LocationSource;

impl LocationSource {
    /// Creates the producer/consumer pair for one session.
    pub fn channel(
        config: &SessionConfig,
        metrics: Arc<SessionMetrics>,
    ) -> (LocationFeed, LocationStream) {
        let (tx, rx) = mpsc::unbounded_channel();
        let feed = LocationFeed {
            tx,
            max_accuracy_m: config.max_horizontal_accuracy_m,
            metrics,
            logger: Arc::new(LogManager::new("location")),
        };
        (feed, LocationStream { rx })
    }
}

/// Producer side of the location stream. Never blocks.
#[derive(Clone)]
pub struct LocationFeed {
    tx: mpsc::UnboundedSender<LocationFix>,
    max_accuracy_m: f64,
    metrics: Arc<SessionMetrics>,
    logger: Arc<LogManager>,
}

impl LocationFeed {
    /// Pushes a batch of platform readings, returning how many passed the accuracy filter.
    pub fn deliver<I>(&self, fixes: I) -> usize
    where
        I: IntoIterator<Item = LocationFix>,
    {
        let mut accepted = 0;
        for fix in fixes {
            if !fix.is_accurate_within(self.max_accuracy_m) {
                self.metrics.record_fix_dropped();
                continue;
            }
            if self.tx.send(fix).is_err() {
                self.logger.detail("location consumer gone; fix discarded");
                continue;
            }
            self.metrics.record_fix_accepted();
            accepted += 1;
        }
        accepted
    }

    pub fn deliver_one(&self, fix: LocationFix) -> bool {
        self.deliver(std::iter::once(fix)) == 1
    }

    /// Logs a positioning failure. The stream stays open and nothing is emitted.
    pub fn report_error(&self, error: &dyn Display) {
        self.logger
            .warn(&format!("failed to get location: {}", error));
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single consumer of accepted fixes.
pub struct LocationStream {
    rx: mpsc::UnboundedReceiver<LocationFix>,
}

impl LocationStream {
    /// Awaits the next accepted fix; `None` once every feed handle is dropped.
    pub async fn next(&mut self) -> Option<LocationFix> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<LocationFix> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinate;

    fn fix(accuracy: f64) -> LocationFix {
        LocationFix::new(Coordinate::new(45.0, -73.0), accuracy, 0.0)
    }

    fn source() -> (LocationFeed, LocationStream, Arc<SessionMetrics>) {
        let metrics = Arc::new(SessionMetrics::new());
        let (feed, stream) = LocationSource::channel(&SessionConfig::default(), metrics.clone());
        (feed, stream, metrics)
    }

    #[test]
    fn inaccurate_fixes_are_never_emitted() {
        let (feed, mut stream, metrics) = source();

        let accepted = feed.deliver([fix(20.5), fix(65.0), fix(f64::NAN), fix(1000.0)]);

        assert_eq!(accepted, 0);
        assert!(stream.try_next().is_none());
        assert_eq!(metrics.snapshot().fixes_dropped, 4);
    }

    #[test]
    fn boundary_accuracy_is_accepted_in_order() {
        let (feed, mut stream, _) = source();

        let accepted = feed.deliver([fix(20.0), fix(21.0), fix(3.0)]);

        assert_eq!(accepted, 2);
        assert_eq!(stream.try_next().unwrap().horizontal_accuracy, 20.0);
        assert_eq!(stream.try_next().unwrap().horizontal_accuracy, 3.0);
        assert!(stream.try_next().is_none());
    }

    #[tokio::test]
    async fn errors_do_not_terminate_the_stream() {
        let (feed, mut stream, _) = source();

        feed.report_error(&"kCLErrorLocationUnknown");
        assert!(feed.deliver_one(fix(5.0)));

        assert_eq!(stream.next().await.unwrap().horizontal_accuracy, 5.0);
    }

    #[tokio::test]
    async fn stream_ends_when_all_feeds_drop() {
        let (feed, mut stream, _) = source();
        let second = feed.clone();
        drop(feed);
        assert!(second.deliver_one(fix(1.0)));
        drop(second);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
    }

    #[test]
    fn delivery_after_consumer_drop_is_a_no_op() {
        let (feed, stream, metrics) = source();
        drop(stream);

        assert!(feed.is_closed());
        assert_eq!(feed.deliver([fix(2.0)]), 0);
        assert_eq!(metrics.snapshot().fixes_accepted, 0);
    }
}
