use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::{Duration, Instant};

use super::channel::{ChannelEvent, RenderChannel};
use super::queue::{Delivery, Job, SubmissionQueue};

/// The submission queue joined with the receiver its channel reports on.
///
/// Everything runs on the caller's thread: `poll` drains whatever events
/// have arrived and never blocks.
pub struct RenderPipeline<C> {
    queue: SubmissionQueue<C>,
    events: Receiver<ChannelEvent>,
}

impl<C: RenderChannel> RenderPipeline<C> {
    pub fn new(channel: C, events: Receiver<ChannelEvent>, timeout: Duration) -> Self {
        Self {
            queue: SubmissionQueue::new(channel, timeout),
            events,
        }
    }

    pub fn enqueue_append(&mut self, formula: &str) -> Vec<Delivery> {
        self.queue.enqueue_append(formula, Instant::now())
    }

    pub fn request_preview(&mut self, formula: &str) -> Vec<Delivery> {
        self.queue.request_preview(formula, Instant::now())
    }

    /// Applies every event already waiting, then checks the in-flight deadline.
    pub fn poll(&mut self, now: Instant) -> Vec<Delivery> {
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => out.extend(self.queue.handle(event, now)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    out.extend(self.queue.handle(ChannelEvent::Closed, now));
                    break;
                }
            }
        }
        out.extend(self.queue.tick(now));
        out
    }

    pub fn in_flight(&self) -> Option<&Job> {
        self.queue.in_flight()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn is_ready(&self) -> bool {
        self.queue.is_ready()
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }

    pub fn queue(&self) -> &SubmissionQueue<C> {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::channel::ChannelError;
    use std::sync::mpsc;

    struct Null;

    impl RenderChannel for Null {
        fn submit(&mut self, _formula: &str) -> Result<(), ChannelError> {
            Ok(())
        }
    }

    #[test]
    fn poll_applies_queued_events() {
        let (tx, rx) = mpsc::channel();
        let mut pipeline = RenderPipeline::new(Null, rx, Duration::from_secs(5));
        pipeline.enqueue_append("a");
        tx.send(ChannelEvent::Ready).unwrap();
        tx.send(ChannelEvent::Rendered {
            formula: "a".into(),
            markup: b"<svg/>".to_vec(),
        })
        .unwrap();

        let out = pipeline.poll(Instant::now());
        assert!(matches!(&out[..], [Delivery::Appended(r)] if r.formula() == "a"));
        assert!(pipeline.is_idle());
    }

    #[test]
    fn dropped_sender_closes_the_pipeline() {
        let (tx, rx) = mpsc::channel::<ChannelEvent>();
        let mut pipeline = RenderPipeline::new(Null, rx, Duration::from_secs(5));
        pipeline.enqueue_append("a");
        drop(tx);

        let out = pipeline.poll(Instant::now());
        assert!(matches!(&out[..], [Delivery::Failed { formula, .. }] if formula == "a"));
        assert!(pipeline.is_closed());
    }
}
