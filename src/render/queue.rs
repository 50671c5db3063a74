use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::channel::{ChannelEvent, RenderChannel};
use super::record::RenderRecord;
use super::RenderError;

/// How many timed-out formulas are remembered so their late results can be
/// told apart from genuine protocol violations.
const LATE_MEMORY: usize = 16;

/// What a submission was made for, and so where its result goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Becomes a new entry at the end of the list.
    Append,
    /// Feeds the open editor's live preview.
    Preview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub formula: String,
    pub purpose: Purpose,
}

/// A routed result, ready for the application to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Appended(RenderRecord),
    Preview(RenderRecord),
    Failed {
        formula: String,
        purpose: Purpose,
        error: RenderError,
    },
}

#[derive(Debug)]
struct InFlight {
    job: Job,
    deadline: Instant,
}

/// Serialises submissions to a [`RenderChannel`].
///
/// At most one formula is with the engine at any time, so results can be
/// matched to requests by position alone. Append jobs are kept in FIFO order;
/// preview requests coalesce into a single slot where the newest text wins and
/// are dispatched ahead of queued appends.
pub struct SubmissionQueue<C> {
    channel: C,
    timeout: Duration,
    ready: bool,
    closed: bool,
    appends: VecDeque<String>,
    preview: Option<String>,
    in_flight: Option<InFlight>,
    timed_out: VecDeque<String>,
    violations: usize,
}

impl<C: RenderChannel> SubmissionQueue<C> {
    pub fn new(channel: C, timeout: Duration) -> Self {
        Self {
            channel,
            timeout,
            ready: false,
            closed: false,
            appends: VecDeque::new(),
            preview: None,
            in_flight: None,
            timed_out: VecDeque::new(),
            violations: 0,
        }
    }

    /// Queues `formula` for rendering into a new list entry.
    pub fn enqueue_append(&mut self, formula: &str, now: Instant) -> Vec<Delivery> {
        if formula.trim().is_empty() {
            debug!("Ignoring empty formula submission");
            return Vec::new();
        }
        if self.closed {
            return vec![closed_failure(formula.to_string(), Purpose::Append)];
        }
        self.appends.push_back(formula.to_string());
        self.dispatch(now)
    }

    /// Asks for a preview of `formula`, replacing any preview still waiting.
    /// Empty text cancels the waiting preview.
    pub fn request_preview(&mut self, formula: &str, now: Instant) -> Vec<Delivery> {
        if formula.trim().is_empty() {
            self.preview = None;
            return Vec::new();
        }
        if self.closed {
            return vec![closed_failure(formula.to_string(), Purpose::Preview)];
        }
        let already_rendering = self.in_flight.as_ref().is_some_and(|current| {
            current.job.purpose == Purpose::Preview && current.job.formula == formula
        });
        if already_rendering {
            self.preview = None;
            return Vec::new();
        }
        self.preview = Some(formula.to_string());
        self.dispatch(now)
    }

    /// Applies one engine event and returns whatever became deliverable.
    pub fn handle(&mut self, event: ChannelEvent, now: Instant) -> Vec<Delivery> {
        match event {
            ChannelEvent::Ready => {
                if !self.ready {
                    info!("Render engine ready");
                }
                self.ready = true;
                self.dispatch(now)
            }
            ChannelEvent::Rendered { formula, markup } => match self.complete(&formula) {
                Some(job) => {
                    let record = RenderRecord::from_bridge(formula, markup);
                    let delivery = match job.purpose {
                        Purpose::Append => Delivery::Appended(record),
                        Purpose::Preview => Delivery::Preview(record),
                    };
                    let mut out = vec![delivery];
                    out.extend(self.dispatch(now));
                    out
                }
                None => Vec::new(),
            },
            ChannelEvent::Failed { formula, message } => match self.complete(&formula) {
                Some(job) => {
                    let mut out = vec![Delivery::Failed {
                        formula: job.formula,
                        purpose: job.purpose,
                        error: RenderError::Rejected(message),
                    }];
                    out.extend(self.dispatch(now));
                    out
                }
                None => Vec::new(),
            },
            ChannelEvent::Closed => self.close(),
        }
    }

    /// Fails the in-flight job once its deadline has passed and moves on.
    pub fn tick(&mut self, now: Instant) -> Vec<Delivery> {
        let expired = self
            .in_flight
            .as_ref()
            .is_some_and(|current| now >= current.deadline);
        if !expired {
            return Vec::new();
        }
        let mut out = Vec::new();
        if let Some(current) = self.in_flight.take() {
            warn!(
                "Render of {:?} timed out after {:?}",
                current.job.formula, self.timeout
            );
            self.remember_timed_out(current.job.formula.clone());
            out.push(Delivery::Failed {
                formula: current.job.formula,
                purpose: current.job.purpose,
                error: RenderError::TimedOut(self.timeout),
            });
        }
        out.extend(self.dispatch(now));
        out
    }

    pub fn in_flight(&self) -> Option<&Job> {
        self.in_flight.as_ref().map(|current| &current.job)
    }

    /// Jobs waiting behind the in-flight one.
    pub fn pending_len(&self) -> usize {
        self.appends.len() + usize::from(self.preview.is_some())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_none() && self.pending_len() == 0
    }

    /// Results that matched nothing in flight.
    pub fn violations(&self) -> usize {
        self.violations
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn complete(&mut self, formula: &str) -> Option<Job> {
        let matches = self
            .in_flight
            .as_ref()
            .is_some_and(|current| current.job.formula == formula);
        if matches {
            return self.in_flight.take().map(|current| current.job);
        }

        if let Some(index) = self.timed_out.iter().position(|late| late == formula) {
            self.timed_out.remove(index);
            debug!("Dropping late result for timed-out formula {:?}", formula);
            return None;
        }

        self.violations += 1;
        match &self.in_flight {
            Some(current) => warn!(
                "Protocol violation: result for {:?} while {:?} is in flight, dropped",
                formula, current.job.formula
            ),
            None => warn!(
                "Protocol violation: result for {:?} with nothing in flight, dropped",
                formula
            ),
        }
        None
    }

    fn dispatch(&mut self, now: Instant) -> Vec<Delivery> {
        let mut out = Vec::new();
        while self.ready && !self.closed && self.in_flight.is_none() {
            let job = if let Some(formula) = self.preview.take() {
                Job {
                    formula,
                    purpose: Purpose::Preview,
                }
            } else if let Some(formula) = self.appends.pop_front() {
                Job {
                    formula,
                    purpose: Purpose::Append,
                }
            } else {
                break;
            };

            match self.channel.submit(&job.formula) {
                Ok(()) => {
                    debug!("Submitted {:?} for {:?}", job.formula, job.purpose);
                    self.in_flight = Some(InFlight {
                        job,
                        deadline: now + self.timeout,
                    });
                }
                Err(err) => {
                    warn!("Submission of {:?} failed: {}", job.formula, err);
                    out.push(Delivery::Failed {
                        formula: job.formula,
                        purpose: job.purpose,
                        error: RenderError::Channel(err),
                    });
                }
            }
        }
        out
    }

    fn close(&mut self) -> Vec<Delivery> {
        if self.closed {
            return Vec::new();
        }
        warn!("Render channel closed");
        self.closed = true;
        self.ready = false;

        let mut out = Vec::new();
        if let Some(current) = self.in_flight.take() {
            out.push(closed_failure(current.job.formula, current.job.purpose));
        }
        if let Some(formula) = self.preview.take() {
            out.push(closed_failure(formula, Purpose::Preview));
        }
        for formula in self.appends.drain(..) {
            out.push(closed_failure(formula, Purpose::Append));
        }
        out
    }

    fn remember_timed_out(&mut self, formula: String) {
        if self.timed_out.len() == LATE_MEMORY {
            self.timed_out.pop_front();
        }
        self.timed_out.push_back(formula);
    }
}

fn closed_failure(formula: String, purpose: Purpose) -> Delivery {
    Delivery::Failed {
        formula,
        purpose,
        error: RenderError::ChannelClosed,
    }
}
