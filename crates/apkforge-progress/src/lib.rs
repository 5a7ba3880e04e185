//! Typed progress event stream with cooperative cancellation.
//!
//! Producers drive a [`Reporter`] through `begin` / `advance` / `finish`;
//! observers receive [`ProgressEvent`]s through a callback and may request
//! cancellation by returning `false`. Cancellation is cooperative: it is
//! checked on every event delivery, never preemptively.

use std::sync::Arc;

use thiserror::Error;

/// Stage of a progress event within one logical operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStage {
    /// First event of a sequence. Precedes all `Progress` events.
    Start,
    /// A unit of work was completed; `delta` carries the increment.
    Progress,
    /// Last event of a sequence, emitted exactly once after the final
    /// `Progress` event.
    Stop,
    /// Tears down an existing sequence and starts a new one on the same
    /// observer, e.g. when an acquisition moves from download to extraction.
    Reset,
}

/// What the `current`/`total`/`delta` counters measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressUnit {
    /// Abstract work items (archive members, pipeline steps).
    #[default]
    Generic,
    /// Bytes of a streaming transfer.
    Bytes,
}

/// A single progress event. Ephemeral; observers must not assume events
/// outlive the callback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    pub unit: ProgressUnit,
    pub description: String,
    pub current: u64,
    /// `None` for unknown-length operations. Once known it never decreases,
    /// except to absorb an over-read (`current > total` ⇒ `total = current`).
    pub total: Option<u64>,
    pub delta: u64,
}

/// Observer callback. Returning `false` requests cancellation.
pub type ProgressFn = Arc<dyn Fn(&ProgressEvent) -> bool + Send + Sync>;

/// Raised when the observer requested cancellation. A distinguished
/// condition, never conflated with failure.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("operation cancelled by progress observer")]
pub struct Cancelled;

/// Owns one observer and sequences events through it.
///
/// A reporter may carry several consecutive sequences: the first `begin`
/// emits `Start`, every later one emits `Reset` so the observer can tear
/// down its previous rendering.
pub struct Reporter {
    callback: Option<ProgressFn>,
    event: Option<ProgressEvent>,
    sequences: u32,
}

impl Reporter {
    pub fn new(callback: Option<ProgressFn>) -> Self {
        Self {
            callback,
            event: None,
            sequences: 0,
        }
    }

    /// A reporter that drops every event. Useful for callers without an
    /// observer.
    pub fn sink() -> Self {
        Self::new(None)
    }

    /// Open a new sequence. Emits `Start` for the first sequence on this
    /// reporter and `Reset` for every subsequent one.
    pub fn begin(
        &mut self,
        description: impl Into<String>,
        unit: ProgressUnit,
        total: Option<u64>,
    ) -> Result<(), Cancelled> {
        let stage = if self.sequences == 0 {
            ProgressStage::Start
        } else {
            ProgressStage::Reset
        };
        self.sequences += 1;
        let event = ProgressEvent {
            stage,
            unit,
            description: description.into(),
            current: 0,
            total,
            delta: 0,
        };
        let cancelled = !self.notify(&event);
        self.event = Some(event);
        if cancelled { Err(Cancelled) } else { Ok(()) }
    }

    /// Record `delta` completed units and emit a `Progress` event.
    /// Zero-sized deltas are skipped without an event.
    pub fn advance(&mut self, delta: u64) -> Result<(), Cancelled> {
        if delta == 0 {
            return Ok(());
        }
        let Some(event) = self.event.as_mut() else {
            return Ok(());
        };
        event.stage = ProgressStage::Progress;
        event.delta = delta;
        event.current += delta;
        if let Some(total) = event.total
            && event.current > total
        {
            event.total = Some(event.current);
        }
        let event = event.clone();
        if self.notify(&event) { Ok(()) } else { Err(Cancelled) }
    }

    /// Close the current sequence with a `Stop` event. A sequence that was
    /// never opened (zero units of work) emits nothing.
    pub fn finish(&mut self) {
        if let Some(mut event) = self.event.take() {
            event.stage = ProgressStage::Stop;
            event.delta = 0;
            self.notify(&event);
        }
    }

    pub fn current(&self) -> u64 {
        self.event.as_ref().map_or(0, |e| e.current)
    }

    fn notify(&self, event: &ProgressEvent) -> bool {
        match &self.callback {
            Some(callback) => callback(event),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn recording() -> (ProgressFn, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressFn = Arc::new(move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.clone());
            true
        });
        (callback, events)
    }

    #[test]
    fn start_precedes_progress_and_stop_closes() {
        let (callback, events) = recording();
        let mut reporter = Reporter::new(Some(callback));
        reporter.begin("work", ProgressUnit::Generic, Some(2)).unwrap();
        reporter.advance(1).unwrap();
        reporter.advance(1).unwrap();
        reporter.finish();

        let events = events.lock().unwrap();
        let stages: Vec<_> = events.iter().map(|e| e.stage).collect();
        assert_eq!(
            stages,
            vec![
                ProgressStage::Start,
                ProgressStage::Progress,
                ProgressStage::Progress,
                ProgressStage::Stop,
            ]
        );
        assert_eq!(events.last().unwrap().current, 2);
    }

    #[test]
    fn second_sequence_emits_reset() {
        let (callback, events) = recording();
        let mut reporter = Reporter::new(Some(callback));
        reporter.begin("download", ProgressUnit::Bytes, Some(10)).unwrap();
        reporter.advance(10).unwrap();
        reporter.finish();
        reporter.begin("unpack", ProgressUnit::Generic, Some(3)).unwrap();
        reporter.finish();

        let events = events.lock().unwrap();
        assert_eq!(events[0].stage, ProgressStage::Start);
        assert_eq!(events[3].stage, ProgressStage::Reset);
        assert_eq!(events[3].description, "unpack");
        assert_eq!(events[3].current, 0);
    }

    #[test]
    fn over_read_absorbs_into_total() {
        let (callback, events) = recording();
        let mut reporter = Reporter::new(Some(callback));
        reporter.begin("dl", ProgressUnit::Bytes, Some(100)).unwrap();
        reporter.advance(80).unwrap();
        reporter.advance(40).unwrap();
        reporter.finish();

        let events = events.lock().unwrap();
        let last_progress = &events[2];
        assert_eq!(last_progress.current, 120);
        assert_eq!(last_progress.total, Some(120));
    }

    #[test]
    fn zero_delta_emits_nothing() {
        let (callback, events) = recording();
        let mut reporter = Reporter::new(Some(callback));
        reporter.begin("dl", ProgressUnit::Bytes, None).unwrap();
        reporter.advance(0).unwrap();
        reporter.finish();

        let stages: Vec<_> = events.lock().unwrap().iter().map(|e| e.stage).collect();
        assert_eq!(stages, vec![ProgressStage::Start, ProgressStage::Stop]);
    }

    #[test]
    fn zero_unit_sequence_may_skip_start_and_stop() {
        let (callback, events) = recording();
        let mut reporter = Reporter::new(Some(callback));
        // Producer decided there is nothing to do and never began.
        reporter.finish();
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn observer_false_is_cancellation() {
        let callback: ProgressFn = Arc::new(|event: &ProgressEvent| event.current < 2);
        let mut reporter = Reporter::new(Some(callback));
        reporter.begin("dl", ProgressUnit::Bytes, Some(4)).unwrap();
        reporter.advance(1).unwrap();
        assert_eq!(reporter.advance(1), Err(Cancelled));
    }

    #[test]
    fn cancellation_at_start() {
        let callback: ProgressFn = Arc::new(|_: &ProgressEvent| false);
        let mut reporter = Reporter::new(Some(callback));
        assert_eq!(
            reporter.begin("dl", ProgressUnit::Bytes, None),
            Err(Cancelled)
        );
    }
}
