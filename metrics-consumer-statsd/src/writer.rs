use std::collections::VecDeque;

use crate::MetricType;

pub(crate) const SMALLEST_VALID_PAYLOAD: &[u8] = b"a:0|c\n";

/// Result of writing a metric to a [`PayloadWriter`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteResult {
    lines_written: u64,
    points_dropped: u64,
    payloads_evicted: u64,
}

impl WriteResult {
    const fn success(lines_written: u64, payloads_evicted: u64) -> Self {
        Self { lines_written, points_dropped: 0, payloads_evicted }
    }

    const fn failure(points_dropped: u64) -> Self {
        Self { lines_written: 0, points_dropped, payloads_evicted: 0 }
    }

    /// Returns `true` if the metric was dropped.
    pub const fn any_failures(&self) -> bool {
        self.points_dropped != 0
    }

    /// Returns the number of StatsD lines written.
    pub const fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Returns the number of points dropped.
    pub const fn points_dropped(&self) -> u64 {
        self.points_dropped
    }

    /// Returns the number of buffered payloads evicted to make room for this write.
    pub const fn payloads_evicted(&self) -> u64 {
        self.payloads_evicted
    }
}

/// Writes StatsD lines into larger buffers for more efficient network I/O.
///
/// StatsD metrics are newline delimited, which means that multiple metrics can be sent in a single "payload", and then
/// trivially split apart by the remote server. Each payload contains one or more complete lines while never exceeding
/// the maximum payload length. A metric whose lines could not fit in an empty payload is dropped.
///
/// At most `max_payloads` finished payloads are held, in addition to the one being filled. Once that limit is reached,
/// finishing another payload evicts the oldest one.
///
/// Every metric name is written as `<namespace>.<name>`, unless the namespace is empty.
pub struct PayloadWriter {
    namespace: String,
    max_payload_len: usize,
    max_payloads: usize,
    finished: VecDeque<Vec<u8>>,
    current: Vec<u8>,
    pending: Vec<u8>,
    payloads_evicted: u64,
    int_writer: itoa::Buffer,
}

impl PayloadWriter {
    /// Creates a new `PayloadWriter` with the given namespace, maximum payload length, and maximum number of finished
    /// payloads to hold.
    pub fn new<N: Into<String>>(namespace: N, max_payload_len: usize, max_payloads: usize) -> Self {
        // NOTE: The builder also validates these, but the writer can be constructed directly.
        let max_payload_len = max_payload_len.max(SMALLEST_VALID_PAYLOAD.len());
        let max_payloads = max_payloads.max(1);

        Self {
            namespace: namespace.into(),
            max_payload_len,
            max_payloads,
            finished: VecDeque::new(),
            current: Vec::new(),
            pending: Vec::new(),
            payloads_evicted: 0,
            int_writer: itoa::Buffer::new(),
        }
    }

    /// Returns the namespace applied to every metric name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the number of finished payloads currently held.
    pub fn buffered_payloads(&self) -> usize {
        self.finished.len()
    }

    /// Returns the total number of payloads evicted since the writer was created.
    pub fn payloads_evicted(&self) -> u64 {
        self.payloads_evicted
    }

    /// Finalizes the current payload and starts a new one, evicting the oldest finished payload if the limit has been
    /// reached.
    ///
    /// Returns the number of payloads evicted. If the current payload is empty, this method does nothing.
    fn finalize_current_payload(&mut self) -> u64 {
        if self.current.is_empty() {
            return 0;
        }

        let mut evicted = 0;
        while self.finished.len() >= self.max_payloads {
            self.finished.pop_front();
            evicted += 1;
        }
        self.payloads_evicted += evicted;

        self.finished.push_back(std::mem::take(&mut self.current));
        evicted
    }

    /// Commits the pending lines to the current payload.
    ///
    /// If the pending lines are larger than the maximum payload length, they are discarded. If the current payload
    /// cannot fit them without exceeding the maximum payload length, the current payload is finalized first.
    ///
    /// Returns the number of payloads evicted, or `None` if the pending lines were discarded.
    fn commit(&mut self) -> Option<u64> {
        let pending_len = self.pending.len();
        if pending_len > self.max_payload_len {
            self.pending.clear();
            return None;
        }

        let evicted = if self.current.len() + pending_len > self.max_payload_len {
            self.finalize_current_payload()
        } else {
            0
        };

        self.current.extend_from_slice(&self.pending);
        self.pending.clear();

        Some(evicted)
    }

    fn write_line(&mut self, name: &str, value: i64, metric_type: MetricType) {
        if !self.namespace.is_empty() {
            self.pending.extend_from_slice(self.namespace.as_bytes());
            self.pending.push(b'.');
        }

        self.pending.extend_from_slice(name.as_bytes());
        self.pending.push(b':');
        self.pending.extend_from_slice(self.int_writer.format(value).as_bytes());
        self.pending.extend_from_slice(metric_type.as_bytes());
        self.pending.push(b'\n');
    }

    /// Writes a single metric.
    ///
    /// Negative gauge values are preceded by a line resetting the gauge to zero, since StatsD treats a signed gauge
    /// value as a delta to apply to the current value. Both lines always land in the same payload.
    pub fn write(&mut self, name: &str, value: i64, metric_type: MetricType) -> WriteResult {
        let lines = if metric_type == MetricType::Gauge && value < 0 {
            self.write_line(name, 0, metric_type);
            2
        } else {
            1
        };
        self.write_line(name, value, metric_type);

        match self.commit() {
            Some(evicted) => WriteResult::success(lines, evicted),
            None => WriteResult::failure(1),
        }
    }

    /// Returns `true` if nothing has been written since the payloads were last taken.
    pub fn is_empty(&self) -> bool {
        self.finished.is_empty() && self.current.is_empty()
    }

    /// Takes every payload written so far, oldest first, including the partially filled one.
    ///
    /// The writer is left empty.
    pub fn take_payloads(&mut self) -> Vec<Vec<u8>> {
        self.pending.clear();

        let mut payloads = Vec::with_capacity(self.finished.len() + 1);
        payloads.extend(self.finished.drain(..));
        if !self.current.is_empty() {
            payloads.push(std::mem::take(&mut self.current));
        }
        payloads
    }
}
