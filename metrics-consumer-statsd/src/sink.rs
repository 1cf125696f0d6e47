use parking_lot::Mutex;
use tracing::warn;

use crate::{writer::PayloadWriter, MetricType, NormalizedMetric};

/// A destination for normalized metrics.
///
/// Sinks are fire-and-forget: none of the operations report failure back to the caller, and implementations own any
/// buffering, transport, and error handling.
pub trait MetricSink {
    /// Increments the counter `name` by `value`.
    fn increment_counter(&self, name: &str, value: i64);

    /// Sets the gauge `name` to `value`.
    fn set_gauge(&self, name: &str, value: i64);

    /// Records a timing of `value` for the timer `name`.
    fn record_timing(&self, name: &str, value: i64);

    /// Flushes any buffered state.
    ///
    /// Called when the owning consumer is cleaned up. Defaults to doing nothing.
    fn flush(&self) {}

    /// Dispatches a metric to the sink operation matching its type.
    fn emit(&self, metric: &NormalizedMetric) {
        match metric.metric_type() {
            MetricType::Counter => self.increment_counter(metric.name(), metric.value()),
            MetricType::Gauge => self.set_gauge(metric.name(), metric.value()),
            MetricType::Timer => self.record_timing(metric.name(), metric.value()),
        }
    }
}

impl<T> MetricSink for &T
where
    T: MetricSink + ?Sized,
{
    fn increment_counter(&self, name: &str, value: i64) {
        (**self).increment_counter(name, value);
    }

    fn set_gauge(&self, name: &str, value: i64) {
        (**self).set_gauge(name, value);
    }

    fn record_timing(&self, name: &str, value: i64) {
        (**self).record_timing(name, value);
    }

    fn flush(&self) {
        (**self).flush();
    }
}

/// A sink that records every metric it receives, in order.
///
/// Useful for tests, or for inspecting exactly what a consumer would have sent.
#[derive(Debug, Default)]
pub struct DebuggingSink {
    metrics: Mutex<Vec<NormalizedMetric>>,
    flushes: Mutex<usize>,
}

impl DebuggingSink {
    /// Creates a new `DebuggingSink`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all metrics recorded so far.
    pub fn take(&self) -> Vec<NormalizedMetric> {
        std::mem::take(&mut *self.metrics.lock())
    }

    /// Returns the number of times the sink has been flushed.
    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }

    fn record(&self, name: &str, value: i64, metric_type: MetricType) {
        self.metrics.lock().push(NormalizedMetric::new(name, value, metric_type));
    }
}

impl MetricSink for DebuggingSink {
    fn increment_counter(&self, name: &str, value: i64) {
        self.record(name, value, MetricType::Counter);
    }

    fn set_gauge(&self, name: &str, value: i64) {
        self.record(name, value, MetricType::Gauge);
    }

    fn record_timing(&self, name: &str, value: i64) {
        self.record(name, value, MetricType::Timer);
    }

    fn flush(&self) {
        *self.flushes.lock() += 1;
    }
}

/// A sink that encodes metrics as StatsD lines and buffers them into payloads.
///
/// Payloads are held until taken with [`take_payloads`](PayloadSink::take_payloads), leaving the choice of transport to
/// the owner. At most `max_buffered_payloads` finished payloads are held: when the owner falls behind, the oldest payload
/// is evicted to make room. Metrics too large to fit in a single payload are dropped.
pub struct PayloadSink {
    writer: Mutex<PayloadWriter>,
}

impl PayloadSink {
    /// Creates a new `PayloadSink` writing under the given namespace.
    pub fn new<N: Into<String>>(namespace: N, max_payload_len: usize, max_buffered_payloads: usize) -> Self {
        Self { writer: Mutex::new(PayloadWriter::new(namespace, max_payload_len, max_buffered_payloads)) }
    }

    /// Takes all payloads written so far, oldest first.
    pub fn take_payloads(&self) -> Vec<Vec<u8>> {
        self.writer.lock().take_payloads()
    }

    /// Returns the number of finished payloads waiting to be taken.
    pub fn buffered_payloads(&self) -> usize {
        self.writer.lock().buffered_payloads()
    }

    /// Returns the total number of payloads evicted because they were not taken in time.
    pub fn payloads_evicted(&self) -> u64 {
        self.writer.lock().payloads_evicted()
    }

    fn write(&self, name: &str, value: i64, metric_type: MetricType) {
        let mut writer = self.writer.lock();
        let result = writer.write(name, value, metric_type);
        if result.any_failures() {
            warn!(
                namespace = writer.namespace(),
                metric = name,
                points_dropped = result.points_dropped(),
                "Metric too large for a single payload. Dropping."
            );
        }
        if result.payloads_evicted() > 0 {
            warn!(
                namespace = writer.namespace(),
                payloads_evicted = result.payloads_evicted(),
                payloads_evicted_total = writer.payloads_evicted(),
                "Payload buffer full. Evicting oldest payloads."
            );
        }
    }
}

impl MetricSink for PayloadSink {
    fn increment_counter(&self, name: &str, value: i64) {
        self.write(name, value, MetricType::Counter);
    }

    fn set_gauge(&self, name: &str, value: i64) {
        self.write(name, value, MetricType::Gauge);
    }

    fn record_timing(&self, name: &str, value: i64) {
        self.write(name, value, MetricType::Timer);
    }
}

#[cfg(test)]
mod tests {
    use super::{DebuggingSink, MetricSink, PayloadSink};
    use crate::NormalizedMetric;

    #[test]
    fn emit_dispatches_by_type() {
        let sink = DebuggingSink::new();
        let metrics = vec![
            NormalizedMetric::counter("a", 1),
            NormalizedMetric::gauge("b", 2),
            NormalizedMetric::timer("c", 3),
        ];
        for metric in &metrics {
            sink.emit(metric);
        }

        assert_eq!(sink.take(), metrics);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn borrowed_sink() {
        let sink = DebuggingSink::new();
        let borrowed = &sink;
        borrowed.set_gauge("g", 4);
        borrowed.flush();

        assert_eq!(sink.take(), vec![NormalizedMetric::gauge("g", 4)]);
        assert_eq!(sink.flush_count(), 1);
    }

    #[test]
    fn payload_sink_encodes() {
        let sink = PayloadSink::new("storm.metrics.top", 8192, 16);
        sink.emit(&NormalizedMetric::counter("host1.bolt.acked", 12));
        sink.emit(&NormalizedMetric::timer("host1.bolt.latency", 7));

        let payloads = sink.take_payloads();
        assert_eq!(
            payloads,
            vec![b"storm.metrics.top.host1.bolt.acked:12|c\nstorm.metrics.top.host1.bolt.latency:7|ms\n".to_vec()]
        );
        assert!(sink.take_payloads().is_empty());
    }

    #[test]
    fn payload_sink_drops_oversized() {
        let sink = PayloadSink::new("ns", 8, 16);
        sink.record_timing("far_too_long_for_the_limit", 1);
        assert!(sink.take_payloads().is_empty());
    }

    #[test]
    fn payload_sink_stays_bounded_without_draining() {
        // Every `ns.host1.bolt.latency:7|ms` line fills a payload on its own.
        let sink = PayloadSink::new("ns", 32, 4);
        for _ in 0..10_000 {
            sink.record_timing("host1.bolt.latency", 7);
            assert!(sink.buffered_payloads() <= 4);
        }

        assert_eq!(sink.buffered_payloads(), 4);
        assert_eq!(sink.payloads_evicted(), 10_000 - 1 - 4);

        let payloads = sink.take_payloads();
        assert_eq!(payloads.len(), 5);
        assert!(payloads.iter().all(|payload| payload.as_slice() == b"ns.host1.bolt.latency:7|ms\n"));
        assert_eq!(sink.buffered_payloads(), 0);
    }
}
