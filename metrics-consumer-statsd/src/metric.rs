use crate::MetricType;

/// A metric ready to be handed to a [`MetricSink`](crate::MetricSink).
///
/// The name is fully sanitized and namespaced, and the value has already been truncated to an integer. Two metrics are
/// equal when their names, values, and types are equal, no matter what numeric width the original sample used.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct NormalizedMetric {
    name: String,
    value: i64,
    metric_type: MetricType,
}

impl NormalizedMetric {
    /// Creates a new `NormalizedMetric`.
    pub fn new<N>(name: N, value: i64, metric_type: MetricType) -> Self
    where
        N: Into<String>,
    {
        Self { name: name.into(), value, metric_type }
    }

    /// Creates a timer metric.
    pub fn timer<N: Into<String>>(name: N, value: i64) -> Self {
        Self::new(name, value, MetricType::Timer)
    }

    /// Creates a gauge metric.
    pub fn gauge<N: Into<String>>(name: N, value: i64) -> Self {
        Self::new(name, value, MetricType::Gauge)
    }

    /// Creates a counter metric.
    pub fn counter<N: Into<String>>(name: N, value: i64) -> Self {
        Self::new(name, value, MetricType::Counter)
    }

    /// Gets the name of this metric.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the value of this metric.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Gets the type of this metric.
    pub fn metric_type(&self) -> MetricType {
        self.metric_type
    }
}

#[cfg(test)]
mod tests {
    use super::NormalizedMetric;
    use crate::{data::Number, MetricType};

    #[test]
    fn equality_ignores_source_width() {
        let from_int = NormalizedMetric::timer("a.b", Number::from(57i32).truncate());
        let from_long = NormalizedMetric::timer("a.b", Number::from(57i64).truncate());
        let from_float = NormalizedMetric::timer("a.b", Number::from(57.8f64).truncate());
        assert_eq!(from_int, from_long);
        assert_eq!(from_long, from_float);
    }

    #[test]
    fn inequality() {
        let base = NormalizedMetric::gauge("a.b", 1);
        assert_ne!(base, NormalizedMetric::counter("a.b", 1));
        assert_ne!(base, NormalizedMetric::gauge("a.c", 1));
        assert_ne!(base, NormalizedMetric::gauge("a.b", 2));
        assert_eq!(base, NormalizedMetric::new("a.b", 1, MetricType::Gauge));
    }
}
