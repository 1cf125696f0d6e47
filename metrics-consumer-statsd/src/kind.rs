/// Metric type.
///
/// Defines how the downstream aggregator interprets a metric's value:
/// - timers record a duration (or any distribution-like sample)
/// - gauges set an absolute value
/// - counters increment by the value
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MetricType {
    /// Timer type.
    Timer,
    /// Gauge type.
    Gauge,
    /// Counter type.
    Counter,
}

impl MetricType {
    /// Classifies a metric by the prefix of its raw data point name.
    ///
    /// Names beginning with `gauge` are gauges, names beginning with `counter` are counters, and everything else is a
    /// timer. The comparison is case-insensitive and is a literal prefix test, so `gauges` or `COUNTER-foo` both match.
    ///
    /// This must be called with the name as reported, before any sanitization.
    ///
    /// ```rust
    /// # use metrics_consumer_statsd::MetricType;
    /// assert_eq!(MetricType::from_name("GAUGE.foo"), MetricType::Gauge);
    /// assert_eq!(MetricType::from_name("countersignored"), MetricType::Counter);
    /// assert_eq!(MetricType::from_name("latency"), MetricType::Timer);
    /// ```
    pub fn from_name(name: &str) -> Self {
        if starts_with_ignore_ascii_case(name, "gauge") {
            MetricType::Gauge
        } else if starts_with_ignore_ascii_case(name, "counter") {
            MetricType::Counter
        } else {
            MetricType::Timer
        }
    }

    /// Returns the StatsD type suffix for this metric type, including the leading pipe.
    pub(crate) fn as_bytes(self) -> &'static [u8] {
        match self {
            MetricType::Timer => b"|ms",
            MetricType::Gauge => b"|g",
            MetricType::Counter => b"|c",
        }
    }
}

fn starts_with_ignore_ascii_case(haystack: &str, prefix: &str) -> bool {
    haystack
        .as_bytes()
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::MetricType;

    #[test]
    fn classify() {
        // Cases are defined as: raw name, expected type.
        let cases = [
            ("gauge-my.int", MetricType::Gauge),
            ("gauge.my.long", MetricType::Gauge),
            ("gauges", MetricType::Gauge),
            ("GAUGE.foo", MetricType::Gauge),
            ("GaUgE", MetricType::Gauge),
            ("timer.my/float", MetricType::Timer),
            ("counter-my_double", MetricType::Counter),
            ("COUNTER-reallybig", MetricType::Counter),
            ("countersignored", MetricType::Counter),
            ("my.int", MetricType::Timer),
            ("gaug", MetricType::Timer),
            ("count", MetricType::Timer),
            ("", MetricType::Timer),
            ("mygauge", MetricType::Timer),
            ("ǵauge", MetricType::Timer),
        ];

        for (name, expected) in cases {
            assert_eq!(MetricType::from_name(name), expected, "name: {name}");
        }
    }

    #[test]
    fn statsd_suffixes() {
        assert_eq!(MetricType::Timer.as_bytes(), b"|ms");
        assert_eq!(MetricType::Gauge.as_bytes(), b"|g");
        assert_eq!(MetricType::Counter.as_bytes(), b"|c");
    }

    proptest! {
        #[test]
        fn classification_ignores_case(suffix in "[a-zA-Z0-9./:|@_-]{0,16}", upper in any::<bool>()) {
            for (prefix, expected) in [("gauge", MetricType::Gauge), ("counter", MetricType::Counter)] {
                let prefix = if upper { prefix.to_ascii_uppercase() } else { prefix.to_string() };
                let name = format!("{prefix}{suffix}");
                prop_assert_eq!(MetricType::from_name(&name), expected);
            }
        }
    }
}
