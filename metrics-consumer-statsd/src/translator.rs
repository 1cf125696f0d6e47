use tracing::trace;

use crate::{DataPointValue, MetricType, NormalizedMetric, RawDataPoint, ReportingContext};

/// Sanitizes a single name segment.
///
/// StatsD reserves `:`, `|`, and `@` as field delimiters, and `/` is not valid in most downstream metric names, so each
/// of them is replaced with `_`. Everything else, including `.` (the namespace delimiter) and case, is left alone.
///
/// ```rust
/// # use metrics_consumer_statsd::clean;
/// assert_eq!(clean("test:name|bad@host/x"), "test_name_bad_host_x");
/// assert_eq!(clean("test.name"), "test.name");
/// ```
pub fn clean(segment: &str) -> String {
    segment.replace(['/', ':', '|', '@'], "_")
}

/// Translates a batch of raw data points into normalized metrics.
///
/// Every metric is named `[host.]component.name`, with sub-metrics of a mapped data point additionally suffixed with
/// `.sub_name`. Each segment is sanitized with [`clean`] on its own before being joined. The metric type comes from the
/// raw, unsanitized data point name (see [`MetricType::from_name`]), and sub-metrics share their parent's type.
///
/// Data points, and sub-metric entries, whose values are not numeric are skipped. Output order follows input order,
/// with sub-metrics emitted in the order of their mapping.
pub fn translate(context: &ReportingContext, data_points: &[RawDataPoint]) -> Vec<NormalizedMetric> {
    let mut prefix = String::new();
    if context.include_host_in_name {
        prefix.push_str(&clean(&context.source_host));
        prefix.push('.');
    }
    prefix.push_str(&clean(&context.source_component_id));
    prefix.push('.');

    let mut metrics = Vec::with_capacity(data_points.len());
    let mut name = String::with_capacity(prefix.len() + 32);

    for point in data_points {
        let metric_type = MetricType::from_name(&point.name);

        name.clear();
        name.push_str(&prefix);
        name.push_str(&clean(&point.name));

        match &point.value {
            DataPointValue::Number(value) => {
                metrics.push(NormalizedMetric::new(name.as_str(), value.truncate(), metric_type));
            }
            DataPointValue::Map(entries) => {
                let base_len = name.len();
                for (sub_name, sub_value) in entries {
                    let Some(value) = sub_value.as_number() else {
                        trace!(data_point = %point.name, sub_metric = %sub_name, "Skipping non-numeric sub-metric.");
                        continue;
                    };

                    name.truncate(base_len);
                    name.push('.');
                    name.push_str(&clean(sub_name));

                    metrics.push(NormalizedMetric::new(name.as_str(), value.truncate(), metric_type));
                }
            }
            DataPointValue::Other(_) => {
                trace!(data_point = %point.name, "Skipping non-numeric data point.");
            }
        }
    }

    metrics
}
