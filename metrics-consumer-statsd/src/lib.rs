//! A metrics consumer that reports stream-processing task data points to a [StatsD][statsd]-compatible server.
//!
//! [statsd]: https://github.com/statsd/statsd
//!
//! # Usage
//!
//! Tasks in a stream-processing topology periodically report batches of named data points, along with information
//! about the task that produced them. The consumer turns each batch into StatsD metrics:
//!
//! ```rust
//! # use metrics_consumer_statsd::{ConsumerBuilder, RawDataPoint, TaskInfo};
//! let consumer = ConsumerBuilder::default()
//!     .with_topology_name("wordcount")
//!     .build_with_payload_sink();
//!
//! let task_info = TaskInfo {
//!     src_worker_host: "worker1".to_string(),
//!     src_worker_port: 6701,
//!     src_component_id: "splitter".to_string(),
//!     src_task_id: 3,
//!     timestamp: 1_700_000_000,
//!     update_interval_secs: 60,
//! };
//!
//! consumer.handle_data_points(&task_info, &[RawDataPoint::new("counter.emitted", 1200)]);
//!
//! let payloads = consumer.sink().take_payloads();
//! assert_eq!(payloads, vec![b"storm.metrics.wordcount.worker1.splitter.counter.emitted:1200|c\n".to_vec()]);
//! ```
//!
//! # Naming
//!
//! Every metric is named `<prefix><topology>.[<host>.]<component>.<data point>[.<sub-metric>]`. The prefix and
//! topology form the namespace, which is applied by the sink; the rest is built by [`translate`]. Each segment is
//! sanitized with [`clean`] on its own, replacing the StatsD-reserved characters `:`, `|`, and `@`, as well as `/`,
//! with `_`.
//!
//! # Metric types
//!
//! The type of a metric is derived from the data point name, as reported: names starting with `gauge` become gauges,
//! names starting with `counter` become counters, and everything else is a timer. See [`MetricType::from_name`].
//!
//! # Values
//!
//! Values are reported as integers. Fractional values are truncated toward zero, and values that are not numeric at
//! all are silently skipped so that a single bad sample never fails the rest of its batch.
//!
//! # Missing
//!
//! ## Transport
//!
//! The consumer does not send anything over the network itself. [`PayloadSink`] buffers newline-delimited StatsD
//! payloads for the owner to send over whatever transport it chooses, and any other transport can be plugged in by
//! implementing [`MetricSink`]. The buffer is bounded: if payloads are not taken fast enough, the oldest are evicted.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod builder;
pub use self::builder::{
    ConfigError, ConfigMap, ConfigValue, ConsumerBuilder, STATSD_HOST, STATSD_PORT, STATSD_PREFIX,
    STATSD_USE_HOSTNAME, TOPOLOGY_NAME,
};

mod consumer;
pub use self::consumer::StatsdMetricsConsumer;

mod data;
pub use self::data::{DataPointValue, Number, RawDataPoint, ReportingContext, TaskInfo};

mod kind;
pub use self::kind::MetricType;

mod metric;
pub use self::metric::NormalizedMetric;

mod sink;
pub use self::sink::{DebuggingSink, MetricSink, PayloadSink};

mod translator;
pub use self::translator::{clean, translate};

mod writer;
pub use self::writer::{PayloadWriter, WriteResult};
