use tracing::{debug, trace};

use crate::{
    translate, ConfigError, ConfigMap, ConsumerBuilder, MetricSink, PayloadSink, RawDataPoint, ReportingContext,
    TaskInfo,
};

/// Consumes batches of task data points and reports them to a [`MetricSink`].
///
/// A consumer holds no mutable state of its own: batches are handled through a shared reference, so a single consumer
/// can serve many reporting threads as long as its sink can.
pub struct StatsdMetricsConsumer<S> {
    config: ConsumerBuilder,
    sink: S,
}

impl StatsdMetricsConsumer<PayloadSink> {
    /// Prepares a consumer from the runtime configuration and an optional registration argument.
    ///
    /// Both maps are parsed with [`ConsumerBuilder::apply_config`], the registration argument last so that its options
    /// take precedence. Metrics are encoded into a [`PayloadSink`] under the resulting namespace.
    ///
    /// # Errors
    ///
    /// If either map contains an invalid value for a recognized option, an error will be returned.
    pub fn prepare(runtime_config: &ConfigMap, registration_argument: Option<&ConfigMap>) -> Result<Self, ConfigError> {
        let mut builder = ConsumerBuilder::default().apply_config(runtime_config)?;
        if let Some(registration_argument) = registration_argument {
            builder = builder.apply_config(registration_argument)?;
        }

        let remote_address = builder.remote_address();
        let consumer = builder.build_with_payload_sink();
        debug!(
            remote_address = remote_address.as_deref().unwrap_or("<unset>"),
            namespace = %consumer.config.namespace(),
            use_hostname = consumer.config.use_hostname(),
            "Prepared StatsD metrics consumer."
        );

        Ok(consumer)
    }
}

impl<S> StatsdMetricsConsumer<S>
where
    S: MetricSink,
{
    pub(crate) fn new(config: ConsumerBuilder, sink: S) -> Self {
        Self { config, sink }
    }

    /// Returns the configuration this consumer was built with.
    pub fn config(&self) -> &ConsumerBuilder {
        &self.config
    }

    /// Returns a reference to the sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Builds the naming context for a batch reported by the given task.
    pub fn reporting_context(&self, task_info: &TaskInfo) -> ReportingContext {
        ReportingContext::from_task_info(task_info, self.config.use_hostname())
    }

    /// Translates a batch of data points and forwards each resulting metric to the sink.
    pub fn handle_data_points(&self, task_info: &TaskInfo, data_points: &[RawDataPoint]) {
        let context = self.reporting_context(task_info);
        let metrics = translate(&context, data_points);

        debug!(
            component = %task_info.src_component_id,
            task_id = task_info.src_task_id,
            data_points = data_points.len(),
            metrics = metrics.len(),
            "Reporting data points."
        );

        for metric in &metrics {
            trace!(
                name = metric.name(),
                value = metric.value(),
                metric_type = ?metric.metric_type(),
                "Reporting metric."
            );
            self.sink.emit(metric);
        }
    }

    /// Flushes the sink, and consumes the consumer.
    ///
    /// The sink is handed back so any remaining buffered state can be drained.
    pub fn cleanup(self) -> S {
        self.sink.flush();
        self.sink
    }
}
