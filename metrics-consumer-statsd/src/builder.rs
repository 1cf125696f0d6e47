use std::collections::HashMap;

use thiserror::Error;

use crate::{clean, consumer::StatsdMetricsConsumer, MetricSink, PayloadSink};

/// Configuration key for the hostname of the StatsD server.
pub const STATSD_HOST: &str = "metrics.statsd.host";

/// Configuration key for the port of the StatsD server.
pub const STATSD_PORT: &str = "metrics.statsd.port";

/// Configuration key for the prefix applied to every metric.
pub const STATSD_PREFIX: &str = "metrics.statsd.prefix";

/// Configuration key for whether or not the worker host is included in metric names.
pub const STATSD_USE_HOSTNAME: &str = "metrics.statsd.usehostname";

/// Configuration key for the name of the running topology.
pub const TOPOLOGY_NAME: &str = "topology.name";

const DEFAULT_PORT: u16 = 8125;
const DEFAULT_PREFIX: &str = "storm.metrics.";
const DEFAULT_MAX_PAYLOAD_LEN: usize = 8192;
const DEFAULT_MAX_BUFFERED_PAYLOADS: usize = 128;

/// A raw configuration value, as supplied by the host runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigValue {
    /// A string value.
    String(String),

    /// An integer value, of any width.
    Integer(i64),

    /// A boolean value.
    Boolean(bool),
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

/// Untyped configuration, keyed by option name.
pub type ConfigMap = HashMap<String, ConfigValue>;

/// Errors that could occur while parsing configuration.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// The configured port could not be parsed, or was not a valid port number.
    #[error("invalid port '{value}': {reason}")]
    InvalidPort {
        /// The configured value.
        value: String,

        /// Details about the parsing failure.
        reason: String,
    },

    /// A configuration value was not of the expected type.
    #[error("invalid value for '{key}': expected {expected}")]
    InvalidType {
        /// The configuration key.
        key: &'static str,

        /// Description of the expected type.
        expected: &'static str,
    },

    /// The maximum payload length is too small to fit any metric.
    #[error("maximum payload length must be between {min} and {max} bytes (got {len})")]
    InvalidPayloadLength {
        /// The configured length.
        len: usize,

        /// The smallest allowed length.
        min: usize,

        /// The largest allowed length.
        max: usize,
    },

    /// The payload buffer would not be able to hold any finished payloads.
    #[error("maximum number of buffered payloads must be at least 1")]
    InvalidBufferedPayloads,
}

/// Builder for a StatsD metrics consumer.
///
/// Values can be set directly with the `with_*` methods, or read from the runtime's untyped configuration with
/// [`apply_config`](ConsumerBuilder::apply_config). Later calls override earlier ones.
#[derive(Clone, Debug, PartialEq)]
pub struct ConsumerBuilder {
    host: Option<String>,
    port: u16,
    prefix: String,
    use_hostname: bool,
    topology_name: Option<String>,
    max_payload_len: usize,
    max_buffered_payloads: usize,
}

impl ConsumerBuilder {
    /// Set the hostname of the StatsD server.
    ///
    /// Defaults to unset.
    #[must_use]
    pub fn with_host<H: Into<String>>(mut self, host: H) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the port of the StatsD server.
    ///
    /// Defaults to 8125.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the prefix applied to every metric.
    ///
    /// A trailing `.` is added if the prefix does not already end with one.
    ///
    /// Defaults to `storm.metrics.`.
    #[must_use]
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        let mut prefix = prefix.into();
        if !prefix.ends_with('.') {
            prefix.push('.');
        }
        self.prefix = prefix;
        self
    }

    /// Sets whether or not the worker host is included as the leading segment of metric names.
    ///
    /// Defaults to `true`.
    #[must_use]
    pub fn with_hostname(mut self, use_hostname: bool) -> Self {
        self.use_hostname = use_hostname;
        self
    }

    /// Set the name of the running topology.
    ///
    /// The topology name is appended to the prefix to form the namespace of every metric.
    ///
    /// Defaults to unset.
    #[must_use]
    pub fn with_topology_name<T: Into<String>>(mut self, topology_name: T) -> Self {
        self.topology_name = Some(topology_name.into());
        self
    }

    /// Set the maximum payload length used when encoding metrics.
    ///
    /// This should be no larger than the receive buffer of the StatsD server, which for UDP is typically well below
    /// the theoretical datagram limit.
    ///
    /// Defaults to 8192 bytes.
    ///
    /// # Errors
    ///
    /// If the length is too small to fit the smallest valid metric line, or does not fit in 32 bits, an error will be
    /// returned.
    pub fn with_maximum_payload_length(mut self, max_payload_len: usize) -> Result<Self, ConfigError> {
        let min = crate::writer::SMALLEST_VALID_PAYLOAD.len();
        let max = u32::MAX as usize;
        if !(min..=max).contains(&max_payload_len) {
            return Err(ConfigError::InvalidPayloadLength { len: max_payload_len, min, max });
        }

        self.max_payload_len = max_payload_len;
        Ok(self)
    }

    /// Set the maximum number of finished payloads held by the payload sink.
    ///
    /// Payloads are held until they are taken by the owner of the sink. When the owner falls behind and the limit is
    /// reached, the oldest payload is evicted to make room for the next one.
    ///
    /// Defaults to 128.
    ///
    /// # Errors
    ///
    /// If the limit is zero, an error will be returned.
    pub fn with_maximum_buffered_payloads(mut self, max_buffered_payloads: usize) -> Result<Self, ConfigError> {
        if max_buffered_payloads == 0 {
            return Err(ConfigError::InvalidBufferedPayloads);
        }

        self.max_buffered_payloads = max_buffered_payloads;
        Ok(self)
    }

    /// Applies any recognized options from the given runtime configuration.
    ///
    /// Unrecognized keys are ignored. The port may be given as a string or as an integer of any width, and
    /// `metrics.statsd.usehostname` may be given as a boolean or as the string `true`/`false`.
    ///
    /// # Errors
    ///
    /// If a recognized option has a value of the wrong type, or the port is not a valid port number, an error will be
    /// returned.
    pub fn apply_config(mut self, config: &ConfigMap) -> Result<Self, ConfigError> {
        if let Some(value) = config.get(TOPOLOGY_NAME) {
            self = self.with_topology_name(string_value(TOPOLOGY_NAME, value)?);
        }

        if let Some(value) = config.get(STATSD_HOST) {
            self = self.with_host(string_value(STATSD_HOST, value)?);
        }

        if let Some(value) = config.get(STATSD_PORT) {
            self = self.with_port(port_value(value)?);
        }

        if let Some(value) = config.get(STATSD_PREFIX) {
            self = self.with_prefix(string_value(STATSD_PREFIX, value)?);
        }

        if let Some(value) = config.get(STATSD_USE_HOSTNAME) {
            self = self.with_hostname(bool_value(STATSD_USE_HOSTNAME, value)?);
        }

        Ok(self)
    }

    /// Returns the configured hostname of the StatsD server, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Returns the configured port of the StatsD server.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the configured prefix, always ending in `.`.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns whether or not the worker host is included in metric names.
    pub fn use_hostname(&self) -> bool {
        self.use_hostname
    }

    /// Returns the configured topology name, if any.
    pub fn topology_name(&self) -> Option<&str> {
        self.topology_name.as_deref()
    }

    /// Returns the configured maximum payload length.
    pub fn maximum_payload_length(&self) -> usize {
        self.max_payload_len
    }

    /// Returns the configured maximum number of buffered payloads.
    pub fn maximum_buffered_payloads(&self) -> usize {
        self.max_buffered_payloads
    }

    /// Returns the address of the StatsD server in `<host>:<port>` form, if a host is configured.
    pub fn remote_address(&self) -> Option<String> {
        self.host.as_ref().map(|host| format!("{}:{}", host, self.port))
    }

    /// Returns the namespace every metric is reported under.
    ///
    /// This is the prefix followed by the sanitized topology name. Without a topology name, the prefix is used on its
    /// own, minus its trailing `.`.
    pub fn namespace(&self) -> String {
        match &self.topology_name {
            Some(topology_name) => format!("{}{}", self.prefix, clean(topology_name)),
            None => self.prefix.trim_end_matches('.').to_string(),
        }
    }

    /// Builds a consumer that reports to the given sink.
    pub fn build<S: MetricSink>(self, sink: S) -> StatsdMetricsConsumer<S> {
        StatsdMetricsConsumer::new(self, sink)
    }

    /// Builds a consumer that encodes metrics into StatsD payloads under the configured namespace.
    ///
    /// Finished payloads can be taken from the sink via [`StatsdMetricsConsumer::sink`].
    pub fn build_with_payload_sink(self) -> StatsdMetricsConsumer<PayloadSink> {
        let sink = PayloadSink::new(self.namespace(), self.max_payload_len, self.max_buffered_payloads);
        self.build(sink)
    }
}

impl Default for ConsumerBuilder {
    fn default() -> Self {
        ConsumerBuilder {
            host: None,
            port: DEFAULT_PORT,
            prefix: DEFAULT_PREFIX.to_string(),
            use_hostname: true,
            topology_name: None,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            max_buffered_payloads: DEFAULT_MAX_BUFFERED_PAYLOADS,
        }
    }
}

fn string_value(key: &'static str, value: &ConfigValue) -> Result<String, ConfigError> {
    match value {
        ConfigValue::String(s) => Ok(s.clone()),
        _ => Err(ConfigError::InvalidType { key, expected: "a string" }),
    }
}

fn port_value(value: &ConfigValue) -> Result<u16, ConfigError> {
    match value {
        ConfigValue::String(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidPort { value: s.clone(), reason: e.to_string() }),
        ConfigValue::Integer(i) => u16::try_from(*i)
            .map_err(|e| ConfigError::InvalidPort { value: i.to_string(), reason: e.to_string() }),
        ConfigValue::Boolean(_) => {
            Err(ConfigError::InvalidType { key: STATSD_PORT, expected: "a string or an integer" })
        }
    }
}

fn bool_value(key: &'static str, value: &ConfigValue) -> Result<bool, ConfigError> {
    match value {
        ConfigValue::Boolean(b) => Ok(*b),
        ConfigValue::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        ConfigValue::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(ConfigError::InvalidType { key, expected: "a boolean" }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config<const N: usize>(entries: [(&str, ConfigValue); N]) -> ConfigMap {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn defaults() {
        let builder = ConsumerBuilder::default();
        assert_eq!(builder.host(), None);
        assert_eq!(builder.port(), 8125);
        assert_eq!(builder.prefix(), "storm.metrics.");
        assert_eq!(builder.topology_name(), None);
        assert!(builder.use_hostname());
        assert_eq!(builder.maximum_payload_length(), 8192);
        assert_eq!(builder.maximum_buffered_payloads(), 128);
        assert_eq!(builder.remote_address(), None);
        assert_eq!(builder.namespace(), "storm.metrics");
    }

    #[test]
    fn parse_config() {
        let conf = config([
            (STATSD_HOST, "localhost".into()),
            (STATSD_PORT, 5555i64.into()),
            (STATSD_PREFIX, "my.statsd.prefix".into()),
            (TOPOLOGY_NAME, "myTopologyName".into()),
            (STATSD_USE_HOSTNAME, false.into()),
        ]);

        let builder = ConsumerBuilder::default().apply_config(&conf).unwrap();
        assert_eq!(builder.host(), Some("localhost"));
        assert_eq!(builder.port(), 5555);
        assert_eq!(builder.prefix(), "my.statsd.prefix.");
        assert_eq!(builder.topology_name(), Some("myTopologyName"));
        assert!(!builder.use_hostname());
        assert_eq!(builder.remote_address().as_deref(), Some("localhost:5555"));
        assert_eq!(builder.namespace(), "my.statsd.prefix.myTopologyName");
    }

    #[test]
    fn port_representations() {
        // Cases are defined as: configured port value, expected port.
        let cases = [
            (ConfigValue::from(5555i64), 5555),
            (ConfigValue::from(5555i32), 5555),
            (ConfigValue::from("5555"), 5555),
            (ConfigValue::from(" 5555 "), 5555),
        ];

        for (value, expected) in cases {
            let builder = ConsumerBuilder::default().apply_config(&config([(STATSD_PORT, value)])).unwrap();
            assert_eq!(builder.port(), expected);
        }
    }

    #[test]
    fn invalid_ports() {
        for value in [ConfigValue::from("nope"), ConfigValue::from(70_000i64), ConfigValue::from(-1i64)] {
            let result = ConsumerBuilder::default().apply_config(&config([(STATSD_PORT, value)]));
            assert!(matches!(result, Err(ConfigError::InvalidPort { .. })), "got {result:?}");
        }

        let result = ConsumerBuilder::default().apply_config(&config([(STATSD_PORT, true.into())]));
        assert_eq!(
            result,
            Err(ConfigError::InvalidType { key: STATSD_PORT, expected: "a string or an integer" })
        );
    }

    #[test]
    fn use_hostname_defaults_to_true() {
        let conf = config([(STATSD_HOST, "localhost".into()), (TOPOLOGY_NAME, "myTopologyName".into())]);
        let builder = ConsumerBuilder::default().apply_config(&conf).unwrap();
        assert!(builder.use_hostname());

        let conf = config([(STATSD_USE_HOSTNAME, "FALSE".into())]);
        let builder = ConsumerBuilder::default().apply_config(&conf).unwrap();
        assert!(!builder.use_hostname());
    }

    #[test]
    fn wrong_types() {
        let result = ConsumerBuilder::default().apply_config(&config([(STATSD_HOST, 1i64.into())]));
        assert_eq!(result, Err(ConfigError::InvalidType { key: STATSD_HOST, expected: "a string" }));

        let result = ConsumerBuilder::default().apply_config(&config([(STATSD_USE_HOSTNAME, "yes".into())]));
        assert_eq!(result, Err(ConfigError::InvalidType { key: STATSD_USE_HOSTNAME, expected: "a boolean" }));
    }

    #[test]
    fn prefix_keeps_existing_dot() {
        let builder = ConsumerBuilder::default().with_prefix("already.dotted.");
        assert_eq!(builder.prefix(), "already.dotted.");
    }

    #[test]
    fn namespace_cleans_topology_name() {
        let builder = ConsumerBuilder::default().with_topology_name("word:count/v2");
        assert_eq!(builder.namespace(), "storm.metrics.word_count_v2");
    }

    #[test]
    fn payload_length_bounds() {
        assert!(ConsumerBuilder::default().with_maximum_payload_length(1).is_err());
        let builder = ConsumerBuilder::default().with_maximum_payload_length(512).unwrap();
        assert_eq!(builder.maximum_payload_length(), 512);
    }

    #[test]
    fn buffered_payloads_bounds() {
        assert_eq!(
            ConsumerBuilder::default().with_maximum_buffered_payloads(0),
            Err(ConfigError::InvalidBufferedPayloads)
        );
        let builder = ConsumerBuilder::default().with_maximum_buffered_payloads(4).unwrap();
        assert_eq!(builder.maximum_buffered_payloads(), 4);
    }
}
