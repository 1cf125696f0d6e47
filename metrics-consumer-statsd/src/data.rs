use indexmap::IndexMap;

/// A numeric sample value.
///
/// Task metrics are emitted with whatever numeric width the producing code happened to use, so all three shapes are
/// carried through until translation, where they are normalized to a signed 64-bit integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    /// A signed integer.
    Integer(i64),

    /// An unsigned integer.
    Unsigned(u64),

    /// A floating-point value.
    Float(f64),
}

impl Number {
    /// Returns the value as a signed 64-bit integer, truncating any fractional part toward zero.
    ///
    /// Floating-point values outside of the `i64` range saturate at the nearest bound, and `NaN` becomes zero. Unsigned
    /// values larger than `i64::MAX` saturate to `i64::MAX`.
    pub fn truncate(self) -> i64 {
        match self {
            Number::Integer(v) => v,
            Number::Unsigned(v) => i64::try_from(v).unwrap_or(i64::MAX),
            Number::Float(v) => v.trunc() as i64,
        }
    }
}

macro_rules! impl_number_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Number {
                fn from(value: $source) -> Self {
                    Number::$variant(<$target>::from(value))
                }
            }

            impl From<$source> for DataPointValue {
                fn from(value: $source) -> Self {
                    DataPointValue::Number(Number::from(value))
                }
            }
        )+
    };
}

impl_number_from!(Integer, i64, i8, i16, i32, i64);
impl_number_from!(Unsigned, u64, u8, u16, u32, u64);
impl_number_from!(Float, f64, f32, f64);

/// The value of a raw data point.
#[derive(Clone, Debug, PartialEq)]
pub enum DataPointValue {
    /// A single numeric value.
    Number(Number),

    /// A set of named sub-metrics, in the order they were reported.
    Map(IndexMap<String, DataPointValue>),

    /// Any value that is not numeric.
    ///
    /// These are carried so that batches can be represented faithfully, but never produce a metric.
    Other(String),
}

impl DataPointValue {
    /// Returns the numeric value, if this is a single number.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            DataPointValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<Number> for DataPointValue {
    fn from(value: Number) -> Self {
        DataPointValue::Number(value)
    }
}

impl From<&str> for DataPointValue {
    fn from(value: &str) -> Self {
        DataPointValue::Other(value.to_string())
    }
}

impl<K, V> FromIterator<(K, V)> for DataPointValue
where
    K: Into<String>,
    V: Into<DataPointValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        DataPointValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A single named sample reported by a task.
#[derive(Clone, Debug, PartialEq)]
pub struct RawDataPoint {
    /// The name of the data point, as reported.
    pub name: String,

    /// The reported value.
    pub value: DataPointValue,
}

impl RawDataPoint {
    /// Creates a new `RawDataPoint`.
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<DataPointValue>,
    {
        Self { name: name.into(), value: value.into() }
    }
}

/// Metadata about the task that produced a batch of data points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskInfo {
    /// Host of the worker running the task.
    pub src_worker_host: String,

    /// Port of the worker running the task.
    pub src_worker_port: u16,

    /// Identifier of the component the task belongs to.
    pub src_component_id: String,

    /// Identifier of the task itself.
    pub src_task_id: u32,

    /// When the batch was collected, in seconds since the Unix epoch.
    pub timestamp: u64,

    /// Interval between reports, in seconds.
    pub update_interval_secs: u32,
}

/// Naming context shared by every metric translated from a single batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingContext {
    /// Host that emitted the batch.
    pub source_host: String,

    /// Logical component that produced the batch.
    pub source_component_id: String,

    /// Whether or not the host is included as the leading segment of metric names.
    pub include_host_in_name: bool,
}

impl ReportingContext {
    /// Creates a new `ReportingContext`.
    pub fn new<H, C>(source_host: H, source_component_id: C, include_host_in_name: bool) -> Self
    where
        H: Into<String>,
        C: Into<String>,
    {
        Self {
            source_host: source_host.into(),
            source_component_id: source_component_id.into(),
            include_host_in_name,
        }
    }

    /// Creates a `ReportingContext` for a batch produced by the given task.
    pub fn from_task_info(task_info: &TaskInfo, include_host_in_name: bool) -> Self {
        Self::new(
            task_info.src_worker_host.as_str(),
            task_info.src_component_id.as_str(),
            include_host_in_name,
        )
    }
}
