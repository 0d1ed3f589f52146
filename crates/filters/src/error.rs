use std::fmt;

/// Bad filter parameters (spec.md §7): logged once per filter, and the
/// offending primitive becomes an identity copy of its first input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterParamError {
    EmptyKernel,
    TargetOutsideKernel { target: (i32, i32), order: (u32, u32) },
    KernelSizeMismatch { len: usize, expected: u32 },
    UnsupportedEdgeMode,
    MissingInput(String),
}

impl fmt::Display for FilterParamError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterParamError::EmptyKernel => write!(formatter, "convolution kernel is empty"),
            FilterParamError::TargetOutsideKernel { target, order } => write!(
                formatter,
                "convolution target {target:?} lies outside kernel of order {order:?}"
            ),
            FilterParamError::KernelSizeMismatch { len, expected } => write!(
                formatter,
                "convolution kernel has {len} entries, expected order_x*order_y = {expected}"
            ),
            FilterParamError::UnsupportedEdgeMode => write!(formatter, "unsupported edge mode"),
            FilterParamError::MissingInput(name) => {
                write!(formatter, "filter primitive references unknown input slot {name:?}")
            }
        }
    }
}

impl std::error::Error for FilterParamError {}
