use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::OptionError;

/// Compute device the model is moved to, in torch notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Device {
    /// A CUDA device, optionally with an explicit ordinal.
    Cuda(Option<u32>),
    Mps,
    Cpu,
}

impl FromStr for Device {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OptionError {
            kind: "device",
            value: s.to_owned(),
            expected: "cuda, cuda:<index>, mps, cpu".to_owned(),
        };

        match s.trim().to_lowercase().as_str() {
            "cuda" => Ok(Device::Cuda(None)),
            "mps" => Ok(Device::Mps),
            "cpu" => Ok(Device::Cpu),
            other => {
                let index = other.strip_prefix("cuda:").ok_or_else(invalid)?;
                index.parse().map(|i| Device::Cuda(Some(i))).map_err(|_| invalid())
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda(None) => write!(f, "cuda"),
            Device::Cuda(Some(index)) => write!(f, "cuda:{index}"),
            Device::Mps => write!(f, "mps"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl TryFrom<String> for Device {
    type Error = OptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Device> for String {
    fn from(device: Device) -> Self {
        device.to_string()
    }
}

/// How the model picks the view that anchors the reconstruction's coordinate frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefViewStrategy {
    First,
    Middle,
    #[default]
    SaddleBalanced,
    SaddleSimRange,
}

impl RefViewStrategy {
    pub const ALL: [RefViewStrategy; 4] = [
        RefViewStrategy::First,
        RefViewStrategy::Middle,
        RefViewStrategy::SaddleBalanced,
        RefViewStrategy::SaddleSimRange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefViewStrategy::First => "first",
            RefViewStrategy::Middle => "middle",
            RefViewStrategy::SaddleBalanced => "saddle_balanced",
            RefViewStrategy::SaddleSimRange => "saddle_sim_range",
        }
    }
}

impl FromStr for RefViewStrategy {
    type Err = OptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| OptionError {
                kind: "reference view strategy",
                value: s.to_owned(),
                expected: Self::ALL.map(|s| s.as_str()).join(", "),
            })
    }
}

impl fmt::Display for RefViewStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
