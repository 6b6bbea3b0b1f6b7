use crate::{EnumConversionError, RawNode};
use serde::{Deserialize, Serialize};

/// Learning progress marker carried in a node's `status` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
#[repr(i64)]
pub enum MasteryStatus {
    NotStarted = 0,
    InProgress = 1,
    Mastered = 2,
}

impl TryFrom<i64> for MasteryStatus {
    type Error = EnumConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MasteryStatus::NotStarted),
            1 => Ok(MasteryStatus::InProgress),
            2 => Ok(MasteryStatus::Mastered),
            _ => Err(EnumConversionError::InvalidMasteryStatus(value)),
        }
    }
}

impl From<MasteryStatus> for i64 {
    fn from(value: MasteryStatus) -> Self {
        value as i64
    }
}

impl MasteryStatus {
    pub const PROPERTY: &'static str = "status";

    /// Reads the node's `status` property. Anything that is not 0, 1 or 2
    /// leaves the status unset.
    pub fn of_node(node: &RawNode) -> Option<Self> {
        node.property(Self::PROPERTY)
            .and_then(|value| value.as_i64())
            .and_then(|value| Self::try_from(value).ok())
    }
}
