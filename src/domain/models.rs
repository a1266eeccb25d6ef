use crate::domain::encoding::{self, EncodingError};
use uuid::Uuid;

/// How a raw process variable value is rendered before it is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueFormat {
    /// Numeric value rounded to five decimal places
    Decimal,
    /// Passed through verbatim
    Text,
    /// "1" when non-zero, "0" otherwise
    MovingFlag,
}

impl ValueFormat {
    pub fn render(&self, raw: &str) -> Result<String, EncodingError> {
        match self {
            Self::Decimal => encoding::parse_number(raw).map(encoding::format_decimal),
            Self::Text => Ok(raw.to_string()),
            Self::MovingFlag => encoding::format_moving(raw),
        }
    }
}

/// Where a readable attribute takes its value from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    ProcessVariable { name: String, format: ValueFormat },
    Literal(String),
}

impl ReadSource {
    pub fn pv(name: impl Into<String>, format: ValueFormat) -> Self {
        Self::ProcessVariable {
            name: name.into(),
            format,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Moving,
    Description,
    TargetPosition,
    PvName,
    RelativeMove,
    LimitViolation,
    Stop,
    EngineeringUnit,
}

/// One GATT attribute bound to a process variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBinding {
    pub kind: AttributeKind,
    pub uuid: Uuid,
    pub read: Option<ReadSource>,
    /// PV that receives written values
    pub write: Option<String>,
    pub notify: bool,
}

impl AttributeBinding {
    pub fn new(kind: AttributeKind, uuid: Uuid) -> Self {
        Self {
            kind,
            uuid,
            read: None,
            write: None,
            notify: false,
        }
    }

    pub fn readable(mut self, source: ReadSource) -> Self {
        self.read = Some(source);
        self
    }

    pub fn writable(mut self, pv: impl Into<String>) -> Self {
        self.write = Some(pv.into());
        self
    }

    pub fn notifying(mut self) -> Self {
        self.notify = true;
        self
    }
}

/// A characteristic binding together with its descriptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicBinding {
    pub attribute: AttributeBinding,
    pub descriptors: Vec<AttributeBinding>,
}
