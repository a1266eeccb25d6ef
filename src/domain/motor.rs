//! Motor attribute table
//!
//! Maps each configured motor onto the characteristics and descriptors it
//! exposes, and each of those onto the process variable behind it.

use crate::domain::models::{
    AttributeBinding, AttributeKind, CharacteristicBinding, ReadSource, ValueFormat,
};
use crate::domain::protocol;
use serde::{Deserialize, Serialize};

/// Characteristic id given to the first configured motor
pub const FIRST_MOTOR_ID: u32 = 2;

/// Process variable naming scheme used by the IOC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PvNaming {
    /// Fields of a motor record: `base.RBV`, `base.VAL`, ...
    #[default]
    MotorRecord,
    /// Sibling readback/setpoint records: `base-RB`, `base-SP`
    SetpointReadback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorField {
    Readback,
    Setpoint,
    Description,
    RelativeMove,
    LimitViolation,
    Stop,
    EngineeringUnit,
    Moving,
}

impl PvNaming {
    /// PV name for `field` of the motor at `base`, if the scheme has one
    pub fn field(&self, base: &str, field: MotorField) -> Option<String> {
        match self {
            Self::MotorRecord => {
                let suffix = match field {
                    MotorField::Readback => "RBV",
                    MotorField::Setpoint => "VAL",
                    MotorField::Description => "DESC",
                    MotorField::RelativeMove => "RLV",
                    MotorField::LimitViolation => "LVIO",
                    MotorField::Stop => "STOP",
                    MotorField::EngineeringUnit => "EGU",
                    MotorField::Moving => "MOVN",
                };
                Some(format!("{base}.{suffix}"))
            }
            Self::SetpointReadback => match field {
                MotorField::Readback => Some(format!("{base}-RB")),
                MotorField::Setpoint => Some(format!("{base}-SP")),
                MotorField::Description => Some(format!("{base}-SP.DESC")),
                MotorField::EngineeringUnit => Some(format!("{base}-RB.EGU")),
                MotorField::RelativeMove
                | MotorField::LimitViolation
                | MotorField::Stop
                | MotorField::Moving => None,
            },
        }
    }
}

/// Attribute table for one motor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorLayout {
    pub id: u32,
    pub pv_base: String,
    pub characteristics: Vec<CharacteristicBinding>,
}

impl MotorLayout {
    pub fn new(id: u32, pv_base: &str, naming: PvNaming) -> Self {
        let field = |f| naming.field(pv_base, f);
        let mut characteristics = Vec::new();

        // Position: readback in, setpoint out
        if let (Some(readback), Some(setpoint)) =
            (field(MotorField::Readback), field(MotorField::Setpoint))
        {
            let position = AttributeBinding::new(
                AttributeKind::Position,
                protocol::position_char_uuid(id),
            )
            .readable(ReadSource::pv(readback, ValueFormat::Decimal))
            .writable(setpoint.clone())
            .notifying();

            let mut descriptors = Vec::new();
            if let Some(desc) = field(MotorField::Description) {
                descriptors.push(
                    AttributeBinding::new(
                        AttributeKind::Description,
                        protocol::descriptor_uuid(protocol::DESCRIPTION_DESC),
                    )
                    .readable(ReadSource::pv(desc, ValueFormat::Text)),
                );
            }
            descriptors.push(
                AttributeBinding::new(
                    AttributeKind::TargetPosition,
                    protocol::descriptor_uuid(protocol::TARGET_POSITION_DESC),
                )
                .readable(ReadSource::pv(setpoint, ValueFormat::Decimal)),
            );
            descriptors.push(
                AttributeBinding::new(
                    AttributeKind::PvName,
                    protocol::descriptor_uuid(protocol::PV_NAME_DESC),
                )
                .readable(ReadSource::Literal(pv_base.to_string())),
            );
            if let Some(rlv) = field(MotorField::RelativeMove) {
                descriptors.push(
                    AttributeBinding::new(
                        AttributeKind::RelativeMove,
                        protocol::descriptor_uuid(protocol::RELATIVE_MOVE_DESC),
                    )
                    .readable(ReadSource::pv(rlv.clone(), ValueFormat::Decimal))
                    .writable(rlv),
                );
            }
            if let Some(lvio) = field(MotorField::LimitViolation) {
                descriptors.push(
                    AttributeBinding::new(
                        AttributeKind::LimitViolation,
                        protocol::descriptor_uuid(protocol::LIMIT_VIOLATION_DESC),
                    )
                    .readable(ReadSource::pv(lvio, ValueFormat::Text)),
                );
            }
            if let Some(stop) = field(MotorField::Stop) {
                descriptors.push(
                    AttributeBinding::new(
                        AttributeKind::Stop,
                        protocol::descriptor_uuid(protocol::STOP_DESC),
                    )
                    .writable(stop),
                );
            }
            if let Some(egu) = field(MotorField::EngineeringUnit) {
                descriptors.push(
                    AttributeBinding::new(
                        AttributeKind::EngineeringUnit,
                        protocol::descriptor_uuid(protocol::ENGINEERING_UNIT_DESC),
                    )
                    .readable(ReadSource::pv(egu, ValueFormat::Text)),
                );
            }

            characteristics.push(CharacteristicBinding {
                attribute: position,
                descriptors,
            });
        }

        if let Some(movn) = field(MotorField::Moving) {
            characteristics.push(CharacteristicBinding {
                attribute: AttributeBinding::new(
                    AttributeKind::Moving,
                    protocol::moving_char_uuid(id),
                )
                .readable(ReadSource::pv(movn, ValueFormat::MovingFlag))
                .notifying(),
                descriptors: Vec::new(),
            });
        }

        Self {
            id,
            pv_base: pv_base.to_string(),
            characteristics,
        }
    }

    /// Layouts for every configured motor, numbered from [`FIRST_MOTOR_ID`]
    pub fn for_motors(pvs: &[String], naming: PvNaming) -> Vec<Self> {
        pvs.iter()
            .zip(FIRST_MOTOR_ID..)
            .map(|(pv, id)| Self::new(id, pv.trim(), naming))
            .collect()
    }
}
