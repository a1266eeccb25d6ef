//! Motor GATT protocol
//!
//! Service, characteristic and descriptor UUIDs exposed by the peripheral.

use uuid::Uuid;

/// Motor control service UUID
pub const SERVICE_UUID: Uuid = Uuid::from_u128(0x84e7f883_7c80_4b64_88a5_6077ce2e8925);

/// Position characteristic base; the motor id fills the first 32 bits
const POSITION_CHAR_BASE: u128 = 0x00000000_710e_4a5b_8d75_3e5b444bc3cf;

/// Moving-status characteristic base; the motor id fills the first 32 bits
const MOVING_CHAR_BASE: u128 = 0x00000000_710f_4a5b_8d75_3e5b444bc3cf;

/// Bluetooth base UUID, 16-bit assigned numbers go in bits 96..112
const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Descriptor short UUIDs hung off each position characteristic
pub const DESCRIPTION_DESC: u16 = 0x2910;
pub const TARGET_POSITION_DESC: u16 = 0x2911;
pub const PV_NAME_DESC: u16 = 0x2912;
pub const RELATIVE_MOVE_DESC: u16 = 0x2913;
pub const LIMIT_VIOLATION_DESC: u16 = 0x2914;
pub const STOP_DESC: u16 = 0x2915;
pub const ENGINEERING_UNIT_DESC: u16 = 0x2916;

/// Advertised manufacturer data payload
pub const MANUFACTURER_DATA: [u8; 2] = [0x00, 0x00];

fn with_id(base: u128, id: u32) -> Uuid {
    Uuid::from_u128(base | (u128::from(id) << 96))
}

pub fn position_char_uuid(id: u32) -> Uuid {
    with_id(POSITION_CHAR_BASE, id)
}

pub fn moving_char_uuid(id: u32) -> Uuid {
    with_id(MOVING_CHAR_BASE, id)
}

/// Expand a 16-bit assigned number onto the Bluetooth base UUID
pub fn descriptor_uuid(short: u16) -> Uuid {
    with_id(BLUETOOTH_BASE_UUID, u32::from(short))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_characteristic_uuids() {
        assert_eq!(
            position_char_uuid(2).to_string(),
            "00000002-710e-4a5b-8d75-3e5b444bc3cf"
        );
        assert_eq!(
            moving_char_uuid(4).to_string(),
            "00000004-710f-4a5b-8d75-3e5b444bc3cf"
        );
        assert_eq!(
            position_char_uuid(0x1a).to_string(),
            "0000001a-710e-4a5b-8d75-3e5b444bc3cf"
        );
    }

    #[test]
    fn test_descriptor_uuids() {
        assert_eq!(
            descriptor_uuid(DESCRIPTION_DESC).to_string(),
            "00002910-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            descriptor_uuid(STOP_DESC).to_string(),
            "00002915-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_service_uuid() {
        assert_eq!(
            SERVICE_UUID.to_string(),
            "84e7f883-7c80-4b64-88a5-6077ce2e8925"
        );
    }
}
