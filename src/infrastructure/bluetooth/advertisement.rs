//! LE advertisement announcing the motor peripheral

use crate::domain::protocol;
use crate::domain::settings::Settings;
use bluer::adv::{Advertisement, Feature, Type};
use std::collections::BTreeMap;

pub fn build_advertisement(settings: &Settings) -> Advertisement {
    let mut manufacturer_data = BTreeMap::new();
    manufacturer_data.insert(
        settings.manufacturer_id,
        protocol::MANUFACTURER_DATA.to_vec(),
    );

    Advertisement {
        advertisement_type: Type::Peripheral,
        manufacturer_data,
        local_name: Some(settings.name.clone()),
        discoverable: Some(true),
        system_includes: [Feature::TxPower].into_iter().collect(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advertisement_contents() {
        let settings = Settings {
            name: "Motor - Slit".to_string(),
            ..Default::default()
        };
        let adv = build_advertisement(&settings);

        assert_eq!(adv.advertisement_type, Type::Peripheral);
        assert_eq!(adv.local_name.as_deref(), Some("Motor - Slit"));
        assert_eq!(adv.manufacturer_data.get(&0x000D), Some(&vec![0u8, 0u8]));
        assert!(adv.system_includes.contains(&Feature::TxPower));
        assert_eq!(adv.discoverable, Some(true));
        assert!(adv.service_uuids.is_empty());
    }
}
