//! Recursive structural merge over semi-structured config values.

use serde_yaml::Value;

/// Deep-merge `overlay` into `base`.
///
/// Mappings merge key-by-key recursively; every other pairing (scalars,
/// sequences, mismatched kinds) replaces the base value wholesale. Later
/// documents therefore override earlier ones with later keys winning.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, other) => *slot = other.clone(),
    }
}
