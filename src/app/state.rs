//! Application state decoding
//!
//! Global and local state arrive as a list of base64 keys with tagged values.
//! Decoded entries are keyed by the base64 form of the raw key.

use super::errors::StateDecodeError;
use crate::node::{TealKeyValue, TealValue};
use base64::{engine::general_purpose::STANDARD, Engine};
use std::collections::HashMap;

pub const STATE_TYPE_BYTES: u64 = 1;
pub const STATE_TYPE_UINT: u64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppStateValue {
    Uint(u64),
    Bytes {
        raw: Vec<u8>,
        /// UTF-8 text when the payload is valid UTF-8, lowercase hex otherwise
        display: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub key_raw: Vec<u8>,
    pub key_base64: String,
    pub value: AppStateValue,
}

impl AppState {
    pub fn as_uint(&self) -> Option<u64> {
        match self.value {
            AppStateValue::Uint(v) => Some(v),
            AppStateValue::Bytes { .. } => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            AppStateValue::Bytes { display, .. } => Some(display),
            AppStateValue::Uint(_) => None,
        }
    }

    pub fn from_key_value(entry: &TealKeyValue) -> Result<Self, StateDecodeError> {
        let decode = |payload: &str| {
            STANDARD.decode(payload).map_err(|e| StateDecodeError::InvalidBase64 {
                key: entry.key.clone(),
                message: e.to_string(),
            })
        };

        let key_raw = decode(&entry.key)?;
        let value = match entry.value.value_type {
            STATE_TYPE_BYTES => {
                let raw = decode(&entry.value.bytes)?;
                let display = match std::str::from_utf8(&raw) {
                    Ok(text) => text.to_string(),
                    Err(_) => hex::encode(&raw),
                };
                AppStateValue::Bytes { raw, display }
            }
            STATE_TYPE_UINT => AppStateValue::Uint(entry.value.uint),
            other => {
                return Err(StateDecodeError::UnknownStateValueType {
                    key: entry.key.clone(),
                    value_type: other,
                })
            }
        };

        Ok(Self {
            key_raw,
            key_base64: entry.key.clone(),
            value,
        })
    }
}

impl From<&AppState> for TealKeyValue {
    fn from(state: &AppState) -> Self {
        let value = match &state.value {
            AppStateValue::Uint(uint) => TealValue {
                value_type: STATE_TYPE_UINT,
                bytes: String::new(),
                uint: *uint,
            },
            AppStateValue::Bytes { raw, .. } => TealValue {
                value_type: STATE_TYPE_BYTES,
                bytes: STANDARD.encode(raw),
                uint: 0,
            },
        };
        TealKeyValue {
            key: state.key_base64.clone(),
            value,
        }
    }
}

/// Decode a state listing. On duplicate keys the last entry wins.
pub fn decode_app_state(entries: &[TealKeyValue]) -> Result<HashMap<String, AppState>, StateDecodeError> {
    entries
        .iter()
        .map(|entry| AppState::from_key_value(entry).map(|state| (state.key_base64.clone(), state)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &[u8], value_type: u64, bytes: &[u8], uint: u64) -> TealKeyValue {
        TealKeyValue {
            key: STANDARD.encode(key),
            value: TealValue {
                value_type,
                bytes: STANDARD.encode(bytes),
                uint,
            },
        }
    }

    #[test]
    fn test_decode_mixed_state() {
        let state = decode_app_state(&[
            entry(b"counter", STATE_TYPE_UINT, b"", u64::MAX),
            entry(b"name", STATE_TYPE_BYTES, b"hello", 0),
            entry(b"blob", STATE_TYPE_BYTES, &[0xff, 0x00, 0x10], 0),
        ])
        .unwrap();

        assert_eq!(state.len(), 3);
        let counter = &state[&STANDARD.encode(b"counter")];
        assert_eq!(counter.as_uint(), Some(u64::MAX));
        assert_eq!(counter.key_raw, b"counter");
        assert_eq!(state[&STANDARD.encode(b"name")].as_str(), Some("hello"));
        assert_eq!(state[&STANDARD.encode(b"blob")].as_str(), Some("ff0010"));
    }

    #[test]
    fn test_unknown_value_type() {
        let err = decode_app_state(&[entry(b"k", 7, b"", 0)]).unwrap_err();
        assert_eq!(
            err,
            StateDecodeError::UnknownStateValueType {
                key: STANDARD.encode(b"k"),
                value_type: 7
            }
        );
    }

    #[test]
    fn test_last_duplicate_wins() {
        let state = decode_app_state(&[
            entry(b"k", STATE_TYPE_UINT, b"", 1),
            entry(b"k", STATE_TYPE_UINT, b"", 2),
        ])
        .unwrap();
        assert_eq!(state[&STANDARD.encode(b"k")].as_uint(), Some(2));
    }

    #[test]
    fn test_dto_round_trip() {
        let uint = entry(b"total", STATE_TYPE_UINT, b"", 12_345);
        let text = entry(b"label", STATE_TYPE_BYTES, "ünïcode".as_bytes(), 0);
        for dto in [uint, text] {
            let state = AppState::from_key_value(&dto).unwrap();
            let back = TealKeyValue::from(&state);
            assert_eq!(back.key, dto.key);
            assert_eq!(back.value.value_type, dto.value.value_type);
            assert_eq!(AppState::from_key_value(&back).unwrap(), state);
        }
    }
}
