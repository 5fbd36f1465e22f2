use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;
use std::fmt;

/// Block used when a color cannot be matched against any palette entry.
pub const FALLBACK_BLOCK: &str = "minecraft:white_concrete";

/// A block identifier plus its legacy variant (damage) value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockMapping {
    pub name: SmolStr,
    pub data: i32,
}

impl fmt::Display for BlockMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.data != 0 {
            write!(f, "[data={}]", self.data)?;
        }
        Ok(())
    }
}

impl BlockMapping {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BlockMapping {
            name: name.into(),
            data: 0,
        }
    }

    pub fn fallback() -> Self {
        BlockMapping::new(FALLBACK_BLOCK)
    }

    pub fn with_data(mut self, data: i32) -> Self {
        self.data = data;
        self
    }

    pub fn get_name(&self) -> &str {
        self.name.as_str()
    }

    /// Parse a palette file value.
    ///
    /// Accepts either `{"block_name": "...", "block_data": n}` or the
    /// two-element array form `["...", n]`. Negative or fractional variant
    /// values are rejected.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let (name, data) = match value {
            Value::Object(map) => {
                let name = map
                    .get("block_name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| "Missing string block_name".to_string())?;
                let data = map
                    .get("block_data")
                    .ok_or_else(|| "Missing block_data".to_string())?;
                (name, data)
            }
            Value::Array(items) if items.len() >= 2 => {
                let name = items[0]
                    .as_str()
                    .ok_or_else(|| format!("Block name is not a string: {}", items[0]))?;
                (name, &items[1])
            }
            other => return Err(format!("Unsupported block mapping value: {}", other)),
        };

        if name.is_empty() {
            return Err("Empty block name".to_string());
        }

        let data = data
            .as_u64()
            .and_then(|d| i32::try_from(d).ok())
            .ok_or_else(|| format!("Invalid block_data: {}", data))?;

        Ok(BlockMapping::new(name).with_data(data))
    }
}
