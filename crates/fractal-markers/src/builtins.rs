//! Built-in fractal marker families.
//!
//! Each family is a binary descriptor compiled into the crate from
//! `data/FRACTAL_*.bin`.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fractal marker designs shipped with the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerFamily {
    #[serde(rename = "FRACTAL_2L_6")]
    Fractal2L6,
    #[serde(rename = "FRACTAL_3L_6")]
    Fractal3L6,
    #[serde(rename = "FRACTAL_4L_6")]
    Fractal4L6,
    #[serde(rename = "FRACTAL_5L_6")]
    Fractal5L6,
}

impl MarkerFamily {
    pub const ALL: [MarkerFamily; 4] = [
        MarkerFamily::Fractal2L6,
        MarkerFamily::Fractal3L6,
        MarkerFamily::Fractal4L6,
        MarkerFamily::Fractal5L6,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkerFamily::Fractal2L6 => "FRACTAL_2L_6",
            MarkerFamily::Fractal3L6 => "FRACTAL_3L_6",
            MarkerFamily::Fractal4L6 => "FRACTAL_4L_6",
            MarkerFamily::Fractal5L6 => "FRACTAL_5L_6",
        }
    }

    /// Embedded binary descriptor.
    pub fn descriptor(self) -> &'static [u8] {
        match self {
            MarkerFamily::Fractal2L6 => FRACTAL_2L_6,
            MarkerFamily::Fractal3L6 => FRACTAL_3L_6,
            MarkerFamily::Fractal4L6 => FRACTAL_4L_6,
            MarkerFamily::Fractal5L6 => FRACTAL_5L_6,
        }
    }
}

impl fmt::Display for MarkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarkerFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerFamily::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ConfigError::UnknownFamily(s.to_string()))
    }
}

static FRACTAL_2L_6: &[u8] = include_bytes!("../data/FRACTAL_2L_6.bin");
static FRACTAL_3L_6: &[u8] = include_bytes!("../data/FRACTAL_3L_6.bin");
static FRACTAL_4L_6: &[u8] = include_bytes!("../data/FRACTAL_4L_6.bin");
static FRACTAL_5L_6: &[u8] = include_bytes!("../data/FRACTAL_5L_6.bin");
