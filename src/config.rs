// SPDX-FileCopyrightText: Copyright 2026 Handwave Project
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use handwave_gesture::BufferConfig;
use handwave_tracker::TrackerConfig;

/// Engine tunables. Every field has a default matching the tuned recognizer;
/// a config file only needs the fields it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// consecutive missed frames a track survives
    pub max_age: u32,
    /// hit streak required before a track is confirmed
    pub min_hits: u32,
    /// overlap gate for the fallback re-association round
    pub iou_threshold: f32,
    /// lookback horizon for the associator's reference observations
    pub delta_t: u32,
    /// capacity of each track's observation buffer
    pub maxlen: usize,
    /// default duration floor for compound gestures
    pub min_frames: usize,
    /// minimum swipe displacement in units of mean hand size
    pub swipe_ratio: f32,
    /// capacity of the action dispatch bus
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_age: 30,
            min_hits: 3,
            iou_threshold: 0.3,
            delta_t: 3,
            maxlen: 30,
            min_frames: 20,
            swipe_ratio: 1.5,
            channel_capacity: 32,
        }
    }
}

impl EngineConfig {
    /// The lifecycle manager's slice of this configuration.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            max_age: self.max_age,
            min_hits: self.min_hits,
            iou_threshold: self.iou_threshold,
            delta_t: self.delta_t,
            buffer: BufferConfig {
                maxlen: self.maxlen,
                min_frames: self.min_frames,
                swipe_ratio: self.swipe_ratio,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.maxlen == 0 {
            return Err(Error::InvalidConfig(
                "maxlen must be at least 1".to_string(),
            ));
        }
        if self.min_hits == 0 {
            return Err(Error::InvalidConfig(
                "min_hits must be at least 1".to_string(),
            ));
        }
        if !self.iou_threshold.is_finite() || !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(Error::InvalidConfig(format!(
                "iou_threshold {} outside [0, 1]",
                self.iou_threshold
            )));
        }
        if !self.swipe_ratio.is_finite() || self.swipe_ratio <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "swipe_ratio {} must be positive",
                self.swipe_ratio
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ConfigSource {
    Yaml(String),
    Json(String),
    Config(EngineConfig),
}

/// Builds a validated [`EngineConfig`] from defaults, a YAML/JSON config
/// string, or explicit setters. Setters win over the config source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineBuilder {
    config_src: Option<ConfigSource>,
    max_age: Option<u32>,
    min_hits: Option<u32>,
    iou_threshold: Option<f32>,
    maxlen: Option<usize>,
    min_frames: Option<usize>,
    swipe_ratio: Option<f32>,
    channel_capacity: Option<usize>,
}

impl EngineBuilder {
    /// Creates a builder that resolves to the default configuration.
    ///
    /// # Examples
    /// ```rust
    /// # use handwave::{EngineBuilder, Result};
    /// # fn main() -> Result<()> {
    /// let config = EngineBuilder::new().build()?;
    /// assert_eq!(config.max_age, 30);
    /// assert_eq!(config.min_hits, 3);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads engine configuration from a YAML string. The string is not
    /// parsed until `build()`.
    ///
    /// # Examples
    /// ```rust
    /// # use handwave::{EngineBuilder, Result};
    /// # fn main() -> Result<()> {
    /// let config = EngineBuilder::new()
    ///     .with_config_yaml_str("max_age: 45\nmin_frames: 15\n".to_string())
    ///     .build()?;
    /// assert_eq!(config.max_age, 45);
    /// assert_eq!(config.min_frames, 15);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config_yaml_str(mut self, yaml_str: String) -> Self {
        self.config_src.replace(ConfigSource::Yaml(yaml_str));
        self
    }

    /// Loads engine configuration from a JSON string. The string is not
    /// parsed until `build()`.
    ///
    /// # Examples
    /// ```rust
    /// # use handwave::{EngineBuilder, Result};
    /// # fn main() -> Result<()> {
    /// let config = EngineBuilder::new()
    ///     .with_config_json_str(r#"{"swipe_ratio": 2.0}"#.to_string())
    ///     .build()?;
    /// assert_eq!(config.swipe_ratio, 2.0);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config_json_str(mut self, json_str: String) -> Self {
        self.config_src.replace(ConfigSource::Json(json_str));
        self
    }

    /// Starts from an existing configuration value.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config_src.replace(ConfigSource::Config(config));
        self
    }

    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn with_min_hits(mut self, min_hits: u32) -> Self {
        self.min_hits = Some(min_hits);
        self
    }

    pub fn with_iou_threshold(mut self, iou_threshold: f32) -> Self {
        self.iou_threshold = Some(iou_threshold);
        self
    }

    pub fn with_maxlen(mut self, maxlen: usize) -> Self {
        self.maxlen = Some(maxlen);
        self
    }

    pub fn with_min_frames(mut self, min_frames: usize) -> Self {
        self.min_frames = Some(min_frames);
        self
    }

    pub fn with_swipe_ratio(mut self, swipe_ratio: f32) -> Self {
        self.swipe_ratio = Some(swipe_ratio);
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = Some(channel_capacity);
        self
    }

    /// Resolves the configuration: parses the config source if one was
    /// given, applies the explicit setters on top, then validates.
    ///
    /// # Examples
    /// ```rust
    /// # use handwave::{EngineBuilder, Result};
    /// # fn main() -> Result<()> {
    /// let config = EngineBuilder::new()
    ///     .with_config_yaml_str("min_hits: 5\n".to_string())
    ///     .with_min_hits(2)
    ///     .build()?;
    /// // setters win over the config source
    /// assert_eq!(config.min_hits, 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<EngineConfig> {
        let mut config = match self.config_src {
            Some(ConfigSource::Json(s)) => serde_json::from_str(&s)?,
            Some(ConfigSource::Yaml(s)) => serde_yaml::from_str(&s)?,
            Some(ConfigSource::Config(c)) => c,
            None => EngineConfig::default(),
        };
        if let Some(max_age) = self.max_age {
            config.max_age = max_age;
        }
        if let Some(min_hits) = self.min_hits {
            config.min_hits = min_hits;
        }
        if let Some(iou_threshold) = self.iou_threshold {
            config.iou_threshold = iou_threshold;
        }
        if let Some(maxlen) = self.maxlen {
            config.maxlen = maxlen;
        }
        if let Some(min_frames) = self.min_frames {
            config.min_frames = min_frames;
        }
        if let Some(swipe_ratio) = self.swipe_ratio {
            config.swipe_ratio = swipe_ratio;
        }
        if let Some(channel_capacity) = self.channel_capacity {
            config.channel_capacity = channel_capacity;
        }
        config.validate()?;
        Ok(config)
    }
}
