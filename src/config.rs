use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    WeightedRandom,
    #[default]
    SimulatedAnnealing,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::WeightedRandom => "weighted_random",
            Method::SimulatedAnnealing => "simulated_annealing",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weighted_random" => Ok(Method::WeightedRandom),
            "simulated_annealing" => Ok(Method::SimulatedAnnealing),
            other => Err(ConfigError::UnknownMethod(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffinityParams {
    /// Weight given to pairs that never met. Negative means bonus.
    pub first_meeting_bonus: f64,
    pub k_freq: f64,
    pub base_penalty: f64,
    /// Per-week multiplier of the recency penalty, in (0, 1).
    pub decay_rate: f64,
    pub frequency_weight: f64,
    pub recency_weight: f64,
}

impl Default for AffinityParams {
    fn default() -> Self {
        AffinityParams {
            first_meeting_bonus: -0.5,
            k_freq: 0.7,
            base_penalty: 1.0,
            decay_rate: 0.6,
            frequency_weight: 0.6,
            recency_weight: 0.4,
        }
    }
}

impl AffinityParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("first_meeting_bonus", self.first_meeting_bonus),
            ("base_penalty", self.base_penalty),
            ("frequency_weight", self.frequency_weight),
            ("recency_weight", self.recency_weight),
        ] {
            finite(name, value)?;
        }
        check(self.k_freq.is_finite() && self.k_freq >= 0.0, "k_freq", "finite and >= 0", self.k_freq)?;
        check(
            self.decay_rate > 0.0 && self.decay_rate < 1.0,
            "decay_rate",
            "in (0, 1)",
            self.decay_rate,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealParams {
    pub initial_temp: f64,
    pub cooling_rate: f64,
    pub temp_min: f64,
    pub max_iter: usize,
}

impl Default for AnnealParams {
    fn default() -> Self {
        AnnealParams {
            initial_temp: 100.0,
            cooling_rate: 0.995,
            temp_min: 0.1,
            max_iter: 5000,
        }
    }
}

impl AnnealParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(
            self.initial_temp.is_finite() && self.initial_temp > 0.0,
            "initial_temp",
            "finite and > 0",
            self.initial_temp,
        )?;
        check(
            self.cooling_rate > 0.0 && self.cooling_rate < 1.0,
            "cooling_rate",
            "in (0, 1)",
            self.cooling_rate,
        )?;
        check(
            self.temp_min.is_finite() && self.temp_min >= 0.0,
            "temp_min",
            "finite and >= 0",
            self.temp_min,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub method: Method,
    /// Cost scaling factor of the optimizer; distinct from the affinity constants.
    pub lam: f64,
    #[serde(alias = "sa_params")]
    pub anneal: AnnealParams,
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            method: Method::default(),
            lam: 3.0,
            anneal: AnnealParams::default(),
            seed: None,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(self.lam.is_finite() && self.lam >= 0.0, "lam", "finite and >= 0", self.lam)?;
        self.anneal.validate()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub affinity: AffinityParams,
    pub optimizer: OptimizerConfig,
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.affinity.validate()?;
        self.optimizer.validate()
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    check(value.is_finite(), name, "finite", value)
}

fn check(ok: bool, name: &'static str, expected: &'static str, value: f64) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, expected, value })
    }
}
