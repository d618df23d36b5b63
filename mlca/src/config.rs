// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Analysis configuration, loadable from TOML.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NODE_BUDGET: usize = 500;
pub const DEFAULT_SUSPENSION_ACCURACY: f64 = 0.2;
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.9;
pub const DEFAULT_MAX_RELAXATIONS: usize = 1;
pub const DEFAULT_MAX_CIRCULAR_RELATIONS: usize = 20;
pub const DEFAULT_MAX_ENUMERATED_FACTORS: usize = 24;
pub const DEFAULT_MAX_RESOLUTIONS: usize = 10_000;

/// The upper bound for [`AnalysisConfig::max_enumerated_factors`] and
/// [`AnalysisConfig::max_circular_relations`], both of which size a powerset.
pub const ENUMERATION_LIMIT: usize = 40;

/// How candidate relations are derived from the data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Exhaustive minimization with prime implicants and Petrick's method.
    #[default]
    TopDown,
    /// Heuristic tree search with suspension.
    BottomUp,
}

/// How the assembler resolves several candidate causes for one effect inside a circular group.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureMode {
    /// Keep only resolutions with a single relation per effect.
    #[default]
    Simple,
    /// Also combine the causes of an effect into composite antecedents.
    Complex,
}

/// Parameters of the suspension search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SuspensionConfig {
    /// Maximum number of node visits per target, shared by all relaxation passes.
    pub node_budget: usize,
    /// Nodes below this accuracy are suspended.
    pub suspension_accuracy: f64,
    /// Nodes above this accuracy are kept as best-effort results.
    pub quality_threshold: f64,
    /// How often suspensions may be lifted (halving the suspension accuracy) when nothing was
    /// found.
    pub max_relaxations: usize,
    /// Maximum number of disjuncts. Defaults to the number of rows where the target is true.
    pub max_disjuncts: Option<usize>,
    /// Maximum number of literals per disjunct. Defaults to the number of candidate causes.
    pub max_conjuncts: Option<usize>,
    /// Whether imperfect best-effort relations are passed on to the assembler.
    pub accept_best_effort: bool,
}

impl Default for SuspensionConfig {
    fn default() -> Self {
        Self {
            node_budget: DEFAULT_NODE_BUDGET,
            suspension_accuracy: DEFAULT_SUSPENSION_ACCURACY,
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            max_relaxations: DEFAULT_MAX_RELAXATIONS,
            max_disjuncts: None,
            max_conjuncts: None,
            accept_best_effort: false,
        }
    }
}

/// Configuration for a full analysis.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalysisConfig {
    pub strategy: Strategy,
    pub structure_mode: StructureMode,
    pub suspension: SuspensionConfig,
    /// Upper bound on the size of a circular group; its powerset is enumerated.
    pub max_circular_relations: usize,
    /// Upper bound on the number of factors whose assignments are enumerated when comparing
    /// relation sets.
    pub max_enumerated_factors: usize,
    /// Upper bound on the number of resolutions of a circular group, including the composite
    /// variants of complex mode.
    pub max_resolutions: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            structure_mode: StructureMode::default(),
            suspension: SuspensionConfig::default(),
            max_circular_relations: DEFAULT_MAX_CIRCULAR_RELATIONS,
            max_enumerated_factors: DEFAULT_MAX_ENUMERATED_FACTORS,
            max_resolutions: DEFAULT_MAX_RESOLUTIONS,
        }
    }
}

/// The bounds the assembler enforces while resolving circular groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AssemblyLimits {
    pub max_circular_relations: usize,
    pub max_resolutions: usize,
}

impl Default for AssemblyLimits {
    fn default() -> Self {
        Self {
            max_circular_relations: DEFAULT_MAX_CIRCULAR_RELATIONS,
            max_resolutions: DEFAULT_MAX_RESOLUTIONS,
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.suspension;
        if s.node_budget == 0 {
            return Err(ConfigError::InvalidValue {
                field: "suspension.node-budget",
                message: "must be positive".to_owned(),
            });
        }
        for (field, value) in [
            ("suspension.suspension-accuracy", s.suspension_accuracy),
            ("suspension.quality-threshold", s.quality_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!("{} is outside [0, 1]", value),
                });
            }
        }
        for (field, value) in [
            ("max-enumerated-factors", self.max_enumerated_factors),
            ("max-circular-relations", self.max_circular_relations),
        ] {
            if value > ENUMERATION_LIMIT {
                return Err(ConfigError::InvalidValue {
                    field,
                    message: format!("must be at most {}", ENUMERATION_LIMIT),
                });
            }
        }
        if self.max_resolutions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max-resolutions",
                message: "must be positive".to_owned(),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn assembly_limits(&self) -> AssemblyLimits {
        AssemblyLimits {
            max_circular_relations: self.max_circular_relations,
            max_resolutions: self.max_resolutions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.suspension.node_budget, 500);
        assert_eq!(config.strategy, Strategy::TopDown);
    }

    #[test]
    fn test_partial_override() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            strategy = "bottom-up"
            structure-mode = "complex"

            [suspension]
            node-budget = 2000
            max-relaxations = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.strategy, Strategy::BottomUp);
        assert_eq!(config.structure_mode, StructureMode::Complex);
        assert_eq!(config.suspension.node_budget, 2000);
        assert_eq!(config.suspension.max_relaxations, 3);
        assert_eq!(config.suspension.quality_threshold, DEFAULT_QUALITY_THRESHOLD);
    }

    #[test]
    fn test_invalid() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("strategy = \"sideways\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[suspension]\nquality-threshold = 1.5"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_search_bounds() {
        for (toml, expected) in [
            ("max-circular-relations = 100", "max-circular-relations"),
            ("max-circular-relations = 64", "max-circular-relations"),
            ("max-enumerated-factors = 41", "max-enumerated-factors"),
            ("max-resolutions = 0", "max-resolutions"),
        ] {
            match AnalysisConfig::from_toml_str(toml) {
                Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, expected),
                other => panic!("{}: expected an invalid value, got {:?}", toml, other),
            }
        }

        let config = AnalysisConfig::from_toml_str(
            "max-circular-relations = 40\nmax-resolutions = 50",
        )
        .unwrap();
        assert_eq!(
            config.assembly_limits(),
            AssemblyLimits {
                max_circular_relations: 40,
                max_resolutions: 50,
            }
        );
        assert_eq!(AnalysisConfig::default().assembly_limits(), AssemblyLimits::default());
    }
}
