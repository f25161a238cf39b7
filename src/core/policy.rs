// policy constants supplied by the configuration collaborator
use serde::{Deserialize, Serialize};

use crate::core::graph::GraphError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkPolicy {
    //max paired edge weight difference
    pub epsilon: f64,
    //inclusive
    pub activation_threshold: f64,
    pub abort_on_false_positive: bool,
    pub weight_buckets: u32,
}

impl Default for LinkPolicy {
    fn default() -> Self {
        LinkPolicy {
            epsilon: 0.001,
            activation_threshold: 0.5,
            abort_on_false_positive: true,
            weight_buckets: 100,
        }
    }
}

impl LinkPolicy {
    pub fn validate(&self) -> Result<(), GraphError> {
        if !(0.0..1.0).contains(&self.epsilon) {
            return Err(GraphError::InvalidPolicy(format!(
                "epsilon {} must be in [0, 1)",
                self.epsilon
            )));
        }
        if !(0.0..=1.0).contains(&self.activation_threshold) {
            return Err(GraphError::InvalidPolicy(format!(
                "activation_threshold {} must be in [0, 1]",
                self.activation_threshold
            )));
        }
        if self.weight_buckets == 0 {
            return Err(GraphError::InvalidPolicy(
                "weight_buckets must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Parse a policy from TOON text; missing fields take their defaults.
    pub fn from_toon(text: &str) -> Result<Self, GraphError> {
        let value: serde_json::Value =
            toon_format::decode_default(text).map_err(|e| GraphError::Encoding(e.to_string()))?;
        let policy: LinkPolicy =
            serde_json::from_value(value).map_err(|e| GraphError::InvalidPolicy(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let p = LinkPolicy::default();
        assert_eq!(p.epsilon, 0.001);
        assert_eq!(p.activation_threshold, 0.5);
        assert!(p.abort_on_false_positive);
        p.validate().unwrap();
    }

    #[test]
    fn from_toon_reads_fields_and_defaults_the_rest() {
        let p = LinkPolicy::from_toon("epsilon: 0.01\nabort_on_false_positive: false").unwrap();
        assert_eq!(p.epsilon, 0.01);
        assert!(!p.abort_on_false_positive);
        assert_eq!(p.activation_threshold, 0.5);
        assert_eq!(p.weight_buckets, 100);
    }

    #[test]
    fn from_toon_rejects_out_of_range_threshold() {
        let err = LinkPolicy::from_toon("activation_threshold: 1.5").unwrap_err();
        assert!(matches!(err, GraphError::InvalidPolicy(_)));
    }

    #[test]
    fn validate_rejects_zero_buckets() {
        let p = LinkPolicy {
            weight_buckets: 0,
            ..LinkPolicy::default()
        };
        assert!(matches!(p.validate().unwrap_err(), GraphError::InvalidPolicy(_)));
    }
}
