use std::collections::HashSet;

use crate::error::{Result, ValidError};
use crate::network::model::Model;
use crate::valid::accuracy::{AccuracyValidator, ACCURACY_TAG};
use crate::valid::cross_entropy::{CrossEntropyValidator, CROSS_ENTROPY_TAG};
use crate::valid::runner::ValidationRunner;
use crate::valid::strategy::ValidatorStrategy;
use crate::valid::valid_config::ValidatorConfig;

/// Type tags accepted in `ValidatorConfig::valid_metrics`.
pub const KNOWN_METRICS: &[&str] = &[ACCURACY_TAG, CROSS_ENTROPY_TAG];

/// Builds one strategy per entry of `config.valid_metrics`, in order.
pub fn validators_from_config<M: Model + ?Sized>(
    config: &ValidatorConfig,
) -> Result<Vec<Box<dyn ValidatorStrategy<M>>>> {
    let mut seen = HashSet::new();
    let mut validators: Vec<Box<dyn ValidatorStrategy<M>>> = Vec::with_capacity(config.valid_metrics.len());

    for metric in &config.valid_metrics {
        if !seen.insert(metric.as_str()) {
            return Err(ValidError::DuplicateMetric(metric.clone()));
        }
        match metric.as_str() {
            ACCURACY_TAG => validators.push(Box::new(AccuracyValidator::new(config))),
            CROSS_ENTROPY_TAG => validators.push(Box::new(CrossEntropyValidator::new(config))),
            other => return Err(ValidError::UnknownMetric(other.to_owned())),
        }
    }
    Ok(validators)
}

/// Same as `validators_from_config`, each wrapped in its own runner so that
/// every metric keeps its own best and its own checkpoint.
pub fn runners_from_config<M: Model + ?Sized>(
    config: &ValidatorConfig,
) -> Result<Vec<ValidationRunner<M, Box<dyn ValidatorStrategy<M>>>>> {
    Ok(validators_from_config(config)?
        .into_iter()
        .map(|strategy| ValidationRunner::new(strategy, config))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Network;

    #[test]
    fn builds_validators_in_configured_order() {
        let mut config = ValidatorConfig::new("m");
        config.valid_metrics = vec!["cross-entropy".into(), "accuracy".into()];

        let validators = validators_from_config::<Network>(&config).unwrap();
        let tags: Vec<_> = validators.iter().map(|v| v.type_tag()).collect();

        assert_eq!(tags, vec!["cross-entropy", "accuracy"]);
        assert!(validators[0].lower_is_better());
        assert!(!validators[1].lower_is_better());
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let mut config = ValidatorConfig::new("m");
        config.valid_metrics = vec!["bleu".into()];

        let err = validators_from_config::<Network>(&config).err().unwrap();
        assert!(matches!(err, ValidError::UnknownMetric(m) if m == "bleu"));
    }

    #[test]
    fn duplicate_metric_is_rejected() {
        let mut config = ValidatorConfig::new("m");
        config.valid_metrics = vec!["accuracy".into(), "accuracy".into()];

        assert!(matches!(
            validators_from_config::<Network>(&config),
            Err(ValidError::DuplicateMetric(_))
        ));
    }
}
