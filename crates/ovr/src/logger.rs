//! Stage-scoped logging.
//!
//! [`TrainingLogger`] prefixes every line with the stage uid so interleaved
//! output from concurrent fits stays attributable. Output goes through the
//! [`log`] facade; install a logger such as `env_logger` to see it.

use std::fmt::Display;

use serde::Serialize;

/// Logger bound to one stage.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    uid: String,
}

impl TrainingLogger {
    pub fn new(uid: impl Into<String>) -> Self {
        Self { uid: uid.into() }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    fn line(&self, message: impl Display) -> String {
        format!("[{}] {}", self.uid, message)
    }

    pub fn log_stage(&self, stage: &str) {
        log::info!("{}", self.line(format_args!("Stage: {stage}")));
    }

    /// Log stage params as JSON.
    pub fn log_params(&self, params: &impl Serialize) {
        match serde_json::to_string(params) {
            Ok(json) => log::info!("{}", self.line(format_args!("Params: {json}"))),
            Err(err) => log::debug!("{}", self.line(format_args!("params not loggable: {err}"))),
        }
    }

    pub fn log_named_value(&self, name: &str, value: impl Display) {
        log::info!("{}", self.line(format_args!("{name}={value}")));
    }

    pub fn log_num_classes(&self, num_classes: usize) {
        self.log_named_value("numClasses", num_classes);
    }

    pub fn log_num_features(&self, num_features: usize) {
        self.log_named_value("numFeatures", num_features);
    }

    pub fn info(&self, message: impl Display) {
        log::info!("{}", self.line(message));
    }

    pub fn warn(&self, message: impl Display) {
        log::warn!("{}", self.line(message));
    }

    pub fn debug(&self, message: impl Display) {
        log::debug!("{}", self.line(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_uid() {
        let logger = TrainingLogger::new("oneVsRest_abc");
        assert_eq!(logger.line("numClasses=3"), "[oneVsRest_abc] numClasses=3");
        // Smoke: logging without an installed logger is a no-op.
        logger.log_params(&crate::params::ColumnParams::default());
        logger.warn("weightCol is ignored");
    }
}
