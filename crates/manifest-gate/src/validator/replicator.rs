//! Replicator queues and transactional replicator log sizing.

use crate::catalog::sections::MANAGED_TRANSACTIONAL_REPLICATOR_SECTION;
use crate::error::ValidationError;
use crate::rules::RuleContext;

const QUEUES: [&str; 4] = ["", "Primary", "Secondary", "Copy"];

/// Log streams on sparse files are capped at 200 GB.
const SPARSE_FILE_MAX_STREAM_SIZE_MB: i64 = 200 * 1024;

const RECORDS_PER_STREAM: i64 = 16;

/// `(Initial*, Max*)` parameter names of a queue; `""` is the V1 replication queue.
pub fn queue_parameter_names(queue: &str) -> (String, String) {
    match queue {
        "" => (
            "InitialReplicationQueueSize".to_string(),
            "MaxReplicationQueueSize".to_string(),
        ),
        "Copy" => ("InitialCopyQueueSize".to_string(), "MaxCopyQueueSize".to_string()),
        other => (
            format!("Initial{}ReplicationQueueSize", other),
            format!("Max{}ReplicationQueueSize", other),
        ),
    }
}

fn memory_parameter_name(queue: &str) -> Option<String> {
    match queue {
        "Copy" => None,
        "" => Some("MaxReplicationQueueMemorySize".to_string()),
        other => Some(format!("Max{}ReplicationQueueMemorySize", other)),
    }
}

fn is_power_of_two(value: i64) -> bool {
    value > 0 && (value & (value - 1)) == 0
}

pub fn check_queues(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let managed = ctx.section().eq_ignore_ascii_case(MANAGED_TRANSACTIONAL_REPLICATOR_SECTION);
    let message_size = ctx.int("MaxReplicationMessageSize")?;

    for queue in QUEUES {
        if managed && queue.is_empty() {
            continue;
        }
        let (initial_name, max_name) = queue_parameter_names(queue);

        match (ctx.is_explicit(&initial_name), ctx.is_explicit(&max_name)) {
            (true, false) => {
                return Err(ctx.cross_error(
                    &max_name,
                    format!("{} must be specified together with {}", max_name, initial_name),
                ))
            }
            (false, true) => {
                return Err(ctx.cross_error(
                    &initial_name,
                    format!("{} must be specified together with {}", initial_name, max_name),
                ))
            }
            _ => {}
        }

        let initial = ctx.int(&initial_name)?;
        let max = ctx.int(&max_name)?;
        if initial <= 1 || !is_power_of_two(initial) {
            return Err(ctx.range_error(
                &initial_name,
                format!("{} ({}) must be a power of 2 greater than 1", initial_name, initial),
            ));
        }

        let memory = match memory_parameter_name(queue) {
            Some(name) => ctx.int(&name)?,
            None => 0,
        };
        if max == 0 {
            if memory == 0 {
                return Err(ctx.cross_error(
                    &max_name,
                    format!("{} and its memory limit cannot both be 0", max_name),
                ));
            }
        } else {
            if !is_power_of_two(max) {
                return Err(ctx.range_error(&max_name, format!("{} ({}) must be a power of 2", max_name, max)));
            }
            if initial > max {
                return Err(ctx.cross_error(
                    &initial_name,
                    format!("{} ({}) must not exceed {} ({})", initial_name, initial, max_name, max),
                ));
            }
        }

        if memory > 0 && message_size > memory {
            return Err(ctx.cross_error(
                "MaxReplicationMessageSize",
                format!(
                    "MaxReplicationMessageSize ({}) must not exceed the {} queue memory limit ({})",
                    message_size,
                    if queue.is_empty() { "replication" } else { queue },
                    memory
                ),
            ));
        }
    }
    Ok(())
}

pub fn check_intervals(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let ack = ctx.seconds("BatchAcknowledgementInterval")?;
    let retry = ctx.seconds("RetryInterval")?;
    if ack >= retry {
        return Err(ctx.cross_error(
            "BatchAcknowledgementInterval",
            "BatchAcknowledgementInterval must be less than RetryInterval",
        ));
    }
    Ok(())
}

/// Warning < idle restart < active restart.
pub fn check_queue_health(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let warning = ctx.int("QueueHealthWarningAtUsagePercent")?;
    let idle = ctx.int("SlowIdleRestartAtQueueUsagePercent")?;
    let active = ctx.int("SlowActiveSecondaryRestartAtQueueUsagePercent")?;
    if warning >= idle {
        return Err(ctx.cross_error(
            "QueueHealthWarningAtUsagePercent",
            format!(
                "QueueHealthWarningAtUsagePercent ({}) must be less than SlowIdleRestartAtQueueUsagePercent ({})",
                warning, idle
            ),
        ));
    }
    if idle >= active {
        return Err(ctx.cross_error(
            "SlowIdleRestartAtQueueUsagePercent",
            format!(
                "SlowIdleRestartAtQueueUsagePercent ({}) must be less than SlowActiveSecondaryRestartAtQueueUsagePercent ({})",
                idle, active
            ),
        ));
    }
    Ok(())
}

/// Log size chain of a transactional replicator section.
pub fn check_transactional_log(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let checkpoint = ctx.int("CheckpointThresholdInMB")?;
    let min_log = ctx.int("MinLogSizeInMB")?;
    let truncation_factor = ctx.int("TruncationThresholdFactor")?;
    let throttling_factor = ctx.int("ThrottlingThresholdFactor")?;
    let max_stream = ctx.int("MaxStreamSizeInMB")?;
    let max_record = ctx.int("MaxRecordSizeInKB")?;
    let backup = ctx.int("MaxAccumulatedBackupLogSizeInMB")?;

    if throttling_factor <= truncation_factor {
        return Err(ctx.cross_error(
            "ThrottlingThresholdFactor",
            format!(
                "ThrottlingThresholdFactor ({}) must be greater than TruncationThresholdFactor ({})",
                throttling_factor, truncation_factor
            ),
        ));
    }

    // A zero MinLogSizeInMB means half the checkpoint threshold.
    let effective_min_log = if min_log == 0 { (checkpoint / 2).max(1) } else { min_log };
    let throttle_limit = (checkpoint * throttling_factor).max(effective_min_log * throttling_factor);
    if checkpoint >= throttle_limit {
        return Err(ctx.cross_error(
            "CheckpointThresholdInMB",
            format!(
                "CheckpointThresholdInMB ({}) must be less than the throttle limit ({} MB)",
                checkpoint, throttle_limit
            ),
        ));
    }

    if max_stream > 0 {
        if max_stream * 1024 < max_record * RECORDS_PER_STREAM {
            return Err(ctx.cross_error(
                "MaxStreamSizeInMB",
                format!(
                    "MaxStreamSizeInMB ({}) must hold at least {} records of MaxRecordSizeInKB ({})",
                    max_stream, RECORDS_PER_STREAM, max_record
                ),
            ));
        }
        if min_log > max_stream {
            return Err(ctx.cross_error(
                "MinLogSizeInMB",
                format!("MinLogSizeInMB ({}) must not exceed MaxStreamSizeInMB ({})", min_log, max_stream),
            ));
        }
        if throttle_limit > max_stream {
            return Err(ctx.cross_error(
                "ThrottlingThresholdFactor",
                format!(
                    "Throttle limit ({} MB) must not exceed MaxStreamSizeInMB ({})",
                    throttle_limit, max_stream
                ),
            ));
        }
        if backup >= max_stream {
            return Err(ctx.cross_error(
                "MaxAccumulatedBackupLogSizeInMB",
                format!(
                    "MaxAccumulatedBackupLogSizeInMB ({}) must be less than MaxStreamSizeInMB ({})",
                    backup, max_stream
                ),
            ));
        }
        if ctx.boolean("OptimizeLogForLowerDiskUsage")? && max_stream > SPARSE_FILE_MAX_STREAM_SIZE_MB {
            return Err(ctx.range_error(
                "MaxStreamSizeInMB",
                format!(
                    "MaxStreamSizeInMB ({}) exceeds the sparse file limit of {} MB",
                    max_stream, SPARSE_FILE_MAX_STREAM_SIZE_MB
                ),
            ));
        }
    }

    let min_delay = ctx.int("Test_LogMinDelayIntervalMilliseconds")?;
    let max_delay = ctx.int("Test_LogMaxDelayIntervalMilliseconds")?;
    if min_delay > max_delay {
        return Err(ctx.cross_error(
            "Test_LogMinDelayIntervalMilliseconds",
            "Test_LogMinDelayIntervalMilliseconds must not exceed Test_LogMaxDelayIntervalMilliseconds",
        ));
    }

    let slow_api = ctx.seconds("SlowApiMonitoringDuration")?;
    if slow_api < 0.0 || slow_api == f64::MAX {
        return Err(ctx.range_error(
            "SlowApiMonitoringDuration",
            "SlowApiMonitoringDuration must be a finite, non-negative duration",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SettingsCatalog;
    use crate::config::ValidatorConfig;
    use crate::document::{ClusterManifest, Parameter, SettingsDocument};
    use crate::error::ErrorKind;

    type Check = fn(&RuleContext<'_>) -> Result<(), ValidationError>;

    fn run(section: &str, params: &[(&str, &str)], check: Check) -> Result<(), ValidationError> {
        let mut settings = SettingsDocument::new();
        for (name, value) in params {
            settings.set(section, Parameter::new(*name, *value));
        }
        let manifest = ClusterManifest::new(settings);
        let catalog = SettingsCatalog::standard();
        let config = ValidatorConfig::default();
        let ctx = RuleContext::new(&manifest, None, &catalog, &config, None);
        check(&ctx.for_section(section))
    }

    #[test]
    fn test_queue_names() {
        assert_eq!(queue_parameter_names("").0, "InitialReplicationQueueSize");
        assert_eq!(queue_parameter_names("Copy").1, "MaxCopyQueueSize");
        assert_eq!(
            queue_parameter_names("Primary"),
            (
                "InitialPrimaryReplicationQueueSize".to_string(),
                "MaxPrimaryReplicationQueueSize".to_string()
            )
        );
    }

    #[test]
    fn test_defaults_pass() {
        for section in ["Replication", "Failover/Replication", "TransactionalReplicator"] {
            assert!(run(section, &[], check_queues).is_ok(), "{}", section);
            assert!(run(section, &[], check_intervals).is_ok(), "{}", section);
        }
        assert!(run("Replication", &[], check_queue_health).is_ok());
        for section in ["TransactionalReplicator2", "Naming/TransactionalReplicator2", "TransactionalReplicator"] {
            assert!(run(section, &[], check_transactional_log).is_ok(), "{}", section);
        }
    }

    #[test]
    fn test_queue_pairing() {
        let err = run("Replication", &[("MaxReplicationQueueSize", "2048")], check_queues).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CrossParameter);
        assert_eq!(err.parameter(), "InitialReplicationQueueSize");

        let err = run("Replication", &[("InitialCopyQueueSize", "128")], check_queues).unwrap_err();
        assert_eq!(err.parameter(), "MaxCopyQueueSize");

        let both = [("InitialCopyQueueSize", "128"), ("MaxCopyQueueSize", "4096")];
        assert!(run("Replication", &both, check_queues).is_ok());
    }

    #[test]
    fn test_queue_magnitudes() {
        let not_power = [("InitialPrimaryReplicationQueueSize", "100"), ("MaxPrimaryReplicationQueueSize", "1024")];
        assert!(run("Replication", &not_power, check_queues).is_err());

        let inverted = [("InitialPrimaryReplicationQueueSize", "2048"), ("MaxPrimaryReplicationQueueSize", "1024")];
        let err = run("Replication", &inverted, check_queues).unwrap_err();
        assert!(err.to_string().contains("must not exceed"));

        let unbounded = [("InitialReplicationQueueSize", "64"), ("MaxReplicationQueueSize", "0")];
        assert!(run("Replication", &unbounded, check_queues).is_err());
    }

    #[test]
    fn test_smallest_initial_queue_size() {
        for queue in QUEUES {
            let (initial, max) = queue_parameter_names(queue);

            let two = [(initial.as_str(), "2"), (max.as_str(), "1024")];
            assert!(run("Replication", &two, check_queues).is_ok(), "{} = 2", initial);

            let one = [(initial.as_str(), "1"), (max.as_str(), "1024")];
            let err = run("Replication", &one, check_queues).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::RangeOrFormat, "{}", err);
            assert_eq!(err.parameter(), initial);
        }
    }

    #[test]
    fn test_managed_replicator_skips_v1_queue() {
        let unbounded = [("InitialReplicationQueueSize", "64")];
        assert!(run("TransactionalReplicator", &unbounded, check_queues).is_ok());
    }

    #[test]
    fn test_ack_interval_below_retry() {
        let err = run(
            "Replication",
            &[("BatchAcknowledgementInterval", "10"), ("RetryInterval", "5")],
            check_intervals,
        )
        .unwrap_err();
        assert_eq!(err.parameter(), "BatchAcknowledgementInterval");
    }

    #[test]
    fn test_log_chain() {
        let err = run(
            "TransactionalReplicator2",
            &[("ThrottlingThresholdFactor", "2"), ("TruncationThresholdFactor", "3")],
            check_transactional_log,
        )
        .unwrap_err();
        assert_eq!(err.parameter(), "ThrottlingThresholdFactor");

        let err = run(
            "TransactionalReplicator2",
            &[("MaxStreamSizeInMB", "16"), ("MaxRecordSizeInKB", "2048")],
            check_transactional_log,
        )
        .unwrap_err();
        assert_eq!(err.parameter(), "MaxStreamSizeInMB");

        let err = run(
            "TransactionalReplicator2",
            &[("MaxStreamSizeInMB", "409600"), ("MaxAccumulatedBackupLogSizeInMB", "800")],
            check_transactional_log,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sparse file"));

        let err = run(
            "TransactionalReplicator2",
            &[
                ("Test_LogMinDelayIntervalMilliseconds", "50"),
                ("Test_LogMaxDelayIntervalMilliseconds", "10"),
            ],
            check_transactional_log,
        )
        .unwrap_err();
        assert_eq!(err.parameter(), "Test_LogMinDelayIntervalMilliseconds");

        let err = run(
            "TransactionalReplicator2",
            &[("SlowApiMonitoringDuration", "MaxValue")],
            check_transactional_log,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RangeOrFormat);
    }
}
