//! Built-in rule registrations.

use super::{Constraint, CrossRule, FormatCheck, ParameterRule, RuleKey, ValidationRuleSet};
use crate::catalog::entries::{CREDENTIAL_TYPES, SERVER_CREDENTIAL_TYPES};
use crate::catalog::sections::{
    CLUSTER_HEALTH_POLICY_SECTION, GLOBAL_REPLICATION_SECTION, KTL_LOGGER_SECTION,
    MANAGED_TRANSACTIONAL_REPLICATOR_SECTION, NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS,
    PLB_SECTION, REPLICATION_SECTIONS, RUN_AS_SECTIONS, SHARED_LOG_SECTIONS,
    SYSTEM_SERVICE_SECTIONS,
};
use crate::validator::{cluster, file_store, image_store, ktl, plb, replicator, security};
use crate::value::ValueKind::{self, Bool, Double, Int, TimeSpan};

use Constraint::{AllOf, AnyOf, AtLeast, Exactly, GreaterThan, MultipleOf, OneOf, Range};

pub const ACCOUNT_TYPES: &[&str] = &[
    "LocalUser",
    "DomainUser",
    "NetworkService",
    "LocalService",
    "LocalSystem",
    "ManagedServiceAccount",
];
pub const FILE_STORE_ACCOUNT_TYPES: &[&str] = &["LocalUser", "DomainUser"];
const LOGGING_ENGINES: &[&str] = &["ktl", "memory"];

const PERCENT: Constraint = Range(0.0, 100.0);
const PROBABILITY: Constraint = Range(0.0, 1.0);

fn zero_or_at_least(min: f64) -> Constraint {
    AnyOf(vec![Exactly(0.0), AtLeast(min)])
}

pub(super) fn register(rules: &mut ValidationRuleSet) {
    register_ktl_logger(rules);
    register_replicators(rules);
    register_plb(rules);
    register_cluster(rules);
    register_cross_rules(rules);
}

fn register_ktl_logger(rules: &mut ValidationRuleSet) {
    let ktl = &[KTL_LOGGER_SECTION];
    rules
        .add_each(ktl, "PeriodicFlushTime", TimeSpan, Range(15.0, 300.0))
        .add_each(ktl, "PeriodicTimerInterval", TimeSpan, Range(1.0, 60.0))
        .add_each(ktl, "WriteBufferMemoryPoolMinimumInKB", Int, zero_or_at_least(16384.0))
        .add_each(ktl, "WriteBufferMemoryPoolMaximumInKB", Int, zero_or_at_least(16384.0))
        .add_each(
            ktl,
            "WriteBufferMemoryPoolPerStreamInKB",
            Int,
            AnyOf(vec![Exactly(-1.0), Exactly(0.0), AtLeast(1024.0)]),
        )
        .add_each(ktl, "SharedLogSizeInMB", Int, AtLeast(512.0))
        .add_each(ktl, "SharedLogNumberStreams", Int, Range(3.0, 3.0 * 8192.0))
        .add_each(ktl, "MaximumDestagingWriteOutstandingInKB", Int, zero_or_at_least(16384.0))
        .add_each(ktl, "SharedLogThrottleLimitInPercentUsed", Int, PERCENT)
        .add_each(ktl, "PinnedMemoryLimitInKB", Int, AtLeast(-1.0));

    rules.add_each(
        &["TStore"],
        "SweepThreshold",
        Int,
        AnyOf(vec![Exactly(-1.0), Range(0.0, 5_000_000.0)]),
    );
}

fn register_replicators(rules: &mut ValidationRuleSet) {
    let mut replicators: Vec<&str> = REPLICATION_SECTIONS.to_vec();
    replicators.push(MANAGED_TRANSACTIONAL_REPLICATOR_SECTION);

    rules
        .add_each(&replicators, "MaxReplicationMessageSize", Int, GreaterThan(0.0))
        .add_each(&replicators, "RetryInterval", TimeSpan, GreaterThan(0.0))
        .add_each(&replicators, "BatchAcknowledgementInterval", TimeSpan, AtLeast(0.0));
    for queue in ["Primary", "Secondary", "Copy"] {
        let (initial, max) = replicator::queue_parameter_names(queue);
        rules
            .add_each(&replicators, &initial, Int, GreaterThan(0.0))
            .add_each(&replicators, &max, Int, AtLeast(0.0));
    }
    rules
        .add_each(REPLICATION_SECTIONS, "InitialReplicationQueueSize", Int, GreaterThan(0.0))
        .add_each(REPLICATION_SECTIONS, "MaxReplicationQueueSize", Int, AtLeast(0.0))
        .add_each(REPLICATION_SECTIONS, "MaxReplicationQueueMemorySize", Int, AtLeast(0.0))
        .add_each(&replicators, "MaxPrimaryReplicationQueueMemorySize", Int, AtLeast(0.0))
        .add_each(&replicators, "MaxSecondaryReplicationQueueMemorySize", Int, AtLeast(0.0));

    let global = &[GLOBAL_REPLICATION_SECTION];
    rules
        .add_each(global, "QueueHealthWarningAtUsagePercent", Int, Range(1.0, 100.0))
        .add_each(global, "SlowIdleRestartAtQueueUsagePercent", Int, Range(1.0, 100.0))
        .add_each(global, "SlowActiveSecondaryRestartAtQueueUsagePercent", Int, Range(1.0, 100.0))
        .add_each(global, "SecondaryProgressRateDecayFactor", Double, PROBABILITY);

    let mut transactional: Vec<&str> = NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS.to_vec();
    transactional.push(MANAGED_TRANSACTIONAL_REPLICATOR_SECTION);
    rules
        .add_each(&transactional, "CheckpointThresholdInMB", Int, GreaterThan(0.0))
        .add_each(&transactional, "MaxAccumulatedBackupLogSizeInMB", Int, GreaterThan(0.0))
        .add_each(&transactional, "MinLogSizeInMB", Int, AtLeast(0.0))
        .add_each(&transactional, "TruncationThresholdFactor", Int, GreaterThan(1.0))
        .add_each(&transactional, "ThrottlingThresholdFactor", Int, GreaterThan(1.0))
        .add_each(&transactional, "MaxStreamSizeInMB", Int, AtLeast(0.0))
        .add_each(
            &transactional,
            "MaxMetadataSizeInKB",
            Int,
            AllOf(vec![GreaterThan(0.0), MultipleOf(4.0)]),
        )
        .add_each(
            &transactional,
            "MaxRecordSizeInKB",
            Int,
            AllOf(vec![AtLeast(128.0), MultipleOf(4.0)]),
        )
        .add_each(
            &transactional,
            "MaxWriteQueueDepthInKB",
            Int,
            AnyOf(vec![Exactly(0.0), AllOf(vec![AtLeast(4.0), MultipleOf(4.0)])]),
        )
        .add_each(&transactional, "Test_LoggingEngine", ValueKind::Enum(LOGGING_ENGINES), Constraint::Any)
        .add_each(&transactional, "Test_LogMinDelayIntervalMilliseconds", Int, AtLeast(0.0))
        .add_each(&transactional, "Test_LogMaxDelayIntervalMilliseconds", Int, AtLeast(0.0))
        .add_each(&transactional, "Test_LogDelayRatio", Double, PROBABILITY)
        .add_each(&transactional, "Test_LogDelayProcessExitRatio", Double, PROBABILITY)
        .add_each(
            NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS,
            "SerializationVersion",
            Int,
            OneOf(vec![0.0, 1.0]),
        )
        .add_each(
            &[MANAGED_TRANSACTIONAL_REPLICATOR_SECTION],
            "LogTruncationIntervalSeconds",
            Int,
            AtLeast(0.0),
        );
}

fn register_plb(rules: &mut ValidationRuleSet) {
    let plb = &[PLB_SECTION];
    for name in [
        "SwapPrimaryProbability",
        "LoadDecayFactor",
        "MaxPercentageToMove",
        "MaxPercentageToMoveForPlacement",
        "GlobalMovementThrottleThresholdPercentage",
        "GlobalMovementThrottleThresholdPercentageForPlacement",
        "GlobalMovementThrottleThresholdPercentageForBalancing",
        "MovementThrottledPartitionsPercentageThreshold",
        "LocalDomainWeight",
        "CpuPercentageNodeCapacity",
        "MemoryPercentageNodeCapacity",
    ] {
        rules.add_each(plb, name, Double, PROBABILITY);
    }

    for name in [
        "AffinityConstraintPriority",
        "ApplicationCapacityConstraintPriority",
        "CapacityConstraintPriority",
        "FaultDomainConstraintPriority",
        "PlacementConstraintPriority",
        "PreferredLocationConstraintPriority",
        "ScaleoutCountConstraintPriority",
        "UpgradeDomainConstraintPriority",
    ] {
        rules.add_each(plb, name, Int, OneOf(vec![-1.0, 0.0, 1.0, 2.0]));
    }
    rules.add_each(plb, "ThrottlingConstraintPriority", Int, OneOf(vec![-1.0, 0.0, 1.0]));

    rules
        .add_each(plb, "LocalBalancingThreshold", Double, AtLeast(0.0))
        .add_each(plb, "ScoreImprovementThreshold", Double, AtLeast(0.0))
        .add_each(
            plb,
            "AvgStdDevDeltaThrottleThreshold",
            Double,
            AnyOf(vec![Exactly(-1.0), AtLeast(0.0)]),
        )
        .add_each(plb, "MaxViolatedItemsToTrace", Int, GreaterThan(0.0))
        .add_each(plb, "PlacementConstraintValidationCacheSize", Int, AtLeast(0.0));

    for name in [
        "PLBRefreshInterval",
        "MinPlacementInterval",
        "MinConstraintCheckInterval",
        "MinLoadBalancingInterval",
        "PLBRefreshGap",
        "LoadDecayInterval",
        "GlobalMovementThrottleCountingInterval",
        "MovementPerPartitionThrottleCountingInterval",
    ] {
        rules.add_each(plb, name, TimeSpan, AtLeast(0.0));
    }

    let groups: [(&str, ValueKind, Constraint); 9] = [
        ("MetricBalancingThresholds", Double, AtLeast(1.0)),
        ("MetricActivityThresholds", Int, AtLeast(0.0)),
        ("GlobalMetricWeights", Double, AtLeast(0.0)),
        ("NodeBufferPercentage", Double, PROBABILITY),
        ("DefragmentationMetrics", Bool, Constraint::Any),
        ("DefragmentationEmptyNodeDistributionPolicy", Int, OneOf(vec![0.0, 1.0])),
        (
            "DefragmentationMetricsPercentOrNumberOfEmptyNodesTriggeringThreshold",
            Double,
            AtLeast(0.0),
        ),
        ("PlacementStrategy", Int, Range(0.0, 4.0)),
        ("MaximumInBuildReplicasPerNode", Int, AtLeast(0.0)),
    ];
    for (section, kind, constraint) in groups {
        rules.add(ParameterRule::new(RuleKey::section(section), kind, constraint));
    }
}

fn register_cluster(rules: &mut ValidationRuleSet) {
    let health = &[CLUSTER_HEALTH_POLICY_SECTION];
    rules
        .add_each(health, "MaxPercentUnhealthyNodes", Int, PERCENT)
        .add_each(health, "MaxPercentUnhealthyApplications", Int, PERCENT)
        .add(ParameterRule::new(
            RuleKey::prefix(
                CLUSTER_HEALTH_POLICY_SECTION,
                cluster::APPLICATION_TYPE_HEALTH_PREFIX,
                true,
            ),
            Int,
            PERCENT,
        ));

    let security = &["Security"];
    rules
        .add_each(security, "ClusterCredentialType", ValueKind::Enum(CREDENTIAL_TYPES), Constraint::Any)
        .add_each(
            security,
            "ServerAuthCredentialType",
            ValueKind::Enum(SERVER_CREDENTIAL_TYPES),
            Constraint::Any,
        );
    for name in [
        "ClusterCertThumbprints",
        "ServerCertThumbprints",
        "ClientCertThumbprints",
        "AdminClientCertThumbprints",
    ] {
        rules.add_each(
            security,
            name,
            ValueKind::String,
            Constraint::Format(FormatCheck::ThumbprintList),
        );
    }

    rules.add_each(
        RUN_AS_SECTIONS,
        "RunAsAccountType",
        ValueKind::Enum(ACCOUNT_TYPES),
        Constraint::Any,
    );
    for name in ["PrimaryAccountType", "SecondaryAccountType"] {
        rules.add_each(
            &["FileStoreService"],
            name,
            ValueKind::Enum(FILE_STORE_ACCOUNT_TYPES),
            Constraint::Any,
        );
    }
    for name in ["PrimaryAccountNTLMX509Thumbprint", "SecondaryAccountNTLMX509Thumbprint"] {
        rules.add_each(
            &["FileStoreService"],
            name,
            ValueKind::String,
            Constraint::Format(FormatCheck::Thumbprint),
        );
    }

    rules.add_each(
        SYSTEM_SERVICE_SECTIONS,
        "PlacementConstraints",
        ValueKind::String,
        Constraint::Format(FormatCheck::PlacementConstraint),
    );

    for name in ["TargetReplicaSetSize", "MinReplicaSetSize"] {
        rules.add_each(&["ClusterManager", "FailoverManager", "ImageStoreService"], name, Int, GreaterThan(0.0));
    }
}

/// Composite checks, in the order they run.
fn register_cross_rules(rules: &mut ValidationRuleSet) {
    let mut replicators: Vec<&str> = REPLICATION_SECTIONS.to_vec();
    replicators.push(MANAGED_TRANSACTIONAL_REPLICATOR_SECTION);
    let mut transactional: Vec<&str> = NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS.to_vec();
    transactional.push(MANAGED_TRANSACTIONAL_REPLICATOR_SECTION);

    rules
        .add_cross(CrossRule::document("node-certificates", security::check_node_certificates))
        .add_cross(CrossRule::per_section("votes", &["Votes"], cluster::check_votes))
        .add_cross(CrossRule::document("dependencies", cluster::check_dependencies))
        .add_cross(CrossRule::per_section("run-as", RUN_AS_SECTIONS, security::check_run_as))
        .add_cross(CrossRule::per_section("client-claims", &["Security"], security::check_client_claims))
        .add_cross(CrossRule::document("windows-identity", security::check_windows_identity))
        .add_cross(CrossRule::per_section(
            "write-buffer-pool",
            &[KTL_LOGGER_SECTION],
            ktl::check_write_buffer_pool,
        ))
        .add_cross(CrossRule::per_section("shared-log", SHARED_LOG_SECTIONS, ktl::check_shared_log))
        .add_cross(CrossRule::per_section("replication-queues", &replicators, replicator::check_queues))
        .add_cross(CrossRule::per_section(
            "replication-intervals",
            &replicators,
            replicator::check_intervals,
        ))
        .add_cross(CrossRule::per_section(
            "queue-health",
            &[GLOBAL_REPLICATION_SECTION],
            replicator::check_queue_health,
        ))
        .add_cross(CrossRule::per_section(
            "transactional-log",
            &transactional,
            replicator::check_transactional_log,
        ))
        .add_cross(CrossRule::per_section("plb-timers", &[PLB_SECTION], plb::check_timer_groups))
        .add_cross(CrossRule::per_section(
            "file-store-accounts",
            &["FileStoreService"],
            file_store::check_accounts,
        ))
        .add_cross(CrossRule::per_section(
            "image-store",
            &["Management"],
            image_store::check_connection_string,
        ));
}
