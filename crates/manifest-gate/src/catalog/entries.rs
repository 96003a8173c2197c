//! Built-in catalog rows.

use super::sections::{
    CLUSTER_HEALTH_POLICY_SECTION, GLOBAL_REPLICATION_SECTION, KTL_LOGGER_SECTION,
    MANAGED_TRANSACTIONAL_REPLICATOR_SECTION, NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS,
    NODE_CAPACITIES_SECTION, NODE_PROPERTIES_SECTION, NODE_SFSS_POLICIES_SECTION,
    PLB_METRIC_SECTIONS, PLB_SECTION, REPLICATION_SECTIONS, RUN_AS_SECTIONS,
    SYSTEM_SERVICE_SECTIONS,
};
use super::{ConfigEntry, SettingsCatalog, UpgradePolicy};
use crate::value::ValueKind;

use UpgradePolicy::{Dynamic, NotAllowed, SingleChange, Static};
use ValueKind::{Bool, Double, Guid, Int, Path, TimeSpan};

const STR: ValueKind = ValueKind::String;

pub const CREDENTIAL_TYPES: &[&str] = &["None", "X509", "Windows"];
pub const SERVER_CREDENTIAL_TYPES: &[&str] = &["None", "X509"];

pub(super) fn register_standard(catalog: &mut SettingsCatalog) {
    register_cluster(catalog);
    register_security(catalog);
    register_file_store(catalog);
    register_ktl_logger(catalog);

    for section in REPLICATION_SECTIONS {
        register_replicator(catalog, section, true);
    }
    register_global_replication(catalog, GLOBAL_REPLICATION_SECTION);

    for section in NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS {
        register_transactional_replicator(catalog, section);
        catalog.add(ConfigEntry::new(section, "SerializationVersion", Int, "0", Static));
    }

    let managed = MANAGED_TRANSACTIONAL_REPLICATOR_SECTION;
    register_replicator(catalog, managed, false);
    register_transactional_replicator(catalog, managed);
    register_shared_log(catalog, managed);
    catalog.add(ConfigEntry::new(managed, "LogTruncationIntervalSeconds", Int, "0", Static));

    register_plb(catalog);
}

fn add_all(catalog: &mut SettingsCatalog, section: &str, rows: &[(&str, ValueKind, &str, UpgradePolicy)]) {
    for (name, kind, default, policy) in rows {
        catalog.add(ConfigEntry::new(section, name, *kind, default, *policy));
    }
}

fn register_cluster(catalog: &mut SettingsCatalog) {
    add_all(
        catalog,
        "Setup",
        &[
            ("FabricDataRoot", Path, "", NotAllowed),
            ("FabricLogRoot", Path, "", NotAllowed),
        ],
    );

    add_all(
        catalog,
        "FailoverManager",
        &[
            ("ExpectedClusterSize", Int, "1", Dynamic),
            ("TargetReplicaSetSize", Int, "7", Static),
            ("MinReplicaSetSize", Int, "3", Static),
        ],
    );

    add_all(
        catalog,
        "ClusterManager",
        &[
            ("TargetReplicaSetSize", Int, "7", Static),
            ("MinReplicaSetSize", Int, "3", Static),
        ],
    );

    for section in SYSTEM_SERVICE_SECTIONS {
        catalog.add(ConfigEntry::new(section, "PlacementConstraints", STR, "", Static));
    }

    add_all(
        catalog,
        "ImageStoreService",
        &[
            ("Enabled", Bool, "false", Static),
            ("EnableClusterManagerAffinity", Bool, "false", Static),
            ("TargetReplicaSetSize", Int, "7", Static),
            ("MinReplicaSetSize", Int, "3", Static),
        ],
    );

    add_all(
        catalog,
        "Management",
        &[
            ("ImageStoreConnectionString", STR, "", Static),
            ("AllowImageStoreConnectionStringChange", Bool, "false", Dynamic),
            ("ImageStoreMinimumTransferBPS", Int, "1024", Dynamic),
            ("ImageCachingEnabled", Bool, "true", Static),
        ],
    );

    add_all(
        catalog,
        "Hosting",
        &[
            ("RunAsPolicyEnabled", Bool, "false", Static),
            ("NTLMAuthenticationEnabled", Bool, "false", Static),
            ("NTLMAuthenticationPasswordSecret", STR, "", Static),
            ("ActivationRetryBackoffInterval", TimeSpan, "FromSeconds(10)", Dynamic),
        ],
    );

    add_all(
        catalog,
        "FabricHost",
        &[
            ("ActivatorServiceAddress", STR, "", Static),
            ("StopTimeout", TimeSpan, "FromSeconds(300)", Dynamic),
        ],
    );

    add_all(
        catalog,
        "Federation",
        &[
            ("NodeIdGeneratorVersion", STR, "", SingleChange),
            ("UseV2NodeIdGenerator", Bool, "false", SingleChange),
            ("LeaseDuration", TimeSpan, "FromSeconds(30)", Static),
        ],
    );

    for section in ["DiagnosticFileStore", "DiagnosticTableStore"] {
        add_all(
            catalog,
            section,
            &[
                ("IsEnabled", Bool, "false", Static),
                ("StoreConnectionString", STR, "", Static),
                ("UploadIntervalInMinutes", Int, "5", Dynamic),
            ],
        );
    }

    add_all(
        catalog,
        CLUSTER_HEALTH_POLICY_SECTION,
        &[
            ("MaxPercentUnhealthyNodes", Int, "0", Dynamic),
            ("MaxPercentUnhealthyApplications", Int, "0", Dynamic),
            ("ConsiderWarningAsError", Bool, "false", Dynamic),
        ],
    );
    catalog.add_group_prefix(
        CLUSTER_HEALTH_POLICY_SECTION,
        "ApplicationTypeMaxPercentUnhealthyApplications-",
        Int,
        Dynamic,
    );

    catalog.add_group("Votes", STR, Static);
    catalog.add_group(NODE_PROPERTIES_SECTION, STR, Static);
    catalog.add_group(NODE_CAPACITIES_SECTION, ValueKind::UInt, Static);
    catalog.add_group(NODE_SFSS_POLICIES_SECTION, STR, Static);
}

fn register_security(catalog: &mut SettingsCatalog) {
    add_all(
        catalog,
        "Security",
        &[
            ("ClusterCredentialType", ValueKind::Enum(CREDENTIAL_TYPES), "None", Static),
            ("ServerAuthCredentialType", ValueKind::Enum(SERVER_CREDENTIAL_TYPES), "None", Static),
            ("ClientRoleEnabled", Bool, "false", Static),
            ("ClusterCertThumbprints", STR, "", Dynamic),
            ("ServerCertThumbprints", STR, "", Dynamic),
            ("ClientCertThumbprints", STR, "", Dynamic),
            ("AdminClientCertThumbprints", STR, "", Dynamic),
            ("ClientClaimAuthEnabled", Bool, "false", Static),
            ("ClientClaims", STR, "", Dynamic),
            ("AdminClientClaims", STR, "", Dynamic),
            ("ClusterIdentities", STR, "", Dynamic),
        ],
    );

    for section in RUN_AS_SECTIONS {
        add_all(
            catalog,
            section,
            &[
                ("RunAsAccountType", STR, "", Static),
                ("RunAsAccountName", STR, "", Static),
                ("RunAsPassword", STR, "", Static),
            ],
        );
    }
}

fn register_file_store(catalog: &mut SettingsCatalog) {
    catalog.add(ConfigEntry::new("FileStoreService", "AnonymousAccessEnabled", Bool, "true", Static));
    for prefix in ["Primary", "Secondary"] {
        let rows = [
            ("AccountType", ""),
            ("AccountUserName", ""),
            ("AccountUserPassword", ""),
            ("AccountNTLMPasswordSecret", ""),
            ("AccountNTLMX509StoreLocation", "LocalMachine"),
            ("AccountNTLMX509StoreName", "MY"),
            ("AccountNTLMX509Thumbprint", ""),
        ];
        for (suffix, default) in rows {
            let name = format!("{}{}", prefix, suffix);
            catalog.add(ConfigEntry::new("FileStoreService", &name, STR, default, Static));
        }
    }
}

fn register_shared_log(catalog: &mut SettingsCatalog, section: &str) {
    add_all(
        catalog,
        section,
        &[("SharedLogId", Guid, "", Static), ("SharedLogPath", Path, "", Static)],
    );
}

fn register_ktl_logger(catalog: &mut SettingsCatalog) {
    add_all(
        catalog,
        KTL_LOGGER_SECTION,
        &[
            ("PeriodicFlushTime", TimeSpan, "FromSeconds(60)", Static),
            ("PeriodicTimerInterval", TimeSpan, "FromSeconds(5)", Static),
            ("WriteBufferMemoryPoolMinimumInKB", Int, "0", Static),
            ("WriteBufferMemoryPoolMaximumInKB", Int, "0", Static),
            ("WriteBufferMemoryPoolPerStreamInKB", Int, "0", Static),
            ("SharedLogSizeInMB", Int, "8192", Static),
            ("SharedLogNumberStreams", Int, "3072", Static),
            ("SharedLogCreateFlags", Int, "0", Static),
            ("MaximumDestagingWriteOutstandingInKB", Int, "0", Static),
            ("SharedLogThrottleLimitInPercentUsed", Int, "0", Static),
            ("PinnedMemoryLimitInKB", Int, "0", Static),
        ],
    );
    register_shared_log(catalog, KTL_LOGGER_SECTION);

    add_all(
        catalog,
        "TStore",
        &[("SweepThreshold", Int, "0", Static), ("EnableStrict2PL", Bool, "false", Static)],
    );
}

fn register_replicator(catalog: &mut SettingsCatalog, section: &str, with_replication_queue: bool) {
    add_all(
        catalog,
        section,
        &[
            ("RetryInterval", TimeSpan, "FromSeconds(5)", Static),
            ("BatchAcknowledgementInterval", TimeSpan, "FromMilliseconds(15)", Static),
            ("MaxReplicationMessageSize", Int, "52428800", Static),
            ("InitialPrimaryReplicationQueueSize", Int, "64", Static),
            ("MaxPrimaryReplicationQueueSize", Int, "1024", Static),
            ("MaxPrimaryReplicationQueueMemorySize", Int, "0", Static),
            ("InitialSecondaryReplicationQueueSize", Int, "64", Static),
            ("MaxSecondaryReplicationQueueSize", Int, "2048", Static),
            ("MaxSecondaryReplicationQueueMemorySize", Int, "0", Static),
            ("InitialCopyQueueSize", Int, "64", Static),
            ("MaxCopyQueueSize", Int, "1024", Static),
            ("RequireServiceAck", Bool, "false", Static),
            ("SecondaryClearAcknowledgedOperations", Bool, "false", Static),
        ],
    );
    if with_replication_queue {
        add_all(
            catalog,
            section,
            &[
                ("InitialReplicationQueueSize", Int, "64", Static),
                ("MaxReplicationQueueSize", Int, "1024", Static),
                ("MaxReplicationQueueMemorySize", Int, "0", Static),
            ],
        );
    }
}

fn register_global_replication(catalog: &mut SettingsCatalog, section: &str) {
    add_all(
        catalog,
        section,
        &[
            ("QueueHealthWarningAtUsagePercent", Int, "80", Static),
            ("SlowIdleRestartAtQueueUsagePercent", Int, "85", Static),
            ("SlowActiveSecondaryRestartAtQueueUsagePercent", Int, "90", Static),
            ("SecondaryProgressRateDecayFactor", Double, "0.5", Static),
            ("QueueHealthMonitoringInterval", TimeSpan, "FromSeconds(30)", Static),
        ],
    );
}

fn register_transactional_replicator(catalog: &mut SettingsCatalog, section: &str) {
    add_all(
        catalog,
        section,
        &[
            ("CheckpointThresholdInMB", Int, "50", Static),
            ("MaxAccumulatedBackupLogSizeInMB", Int, "800", Static),
            ("MinLogSizeInMB", Int, "0", Static),
            ("TruncationThresholdFactor", Int, "2", Static),
            ("ThrottlingThresholdFactor", Int, "4", Static),
            ("MaxStreamSizeInMB", Int, "1024", Static),
            ("MaxMetadataSizeInKB", Int, "4", Static),
            ("MaxRecordSizeInKB", Int, "1024", Static),
            ("MaxWriteQueueDepthInKB", Int, "0", Static),
            ("OptimizeLogForLowerDiskUsage", Bool, "true", Static),
            ("EnableIncrementalBackupsAcrossReplicas", Bool, "false", Static),
            ("SlowApiMonitoringDuration", TimeSpan, "FromSeconds(300)", Static),
            ("Test_LoggingEngine", STR, "ktl", Static),
            ("Test_LogMinDelayIntervalMilliseconds", Int, "0", Static),
            ("Test_LogMaxDelayIntervalMilliseconds", Int, "0", Static),
            ("Test_LogDelayRatio", Double, "0", Static),
            ("Test_LogDelayProcessExitRatio", Double, "0", Static),
        ],
    );
}

fn register_plb(catalog: &mut SettingsCatalog) {
    add_all(
        catalog,
        PLB_SECTION,
        &[
            ("SwapPrimaryProbability", Double, "0.3", Dynamic),
            ("LoadDecayFactor", Double, "0.5", Static),
            ("LoadDecayInterval", TimeSpan, "FromSeconds(60)", Static),
            ("AffinityConstraintPriority", Int, "0", Dynamic),
            ("ApplicationCapacityConstraintPriority", Int, "0", Dynamic),
            ("CapacityConstraintPriority", Int, "0", Dynamic),
            ("FaultDomainConstraintPriority", Int, "0", Dynamic),
            ("PlacementConstraintPriority", Int, "0", Dynamic),
            ("PreferredLocationConstraintPriority", Int, "2", Dynamic),
            ("ScaleoutCountConstraintPriority", Int, "0", Dynamic),
            ("UpgradeDomainConstraintPriority", Int, "1", Dynamic),
            ("ThrottlingConstraintPriority", Int, "0", Dynamic),
            ("LocalBalancingThreshold", Double, "0", Dynamic),
            ("ScoreImprovementThreshold", Double, "0", Dynamic),
            ("AvgStdDevDeltaThrottleThreshold", Double, "-1", Dynamic),
            ("MaxPercentageToMove", Double, "0", Dynamic),
            ("MaxPercentageToMoveForPlacement", Double, "0", Dynamic),
            ("GlobalMovementThrottleThresholdPercentage", Double, "0", Dynamic),
            ("GlobalMovementThrottleThresholdPercentageForPlacement", Double, "0", Dynamic),
            ("GlobalMovementThrottleThresholdPercentageForBalancing", Double, "0", Dynamic),
            ("MovementThrottledPartitionsPercentageThreshold", Double, "0", Dynamic),
            ("LocalDomainWeight", Double, "0.5", Dynamic),
            ("CpuPercentageNodeCapacity", Double, "0.8", Dynamic),
            ("MemoryPercentageNodeCapacity", Double, "0.8", Dynamic),
            ("PLBRefreshInterval", TimeSpan, "FromSeconds(1)", Dynamic),
            ("MinPlacementInterval", TimeSpan, "FromSeconds(1)", Dynamic),
            ("MinConstraintCheckInterval", TimeSpan, "FromSeconds(1)", Dynamic),
            ("MinLoadBalancingInterval", TimeSpan, "FromSeconds(5)", Dynamic),
            ("PLBRefreshGap", TimeSpan, "FromSeconds(1)", Dynamic),
            ("GlobalMovementThrottleCountingInterval", TimeSpan, "FromSeconds(600)", Static),
            ("MovementPerPartitionThrottleCountingInterval", TimeSpan, "FromSeconds(600)", Static),
            ("InitialRandomSeed", Int, "-1", Static),
            ("AutoDetectAvailableResources", Bool, "true", Static),
            ("MaxViolatedItemsToTrace", Int, "500", Dynamic),
            ("PlacementConstraintValidationCacheSize", Int, "10000", Dynamic),
        ],
    );

    let group_kinds = [Double, Int, Double, Double, Bool, Int, Double, Int, Int];
    for (section, kind) in PLB_METRIC_SECTIONS.iter().zip(group_kinds) {
        catalog.add_group(section, kind, Dynamic);
    }
}
