//! Section names that share a parameter layout.
//!
//! Replicator settings appear under one section per system service. Rules and
//! catalog rows for them are registered once per name in these lists.

/// Sections holding V1 replicator settings.
pub const REPLICATION_SECTIONS: &[&str] = &[
    "Replication",
    "ClusterManager/Replication",
    "FileStoreService/Replication",
    "Naming/Replication",
    "Failover/Replication",
    "RepairManager/Replication",
    "UpgradeService/Replication",
    "FaultAnalysisService/Replication",
];

/// The section whose queue-usage percentages apply cluster-wide.
pub const GLOBAL_REPLICATION_SECTION: &str = "Replication";

/// Sections holding native transactional replicator settings.
pub const NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS: &[&str] = &[
    "TransactionalReplicator2",
    "ClusterManager/TransactionalReplicator2",
    "FileStoreService/TransactionalReplicator2",
    "Naming/TransactionalReplicator2",
    "Failover/TransactionalReplicator2",
    "RepairManager/TransactionalReplicator2",
    "UpgradeService/TransactionalReplicator2",
    "FaultAnalysisService/TransactionalReplicator2",
];

/// The managed transactional replicator section. It carries the replicator
/// queue settings too, except the V1 replication queue.
pub const MANAGED_TRANSACTIONAL_REPLICATOR_SECTION: &str = "TransactionalReplicator";

pub const KTL_LOGGER_SECTION: &str = "KtlLogger";

/// Sections that carry their own copy of the shared log settings.
pub const SHARED_LOG_SECTIONS: &[&str] = &[KTL_LOGGER_SECTION, MANAGED_TRANSACTIONAL_REPLICATOR_SECTION];

pub const PLB_SECTION: &str = "PlacementAndLoadBalancing";

/// Per-instance PLB sections: every key is a metric name.
pub const PLB_METRIC_SECTIONS: &[&str] = &[
    "MetricBalancingThresholds",
    "MetricActivityThresholds",
    "GlobalMetricWeights",
    "NodeBufferPercentage",
    "DefragmentationMetrics",
    "DefragmentationEmptyNodeDistributionPolicy",
    "DefragmentationMetricsPercentOrNumberOfEmptyNodesTriggeringThreshold",
    "PlacementStrategy",
    "MaximumInBuildReplicasPerNode",
];

/// System services whose placement can be restricted with a constraint expression.
pub const SYSTEM_SERVICE_SECTIONS: &[&str] = &[
    "ClusterManager",
    "Naming",
    "FailoverManager",
    "FileStoreService",
    "ImageStoreService",
    "RepairManager",
    "UpgradeService",
    "FaultAnalysisService",
    "DnsService",
];

pub const RUN_AS_SECTIONS: &[&str] = &["RunAs", "RunAs_Fabric", "RunAs_DCA", "RunAs_HttpGateway"];

pub const CLUSTER_HEALTH_POLICY_SECTION: &str = "HealthManager/ClusterHealthPolicy";

/// Pseudo-sections used for entries derived from node types.
pub const NODE_PROPERTIES_SECTION: &str = "NodeProperties";
pub const NODE_CAPACITIES_SECTION: &str = "NodeCapacities";
pub const NODE_SFSS_POLICIES_SECTION: &str = "NodeSfssRgPolicies";
pub const FABRIC_NODE_SECTION: &str = "FabricNode";
