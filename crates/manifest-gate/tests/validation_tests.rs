//! Table-driven tests for manifest validation.

mod common;

use common::{infrastructure, ManifestBuilder};
use manifest_gate::{ConfigurationValidator, ErrorKind};

/// A single validation test case: parameters added to the minimal manifest.
struct ValidationTestCase {
    name: &'static str,
    params: &'static [(&'static str, &'static str, &'static str)],
    should_succeed: bool,
    /// Expected error kind and offending parameter (if should_succeed is false).
    expected_error: Option<(ErrorKind, &'static str)>,
}

const fn ok(name: &'static str, params: &'static [(&'static str, &'static str, &'static str)]) -> ValidationTestCase {
    ValidationTestCase {
        name,
        params,
        should_succeed: true,
        expected_error: None,
    }
}

const fn fails(
    name: &'static str,
    params: &'static [(&'static str, &'static str, &'static str)],
    kind: ErrorKind,
    parameter: &'static str,
) -> ValidationTestCase {
    ValidationTestCase {
        name,
        params,
        should_succeed: false,
        expected_error: Some((kind, parameter)),
    }
}

const RANGE_TESTS: &[ValidationTestCase] = &[
    ok("flush_time_lower_bound", &[("KtlLogger", "PeriodicFlushTime", "15")]),
    ok("flush_time_upper_bound", &[("KtlLogger", "PeriodicFlushTime", "300")]),
    fails(
        "flush_time_below_range",
        &[("KtlLogger", "PeriodicFlushTime", "10")],
        ErrorKind::RangeOrFormat,
        "PeriodicFlushTime",
    ),
    fails(
        "flush_time_above_range",
        &[("KtlLogger", "PeriodicFlushTime", "310")],
        ErrorKind::RangeOrFormat,
        "PeriodicFlushTime",
    ),
    ok("write_pool_zero", &[("KtlLogger", "WriteBufferMemoryPoolMinimumInKB", "0")]),
    ok("write_pool_minimum", &[("KtlLogger", "WriteBufferMemoryPoolMinimumInKB", "16384")]),
    fails(
        "write_pool_too_small",
        &[("KtlLogger", "WriteBufferMemoryPoolMinimumInKB", "1000")],
        ErrorKind::RangeOrFormat,
        "WriteBufferMemoryPoolMinimumInKB",
    ),
    ok("sweep_disabled", &[("TStore", "SweepThreshold", "-1")]),
    ok("sweep_zero", &[("TStore", "SweepThreshold", "0")]),
    ok("sweep_maximum", &[("TStore", "SweepThreshold", "5000000")]),
    fails(
        "sweep_negative",
        &[("TStore", "SweepThreshold", "-2")],
        ErrorKind::RangeOrFormat,
        "SweepThreshold",
    ),
    fails(
        "sweep_too_large",
        &[("TStore", "SweepThreshold", "5000001")],
        ErrorKind::RangeOrFormat,
        "SweepThreshold",
    ),
    ok("swap_probability_half", &[("PlacementAndLoadBalancing", "SwapPrimaryProbability", "0.5")]),
    ok("swap_probability_one", &[("PlacementAndLoadBalancing", "SwapPrimaryProbability", "1")]),
    fails(
        "swap_probability_above_one",
        &[("PlacementAndLoadBalancing", "SwapPrimaryProbability", "2")],
        ErrorKind::RangeOrFormat,
        "SwapPrimaryProbability",
    ),
    fails(
        "swap_probability_negative",
        &[("PlacementAndLoadBalancing", "SwapPrimaryProbability", "-1")],
        ErrorKind::RangeOrFormat,
        "SwapPrimaryProbability",
    ),
    fails(
        "not_a_number",
        &[("ClusterHealthPolicy", "MaxPercentUnhealthyNodes", "ten")],
        ErrorKind::RangeOrFormat,
        "MaxPercentUnhealthyNodes",
    ),
];

const CROSS_PARAMETER_TESTS: &[ValidationTestCase] = &[
    fails(
        "write_pool_min_above_max",
        &[
            ("KtlLogger", "WriteBufferMemoryPoolMinimumInKB", "32768"),
            ("KtlLogger", "WriteBufferMemoryPoolMaximumInKB", "16384"),
        ],
        ErrorKind::CrossParameter,
        "WriteBufferMemoryPoolMaximumInKB",
    ),
    ok(
        "shared_log_pair",
        &[
            ("KtlLogger", "SharedLogId", "{8f8b2a2e-1c6e-4d5c-9a77-0d7e0c7c2f11}"),
            ("KtlLogger", "SharedLogPath", "/var/lib/fabric/shared.log"),
        ],
    ),
    fails(
        "shared_log_id_without_path",
        &[("KtlLogger", "SharedLogId", "8f8b2a2e-1c6e-4d5c-9a77-0d7e0c7c2f11")],
        ErrorKind::CrossParameter,
        "SharedLogPath",
    ),
    fails(
        "shared_log_path_without_id",
        &[("TransactionalReplicator", "SharedLogPath", "/var/lib/fabric/shared.log")],
        ErrorKind::CrossParameter,
        "SharedLogId",
    ),
    fails(
        "shared_log_reserved_id",
        &[
            ("KtlLogger", "SharedLogId", "3CA2CCDA-DD0F-49C8-A741-62AAC0D4EB62"),
            ("KtlLogger", "SharedLogPath", "/var/lib/fabric/shared.log"),
        ],
        ErrorKind::RangeOrFormat,
        "SharedLogId",
    ),
    ok(
        "queue_pair",
        &[
            ("Replication", "InitialReplicationQueueSize", "128"),
            ("Replication", "MaxReplicationQueueSize", "4096"),
        ],
    ),
    fails(
        "queue_initial_without_max",
        &[("Replication", "InitialReplicationQueueSize", "128")],
        ErrorKind::CrossParameter,
        "MaxReplicationQueueSize",
    ),
    fails(
        "queue_not_power_of_two",
        &[
            ("Replication", "InitialReplicationQueueSize", "100"),
            ("Replication", "MaxReplicationQueueSize", "4096"),
        ],
        ErrorKind::RangeOrFormat,
        "InitialReplicationQueueSize",
    ),
    ok(
        "queue_smallest_initial",
        &[
            ("Replication", "InitialReplicationQueueSize", "2"),
            ("Replication", "MaxReplicationQueueSize", "1024"),
            ("Replication", "InitialPrimaryReplicationQueueSize", "2"),
            ("Replication", "MaxPrimaryReplicationQueueSize", "1024"),
            ("Replication", "InitialSecondaryReplicationQueueSize", "2"),
            ("Replication", "MaxSecondaryReplicationQueueSize", "1024"),
            ("Replication", "InitialCopyQueueSize", "2"),
            ("Replication", "MaxCopyQueueSize", "1024"),
        ],
    ),
    fails(
        "queue_initial_one",
        &[
            ("Replication", "InitialReplicationQueueSize", "1"),
            ("Replication", "MaxReplicationQueueSize", "1024"),
        ],
        ErrorKind::RangeOrFormat,
        "InitialReplicationQueueSize",
    ),
    fails(
        "primary_queue_initial_one",
        &[
            ("Replication", "InitialPrimaryReplicationQueueSize", "1"),
            ("Replication", "MaxPrimaryReplicationQueueSize", "1024"),
        ],
        ErrorKind::RangeOrFormat,
        "InitialPrimaryReplicationQueueSize",
    ),
    fails(
        "secondary_queue_initial_one",
        &[
            ("Replication", "InitialSecondaryReplicationQueueSize", "1"),
            ("Replication", "MaxSecondaryReplicationQueueSize", "1024"),
        ],
        ErrorKind::RangeOrFormat,
        "InitialSecondaryReplicationQueueSize",
    ),
    fails(
        "copy_queue_initial_one",
        &[
            ("Replication", "InitialCopyQueueSize", "1"),
            ("Replication", "MaxCopyQueueSize", "1024"),
        ],
        ErrorKind::RangeOrFormat,
        "InitialCopyQueueSize",
    ),
    fails(
        "queue_initial_above_max",
        &[
            ("Replication", "InitialReplicationQueueSize", "2048"),
            ("Replication", "MaxReplicationQueueSize", "1024"),
        ],
        ErrorKind::CrossParameter,
        "InitialReplicationQueueSize",
    ),
];

fn run_cases(cases: &[ValidationTestCase]) {
    let validator = ConfigurationValidator::default();
    for case in cases {
        let mut builder = ManifestBuilder::new();
        for (section, name, value) in case.params {
            builder = builder.param(section, name, value);
        }
        let result = validator.validate(&builder.build(), None);

        if case.should_succeed {
            assert!(result.is_ok(), "{}: expected success, got {:?}", case.name, result);
            continue;
        }
        let err = match result {
            Ok(()) => panic!("{}: expected failure", case.name),
            Err(err) => err,
        };
        if let Some((kind, parameter)) = case.expected_error {
            assert_eq!(err.kind(), kind, "{}: {}", case.name, err);
            assert_eq!(err.parameter(), parameter, "{}: {}", case.name, err);
        }
    }
}

#[test]
fn test_range_rules() {
    run_cases(RANGE_TESTS);
}

#[test]
fn test_cross_parameter_rules() {
    run_cases(CROSS_PARAMETER_TESTS);
}

#[test]
fn test_minimal_manifest_with_infrastructure() {
    let manifest = ManifestBuilder::new().build();
    let nodes = infrastructure(3);
    assert!(ConfigurationValidator::default()
        .validate(&manifest, Some(&nodes))
        .is_ok());
}

#[test]
fn test_missing_required_parameter() {
    let manifest = ManifestBuilder::new()
        .without("Security", "ServerAuthCredentialType")
        .build();
    let err = ConfigurationValidator::default()
        .validate(&manifest, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.to_string().contains("is required"));
}

#[test]
fn test_expected_cluster_size_against_infrastructure() {
    let nodes = infrastructure(3);
    let validator = ConfigurationValidator::default();

    let fits = ManifestBuilder::new()
        .param("FailoverManager", "ExpectedClusterSize", "3")
        .build();
    assert!(validator.validate(&fits, Some(&nodes)).is_ok());

    let too_large = ManifestBuilder::new()
        .param("FailoverManager", "ExpectedClusterSize", "5")
        .build();
    let err = validator.validate(&too_large, Some(&nodes)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CrossParameter);
    assert_eq!(err.parameter(), "ExpectedClusterSize");
}

#[test]
fn test_first_violation_is_reported_every_time() {
    let manifest = ManifestBuilder::new()
        .param("KtlLogger", "PeriodicFlushTime", "10")
        .param("TStore", "SweepThreshold", "-2")
        .param("PlacementAndLoadBalancing", "SwapPrimaryProbability", "2")
        .build();
    let validator = ConfigurationValidator::default();

    let first = validator.validate(&manifest, None).unwrap_err();
    for _ in 0..5 {
        assert_eq!(validator.validate(&manifest, None).unwrap_err(), first);
    }
    assert_eq!(first.parameter(), "PeriodicFlushTime");
}

#[test]
fn test_error_message_names_section_and_parameter() {
    let manifest = ManifestBuilder::new()
        .param("TStore", "SweepThreshold", "-2")
        .build();
    let message = ConfigurationValidator::default()
        .validate(&manifest, None)
        .unwrap_err()
        .to_string();
    assert!(message.contains("TStore"));
    assert!(message.contains("SweepThreshold"));
}
