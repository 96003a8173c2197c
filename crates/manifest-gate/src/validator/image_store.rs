use crate::error::ValidationError;
use crate::rules::RuleContext;
use crate::upgrade::connection_string::{ImageStoreConnection, DEFAULT_STORE};

const PARAMETER: &str = "ImageStoreConnectionString";

/// Connection string kind against the deployment: `_default_` only on a
/// single machine, file shares reachable from every node, and the fabric
/// store only with run-as policies enabled.
pub fn check_connection_string(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let Some(raw) = ctx.explicit(PARAMETER) else {
        return Ok(());
    };
    let single_machine = ctx.config().is_single_machine();

    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DEFAULT_STORE) {
        if ctx.is_encrypted(PARAMETER) {
            return Err(ctx.range_error(PARAMETER, format!("{} cannot be encrypted", DEFAULT_STORE)));
        }
        if !single_machine {
            return Err(ctx.range_error(
                PARAMETER,
                "An explicit image store is required for multi-machine deployments",
            ));
        }
        return Ok(());
    }

    let Some(plaintext) = ctx.plaintext(PARAMETER) else {
        log::debug!("{} is encrypted with an unknown key; skipping its checks", PARAMETER);
        return Ok(());
    };
    let connection = ImageStoreConnection::parse(&plaintext).map_err(|e| ctx.range_error(PARAMETER, e))?;

    match &connection {
        ImageStoreConnection::Default if !single_machine => {
            return Err(ctx.range_error(
                PARAMETER,
                "An explicit image store is required for multi-machine deployments",
            ));
        }
        ImageStoreConnection::File { path, .. } if !single_machine && path.contains(':') => {
            return Err(ctx.range_error(
                PARAMETER,
                format!("File store path '{}' must be a network share on multi-machine deployments", path),
            ));
        }
        ImageStoreConnection::Fabric { .. } => {
            if !ctx.for_section("Hosting").flag("RunAsPolicyEnabled") {
                return Err(ctx.cross_error(
                    PARAMETER,
                    "The fabric: image store requires Hosting/RunAsPolicyEnabled to be true",
                ));
            }
            check_service_affinity(ctx)?;
        }
        _ => {}
    }
    Ok(())
}

/// With cluster manager affinity the image store cannot have more replicas
/// than the cluster manager it is colocated with.
fn check_service_affinity(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let image_store = ctx.for_section("ImageStoreService");
    if !image_store.flag("EnableClusterManagerAffinity") {
        return Ok(());
    }
    let image_store_size = image_store.int("TargetReplicaSetSize")?;
    let cluster_manager_size = ctx.for_section("ClusterManager").int("TargetReplicaSetSize")?;
    if image_store_size > cluster_manager_size {
        return Err(image_store.cross_error(
            "TargetReplicaSetSize",
            format!(
                "TargetReplicaSetSize ({}) cannot exceed ClusterManager/TargetReplicaSetSize ({}) with EnableClusterManagerAffinity",
                image_store_size, cluster_manager_size
            ),
        ));
    }
    Ok(())
}
