//! KtlLogger write buffers and the dedicated shared log.

use uuid::Uuid;

use crate::error::ValidationError;
use crate::rules::RuleContext;
use crate::value::is_rooted_path;

/// Id of the node-wide default shared log; a dedicated log must use another.
pub const DEFAULT_SHARED_LOG_ID: Uuid = Uuid::from_u128(0x3CA2CCDA_DD0F_49C8_A741_62AAC0D4EB62);

pub fn check_write_buffer_pool(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let min = ctx.int("WriteBufferMemoryPoolMinimumInKB")?;
    let max = ctx.int("WriteBufferMemoryPoolMaximumInKB")?;
    if min > 0 && max > 0 && min > max {
        return Err(ctx.cross_error(
            "WriteBufferMemoryPoolMaximumInKB",
            format!(
                "WriteBufferMemoryPoolMaximumInKB ({}) must not be less than WriteBufferMemoryPoolMinimumInKB ({})",
                max, min
            ),
        ));
    }
    Ok(())
}

/// `SharedLogId` and `SharedLogPath` come as a pair.
pub fn check_shared_log(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let id = ctx.value("SharedLogId").unwrap_or_default();
    let path = ctx.value("SharedLogPath").unwrap_or_default();
    let (id, path) = (id.trim(), path.trim());

    match (id.is_empty(), path.is_empty()) {
        (true, true) => return Ok(()),
        (false, true) => {
            return Err(ctx.cross_error("SharedLogPath", "SharedLogPath must be set when SharedLogId is set"))
        }
        (true, false) => {
            return Err(ctx.cross_error("SharedLogId", "SharedLogId must be set when SharedLogPath is set"))
        }
        (false, false) => {}
    }

    let guid = Uuid::parse_str(id.trim_start_matches('{').trim_end_matches('}'))
        .map_err(|_| ctx.range_error("SharedLogId", format!("SharedLogId '{}' is not a GUID", id)))?;
    if guid == DEFAULT_SHARED_LOG_ID {
        return Err(ctx.range_error(
            "SharedLogId",
            format!("SharedLogId '{}' is reserved for the default shared log", id),
        ));
    }
    if !is_rooted_path(path) {
        return Err(ctx.range_error(
            "SharedLogPath",
            format!("SharedLogPath '{}' must be an absolute path", path),
        ));
    }
    Ok(())
}
