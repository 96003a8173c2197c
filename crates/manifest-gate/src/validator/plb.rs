use crate::error::ValidationError;
use crate::rules::RuleContext;

const LEGACY_TIMER: &str = "PLBRefreshInterval";
const SPLIT_TIMERS: [&str; 2] = ["MinPlacementInterval", "MinConstraintCheckInterval"];

/// The legacy refresh timer and the split placement/constraint-check timers
/// are alternatives; a manifest sets one group or the other.
pub fn check_timer_groups(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    if !ctx.is_explicit(LEGACY_TIMER) {
        return Ok(());
    }
    if let Some(timer) = SPLIT_TIMERS.iter().find(|t| ctx.is_explicit(t)) {
        return Err(ctx.cross_error(
            LEGACY_TIMER,
            format!("{} cannot be combined with {}", LEGACY_TIMER, timer),
        ));
    }
    Ok(())
}
