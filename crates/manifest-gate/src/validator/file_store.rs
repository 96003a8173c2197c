//! FileStoreService access accounts.

use crate::error::ValidationError;
use crate::rules::RuleContext;

/// Validates the primary account and, when configured, the secondary one.
/// Nothing is checked until a primary account type is set.
pub fn check_accounts(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    if !ctx.is_set("PrimaryAccountType") {
        return Ok(());
    }
    check_account(ctx, "Primary")?;
    if ctx.is_set("SecondaryAccountType") {
        check_account(ctx, "Secondary")?;
    }
    Ok(())
}

fn check_account(ctx: &RuleContext<'_>, role: &str) -> Result<(), ValidationError> {
    let account_type = ctx.explicit(&format!("{}AccountType", role)).unwrap_or_default().trim();
    let user_name = format!("{}AccountUserName", role);
    let password = format!("{}AccountUserPassword", role);
    let ntlm_secret = format!("{}AccountNTLMPasswordSecret", role);

    if account_type.eq_ignore_ascii_case("LocalUser") {
        if !ctx.is_set(&ntlm_secret) {
            return Err(ctx.cross_error(
                &ntlm_secret,
                format!("{} is required for a LocalUser account", ntlm_secret),
            ));
        }
        if ctx.is_set(&password) {
            return Err(ctx.cross_error(
                &password,
                format!("{} is not allowed for a LocalUser account", password),
            ));
        }
    } else if account_type.eq_ignore_ascii_case("DomainUser") {
        if !ctx.is_set(&user_name) {
            return Err(ctx.cross_error(
                &user_name,
                format!("{} is required for a DomainUser account", user_name),
            ));
        }
        match (ctx.is_set(&password), ctx.is_set(&ntlm_secret)) {
            (true, true) => {
                return Err(ctx.cross_error(
                    &ntlm_secret,
                    format!("{} and {} cannot both be set", password, ntlm_secret),
                ))
            }
            (false, false) => {
                return Err(ctx.cross_error(
                    &password,
                    format!("A DomainUser account needs either {} or {}", password, ntlm_secret),
                ))
            }
            _ => {}
        }
    }
    Ok(())
}
