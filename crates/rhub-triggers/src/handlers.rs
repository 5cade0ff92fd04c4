//! Trigger handlers.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use rhub_firestore::Fields;
use rhub_identity::IdentityUser;
use rhub_models::{AnalyticsEvent, MailMessage};

use crate::error::TriggerResult;
use crate::executor::TriggerContext;
use crate::logging::TriggerLogger;
use crate::metrics;

fn greeting_name(user: &IdentityUser) -> String {
    user.display_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "there".to_string())
}

fn bool_field(fields: &Fields, key: &str) -> bool {
    fields.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn i64_field(fields: &Fields, key: &str) -> Option<i64> {
    fields.get(key).and_then(|v| v.as_i64())
}

/// Queue the welcome mail for a new account.
pub async fn send_welcome_email(ctx: &TriggerContext, user: &IdentityUser) -> TriggerResult<()> {
    let logger = TriggerLogger::new("send_welcome_email", &user.uid);
    let Some(email) = user.email.as_deref() else {
        logger.log_skip("account has no email");
        return Ok(());
    };

    let mail = MailMessage::template(email, "welcome").with_data("name", greeting_name(user));
    ctx.mail.enqueue(&mail).await?;
    ctx.analytics
        .record(&AnalyticsEvent::new("welcome_email_sent", &user.uid))
        .await?;

    logger.log_completion("welcome mail queued");
    Ok(())
}

async fn record_mfa_enabled(ctx: &TriggerContext, after: &IdentityUser) -> TriggerResult<()> {
    let method = after
        .enrolled_factors
        .first()
        .map(|f| f.factor_id.clone())
        .unwrap_or_default();
    ctx.analytics
        .record(
            &AnalyticsEvent::new("mfa_enabled", &after.uid)
                .with_data("method", method)
                .with_data("success", true),
        )
        .await?;

    if let Some(email) = after.email.as_deref() {
        let mail = MailMessage::template(email, "mfa_enabled").with_data("name", greeting_name(after));
        ctx.mail.enqueue(&mail).await?;
    }
    Ok(())
}

/// Record the first second-factor enrollment of an account.
///
/// A failure is itself recorded as an unsuccessful `mfa_enabled` event
/// before being returned.
pub async fn track_mfa_enrollment(
    ctx: &TriggerContext,
    before: &IdentityUser,
    after: &IdentityUser,
) -> TriggerResult<()> {
    let logger = TriggerLogger::new("track_mfa_enrollment", &after.uid);
    if !after.has_mfa() || before.has_mfa() {
        return Ok(());
    }

    logger.log_start("first factor enrolled");
    if let Err(e) = record_mfa_enabled(ctx, after).await {
        let failure = AnalyticsEvent::new("mfa_enabled", &after.uid)
            .with_data("success", false)
            .with_data("error", e.to_string());
        if let Err(record_err) = ctx.analytics.record(&failure).await {
            logger.log_warning(&format!("failed to record failure: {}", record_err));
        }
        return Err(e);
    }

    logger.log_completion("mfa enrollment recorded");
    Ok(())
}

/// React to a write of `registrationProgress/{uid}`.
///
/// Fires once, on the write that flips `completed` to true. Returns the
/// handle of the scheduled cleanup when it fires.
pub async fn on_registration_complete(
    ctx: &Arc<TriggerContext>,
    uid: &str,
    before: Option<&Fields>,
    after: Option<&Fields>,
) -> TriggerResult<Option<JoinHandle<()>>> {
    let Some(after) = after else {
        return Ok(None);
    };
    let was_completed = before.is_some_and(|b| bool_field(b, "completed"));
    if !bool_field(after, "completed") || was_completed {
        return Ok(None);
    }

    let logger = TriggerLogger::new("on_registration_complete", uid);
    logger.log_start("registration completed");

    let mfa_enabled = bool_field(after, "enableMfa");
    let finished_at = i64_field(after, "timestamp").unwrap_or_default();
    let previous = before
        .and_then(|b| i64_field(b, "timestamp"))
        .filter(|t| *t != 0)
        .unwrap_or(finished_at);

    ctx.analytics
        .record(
            &AnalyticsEvent::new("registration_completed", uid)
                .with_data("steps", after.get("lastStep").cloned().unwrap_or_default())
                .with_data("mfaEnabled", mfa_enabled)
                .with_data("timeToComplete", finished_at - previous),
        )
        .await?;

    match ctx.identity.get_user(uid).await? {
        Some(user) => {
            if let Some(email) = user.email.as_deref() {
                let mail = MailMessage::template(email, "registration_complete")
                    .with_data("name", greeting_name(&user))
                    .with_data("mfaEnabled", mfa_enabled);
                ctx.mail.enqueue(&mail).await?;
            }
        }
        None => logger.log_warning("identity account not found, no completion mail"),
    }

    let handle = schedule_cleanup(Arc::clone(ctx), uid.to_string());
    logger.log_completion("analytics recorded, cleanup scheduled");
    Ok(Some(handle))
}

/// Delete the progress document once the configured delay has passed.
pub fn schedule_cleanup(ctx: Arc<TriggerContext>, uid: String) -> JoinHandle<()> {
    let logger = TriggerLogger::new("registration_cleanup", &uid);
    let span = logger.create_span();
    tokio::spawn(
        async move {
            tokio::time::sleep(ctx.config.cleanup_delay).await;
            match ctx.progress.delete(&uid).await {
                Ok(()) => {
                    metrics::record_cleanup();
                    logger.log_completion("registration progress removed");
                }
                Err(e) => logger.log_error(&format!("cleanup failed: {}", e)),
            }
        }
        .instrument(span),
    )
}
