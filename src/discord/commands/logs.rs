// Log retrieval for moderators.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::time::SystemTime;

/// Upload the most recent log file
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES"
)]
pub async fn getlogs(ctx: Context<'_>) -> Result<(), Error> {
    let dir = ctx.data().config.log_dir.clone();

    let Some(path) = newest_log_file(&dir) else {
        ctx.say("No log files found.").await?;
        return Ok(());
    };

    let attachment = serenity::CreateAttachment::path(&path).await?;
    ctx.send(poise::CreateReply::default().attachment(attachment))
        .await?;
    Ok(())
}

fn newest_log_file(dir: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().map(|(t, _)| modified > *t).unwrap_or(true) {
            newest = Some((modified, path));
        }
    }
    newest.map(|(_, path)| path)
}
