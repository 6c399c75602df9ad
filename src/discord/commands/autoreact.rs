// Autoreact management commands.

use crate::core::autoreact::{AutoReactError, ReactEmoji, ReactRule};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use regex::Regex;
use std::sync::OnceLock;

/// `<:name:id>` / `<a:name:id>` for custom emojis; anything else is taken
/// as a unicode emoji verbatim.
fn parse_emoji(input: &str) -> ReactEmoji {
    static CUSTOM_EMOJI: OnceLock<Regex> = OnceLock::new();
    let re = CUSTOM_EMOJI.get_or_init(|| Regex::new(r"^<a?:\w+:(\d+)>$").expect("valid pattern"));

    if let Some(captures) = re.captures(input.trim()) {
        if let Ok(id) = captures[1].parse() {
            return ReactEmoji::Custom(id);
        }
    }
    ReactEmoji::Unicode(input.trim().to_string())
}

pub fn to_reaction_type(emoji: &ReactEmoji) -> serenity::ReactionType {
    match emoji {
        ReactEmoji::Unicode(s) => serenity::ReactionType::Unicode(s.clone()),
        ReactEmoji::Custom(id) => serenity::ReactionType::Custom {
            animated: false,
            id: serenity::EmojiId::new(*id),
            name: None,
        },
    }
}

fn describe(id: &str, rule: &ReactRule) -> String {
    let emoji = match &rule.emoji {
        ReactEmoji::Unicode(s) => s.clone(),
        ReactEmoji::Custom(custom_id) => format!("custom emoji `{custom_id}`"),
    };
    format!("`{id}`: `{}` - {}", rule.trigger, emoji)
}

// Discord allows up to 10 embeds per message; 15 rules per embed keeps
// each comfortably under the description limit.
const RULES_PER_EMBED: usize = 15;
const MAX_EMBEDS: usize = 10;

async fn send_rule_list(ctx: &Context<'_>, rules: &[(String, ReactRule)]) -> Result<(), Error> {
    if rules.is_empty() {
        ctx.say("No autoreacts found.").await?;
        return Ok(());
    }

    let mut reply = poise::CreateReply::default();
    for (index, chunk) in rules.chunks(RULES_PER_EMBED).take(MAX_EMBEDS).enumerate() {
        let body = chunk
            .iter()
            .map(|(id, rule)| describe(id, rule))
            .collect::<Vec<_>>()
            .join("\n");
        let mut embed = serenity::CreateEmbed::new()
            .description(body)
            .colour(serenity::Colour::BLURPLE);
        if index == 0 {
            embed = embed.title("Autoreact List");
        }
        reply = reply.embed(embed);
    }

    let shown = rules.len().min(RULES_PER_EMBED * MAX_EMBEDS);
    if shown < rules.len() {
        reply = reply.content(format!(
            "Showing {shown} of {} autoreacts; use `/autoreact search` to narrow down.",
            rules.len()
        ));
    }

    ctx.send(reply).await?;
    Ok(())
}

/// Automatic reactions
#[poise::command(
    slash_command,
    guild_only,
    subcommands("add", "addregex", "remove", "list", "search", "refresh")
)]
pub async fn autoreact(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add an autoreact triggered by a phrase (case-insensitive)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Emoji to react with"] emoji: String,
    #[description = "Phrase that triggers it"] phrase: String,
) -> Result<(), Error> {
    let emoji = parse_emoji(&emoji);
    let id = ctx.data().autoreact.add_phrase(phrase.clone(), emoji).await?;
    ctx.say(format!("Added an autoreact for `{phrase}`, ID: *`{id}`*"))
        .await?;
    Ok(())
}

/// Add an autoreact triggered by a regex (case-sensitive, partial match)
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn addregex(
    ctx: Context<'_>,
    #[description = "Emoji to react with"] emoji: String,
    #[description = "Regex that triggers it"] regex: String,
) -> Result<(), Error> {
    let emoji = parse_emoji(&emoji);
    match ctx.data().autoreact.add_regex(regex.clone(), emoji).await {
        Ok(id) => {
            ctx.say(format!("Added a regex autoreact for `{regex}`, ID: *`{id}`*"))
                .await?;
            Ok(())
        }
        Err(AutoReactError::InvalidRegex(err)) => {
            ctx.say(format!("Invalid regex: `{err}`")).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Remove an autoreact by its ID
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Rule ID (see /autoreact list)"] id: String,
) -> Result<(), Error> {
    match ctx.data().autoreact.remove(&id).await {
        Ok(()) => {
            ctx.say(format!("Removed autoreact with ID `{id}`")).await?;
            Ok(())
        }
        Err(AutoReactError::NotFound(_)) => {
            ctx.say(format!("No autoreact with ID `{id}`.")).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// List all autoreacts
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let rules = ctx.data().autoreact.list().await?;
    send_rule_list(&ctx, &rules).await
}

/// Search autoreacts by id, trigger, or emoji
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn search(
    ctx: Context<'_>,
    #[description = "Text to search for"] query: String,
) -> Result<(), Error> {
    let rules = ctx.data().autoreact.search(&query).await?;
    send_rule_list(&ctx, &rules).await
}

/// Reload the autoreact table from disk
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn refresh(ctx: Context<'_>) -> Result<(), Error> {
    let count = ctx.data().autoreact.refresh().await?;
    ctx.say(format!("Refreshed autoreact list from file ({count} rules)."))
        .await?;
    Ok(())
}
