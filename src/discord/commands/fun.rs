// Funposting.

use crate::core::eightball::{self, Mood};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Ask the magic 8-ball
#[poise::command(slash_command, prefix_command, aliases("8ball", "ball"))]
pub async fn eightball(
    ctx: Context<'_>,
    #[description = "Your question"]
    #[rest]
    question: String,
) -> Result<(), Error> {
    // Keep the rng out of scope before the await - ThreadRng isn't Send.
    let (mood, answer) = {
        let mut rng = rand::thread_rng();
        eightball::draw(&mut rng)
    };

    let colour = match mood {
        Mood::Negative => serenity::Colour::RED,
        Mood::Neutral => serenity::Colour::GOLD,
        Mood::Positive => serenity::Colour::DARK_GREEN,
    };
    let embed = serenity::CreateEmbed::new()
        .title("The magic 8-ball has decided...")
        .colour(colour)
        .field("Question", question, false)
        .field("Answer", answer, false);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
