use super::*;
use crate::commands::music::audio_sources::AudioSource;
use crate::commands::music::utils::{guild_session::EnqueueOutcome, queue_manager::QueueItem};
use tracing::info;

/// Play songs from YouTube, Bilibili, direct URLs or a search query
///
/// Several links can be queued at once, separated by spaces or new lines.
#[poise::command(slash_command, prefix_command, guild_only, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "URLs or search query"]
    #[rest]
    query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);

    let result = enqueue_query(ctx, &query).await;
    respond(ctx, result, |(items, outcome)| match items.as_slice() {
        [item] => embedded_messages::added_to_queue(item, outcome.position, outcome.started),
        _ => embedded_messages::added_many_to_queue(items.len(), outcome.position, outcome.started),
    })
    .await
}

async fn enqueue_query(
    ctx: Context<'_>,
    query: &str,
) -> MusicResult<(Vec<QueueItem>, EnqueueOutcome)> {
    let references = split_references(query);
    if references.is_empty() {
        return Err(MusicError::InvalidState(
            "Give me a URL or something to search for".to_string(),
        ));
    }

    let origin = origin_for(ctx)?;
    let session = session_for(ctx)?;

    let requester = ctx.author().name.clone();
    let items: Vec<QueueItem> = references
        .into_iter()
        .map(|reference| QueueItem::new(reference).requested_by(requester.clone()))
        .collect();
    let outcome = session.enqueue_all(items.clone(), origin).await?;
    Ok((items, outcome))
}

/// One reference per line. A line made only of links holds one reference
/// per link; any other line is a single search.
fn split_references(query: &str) -> Vec<String> {
    query
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .flat_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() > 1 && tokens.iter().all(|token| AudioSource::is_url(token)) {
                tokens.into_iter().map(str::to_string).collect()
            } else {
                vec![line.to_string()]
            }
        })
        .collect()
}
