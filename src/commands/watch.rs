use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cli::WatchArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::output::{self, OutputMode};
use crate::search;
use crate::sync::{InboxEntry, InboxView};

use super::list;

pub async fn run(ctx: &AppContext, args: WatchArgs) -> AppResult<()> {
    let period = match args.interval {
        Some(0) => {
            return Err(AppError::InvalidInput(
                "--interval must be greater than 0".to_string(),
            ));
        }
        Some(seconds) => Duration::from_secs(seconds),
        None => ctx.settings.refresh_interval(),
    };
    let query = args.q.unwrap_or_default();

    let sync = Arc::new(ctx.synchronizer(None)?);
    let (results_tx, mut results_rx) = mpsc::channel::<AppResult<InboxView>>(4);

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval_secs = period.as_secs(), "watching inbox");
    let mut known: Option<HashSet<String>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let sync = Arc::clone(&sync);
                let results_tx = results_tx.clone();
                tokio::spawn(async move {
                    if let Some(outcome) = sync.refresh_coalesced(1).await {
                        let _ = results_tx.send(outcome).await;
                    }
                });
            }
            Some(outcome) = results_rx.recv() => match outcome {
                Ok(view) => report(ctx, &view, &query, &mut known)?,
                Err(err) if err.is_auth_rejected() => {
                    return ctx.handle_rejected_session(Err(err));
                }
                Err(err) => warn!("refresh failed, retrying next tick: {err}"),
            },
            _ = &mut shutdown => {
                info!("stopping watch");
                return Ok(());
            }
        }
    }
}

fn report(
    ctx: &AppContext,
    view: &InboxView,
    query: &str,
    known: &mut Option<HashSet<String>>,
) -> AppResult<()> {
    let shown = search::filter(&view.messages, query, &view.bodies);

    if known.is_none() {
        *known = Some(ids_of(&view.messages));
        return list::print_inbox(ctx, view, shown);
    }
    let seen_ids = known.get_or_insert_with(HashSet::new);

    let arrivals = shown
        .into_iter()
        .filter(|entry| !seen_ids.contains(&entry.message.id))
        .collect::<Vec<_>>();
    seen_ids.extend(ids_of(&view.messages));

    if arrivals.is_empty() {
        debug!(total = view.total, "no new messages");
        return Ok(());
    }

    if ctx.output.mode() == OutputMode::Text {
        for entry in &arrivals {
            println!(
                "new: {} | {} | {}",
                entry.message.id,
                entry.message.from.display(),
                entry.message.subject
            );
        }
        return Ok(());
    }

    output::print_json(&arrivals)
}

fn ids_of(entries: &[InboxEntry]) -> HashSet<String> {
    entries.iter().map(|entry| entry.message.id.clone()).collect()
}
