use serde::Serialize;

use crate::cli::ListArgs;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::output::{self, OutputMode};
use crate::search;
use crate::sync::{InboxEntry, InboxView, Origin};

#[derive(Debug, Serialize)]
pub struct ListOutput<'a> {
    pub account: Option<&'a str>,
    pub total: usize,
    pub provider_total: u64,
    pub shown: usize,
    pub messages: Vec<&'a InboxEntry>,
}

pub async fn run(ctx: &AppContext, args: ListArgs) -> AppResult<()> {
    if args.page == 0 {
        return Err(AppError::InvalidInput(
            "--page must be greater than 0".to_string(),
        ));
    }
    if args.limit == Some(0) {
        return Err(AppError::InvalidInput(
            "--limit must be greater than 0".to_string(),
        ));
    }

    let sync = ctx.synchronizer(args.limit)?;
    let view = ctx.handle_rejected_session(sync.refresh(args.page).await)?;
    let shown = search::filter(&view.messages, args.q.as_deref().unwrap_or_default(), &view.bodies);

    print_inbox(ctx, &view, shown)
}

/// Prints a refreshed inbox, already narrowed to the entries worth showing.
pub fn print_inbox(ctx: &AppContext, view: &InboxView, shown: Vec<&InboxEntry>) -> AppResult<()> {
    if ctx.output.mode() == OutputMode::Text {
        if shown.is_empty() {
            println!("0 messages");
            return Ok(());
        }

        for (index, entry) in shown.iter().enumerate() {
            let message = &entry.message;
            let subject = if message.subject.trim().is_empty() {
                "(no subject)"
            } else {
                message.subject.as_str()
            };
            let unread = if message.seen { "" } else { " [unread]" };
            let mirrored = match entry.origin {
                Origin::Provider => "",
                Origin::Mirror => " [mirror]",
            };

            println!("{}. {}{unread}{mirrored}", index + 1, message.id);
            println!("   from: {}", message.from.display());
            println!("   subject: {subject}");
            println!("   date: {}", message.created_at.format("%Y-%m-%d %H:%M UTC"));
            println!();
            println!("   {}", format_preview(&message.intro));

            if index + 1 < shown.len() {
                println!();
            }
        }

        if shown.len() != view.total {
            println!();
            println!("{} of {} messages", shown.len(), view.total);
        }
        return Ok(());
    }

    let payload = ListOutput {
        account: view.account.as_deref(),
        total: view.total,
        provider_total: view.provider_total,
        shown: shown.len(),
        messages: shown,
    };
    output::print_json(&payload)
}

fn format_preview(intro: &str) -> String {
    let decoded = html_escape::decode_html_entities(intro).to_string();
    let compact = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.is_empty() {
        return "(no preview)".to_string();
    }

    if compact.len() <= 120 {
        return compact;
    }

    let mut end = 120;
    while !compact.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &compact[..end])
}
