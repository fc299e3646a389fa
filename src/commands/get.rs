use serde::Serialize;

use crate::cli::GetArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::output::{self, OutputMode};
use crate::search;
use crate::sync::{DualWrite, OpenedMessage, Origin};

#[derive(Debug, Serialize)]
struct GetOutput {
    #[serde(flatten)]
    opened: OpenedMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    marked_read: Option<DualWrite>,
}

pub async fn run(ctx: &AppContext, args: GetArgs) -> AppResult<()> {
    let sync = ctx.synchronizer(None)?;
    let opened = ctx.handle_rejected_session(sync.get_message(&args.id).await)?;

    let marked_read = if args.peek || opened.detail.message.seen {
        None
    } else {
        Some(sync.mark_as_read(&args.id).await)
    };

    if ctx.output.mode() == OutputMode::Text {
        let message = &opened.detail.message;
        let body = &opened.detail.body;
        println!("id: {}", message.id);
        println!("from: {}", message.from.display());
        println!(
            "to: {}",
            message
                .to
                .iter()
                .map(|to| to.display())
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("subject: {}", message.subject);
        println!("date: {}", message.created_at.format("%Y-%m-%d %H:%M UTC"));
        if opened.origin == Origin::Mirror {
            println!("source: mirror (no longer at the provider)");
        }
        println!();

        let text = if body.text.trim().is_empty() {
            search::strip_html(&body.html)
        } else {
            body.text.clone()
        };
        if text.trim().is_empty() {
            println!("{}", message.intro);
        } else {
            println!("{}", text.trim_end());
        }
        return Ok(());
    }

    let payload = GetOutput {
        opened,
        marked_read,
    };
    output::print_json(&payload)
}
