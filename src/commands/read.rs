use serde::Serialize;

use crate::cli::MessageIdArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::sync::DualWrite;

#[derive(Debug, Serialize)]
struct ReadOutput<'a> {
    id: &'a str,
    #[serde(flatten)]
    applied: DualWrite,
}

pub async fn run(ctx: &AppContext, args: MessageIdArgs) -> AppResult<()> {
    let sync = ctx.synchronizer(None)?;
    let applied = sync.mark_as_read(&args.id).await;

    let text = format!("{}: marked read{}", args.id, partial_note(applied));
    ctx.output.emit(
        &text,
        &ReadOutput {
            id: &args.id,
            applied,
        },
    )
}

/// Describes which half of a dual write did not go through.
pub fn partial_note(applied: DualWrite) -> &'static str {
    match (applied.provider, applied.mirror) {
        (true, true) => "",
        (true, false) => " (mirror not updated)",
        (false, true) => " (provider not updated)",
        (false, false) => " (neither provider nor mirror updated)",
    }
}
