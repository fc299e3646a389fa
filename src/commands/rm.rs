use serde::Serialize;

use crate::cli::MessageIdArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::sync::DualWrite;

use super::read::partial_note;

#[derive(Debug, Serialize)]
struct RemoveOutput<'a> {
    id: &'a str,
    #[serde(flatten)]
    applied: DualWrite,
}

pub async fn run(ctx: &AppContext, args: MessageIdArgs) -> AppResult<()> {
    let sync = ctx.synchronizer(None)?;
    let applied = sync.delete(&args.id).await;

    let text = format!("{}: deleted{}", args.id, partial_note(applied));
    ctx.output.emit(
        &text,
        &RemoveOutput {
            id: &args.id,
            applied,
        },
    )
}
