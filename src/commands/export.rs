use std::fs;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::cli::ExportArgs;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::export;
use crate::search;

#[derive(Debug, Serialize)]
struct ExportOutput {
    path: String,
    format: &'static str,
    count: usize,
}

pub async fn run(ctx: &AppContext, args: ExportArgs) -> AppResult<()> {
    let sync = ctx.synchronizer(None)?;
    let view = ctx.handle_rejected_session(sync.refresh(1).await)?;
    let selected = search::filter(&view.messages, args.q.as_deref().unwrap_or_default(), &view.bodies);

    let rendered = export::render(args.format, &selected, &view.bodies)?;
    let path = args
        .output
        .unwrap_or_else(|| export::default_file_name(args.format, Utc::now()).into());
    fs::write(&path, rendered)?;
    info!(path = %path.display(), count = selected.len(), "export written");

    let output = ExportOutput {
        path: path.display().to_string(),
        format: args.format.extension(),
        count: selected.len(),
    };
    let text = format!("exported {} messages to {}", output.count, output.path);
    ctx.output.emit(&text, &output)
}
