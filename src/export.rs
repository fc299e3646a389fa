use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use html_escape::encode_text;

use crate::api::models::{Address, Message};
use crate::error::AppResult;
use crate::sync::{BodyCache, InboxEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
            Self::Html => "html",
        }
    }
}

pub fn default_file_name(format: ExportFormat, now: DateTime<Utc>) -> String {
    let stamp = now.format("%Y-%m-%dT%H-%M-%S");
    format!("emails_{stamp}.{}", format.extension())
}

pub fn render(format: ExportFormat, entries: &[&InboxEntry], bodies: &BodyCache) -> AppResult<String> {
    match format {
        ExportFormat::Json => render_json(entries, bodies),
        ExportFormat::Markdown => Ok(render_markdown(entries, bodies)),
        ExportFormat::Html => Ok(render_html(entries, bodies)),
    }
}

fn render_json(entries: &[&InboxEntry], bodies: &BodyCache) -> AppResult<String> {
    let documents = entries
        .iter()
        .map(|entry| -> AppResult<serde_json::Value> {
            let mut value = serde_json::to_value(entry)?;
            if let (Some(object), Some(body)) = (value.as_object_mut(), bodies.get(&entry.message.id)) {
                object.insert("text".to_string(), body.text.clone().into());
                object.insert("html".to_string(), body.html.clone().into());
            }
            Ok(value)
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(serde_json::to_string_pretty(&documents)?)
}

fn render_markdown(entries: &[&InboxEntry], bodies: &BodyCache) -> String {
    let mut out = String::new();
    for (index, entry) in entries.iter().enumerate() {
        let message = &entry.message;
        let text = bodies
            .get(&message.id)
            .map(|body| body.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .unwrap_or(message.intro.as_str());

        if index > 0 {
            out.push_str("\n\n");
        }
        let _ = write!(
            out,
            "# {}\n\n**From:** {}\n**To:** {}\n**Date:** {}\n\n---\n\n{}\n\n---\n",
            message.subject,
            message.from.display(),
            recipients(&message.to),
            display_date(message),
            text.trim_end(),
        );
    }
    out
}

fn render_html(entries: &[&InboxEntry], bodies: &BodyCache) -> String {
    let mut out = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  <title>Exported Emails</title>\n  <style>\n    body { font-family: system-ui, -apple-system, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; }\n    .email { border: 1px solid #ddd; margin: 20px 0; padding: 20px; border-radius: 8px; }\n    .subject { font-size: 1.2em; font-weight: bold; }\n    .meta { color: #666; margin: 10px 0; }\n    .content { margin-top: 20px; }\n  </style>\n</head>\n<body>\n",
    );

    for entry in entries {
        let message = &entry.message;
        let content = match bodies.get(&message.id) {
            Some(body) if !body.html.trim().is_empty() => body.html.clone(),
            Some(body) if !body.text.trim().is_empty() => {
                format!("<pre>{}</pre>", encode_text(&body.text))
            }
            _ => encode_text(&message.intro).into_owned(),
        };

        let _ = write!(
            out,
            "  <div class=\"email\">\n    <div class=\"subject\">{}</div>\n    <div class=\"meta\">\n      <div>From: {}</div>\n      <div>To: {}</div>\n      <div>Date: {}</div>\n    </div>\n    <div class=\"content\">\n{}\n    </div>\n  </div>\n",
            encode_text(&message.subject),
            encode_text(&message.from.display()),
            encode_text(&recipients(&message.to)),
            encode_text(&display_date(message)),
            content,
        );
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn recipients(to: &[Address]) -> String {
    to.iter().map(Address::display).collect::<Vec<_>>().join(", ")
}

fn display_date(message: &Message) -> String {
    message.created_at.format("%Y-%m-%d %H:%M UTC").to_string()
}
