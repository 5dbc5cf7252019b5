//! The `help` command: lists what the requester may run, or searches
//! registered commands by fragment.

use anyhow::Result;
use async_trait::async_trait;

use router_core::{Command, CommandContext, CommandSpec, send_text};

pub struct Help {
    /// Primary prefix, shown in front of command names ("!help").
    display_prefix: String,
}

impl Help {
    #[must_use]
    pub fn new(display_prefix: impl Into<String>) -> Self {
        Self {
            display_prefix: display_prefix.into(),
        }
    }

    fn render_line(&self, spec: &CommandSpec) -> String {
        let mut line = format!("{}{}", self.display_prefix, spec.name());
        if spec.aliases.len() > 1 {
            line.push_str(&format!(" ({})", spec.aliases[1..].join(", ")));
        }
        if !spec.usage.is_empty() {
            line.push_str(": ");
            line.push_str(&spec.usage);
        }
        line
    }
}

#[async_trait]
impl Command for Help {
    async fn run(&self, ctx: &CommandContext, args: &str) -> Result<()> {
        let fragment = args.trim();
        let text = if fragment.is_empty() {
            let mut lines = vec!["Available commands:".to_owned()];
            lines.extend(
                ctx.table
                    .list_visible(ctx.level, ctx.gate)
                    .into_iter()
                    .map(|spec| self.render_line(spec)),
            );
            lines.join("\n")
        } else {
            let hits = ctx.table.search(fragment);
            if hits.is_empty() {
                format!("No commands match {fragment:?}.")
            } else {
                hits.into_iter()
                    .map(|spec| self.render_line(spec))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        };
        send_text(ctx, text).await
    }
}
