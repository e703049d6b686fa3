//! Chat reply formatting. Every function here is pure.

use std::fmt::Write as _;
use std::time::Duration;

use serde::Serialize;

use crate::catalog::{commands_in, BotInfo, CommandCategory, CommandName};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReplyPayload {
    pub text: String,
}

impl ReplyPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Error,
    Info,
    Warning,
}

impl Tone {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Error => "❌",
            Self::Info => "ℹ️",
            Self::Warning => "⚠️",
        }
    }
}

/// Accumulates a multi-line mrkdwn reply.
#[derive(Default)]
pub struct ReplyBuilder {
    text: String,
}

impl ReplyBuilder {
    pub fn titled(emoji: &str, title: &str) -> Self {
        let mut builder = Self::default();
        let _ = write!(builder.text, "{emoji} *{title}*\n\n");
        builder
    }

    pub fn line(mut self, line: impl AsRef<str>) -> Self {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
        self
    }

    pub fn bullet(self, item: impl AsRef<str>) -> Self {
        let item = item.as_ref();
        self.line(format!("• {item}"))
    }

    pub fn blank(self) -> Self {
        self.line("")
    }

    pub fn raw(mut self, text: impl AsRef<str>) -> Self {
        self.text.push_str(text.as_ref());
        self
    }

    pub fn build(self) -> ReplyPayload {
        ReplyPayload { text: self.text }
    }
}

pub fn toned(tone: Tone, message: &str) -> ReplyPayload {
    ReplyPayload { text: format!("{} {message}", tone.prefix()) }
}

pub fn error(message: &str) -> ReplyPayload {
    toned(Tone::Error, message)
}

pub fn info(message: &str) -> ReplyPayload {
    toned(Tone::Info, message)
}

pub fn warning(message: &str) -> ReplyPayload {
    toned(Tone::Warning, message)
}

pub fn help_overview(bot_name: &str) -> ReplyPayload {
    let mut builder = ReplyBuilder::titled("📚", &format!("{bot_name} - Available Commands"));
    for (index, category) in CommandCategory::ALL.iter().enumerate() {
        if index > 0 {
            builder = builder.blank();
        }
        builder = builder.line(format!("*{}:*", category.title()));
        for spec in commands_in(*category) {
            builder = builder.bullet(format!("`@bot {}` - {}", spec.usage, spec.description));
        }
    }

    builder
        .blank()
        .line("💡 *Tip:* Use `@bot help [category]` for detailed help on specific categories.")
        .raw("Example: `@bot help ai` or `@bot help basic`")
        .build()
}

pub fn help_category(category: CommandCategory) -> ReplyPayload {
    let mut builder = ReplyBuilder::titled("📚", &format!("{} - Detailed Help", category.title()));
    for spec in commands_in(category) {
        builder = builder
            .line(format!("*{}*", spec.name))
            .line(format!("Usage: `@bot {}`", spec.usage))
            .line(format!("Description: {}", spec.description));
        if !spec.examples.is_empty() {
            builder = builder.line("Examples:");
            for example in spec.examples {
                builder = builder.line(format!("  • `{example}`"));
            }
        }
        builder = builder.blank();
    }
    builder.build()
}

pub fn unknown_category(requested: &str) -> ReplyPayload {
    error(&format!(
        "Category \"{requested}\" not found. Available categories: basic, ai, info"
    ))
}

pub fn command_suggestions(unknown: &str, suggestions: &[&str]) -> ReplyPayload {
    let mut message = format!("Command \"{unknown}\" not found.");
    if !suggestions.is_empty() {
        message.push_str("\n\nDid you mean:\n");
        for suggestion in suggestions {
            let _ = writeln!(message, "• `{suggestion}`");
        }
    }
    message.push_str("\nType `@bot help` to see all available commands.");
    error(&message)
}

pub fn coming_soon(command: CommandName) -> ReplyPayload {
    info(&format!(
        "`{command}` is part of the {} and is coming soon. Type `@bot help info` to see what is planned.",
        command.category().title()
    ))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub version: String,
    pub uptime: Duration,
    pub response_time_ms: u128,
    pub ai_available: bool,
    pub last_deployed: String,
}

pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
}

pub fn status(report: &StatusReport) -> ReplyPayload {
    let ai_status = if report.ai_available { "Available" } else { "Not configured" };
    ReplyBuilder::titled("🤖", "Bot Status")
        .bullet("Status: ✅ Online")
        .bullet(format!("Version: {}", report.version))
        .bullet(format!("Uptime: {}", format_uptime(report.uptime)))
        .bullet(format!("Response Time: {}ms", report.response_time_ms))
        .bullet(format!("AI Features: {ai_status}"))
        .bullet(format!("Last Deployed: {}", report.last_deployed))
        .build()
}

pub fn bot_info(info: &BotInfo) -> ReplyPayload {
    let mut builder = ReplyBuilder::titled("🤖", info.name)
        .line(info.description)
        .blank()
        .line(format!("*Version:* {}", info.version))
        .blank();

    if !info.features.is_empty() {
        builder = builder.line("*Features:*");
        for feature in info.features {
            builder = builder.bullet(feature);
        }
        builder = builder.blank();
    }
    if let Some(homepage) = info.homepage {
        builder = builder.line(format!("*GitHub:* {homepage}"));
    }
    if let Some(support) = info.support {
        builder = builder.line(format!("*Support:* {support}"));
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{
        bot_info, command_suggestions, help_category, help_overview, status,
        unknown_category, StatusReport,
    };
    use crate::catalog::{CommandCategory, BOT_INFO};

    #[test]
    fn suggestions_reply_lists_candidates() {
        let reply = command_suggestions("pign", &["ping"]);

        assert_eq!(
            reply.text,
            "❌ Command \"pign\" not found.\n\nDid you mean:\n• `ping`\n\nType `@bot help` to see all available commands."
        );
    }

    #[test]
    fn not_found_reply_without_candidates() {
        let reply = command_suggestions("zzz", &[]);

        assert_eq!(
            reply.text,
            "❌ Command \"zzz\" not found.\nType `@bot help` to see all available commands."
        );
    }

    #[test]
    fn overview_lists_every_category_in_order() {
        let text = help_overview("Info Hub Bot").text;

        assert!(text.starts_with("📚 *Info Hub Bot - Available Commands*\n\n*Basic Commands:*\n"));
        let basic = text.find("*Basic Commands:*").unwrap_or(usize::MAX);
        let ai = text.find("*AI-Powered Features:*").unwrap_or(0);
        let hub = text.find("*Information Hub:*").unwrap_or(0);
        assert!(basic < ai && ai < hub);
        assert!(text.contains("• `@bot ask [question]` - Ask any question and get an AI-powered answer\n"));
        assert!(text.ends_with("Example: `@bot help ai` or `@bot help basic`"));
    }

    #[test]
    fn category_help_shows_usage_and_examples() {
        let text = help_category(CommandCategory::Ai).text;

        assert!(text.starts_with("📚 *AI-Powered Features - Detailed Help*\n\n*ask*\n"));
        assert!(text.contains("Usage: `@bot explain [topic]`\n"));
        assert!(text.contains("  • `@bot explain REST APIs`\n"));
        assert!(!text.contains("weather"));
    }

    #[test]
    fn unknown_category_names_the_valid_ones() {
        assert_eq!(
            unknown_category("games").text,
            "❌ Category \"games\" not found. Available categories: basic, ai, info"
        );
    }

    #[test]
    fn status_renders_uptime_in_hours_and_minutes() {
        let text = status(&StatusReport {
            version: "1.0.0".to_owned(),
            uptime: Duration::from_secs(2 * 3600 + 5 * 60 + 59),
            response_time_ms: 3,
            ai_available: false,
            last_deployed: "2026-10-17".to_owned(),
        })
        .text;

        assert!(text.contains("• Uptime: 2h 5m\n"));
        assert!(text.contains("• Response Time: 3ms\n"));
        assert!(text.contains("• AI Features: Not configured\n"));
    }

    #[test]
    fn bot_info_includes_features_and_support() {
        let text = bot_info(&BOT_INFO).text;

        assert!(text.starts_with("🤖 *Info Hub Bot*\n\n"));
        assert!(text.contains("• Weather information\n"));
        assert!(text.contains("*Support:* Mention @bot help for assistance\n"));
    }
}
