//! Static command table and bot metadata.

use std::fmt;

use infohub_core::RateBucket;

pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Basic,
    Ai,
    InfoHub,
}

impl CommandCategory {
    pub const ALL: [Self; 3] = [Self::Basic, Self::Ai, Self::InfoHub];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Basic => "Basic Commands",
            Self::Ai => "AI-Powered Features",
            Self::InfoHub => "Information Hub",
        }
    }

    /// Case-insensitive lookup by the short names users type after `help`.
    pub fn from_alias(alias: &str) -> Option<Self> {
        match alias.trim().to_ascii_lowercase().as_str() {
            "basic" => Some(Self::Basic),
            "ai" => Some(Self::Ai),
            "info" | "hub" => Some(Self::InfoHub),
            _ => None,
        }
    }

    pub fn rate_bucket(&self) -> RateBucket {
        match self {
            Self::Ai => RateBucket::Ai,
            Self::Basic | Self::InfoHub => RateBucket::Basic,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandName {
    Help,
    Status,
    Info,
    Ping,
    Ask,
    Summarize,
    Explain,
    Weather,
    News,
    Time,
}

impl CommandName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Status => "status",
            Self::Info => "info",
            Self::Ping => "ping",
            Self::Ask => "ask",
            Self::Summarize => "summarize",
            Self::Explain => "explain",
            Self::Weather => "weather",
            Self::News => "news",
            Self::Time => "time",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        CATALOG.iter().map(|spec| spec.name).find(|command| command.as_str() == name)
    }

    pub fn spec(&self) -> &'static CommandSpec {
        // Every variant has exactly one row; `Help` is the first.
        CATALOG.iter().find(|spec| spec.name == *self).unwrap_or(&CATALOG[0])
    }

    pub fn category(&self) -> CommandCategory {
        self.spec().category
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: CommandName,
    pub usage: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
    pub examples: &'static [&'static str],
}

pub static CATALOG: [CommandSpec; 10] = [
    CommandSpec {
        name: CommandName::Help,
        usage: "help [category]",
        description: "Show available commands or help for specific category",
        category: CommandCategory::Basic,
        examples: &["@bot help", "@bot help ai", "@bot help info"],
    },
    CommandSpec {
        name: CommandName::Status,
        usage: "status",
        description: "Show bot health and system information",
        category: CommandCategory::Basic,
        examples: &["@bot status"],
    },
    CommandSpec {
        name: CommandName::Info,
        usage: "info",
        description: "Show bot information and capabilities",
        category: CommandCategory::Basic,
        examples: &["@bot info"],
    },
    CommandSpec {
        name: CommandName::Ping,
        usage: "ping",
        description: "Check if bot is responsive",
        category: CommandCategory::Basic,
        examples: &["@bot ping"],
    },
    CommandSpec {
        name: CommandName::Ask,
        usage: "ask [question]",
        description: "Ask any question and get an AI-powered answer",
        category: CommandCategory::Ai,
        examples: &["@bot ask What is machine learning?", "@bot ask How do I optimize my code?"],
    },
    CommandSpec {
        name: CommandName::Summarize,
        usage: "summarize [text]",
        description: "Summarize long text into key points",
        category: CommandCategory::Ai,
        examples: &["@bot summarize [paste your text here]"],
    },
    CommandSpec {
        name: CommandName::Explain,
        usage: "explain [topic]",
        description: "Get detailed explanations of concepts or topics",
        category: CommandCategory::Ai,
        examples: &["@bot explain blockchain", "@bot explain REST APIs"],
    },
    CommandSpec {
        name: CommandName::Weather,
        usage: "weather [location]",
        description: "Get current weather information for any location",
        category: CommandCategory::InfoHub,
        examples: &["@bot weather New York", "@bot weather London, UK"],
    },
    CommandSpec {
        name: CommandName::News,
        usage: "news [category|keyword]",
        description: "Get latest news headlines",
        category: CommandCategory::InfoHub,
        examples: &["@bot news", "@bot news technology", "@bot news bitcoin"],
    },
    CommandSpec {
        name: CommandName::Time,
        usage: "time [timezone]",
        description: "Get current time in different timezones",
        category: CommandCategory::InfoHub,
        examples: &["@bot time EST", "@bot time Tokyo", "@bot time zones"],
    },
];

pub fn commands_in(category: CommandCategory) -> impl Iterator<Item = &'static CommandSpec> {
    CATALOG.iter().filter(move |spec| spec.category == category)
}

/// Catalog names resembling `input`, in catalog order.
///
/// A name matches when it shares the first character, contains the input,
/// or is contained in it.
pub fn suggestions(input: &str) -> Vec<&'static str> {
    let Some(first) = input.chars().next() else {
        return Vec::new();
    };

    CATALOG
        .iter()
        .map(|spec| spec.name.as_str())
        .filter(|name| name.starts_with(first) || name.contains(input) || input.contains(name))
        .take(MAX_SUGGESTIONS)
        .collect()
}

#[derive(Debug)]
pub struct BotInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
    pub homepage: Option<&'static str>,
    pub support: Option<&'static str>,
}

pub static BOT_INFO: BotInfo = BotInfo {
    name: "Info Hub Bot",
    version: env!("CARGO_PKG_VERSION"),
    description: "Your intelligent Slack assistant for information, AI-powered responses, and productivity tools.",
    features: &[
        "Basic commands (help, status, info)",
        "AI-powered Q&A and text processing",
        "Weather information",
        "News updates",
        "Time zone utilities",
    ],
    homepage: Some("https://github.com/kevinace1/info-hub-bot"),
    support: Some("Mention @bot help for assistance"),
};
