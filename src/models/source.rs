use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// An article feed tracked by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// Articles written on the blog itself.
    Native,
    /// Headlines scraped from the news aggregator.
    Scraped,
}

impl Source {
    /// Every tracked source, in notification order.
    pub const ALL: [Source; 2] = [Source::Native, Source::Scraped];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Native => "native",
            Source::Scraped => "scraped",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Source::Native),
            "scraped" => Ok(Source::Scraped),
            other => Err(AppError::Config(format!("unknown article source: {}", other))),
        }
    }
}
