pub const HELP_TEXT: &str = "Commands:\n\
/minDate - earliest registration date\n\
/maxDate - latest registration date\n\
/count - number of users\n\
/page <pageNumber> <pageSize> - page of users\n\
/range <startInclusive> <endExclusive> - users by index range\n";

/// A chat command the bot understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    MinDate,
    MaxDate,
    Count,
    Page { page_number: i64, page_size: i64 },
    Range { start_inclusive: i64, end_exclusive: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Usage: /page 1 20")]
    PageUsage,
    #[error("Usage: /range 0 50")]
    RangeUsage,
    #[error("Unknown command. Send /help")]
    Unknown,
}

fn two_ints(args: &[&str]) -> Option<(i64, i64)> {
    match args {
        [a, b] => Some((a.parse().ok()?, b.parse().ok()?)),
        _ => None,
    }
}

impl Command {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut parts = text.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(ParseError::Unknown);
        };
        let args: Vec<&str> = parts.collect();
        // group chats address commands as /count@SomeBot
        let name = head.split('@').next().unwrap_or(head).to_ascii_lowercase();

        match name.as_str() {
            "/start" | "/help" => Ok(Command::Help),
            "/mindate" => Ok(Command::MinDate),
            "/maxdate" => Ok(Command::MaxDate),
            "/count" => Ok(Command::Count),
            "/page" => two_ints(&args)
                .map(|(page_number, page_size)| Command::Page {
                    page_number,
                    page_size,
                })
                .ok_or(ParseError::PageUsage),
            "/range" => two_ints(&args)
                .map(|(start_inclusive, end_exclusive)| Command::Range {
                    start_inclusive,
                    end_exclusive,
                })
                .ok_or(ParseError::RangeUsage),
            _ => Err(ParseError::Unknown),
        }
    }

    /// API path queried for this command, relative to the API base url.
    pub fn api_path(self) -> Option<String> {
        match self {
            Command::Help => None,
            Command::MinDate => Some("/api/v1/users/stats/registration-date/min".into()),
            Command::MaxDate => Some("/api/v1/users/stats/registration-date/max".into()),
            Command::Count => Some("/api/v1/users/stats/count".into()),
            Command::Page {
                page_number,
                page_size,
            } => Some(format!(
                "/api/v1/users/page?pageNumber={page_number}&pageSize={page_size}"
            )),
            Command::Range {
                start_inclusive,
                end_exclusive,
            } => Some(format!(
                "/api/v1/users/range?startInclusive={start_inclusive}&endExclusive={end_exclusive}"
            )),
        }
    }
}
