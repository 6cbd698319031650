/// A message that addressed the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Lower-cased first token after the prefix. May be empty.
    pub name: String,
    /// Remainder after the first whitespace run, trimmed.
    pub args: String,
}

/// Split a raw message into command name and argument text.
///
/// Returns `None` for the bot's own messages and for text that does not
/// start with `prefix`. Exactly one prefix is stripped, so `!!ping` yields
/// the name `!ping`.
pub fn parse(text: &str, prefix: &str, authored_by_self: bool) -> Option<ParsedCommand> {
    if authored_by_self || prefix.is_empty() {
        return None;
    }
    let rest = text.strip_prefix(prefix)?;

    let (name, args) = match rest.find(char::is_whitespace) {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    Some(ParsedCommand {
        name: name.to_lowercase(),
        args: args.trim().to_string(),
    })
}
