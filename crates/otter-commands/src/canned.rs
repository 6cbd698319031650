//! Fixed replies.

use rand::seq::SliceRandom;

pub const SOURCE: &str = "You can find the source here: https://github.com/ChrisLGardner/go-discord-bot";

const KEVIN: &[&str] = &[
    "https://media.giphy.com/media/qN6rdS6fX8rAs/giphy.gif",
    "https://media.giphy.com/media/9bVFj1dUZZJCg/giphy.gif",
    "https://media.giphy.com/media/ZMVgXOHWLBFzW/giphy.gif",
];

const LANGUAGE: &[&str] = &[
    "Language!",
    "Oi, mind your language.",
    "We don't use that kind of language here.",
    "There are children present!",
    "Wash your mouth out.",
];

/// The command list, using `prefix` in the examples.
pub fn help(prefix: &str) -> String {
    format!(
        "Commands available:
{p}ping - returns pong if bot is running
{p}catfact - returns a random cat fact
{p}relationships - returns a random relationship objective or synergy
{p}mc - runs various minecraft commands if enabled for the user
{p}mtg - returns a scryfall search link based on user criteria, see {p}mtg help for more details
{p}roll - rolls Chronicles of Darkness dice, see {p}roll help
{p}source - returns the source of the bot
{p}time <username> - returns the time in that user's location
{p}remindme <text> <time> - sets a reminder, see {p}remindme help
{p}kevin - returns a Home Alone Kevin! gif",
        p = prefix
    )
}

pub fn kevin() -> &'static str {
    KEVIN.choose(&mut rand::thread_rng()).copied().unwrap_or(KEVIN[0])
}

pub fn language() -> &'static str {
    LANGUAGE.choose(&mut rand::thread_rng()).copied().unwrap_or(LANGUAGE[0])
}

pub fn feature_request(author_id: u64) -> String {
    format!(
        "<@{author_id}> feature requests go here: https://github.com/ChrisLGardner/go-discord-bot/issues"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_uses_prefix() {
        let text = help("?");
        assert!(text.contains("?ping"));
        assert!(!text.contains("!ping"));
    }

    #[test]
    fn random_picks_come_from_the_lists() {
        for _ in 0..20 {
            assert!(KEVIN.contains(&kevin()));
            assert!(LANGUAGE.contains(&language()));
        }
    }

    #[test]
    fn feature_request_mentions_author() {
        assert!(feature_request(42).starts_with("<@42>"));
    }
}
