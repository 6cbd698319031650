//! Scryfall search links built from loose commander-deck criteria.
//!
//! `Linvala, Keeper of Silence creature 2/2 cmc<5` becomes a search for
//! 2/2 creatures costing less than five inside Linvala's colour identity.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use otter_core::config::EXTERNAL_CALL_TIMEOUT_SECS;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CommandError, Result};

const CARD_TYPES: [&str; 7] = [
    "artifact",
    "creature",
    "enchantment",
    "instant",
    "land",
    "planeswalker",
    "sorcery",
];
const SUPER_TYPES: [&str; 4] = ["legendary", "snow", "basic", "tribal"];

pub const HELP: &str = "Generates a Scryfall search link based on specified criteria.
You can specify the name of a commander (or most of the name) and then:
* Card types, including super types
* CMC, including <,=,> or combinations (defaults to = if no symbol specified)
* Power/Toughness

Example 1:
Linvala, Keeper of Silence creature 2/2 cmc<5

Will return a search for white or colourless creatures which are 2/2 and cost less than 5 mana.

Example 2:
child of alara legendary land 2

Will return all legendary lands with CMC equal to 2";

/// Resolves a card name to its colour identity letters, e.g. `BUW`.
#[async_trait]
pub trait CardLookup: Send + Sync {
    async fn colour_identity(&self, name: &str) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct NamedCard {
    #[serde(default)]
    color_identity: Vec<String>,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    details: Option<String>,
}

/// Fuzzy name lookup against the Scryfall API.
pub struct ScryfallLookup {
    client: reqwest::Client,
    api_url: String,
}

impl ScryfallLookup {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(EXTERNAL_CALL_TIMEOUT_SECS))
            .user_agent(concat!("otter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CommandError::Http {
                message: "card lookup unavailable",
                source: e,
            })?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

#[async_trait]
impl CardLookup for ScryfallLookup {
    async fn colour_identity(&self, name: &str) -> Result<String> {
        let url = format!(
            "{}/cards/named?fuzzy={}",
            self.api_url.trim_end_matches('/'),
            urlencoding::encode(name)
        );
        debug!(%url, "scryfall fuzzy lookup");

        let resp = self.client.get(&url).send().await.map_err(|e| CommandError::Http {
            message: "card lookup unavailable",
            source: e,
        })?;
        let status = resp.status().as_u16();
        let card: NamedCard = resp.json().await.map_err(|e| CommandError::Http {
            message: "card lookup unavailable",
            source: e,
        })?;

        if status == 404 || card.status == Some(404) {
            return Err(CommandError::Usage(
                card.details.unwrap_or_else(|| format!("No card found named {name}")),
            ));
        }
        if !(200..300).contains(&status) {
            return Err(CommandError::Upstream {
                message: "card lookup unavailable",
                status,
            });
        }
        Ok(card.color_identity.concat())
    }
}

/// Criteria pulled out of the free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
    pub types: Vec<&'static str>,
    pub super_types: Vec<&'static str>,
    /// Already encoded, e.g. `pow%3D2+tou%3D2`.
    pub power_toughness: Option<String>,
    /// Already encoded comparison, e.g. `%3C%3D4`.
    pub cmc: Option<String>,
    /// What is left: the commander's name.
    pub name: String,
}

fn pt_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<power>[0-9*]+)/(?P<toughness>[0-9*]+)").expect("p/t pattern is valid")
    })
}

fn cmc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:cmc)?(?P<modifier>[<=>]{0,2})(?P<cmc>[0-9]+)").expect("cmc pattern is valid")
    })
}

/// Remove the first occurrence of each listed word, returning the ones found.
fn take_words(text: &mut String, words: &[&'static str]) -> Vec<&'static str> {
    let mut found = Vec::new();
    for word in words {
        if let Some(idx) = text.find(word) {
            text.replace_range(idx..idx + word.len(), "");
            found.push(*word);
        }
    }
    found
}

fn take_power_toughness(text: &mut String) -> Option<String> {
    let caps = pt_pattern().captures(text)?;
    let mut parts = Vec::new();
    if &caps["power"] != "*" {
        parts.push(format!("pow%3D{}", &caps["power"]));
    }
    if &caps["toughness"] != "*" {
        parts.push(format!("tou%3D{}", &caps["toughness"]));
    }
    *text = pt_pattern().replace_all(text, "").trim().to_string();
    (!parts.is_empty()).then(|| parts.join("+"))
}

fn take_cmc(text: &mut String) -> Option<String> {
    let caps = cmc_pattern().captures(text)?;
    let modifier = match &caps["modifier"] {
        "" => "=",
        m => m,
    };
    let encoded = modifier.replace('=', "%3D").replace('<', "%3C");
    let value = format!("{encoded}{}", &caps["cmc"]);
    *text = cmc_pattern().replace_all(text, "").trim().to_string();
    Some(value)
}

fn tidy_name(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

/// Pull types, power/toughness and cmc out of `input`, in that order.
pub fn parse_criteria(input: &str) -> Criteria {
    let mut text = input.to_string();
    let types = take_words(&mut text, &CARD_TYPES);
    let super_types = take_words(&mut text, &SUPER_TYPES);
    let power_toughness = take_power_toughness(&mut text);
    let cmc = take_cmc(&mut text);
    Criteria {
        types,
        super_types,
        power_toughness,
        cmc,
        name: tidy_name(&text),
    }
}

/// Render the search link(s). Several card types produce one link per type,
/// separated by spaces.
pub fn render_link(search_base: &str, identity: &str, criteria: &Criteria) -> String {
    let mut uri = format!("{search_base}commander%3A{identity}");
    if let Some(pt) = &criteria.power_toughness {
        uri.push('+');
        uri.push_str(pt);
    }
    if let Some(cmc) = &criteria.cmc {
        uri.push_str("+cmc");
        uri.push_str(cmc);
    }
    for super_type in &criteria.super_types {
        uri.push_str("+type%3A");
        uri.push_str(super_type);
    }

    match criteria.types.as_slice() {
        [] => uri,
        [only] => format!("{uri}+type%3A{only}"),
        many => many
            .iter()
            .map(|t| format!("{uri}+type%3A{t}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Handle the `mtg` argument text.
pub async fn search(args: &str, search_base: &str, lookup: &dyn CardLookup) -> Result<String> {
    let args = args.trim();
    if args.starts_with("help") {
        return Ok(HELP.to_string());
    }
    let criteria = parse_criteria(args);
    if criteria.name.is_empty() {
        return Err(CommandError::usage("No commander specified, see mtg help"));
    }
    let identity = lookup.colour_identity(&criteria.name).await?;
    Ok(render_link(search_base, &identity, &criteria))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://scryfall.com/search?as=grid&order=name&q=";

    /// Known commanders by name prefix.
    struct Stub;

    #[async_trait]
    impl CardLookup for Stub {
        async fn colour_identity(&self, name: &str) -> Result<String> {
            let table = [
                ("sydri", "BUW"),
                ("linvala", "W"),
                ("omnath, locus of creation", "GRUW"),
                ("anafenza", "W"),
                ("atraxa", "BGUW"),
                ("child of alara", "BGRUW"),
                ("chromium", "BUW"),
                ("eight-and-a-half-tails", "W"),
                ("archangel avacyn", "RW"),
                ("kongming", "W"),
            ];
            let lower = name.to_lowercase();
            if lower == "omnath" {
                return Err(CommandError::usage(
                    "Too many cards match ambiguous name “omnath”. Add more words to refine your search.",
                ));
            }
            table
                .iter()
                .find(|(prefix, _)| lower.starts_with(prefix))
                .map(|(_, ci)| ci.to_string())
                .ok_or_else(|| CommandError::usage(format!("unexpected lookup: {name}")))
        }
    }

    async fn link(input: &str) -> Result<String> {
        search(input, BASE, &Stub).await
    }

    #[tokio::test]
    async fn reference_searches() {
        let cases = [
            (
                "sydri, galvanic genius instant cmc<=4",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3ABUW+cmc%3C%3D4+type%3Ainstant",
            ),
            (
                "Linvala, Keeper of Silence creature 2/2 cmc<5",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3AW+pow%3D2+tou%3D2+cmc%3C5+type%3Acreature",
            ),
            (
                "omnath, locus of creation creature, sorcery",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3AGRUW+type%3Acreature https://scryfall.com/search?as=grid&order=name&q=commander%3AGRUW+type%3Asorcery",
            ),
            (
                "anafenza, kin-tree spirit enchantment 3",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3AW+cmc%3D3+type%3Aenchantment",
            ),
            (
                "atraxa, praetors' voice planeswalker cmc>5",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3ABGUW+cmc>5+type%3Aplaneswalker",
            ),
            (
                "child of alara legendary land 2",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3ABGRUW+cmc%3D2+type%3Alegendary+type%3Aland",
            ),
            (
                "chromium artifact 0",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3ABUW+cmc%3D0+type%3Aartifact",
            ),
            (
                "eight-and-a-half-tails snow creature",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3AW+type%3Asnow+type%3Acreature",
            ),
            (
                "archangel avacyn tribal instant",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3ARW+type%3Atribal+type%3Ainstant",
            ),
            (
                "kongming \"sleeping dragon\" creature 5",
                "https://scryfall.com/search?as=grid&order=name&q=commander%3AW+cmc%3D5+type%3Acreature",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(link(input).await.unwrap(), expected, "input: {input}");
        }
    }

    #[tokio::test]
    async fn ambiguous_name_error_is_shown() {
        let err = link("omnath land").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Too many cards match ambiguous name “omnath”. Add more words to refine your search."
        );
    }

    #[tokio::test]
    async fn help_skips_lookup() {
        assert_eq!(link("help").await.unwrap(), HELP);
    }

    #[test]
    fn types_and_super_types() {
        let c = parse_criteria("something instant 123");
        assert_eq!(c.types, vec!["instant"]);
        assert!(c.super_types.is_empty());

        let c = parse_criteria("enchantment sorcery 13");
        assert_eq!(c.types, vec!["enchantment", "sorcery"]);

        let c = parse_criteria("legendary basic land");
        assert_eq!(c.types, vec!["land"]);
        assert_eq!(c.super_types, vec!["legendary", "basic"]);
    }

    #[test]
    fn star_power_is_unconstrained() {
        let c = parse_criteria("tarmogoyf */3");
        assert_eq!(c.power_toughness.as_deref(), Some("tou%3D3"));
        assert_eq!(c.name, "tarmogoyf");

        let c = parse_criteria("tarmogoyf */*");
        assert_eq!(c.power_toughness, None);
    }

    #[test]
    fn cmc_modifiers() {
        assert_eq!(parse_criteria("x cmc>=3").cmc.as_deref(), Some(">%3D3"));
        assert_eq!(parse_criteria("x 7").cmc.as_deref(), Some("%3D7"));
        assert_eq!(parse_criteria("x").cmc, None);
    }

    #[test]
    fn name_is_tidied() {
        let c = parse_criteria("  omnath,   locus of creation creature, sorcery");
        assert_eq!(c.name, "omnath, locus of creation");
    }
}
