//! Ten-sided exploding dice for Chronicles of Darkness style pools.

use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;

use crate::error::{CommandError, Result};

/// Upper bound on requested dice.
pub const MAX_DICE: u32 = 100;
/// Upper bound on the whole pool including rerolls.
pub const MAX_POOL: usize = 1_000;

pub const HELP: &str = "Rolls dice for Chronicles of Darkness and returns the number of successes.
Format expected is:

<number of dice>|<c> <8a|9a>

The first number is how many dice to roll. Use \"c\" instead of a number to roll a chance die.
For 8 again or 9 again add 8a or 9a to the end.

Examples:
!roll 5 rolls 5 dice and returns successes.
!roll c rolls a chance die.
!roll 4 8a rolls 4 dice with 8 again.";

/// Source of d10 faces in `0..=9`, where `0` reads as ten.
pub trait DieSource {
    fn roll_d10(&mut self) -> u8;
}

/// Production source backed by any `rand` generator.
pub struct RandDie<R>(pub R);

impl<R: Rng> DieSource for RandDie<R> {
    fn roll_d10(&mut self) -> u8 {
        self.0.gen_range(0..10)
    }
}

/// Which faces add another die to the pool. `0` always does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Again {
    Ten,
    Nine,
    Eight,
}

impl Again {
    fn explodes(self, face: u8) -> bool {
        match self {
            Again::Ten => face == 0,
            Again::Nine => face == 0 || face >= 9,
            Again::Eight => face == 0 || face >= 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    DramaticFailure,
    Failure,
    Success,
    ExceptionalSuccess,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::DramaticFailure => "Dramatic Failure",
            Outcome::Failure => "Failure",
            Outcome::Success => "Success",
            Outcome::ExceptionalSuccess => "Exceptional Success",
        };
        write!(f, "{s}")
    }
}

/// A parsed `roll` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollRequest {
    Chance,
    Pool { dice: u32, again: Again },
}

/// Roll `n` dice, adding one die for every face that explodes under `again`.
/// The pool stops growing at [`MAX_POOL`].
pub fn roll(n: u32, again: Again, source: &mut dyn DieSource) -> Vec<u8> {
    let mut remaining = n as usize;
    let mut faces = Vec::with_capacity(remaining);
    while remaining > 0 && faces.len() < MAX_POOL {
        remaining -= 1;
        let face = source.roll_d10();
        faces.push(face);
        if again.explodes(face) {
            remaining += 1;
        }
    }
    faces
}

pub fn successes(faces: &[u8]) -> usize {
    faces.iter().filter(|&&f| f == 0 || f >= 8).count()
}

pub fn pool_outcome(faces: &[u8]) -> Outcome {
    match successes(faces) {
        0 => Outcome::Failure,
        n if n > 5 => Outcome::ExceptionalSuccess,
        _ => Outcome::Success,
    }
}

pub fn chance_outcome(face: u8) -> Outcome {
    match face {
        1 => Outcome::DramaticFailure,
        0 => Outcome::Success,
        _ => Outcome::Failure,
    }
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?P<dice>[0-9]+|c) ?(?P<again>8a|9a)?").expect("dice pattern is valid")
    })
}

pub fn parse_request(args: &str) -> Result<RollRequest> {
    let caps = pattern()
        .captures(args)
        .ok_or_else(|| CommandError::usage(format!("No number of dice specified: {args}")))?;

    if &caps["dice"] == "c" {
        return Ok(RollRequest::Chance);
    }

    let dice: u32 = caps["dice"]
        .parse()
        .ok()
        .filter(|n| *n <= MAX_DICE)
        .ok_or_else(|| CommandError::usage(format!("Too many dice, the limit is {MAX_DICE}")))?;
    let again = match caps.name("again").map(|m| m.as_str()) {
        Some("8a") => Again::Eight,
        Some("9a") => Again::Nine,
        _ => Again::Ten,
    };
    Ok(RollRequest::Pool { dice, again })
}

fn render(outcome: Outcome, faces: &[u8]) -> String {
    let list: Vec<String> = faces.iter().map(u8::to_string).collect();
    format!("{outcome} ([{}])", list.join(" "))
}

/// Run a `roll` command's argument text against `source`.
pub fn roll_command(args: &str, source: &mut dyn DieSource) -> Result<String> {
    match parse_request(args)? {
        RollRequest::Chance => {
            let faces = vec![source.roll_d10()];
            Ok(render(chance_outcome(faces[0]), &faces))
        }
        RollRequest::Pool { dice, again } => {
            let faces = roll(dice, again, source);
            Ok(render(pool_outcome(&faces), &faces))
        }
    }
}
