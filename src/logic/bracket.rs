//! Bracket generation: seed participants into a single-elimination bracket or a free-for-all lobby.

use crate::logic::match_state::{advance_slot, bye_carry};
use crate::models::{
    Bracket, GameMatch, GameType, MatchStatus, Participant, Slot, Tournament, TournamentError,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Order in which participants fill the round-1 slots.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seeding {
    /// Registration order.
    #[default]
    Registration,
    Shuffled,
}

impl FromStr for Seeding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "registration" => Ok(Seeding::Registration),
            "shuffled" | "random" => Ok(Seeding::Shuffled),
            other => Err(format!("unknown seeding '{other}'")),
        }
    }
}

/// Build every match of the tournament.
///
/// 1. Free-for-all: a single lobby match.
/// 2. Bracket modes: bracket size is the next power of two and the missing entrants are
///    BYEs. All rounds are created upfront, match `(round, i)` feeding `(round + 1, i / 2)`.
/// 3. BYE matches complete right away and their winner (or the BYE itself) moves on,
///    so chains of BYEs are resolved before this returns.
pub fn generate_bracket(
    tournament: &Tournament,
    game_type: GameType,
    participants: &[Participant],
    seeding: Seeding,
) -> Result<Bracket, TournamentError> {
    if tournament.bracket_generated {
        return Err(TournamentError::BracketAlreadyGenerated);
    }
    if participants.len() < 2 {
        return Err(TournamentError::NotEnoughParticipants {
            count: participants.len(),
        });
    }
    if game_type.is_free_for_all() {
        return Ok(Bracket::new(vec![GameMatch::lobby(tournament.id)]));
    }

    let mut seeds: Vec<Slot> = participants
        .iter()
        .map(|p| Slot::Participant(p.id))
        .collect();
    if seeding == Seeding::Shuffled {
        seeds.shuffle(&mut rand::thread_rng());
    }
    let size = seeds.len().next_power_of_two();
    let rounds = size.trailing_zeros();
    let slots = first_round_slots(&seeds, size);

    let mut matches: Vec<GameMatch> = slots
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| GameMatch::new(tournament.id, 1, i as u32, pair[0], pair[1]))
        .collect();
    for round in 2..=rounds {
        let count = size >> round;
        matches.extend(
            (0..count).map(|i| GameMatch::new(tournament.id, round, i as u32, Slot::Empty, Slot::Empty)),
        );
    }

    let mut bracket = Bracket::new(matches);
    resolve_byes(&mut bracket);
    log::debug!(
        "Generated {} matches over {} rounds for tournament {}",
        bracket.matches.len(),
        rounds,
        tournament.id
    );
    Ok(bracket)
}

/// Round-1 slots in seed order. The BYEs go to the last matches, one per match, so no
/// match is BYE against BYE: `[1, 2, 3, BYE, 4, BYE, 5, BYE]` for five entrants.
fn first_round_slots(seeds: &[Slot], size: usize) -> Vec<Slot> {
    let byes = size - seeds.len();
    let full_matches = size / 2 - byes;
    let (paired, single) = seeds.split_at(full_matches * 2);
    let mut slots = paired.to_vec();
    for &seed in single {
        slots.push(seed);
        slots.push(Slot::Bye);
    }
    slots
}

/// Complete every match that has a BYE side and both sides known, carrying the present
/// side (or the BYE, when both are BYEs) into the next round. Matches are stored round by
/// round, so one pass settles whole chains.
fn resolve_byes(bracket: &mut Bracket) {
    for pos in 0..bracket.matches.len() {
        let game = &bracket.matches[pos];
        if game.status == MatchStatus::Completed {
            continue;
        }
        let Some(carried) = bye_carry(game) else {
            continue;
        };
        let game = &mut bracket.matches[pos];
        game.status = MatchStatus::Completed;
        game.winner = carried.participant();
        advance_slot(bracket, pos, carried);
    }
}
