//! Engine entry points: each admin action loads documents, runs the pure logic, writes the
//! changed documents back and then recomputes the tournament status.

use crate::config::Config;
use crate::external::{
    ExternalMatch, HttpStatsProvider, LogNotifier, Notifier, StatsProvider, TtlCache, UnconfiguredStatsProvider,
    WebhookNotifier,
};
use crate::logic::{self, ImportSummary, MatchDetailsPatch, MatchStatsView, Seeding, Standing};
use crate::models::{
    Bracket, GameMatch, GameType, MatchId, MatchStatus, Participant, ParticipantId, RosterEntry,
    Side, Tournament, TournamentError, TournamentId, TournamentStatus,
};
use crate::store::Store;
use std::sync::Arc;

type Result<T> = std::result::Result<T, TournamentError>;

/// Engine options that come from configuration.
#[derive(Clone, Debug, Default)]
pub struct EngineSettings {
    pub seeding: Seeding,
    pub notify_channel: String,
    pub notify_role: Option<String>,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            seeding: config.seeding,
            notify_channel: config.notify_channel.clone(),
            notify_role: config.notify_role.clone(),
        }
    }
}

pub struct Engine {
    store: Arc<dyn Store>,
    stats: Arc<dyn StatsProvider>,
    notifier: Arc<dyn Notifier>,
    settings: EngineSettings,
}

impl Engine {
    pub fn new(
        store: Arc<dyn Store>,
        stats: Arc<dyn StatsProvider>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            stats,
            notifier,
            settings,
        }
    }

    /// Wire the HTTP stats provider and webhook notifier when configured, log-only otherwise.
    pub fn from_config(config: &Config, store: Arc<dyn Store>) -> Self {
        let stats: Arc<dyn StatsProvider> = match &config.stats_api_url {
            Some(url) => Arc::new(HttpStatsProvider::new(
                url.clone(),
                config.stats_api_key.clone(),
                Arc::new(TtlCache::<String, ExternalMatch>::new(config.stats_cache_ttl)),
            )),
            None => Arc::new(UnconfiguredStatsProvider),
        };
        let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
            None => Arc::new(LogNotifier),
        };
        Self::new(store, stats, notifier, EngineSettings::from(config))
    }

    async fn load_tournament(&self, id: TournamentId) -> Result<Tournament> {
        self.store
            .get_tournament(id)
            .await?
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    async fn load_match(&self, id: MatchId) -> Result<GameMatch> {
        self.store
            .get_match(id)
            .await?
            .ok_or(TournamentError::MatchNotFound(id))
    }

    async fn load_participant(&self, id: ParticipantId) -> Result<Participant> {
        self.store
            .get_participant(id)
            .await?
            .ok_or(TournamentError::ParticipantNotFound(id))
    }

    /// The match's whole tournament as an arena, plus the match position in it.
    async fn load_bracket_of(&self, match_id: MatchId) -> Result<(Bracket, usize)> {
        let game = self.load_match(match_id).await?;
        let bracket = Bracket::new(self.store.list_matches(game.tournament_id).await?);
        let pos = bracket
            .position(match_id)
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        Ok((bracket, pos))
    }

    /// Recompute the tournament status from its matches and store it if it changed.
    async fn refresh_status(
        &self,
        tournament_id: TournamentId,
        before: &[GameMatch],
        after: &[GameMatch],
    ) -> Result<TournamentStatus> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        if let Some(warning) = logic::check_consistency(tournament.status, before) {
            log::warn!(
                "Tournament {} status was {:?} but its matches say {:?}; recomputing",
                tournament_id,
                warning.stored,
                warning.expected
            );
        }
        let status = logic::next_status(tournament.status, after);
        let generated = !after.is_empty();
        if status != tournament.status || generated != tournament.bracket_generated {
            log::info!("Tournament {} status {:?} -> {:?}", tournament_id, tournament.status, status);
            tournament.status = status;
            tournament.bracket_generated = generated;
            self.store.put_tournament(&tournament).await?;
        }
        Ok(status)
    }

    /// Best-effort chat message; failures are logged and never fail the action.
    async fn notify(&self, message: &str) {
        let role = self.settings.notify_role.as_deref();
        if let Err(e) = self.notifier.send(&self.settings.notify_channel, message, role).await {
            log::warn!("Notification failed (ignored): {}", e);
        }
    }

    async fn participant_name(&self, id: Option<ParticipantId>) -> String {
        let Some(id) = id else {
            return "TBD".to_string();
        };
        match self.store.get_participant(id).await {
            Ok(Some(p)) => p.display_name,
            _ => id.to_string(),
        }
    }

    pub async fn create_tournament(
        &self,
        name: &str,
        game_type: GameType,
        max_participants: u32,
    ) -> Result<Tournament> {
        let tournament = Tournament::new(name.trim(), game_type, max_participants);
        self.store.put_tournament(&tournament).await?;
        log::info!("Created tournament {} ({:?})", tournament.id, game_type);
        Ok(tournament)
    }

    pub async fn get_tournament(&self, id: TournamentId) -> Result<Tournament> {
        self.load_tournament(id).await
    }

    pub async fn register_participant(
        &self,
        tournament_id: TournamentId,
        display_name: &str,
        roster: Vec<RosterEntry>,
    ) -> Result<Participant> {
        self.load_tournament(tournament_id).await?;
        let participant = Participant::new(tournament_id, display_name.trim()).with_roster(roster);
        self.store.put_participant(&participant).await?;
        Ok(participant)
    }

    pub async fn list_participants(&self, tournament_id: TournamentId) -> Result<Vec<Participant>> {
        self.load_tournament(tournament_id).await?;
        Ok(self.store.list_participants(tournament_id).await?)
    }

    pub async fn list_matches(&self, tournament_id: TournamentId) -> Result<Vec<GameMatch>> {
        self.load_tournament(tournament_id).await?;
        Ok(self.store.list_matches(tournament_id).await?)
    }

    /// Generate and store every match of the tournament.
    pub async fn create_bracket(
        &self,
        tournament_id: TournamentId,
        participants: &[Participant],
        game_type: GameType,
    ) -> Result<Vec<GameMatch>> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        if let Some(stranger) = participants.iter().find(|p| p.tournament_id != tournament_id) {
            return Err(TournamentError::ParticipantNotFound(stranger.id));
        }
        if !self.store.list_matches(tournament_id).await?.is_empty() {
            return Err(TournamentError::BracketAlreadyGenerated);
        }
        let bracket = logic::generate_bracket(&tournament, game_type, participants, self.settings.seeding)?;
        for game in &bracket.matches {
            self.store.put_match(game).await?;
        }

        tournament.game_type = game_type;
        tournament.bracket_generated = true;
        tournament.status = logic::next_status(tournament.status, &bracket.matches);
        self.store.put_tournament(&tournament).await?;
        log::info!(
            "Bracket generated for tournament {}: {} participants, {} matches",
            tournament_id,
            participants.len(),
            bracket.matches.len()
        );
        Ok(bracket.into_matches())
    }

    pub async fn update_match_status(&self, match_id: MatchId, status: MatchStatus) -> Result<()> {
        let (mut bracket, pos) = self.load_bracket_of(match_id).await?;
        let before = bracket.matches.clone();
        if !logic::set_status(&mut bracket.matches[pos], status)? {
            return Ok(());
        }
        self.store.put_match(&bracket.matches[pos]).await?;
        self.refresh_status(bracket.matches[pos].tournament_id, &before, &bracket.matches)
            .await?;
        Ok(())
    }

    /// Finalize a bracket match and move its winner into the next round.
    pub async fn finalize_match(&self, match_id: MatchId, score_a: u32, score_b: u32) -> Result<()> {
        let (mut bracket, pos) = self.load_bracket_of(match_id).await?;
        let before = bracket.matches.clone();
        let touched = logic::finalize(&mut bracket, match_id, score_a, score_b)?;
        for &changed in &touched {
            self.store.put_match(&bracket.matches[changed]).await?;
        }
        let game = &bracket.matches[pos];
        self.refresh_status(game.tournament_id, &before, &bracket.matches)
            .await?;
        log::info!(
            "Match {} (round {}, #{}) finalized {}-{}",
            match_id,
            game.round,
            game.match_index,
            score_a,
            score_b
        );

        let name_a = self.participant_name(game.participant_on(Side::A)).await;
        let name_b = self.participant_name(game.participant_on(Side::B)).await;
        let winner = self.participant_name(game.winner).await;
        let outcome = if touched.len() > 1 {
            format!("{winner} advances to round {}.", game.round + 1)
        } else {
            format!("{winner} wins the tournament!")
        };
        self.notify(&format!(
            "Round {} match {}: {} {} - {} {}. {}",
            game.round,
            game.match_index + 1,
            name_a,
            score_a,
            score_b,
            name_b,
            outcome
        ))
        .await;
        Ok(())
    }

    /// Back to scheduled with scores and stats cleared; an advanced winner stays advanced.
    pub async fn reset_match(&self, match_id: MatchId) -> Result<()> {
        let (mut bracket, pos) = self.load_bracket_of(match_id).await?;
        let before = bracket.matches.clone();
        logic::match_state::reset(&mut bracket.matches[pos]);
        self.store.put_match(&bracket.matches[pos]).await?;
        self.refresh_status(bracket.matches[pos].tournament_id, &before, &bracket.matches)
            .await?;
        log::info!("Match {} reset", match_id);
        Ok(())
    }

    /// Delete every match of the tournament, then recompute the tournament with no
    /// matches (bracket flag cleared). Safe to repeat, also once the tournament is gone.
    pub async fn delete_matches(&self, tournament_id: TournamentId) -> Result<()> {
        let matches = self.store.list_matches(tournament_id).await?;
        for game in &matches {
            self.store.delete_match(game.id).await?;
        }
        log::info!("Deleted {} matches of tournament {}", matches.len(), tournament_id);
        if self.store.get_tournament(tournament_id).await?.is_some() {
            self.refresh_status(tournament_id, &matches, &[]).await?;
        }
        Ok(())
    }

    /// Delete the bracket and put the tournament back to open.
    pub async fn reset_bracket(&self, tournament_id: TournamentId) -> Result<()> {
        self.load_tournament(tournament_id).await?;
        self.delete_matches(tournament_id).await?;
        let mut tournament = self.load_tournament(tournament_id).await?;
        tournament.clear_bracket();
        self.store.put_tournament(&tournament).await?;
        for mut participant in self.store.list_participants(tournament_id).await? {
            if participant.placement.take().is_some() {
                self.store.put_participant(&participant).await?;
            }
        }
        log::info!("Bracket of tournament {} reset", tournament_id);
        Ok(())
    }

    /// Delete the tournament with its matches and participants. Deleting a tournament
    /// that is already gone succeeds.
    pub async fn delete_tournament(&self, tournament_id: TournamentId) -> Result<()> {
        self.delete_matches(tournament_id).await?;
        for participant in self.store.list_participants(tournament_id).await? {
            self.store.delete_participant(participant.id).await?;
        }
        self.store.delete_tournament(tournament_id).await?;
        log::info!("Tournament {} deleted", tournament_id);
        Ok(())
    }

    /// Admin override of the tournament status. The next match mutation recomputes it.
    pub async fn set_tournament_status(&self, tournament_id: TournamentId, status: TournamentStatus) -> Result<Tournament> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        tournament.status = status;
        self.store.put_tournament(&tournament).await?;
        Ok(tournament)
    }

    pub async fn start_match_veto(&self, match_id: MatchId) -> Result<()> {
        let mut game = self.load_match(match_id).await?;
        logic::match_state::start_veto(&mut game)?;
        self.store.put_match(&game).await?;
        Ok(())
    }

    pub async fn update_match_details(&self, match_id: MatchId, patch: MatchDetailsPatch) -> Result<GameMatch> {
        let (mut bracket, pos) = self.load_bracket_of(match_id).await?;
        let before = bracket.matches.clone();
        let change = logic::apply_details(&mut bracket.matches[pos], patch)?;
        self.store.put_match(&bracket.matches[pos]).await?;
        let game = bracket.matches[pos].clone();
        self.refresh_status(game.tournament_id, &before, &bracket.matches)
            .await?;

        if change.party_code_changed && !game.party_code.is_empty() {
            let name_a = self.participant_name(game.participant_on(Side::A)).await;
            let name_b = self.participant_name(game.participant_on(Side::B)).await;
            self.notify(&format!(
                "Party code for {} vs {} (round {}): {}",
                name_a, name_b, game.round, game.party_code
            ))
            .await;
        }
        Ok(game)
    }

    pub async fn parse_player_stats(&self, match_id: MatchId) -> Result<MatchStatsView> {
        let game = self.load_match(match_id).await?;
        Ok(logic::parse_player_stats(&game))
    }

    /// Pull one map from the stats provider into the match (map 0 when none is given).
    pub async fn import_match_result(
        &self,
        match_id: MatchId,
        external_match_id: &str,
        map_index: Option<usize>,
    ) -> Result<ImportSummary> {
        let (mut bracket, pos) = self.load_bracket_of(match_id).await?;
        let before = bracket.matches.clone();
        let game = &bracket.matches[pos];
        let (Some(id_a), Some(id_b)) = (game.participant_on(Side::A), game.participant_on(Side::B)) else {
            return Err(TournamentError::SideNotReady);
        };
        let side_a = self.load_participant(id_a).await?;
        let side_b = self.load_participant(id_b).await?;

        let payload = self.stats.fetch_match(external_match_id).await?;
        let summary = logic::import_external_result(
            &mut bracket.matches[pos],
            &side_a.roster_names(),
            &side_b.roster_names(),
            &payload,
            map_index.unwrap_or(0),
        )?;
        self.store.put_match(&bracket.matches[pos]).await?;
        self.refresh_status(bracket.matches[pos].tournament_id, &before, &bracket.matches)
            .await?;
        log::info!(
            "Imported external match {} into match {} map {} ({} players matched)",
            external_match_id,
            match_id,
            summary.map_index,
            summary.matched.len()
        );
        Ok(summary)
    }

    pub async fn update_participant_score(&self, participant_id: ParticipantId, kills: u32, deaths: u32) -> Result<Participant> {
        let mut participant = self.load_participant(participant_id).await?;
        participant.set_score(kills, deaths);
        self.store.put_participant(&participant).await?;
        Ok(participant)
    }

    /// Record free-for-all placements. The lobby match is completed separately.
    pub async fn finalize_deathmatch(
        &self,
        tournament_id: TournamentId,
        winner_id: ParticipantId,
        runner_up_id: ParticipantId,
    ) -> Result<Tournament> {
        let mut tournament = self.load_tournament(tournament_id).await?;
        let mut participants = self.store.list_participants(tournament_id).await?;
        let changed = logic::finalize_placements(&mut tournament, &mut participants, winner_id, runner_up_id)?;
        for pos in changed {
            self.store.put_participant(&participants[pos]).await?;
        }
        self.store.put_tournament(&tournament).await?;
        log::info!("Deathmatch {} finalized: winner {}, runner-up {}", tournament_id, winner_id, runner_up_id);
        Ok(tournament)
    }

    pub async fn standings(&self, tournament_id: TournamentId) -> Result<Vec<Standing>> {
        let participants = self.list_participants(tournament_id).await?;
        Ok(logic::standings(&participants))
    }

    pub async fn standings_csv(&self, tournament_id: TournamentId) -> Result<String> {
        let rows = self.standings(tournament_id).await?;
        Ok(logic::standings_csv(&rows)?)
    }
}
