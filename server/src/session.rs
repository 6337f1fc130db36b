use crate::journal::{self, Event, ExchangeEntry, Journal, PlayerEntry, StateFlags};
use crate::net::{Endpoint, NetError};
use game_core::card::format_cards;
use game_core::config::SessionConfig;
use game_core::game::{ClassRank, MatchState, SessionState, SEATS};
use game_core::rules::Effects;
use game_core::table::{Table, MARK_PLAYED, MARK_PRESENT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("journal write failed: {0}")]
    Journal(#[from] std::io::Error),
}

/// Accepts exactly five connections; seats follow connection order.
pub async fn accept_players(listener: &TcpListener) -> Result<Vec<Endpoint>, NetError> {
    let mut endpoints = Vec::with_capacity(SEATS);
    for seat in 0..SEATS {
        info!("waiting for seat {seat}...");
        let (stream, addr) = listener.accept().await?;
        let endpoint = Endpoint::handshake(stream, seat).await?;
        info!("seat {seat}: {} ({addr})", endpoint.name);
        endpoints.push(endpoint);
    }
    Ok(endpoints)
}

/// Drives the whole session: deal, exchange, turn loop, scoring, journal.
/// One task owns the match state and every socket; broadcasts are awaited
/// writes in ascending seat order, so the loop itself is the barrier.
pub struct Session {
    endpoints: Vec<Endpoint>,
    config: SessionConfig,
    standing: SessionState,
    journal: Journal,
    rng: StdRng,
    eight_notice: bool,
}

impl Session {
    pub fn new(endpoints: Vec<Endpoint>, config: SessionConfig, journal: Journal) -> Session {
        let seed = config.seed.unwrap_or_else(rand::random);
        debug!("session seed: {seed}");
        Session {
            standing: SessionState::new(config.total_games),
            rng: StdRng::seed_from_u64(seed),
            endpoints,
            config,
            journal,
            eight_notice: false,
        }
    }

    pub async fn run(&mut self) -> Result<[u32; SEATS], SessionError> {
        self.journal.write(&Event::SessionStart {
            timestamp: journal::now_rfc3339(),
            players: self
                .endpoints
                .iter()
                .map(|e| PlayerEntry {
                    id: e.seat,
                    name: e.name.clone(),
                })
                .collect(),
        })?;

        for game_number in 1..=self.standing.total_games {
            self.run_game(game_number).await?;
        }

        let final_points = (0..SEATS)
            .map(|s| (s.to_string(), self.standing.points[s]))
            .collect();
        self.journal.write(&Event::SessionEnd {
            total_games: self.standing.total_games,
            final_points,
            ranking: self.standing.ranking(),
        })?;
        Ok(self.standing.points)
    }

    async fn run_game(&mut self, game_number: u32) -> Result<(), SessionError> {
        let mut state = MatchState::deal(&mut self.rng, game_number, &self.standing);
        self.eight_notice = false;

        if self.config.show_hands {
            for seat in 0..SEATS {
                info!(
                    "game {game_number} seat {seat} hand: {}",
                    format_cards(&state.hands[seat])
                );
            }
        }
        debug!("game {game_number} first player: {}", state.active_seat);

        self.journal.write(&Event::GameStart {
            game: game_number,
            hands: journal::hands_map(&state.hands),
            ranks: self.ranks_map(),
            first_player: state.active_seat,
        })?;

        self.send_snapshots(&state).await?;

        if self.config.rules.card_exchange && game_number > 1 {
            self.exchange_phase(&mut state, game_number).await?;
            self.send_snapshots(&state).await?;
        }

        while !state.is_game_over() {
            self.run_turn(&mut state, game_number).await?;
        }

        let finish_order = state.finalize();
        self.standing.apply_result(&finish_order);
        self.journal.write(&Event::GameEnd {
            game: game_number,
            finish_order: finish_order.clone(),
            new_ranks: self.ranks_map(),
        })?;
        info!("game {game_number} finished: {finish_order:?}");
        Ok(())
    }

    async fn run_turn(
        &mut self,
        state: &mut MatchState,
        game_number: u32,
    ) -> Result<(), SessionError> {
        let seat = state.active_seat;
        let turn = state.begin_turn();

        let query = self.build_query(state, seat);
        self.endpoints[seat].send(&query).await?;
        let response = self.endpoints[seat]
            .recv_deadline(self.config.turn_timeout)
            .await?;

        let submitted = match &response {
            Some(table) => table.cards_with_mark(MARK_PLAYED),
            None => {
                warn!(
                    "seat {seat} timed out after {:?}; forced pass",
                    self.config.turn_timeout
                );
                Vec::new()
            }
        };

        let record = if submitted.is_empty() {
            None
        } else {
            match state.play_turn(seat, submitted.clone(), &self.config.rules) {
                Ok(record) => Some(record),
                Err(reason) => {
                    debug!("seat {seat} illegal play {submitted:?}: {reason:?}; forced pass");
                    None
                }
            }
        };

        match record {
            Some(record) => {
                self.eight_notice = record.effects.eight_cut;
                self.journal_effects(state, game_number, turn, seat, &record.effects)?;
                self.journal.write(&Event::Turn {
                    game: game_number,
                    turn,
                    player: seat,
                    action: "play",
                    cards: format_cards(&submitted),
                    card_type: record.play.kind.as_str(),
                    field: format_cards(&state.field.cards),
                    hands: journal::hands_map(&state.hands),
                    state: self.state_flags(state),
                })?;
                if record.finished {
                    info!("seat {seat} finished in position {}", state.finish_order.len());
                    self.journal.write(&Event::Special {
                        game: game_number,
                        turn,
                        event: "player_finish",
                        player: seat,
                        detail: Some(json!({ "position": state.finish_order.len() })),
                    })?;
                }
                self.broadcast(state, seat).await?;
                if !state.is_game_over() {
                    let cleared = state.advance_after_play(seat, &record.effects);
                    if cleared {
                        self.journal.write(&Event::Special {
                            game: game_number,
                            turn,
                            event: "field_clear",
                            player: state.active_seat,
                            detail: Some(json!({ "reason": "all_passed" })),
                        })?;
                    }
                }
            }
            None => {
                let pass = state.pass_turn(seat, &self.config.rules);
                self.journal.write(&Event::Turn {
                    game: game_number,
                    turn,
                    player: seat,
                    action: "pass",
                    cards: String::new(),
                    card_type: "empty",
                    field: format_cards(&state.field.cards),
                    hands: journal::hands_map(&state.hands),
                    state: self.state_flags(state),
                })?;
                self.broadcast(state, seat).await?;
                if pass.thousand_day {
                    self.journal.write(&Event::Special {
                        game: game_number,
                        turn,
                        event: "field_clear",
                        player: state.active_seat,
                        detail: Some(json!({ "reason": "thousand_day" })),
                    })?;
                } else {
                    let cleared = state.advance();
                    if cleared {
                        self.journal.write(&Event::Special {
                            game: game_number,
                            turn,
                            event: "field_clear",
                            player: state.active_seat,
                            detail: Some(json!({ "reason": "all_passed" })),
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The daifugo picks 2 cards for the daihinmin, the fugo 1 for the
    /// hinmin; a bad submission falls back to the engine's pick. The low
    /// seats return their weakest cards, engine-chosen, counted out before
    /// the incoming cards land.
    async fn exchange_phase(
        &mut self,
        state: &mut MatchState,
        game_number: u32,
    ) -> Result<(), SessionError> {
        let pairs = [
            (ClassRank::Daifugo, ClassRank::Daihinmin, 2usize),
            (ClassRank::Fugo, ClassRank::Hinmin, 1usize),
        ];
        let mut entries = Vec::new();

        for (high, low, count) in pairs {
            let (Some(high_seat), Some(low_seat)) = (
                self.standing.seat_with_class(high),
                self.standing.seat_with_class(low),
            ) else {
                continue;
            };

            let query = self.build_query(state, high_seat);
            self.endpoints[high_seat].send(&query).await?;
            let response = self.endpoints[high_seat]
                .recv_deadline(self.config.turn_timeout)
                .await?;
            let mut give = response
                .map(|t| t.cards_with_mark(MARK_PLAYED))
                .unwrap_or_default();
            if give.len() != count || !give.iter().all(|c| state.hands[high_seat].contains(c)) {
                debug!("seat {high_seat} exchange submission invalid; auto-selecting");
                give = state.auto_give(high_seat, count);
            }

            let back = state.auto_give(low_seat, count);
            state.transfer(high_seat, low_seat, &give);
            state.transfer(low_seat, high_seat, &back);

            entries.push(ExchangeEntry {
                from: high_seat,
                to: low_seat,
                cards: format_cards(&give),
            });
            entries.push(ExchangeEntry {
                from: low_seat,
                to: high_seat,
                cards: format_cards(&back),
            });
        }

        self.journal.write(&Event::Exchange {
            game: game_number,
            exchanges: entries,
            hands_after: journal::hands_map(&state.hands),
        })?;
        Ok(())
    }

    /// Per-seat snapshots carrying each recipient's hand, sent at game start
    /// and again after the exchange. Turn number 0 marks the pre-game phase.
    async fn send_snapshots(&mut self, state: &MatchState) -> Result<(), SessionError> {
        for seat in 0..SEATS {
            let mut table = Table::new();
            self.fill_meta(&mut table, state, state.active_seat);
            table.mark_cards(&state.hands[seat], MARK_PRESENT);
            self.endpoints[seat].send(&table).await?;
        }
        Ok(())
    }

    async fn broadcast(&mut self, state: &MatchState, acted: usize) -> Result<(), SessionError> {
        let mut table = Table::new();
        self.fill_meta(&mut table, state, acted);
        table.mark_cards(&state.field.cards, MARK_PRESENT);
        if state.is_game_over() && state.game_number == self.standing.total_games {
            table.set_session_end(true);
        }
        for endpoint in self.endpoints.iter_mut() {
            endpoint.send(&table).await?;
        }
        Ok(())
    }

    fn build_query(&self, state: &MatchState, seat: usize) -> Table {
        let mut table = Table::new();
        self.fill_meta(&mut table, state, seat);
        table.set_your_turn(true);
        table.mark_cards(&state.field.cards, MARK_PRESENT);
        table.mark_cards(&state.hands[seat], MARK_PRESENT);
        table
    }

    fn fill_meta(&self, table: &mut Table, state: &MatchState, active: usize) {
        table.set_turn(state.turn_counter);
        table.set_active_seat(active);
        table.set_start_of_trick(state.field.is_empty());
        table.set_revolution(state.field.revolution);
        table.set_eleven_back(state.field.eleven_back);
        table.set_eight_cut_notice(self.eight_notice);
        table.set_suit_lock(state.field.suit_lock);
        table.set_game_counters(state.game_number, self.standing.total_games);
        for seat in 0..SEATS {
            table.set_seat_status(seat, state.hands[seat].is_empty(), state.hands[seat].len());
            table.set_seat_class(seat, self.standing.classes[seat].index());
            table.set_seat_points(seat, self.standing.points[seat]);
        }
    }

    fn state_flags(&self, state: &MatchState) -> StateFlags {
        StateFlags {
            revolution: state.field.revolution,
            eleven_back: state.field.eleven_back,
            locked: state.field.suit_lock.is_some(),
        }
    }

    fn journal_effects(
        &mut self,
        state: &MatchState,
        game: u32,
        turn: u32,
        seat: usize,
        effects: &Effects,
    ) -> Result<(), SessionError> {
        if effects.eight_cut {
            info!("eight cut by seat {seat}; field cleared");
            self.journal.write(&Event::Special {
                game,
                turn,
                event: "eight_stop",
                player: seat,
                detail: None,
            })?;
        }
        if effects.revolution {
            info!(
                "revolution by seat {seat}; direction is now {}",
                if state.field.revolution { "inverted" } else { "normal" }
            );
            self.journal.write(&Event::Special {
                game,
                turn,
                event: "revolution",
                player: seat,
                detail: Some(json!({ "active": state.field.revolution })),
            })?;
        }
        if effects.eleven_back {
            self.journal.write(&Event::Special {
                game,
                turn,
                event: "eleven_back",
                player: seat,
                detail: None,
            })?;
        }
        if effects.lock_armed {
            info!("suit lock armed by seat {seat}");
            self.journal.write(&Event::Special {
                game,
                turn,
                event: "lock",
                player: seat,
                detail: None,
            })?;
        }
        if effects.spade3_return {
            self.journal.write(&Event::Special {
                game,
                turn,
                event: "field_clear",
                player: seat,
                detail: Some(json!({ "reason": "spade3_return" })),
            })?;
        }
        Ok(())
    }

    fn ranks_map(&self) -> BTreeMap<String, String> {
        (0..SEATS)
            .map(|s| (s.to_string(), self.standing.classes[s].as_str().to_string()))
            .collect()
    }
}
