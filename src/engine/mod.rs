use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_LIVES, PACMAN_INDEX};
use crate::error::{EngineError, LayoutError};
use crate::layout::Layout;
use crate::state::GameState;
use crate::trace::ExploredTrace;
use crate::types::{Direction, GameOutcome, RuleEvent};

mod ghost_rules;
mod pacman_rules;
mod utils;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    #[default]
    Endless,
    ClassicWin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineOptions {
    #[serde(rename = "startingLives")]
    pub starting_lives: i32,
    #[serde(rename = "roundMode", default)]
    pub round_mode: RoundMode,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            starting_lives: DEFAULT_LIVES,
            round_mode: RoundMode::Endless,
        }
    }
}

impl GameState {
    pub fn legal_actions(&self, agent_index: usize) -> Vec<Direction> {
        if self.is_terminal() {
            return Vec::new();
        }
        if agent_index == PACMAN_INDEX {
            pacman_rules::legal_actions(self)
        } else {
            ghost_rules::legal_actions(self, agent_index)
        }
    }

    pub fn generate_successor(
        &self,
        agent_index: usize,
        action: Direction,
    ) -> Result<GameState, EngineError> {
        if self.is_terminal() {
            return Err(EngineError::TerminalState);
        }
        if agent_index >= self.num_agents() {
            return Err(EngineError::AgentIndex {
                index: agent_index,
                agents: self.num_agents(),
            });
        }

        let mut next = GameState {
            data: self.data.next_turn(),
        };
        if agent_index == PACMAN_INDEX {
            next.data.eaten.iter_mut().for_each(|eaten| *eaten = false);
            pacman_rules::apply_action(&mut next, action)?;
        } else {
            ghost_rules::apply_action(&mut next, action, agent_index)?;
            ghost_rules::decrement_timer(&mut next.data.agents[agent_index]);
        }
        ghost_rules::check_death(&mut next, agent_index);

        next.data.agent_moved = Some(agent_index);
        next.data.score = next.data.score.saturating_add(next.data.score_change);
        Ok(next)
    }

    pub fn generate_successor_traced(
        &self,
        agent_index: usize,
        action: Direction,
        trace: &mut ExploredTrace,
    ) -> Result<GameState, EngineError> {
        let next = self.generate_successor(agent_index, action)?;
        trace.record_expansion(self, &next);
        Ok(next)
    }
}

#[derive(Clone, Debug)]
pub struct GameRules {
    initial: GameState,
    options: EngineOptions,
}

impl GameRules {
    pub fn new_game(
        layout: Arc<Layout>,
        ghost_count: usize,
        options: EngineOptions,
    ) -> Result<Self, LayoutError> {
        let initial = GameState::initialize_with(layout, ghost_count, &options)?;
        Ok(Self { initial, options })
    }

    pub fn initial_state(&self) -> &GameState {
        &self.initial
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn process(&self, state: &GameState) -> GameState {
        let mut next = state.clone();
        if !next.data.round_complete {
            return next;
        }
        match self.options.round_mode {
            RoundMode::Endless => self.start_new_round(&mut next),
            RoundMode::ClassicWin => {
                next.data.round_complete = false;
                if !next.data.lose {
                    next.data.win = true;
                    next.data.events.push(RuleEvent::GameWon);
                }
            }
        }
        next
    }

    fn start_new_round(&self, state: &mut GameState) {
        let initial = &self.initial.data;
        let data = &mut state.data;
        data.lives = data.lives.saturating_add(1);
        data.food = initial.food.clone();
        data.capsules = initial.capsules.clone();
        for agent in data.agents.iter_mut() {
            agent.reset_to_start();
            agent.scared_timer = 0;
            agent.respawn_timer = 0;
        }
        data.win = false;
        data.lose = false;
        data.round_complete = false;
        data.round = data.round.saturating_add(1);
        data.events.push(RuleEvent::RoundStarted {
            round: data.round,
            lives: data.lives,
        });
    }

    pub fn progress(&self, state: &GameState) -> f64 {
        let total = self.initial.num_food();
        if total == 0 {
            return 0.0;
        }
        state.num_food() as f64 / total as f64
    }

    pub fn outcome(state: &GameState) -> Option<GameOutcome> {
        if state.is_lose() {
            Some(GameOutcome::Lost)
        } else if state.is_win() {
            Some(GameOutcome::Won)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pacman_rules::portal_arrival;
    use super::*;
    use crate::constants::RESPAWN_TIME;
    use crate::layout::DEFAULT_LAYOUT;
    use crate::types::{Position, Vec2};

    fn rules_for(rows: &str, ghosts: usize) -> GameRules {
        let layout = Layout::parse(rows).expect("valid layout");
        GameRules::new_game(Arc::new(layout), ghosts, EngineOptions::default())
            .expect("valid game")
    }

    fn place(state: &mut GameState, index: usize, x: f32, y: f32, dir: Direction) {
        state.data.agents[index].config.pos = Position::new(x, y);
        state.data.agents[index].config.dir = dir;
    }

    fn step(state: &GameState, index: usize, action: Direction) -> GameState {
        state
            .generate_successor(index, action)
            .expect("legal transition")
    }

    const CORRIDOR: &str = "%%%%%%%\n%Po G %\n%%%%%%%";

    #[test]
    fn pacman_never_moves_into_walls_and_may_stop() {
        let layout = Layout::builtin(DEFAULT_LAYOUT).expect("builtin layout");
        let rules = GameRules::new_game(Arc::new(layout.clone()), 2, EngineOptions::default())
            .expect("valid game");
        let mut state = rules.initial_state().clone();
        for y in 0..layout.height {
            for x in 0..layout.width {
                let cell = Vec2::new(x, y);
                if layout.is_wall(cell) {
                    continue;
                }
                place(&mut state, 0, x as f32, y as f32, Direction::Stop);
                let actions = state.legal_actions(0);
                assert!(actions.contains(&Direction::Stop), "at {cell:?}");
                for action in actions {
                    assert!(layout.is_passable_for_pacman(cell.step(action)), "at {cell:?}");
                }
            }
        }
    }

    #[test]
    fn ghosts_do_not_stop_or_reverse_unless_cornered() {
        let rules = rules_for("%%%%%\n%P G%\n%%%%%", 1);
        let mut state = rules.initial_state().clone();

        place(&mut state, 1, 2.0, 1.0, Direction::Right);
        assert_eq!(state.legal_actions(1), vec![Direction::Right]);

        // Dead end: reversing is the only way out.
        place(&mut state, 1, 3.0, 1.0, Direction::Right);
        assert_eq!(state.legal_actions(1), vec![Direction::Left]);

        place(&mut state, 1, 2.0, 1.0, Direction::Stop);
        assert_eq!(state.legal_actions(1), vec![Direction::Left, Direction::Right]);
    }

    #[test]
    fn illegal_and_terminal_requests_are_rejected() {
        let rules = rules_for(CORRIDOR, 1);
        let state = rules.initial_state();
        assert_eq!(
            state.generate_successor(0, Direction::Up).err(),
            Some(EngineError::IllegalAction {
                agent: 0,
                action: Direction::Up
            })
        );
        assert_eq!(
            state.generate_successor(1, Direction::Stop).err(),
            Some(EngineError::IllegalAction {
                agent: 1,
                action: Direction::Stop
            })
        );
        assert_eq!(
            state.generate_successor(5, Direction::Stop).err(),
            Some(EngineError::AgentIndex {
                index: 5,
                agents: 2
            })
        );

        let mut lost = state.clone();
        lost.data.lose = true;
        assert!(lost.legal_actions(0).is_empty());
        assert_eq!(
            lost.generate_successor(0, Direction::Stop).err(),
            Some(EngineError::TerminalState)
        );
    }

    #[test]
    fn successors_leave_the_source_untouched() {
        let rules = rules_for(CORRIDOR, 1);
        let state = rules.initial_state().clone();
        let before = state.clone();
        let next = step(&state, 0, Direction::Right);
        assert_eq!(state, before);
        assert_ne!(next, state);
        assert!(state.food().shares_buffer_with(next.food()));
        assert_eq!(next.last_agent_moved(), Some(0));
    }

    #[test]
    fn capsule_fright_shrinks_with_streak() {
        let rules = rules_for(CORRIDOR, 1);
        let mut state = rules.initial_state().clone();
        state.data.ghosts_eaten_in_row = 2;
        let next = step(&state, 0, Direction::Right);
        assert_eq!(next.ghost_states()[0].scared_timer, 36);
        assert_eq!(next.score(), 5);
        assert_eq!(next.last_capsule_eaten(), Some(Vec2::new(2, 1)));
        assert!(next.capsules().is_empty());
    }

    #[test]
    fn eating_a_scared_ghost_scores_and_sends_it_home() {
        let rules = rules_for(CORRIDOR, 1);
        let state = rules.initial_state().clone();

        let state = step(&state, 0, Direction::Right);
        assert_eq!(state.score(), 5);
        assert_eq!(state.ghost_states()[0].scared_timer, 40);

        // Scared ghosts move at half speed and may only continue mid-cell.
        let state = step(&state, 1, Direction::Left);
        assert_eq!(state.ghost_states()[0].position(), Position::new(3.5, 1.0));
        assert_eq!(state.ghost_states()[0].scared_timer, 39);
        assert_eq!(state.legal_actions(1), vec![Direction::Left]);

        let state = step(&state, 0, Direction::Right);
        assert_eq!(state.score(), 25);
        assert_eq!(state.score_change(), 20);
        assert_eq!(state.ghosts_eaten_in_row(), 1);
        assert!(state.was_eaten(1));
        let ghost = &state.ghost_states()[0];
        assert_eq!(ghost.respawn_timer, RESPAWN_TIME);
        assert_eq!(ghost.scared_timer, 0);
        assert_eq!(ghost.position(), Position::new(4.0, 1.0));
        assert!(state.legal_actions(1).is_empty());
        assert_eq!(state.lives(), 3);
    }

    #[test]
    fn respawning_ghosts_wait_out_their_timer_without_colliding() {
        let rules = rules_for(CORRIDOR, 1);
        let mut state = rules.initial_state().clone();
        state.data.agents[1].respawn_timer = RESPAWN_TIME;

        // Walk onto the inert ghost: nothing happens.
        state = step(&state, 0, Direction::Right);
        state = step(&state, 1, Direction::Stop);
        state = step(&state, 0, Direction::Right);
        assert_eq!(state.pacman_position(), Position::new(3.0, 1.0));
        state = step(&state, 0, Direction::Right);
        assert_eq!(state.pacman_position(), Position::new(4.0, 1.0));
        assert_eq!(state.lives(), 3);
        state = step(&state, 0, Direction::Left);

        assert!(state.generate_successor(1, Direction::Left).is_err());
        for _ in 1..RESPAWN_TIME {
            assert!(state.legal_actions(1).is_empty());
            state = step(&state, 1, Direction::Stop);
        }
        assert_eq!(state.ghost_states()[0].respawn_timer, 0);
        assert_eq!(state.ghost_states()[0].position(), Position::new(4.0, 1.0));
        assert_eq!(
            state.legal_actions(1),
            vec![Direction::Left, Direction::Right]
        );
        assert_eq!(state.lives(), 3);
    }

    #[test]
    fn fright_ending_snaps_ghost_to_grid() {
        let rules = rules_for(CORRIDOR, 1);
        let mut state = rules.initial_state().clone();
        state.data.agents[1].scared_timer = 1;
        let state = step(&state, 1, Direction::Left);
        let ghost = &state.ghost_states()[0];
        assert_eq!(ghost.scared_timer, 0);
        assert_eq!(ghost.position(), Position::new(4.0, 1.0));
    }

    #[test]
    fn losing_the_last_life_ends_the_game_in_place() {
        let rules = rules_for("%%%%%\n%P G%\n%%%%%", 1);
        let mut state = rules.initial_state().clone();
        state.data.lives = 1;
        place(&mut state, 1, 2.0, 1.0, Direction::Left);
        let state = step(&state, 0, Direction::Right);
        assert!(state.is_lose());
        assert!(state.is_terminal());
        assert_eq!(state.lives(), 0);
        assert_eq!(state.score(), -500);
        assert_eq!(state.pacman_position(), Position::new(2.0, 1.0));
        assert_eq!(state.ghost_states()[0].position(), Position::new(2.0, 1.0));
        assert_eq!(GameRules::outcome(&state), Some(GameOutcome::Lost));
        assert!(state.events().contains(&RuleEvent::GameLost));
    }

    #[test]
    fn losing_a_spare_life_resets_positions() {
        let rules = rules_for("%%%%%%\n%P  G%\n%%%%%%", 2);
        let mut state = rules.initial_state().clone();
        state.data.ghosts_eaten_in_row = 3;
        state.data.agents[2].respawn_timer = 5;
        state.data.agents[2].scared_timer = 7;
        place(&mut state, 1, 2.0, 1.0, Direction::Left);
        let state = step(&state, 0, Direction::Right);

        assert!(!state.is_terminal());
        assert_eq!(state.lives(), 2);
        assert_eq!(state.score(), 0);
        assert_eq!(state.ghosts_eaten_in_row(), 0);
        assert_eq!(state.pacman_position(), Position::new(1.0, 1.0));
        for ghost in state.ghost_states() {
            assert_eq!(ghost.position(), Position::new(4.0, 1.0));
            assert_eq!(ghost.scared_timer, 0);
        }
        assert_eq!(state.ghost_states()[1].respawn_timer, 5);
    }

    #[test]
    fn clearing_the_board_starts_a_new_round() {
        let rules = rules_for("%%%%%\n%P. %\n%   %\n%  G%\n%%%%%", 1);
        let mut state = rules.initial_state().clone();
        state.data.ghosts_eaten_in_row = 1;
        state.data.agents[1].respawn_timer = 4;

        let state = step(&state, 0, Direction::Right);
        assert!(state.is_round_complete());
        assert_eq!(state.num_food(), 0);
        assert_eq!(rules.progress(rules.initial_state()), 1.0);
        assert_eq!(rules.progress(&state), 0.0);

        let state = rules.process(&state);
        assert!(!state.is_round_complete());
        assert!(!state.is_terminal());
        assert_eq!(state.lives(), 4);
        assert_eq!(state.score(), 1);
        assert_eq!(state.ghosts_eaten_in_row(), 1);
        assert_eq!(state.num_food(), 1);
        assert_eq!(state.round(), 2);
        assert_eq!(state.pacman_position(), Position::new(1.0, 1.0));
        assert_eq!(state.ghost_states()[0].respawn_timer, 0);
        assert!(state.events().contains(&RuleEvent::RoundStarted { round: 2, lives: 4 }));
    }

    #[test]
    fn round_reset_restores_eaten_capsules() {
        let rules = rules_for("%%%%%\n%Po.%\n%%%%%", 0);
        let opening = rules.initial_state().capsules().to_vec();
        assert_eq!(opening, vec![Vec2::new(2, 1)]);

        let state = step(rules.initial_state(), 0, Direction::Right);
        assert!(state.capsules().is_empty());
        let state = step(&state, 0, Direction::Right);
        assert!(state.is_round_complete());
        assert_eq!(state.num_food(), 0);

        let state = rules.process(&state);
        assert_eq!(state.capsules(), opening.as_slice());
        assert_eq!(state.num_food(), 1);
        assert_eq!(state.lives(), 4);
        assert_eq!(state.score(), 6);
    }

    #[test]
    fn simultaneous_contacts_on_the_last_life_charge_one_penalty() {
        let rules = rules_for("%%%%%%\n%P..G%\n%%%%%%", 2);
        let mut state = rules.initial_state().clone();
        state.data.lives = 1;
        place(&mut state, 1, 2.0, 1.0, Direction::Left);
        place(&mut state, 2, 2.0, 1.0, Direction::Left);

        let state = step(&state, 0, Direction::Right);
        assert!(state.is_lose());
        assert_eq!(state.lives(), 0);
        assert_eq!(state.score_change(), 1 - 500);
        assert_eq!(state.score(), -499);
        let events = state.events();
        assert_eq!(events.iter().filter(|e| **e == RuleEvent::GameLost).count(), 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RuleEvent::PacmanCaught { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn clearing_the_board_while_dying_restarts_the_round() {
        let rules = rules_for("%%%%%\n%P.G%\n%%%%%", 1);
        let mut state = rules.initial_state().clone();
        state.data.lives = 1;
        place(&mut state, 1, 2.0, 1.0, Direction::Left);

        let state = step(&state, 0, Direction::Right);
        assert!(state.is_lose());
        assert!(state.is_round_complete());
        assert_eq!(state.lives(), 0);
        assert_eq!(state.score(), 1 - 500);

        let state = rules.process(&state);
        assert!(!state.is_lose());
        assert!(!state.is_terminal());
        assert_eq!(state.lives(), 1);
        assert_eq!(state.score(), 1 - 500);
        assert_eq!(state.num_food(), 1);
        assert_eq!(GameRules::outcome(&state), None);
    }

    #[test]
    fn classic_win_mode_ends_the_game_on_a_clear_board() {
        let layout = Layout::parse("%%%%\n%P.%\n%%%%").expect("valid layout");
        let options = EngineOptions {
            round_mode: RoundMode::ClassicWin,
            ..EngineOptions::default()
        };
        let rules = GameRules::new_game(Arc::new(layout), 0, options).expect("valid game");
        let state = step(rules.initial_state(), 0, Direction::Right);
        let state = rules.process(&state);
        assert!(state.is_win());
        assert_eq!(GameRules::outcome(&state), Some(GameOutcome::Won));
        assert!(state.legal_actions(0).is_empty());
    }

    #[test]
    fn portal_entry_lands_beside_the_paired_portal() {
        let layout = Layout::builtin(DEFAULT_LAYOUT).expect("builtin layout");
        let (top, bottom) = (layout.portals[0], layout.portals[1]);
        let rules = GameRules::new_game(Arc::new(layout.clone()), 0, EngineOptions::default())
            .expect("valid game");
        let mut state = rules.initial_state().clone();
        place(&mut state, 0, top.x as f32, (top.y + 1) as f32, Direction::Left);

        let next = step(&state, 0, Direction::Up);
        let arrival = Vec2::new(bottom.x, bottom.y - 1);
        assert_eq!(next.pacman_position(), arrival.to_position());
        assert_eq!(next.pacman_direction(), Direction::Up);
        assert!(!layout.is_wall(arrival));
        assert!(next.events().contains(&RuleEvent::Teleported {
            from: top,
            to: arrival
        }));
    }

    #[test]
    fn portal_arrival_falls_back_sideways_then_onto_the_portal() {
        let sideways = Layout::parse("%Q%%%\n%P..%\n%...%\n%..%%\n%% Q%").expect("valid layout");
        assert_eq!(portal_arrival(&sideways, Vec2::new(3, 4)), Vec2::new(2, 4));

        let rules = rules_for("%Q%%%\n%P..%\n%...%\n%..%%\n%%%Q%", 0);
        let state = step(rules.initial_state(), 0, Direction::Up);
        assert_eq!(state.pacman_position(), Position::new(3.0, 4.0));
        assert_eq!(state.legal_actions(0), vec![Direction::Stop]);

        // Standing on a portal and waiting sends the agent back through it.
        let state = step(&state, 0, Direction::Stop);
        assert_eq!(state.pacman_position(), Position::new(1.0, 1.0));
    }

    #[test]
    fn traced_successors_record_both_snapshots() {
        let rules = rules_for(CORRIDOR, 1);
        let mut trace = ExploredTrace::new();
        let state = rules.initial_state();
        let next = state
            .generate_successor_traced(0, Direction::Right, &mut trace)
            .expect("legal transition");
        assert_eq!(trace.expansions(), 1);
        assert!(trace.contains(state));
        assert!(trace.contains(&next));
        assert_eq!(trace.len(), 2);
    }
}
