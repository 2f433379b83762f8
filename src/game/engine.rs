use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use super::{
    action::Direction,
    config::GameConfig,
    spawner::spawn_target,
    state::{Arena, CollisionType, GameState, GameStatus, Position, Snake},
};
use crate::error::GameError;

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// Whether the snake ate the food this tick
    pub consumed: bool,
    /// Whether the snake is alive after the tick
    pub alive: bool,
    /// Type of collision if one occurred
    pub collision: Option<CollisionType>,
}

/// The game engine: owns the episode state and advances it one tick at a time
pub struct GameEngine {
    config: GameConfig,
    arena: Arena,
    state: GameState,
    rng: SmallRng,
}

impl GameEngine {
    /// Create a new game engine and start its first episode
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        config
            .validate()
            .map_err(|reason| GameError::InvalidConfig {
                game: "snake",
                reason,
            })?;
        let arena = Arena::new(config.width, config.height, config.cell_size);
        let mut rng = SmallRng::seed_from_u64(seed);
        let state = Self::fresh_state(&config, arena, &mut rng)?;

        Ok(Self {
            config,
            arena,
            state,
            rng,
        })
    }

    /// Create an engine around a prepared state (scripted scenarios, tests)
    pub fn with_state(config: GameConfig, state: GameState, seed: u64) -> Self {
        Self {
            arena: state.arena,
            config,
            state,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Reseed the engine's generator; takes effect from the next spawn
    pub fn seed(&mut self, seed: u64) {
        self.rng = SmallRng::seed_from_u64(seed);
    }

    /// Reset the game to initial state
    pub fn reset(&mut self) -> Result<&GameState, GameError> {
        self.state = Self::fresh_state(&self.config, self.arena, &mut self.rng)?;
        Ok(&self.state)
    }

    /// Advance the game by one tick
    ///
    /// Ticking a dead game is ignored and leaves the state untouched.
    pub fn tick(&mut self, direction: Direction) -> Result<TickOutcome, GameError> {
        if self.state.status == GameStatus::Dead {
            debug!(steps = self.state.steps, "tick after death ignored");
            return Ok(TickOutcome {
                consumed: false,
                alive: false,
                collision: None,
            });
        }

        self.state.snake.set_intended_direction(direction);
        let consumed = self.state.snake.next_head(self.arena.cell_size) == self.state.food;
        if consumed {
            self.state.snake.grow();
        }
        let collision = self.state.snake.advance(&self.arena);
        self.state.steps += 1;

        if let Some(collision) = collision {
            self.state.status = GameStatus::Dead;
            debug!(?collision, steps = self.state.steps, "snake died");
            return Ok(TickOutcome {
                consumed: false,
                alive: false,
                collision: Some(collision),
            });
        }

        if consumed {
            self.state.score += 1;
            let occupied: HashSet<Position> = self.state.snake.segments().copied().collect();
            match spawn_target(&self.arena, &occupied, &mut self.rng) {
                Ok(food) => self.state.food = food,
                Err(err) => {
                    self.state.status = GameStatus::Dead;
                    return Err(err);
                }
            }
        }

        Ok(TickOutcome {
            consumed,
            alive: true,
            collision: None,
        })
    }

    /// Put a fresh snake back into the current episode after a death,
    /// keeping score and step counter
    pub fn respawn_snake(&mut self) -> Result<(), GameError> {
        let mut excluded = HashSet::new();
        excluded.insert(self.state.food);
        let head = spawn_target(&self.arena, &excluded, &mut self.rng)?;
        self.state.snake = Snake::new(head, Direction::Right, self.config.velocity);
        self.state.status = GameStatus::Active;
        Ok(())
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    fn fresh_state(
        config: &GameConfig,
        arena: Arena,
        rng: &mut SmallRng,
    ) -> Result<GameState, GameError> {
        let head = spawn_target(&arena, &HashSet::new(), rng)?;
        let snake = Snake::new(head, Direction::Right, config.velocity);

        let occupied: HashSet<Position> = snake.segments().copied().collect();
        let food = spawn_target(&arena, &occupied, rng)?;

        Ok(GameState::new(snake, food, arena))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(snake: Snake, food: Position) -> GameEngine {
        let config = GameConfig::default();
        let arena = Arena::new(config.width, config.height, config.cell_size);
        GameEngine::with_state(config, GameState::new(snake, food, arena), 3)
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = GameConfig::small();
        config.cell_size = 0;

        assert!(matches!(
            GameEngine::new(config, 0),
            Err(GameError::InvalidConfig { game: "snake", .. })
        ));
    }

    #[test]
    fn test_reset() {
        let mut engine = GameEngine::new(GameConfig::default(), 0).unwrap();
        for _ in 0..50 {
            let state = engine.reset().unwrap();

            assert!(state.is_alive());
            assert_eq!(state.score, 0);
            assert_eq!(state.steps, 0);
            assert_eq!(state.snake.len(), 1);
            assert_eq!(state.snake.direction(), Direction::Right);
            assert!(!state.snake.is_growing());
            assert!(!state.is_occupied_by_snake(state.food));
        }
    }

    #[test]
    fn test_basic_movement() {
        let mut engine = engine_with(
            Snake::new(Position::new(100, 100), Direction::Right, 1),
            Position::new(500, 500),
        );

        let outcome = engine.tick(Direction::Right).unwrap();

        assert!(outcome.alive);
        assert!(!outcome.consumed);
        assert_eq!(engine.state().steps, 1);
        assert_eq!(engine.state().snake.head(), Position::new(110, 100));
    }

    #[test]
    fn test_food_consumption() {
        let mut engine = engine_with(
            Snake::new(Position::new(100, 100), Direction::Right, 1),
            Position::new(110, 100),
        );

        let outcome = engine.tick(Direction::Right).unwrap();
        assert!(outcome.consumed);
        assert_eq!(engine.state().score, 1);
        assert_eq!(engine.state().snake.len(), 2);
        assert_eq!(engine.state().snake.tail(), Position::new(100, 100));
        assert_ne!(engine.state().food, Position::new(110, 100));
        assert!(!engine.state().is_occupied_by_snake(engine.state().food));

        engine.tick(Direction::Right).unwrap();
        assert_eq!(engine.state().snake.len(), 2);
        assert!(!engine.state().snake.is_growing());
    }

    #[test]
    fn test_wall_collision() {
        let mut engine = engine_with(
            Snake::new(Position::new(0, 10), Direction::Up, 1),
            Position::new(500, 500),
        );

        let outcome = engine.tick(Direction::Left).unwrap();

        assert!(!outcome.alive);
        assert_eq!(outcome.collision, Some(CollisionType::Wall));
        assert_eq!(engine.state().status, GameStatus::Dead);
    }

    #[test]
    fn test_prevent_180_degree_turn() {
        let mut engine = engine_with(
            Snake::new(Position::new(100, 100), Direction::Right, 1),
            Position::new(500, 500),
        );

        engine.tick(Direction::Left).unwrap();

        assert_eq!(engine.state().snake.direction(), Direction::Right);
        assert_eq!(engine.state().snake.head(), Position::new(110, 100));
    }

    #[test]
    fn test_terminated_game_no_update() {
        let mut engine = engine_with(
            Snake::new(Position::new(0, 10), Direction::Left, 1),
            Position::new(500, 500),
        );
        engine.tick(Direction::Left).unwrap();
        let snapshot = engine.state().clone();

        let outcome = engine.tick(Direction::Down).unwrap();

        assert!(!outcome.alive);
        assert!(!outcome.consumed);
        assert_eq!(outcome.collision, None);
        assert_eq!(engine.state(), &snapshot);
    }

    #[test]
    fn test_spawn_exhaustion_ends_episode() {
        // 2x1 arena: eating the only free cell leaves nowhere for new food
        let config = GameConfig {
            width: 20,
            height: 10,
            ..GameConfig::default()
        };
        let arena = Arena::new(20, 10, 10);
        let snake = Snake::new(Position::new(0, 0), Direction::Right, 1);
        let state = GameState::new(snake, Position::new(10, 0), arena);
        let mut engine = GameEngine::with_state(config, state, 0);

        let err = engine.tick(Direction::Right).unwrap_err();
        assert!(matches!(err, GameError::SpawnExhaustion { .. }));
        assert_eq!(engine.state().status, GameStatus::Dead);
    }

    #[test]
    fn test_respawn_snake_keeps_counters() {
        let mut engine = engine_with(
            Snake::new(Position::new(0, 10), Direction::Left, 1),
            Position::new(500, 500),
        );
        engine.tick(Direction::Left).unwrap();
        engine.respawn_snake().unwrap();

        let state = engine.state();
        assert!(state.is_alive());
        assert_eq!(state.steps, 1);
        assert_eq!(state.snake.len(), 1);
        assert_ne!(state.snake.head(), state.food);
    }

    #[test]
    fn test_same_seed_same_episode() {
        let mut a = GameEngine::new(GameConfig::small(), 11).unwrap();
        let mut b = GameEngine::new(GameConfig::small(), 11).unwrap();

        for _ in 0..5 {
            assert_eq!(a.reset().unwrap(), b.reset().unwrap());
        }
    }
}
