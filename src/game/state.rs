use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::action::Direction;

/// A cell-aligned position on the playfield, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position `distance` pixels in a direction
    pub fn moved_in_direction(&self, direction: Direction, distance: i32) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx * distance, dy * distance)
    }

    /// Squared euclidean distance to another position
    pub fn squared_distance(&self, other: Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

/// Fixed-size playfield, immutable for the lifetime of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    pub width: i32,
    pub height: i32,
    pub cell_size: i32,
}

impl Arena {
    pub fn new(width: i32, height: i32, cell_size: i32) -> Self {
        Self {
            width,
            height,
            cell_size,
        }
    }

    /// Check if a position lies fully inside the playfield
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x + self.cell_size <= self.width
            && pos.y >= 0
            && pos.y + self.cell_size <= self.height
    }

    pub fn columns(&self) -> i32 {
        self.width / self.cell_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.cell_size
    }

    /// Total number of cells
    pub fn cell_count(&self) -> usize {
        (self.columns().max(0) as usize) * (self.rows().max(0) as usize)
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows()).flat_map(move |row| {
            (0..self.columns())
                .map(move |col| Position::new(col * self.cell_size, row * self.cell_size))
        })
    }

    /// Uniformly sample a cell-aligned position
    pub fn random_cell<R: Rng>(&self, rng: &mut R) -> Position {
        let col = rng.gen_range(0..self.columns());
        let row = rng.gen_range(0..self.rows());
        Position::new(col * self.cell_size, row * self.cell_size)
    }

    /// Largest squared distance between two cells of this arena
    pub fn max_squared_distance(&self) -> i64 {
        let w = (self.width - self.cell_size) as i64;
        let h = (self.height - self.cell_size) as i64;
        w * w + h * h
    }
}

/// Type of collision that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionType {
    /// Snake left the arena
    Wall,
    /// Snake hit itself
    SelfCollision,
}

/// The snake in the game
///
/// The body is a ring buffer with the head at the front, so growing and
/// shrinking are both O(1).
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    pending_direction: Direction,
    velocity: i32,
    growing: bool,
    alive: bool,
}

impl Snake {
    /// Create a snake of length 1
    pub fn new(head: Position, direction: Direction, velocity: i32) -> Self {
        Self::from_segments([head], direction, velocity)
    }

    /// Create a snake from explicit segments, head first
    ///
    /// Panics if `segments` is empty.
    pub fn from_segments(
        segments: impl IntoIterator<Item = Position>,
        direction: Direction,
        velocity: i32,
    ) -> Self {
        let body: VecDeque<Position> = segments.into_iter().collect();
        assert!(!body.is_empty(), "a snake needs at least one segment");

        Self {
            body,
            direction,
            pending_direction: direction,
            velocity,
            growing: false,
            alive: true,
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// Get the tail position (last segment)
    pub fn tail(&self) -> Position {
        self.body[self.body.len() - 1]
    }

    /// Iterate over all segments, head first
    pub fn segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter()
    }

    /// Iterate over body segments (excluding head)
    pub fn body_segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter().skip(1)
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().any(|&segment| segment == pos)
    }

    /// Check if position is occupied by any segment
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn pending_direction(&self) -> Direction {
        self.pending_direction
    }

    pub fn velocity(&self) -> i32 {
        self.velocity
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Buffer the direction for the next advance
    ///
    /// A direct reversal of the current direction is ignored.
    pub fn set_intended_direction(&mut self, direction: Direction) {
        if !self.direction.is_opposite(direction) {
            self.pending_direction = direction;
        }
    }

    /// Where the head lands on the next advance
    pub fn next_head(&self, cell_size: i32) -> Position {
        self.head()
            .moved_in_direction(self.pending_direction, self.velocity * cell_size)
    }

    /// Grow by one segment on the next advance
    pub fn grow(&mut self) {
        self.growing = true;
    }

    /// Move one tick in the buffered direction
    ///
    /// Returns the collision that killed the snake this tick, if any. A dead
    /// snake does not move.
    pub fn advance(&mut self, arena: &Arena) -> Option<CollisionType> {
        if !self.alive {
            return None;
        }

        let new_head = self.next_head(arena.cell_size);
        self.direction = self.pending_direction;
        self.body.push_front(new_head);

        if self.growing {
            self.growing = false;
        } else {
            self.body.pop_back();
        }

        let collision = if !arena.contains(new_head) {
            Some(CollisionType::Wall)
        } else if self.collides_with_body(new_head) {
            Some(CollisionType::SelfCollision)
        } else {
            None
        };

        if collision.is_some() {
            self.alive = false;
        }

        collision
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false: a snake keeps at least its head
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Lifecycle status of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Active,
    Dead,
}

/// Complete game state
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub snake: Snake,
    pub food: Position,
    pub arena: Arena,
    pub score: u32,
    pub steps: u32,
    pub status: GameStatus,
}

impl GameState {
    /// Create a new game state
    pub fn new(snake: Snake, food: Position, arena: Arena) -> Self {
        Self {
            snake,
            food,
            arena,
            score: 0,
            steps: 0,
            status: GameStatus::Active,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == GameStatus::Active
    }

    /// Check if a position is occupied by the snake
    pub fn is_occupied_by_snake(&self, pos: Position) -> bool {
        self.snake.occupies(pos)
    }

    /// Squared distance from the snake head to the food
    pub fn food_distance(&self) -> i64 {
        self.snake.head().squared_distance(self.food)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(200, 200, 10)
    }

    #[test]
    fn test_position_movement() {
        let pos = Position::new(50, 50);
        assert_eq!(pos.moved_by(10, 0), Position::new(60, 50));
        assert_eq!(pos.moved_in_direction(Direction::Up, 10), Position::new(50, 40));
        assert_eq!(pos.moved_in_direction(Direction::Left, 20), Position::new(30, 50));
        assert_eq!(pos.squared_distance(Position::new(80, 90)), 30 * 30 + 40 * 40);
    }

    #[test]
    fn test_bounds_checking() {
        let arena = arena();
        assert!(arena.contains(Position::new(0, 0)));
        assert!(arena.contains(Position::new(190, 190)));
        assert!(!arena.contains(Position::new(-10, 0)));
        assert!(!arena.contains(Position::new(200, 0)));
        assert!(!arena.contains(Position::new(0, 200)));
        assert_eq!(arena.cell_count(), 400);
        assert_eq!(arena.cells().count(), 400);
        assert_eq!(arena.max_squared_distance(), 2 * 190 * 190);
    }

    #[test]
    fn test_snake_movement_each_direction() {
        let arena = arena();
        for direction in Direction::ALL {
            let mut snake = Snake::new(Position::new(100, 100), Direction::Up, 1);
            snake.set_intended_direction(direction);
            let expected_direction = if direction == Direction::Down {
                Direction::Up
            } else {
                direction
            };

            assert_eq!(snake.advance(&arena), None);
            assert_eq!(snake.direction(), expected_direction);
            assert_eq!(
                snake.head(),
                Position::new(100, 100).moved_in_direction(expected_direction, 10)
            );
        }
    }

    #[test]
    fn test_velocity_scales_displacement() {
        let arena = arena();
        let mut snake = Snake::new(Position::new(100, 100), Direction::Right, 3);
        snake.advance(&arena);
        assert_eq!(snake.head(), Position::new(130, 100));
    }

    #[test]
    fn test_reversal_rejected() {
        let arena = arena();
        let mut snake = Snake::new(Position::new(100, 100), Direction::Right, 1);
        snake.set_intended_direction(Direction::Left);
        assert_eq!(snake.pending_direction(), Direction::Right);

        snake.advance(&arena);
        assert_eq!(snake.direction(), Direction::Right);
        assert_eq!(snake.head(), Position::new(110, 100));
    }

    #[test]
    fn test_growth_adds_one_segment() {
        let arena = arena();
        let mut snake = Snake::new(Position::new(100, 100), Direction::Right, 1);
        snake.grow();
        snake.advance(&arena);

        assert_eq!(snake.len(), 2);
        assert!(!snake.is_growing());
        assert_eq!(snake.head(), Position::new(110, 100));
        assert_eq!(snake.tail(), Position::new(100, 100));

        // Constant length once growth is consumed
        snake.advance(&arena);
        assert_eq!(snake.len(), 2);
        assert_eq!(snake.tail(), Position::new(110, 100));
    }

    #[test]
    fn test_length_one_never_self_collides() {
        let arena = arena();
        let mut snake = Snake::new(Position::new(100, 100), Direction::Right, 1);
        // A closed square loop that stays inside the arena
        let turns = [
            Direction::Right,
            Direction::Down,
            Direction::Left,
            Direction::Up,
        ];

        for direction in turns.iter().cycle().take(60) {
            snake.set_intended_direction(*direction);
            assert_eq!(snake.advance(&arena), None);
            assert!(arena.contains(snake.head()));
            assert!(snake.is_alive());
            assert_eq!(snake.len(), 1);
        }
    }

    #[test]
    fn test_wall_collision() {
        let arena = arena();
        let mut snake = Snake::new(Position::new(0, 50), Direction::Left, 1);
        assert_eq!(snake.advance(&arena), Some(CollisionType::Wall));
        assert!(!snake.is_alive());

        // Dead snakes stay put
        let head = snake.head();
        assert_eq!(snake.advance(&arena), None);
        assert_eq!(snake.head(), head);
    }

    #[test]
    fn test_self_collision() {
        let arena = arena();
        // Body: (50,50), (40,50), (30,50), (20,50), (10,50) heading right
        let segments = (0..5).map(|i| Position::new(50 - 10 * i, 50));
        let mut snake = Snake::from_segments(segments, Direction::Right, 1);

        snake.set_intended_direction(Direction::Down);
        assert_eq!(snake.advance(&arena), None);
        snake.set_intended_direction(Direction::Left);
        assert_eq!(snake.advance(&arena), None);
        snake.set_intended_direction(Direction::Up);
        assert_eq!(snake.advance(&arena), Some(CollisionType::SelfCollision));
        assert!(!snake.is_alive());
    }

    #[test]
    fn test_following_own_tail_is_legal() {
        let arena = arena();
        // 2x2 loop: head moves into the cell the tail vacates this tick
        let segments = [
            Position::new(50, 50),
            Position::new(50, 60),
            Position::new(60, 60),
            Position::new(60, 50),
        ];
        let mut snake = Snake::from_segments(segments, Direction::Up, 1);
        snake.set_intended_direction(Direction::Right);

        assert_eq!(snake.advance(&arena), None);
        assert_eq!(snake.head(), Position::new(60, 50));
        assert_eq!(snake.len(), 4);
    }

    #[test]
    fn test_collision_detection() {
        let segments = [Position::new(50, 50), Position::new(40, 50)];
        let snake = Snake::from_segments(segments, Direction::Right, 1);
        assert!(!snake.collides_with_body(Position::new(50, 50)));
        assert!(snake.collides_with_body(Position::new(40, 50)));
        assert!(snake.occupies(Position::new(50, 50)));
        assert!(!snake.occupies(Position::new(100, 100)));
    }
}
