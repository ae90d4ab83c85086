//! Core domain types for ultimate tic-tac-toe.

use super::action::Move;
use super::invariants::{InvariantSet, StateInvariants};
use super::position::Position;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// Player in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum Player {
    /// Player X (goes first).
    X,
    /// Player O (goes second).
    O,
}

impl Player {
    /// Returns the opponent player.
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    /// Single-letter symbol.
    pub fn symbol(self) -> char {
        match self {
            Player::X => 'X',
            Player::O => 'O',
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A square on either board level.
///
/// Serialized as `""`, `"X"` or `"O"`; any other string is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "SquareRepr", into = "SquareRepr")]
pub enum Square {
    /// Empty square.
    #[default]
    Empty,
    /// Square occupied by a player.
    Occupied(Player),
}

impl Square {
    /// Returns the occupying player, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Square::Empty => None,
            Square::Occupied(p) => Some(p),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum SquareRepr {
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl From<SquareRepr> for Square {
    fn from(repr: SquareRepr) -> Self {
        match repr {
            SquareRepr::Empty => Square::Empty,
            SquareRepr::X => Square::Occupied(Player::X),
            SquareRepr::O => Square::Occupied(Player::O),
        }
    }
}

impl From<Square> for SquareRepr {
    fn from(square: Square) -> Self {
        match square {
            Square::Empty => SquareRepr::Empty,
            Square::Occupied(Player::X) => SquareRepr::X,
            Square::Occupied(Player::O) => SquareRepr::O,
        }
    }
}

/// 3x3 board. Used both for every sub-board and for the meta-board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub(crate) fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares as a slice.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of squares held by `player`.
    pub fn count(&self, player: Player) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(player))
            .count()
    }

    /// Formats the board as a human-readable string.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for row in 0..3 {
            for col in 0..3 {
                let pos = row * 3 + col;
                let symbol = match self.squares[pos] {
                    Square::Empty => (pos + 1).to_string(),
                    Square::Occupied(p) => p.to_string(),
                };
                result.push_str(&symbol);
                if col < 2 {
                    result.push('|');
                }
            }
            if row < 2 {
                result.push_str("\n-+-+-\n");
            }
        }
        result
    }
}

/// Which sub-board(s) the next move must target.
///
/// Serialized as `-1` (any), `0..=8` (that board) or `-2` (game over).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i8")]
pub enum ActiveBoard {
    /// Any undecided sub-board with an empty cell.
    #[default]
    Any,
    /// Only this sub-board.
    Board(Position),
    /// The game has ended.
    Locked,
}

impl ActiveBoard {
    /// Whether a move into `board` satisfies this constraint.
    pub fn admits(self, board: Position) -> bool {
        match self {
            ActiveBoard::Any => true,
            ActiveBoard::Board(required) => required == board,
            ActiveBoard::Locked => false,
        }
    }
}

/// An integer outside `-2..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("active board {value} is outside -2..=8")]
pub struct ActiveBoardOutOfRange {
    /// The rejected value.
    pub value: i64,
}

impl TryFrom<i64> for ActiveBoard {
    type Error = ActiveBoardOutOfRange;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(ActiveBoard::Any),
            -2 => Ok(ActiveBoard::Locked),
            v => Position::try_from(v)
                .map(ActiveBoard::Board)
                .map_err(|_| ActiveBoardOutOfRange { value }),
        }
    }
}

impl From<ActiveBoard> for i8 {
    fn from(active: ActiveBoard) -> Self {
        match active {
            ActiveBoard::Any => -1,
            ActiveBoard::Locked => -2,
            ActiveBoard::Board(pos) => pos as i8,
        }
    }
}

/// Outcome of a finished game.
///
/// Serialized as `"X"`, `"O"` or `"Draw"` (`"draw"` is accepted on input).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "OutcomeRepr", into = "OutcomeRepr")]
pub enum Outcome {
    /// Player won the meta-board.
    Winner(Player),
    /// No legal move remains and nobody completed a meta-board line.
    Draw,
}

impl Outcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Player> {
        match self {
            Outcome::Winner(player) => Some(*player),
            Outcome::Draw => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Winner(player) => write!(f, "{} wins", player),
            Outcome::Draw => write!(f, "Draw"),
        }
    }
}

#[derive(Serialize, Deserialize)]
enum OutcomeRepr {
    X,
    O,
    #[serde(alias = "draw")]
    Draw,
}

impl From<OutcomeRepr> for Outcome {
    fn from(repr: OutcomeRepr) -> Self {
        match repr {
            OutcomeRepr::X => Outcome::Winner(Player::X),
            OutcomeRepr::O => Outcome::Winner(Player::O),
            OutcomeRepr::Draw => Outcome::Draw,
        }
    }
}

impl From<Outcome> for OutcomeRepr {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(Player::X) => OutcomeRepr::X,
            Outcome::Winner(Player::O) => OutcomeRepr::O,
            Outcome::Draw => OutcomeRepr::Draw,
        }
    }
}

/// Complete game state: the unit of truth shared by every subscriber.
///
/// Deserializing a `GameState` re-checks every state invariant, so a value
/// of this type is always one the engine could have produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGameState")]
pub struct GameState {
    big_board: Board,
    small_boards: [Board; 9],
    current_player: Player,
    active_board: ActiveBoard,
    winner: Option<Outcome>,
    last_move: Option<Move>,
}

impl GameState {
    /// Creates a fresh game: empty boards, X to move, any board allowed.
    pub fn new() -> Self {
        Self {
            big_board: Board::new(),
            small_boards: std::array::from_fn(|_| Board::new()),
            current_player: Player::X,
            active_board: ActiveBoard::Any,
            winner: None,
            last_move: None,
        }
    }

    /// Returns the meta-board.
    pub fn big_board(&self) -> &Board {
        &self.big_board
    }

    /// Returns all nine sub-boards.
    pub fn small_boards(&self) -> &[Board; 9] {
        &self.small_boards
    }

    /// Returns one sub-board.
    pub fn small_board(&self, board: Position) -> &Board {
        &self.small_boards[board.to_index()]
    }

    /// Returns the current player.
    pub fn current_player(&self) -> Player {
        self.current_player
    }

    /// Returns the active-board constraint.
    pub fn active_board(&self) -> ActiveBoard {
        self.active_board
    }

    /// Returns the outcome once the game is over.
    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    /// Returns the last accepted move.
    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    /// True once the game has a winner or is drawn.
    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Number of marks on all sub-boards.
    pub fn move_count(&self) -> usize {
        self.small_boards
            .iter()
            .map(|b| b.count(Player::X) + b.count(Player::O))
            .sum()
    }

    /// Checks every state invariant.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidState`] listing the violated invariants.
    pub fn validate(&self) -> Result<(), InvalidState> {
        StateInvariants::check_all(self).map_err(|violations| InvalidState {
            reasons: violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    pub(crate) fn place(&mut self, mv: Move, player: Player) {
        self.small_boards[mv.board.to_index()].set(mv.cell, Square::Occupied(player));
        self.last_move = Some(mv);
    }

    /// Marks a meta-board cell; a claimed cell is never rewritten.
    pub(crate) fn claim_board(&mut self, board: Position, player: Player) -> bool {
        if !self.big_board.is_empty(board) {
            return false;
        }
        self.big_board.set(board, Square::Occupied(player));
        true
    }

    pub(crate) fn set_turn(&mut self, player: Player, active: ActiveBoard) {
        self.current_player = player;
        self.active_board = active;
    }

    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.winner = Some(outcome);
        self.active_board = ActiveBoard::Locked;
    }

    /// Formats all 81 cells as a 9x9 grid, sub-boards separated by rules.
    pub fn display(&self) -> String {
        let mut out = String::new();
        for big_row in 0..3 {
            for small_row in 0..3 {
                for big_col in 0..3 {
                    let board = &self.small_boards[big_row * 3 + big_col];
                    for small_col in 0..3 {
                        let ch = match board.squares()[small_row * 3 + small_col] {
                            Square::Empty => '.',
                            Square::Occupied(p) => p.symbol(),
                        };
                        out.push(ch);
                    }
                    if big_col < 2 {
                        out.push_str(" | ");
                    }
                }
                out.push('\n');
            }
            if big_row < 2 {
                out.push_str("----+-----+----\n");
            }
        }
        out
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

/// A deserialized state that breaks at least one invariant.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("invalid game state: {reasons}")]
pub struct InvalidState {
    /// Descriptions of the violated invariants.
    pub reasons: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGameState {
    #[serde(alias = "big")]
    big_board: Board,
    #[serde(alias = "small")]
    small_boards: [Board; 9],
    #[serde(alias = "current_player")]
    current_player: Player,
    #[serde(alias = "available_big")]
    active_board: ActiveBoard,
    #[serde(default)]
    winner: Option<Outcome>,
    #[serde(default)]
    last_move: Option<Move>,
}

impl TryFrom<RawGameState> for GameState {
    type Error = InvalidState;

    fn try_from(raw: RawGameState) -> Result<Self, Self::Error> {
        let state = GameState {
            big_board: raw.big_board,
            small_boards: raw.small_boards,
            current_player: raw.current_player,
            active_board: raw.active_board,
            winner: raw.winner,
            last_move: raw.last_move,
        };
        state.validate()?;
        Ok(state)
    }
}
