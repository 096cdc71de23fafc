//! Go Text Protocol (GTP) front end.
//!
//! Drives one game inside a [`SessionCoordinator`] from GTP version 2
//! commands, so the rules engine can be exercised from a terminal or from
//! GTP-speaking tools. There is no `genmove`: the engine referees, it does
//! not play.
//!
//! ## Supported Commands
//!
//! - `name`, `version`, `protocol_version`
//! - `list_commands`, `known_command <cmd>`, `quit`
//! - `boardsize <size>` - Start a new game on a 9, 13 or 19 board
//! - `clear_board` - Start a new game on the current size
//! - `play <color> <vertex|pass|resign>` - Submit a move
//! - `showboard` - Print the board with coordinates
//! - `captures <color>` - Stones captured by `color`
//! - `legal_moves <color>` - Vertices where `color` may play now
//! - `state` - The game as a single line of JSON
//!
//! Vertices follow GTP: columns `A`-`T` skipping `I`, row 1 at the bottom.

use std::io::{self, BufRead, Write};

use tracing::{debug, instrument};

use crate::board::{Color, Point};
use crate::constants::COLUMN_LETTERS;
use crate::error::GameError;
use crate::rules::legal_points;
use crate::session::{GameId, SessionCoordinator};
use crate::wire::StateView;

/// The list of known GTP commands.
const KNOWN_COMMANDS: &[&str] = &[
    "boardsize",
    "captures",
    "clear_board",
    "known_command",
    "legal_moves",
    "list_commands",
    "name",
    "play",
    "protocol_version",
    "quit",
    "showboard",
    "state",
    "version",
];

/// Parses a GTP vertex such as `D4` into signed engine coordinates.
///
/// The row is not range-checked here, so the engine can report the move as
/// out of bounds. Returns `None` if the text is not a vertex at all.
pub fn parse_vertex(s: &str, size: usize) -> Option<(i64, i64)> {
    let bytes = s.as_bytes();
    let (&col_char, row) = bytes.split_first()?;
    let col = COLUMN_LETTERS
        .iter()
        .position(|&c| c == col_char.to_ascii_uppercase())?;
    let row: i64 = std::str::from_utf8(row).ok()?.parse().ok()?;
    let y = i64::try_from(size).ok()?.checked_sub(row)?;
    Some((col as i64, y))
}

/// Formats a point as a GTP vertex.
pub fn format_vertex(p: Point, size: usize) -> String {
    let col = COLUMN_LETTERS.get(p.x).map_or('?', |&c| c as char);
    format!("{col}{}", size - p.y)
}

/// GTP session state.
pub struct GtpEngine {
    coordinator: SessionCoordinator,
    game: GameId,
    size: usize,
}

impl GtpEngine {
    /// Creates an engine with a fresh `size` game registered in `coordinator`.
    pub fn new(coordinator: SessionCoordinator, size: usize) -> Result<Self, GameError> {
        let (game, _) = coordinator.create_game(size)?;
        Ok(Self {
            coordinator,
            game,
            size,
        })
    }

    /// Id of the game currently being played.
    pub fn game(&self) -> GameId {
        self.game
    }

    /// Runs the GTP command loop until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                writeln!(output, "?{id_str} missing command\n")?;
                output.flush()?;
                continue;
            };
            let command = command.to_lowercase();

            let (success, message) = self.execute(&command, args);
            let prefix = if success { '=' } else { '?' };

            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Parse an optional numeric command ID from the beginning of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    fn new_game(&mut self, size: usize) -> Result<(), GameError> {
        let (game, _) = self.coordinator.create_game(size)?;
        // The old game may already be gone; nothing else refers to it.
        let _ = self.coordinator.remove_game(self.game);
        self.game = game;
        self.size = size;
        Ok(())
    }

    fn showboard(&self) -> Result<String, GameError> {
        let state = self.coordinator.get_state(self.game)?;
        let board = state.board();
        let letters: Vec<String> = COLUMN_LETTERS[..self.size]
            .iter()
            .map(|&c| (c as char).to_string())
            .collect();
        let header = format!("   {}", letters.join(" "));

        let mut out = vec![String::new(), header.clone()];
        for (y, line) in board.to_string().lines().enumerate() {
            let row = self.size - y;
            out.push(format!("{row:>2} {line} {row}"));
        }
        out.push(header);
        out.push(format!(
            "{} to move, captures black {} white {}",
            state.to_move(),
            state.captures().black,
            state.captures().white
        ));
        Ok(out.join("\n"))
    }

    fn play(&mut self, args: &[&str]) -> (bool, String) {
        let [color, vertex, ..] = args else {
            return (false, "missing arguments".to_string());
        };
        let Ok(color) = color.parse::<Color>() else {
            return (false, "invalid color".to_string());
        };

        let result = match vertex.to_lowercase().as_str() {
            "pass" => self.coordinator.submit_pass(self.game, color),
            "resign" => self.coordinator.submit_resign(self.game, color),
            v => match parse_vertex(v, self.size) {
                Some((x, y)) => self.coordinator.submit_move(self.game, color, x, y),
                None => return (false, "invalid vertex".to_string()),
            },
        };
        match result {
            Ok(_) => (true, String::new()),
            Err(e) => (false, format!("illegal move: {}", e.kind())),
        }
    }

    /// Execute a GTP command and return (success, response).
    #[instrument(skip(self))]
    fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        debug!(game_id = %self.game, "GTP command");
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "protocol_version" => (true, "2".to_string()),

            "list_commands" => (true, KNOWN_COMMANDS.join("\n")),

            "known_command" => match args.first() {
                Some(cmd) => {
                    let known = KNOWN_COMMANDS.contains(&cmd.to_lowercase().as_str());
                    (true, known.to_string())
                }
                None => (false, "missing argument".to_string()),
            },

            "quit" => (true, String::new()),

            "boardsize" => match args.first().map(|a| a.parse::<usize>()) {
                None => (false, "missing argument".to_string()),
                Some(Err(_)) => (false, "invalid size".to_string()),
                Some(Ok(size)) => match self.new_game(size) {
                    Ok(()) => (true, String::new()),
                    Err(_) => (false, "unacceptable size".to_string()),
                },
            },

            "clear_board" => match self.new_game(self.size) {
                Ok(()) => (true, String::new()),
                Err(e) => (false, e.to_string()),
            },

            "play" => self.play(args),

            "showboard" => match self.showboard() {
                Ok(board) => (true, board),
                Err(e) => (false, e.to_string()),
            },

            "captures" => {
                let Some(Ok(color)) = args.first().map(|a| a.parse::<Color>()) else {
                    return (false, "invalid color".to_string());
                };
                match self.coordinator.get_state(self.game) {
                    Ok(state) => (true, state.captures().by(color).to_string()),
                    Err(e) => (false, e.to_string()),
                }
            }

            "legal_moves" => {
                let Some(Ok(color)) = args.first().map(|a| a.parse::<Color>()) else {
                    return (false, "invalid color".to_string());
                };
                match self.coordinator.get_state(self.game) {
                    Ok(state) => {
                        let vertices: Vec<String> =
                            legal_points(&state, color, self.coordinator.ko_rule())
                                .into_iter()
                                .map(|p| format_vertex(p, self.size))
                                .collect();
                        (true, vertices.join(" "))
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "state" => {
                let json = self
                    .coordinator
                    .get_state(self.game)
                    .map_err(|e| e.to_string())
                    .and_then(|state| {
                        serde_json::to_string(&StateView::from(&*state))
                            .map_err(|e| e.to_string())
                    });
                match json {
                    Ok(json) => (true, json),
                    Err(e) => (false, e),
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}
