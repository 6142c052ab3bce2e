//! Line-oriented player commands
//!
//! One command per line, whitespace separated. Tracks are given as JSON
//! track descriptors.

use aria_core::Track;
use aria_playback::RepeatMode;
use std::str::FromStr;
use thiserror::Error;

/// Parse failure for a command line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    Unknown(String),

    #[error("'{command}' expects {expected}")]
    MissingArgument {
        command: String,
        expected: &'static str,
    },

    #[error("invalid argument '{value}' for '{command}'")]
    InvalidArgument { command: String, value: String },
}

/// A player command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Pause,
    TogglePlay,
    Stop,
    Next,
    Previous,
    SeekTo(f64),
    SeekBy(f64),
    /// 0.0 - 1.0
    Volume(f32),
    Mute,
    Unmute,
    ToggleMute,

    Enqueue(Box<Track>),
    EnqueueNext(Box<Track>),
    PlayNow(Vec<Track>),
    Remove(usize),
    Clear,
    Jump(usize),
    Move { from: usize, to: usize },
    Shuffle,
    Repeat(RepeatMode),
    Undo,
    Rate { index: usize, rating: Option<u8> },
    Favorite { index: usize, favorite: bool },

    EqGain { band: usize, gain_db: f32 },
    EqQ { band: usize, q: f32 },
    EqGains(Vec<f32>),
    EqReset,

    Status,
    Quit,
}

impl Command {
    /// Commands that only read state
    pub fn is_query(&self) -> bool {
        matches!(self, Command::Status)
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            return Err(CommandError::Empty);
        }
        let name = name.to_ascii_lowercase();
        let args = Args {
            command: &name,
            rest,
        };

        let command = match name.as_str() {
            "play" => Command::Play,
            "pause" => Command::Pause,
            "toggle" => Command::TogglePlay,
            "stop" => Command::Stop,
            "next" | "skip" => Command::Next,
            "prev" | "previous" => Command::Previous,
            "seek" => Command::SeekTo(args.number("seconds")?),
            "forward" => Command::SeekBy(args.number("seconds")?),
            "back" => Command::SeekBy(-args.number::<f64>("seconds")?),
            "volume" | "vol" => Command::Volume(parse_volume(&args)?),
            "mute" => Command::Mute,
            "unmute" => Command::Unmute,
            "toggle-mute" => Command::ToggleMute,

            "add" => Command::Enqueue(Box::new(args.json("a track JSON object")?)),
            "add-next" => Command::EnqueueNext(Box::new(args.json("a track JSON object")?)),
            "load" => Command::PlayNow(args.json("a JSON array of tracks")?),
            "remove" | "rm" => Command::Remove(args.number("an index")?),
            "clear" => Command::Clear,
            "jump" => Command::Jump(args.number("an index")?),
            "move" => {
                let (from, to) = args.pair("two indices")?;
                Command::Move { from, to }
            }
            "shuffle" => Command::Shuffle,
            "repeat" => Command::Repeat(args.parse_with("off, all or one", RepeatMode::from_str)?),
            "undo" => Command::Undo,
            "rate" => {
                let (index, rating) = args.split_two("an index and a rating (0-5 or none)")?;
                let index = args.value(index)?;
                let rating = if rating.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(args.value(rating)?)
                };
                Command::Rate { index, rating }
            }
            "fav" => Command::Favorite {
                index: args.number("an index")?,
                favorite: true,
            },
            "unfav" => Command::Favorite {
                index: args.number("an index")?,
                favorite: false,
            },

            "eq" => {
                let (band, gain_db) = args.split_two("a band index and a gain in dB")?;
                Command::EqGain {
                    band: args.value(band)?,
                    gain_db: args.value(gain_db)?,
                }
            }
            "eq-q" => {
                let (band, q) = args.split_two("a band index and a Q factor")?;
                Command::EqQ {
                    band: args.value(band)?,
                    q: args.value(q)?,
                }
            }
            "eq-set" => Command::EqGains(
                args.required("gains in dB")?
                    .split_whitespace()
                    .map(|v| args.value(v))
                    .collect::<Result<_, _>>()?,
            ),
            "eq-reset" => Command::EqReset,

            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(name.clone())),
        };
        Ok(command)
    }
}

struct Args<'a> {
    command: &'a str,
    rest: &'a str,
}

impl<'a> Args<'a> {
    fn required(&self, expected: &'static str) -> Result<&'a str, CommandError> {
        if self.rest.is_empty() {
            Err(CommandError::MissingArgument {
                command: self.command.to_string(),
                expected,
            })
        } else {
            Ok(self.rest)
        }
    }

    fn invalid(&self, value: &str) -> CommandError {
        CommandError::InvalidArgument {
            command: self.command.to_string(),
            value: value.to_string(),
        }
    }

    fn value<T: FromStr>(&self, raw: &str) -> Result<T, CommandError> {
        raw.parse().map_err(|_| self.invalid(raw))
    }

    fn number<T: FromStr>(&self, expected: &'static str) -> Result<T, CommandError> {
        let raw = self.required(expected)?;
        self.value(raw)
    }

    fn parse_with<T, E>(
        &self,
        expected: &'static str,
        parse: impl Fn(&str) -> Result<T, E>,
    ) -> Result<T, CommandError> {
        let raw = self.required(expected)?;
        parse(raw).map_err(|_| self.invalid(raw))
    }

    fn split_two(&self, expected: &'static str) -> Result<(&'a str, &'a str), CommandError> {
        let raw = self.required(expected)?;
        let mut parts = raw.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => Ok((a, b)),
            _ => Err(CommandError::MissingArgument {
                command: self.command.to_string(),
                expected,
            }),
        }
    }

    fn pair<T: FromStr>(&self, expected: &'static str) -> Result<(T, T), CommandError> {
        let (a, b) = self.split_two(expected)?;
        Ok((self.value(a)?, self.value(b)?))
    }

    fn json<T: serde::de::DeserializeOwned>(&self, expected: &'static str) -> Result<T, CommandError> {
        let raw = self.required(expected)?;
        serde_json::from_str(raw).map_err(|_| self.invalid(raw))
    }
}

/// `volume 0.5` or `volume 50%`
fn parse_volume(args: &Args<'_>) -> Result<f32, CommandError> {
    let raw = args.required("a level (0.0-1.0 or 0-100%)")?;
    match raw.strip_suffix('%') {
        Some(percent) => Ok(args.value::<f32>(percent)? / 100.0),
        None => args.value(raw),
    }
}
