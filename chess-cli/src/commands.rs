//! 命令行子命令

use std::io::Write;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use chess_rules::{perft, Fen, Game, LineOracle, START_FEN};

use crate::session::{Reply, Session};
use crate::settings::Settings;
use crate::storage::GameStorage;

pub const USAGE: &str = "\
usage: chess-cli <command>
  perft <depth> [fen]    count leaf positions
  divide <depth> [fen]   perft split by first move
  show [fen]             print a position and its status
  play [fen]             play interactively
  games                  list saved games
  settings [save]        print the settings, or write them to the settings file
  help                   show this message";

/// 子命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Perft { depth: u32, fen: Option<String> },
    Divide { depth: u32, fen: Option<String> },
    Show { fen: Option<String> },
    Play { fen: Option<String> },
    Games,
    Settings { save: bool },
    Help,
}

impl Command {
    /// 解析命令行参数（不含程序名），FEN 可以不加引号
    pub fn parse(args: &[String]) -> Result<Command> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Help);
        };

        let fen_from = |words: &[String]| {
            if words.is_empty() {
                None
            } else {
                Some(words.join(" "))
            }
        };
        let depth_and_fen = || -> Result<(u32, Option<String>)> {
            let (depth, words) = rest.split_first().context("missing <depth>")?;
            let depth = depth
                .parse::<u32>()
                .with_context(|| format!("invalid depth {:?}", depth))?;
            Ok((depth, fen_from(words)))
        };

        Ok(match name.as_str() {
            "perft" => {
                let (depth, fen) = depth_and_fen()?;
                Command::Perft { depth, fen }
            }
            "divide" => {
                let (depth, fen) = depth_and_fen()?;
                Command::Divide { depth, fen }
            }
            "show" => Command::Show { fen: fen_from(rest) },
            "play" => Command::Play { fen: fen_from(rest) },
            "games" => Command::Games,
            "settings" => match rest.first().map(String::as_str) {
                None => Command::Settings { save: false },
                Some("save") => Command::Settings { save: true },
                Some(other) => bail!("unknown settings action {:?}", other),
            },
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("unknown command {:?}\n{}", other, USAGE),
        })
    }

    /// 执行
    pub async fn run(self, settings: Settings) -> Result<()> {
        match self {
            Command::Perft { depth, fen } => run_perft(depth, fen.as_deref()),
            Command::Divide { depth, fen } => run_divide(depth, fen.as_deref()),
            Command::Show { fen } => show(fen.as_deref()),
            Command::Play { fen } => play(fen.as_deref(), settings).await,
            Command::Games => list_games(),
            Command::Settings { save } => settings_command(&settings, save),
            Command::Help => {
                println!("{}", USAGE);
                Ok(())
            }
        }
    }
}

fn run_perft(depth: u32, fen: Option<&str>) -> Result<()> {
    let report = perft::run(fen.unwrap_or(START_FEN), depth)?;
    println!(
        "perft({}) = {}  ({:.3}s, {} nps)",
        report.depth,
        report.nodes,
        report.elapsed.as_secs_f64(),
        report.nodes_per_second()
    );
    Ok(())
}

fn run_divide(depth: u32, fen: Option<&str>) -> Result<()> {
    let mut board = Fen::parse(fen.unwrap_or(START_FEN))?;
    let mut split = perft::divide(&mut board, depth, &LineOracle)?;
    split.sort_by_key(|(uci, _)| uci.to_string());

    for (uci, nodes) in &split {
        println!("{}: {}", uci, nodes);
    }
    println!();
    println!("moves: {}", split.len());
    println!("nodes: {}", split.iter().map(|(_, nodes)| nodes).sum::<u64>());
    Ok(())
}

fn show(fen: Option<&str>) -> Result<()> {
    let game = Game::from_fen(fen.unwrap_or(START_FEN))?;
    println!("{}", game.board());
    println!("fen:    {}", game.fen());
    println!("status: {:?}{}", game.status(), if game.is_checked() { " (check)" } else { "" });
    println!("legal:  {}", game.legal_moves().len());
    if let Some(result) = game.result() {
        println!("result: {}", result);
    }
    Ok(())
}

fn list_games() -> Result<()> {
    let storage = GameStorage::new()?;
    let games = storage.list()?;
    if games.is_empty() {
        println!("no saved games in {:?}", storage.games_directory());
    }
    for game in games {
        println!(
            "{}  {} vs {}  {} plies  {}",
            game.game_id,
            game.white_player,
            game.black_player,
            game.move_count,
            game.result.map_or("*".to_string(), |r| r.to_string())
        );
    }
    Ok(())
}

fn settings_command(settings: &Settings, save: bool) -> Result<()> {
    if save {
        let path = settings.save()?;
        println!("settings written to {:?}", path);
        return Ok(());
    }

    if let Some(path) = Settings::settings_path() {
        println!("# {:?}", path);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(settings).context("Failed to serialize settings")?
    );
    Ok(())
}

async fn play(fen: Option<&str>, settings: Settings) -> Result<()> {
    let game = match fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };
    let mut session = Session::new(game, settings);
    match GameStorage::new() {
        Ok(storage) => session = session.with_storage(storage),
        Err(e) => warn!("Saving games is disabled: {:#}", e),
    }

    println!("{}", session.game().board());
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if session.engine_to_move() {
            match session.engine_move().await {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    warn!("Engine move failed: {:#}", e);
                    println!("engine failed, enter a move for it or 'quit'");
                }
            }
            continue;
        }

        print!("{}", session.prompt());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        match session.handle(&line) {
            Ok(Reply::Continue(text)) if text.is_empty() => {}
            Ok(Reply::Continue(text)) => println!("{}", text),
            Ok(Reply::Quit) => break,
            Err(e) => println!("error: {:#}", e),
        }
    }

    info!("Leaving with {}", session.game().fen());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Help);
        assert_eq!(
            Command::parse(&args("perft 3")).unwrap(),
            Command::Perft { depth: 3, fen: None }
        );
        assert_eq!(
            Command::parse(&args("divide 2 8/8/8/8/8/8/8/K6k w - - 0 1")).unwrap(),
            Command::Divide {
                depth: 2,
                fen: Some("8/8/8/8/8/8/8/K6k w - - 0 1".to_string())
            }
        );
        assert_eq!(Command::parse(&args("play")).unwrap(), Command::Play { fen: None });
        assert_eq!(Command::parse(&args("games")).unwrap(), Command::Games);
        assert_eq!(
            Command::parse(&args("settings")).unwrap(),
            Command::Settings { save: false }
        );
        assert_eq!(
            Command::parse(&args("settings save")).unwrap(),
            Command::Settings { save: true }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(&args("perft")).is_err());
        assert!(Command::parse(&args("perft deep")).is_err());
        assert!(Command::parse(&args("analyse")).is_err());
        assert!(Command::parse(&args("settings reset")).is_err());
    }

    #[test]
    fn test_offline_commands() {
        assert!(run_perft(2, None).is_ok());
        assert!(run_divide(1, Some("4k3/8/8/8/8/8/8/4K2R w K - 0 1")).is_ok());
        assert!(show(Some("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")).is_ok());
        assert!(show(Some("not a fen")).is_err());
        assert!(settings_command(&Settings::default(), false).is_ok());
    }
}
