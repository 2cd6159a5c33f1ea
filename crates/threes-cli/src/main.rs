use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use threes_engine::engine::{Board, Direction};

#[derive(Debug, Parser)]
#[command(author, version, about = "Threes. The hot new gaming sensation.")]
struct Cli {
    /// Number of board rows
    #[arg(short = 'r', long, default_value_t = 5)]
    row_size: usize,

    /// Number of board columns
    #[arg(short = 'c', long, default_value_t = 5)]
    column_size: usize,

    /// Fraction of cells seeded with a starting tile
    #[arg(short = 'f', long, default_value_t = 0.5)]
    fill_ratio: f64,

    /// Seed for a reproducible session (defaults to OS entropy)
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut board = Board::new(cli.row_size, cli.column_size, cli.fill_ratio, &mut rng)
        .context("could not set up the board")?;
    info!(
        "new {}x{} board, fill ratio {}",
        cli.row_size, cli.column_size, cli.fill_ratio
    );

    println!("Game starting... \n");
    println!("You can end the current session by typing \"exit\".\n");
    println!("For more help, you can type \"help\"\n");
    print!("{board}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> Next command: ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let command = line.context("failed to read command")?.trim().to_lowercase();
        match command.as_str() {
            "" => continue,
            "exit" => break,
            "help" => println!(
                "Available commands: 'help', 'score', 'exit', 'left', 'right', 'up', 'down'\n"
            ),
            "score" => println!("Current score: {}", board.score()),
            token => match token.parse::<Direction>() {
                Ok(direction) => {
                    board.make_move(direction, &mut rng);
                    debug!("applied {direction}, score {}", board.score());
                    print!("{board}");
                    if board.is_game_over() {
                        println!("game over!");
                        break;
                    }
                }
                Err(err) => println!("{err}"),
            },
        }
    }

    Ok(())
}
