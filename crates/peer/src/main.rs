mod config;
mod events;
mod tui;

use std::io;
use std::net::IpAddr;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use config::PeerConfig;
use events::Severity;
use frontline::net::PeerRole;
use frontline::{FixedTimestep, Game, GameEvent, MatchPhase, UnitKind};
use tui::TuiState;

#[derive(Parser)]
#[command(name = "frontline-peer")]
#[command(about = "Two-player LAN battle: host a match or join one")]
struct Args {
    #[arg(short, long, help = "Join a host on the local network instead of hosting")]
    join: bool,

    #[arg(short, long, default_value_t = frontline::net::DEFAULT_GAME_PORT)]
    port: u16,

    #[arg(long, default_value_t = frontline::net::DEFAULT_DISCOVERY_PORT)]
    discovery_port: u16,

    #[arg(long, default_value = "255.255.255.255", help = "Where the host sends its beacon")]
    beacon_target: IpAddr,

    #[arg(short, long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = PeerConfig {
        role: if args.join {
            PeerRole::Join
        } else {
            PeerRole::Host
        },
        game_port: args.port,
        discovery_port: args.discovery_port,
        beacon_target: args.beacon_target,
        tick_rate: args.tick_rate,
    };

    let mut game = Game::new(config.match_config(), config.net_config());
    game.start_networking()?;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("started as {:?}", config.role);
        run_headless(&mut game, config.tick_rate)?;
    } else {
        run_with_tui(&mut game, config.tick_rate)?;
    }

    game.reset_networking();
    Ok(())
}

/// Fixed-rate loop with no input. Restarts automatically after each match.
fn run_headless(game: &mut Game, tick_rate: u32) -> io::Result<()> {
    let mut timestep = FixedTimestep::new(tick_rate);
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        timestep.accumulate((now - last).as_secs_f32());
        last = now;

        while timestep.consume_tick() {
            for event in game.update(timestep.dt()) {
                log_event(game, &event);
            }
        }

        if game.phase() == MatchPhase::Ended {
            game.restart()?;
            timestep.reset();
        }

        thread::sleep(timestep.tick_duration() / 2);
    }
}

fn log_event(game: &Game, event: &GameEvent) {
    let team = game.local_team();
    if let Some((severity, line)) = events::describe(event, team) {
        match severity {
            Severity::Info => log::info!("{}", line),
            Severity::Warn => log::warn!("{}", line),
        }
    }
    if let Some(cue) = event.sound_cue(team) {
        log::debug!("cue: {}", events::cue_name(cue));
    }
}

fn run_with_tui(game: &mut Game, tick_rate: u32) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();
    let mut timestep = FixedTimestep::new(tick_rate);
    let mut last = Instant::now();
    let mut running = true;

    tui_state.log_info(format!("Started as {}", game.local_team().label()));
    let mut last_phase = game.phase();

    while running {
        let now = Instant::now();
        timestep.accumulate((now - last).as_secs_f32());
        last = now;

        while timestep.consume_tick() {
            for event in game.update(timestep.dt()) {
                if let Some((severity, line)) = events::describe(&event, game.local_team()) {
                    tui_state.log(severity, line);
                }
            }
        }

        if game.phase() != last_phase {
            last_phase = game.phase();
            match last_phase {
                MatchPhase::Playing => tui_state.log_info("Peer connected, match started"),
                MatchPhase::Ended => {
                    if let Some(result) = game.sim().result_text() {
                        tui_state.log_info(result);
                    }
                }
                MatchPhase::Lobby => tui_state.log_info("Waiting for a peer"),
            }
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => running = false,
                        KeyCode::Char('1') => spawn(game, &mut tui_state, UnitKind::Infantry),
                        KeyCode::Char('2') => spawn(game, &mut tui_state, UnitKind::Cavalry),
                        KeyCode::Char('3') => spawn(game, &mut tui_state, UnitKind::Artillery),
                        KeyCode::Tab => {
                            game.cycle_selection();
                        }
                        KeyCode::Enter => {
                            let target = game.enemy_base_position();
                            if let Err(e) = game.order_selected(target) {
                                tui_state.log_warn(e.to_string());
                            }
                        }
                        KeyCode::Char('r') if game.phase() == MatchPhase::Ended => {
                            if let Err(e) = game.restart() {
                                tui_state.log_warn(format!("Restart failed: {}", e));
                            }
                            timestep.reset();
                        }
                        _ => {}
                    }
                }
            }
        }

        terminal.draw(|frame| {
            tui::render(frame, &tui_state, game);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}

fn spawn(game: &mut Game, tui_state: &mut TuiState, kind: UnitKind) {
    if let Err(e) = game.spawn_toward_enemy(kind) {
        tui_state.log_warn(e.to_string());
    }
}
