use std::collections::VecDeque;

use frontline::net::NetworkStats;
use frontline::{EntityKind, Game, MatchPhase, ViewTransform};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::events::Severity;

const MAX_LOG_LINES: usize = 200;

pub struct TuiState {
    logs: VecDeque<(Severity, String)>,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
        }
    }

    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back((severity, message.into()));
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(Severity::Info, message);
    }

    pub fn log_warn(&mut self, message: impl Into<String>) {
        self.log(Severity::Warn, message);
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, game: &Game) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(12),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(middle[1]);

    render_header(frame, rows[0], game);
    render_battlefield(frame, middle[0], game);
    render_status(frame, side[0], game);
    render_network(frame, side[1], &game.network_stats());
    render_logs(frame, rows[2], state);
    render_help(frame, rows[3], game.phase());
}

fn render_header(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .title(" Frontline ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let text = format!(
        "Playing as {}  |  Tick: {}  |  Units: {}",
        game.local_team().label(),
        game.sim().tick_count(),
        game.sim().entities().len()
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));
    frame.render_widget(paragraph, area);
}

fn render_battlefield(frame: &mut Frame, area: Rect, game: &Game) {
    let sim = game.sim();
    let world = sim.config().world_size;
    let transform = ViewTransform::for_team(sim.local_team(), world);
    let local = sim.local_team();
    let selected = sim.selected();
    let views = sim.views();

    let canvas = Canvas::default()
        .block(
            Block::default()
                .title(" Battlefield ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .x_bounds([-200.0, f64::from(world.x) + 200.0])
        .y_bounds([-500.0, f64::from(world.y) + 500.0])
        .paint(move |ctx| {
            for view in &views {
                let at = transform.world_to_view(view.position);
                // Canvas y grows upward.
                let (x, y) = (f64::from(at.x), f64::from(world.y - at.y));

                let color = if Some(view.id) == selected {
                    Color::Yellow
                } else if view.team == local {
                    Color::Cyan
                } else {
                    Color::Red
                };

                let radius = view.kind.stats().collider_radius;
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: f64::from(radius),
                    color,
                });

                let [r, g, b, _] = view.health_color();
                ctx.print(
                    x,
                    y,
                    Span::styled(kind_glyph(view.kind), Style::default().fg(Color::Rgb(r, g, b))),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn render_status(frame: &mut Frame, area: Rect, game: &Game) {
    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let sim = game.sim();
    let selected = sim
        .selected()
        .and_then(|id| sim.entity(id))
        .map(|e| format!("{:?} {} ({:.0} hp)", e.kind, e.id, e.health()))
        .unwrap_or_else(|| "none".to_string());

    let mut lines = vec![
        field("Phase: ", format!("{:?}", game.phase())),
        field("Connection: ", format!("{:?}", game.connection_state())),
        field("Currency: ", sim.currency().to_string()),
        field("Selected: ", selected),
    ];
    if let Some(result) = sim.result_text() {
        lines.push(Line::from(Span::styled(
            result,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_network(frame: &mut Frame, area: Rect, stats: &NetworkStats) {
    let block = Block::default()
        .title(" Network ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let lines = vec![
        field(
            "Commands: ",
            format!("{} sent / {} recv", stats.payloads_sent, stats.payloads_received),
        ),
        field(
            "Bytes: ",
            format!(
                "{} sent / {} recv",
                format_bytes(stats.bytes_sent),
                format_bytes(stats.bytes_received)
            ),
        ),
        field("Dropped: ", stats.malformed_dropped.to_string()),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_logs(frame: &mut Frame, area: Rect, state: &TuiState) {
    let block = Block::default()
        .title(" Log ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue));

    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .logs
        .iter()
        .skip(state.logs.len().saturating_sub(visible))
        .map(|(severity, message)| {
            let color = match severity {
                Severity::Info => Color::White,
                Severity::Warn => Color::Yellow,
            };
            Line::from(Span::styled(message.as_str(), Style::default().fg(color)))
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut Frame, area: Rect, phase: MatchPhase) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = match phase {
        MatchPhase::Ended => "'r' restart  |  'q'/ESC quit",
        _ => "1 infantry  2 cavalry  3 artillery  |  Tab select  Enter attack  |  'q'/ESC quit",
    };

    let paragraph = Paragraph::new(text).block(block).style(
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(paragraph, area);
}

fn field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn kind_glyph(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Infantry => "I",
        EntityKind::Cavalry => "C",
        EntityKind::Artillery => "A",
        EntityKind::Base => "B",
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
