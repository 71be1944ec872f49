mod app;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tokio::sync::watch;

use app::{format_percent, format_usdc, truncate, AppState, ConnectionStatus};
use doma_autobidder::config::AUCTION_POLL_INTERVAL_SECS;
use doma_autobidder::hooks::{
    AuctionFeed, DisplayAuction, FeedState, HistoricalData, NormalizerClient, UserDomainsFeed,
};
use doma_autobidder::valuation::RandomValuation;

const DEFAULT_NORMALIZER_URL: &str = "http://localhost:3000/doma-auctions";
const DEFAULT_BACKTEST_DAYS: u64 = 30;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let url = std::env::var("NORMALIZER_URL").unwrap_or_else(|_| DEFAULT_NORMALIZER_URL.to_string());
    let wallet = std::env::var("WALLET_ADDRESS").ok().filter(|w| !w.trim().is_empty());
    let days = std::env::var("BACKTEST_DAYS")
        .ok()
        .and_then(|d| d.parse::<u64>().ok())
        .unwrap_or(DEFAULT_BACKTEST_DAYS);

    let client = NormalizerClient::new(url, Duration::from_secs(10)).map_err(io::Error::other)?;

    let feed = AuctionFeed::spawn(client.clone(), Duration::from_secs(AUCTION_POLL_INTERVAL_SECS));
    let portfolio = UserDomainsFeed::new(client.clone(), Arc::new(RandomValuation));
    let history = HistoricalData::new(client, days);
    let mut app = AppState::new(portfolio, history, wallet);

    // Initial fetch before rendering
    app.load_portfolio().await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut auction_table_state = TableState::default();
    auction_table_state.select(None);

    let result = run_loop(&mut terminal, &mut app, feed.subscribe(), &mut auction_table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    auctions: watch::Receiver<FeedState<DisplayAuction>>,
    auction_state: &mut TableState,
) -> io::Result<()> {
    let frame_interval = Duration::from_millis(250);

    loop {
        app.auctions = auctions.borrow().clone();
        terminal.draw(|f| render(f, app, auction_state))?;

        if event::poll(frame_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.refresh_portfolio().await,
                        KeyCode::Char('b') | KeyCode::Char('B') => app.run_backtest().await,
                        KeyCode::Down | KeyCode::Char('j') => {
                            let max = app.auctions.data.len().saturating_sub(1);
                            let next = auction_state.selected().map_or(0, |i| (i + 1).min(max));
                            auction_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = auction_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            auction_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, auction_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | body | backtest | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // body
            Constraint::Length(3), // backtest
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_body(f, app, auction_state, chunks[1]);
    render_backtest(f, app, chunks[2]);
    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match ConnectionStatus::of(&app.auctions) {
        ConnectionStatus::Connected => ("● connected".to_string(), Color::Green),
        ConnectionStatus::Connecting => ("◌ connecting".to_string(), Color::Yellow),
        ConnectionStatus::Error(e) => (format!("✗ {}", truncate(&e, 40)), Color::Red),
    };

    let wallet = app
        .wallet
        .as_deref()
        .map_or("no wallet".to_string(), |w| truncate(w, 14));

    let title_spans = vec![
        Span::styled(
            " Doma Auto-Bidder  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} auctions", app.auctions.data.len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(wallet, Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("portfolio {}", format_usdc(app.portfolio_value())),
            Style::default().fg(Color::White),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans))
        .block(Block::default().borders(Borders::ALL).border_style(
            Style::default().fg(Color::DarkGray),
        ));

    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &AppState, auction_state: &mut TableState, area: Rect) {
    // Horizontal split: auctions (55%) | portfolio (45%)
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_auctions_table(f, app, auction_state, halves[0]);
    render_portfolio_table(f, app, halves[1]);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    Row::new(cells).height(1)
}

fn titled_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn render_auctions_table(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let rows: Vec<Row> = app
        .auctions
        .data
        .iter()
        .map(|a| {
            let status_color = if a.status == "Active Bid" {
                Color::Green
            } else {
                Color::DarkGray
            };
            let profit_color = if a.potential_profit > 0.0 {
                Color::Green
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(truncate(&a.domain, 20)),
                Cell::from(format_usdc(a.current_bid)),
                Cell::from(format_usdc(a.fmv)).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_usdc(a.potential_profit)).style(Style::default().fg(profit_color)),
                Cell::from(a.time_left.clone()),
                Cell::from(a.status).style(Style::default().fg(status_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Domain", "Bid", "FMV", "Profit", "Left", "Status"]))
    .block(titled_block(" ACTIVE AUCTIONS "))
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_portfolio_table(f: &mut Frame, app: &AppState, area: Rect) {
    let rows: Vec<Row> = app
        .domains()
        .iter()
        .map(|d| {
            let score_color = if d.collateral_score >= 70 {
                Color::Green
            } else if d.collateral_score >= 40 {
                Color::Yellow
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(truncate(&d.domain, 18)),
                Cell::from(format_usdc(d.purchase_price)),
                Cell::from(format_usdc(d.current_value)),
                Cell::from(format_percent(d.profit_percent)).style(Style::default().fg(Color::Green)),
                Cell::from(d.collateral_score.to_string()).style(Style::default().fg(score_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(11),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(5),
        ],
    )
    .header(header_row(&["Domain", "Paid", "Value", "P/L", "Coll"]))
    .block(titled_block(" PORTFOLIO "));

    f.render_widget(table, area);
}

fn render_backtest(f: &mut Frame, app: &AppState, area: Rect) {
    let history = app.history.state();
    let line = if history.loading {
        Line::from(Span::styled(" running backtest…", Style::default().fg(Color::Yellow)))
    } else if let Some(e) = &history.error {
        Line::from(Span::styled(format!(" ✗ {}", truncate(e, 60)), Style::default().fg(Color::Red)))
    } else if let Some(s) = &app.backtest {
        Line::from(vec![
            Span::raw(format!(" {}d: ", app.history.days())),
            Span::styled(format!("{} auctions", s.auctions), Style::default().fg(Color::White)),
            Span::raw("  │  "),
            Span::styled(
                format!("{} sold ({:.0}%)", s.sold, s.sell_through_pct),
                Style::default().fg(Color::White),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("avg uplift {}", format_percent(s.avg_uplift_pct)),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  │  "),
            Span::styled(
                format!("volume {}", format_usdc(s.sold_volume)),
                Style::default().fg(Color::Cyan),
            ),
        ])
    } else {
        Line::from(Span::styled(
            " press [b] to run a backtest",
            Style::default().fg(Color::DarkGray),
        ))
    };

    f.render_widget(Paragraph::new(line).block(titled_block(" BACKTEST ")), area);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh portfolio  "),
        Span::styled("[b] ", Style::default().fg(Color::Yellow)),
        Span::raw("backtest  "),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll auctions  "),
        Span::styled(
            format!("auto-refresh: {AUCTION_POLL_INTERVAL_SECS}s"),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
