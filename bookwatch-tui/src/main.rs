//! Bookwatch terminal viewer.
//!
//! Renders the live order book, rolling spread, volume imbalance, depth
//! curve, and daily stats for one trading pair at a time. Market data is
//! produced by a `bookwatch-data` polling session; this binary only reads
//! published `MarketView` values and draws them.

use std::{io, time::Duration};

use bookwatch_data::{
    BinanceClient, DataSource, MarketView, PriceLevel, SpreadTrend, TradingPair, is_bullish,
    session::{DEFAULT_DEPTH_LIMIT, DEFAULT_POLL_INTERVAL, SessionConfig, SessionHandle},
    spawn_session,
};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, BorderType, Borders, Chart, Dataset, Gauge, GraphType, List, ListItem, Paragraph, Sparkline},
};
use tokio::sync::watch;

const C_BUY: Color = Color::Rgb(100, 220, 100);
const C_SELL: Color = Color::Rgb(220, 100, 100);
const C_NEUTRAL: Color = Color::Rgb(180, 180, 100);
const C_DIM: Color = Color::Rgb(120, 120, 120);
const C_BRIGHT: Color = Color::Rgb(220, 220, 220);
const C_ACCENT: Color = Color::Rgb(100, 180, 220);

/// Poll interval from BOOKWATCH_POLL_MS env var (default: 1000ms)
fn poll_interval() -> Duration {
    std::env::var("BOOKWATCH_POLL_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_POLL_INTERVAL)
}

/// Depth levels per side from BOOKWATCH_DEPTH_LIMIT env var (default: 10)
fn depth_limit() -> u32 {
    std::env::var("BOOKWATCH_DEPTH_LIMIT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_DEPTH_LIMIT)
}

/// Opt-in tracing to a file; stdout logging would bleed into the TUI.
fn init_logging() {
    let Ok(path) = std::env::var("BOOKWATCH_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(&path) else {
        eprintln!("could not create log file at {path}");
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(file)
        .with_ansi(false)
        .init();
}

/// One polling session per selected pair; switching cancels and respawns.
struct App {
    client: BinanceClient,
    handle: SessionHandle,
    rx: watch::Receiver<MarketView>,
    pair: TradingPair,
}

impl App {
    fn new(client: BinanceClient) -> Self {
        let pair = TradingPair::ALL[0];
        let (handle, rx) = spawn_session(client.clone(), Self::config(pair));
        Self {
            client,
            handle,
            rx,
            pair,
        }
    }

    fn config(pair: TradingPair) -> SessionConfig {
        SessionConfig {
            pair,
            depth_limit: depth_limit(),
            poll_interval: poll_interval(),
            ..SessionConfig::new(pair)
        }
    }

    /// Switch to `pair`: cancel the old session (any in-flight response is
    /// discarded) and start fresh with empty derived state.
    fn select(&mut self, pair: TradingPair) {
        if pair == self.pair {
            return;
        }
        tracing::info!(%pair, "switching pair, restarting polling session");
        self.handle.cancel();
        let (handle, rx) = spawn_session(self.client.clone(), Self::config(pair));
        self.handle = handle;
        self.rx = rx;
        self.pair = pair;
    }

    fn view(&self) -> MarketView {
        self.rx.borrow().clone()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Restore the terminal on crash so panics stay readable
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(BinanceClient::new());
    let res = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = std::time::Instant::now();

    loop {
        let view = app.view();
        terminal.draw(|f| ui(f, &view))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => {
                        app.handle.cancel();
                        return Ok(());
                    }
                    KeyCode::Tab | KeyCode::Right => app.select(app.pair.next()),
                    KeyCode::BackTab | KeyCode::Left => app.select(app.pair.prev()),
                    KeyCode::Char('1') => app.select(TradingPair::BtcUsdt),
                    KeyCode::Char('2') => app.select(TradingPair::EthUsdt),
                    KeyCode::Char('3') => app.select(TradingPair::XrpUsdt),
                    _ => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = std::time::Instant::now();
        }
    }
}

fn ui(f: &mut Frame, view: &MarketView) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(size);

    render_status_bar(f, chunks[0], view);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .margin(1)
        .split(chunks[1]);

    // Left column: the two book sides
    let book_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_chunks[0]);

    render_book_side(f, book_chunks[0], "BUY ORDERS", &view.bids, true);
    render_book_side(f, book_chunks[1], "SELL ORDERS", &view.asks, false);

    // Right column: spread, imbalance, depth, daily stats
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30),
            Constraint::Length(4),
            Constraint::Percentage(40),
            Constraint::Min(5),
        ])
        .split(main_chunks[1]);

    render_spread(f, right_chunks[0], view);
    render_imbalance(f, right_chunks[1], view);
    render_depth(f, right_chunks[2], view);
    render_daily_stats(f, right_chunks[3], view);
}

fn render_status_bar(f: &mut Frame, area: Rect, view: &MarketView) {
    let (source_color, source_symbol) = match view.source {
        DataSource::Live => (C_BUY, "●"),
        DataSource::Fallback => (C_SELL, "○"),
    };

    let status_line = Line::from(vec![
        Span::styled(
            " ◆ BOOKWATCH ◆ ",
            Style::default().fg(Color::Rgb(255, 215, 0)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", view.pair.label()),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} {} ", source_symbol, view.source.as_str()),
            Style::default().fg(source_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" ⏱  {} ", view.time_updated.format("%H:%M:%S")),
            Style::default().fg(Color::Rgb(100, 149, 237)),
        ),
        Span::styled(
            format!(" tick {} ", view.ticks),
            Style::default().fg(C_DIM),
        ),
        Span::styled(" [Tab] Pair  [Q] Quit ", Style::default().fg(C_DIM)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Color::Rgb(138, 43, 226)));

    let paragraph = Paragraph::new(status_line)
        .block(block)
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

/// Row tone convention: the top row is always
/// green; a bid row is green when its price rose versus the row above it,
/// an ask row when its price fell versus the row above it, red otherwise.
fn level_tone(levels: &[PriceLevel], index: usize, is_bid: bool) -> Color {
    if index == 0 {
        return C_BUY;
    }
    let current = levels[index].price_f64();
    let previous = levels[index - 1].price_f64();
    let improved = if is_bid {
        current > previous
    } else {
        current < previous
    };
    if improved { C_BUY } else { C_SELL }
}

fn render_book_side(f: &mut Frame, area: Rect, title: &str, levels: &[PriceLevel], is_bid: bool) {
    let items: Vec<ListItem> = levels
        .iter()
        .enumerate()
        .take(area.height.saturating_sub(3) as usize)
        .map(|(index, level)| {
            let tone = level_tone(levels, index, is_bid);
            let line = Line::from(vec![
                Span::styled(
                    format!(" {:<14} ", level.price),
                    Style::default().fg(tone).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{:>14} ", level.qty),
                    Style::default().fg(C_BRIGHT),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    let border_color = if is_bid { C_BUY } else { C_SELL };
    let header = Line::from(vec![
        Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("({}) ", levels.len()), Style::default().fg(C_DIM)),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .title_top(header.alignment(Alignment::Center));

    if levels.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "⏳ Waiting for data...",
            Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
        )))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(waiting, area);
        return;
    }

    f.render_widget(List::new(items).block(block), area);
}

/// Map spread values onto Sparkline buckets (u64, window-relative).
fn sparkline_points(values: &[f64]) -> Vec<u64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return Vec::new();
    }

    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if range <= 0.0 {
                50
            } else {
                (((v - min) / range) * 99.0) as u64 + 1
            }
        })
        .collect()
}

fn render_spread(f: &mut Frame, area: Rect, view: &MarketView) {
    let (trend_label, trend_color) = match view.spread.trend() {
        SpreadTrend::Widening => ("▲ widening", C_BUY),
        SpreadTrend::Narrowing => ("▼ narrowing", C_SELL),
        SpreadTrend::Neutral => ("— neutral", C_DIM),
    };

    let latest = view
        .spread
        .latest()
        .map(|v| format!("{v:.8}"))
        .unwrap_or_else(|| "--".to_string());

    let header = Line::from(vec![
        Span::styled(
            " SPREAD ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("{latest} "), Style::default().fg(C_BRIGHT)),
        Span::styled(
            format!("{trend_label} "),
            Style::default().fg(trend_color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("({}/60) ", view.spread.len()),
            Style::default().fg(C_DIM),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(trend_color))
        .title_top(header.alignment(Alignment::Center));

    let points = sparkline_points(&view.spread.values());
    let sparkline = Sparkline::default()
        .block(block)
        .data(&points)
        .style(Style::default().fg(trend_color));

    f.render_widget(sparkline, area);
}

fn render_imbalance(f: &mut Frame, area: Rect, view: &MarketView) {
    let bullish = is_bullish(view.imbalance);
    let color = if bullish { C_BUY } else { C_SELL };
    let label = format!(
        "{:+.2}% {}",
        view.imbalance * 100.0,
        if bullish { "BULLISH" } else { "BEARISH" }
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .title_top(
            Line::from(Span::styled(
                " IMBALANCE ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );

    // Gauge position maps [-1, 1] onto [0, 1]
    let ratio = ((view.imbalance + 1.0) / 2.0).clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(block)
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(Span::styled(
            label,
            Style::default().fg(C_BRIGHT).add_modifier(Modifier::BOLD),
        ));

    f.render_widget(gauge, area);
}

/// Chart points for one side of the depth curve. `None` holes (the other
/// side's axis positions) and non-finite sums (malformed quantity text)
/// are skipped, not rendered.
fn depth_points(values: &[Option<f64>]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.map(|v| (index as f64, v)))
        .filter(|&(_, y)| y.is_finite())
        .collect()
}

fn render_depth(f: &mut Frame, area: Rect, view: &MarketView) {
    let curve = &view.depth;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_ACCENT))
        .title_top(
            Line::from(Span::styled(
                " MARKET DEPTH ",
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
        );

    if curve.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "⏳ Waiting for data...",
            Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
        )))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(waiting, area);
        return;
    }

    // Two monotone curves over the shared bid-then-ask categorical axis;
    // axis position is the point's x coordinate
    let bid_points = depth_points(&curve.cumulative_bids);
    let ask_points = depth_points(&curve.cumulative_asks);

    let max_y = bid_points
        .iter()
        .chain(ask_points.iter())
        .map(|&(_, y)| y)
        .fold(0.0f64, f64::max)
        .max(1.0);

    let datasets = vec![
        Dataset::default()
            .name("Buy Orders")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_BUY))
            .data(&bid_points),
        Dataset::default()
            .name("Sell Orders")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(C_SELL))
            .data(&ask_points),
    ];

    let last_index = curve.len().saturating_sub(1);
    let x_labels = vec![
        Line::from(curve.prices.first().cloned().unwrap_or_default()),
        Line::from(
            curve
                .prices
                .get(curve.ask_offset())
                .cloned()
                .unwrap_or_default(),
        ),
        Line::from(curve.prices.last().cloned().unwrap_or_default()),
    ];
    let y_labels = vec![
        Line::from("0"),
        Line::from(format!("{:.2}", max_y / 2.0)),
        Line::from(format!("{max_y:.2}")),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title("Price")
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, last_index.max(1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title("Cum. Qty")
                .style(Style::default().fg(C_DIM))
                .bounds([0.0, max_y * 1.1])
                .labels(y_labels),
        );

    f.render_widget(chart, area);
}

fn render_daily_stats(f: &mut Frame, area: Rect, view: &MarketView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(C_NEUTRAL))
        .title_top(
            Line::from(vec![
                Span::styled(
                    " DAILY STATS ",
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("{} ", view.pair.base()),
                    Style::default().fg(C_DIM),
                ),
            ])
            .alignment(Alignment::Center),
        );

    if view.daily.is_empty() {
        let waiting = Paragraph::new(Line::from(Span::styled(
            "no kline data",
            Style::default().fg(C_DIM).add_modifier(Modifier::ITALIC),
        )))
        .block(block)
        .alignment(Alignment::Center);
        f.render_widget(waiting, area);
        return;
    }

    let items: Vec<ListItem> = view
        .daily
        .iter()
        .rev()
        .take(area.height.saturating_sub(2) as usize)
        .map(|kline| {
            let stats = kline.stats();
            let (arrow, perf_color) = match stats.performance() {
                bookwatch_data::Performance::Up => ("▲", C_BUY),
                bookwatch_data::Performance::Down => ("▼", C_SELL),
                bookwatch_data::Performance::Neutral => ("—", C_DIM),
            };
            let (vol_tag, vol_color) = match stats.volatility_level() {
                bookwatch_data::VolatilityLevel::Low => ("LOW ", C_BUY),
                bookwatch_data::VolatilityLevel::Medium => ("MED ", C_NEUTRAL),
                bookwatch_data::VolatilityLevel::High => ("HIGH", C_SELL),
            };

            let line = Line::from(vec![
                Span::styled(
                    format!(" {} ", kline.time_open.format("%m-%d")),
                    Style::default().fg(Color::Rgb(128, 128, 150)),
                ),
                Span::styled(
                    format!("{} {:+6.2}% ", arrow, stats.change_pct),
                    Style::default().fg(perf_color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("vol {:5.2}% ", stats.volatility_pct),
                    Style::default().fg(C_BRIGHT),
                ),
                Span::styled(
                    format!("[{vol_tag}] "),
                    Style::default().fg(vol_color),
                ),
                Span::styled(
                    format!("liq {:.0} ", stats.liquidity),
                    Style::default().fg(C_DIM),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(prices: &[&str]) -> Vec<PriceLevel> {
        prices
            .iter()
            .map(|price| PriceLevel::new(*price, "1.0"))
            .collect()
    }

    #[test]
    fn test_level_tone_top_row_always_green() {
        let bids = levels(&["100.0", "99.0"]);
        assert_eq!(level_tone(&bids, 0, true), C_BUY);
        let asks = levels(&["101.0", "102.0"]);
        assert_eq!(level_tone(&asks, 0, false), C_BUY);
    }

    #[test]
    fn test_level_tone_follows_price_direction() {
        // Bid row is green only when its price rose vs the row above
        let bids = levels(&["99.0", "100.0", "98.0"]);
        assert_eq!(level_tone(&bids, 1, true), C_BUY);
        assert_eq!(level_tone(&bids, 2, true), C_SELL);

        // Ask rows mirror the rule
        let asks = levels(&["102.0", "101.0", "103.0"]);
        assert_eq!(level_tone(&asks, 1, false), C_BUY);
        assert_eq!(level_tone(&asks, 2, false), C_SELL);
    }

    #[test]
    fn test_level_tone_malformed_price_reads_red() {
        let bids = levels(&["100.0", "garbage"]);
        assert_eq!(level_tone(&bids, 1, true), C_SELL);
    }

    #[test]
    fn test_depth_points_skip_holes_and_non_finite_sums() {
        let points = depth_points(&[Some(2.0), Some(f64::NAN), None, Some(5.0)]);
        assert_eq!(points, vec![(0.0, 2.0), (3.0, 5.0)]);
    }

    #[test]
    fn test_sparkline_points_scaling() {
        assert!(sparkline_points(&[]).is_empty());

        // Flat series sits mid-scale
        assert_eq!(sparkline_points(&[2.5, 2.5, 2.5]), vec![50, 50, 50]);

        // Monotone series maps onto increasing buckets
        let points = sparkline_points(&[1.0, 2.0, 3.0]);
        assert_eq!(points.len(), 3);
        assert!(points[0] < points[1] && points[1] < points[2]);
        assert_eq!(points[0], 1);
        assert_eq!(points[2], 100);
    }
}
