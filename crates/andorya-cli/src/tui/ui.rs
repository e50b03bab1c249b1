//! TUI rendering: one stream charted at a time.
//!
//! ┌──────────────────────────────────────────────┐
//! │  Andorya   Disk · 1h · 60 pts       1.0s     │
//! ├─────────────────────┬────────────────────────┤
//! │  Host               │  ╭ read / write / iops │
//! │  CPU   18.4%  52°C  │  │   ~~~~~~~~~~~       │
//! │  Mem   4.2/16 GiB   │  │ ~~~~       ~~~~     │
//! │  Net   ↓1.2 ↑0.3    │  ╰──────────────────── │
//! │  Up    3d 04:12     │                        │
//! │  Buffers            │                        │
//! ├─────────────────────┴────────────────────────┤
//! │  read 412.30 MB/s   write 288.10 MB/s  ...   │
//! ├──────────────────────────────────────────────┤
//! │  tab: stream   w: window   +/-: points  q    │
//! └──────────────────────────────────────────────┘

use super::app::{App, Series, Snapshot, y_bounds};
use crate::commands::{format_bytes, format_uptime, metric_unit};
use ratatui::{prelude::*, widgets::*};

const SERIES_COLORS: [Color; 3] = [Color::Cyan, Color::Magenta, Color::Yellow];

pub fn draw(f: &mut Frame, app: &App) {
    let snap = app.snapshot();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(10),   // main
            Constraint::Length(3), // latest values
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_main(f, rows[1], app, &snap);
    draw_latest(f, rows[2], app, &snap);
    draw_keys(f, rows[3]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let paused = if app.is_paused() { "  ⏸ paused" } else { "" };
    let source = if app.is_synthetic() { "demo" } else { "procfs" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" Andorya ", Style::default().bold().fg(Color::Cyan)),
            Span::raw("  stream: "),
            Span::styled(app.stream().label(), Style::default().bold().fg(Color::Yellow)),
            Span::styled(
                format!(
                    "  {} · {} pts · every {:.1}s · {source}{paused} ",
                    app.window().label(),
                    app.points(),
                    app.interval_secs()
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_main(f: &mut Frame, area: Rect, app: &App, snap: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Percentage(68)])
        .split(area);

    draw_host(f, cols[0], snap);
    draw_chart(f, cols[1], app, snap);
}

fn draw_host(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let label = |s: &str| Span::styled(format!("{s:<6}"), Style::default().bold());

    let mut lines = match &snap.stats {
        Some(st) => {
            let temp_style = if st.cpu_temp >= 80.0 {
                Style::default().fg(Color::Red)
            } else if st.cpu_temp >= 65.0 {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            };
            let mut lines = vec![
                Line::from(vec![
                    label("CPU"),
                    Span::raw(format!("{:>5.1}%  ", st.cpu_load)),
                    Span::styled(format!("{:.0}°C", st.cpu_temp), temp_style),
                ]),
                Line::from(vec![
                    label("Mem"),
                    Span::raw(format!("{:.1}/{:.1} GiB", st.mem_used, st.mem_total)),
                ]),
                Line::from(vec![
                    label("Net"),
                    Span::raw(format!(
                        "↓{}/s ↑{}/s",
                        format_bytes(st.net_download),
                        format_bytes(st.net_upload)
                    )),
                ]),
                Line::from(vec![label("Up"), Span::raw(format_uptime(st.uptime))]),
            ];
            if let Some([l1, l5, l15]) = st.load_average {
                lines.push(Line::from(vec![
                    label("Load"),
                    Span::raw(format!("{l1:.2} {l5:.2} {l15:.2}")),
                ]));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "sampling host…",
            Style::default().fg(Color::DarkGray),
        ))],
    };

    let fill = if snap.capacity > 0 {
        snap.buffered as f64 / snap.capacity as f64 * 100.0
    } else {
        0.0
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        label("Buf"),
        Span::raw(format!("{}/{} ({fill:.1}%)", snap.buffered, snap.capacity)),
    ]));
    lines.push(Line::from(vec![
        label("Win"),
        Span::raw(format!("{} samples", snap.in_window)),
    ]));

    let spin = if snap.stats_refreshing { " ⟳ " } else { " " };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Host{spin}"));
    let p = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    f.render_widget(p, area);
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App, snap: &Snapshot) {
    let title = format!(
        " {} - last {} ",
        app.stream().label(),
        app.window().label()
    );

    if snap.series.iter().all(|s| s.points.is_empty()) {
        let block = Block::default().borders(Borders::ALL).title(title);
        let p = Paragraph::new("Waiting for samples in this window…")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    // IOPS is on a different scale from MB/s; it only appears in the latest bar.
    let charted: Vec<&Series> = match snap.series.iter().find(|s| s.name == "iops") {
        Some(_) if snap.series.len() > 1 => {
            snap.series.iter().filter(|s| s.name != "iops").collect()
        }
        _ => snap.series.iter().collect(),
    };

    let datasets: Vec<Dataset> = charted
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.name)
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(&s.points)
        })
        .collect();

    let (y_min, y_max) = y_bounds(charted.iter().copied());
    let x_min = -(app.window().minutes() as f64);
    let unit = charted.first().map_or("", |s| metric_unit(s.name));

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_axis(Axis::default().bounds([x_min, 0.0]).labels(vec![
            Line::from(format!("-{}", app.window().label())),
            Line::from("now"),
        ]))
        .y_axis(
            Axis::default()
                .title(unit)
                .bounds([y_min, y_max])
                .labels(vec![
                    Line::from(format!("{y_min:.1}")),
                    Line::from(format!("{y_max:.1}")),
                ]),
        );

    f.render_widget(chart, area);
}

fn draw_latest(f: &mut Frame, area: Rect, app: &App, snap: &Snapshot) {
    let mut spans = Vec::new();
    for (i, s) in snap.series.iter().enumerate() {
        let value = s
            .latest
            .map_or("-".to_string(), |v| format!("{v:.2}"));
        spans.push(Span::styled(
            format!("{} ", s.name),
            Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]),
        ));
        spans.push(Span::raw(format!("{value} {}   ", metric_unit(s.name))));
    }
    if let Some(err) = app.export_error() {
        spans.push(Span::styled(
            format!("export failed: {err}"),
            Style::default().fg(Color::Red),
        ));
    } else if let Some(path) = app.last_export() {
        spans.push(Span::styled(
            format!("exported {path}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let block = Block::default().borders(Borders::ALL).title(" Latest ");
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(
        " tab: stream   w: window   +/-: points   p: pause   e: export   q: quit",
    )
    .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
