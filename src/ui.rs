use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState,
        Paragraph, Wrap,
    },
};

use crate::map_draw::{NO_DATA_COLOR, UNMATCHED_COLOR};
use crate::state::AppState;

pub fn format_usd(value: f64) -> String {
    if value >= 1_000_000_000_000.0 {
        format!("{:.2} trn USD", value / 1_000_000_000_000.0)
    } else if value >= 1_000_000_000.0 {
        format!("{:.2} bln USD", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.2} mln USD", value / 1_000_000.0)
    } else {
        format!("{:.2} USD", value)
    }
}

pub fn draw(f: &mut Frame<'_>, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage(20),
                Constraint::Percentage(60),
                Constraint::Percentage(20),
            ]
            .as_ref(),
        )
        .split(f.area());

    // left: plot country list
    let items: Vec<ListItem> = state
        .codes
        .iter()
        .map(|code| {
            let name = state
                .plot_countries
                .get(code)
                .map(String::as_str)
                .unwrap_or("");
            ListItem::new(format!("{code}  {name}"))
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Countries"))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    // center: choropleth
    let title = format!("GDP {} ({})", state.year, state.mode.label());
    state.view.render(
        f,
        chunks[1],
        &title,
        &state.values,
        state.selected_code(),
    );

    // right: info, legend, latest GDP, time series
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage(40),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
            ]
            .as_ref(),
        )
        .split(chunks[2]);

    let info = Paragraph::new(state.info.clone())
        .block(Block::default().borders(Borders::ALL).title("Info"))
        .wrap(Wrap { trim: true });
    f.render_widget(info, right_chunks[0]);

    let legend = Paragraph::new(Line::from(vec![
        Span::styled("■ low→high  ", Style::default().fg(Color::Cyan)),
        Span::styled("■ unmatched  ", Style::default().fg(UNMATCHED_COLOR)),
        Span::styled("■ no data", Style::default().fg(NO_DATA_COLOR)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Legend"));
    f.render_widget(legend, right_chunks[1]);

    let gdp_text = state
        .selected_latest()
        .map(|(year, value)| format!("{} ({year}): {}",
            state.selected_name().unwrap_or(""), format_usd(value)))
        .unwrap_or_else(|| "no GDP data for selection".to_string());
    let gdp = Paragraph::new(gdp_text)
        .block(Block::default().borders(Borders::ALL).title("GDP"))
        .wrap(Wrap { trim: true });
    f.render_widget(gdp, right_chunks[2]);

    draw_series_chart(f, state, right_chunks[3]);
}

/// log10 GDP of the selected country over its recorded years.
fn draw_series_chart(f: &mut Frame<'_>, state: &AppState, area: ratatui::layout::Rect) {
    let points: Vec<(f64, f64)> = state
        .selected_series()
        .into_iter()
        .filter(|(_, v)| *v > 0.0)
        .map(|(year, v)| (year as f64, v.log10()))
        .collect();

    if points.is_empty() {
        let empty = Paragraph::new("no time series")
            .block(Block::default().borders(Borders::ALL).title("log10 GDP"));
        f.render_widget(empty, area);
        return;
    }

    let x0 = points.first().map(|p| p.0).unwrap_or(0.0);
    let x1 = points.last().map(|p| p.0).unwrap_or(1.0);
    let (mut y0, mut y1) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, y) in &points {
        y0 = y0.min(*y);
        y1 = y1.max(*y);
    }

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Cyan))
            .data(&points),
    ];
    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title("log10 GDP"))
        .x_axis(
            Axis::default()
                .bounds([x0, x1])
                .labels(vec![format!("{x0:.0}"), format!("{x1:.0}")]),
        )
        .y_axis(
            Axis::default()
                .bounds([y0, y1])
                .labels(vec![format!("{y0:.1}"), format!("{y1:.1}")]),
        );
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usd_formatting_picks_the_right_unit() {
        assert_eq!(format_usd(2_500_000_000_000.0), "2.50 trn USD");
        assert_eq!(format_usd(3_000_000_000.0), "3.00 bln USD");
        assert_eq!(format_usd(4_500_000.0), "4.50 mln USD");
        assert_eq!(format_usd(12.5), "12.50 USD");
    }
}
