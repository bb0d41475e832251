//! Dashboard panels: the flow diagram, stat cards, battery gauge and the
//! consumption sparkline.

use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::canvas::{self, Canvas, Circle, Points};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Sparkline};

use solarflow_core::{DashboardView, EnergyNode, EnergyState};

use super::theme::{AppTheme, BORDER_TYPE};
use super::widgets::{
    DIAGRAM_HEIGHT, DIAGRAM_WIDTH, autarky_color, battery_color, edge_midpoint, node_position,
    particle_points, sparkline_tail, trend_indicator,
};
use crate::format::{format_kwh, format_magnitude, format_price, format_watts};
use crate::tui::app::App;

/// Segments drawn even when nothing flows over them.
const ROUTES: [(EnergyNode, EnergyNode); 4] = [
    (EnergyNode::Solar, EnergyNode::House),
    (EnergyNode::Solar, EnergyNode::Battery),
    (EnergyNode::Battery, EnergyNode::House),
    (EnergyNode::Grid, EnergyNode::House),
];

const NODE_RADIUS: f64 = 42.0;

fn panel<'a>(title: &'a str, theme: &AppTheme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_inactive_style())
        .title(Span::styled(format!(" {} ", title), theme.title_style()))
}

/// Create a bordered stat card whose border takes the value color.
fn reading_card(
    title: &str,
    value: &str,
    color: Color,
    trend: Option<(&str, Color)>,
    theme: &AppTheme,
) -> Paragraph<'static> {
    let mut spans = vec![Span::styled(
        value.to_string(),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];

    if let Some((arrow, arrow_color)) = trend {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            arrow.to_string(),
            Style::default().fg(arrow_color),
        ));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BORDER_TYPE)
                .border_style(Style::default().fg(color))
                .title(format!(" {} ", title))
                .title_style(Style::default().fg(theme.text_primary)),
        )
}

/// Draw the whole dashboard body.
pub(super) fn draw_dashboard(frame: &mut Frame, area: Rect, app: &App) {
    let theme = app.app_theme();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(7)])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(40), Constraint::Length(34)])
        .split(rows[0]);

    match app.view() {
        Some(view) => {
            draw_flow_diagram(frame, top[0], view, app.animation.elapsed_secs(), &theme);
            draw_stat_cards(frame, top[1], &view.state, &theme);
        }
        None => {
            draw_waiting(frame, top[0], app, &theme);
            frame.render_widget(panel("Stats", &theme), top[1]);
        }
    }

    draw_consumption(frame, rows[1], app, &theme);
}

fn draw_waiting(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled(
                format!("{} ", app.spinner_char()),
                Style::default().fg(theme.primary),
            ),
            Span::styled(
                format!("Waiting for data from {}", app.source_label),
                Style::default().fg(theme.text_secondary),
            ),
        ]),
        Line::from(Span::styled(
            app.connection_state().to_string(),
            Style::default().fg(theme.text_muted),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel("Energy Flow", theme));
    frame.render_widget(paragraph, area);
}

/// Label shown under a node.
fn node_value(state: &EnergyState, node: EnergyNode) -> String {
    match node {
        EnergyNode::Battery => format!(
            "{}% {}",
            state.battery_level,
            format_watts(state.battery_power)
        ),
        other => format_watts(state.node_power(other)),
    }
}

fn draw_flow_diagram(
    frame: &mut Frame,
    area: Rect,
    view: &DashboardView,
    elapsed: f64,
    theme: &AppTheme,
) {
    let inner_width = f64::from(area.width.saturating_sub(2).max(1));
    // Canvas units per terminal column, for centering text.
    let column = DIAGRAM_WIDTH / inner_width;
    let centered = |x: f64, text: &str| x - column * text.chars().count() as f64 / 2.0;

    let diagram = Canvas::default()
        .block(panel("Energy Flow", theme))
        .marker(Marker::Braille)
        .x_bounds([0.0, DIAGRAM_WIDTH])
        .y_bounds([0.0, DIAGRAM_HEIGHT])
        .paint(|ctx| {
            for (from, to) in ROUTES {
                let (x1, y1) = node_position(from);
                let (x2, y2) = node_position(to);
                ctx.draw(&canvas::Line::new(x1, y1, x2, y2, theme.border_inactive));
            }

            for node in EnergyNode::ALL {
                let (x, y) = node_position(node);
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: NODE_RADIUS,
                    color: theme.node_color(node),
                });
            }

            ctx.layer();

            for edge in &view.flows {
                let color = theme.flow_color(edge.style);
                let points = particle_points(edge, elapsed);
                ctx.draw(&Points {
                    coords: &points,
                    color,
                });

                let label = format_magnitude(edge.magnitude);
                let (mx, my) = edge_midpoint(edge);
                ctx.print(
                    centered(mx, &label),
                    my + 18.0,
                    Span::styled(label, Style::default().fg(color)),
                );
            }

            for node in EnergyNode::ALL {
                let (x, y) = node_position(node);
                let name = node.label().to_string();
                ctx.print(
                    centered(x, &name),
                    y,
                    Span::styled(
                        name,
                        Style::default()
                            .fg(theme.node_color(node))
                            .add_modifier(Modifier::BOLD),
                    ),
                );
                let value = node_value(&view.state, node);
                ctx.print(
                    centered(x, &value),
                    y - NODE_RADIUS - 22.0,
                    Span::styled(value, Style::default().fg(theme.text_primary)),
                );
            }
        });

    frame.render_widget(diagram, area);
}

fn draw_stat_cards(frame: &mut Frame, area: Rect, state: &EnergyState, theme: &AppTheme) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let pair = |row: Rect| {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(row)
    };

    let row = pair(rows[0]);
    frame.render_widget(
        reading_card(
            "Solar",
            &format_watts(state.solar_power),
            theme.node_color(EnergyNode::Solar),
            None,
            theme,
        ),
        row[0],
    );
    frame.render_widget(
        reading_card(
            "House",
            &format_watts(state.house_consumption),
            theme.node_color(EnergyNode::House),
            None,
            theme,
        ),
        row[1],
    );

    let row = pair(rows[1]);
    let grid_color = if state.grid_flow > 0 {
        theme.danger
    } else if state.grid_flow < 0 {
        theme.info
    } else {
        theme.text_secondary
    };
    frame.render_widget(
        reading_card(
            &state.grid_status().to_string(),
            &format_watts(state.grid_flow.abs()),
            grid_color,
            None,
            theme,
        ),
        row[0],
    );
    frame.render_widget(
        reading_card(
            "Autarky",
            &format!("{}%", state.self_sufficiency),
            autarky_color(state.self_sufficiency, theme),
            None,
            theme,
        ),
        row[1],
    );

    let row = pair(rows[2]);
    frame.render_widget(
        reading_card(
            "Yield",
            &format_kwh(state.daily_yield),
            theme.node_color(EnergyNode::Solar),
            None,
            theme,
        ),
        row[0],
    );
    frame.render_widget(
        reading_card(
            "Forecast",
            &format_kwh(state.energy_forecast),
            theme.text_secondary,
            None,
            theme,
        ),
        row[1],
    );

    let row = pair(rows[3]);
    frame.render_widget(
        reading_card(
            "Price",
            &format_price(state.electricity_price),
            theme.primary,
            trend_indicator(state.price_trend(), theme),
            theme,
        ),
        row[0],
    );
    frame.render_widget(
        reading_card(
            "Outside",
            &format!("{:.1}°C", state.temperature),
            theme.text_secondary,
            None,
            theme,
        ),
        row[1],
    );

    let color = battery_color(state.battery_level, theme);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BORDER_TYPE)
                .border_style(Style::default().fg(color))
                .title(format!(" Battery ({}) ", state.battery_status()))
                .title_style(Style::default().fg(theme.text_primary)),
        )
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(state.battery_level.min(100)))
        .label(format!(
            "{}% {}",
            state.battery_level,
            format_watts(state.battery_power)
        ));
    frame.render_widget(gauge, rows[4]);
}

fn draw_consumption(frame: &mut Frame, area: Rect, app: &App, theme: &AppTheme) {
    let history = app.session.history();

    let mut title = vec![Span::styled(" House consumption ", theme.title_style())];
    if let (Some(avg), Some(min), Some(max)) = (history.average(), history.min(), history.max()) {
        title.push(Span::styled(
            format!(
                " Ø {}  min {}  max {} ",
                format_watts(avg),
                format_watts(min),
                format_watts(max)
            ),
            Style::default().fg(theme.text_secondary),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BORDER_TYPE)
        .border_style(theme.border_inactive_style())
        .title(Line::from(title));

    if history.is_empty() {
        let empty = Paragraph::new(Span::styled(
            "No samples yet",
            Style::default().fg(theme.text_muted),
        ))
        .alignment(Alignment::Center)
        .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let width = usize::from(area.width.saturating_sub(2));
    let data = sparkline_tail(history, width);
    let sparkline = Sparkline::default()
        .block(block)
        .data(&data)
        .style(Style::default().fg(theme.node_color(EnergyNode::House)));
    frame.render_widget(sparkline, area);
}
