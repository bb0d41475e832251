//! Color palette for the dashboard.
//!
//! UI chrome follows the Tailwind slate/cyan scale; energy flows always use
//! the fixed [`FlowStyle`] colors so that solar stays amber and grid import
//! stays red in both themes.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::BorderType;

use solarflow_core::{EnergyNode, FlowStyle};

/// Application theme with all UI colors.
#[derive(Debug, Clone, Copy)]
pub struct AppTheme {
    pub primary: Color,

    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,

    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,

    pub border_active: Color,
    pub border_inactive: Color,

    /// Frame background; `Reset` keeps the terminal's own.
    pub bg: Color,
    pub bg_header: Color,
}

impl Default for AppTheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl AppTheme {
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            primary: Color::Rgb(34, 211, 238), // cyan-400

            success: Color::Rgb(74, 222, 128), // green-400
            warning: Color::Rgb(251, 191, 36), // amber-400
            danger: Color::Rgb(248, 113, 113), // red-400
            info: Color::Rgb(96, 165, 250),    // blue-400

            text_primary: Color::Rgb(248, 250, 252),   // slate-50
            text_secondary: Color::Rgb(148, 163, 184), // slate-400
            text_muted: Color::Rgb(100, 116, 139),     // slate-500

            border_active: Color::Rgb(34, 211, 238),  // cyan-400
            border_inactive: Color::Rgb(71, 85, 105), // slate-600

            bg: Color::Reset,
            bg_header: Color::Rgb(30, 41, 59), // slate-800
        }
    }

    #[must_use]
    pub const fn light() -> Self {
        Self {
            primary: Color::Rgb(6, 182, 212), // cyan-500

            success: Color::Rgb(22, 163, 74), // green-600
            warning: Color::Rgb(217, 119, 6), // amber-600
            danger: Color::Rgb(220, 38, 38),  // red-600
            info: Color::Rgb(37, 99, 235),    // blue-600

            text_primary: Color::Rgb(15, 23, 42),    // slate-900
            text_secondary: Color::Rgb(71, 85, 105), // slate-600
            text_muted: Color::Rgb(148, 163, 184),   // slate-400

            border_active: Color::Rgb(6, 182, 212),     // cyan-500
            border_inactive: Color::Rgb(203, 213, 225), // slate-300

            bg: Color::White,
            bg_header: Color::Rgb(241, 245, 249), // slate-100
        }
    }

    /// Stroke color of a flow edge.
    #[must_use]
    pub const fn flow_color(&self, style: FlowStyle) -> Color {
        let (r, g, b) = style.rgb();
        Color::Rgb(r, g, b)
    }

    /// Accent color of a node circle and its card border.
    #[must_use]
    pub const fn node_color(&self, node: EnergyNode) -> Color {
        match node {
            EnergyNode::Solar => self.flow_color(FlowStyle::Solar),
            EnergyNode::Battery => self.flow_color(FlowStyle::Battery),
            EnergyNode::Grid => self.text_secondary,
            EnergyNode::House => self.primary,
        }
    }

    #[inline]
    #[must_use]
    pub fn border_active_style(&self) -> Style {
        Style::default().fg(self.border_active)
    }

    #[inline]
    #[must_use]
    pub fn border_inactive_style(&self) -> Style {
        Style::default().fg(self.border_inactive)
    }

    #[inline]
    #[must_use]
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[inline]
    #[must_use]
    pub fn header_style(&self) -> Style {
        Style::default().bg(self.bg_header)
    }
}

/// Default border type for all blocks.
pub const BORDER_TYPE: BorderType = BorderType::Rounded;
