use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

// Help section structure
pub struct HelpSection {
    pub title: &'static str,
    pub items: &'static [(&'static str, &'static str)],
}

// Help section definitions
pub const SECTIONS: &[HelpSection] = &[
    HelpSection {
        title: "List:",
        items: &[
            ("j/↓", "Select next formula"),
            ("k/↑", "Select previous formula"),
            ("g  ", "Select first"),
            ("G  ", "Select last"),
            ("J/K", "Move formula down/up"),
            ("a/o", "Add formula"),
            ("e/⏎", "Edit formula"),
            ("d  ", "Delete formula"),
        ],
    },
    HelpSection {
        title: "Editor:",
        items: &[
            ("C-s", "Save formula (also Alt+⏎)"),
            ("C-d", "Discard changes"),
            ("C-r", "Retry a stalled save"),
            ("⏎  ", "New line"),
            ("C-v", "Paste"),
            ("C-w", "Delete word"),
            ("C-k", "Delete to end of line"),
            ("C-u", "Delete to start of line"),
        ],
    },
    HelpSection {
        title: "Copy:",
        items: &[
            ("y  ", "Copy in the default format"),
            ("c  ", "Cycle the default format"),
            ("1  ", "Copy as SVG image"),
            ("2  ", "Copy as SVG markup"),
            ("3  ", "Copy as PNG image"),
            ("4  ", "Copy as PNG file"),
            ("5  ", "Copy LaTeX source"),
        ],
    },
    HelpSection {
        title: "File:",
        items: &[
            ("s  ", "Save"),
            ("S  ", "Save as (type a path, ⏎ to confirm)"),
            ("O  ", "Open a list after the current one"),
            ("q  ", "Quit"),
            ("Q  ", "Quit without saving"),
        ],
    },
];

// Help renderer
pub struct HelpRenderer;

impl HelpRenderer {
    pub fn render(frame: &mut Frame, area: Rect) {
        let help_text = Self::build_help_text();
        let block = Block::default().borders(Borders::ALL).title(" Help ");
        let paragraph = Paragraph::new(help_text)
            .block(block)
            .wrap(Wrap { trim: false });

        frame.render_widget(paragraph, area);
    }

    fn build_help_text() -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(vec![Span::styled(
                "mathmemo Help",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];

        for section in SECTIONS {
            lines.push(Line::from(vec![Span::styled(
                section.title,
                Style::default().add_modifier(Modifier::BOLD),
            )]));

            for (key, desc) in section.items {
                lines.push(Line::from(format!("  {}  {}", key, desc)));
            }

            lines.push(Line::from(""));
        }

        lines.push(Line::from("Press ESC or q to close help"));
        lines
    }
}
