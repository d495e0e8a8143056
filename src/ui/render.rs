use crate::models::{GradeStats, ReconciledGrades};
use crate::report;
use crate::ui::state::{AppState, Session};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

const TITLE: &str = "Grade Tally";

pub fn render_ui(frame: &mut Frame, state: &AppState) {
    match state {
        AppState::ClassSelection {
            classes,
            selected_index,
        } => render_class_selection(frame, classes, *selected_index),
        AppState::Summary {
            session,
            file_index,
            grades,
            show_stats,
            scroll,
            status,
        } => render_summary(
            frame,
            session,
            *file_index,
            grades,
            *show_stats,
            *scroll,
            status.as_deref(),
        ),
        AppState::FileError {
            session,
            file_index,
            message,
        } => render_error(
            frame,
            &format!("{} ({})", session.file(*file_index), session.progress(*file_index)),
            message,
            "[Enter: Next File | Esc: Classes | q: Quit]",
        ),
        AppState::Complete { session } => render_complete(frame, session),
        AppState::Error { message } => {
            render_error(frame, "Error", message, "[Enter: Retry | q: Quit]")
        }
    }
}

fn highlight() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn help_bar(text: &str) -> Paragraph<'_> {
    Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
}

fn render_class_selection(frame: &mut Frame, classes: &[String], selected_index: usize) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let items: Vec<ListItem> = classes
        .iter()
        .enumerate()
        .map(|(i, class_name)| {
            let style = if i == selected_index {
                highlight()
            } else {
                Style::default()
            };

            let prefix = if i == selected_index { "> " } else { "  " };
            ListItem::new(format!("{}{}) {}", prefix, i + 1, class_name)).style(style)
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!("{} - Select a class for this session", TITLE))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(list, chunks[0]);

    let help = format!(
        "Found: {} class(es) | [↑↓: Navigate | Enter: Select | q: Quit]",
        classes.len()
    );
    frame.render_widget(help_bar(&help), chunks[1]);
}

fn render_summary(
    frame: &mut Frame,
    session: &Session,
    file_index: usize,
    grades: &ReconciledGrades,
    show_stats: bool,
    scroll: u16,
    status: Option<&str>,
) {
    let area = frame.area();

    let stats_height = if show_stats { 7 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(stats_height),
            Constraint::Length(3),
        ])
        .split(area);

    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled("File: ", bold()),
            Span::raw(session.file(file_index)),
            Span::raw(format!("  ({})", session.progress(file_index))),
        ]),
        Line::from(vec![
            Span::styled("Class: ", bold()),
            Span::raw(&session.roster.class_name),
            Span::raw(format!("  ({} students)", session.roster.len())),
        ]),
    ])
    .block(
        Block::default()
            .title(TITLE)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    frame.render_widget(info, chunks[0]);

    let lines: Vec<Line> = grades
        .iter()
        .map(|(name, grade)| {
            let style = if *grade == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!("{:<3} ", grade), style.add_modifier(Modifier::BOLD)),
                Span::styled(name.clone(), style),
            ])
        })
        .collect();

    let list = Paragraph::new(lines)
        .block(Block::default().title("Grades").borders(Borders::ALL))
        .scroll((scroll, 0));

    frame.render_widget(list, chunks[1]);

    if show_stats {
        let stats = GradeStats::calculate(grades);
        let text: Vec<Line> = report::stats_lines(&stats).into_iter().map(Line::from).collect();
        let panel = Paragraph::new(text).block(
            Block::default()
                .title("Statistics (non-zero grades)")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(panel, chunks[2]);
    }

    let help = match status {
        Some(status) => status.to_string(),
        None => "[Enter: Next File | ↑↓: Scroll | s: Statistics | e: Export | Esc: Classes | q: Quit]"
            .to_string(),
    };
    frame.render_widget(help_bar(&help), chunks[3]);
}

fn render_complete(frame: &mut Frame, session: &Session) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let text = vec![
        Line::from(Span::styled(
            "All grade files reviewed",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Class: ", bold()),
            Span::raw(&session.roster.class_name),
        ]),
        Line::from(vec![
            Span::styled("Files: ", bold()),
            Span::raw(session.files.len().to_string()),
        ]),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, chunks[0]);
    frame.render_widget(help_bar("[Enter: Choose Another Class | q: Quit]"), chunks[1]);
}

fn render_error(frame: &mut Frame, title: &str, message: &str, help: &str) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let text = vec![
        Line::from(vec![Span::styled(
            "Error",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from(message),
    ];

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, chunks[0]);
    frame.render_widget(help_bar(help), chunks[1]);
}
