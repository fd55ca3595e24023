use crate::bank::{Question, QuestionKind};
use crate::quiz::QuizItem;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Tabs, Wrap},
};
use std::collections::HashSet;

/// Study modes, in tab order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Flashcards,
    Quiz,
    Mock,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Flashcards, Mode::Quiz, Mode::Mock];

    pub fn title(self) -> &'static str {
        match self {
            Mode::Flashcards => "Flashcards",
            Mode::Quiz => "Quiz",
            Mode::Mock => "Mock interview",
        }
    }

    pub fn index(self) -> usize {
        Mode::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn next(self) -> Mode {
        Mode::ALL[(self.index() + 1) % Mode::ALL.len()]
    }

    pub fn prev(self) -> Mode {
        Mode::ALL[(self.index() + Mode::ALL.len() - 1) % Mode::ALL.len()]
    }
}

/// Sidebar numbers for the filtered questions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub total: usize,
    pub due: usize,
    pub average: f64,
}

/// Main panel content
pub enum Body<'a> {
    Empty,
    Flashcard {
        question: &'a Question,
        show_answer: bool,
    },
    Quiz {
        item: &'a QuizItem,
        cursor: usize,
        chosen: Option<usize>,
    },
    Mock {
        question: &'a Question,
        show_answer: bool,
        timer: String,
        running: bool,
    },
}

/// Modal drawn over the main screen
pub enum Overlay<'a> {
    None,
    Topics {
        topics: &'a [String],
        selected: &'a HashSet<String>,
        cursor: usize,
    },
    ConfirmReset,
}

/// Everything needed to draw one frame
pub struct View<'a> {
    pub mode: Mode,
    pub position: usize,
    pub total: usize,
    pub stats: Stats,
    pub topics: &'a [String],
    pub selected_topics: &'a HashSet<String>,
    pub body: Body<'a>,
    pub status: Option<&'a str>,
    pub overlay: Overlay<'a>,
}

pub fn render(frame: &mut Frame, view: &View) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(30), Constraint::Fill(1)]).areas(frame.area());

    render_sidebar(frame, sidebar, view);

    let [tabs, body, status] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(main);

    let titles: Vec<&str> = Mode::ALL.iter().map(|m| m.title()).collect();
    let tabs_widget = Tabs::new(titles)
        .select(view.mode.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(tabs_widget, tabs);

    render_body(frame, body, view);

    if let Some(msg) = view.status {
        let message = Paragraph::new(msg)
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        frame.render_widget(message, status);
    }

    match &view.overlay {
        Overlay::None => {}
        Overlay::Topics {
            topics,
            selected,
            cursor,
        } => render_topics(frame, topics, selected, *cursor),
        Overlay::ConfirmReset => render_confirm_reset(frame),
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, view: &View) {
    let dim = Style::default().fg(Color::DarkGray);
    let active: Vec<&str> = view
        .topics
        .iter()
        .filter(|t| view.selected_topics.contains(*t))
        .map(String::as_str)
        .collect();
    let topics_line = if active.len() == view.topics.len() {
        "all".to_string()
    } else if active.is_empty() {
        "none".to_string()
    } else {
        active.join(", ")
    };

    let mut lines = vec![
        Line::from(Span::styled("Topics", dim)),
        Line::from(topics_line),
        Line::from(""),
        Line::from(format!("Total:   {}", view.stats.total)),
        Line::from(format!("Due:     {}", view.stats.due)),
        Line::from(format!("Avg:     {:.2}", view.stats.average)),
        Line::from(""),
    ];

    let keys: &[&str] = match view.mode {
        Mode::Flashcards => &["space  show answer", "1-5    grade"],
        Mode::Quiz => &["a-d    choose", "↑↓ ⏎   select"],
        Mode::Mock => &["space  show answer", "1-5    grade", "r      restart timer"],
    };
    lines.extend(keys.iter().map(|k| Line::from(Span::styled(*k, dim))));
    lines.extend(
        [
            "n      next",
            "tab    switch mode",
            "s      shuffle",
            "t      topics",
            "e      export",
            "R      reset progress",
            "q      quit",
        ]
        .iter()
        .map(|k| Line::from(Span::styled(*k, dim))),
    );

    let sidebar = Paragraph::new(lines)
        .block(Block::bordered().title(" jitprep "))
        .wrap(Wrap { trim: true });
    frame.render_widget(sidebar, area);
}

fn render_body(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::bordered().title(if view.total > 0 {
        format!(" {} / {} ", view.position + 1, view.total)
    } else {
        String::new()
    });

    let lines = match &view.body {
        Body::Empty => vec![Line::from(Span::styled(
            "No questions for selected topics.",
            Style::default().fg(Color::DarkGray),
        ))],
        Body::Flashcard {
            question,
            show_answer,
        } => {
            let mut lines = question_lines(question);
            if *show_answer {
                lines.push(Line::from(""));
                lines.extend(answer_lines(question));
            }
            lines
        }
        Body::Quiz {
            item,
            cursor,
            chosen,
        } => quiz_lines(item, *cursor, *chosen),
        Body::Mock {
            question,
            show_answer,
            timer,
            running,
        } => {
            let timer_style = if *running {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Red)
            };
            let mut lines = vec![
                Line::from(Span::styled(timer.clone(), timer_style)),
                Line::from(""),
            ];
            lines.extend(question_lines(question));
            if *show_answer {
                lines.push(Line::from(""));
                lines.extend(answer_lines(question));
            }
            lines
        }
    };

    let body = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(body, area);
}

fn question_lines(question: &Question) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            format!("Topic: {}", question.topic),
            Style::default().fg(Color::DarkGray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            question.prompt.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
    ]
}

/// Reference answer for a question
fn answer_lines(question: &Question) -> Vec<Line<'static>> {
    match &question.kind {
        QuestionKind::Open { answers } => answers
            .iter()
            .map(|a| Line::from(format!("• {}", a)))
            .collect(),
        QuestionKind::Mcq {
            options,
            answer,
            explain,
        } => {
            let mut lines = vec![Line::from(vec![
                Span::styled("Answer: ", Style::default().fg(Color::DarkGray)),
                Span::raw(options[*answer].clone()),
            ])];
            if let Some(explain) = explain {
                lines.push(Line::from(Span::styled(
                    explain.clone(),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            lines
        }
    }
}

fn quiz_lines(item: &QuizItem, cursor: usize, chosen: Option<usize>) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            item.prompt.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (i, option) in item.options.iter().enumerate() {
        let letter = (b'a' + i as u8) as char;
        let prefix = if i == cursor && chosen.is_none() { ">" } else { " " };
        let style = match chosen {
            Some(_) if i == item.answer => Style::default().fg(Color::Green),
            Some(c) if c == i => Style::default().fg(Color::Red),
            None if i == cursor => Style::default().fg(Color::Cyan),
            _ => Style::default().fg(Color::White),
        };
        lines.push(Line::from(Span::styled(
            format!("{} {}) {}", prefix, letter, option),
            style,
        )));
    }

    if let Some(c) = chosen {
        lines.push(Line::from(""));
        if item.is_correct(c) {
            lines.push(Line::from(Span::styled(
                "Correct!",
                Style::default().fg(Color::Green),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("Incorrect. {}", item.explain.as_deref().unwrap_or("")),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(Span::styled(
            "Press n for the next question",
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

/// Rectangle of at most `width` x `height` centered in `area`
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_topics(frame: &mut Frame, topics: &[String], selected: &HashSet<String>, cursor: usize) {
    let area = centered(frame.area(), 40, topics.len() as u16 + 4);

    let lines: Vec<Line> = topics
        .iter()
        .enumerate()
        .map(|(i, topic)| {
            let mark = if selected.contains(topic) { "[x]" } else { "[ ]" };
            let style = if i == cursor {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(format!("{} {}", mark, topic), style))
        })
        .collect();

    let list = Paragraph::new(lines).block(
        Block::bordered()
            .title(" Topics ")
            .title_bottom(" space toggle · a all · ⏎ done "),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(list, area);
}

fn render_confirm_reset(frame: &mut Frame) {
    let area = centered(frame.area(), 40, 5);

    let lines = vec![
        Line::from(Span::styled("Reset progress?", Style::default().fg(Color::Yellow))),
        Line::from(""),
        Line::from(Span::styled(
            "y to confirm, any other key to cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let confirm = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::bordered());
    frame.render_widget(Clear, area);
    frame.render_widget(confirm, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_cycle() {
        assert_eq!(Mode::Flashcards.next(), Mode::Quiz);
        assert_eq!(Mode::Mock.next(), Mode::Flashcards);
        assert_eq!(Mode::Flashcards.prev(), Mode::Mock);
    }

    #[test]
    fn test_centered() {
        let area = Rect::new(0, 0, 100, 50);
        assert_eq!(centered(area, 40, 10), Rect::new(30, 20, 40, 10));
        assert_eq!(centered(Rect::new(0, 0, 20, 5), 40, 10), Rect::new(0, 0, 20, 5));
    }
}
