use crate::bank::QuestionBank;
use crate::clock::SystemClock;
use crate::config::Config;
use crate::progress::ProgressStore;
use crate::quiz::QuizItem;
use crate::scheduler::QuizOutcome;
use crate::selection::WorkingSet;
use crate::storage::KeyValueStore;
use crate::timer::MockTimer;
use crate::transfer;
use crate::ui::{self, Body, Mode, Overlay, Stats, View};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{DefaultTerminal, Frame};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Progress store used by the application
pub type Store = ProgressStore<Box<dyn KeyValueStore>, SystemClock>;

/// Modal state layered over the current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    None,
    Topics { cursor: usize },
    ConfirmReset,
}

/// A quiz item being answered
struct QuizState {
    item: QuizItem,
    cursor: usize,
    chosen: Option<usize>,
}

/// Main application state
pub struct App {
    config: Config,
    bank: QuestionBank,
    store: Store,
    selected_topics: HashSet<String>,
    working: WorkingSet,
    mode: Mode,
    modal: Modal,
    show_answer: bool,
    quiz: Option<QuizState>,
    timer: MockTimer,
    status: Option<String>,
    should_exit: bool,
}

impl App {
    /// Create a new application with every topic selected
    pub fn new(config: Config, bank: QuestionBank, store: Store) -> Self {
        let selected_topics = bank.topics.iter().cloned().collect();
        let timer = MockTimer::new(config.mock_seconds);

        let mut app = Self {
            config,
            bank,
            store,
            selected_topics,
            working: WorkingSet::default(),
            mode: Mode::Flashcards,
            modal: Modal::None,
            show_answer: false,
            quiz: None,
            timer,
            status: None,
            should_exit: false,
        };
        app.apply_filters();
        app
    }

    /// Run the application
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        info!(questions = self.working.len(), "starting session");
        if self.working.is_empty() {
            warn!("question bank is empty");
        }

        while !self.should_exit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        self.timer.stop();
        Ok(())
    }

    /// Rebuild the working set from the selected topics
    fn apply_filters(&mut self) {
        self.working = WorkingSet::filtered(&self.bank.questions, &self.selected_topics);
        if self.config.shuffle_on_start {
            self.working.shuffle(&mut rand::rng());
        }
        self.reset_mode();
    }

    fn stats(&self) -> Stats {
        let ids = self.working.ids();
        Stats {
            total: ids.len(),
            due: self.store.due_count(&ids, self.store.now_ms()),
            average: self.store.average_score(&ids),
        }
    }

    fn switch_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.reset_mode();
    }

    /// Back to the first question of the current mode
    fn reset_mode(&mut self) {
        self.timer.stop();
        self.working.rewind(false);
        self.present(Instant::now());
    }

    /// Set up the current question for the active mode
    fn present(&mut self, now: Instant) {
        self.show_answer = false;
        self.quiz = None;

        let Some(question) = self.working.current() else {
            return;
        };

        match self.mode {
            Mode::Flashcards => {}
            Mode::Quiz => {
                let item = QuizItem::for_question(question, &self.bank.questions, &mut rand::rng());
                self.quiz = Some(QuizState {
                    item,
                    cursor: 0,
                    chosen: None,
                });
            }
            Mode::Mock => self.timer.restart(now),
        }
    }

    fn go_next(&mut self) {
        self.timer.stop();
        self.working.advance();
        self.present(Instant::now());
    }

    /// Grade the current question and move on
    fn grade_current(&mut self, grade: i64) {
        let Some(id) = self.working.current().map(|q| q.id.clone()) else {
            return;
        };

        if let Err(e) = self.store.record_grade(&id, grade) {
            error!(id = %id, error = %e, "failed to save grade");
            self.status = Some(format!("Could not save progress: {}", e));
        }
        self.go_next();
    }

    /// Answer the quiz item; only the first choice is scored
    fn choose(&mut self, choice: usize) {
        let Some(quiz) = &mut self.quiz else {
            return;
        };
        if quiz.chosen.is_some() || choice >= quiz.item.options.len() {
            return;
        }
        quiz.chosen = Some(choice);

        let outcome = if quiz.item.is_correct(choice) {
            QuizOutcome::Correct
        } else {
            QuizOutcome::Wrong
        };
        let grade = outcome.grade(self.config.quiz_correct_grade, self.config.quiz_wrong_grade);
        let id = quiz.item.id.clone();

        if let Err(e) = self.store.record_grade(&id, grade) {
            error!(id = %id, error = %e, "failed to save quiz result");
            self.status = Some(format!("Could not save progress: {}", e));
        }
    }

    fn shuffle(&mut self) {
        self.working.shuffle(&mut rand::rng());
        self.reset_mode();
    }

    fn export(&mut self) {
        self.status = Some(match transfer::export_to_dir(&self.store, &self.config.export_dir) {
            Ok(path) => format!("Progress exported to {}", path.display()),
            Err(e) => {
                error!(error = %e, "export failed");
                format!("Export failed: {}", e)
            }
        });
    }

    fn reset_progress(&mut self) {
        self.status = Some(match self.store.reset_all() {
            Ok(()) => "Progress reset".to_string(),
            Err(e) => {
                error!(error = %e, "reset failed");
                format!("Reset failed: {}", e)
            }
        });
    }

    /// Render the UI
    fn render(&self, frame: &mut Frame) {
        let body = match (self.working.current(), self.mode) {
            (None, _) => Body::Empty,
            (Some(question), Mode::Flashcards) => Body::Flashcard {
                question,
                show_answer: self.show_answer,
            },
            (Some(_), Mode::Quiz) => match &self.quiz {
                Some(quiz) => Body::Quiz {
                    item: &quiz.item,
                    cursor: quiz.cursor,
                    chosen: quiz.chosen,
                },
                None => Body::Empty,
            },
            (Some(question), Mode::Mock) => Body::Mock {
                question,
                show_answer: self.show_answer,
                timer: self.timer.display(),
                running: self.timer.is_running(),
            },
        };

        let overlay = match self.modal {
            Modal::None => Overlay::None,
            Modal::Topics { cursor } => Overlay::Topics {
                topics: &self.bank.topics,
                selected: &self.selected_topics,
                cursor,
            },
            Modal::ConfirmReset => Overlay::ConfirmReset,
        };

        let view = View {
            mode: self.mode,
            position: self.working.position(),
            total: self.working.len(),
            stats: self.stats(),
            topics: &self.bank.topics,
            selected_topics: &self.selected_topics,
            body,
            status: self.status.as_deref(),
            overlay,
        };
        ui::render(frame, &view);
    }

    /// Handle input events
    fn handle_events(&mut self) -> Result<()> {
        // Poll with timeout so the mock timer keeps ticking
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key);
            }
        }

        self.timer.poll(Instant::now());
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_exit = true;
            return;
        }

        match self.modal {
            Modal::Topics { cursor } => {
                self.handle_topics(key, cursor);
                return;
            }
            Modal::ConfirmReset => {
                self.modal = Modal::None;
                if key.code == KeyCode::Char('y') {
                    self.reset_progress();
                }
                return;
            }
            Modal::None => {}
        }

        self.status = None;

        match key.code {
            KeyCode::Char('q') => self.should_exit = true,
            KeyCode::Tab => self.switch_mode(self.mode.next()),
            KeyCode::BackTab => self.switch_mode(self.mode.prev()),
            KeyCode::Char('n') | KeyCode::Right => self.go_next(),
            KeyCode::Char('s') => self.shuffle(),
            KeyCode::Char('t') => self.modal = Modal::Topics { cursor: 0 },
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('R') => self.modal = Modal::ConfirmReset,
            _ => match self.mode {
                Mode::Flashcards => self.handle_flashcards(key),
                Mode::Quiz => self.handle_quiz(key),
                Mode::Mock => self.handle_mock(key),
            },
        }
    }

    fn handle_flashcards(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') => self.show_answer = !self.show_answer,
            KeyCode::Char(c @ '1'..='5') => self.grade_current(digit(c)),
            _ => {}
        }
    }

    fn handle_quiz(&mut self, key: KeyEvent) {
        let Some(quiz) = &mut self.quiz else {
            return;
        };
        let count = quiz.item.options.len();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => quiz.cursor = quiz.cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                quiz.cursor = (quiz.cursor + 1).min(count.saturating_sub(1))
            }
            KeyCode::Enter if quiz.chosen.is_some() => self.go_next(),
            KeyCode::Enter => {
                let cursor = quiz.cursor;
                self.choose(cursor);
            }
            KeyCode::Char(c @ 'a'..='d') => self.choose((c as u8 - b'a') as usize),
            KeyCode::Char(c @ '1'..='5') => self.grade_current(digit(c)),
            _ => {}
        }
    }

    fn handle_mock(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(' ') => self.show_answer = !self.show_answer,
            KeyCode::Char('r') => self.present(Instant::now()),
            KeyCode::Char(c @ '1'..='5') => self.grade_current(digit(c)),
            _ => {}
        }
    }

    fn handle_topics(&mut self, key: KeyEvent, cursor: usize) {
        let count = self.bank.topics.len();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.modal = Modal::Topics {
                    cursor: cursor.saturating_sub(1),
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.modal = Modal::Topics {
                    cursor: (cursor + 1).min(count.saturating_sub(1)),
                }
            }
            KeyCode::Char(' ') => {
                if let Some(topic) = self.bank.topics.get(cursor)
                    && !self.selected_topics.remove(topic)
                {
                    self.selected_topics.insert(topic.clone());
                }
            }
            KeyCode::Char('a') => {
                if self.selected_topics.len() == count {
                    self.selected_topics.clear();
                } else {
                    self.selected_topics = self.bank.topics.iter().cloned().collect();
                }
            }
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char('t') => {
                self.modal = Modal::None;
                self.apply_filters();
            }
            _ => {}
        }
    }
}

fn digit(c: char) -> i64 {
    c.to_digit(10).map(i64::from).unwrap_or(0)
}
