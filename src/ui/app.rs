use crate::export;
use crate::reconcile;
use crate::roster::RosterStore;
use crate::store::GradeStore;
use crate::ui::render::render_ui;
use crate::ui::state::{AppState, Session};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

pub struct App {
    roster_store: RosterStore,
    grade_store: GradeStore,
    export_dir: PathBuf,
    state: AppState,
}

impl App {
    pub fn new(roster_store: RosterStore, grade_store: GradeStore, export_dir: PathBuf) -> Self {
        let mut app = Self {
            roster_store,
            grade_store,
            export_dir,
            state: AppState::Error {
                message: String::new(),
            },
        };
        app.load_classes();
        app
    }

    #[cfg(test)]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Main event loop
        let result = self.event_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| render_ui(f, &self.state))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key_event(key) {
                        break; // User quit
                    }
                }
            }
        }

        Ok(())
    }

    fn load_classes(&mut self) {
        self.state = match self.roster_store.list_classes() {
            Ok(classes) => AppState::ClassSelection {
                classes,
                selected_index: 0,
            },
            Err(e) => {
                error!("failed to list classes: {}", e);
                AppState::Error {
                    message: e.to_string(),
                }
            }
        };
    }

    fn start_session(&mut self, class_name: &str) {
        let session = self
            .roster_store
            .load(class_name)
            .and_then(|roster| {
                let files = self.grade_store.list_files()?;
                Ok(Session { roster, files })
            });

        match session {
            Ok(session) => {
                info!(class = class_name, files = session.files.len(), "session started");
                self.open_file(session, 0);
            }
            Err(e) => {
                self.state = AppState::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Reconcile the file at `file_index`, or finish when past the last one.
    fn open_file(&mut self, session: Session, file_index: usize) {
        if file_index >= session.files.len() {
            self.state = AppState::Complete { session };
            return;
        }

        let file_name = session.file(file_index).to_string();
        let result = self
            .grade_store
            .load(&file_name)
            .and_then(|table| reconcile::reconcile_table(&session.roster, &table));

        self.state = match result {
            Ok(grades) => AppState::Summary {
                session,
                file_index,
                grades,
                show_stats: false,
                scroll: 0,
                status: None,
            },
            Err(e) => {
                error!(file = %file_name, "failed to reconcile: {}", e);
                AppState::FileError {
                    session,
                    file_index,
                    message: e.to_string(),
                }
            }
        };
    }

    /// Returns true when the user asked to quit.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.handle_key(key.code)
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        if code == KeyCode::Char('q') {
            return true;
        }

        // Take ownership of the state so each arm can move its fields
        let current_state = std::mem::replace(
            &mut self.state,
            AppState::Error {
                message: String::new(),
            },
        );

        match current_state {
            AppState::ClassSelection {
                classes,
                mut selected_index,
            } => match code {
                KeyCode::Up => {
                    selected_index = selected_index.saturating_sub(1);
                    self.state = AppState::ClassSelection {
                        classes,
                        selected_index,
                    };
                }
                KeyCode::Down => {
                    if selected_index < classes.len().saturating_sub(1) {
                        selected_index += 1;
                    }
                    self.state = AppState::ClassSelection {
                        classes,
                        selected_index,
                    };
                }
                KeyCode::Enter if !classes.is_empty() => {
                    let class_name = classes[selected_index].clone();
                    self.start_session(&class_name);
                }
                _ => {
                    self.state = AppState::ClassSelection {
                        classes,
                        selected_index,
                    };
                }
            },
            AppState::Summary {
                session,
                file_index,
                grades,
                show_stats,
                scroll,
                status,
            } => match code {
                KeyCode::Enter | KeyCode::Right => self.open_file(session, file_index + 1),
                KeyCode::Esc => self.load_classes(),
                KeyCode::Char('s') => {
                    self.state = AppState::Summary {
                        session,
                        file_index,
                        grades,
                        show_stats: !show_stats,
                        scroll,
                        status,
                    };
                }
                KeyCode::Char('e') => {
                    let status = match export::export_to_csv(
                        &grades,
                        &session.roster.class_name,
                        session.file(file_index),
                        &self.export_dir,
                    ) {
                        Ok(path) => format!("Exported to {}", path.display()),
                        Err(e) => format!("Export failed: {}", e),
                    };
                    self.state = AppState::Summary {
                        session,
                        file_index,
                        grades,
                        show_stats,
                        scroll,
                        status: Some(status),
                    };
                }
                KeyCode::Up | KeyCode::Down => {
                    let scroll = if code == KeyCode::Up {
                        scroll.saturating_sub(1)
                    } else {
                        scroll.saturating_add(1).min(grades.len() as u16)
                    };
                    self.state = AppState::Summary {
                        session,
                        file_index,
                        grades,
                        show_stats,
                        scroll,
                        status,
                    };
                }
                _ => {
                    self.state = AppState::Summary {
                        session,
                        file_index,
                        grades,
                        show_stats,
                        scroll,
                        status,
                    };
                }
            },
            AppState::FileError {
                session,
                file_index,
                message,
            } => match code {
                KeyCode::Enter => self.open_file(session, file_index + 1),
                KeyCode::Esc => self.load_classes(),
                _ => {
                    self.state = AppState::FileError {
                        session,
                        file_index,
                        message,
                    };
                }
            },
            AppState::Complete { session } => match code {
                KeyCode::Enter | KeyCode::Esc => self.load_classes(),
                _ => self.state = AppState::Complete { session },
            },
            AppState::Error { message } => match code {
                KeyCode::Enter | KeyCode::Esc => self.load_classes(),
                _ => self.state = AppState::Error { message },
            },
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Dialect;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Surname,First name,State,Grade/10.00,Q. 1 /5.00,Q. 2 /5.00\n";

    fn fixture() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let classes = dir.path().join("classes");
        let grades = dir.path().join("grades");
        fs::create_dir_all(&classes).unwrap();
        fs::create_dir_all(&grades).unwrap();

        fs::write(classes.join("10.8.txt"), "Doe Jane\nSmith John\n").unwrap();
        fs::write(classes.join("9.1.txt"), "Lee Ann\n").unwrap();
        fs::write(
            grades.join("a.csv"),
            format!(
                "{}Doe,Jane,Finished,8.4,4,4.4\nSmith,John,In progress,-,3,-\nOverall average,,,8.4,,\n",
                HEADER
            ),
        )
        .unwrap();
        fs::write(
            grades.join("b.csv"),
            format!("{}Stranger,Someone,Finished,5,,\n", HEADER),
        )
        .unwrap();
        fs::write(grades.join("c.csv"), HEADER).unwrap();

        let app = App::new(
            RosterStore::new(classes),
            GradeStore::new(grades, Dialect::Auto),
            dir.path().to_path_buf(),
        );
        (dir, app)
    }

    #[test]
    fn test_starts_at_class_selection() {
        let (_dir, app) = fixture();
        match app.state() {
            AppState::ClassSelection {
                classes,
                selected_index,
            } => {
                assert_eq!(classes, &vec!["10.8".to_string(), "9.1".to_string()]);
                assert_eq!(*selected_index, 0);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let (_dir, mut app) = fixture();
        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Down);
        match app.state() {
            AppState::ClassSelection { selected_index, .. } => assert_eq!(*selected_index, 1),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_walks_through_files() {
        let (_dir, mut app) = fixture();
        assert!(!app.handle_key(KeyCode::Enter));

        match app.state() {
            AppState::Summary {
                file_index, grades, ..
            } => {
                assert_eq!(*file_index, 0);
                assert_eq!(grades["Doe Jane"], 8);
                assert_eq!(grades["Smith John"], 3);
            }
            other => panic!("unexpected state: {other:?}"),
        }

        app.handle_key(KeyCode::Char('s'));
        assert!(matches!(app.state(), AppState::Summary { show_stats: true, .. }));

        app.handle_key(KeyCode::Enter);
        match app.state() {
            AppState::FileError { message, file_index, .. } => {
                assert_eq!(*file_index, 1);
                assert!(message.contains("Stranger Someone"));
            }
            other => panic!("unexpected state: {other:?}"),
        }

        app.handle_key(KeyCode::Enter);
        match app.state() {
            AppState::Summary { file_index, grades, .. } => {
                assert_eq!(*file_index, 2);
                assert!(grades.values().all(|g| *g == 0));
            }
            other => panic!("unexpected state: {other:?}"),
        }

        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.state(), AppState::Complete { .. }));

        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.state(), AppState::ClassSelection { .. }));
    }

    #[test]
    fn test_export_sets_status() {
        let (dir, mut app) = fixture();
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('e'));
        match app.state() {
            AppState::Summary { status: Some(status), .. } => {
                assert!(status.starts_with("Exported to"));
            }
            other => panic!("unexpected state: {other:?}"),
        }
        let exported = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .any(|e| e.file_name().to_string_lossy().starts_with("results_10.8_a_"));
        assert!(exported);
    }

    #[test]
    fn test_missing_dirs_show_error() {
        let dir = TempDir::new().unwrap();
        let app = App::new(
            RosterStore::new(dir.path().join("classes")),
            GradeStore::new(dir.path().join("grades"), Dialect::Auto),
            dir.path().to_path_buf(),
        );
        match app.state() {
            AppState::Error { message } => assert!(message.contains("/classes")),
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_quit() {
        let (_dir, mut app) = fixture();
        assert!(app.handle_key(KeyCode::Char('q')));
    }
}
