use anyhow::Result;
use tracing::info;

/// One step of typing grades into another application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keystroke {
    Text(String),
    /// Move to the next input field (Tab).
    Advance,
}

/// Destination for simulated keyboard input.
pub trait KeySink {
    fn type_text(&mut self, text: &str) -> Result<()>;
    fn advance(&mut self) -> Result<()>;
}

/// Render a grade the way it is typed, e.g. `8` or `80%`.
pub fn format_grade(grade: i64, percent: bool) -> String {
    if percent {
        format!("{}%", grade)
    } else {
        grade.to_string()
    }
}

/// Keystroke sequence for a list of grades: value, then advance, per grade.
pub fn keystrokes(grades: &[i64], percent: bool) -> Vec<Keystroke> {
    grades
        .iter()
        .flat_map(|g| [Keystroke::Text(format_grade(*g, percent)), Keystroke::Advance])
        .collect()
}

/// Type every grade into the sink in order.
pub fn enter_grades<K: KeySink + ?Sized>(sink: &mut K, grades: &[i64], percent: bool) -> Result<()> {
    for key in keystrokes(grades, percent) {
        match key {
            Keystroke::Text(text) => sink.type_text(&text)?,
            Keystroke::Advance => sink.advance()?,
        }
    }
    info!(count = grades.len(), percent, "entered grades");
    Ok(())
}

#[cfg(feature = "automation")]
pub use enigo_sink::EnigoSink;

#[cfg(feature = "automation")]
mod enigo_sink {
    use super::KeySink;
    use anyhow::{anyhow, Result};
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    /// Sends keystrokes to whichever window currently has focus.
    pub struct EnigoSink {
        enigo: Enigo,
    }

    impl EnigoSink {
        pub fn new() -> Result<Self> {
            let enigo = Enigo::new(&Settings::default())
                .map_err(|e| anyhow!("Failed to connect to the input system: {}", e))?;
            Ok(Self { enigo })
        }
    }

    impl KeySink for EnigoSink {
        fn type_text(&mut self, text: &str) -> Result<()> {
            self.enigo
                .text(text)
                .map_err(|e| anyhow!("Failed to type '{}': {}", text, e))
        }

        fn advance(&mut self) -> Result<()> {
            self.enigo
                .key(Key::Tab, Direction::Click)
                .map_err(|e| anyhow!("Failed to press Tab: {}", e))
        }
    }
}

/// Open the platform keyboard backend.
#[cfg(feature = "automation")]
pub fn system_sink() -> Result<Box<dyn KeySink>> {
    Ok(Box::new(EnigoSink::new()?))
}

#[cfg(not(feature = "automation"))]
pub fn system_sink() -> Result<Box<dyn KeySink>> {
    anyhow::bail!("Grade entry requires building with the `automation` feature")
}
