//! The visible message panel.

use std::io::Write;

use super::history::Role;
use super::mood::BorderColor;

/// Handle of a rendered bubble, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BubbleId(pub usize);

/// Rendering surface the controller draws on.
pub trait ChatPanel: Send {
    /// Render a bubble at the end of the panel and scroll to it.
    ///
    /// Assistant bubbles carry feedback controls.
    fn append_bubble(&mut self, role: Role, text: &str) -> BubbleId;

    /// Replace the mood indicator line. An empty string clears it.
    fn set_mood_text(&mut self, text: &str);

    /// Change the panel border colour.
    fn set_border_color(&mut self, color: BorderColor);

    /// Reveal the feedback acknowledgement next to `bubble`.
    fn show_thanks(&mut self, bubble: BubbleId);
}

/// A bubble as recorded by [`PanelState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    /// Author.
    pub role: Role,
    /// Displayed text.
    pub text: String,
    /// Whether the feedback acknowledgement is visible.
    pub thanked: bool,
}

/// In-memory panel.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    /// Bubbles in render order.
    pub bubbles: Vec<Bubble>,
    /// Mood indicator line.
    pub mood_text: String,
    /// Border colour, `None` until first set.
    pub border: Option<BorderColor>,
}

impl PanelState {
    /// Empty panel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of all bubbles, in order.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        self.bubbles.iter().map(|b| b.text.as_str()).collect()
    }
}

impl ChatPanel for PanelState {
    fn append_bubble(&mut self, role: Role, text: &str) -> BubbleId {
        self.bubbles.push(Bubble {
            role,
            text: text.to_string(),
            thanked: false,
        });
        BubbleId(self.bubbles.len() - 1)
    }

    fn set_mood_text(&mut self, text: &str) {
        self.mood_text = text.to_string();
    }

    fn set_border_color(&mut self, color: BorderColor) {
        self.border = Some(color);
    }

    fn show_thanks(&mut self, bubble: BubbleId) {
        if let Some(b) = self.bubbles.get_mut(bubble.0) {
            b.thanked = true;
        }
    }
}

/// Panel that prints to a writer, normally stdout.
///
/// Assistant bubbles are numbered so feedback commands can refer to them.
#[derive(Debug)]
pub struct TerminalPanel<W> {
    out: W,
    next_id: usize,
}

impl TerminalPanel<std::io::Stdout> {
    /// Print to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalPanel<W> {
    /// Print to `out`.
    pub fn new(out: W) -> Self {
        Self { out, next_id: 0 }
    }

    /// Consume the panel and return the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // A closed stdout only loses display output.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ChatPanel for TerminalPanel<W> {
    fn append_bubble(&mut self, role: Role, text: &str) -> BubbleId {
        let id = BubbleId(self.next_id);
        self.next_id += 1;
        match role {
            Role::User => self.line(&format!("you  > {text}")),
            Role::Ai => self.line(&format!("ai   > {text}    [👍 👎 #{}]", id.0)),
        }
        id
    }

    fn set_mood_text(&mut self, text: &str) {
        if !text.is_empty() {
            self.line(&format!("       ~ {text}"));
        }
    }

    fn set_border_color(&mut self, color: BorderColor) {
        self.line(&format!("       ~ border: {color}"));
    }

    fn show_thanks(&mut self, bubble: BubbleId) {
        self.line(&format!("       ~ #{}: Thanks for your feedback", bubble.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_state_records_everything() {
        let mut panel = PanelState::new();
        let user = panel.append_bubble(Role::User, "hello");
        let ai = panel.append_bubble(Role::Ai, "hi");
        panel.set_mood_text("Mood detected: positive 😊");
        panel.set_border_color(BorderColor::Positive);
        panel.show_thanks(ai);

        assert_eq!(user, BubbleId(0));
        assert_eq!(panel.texts(), vec!["hello", "hi"]);
        assert!(!panel.bubbles[0].thanked);
        assert!(panel.bubbles[1].thanked);
        assert_eq!(panel.border, Some(BorderColor::Positive));
    }

    #[test]
    fn test_terminal_panel_output() {
        let mut panel = TerminalPanel::new(Vec::new());
        panel.append_bubble(Role::User, "hello");
        let ai = panel.append_bubble(Role::Ai, "hi there");
        panel.set_mood_text("");
        panel.set_border_color(BorderColor::Negative);
        panel.show_thanks(ai);

        let out = String::from_utf8(panel.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "you  > hello");
        assert!(lines[1].starts_with("ai   > hi there"));
        assert!(lines[1].ends_with("#1]"));
        assert_eq!(lines[2], "       ~ border: red");
        assert_eq!(lines[3], "       ~ #1: Thanks for your feedback");
    }
}
