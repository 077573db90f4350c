use std::io::{Write, stderr};
use std::time::Duration;

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use tokio::sync::oneshot;

use crate::ui::theme::Theme;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Progress indicator drawn on stderr by its own task until stopped.
pub struct Spinner {
    stop: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl Spinner {
    pub fn start(message: impl Into<String>, theme: Theme) -> Self {
        let message = message.into();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(FRAME_INTERVAL);
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = interval.tick() => {
                        draw(FRAMES[frame % FRAMES.len()], &message, &theme);
                        frame += 1;
                    }
                }
            }
            clear_line();
        });

        Self {
            stop: Some(stop),
            task,
        }
    }

    /// Stop animating and wait until the line has been cleared.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        let _ = (&mut self.task).await;
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.task.abort();
            clear_line();
        }
    }
}

fn draw(frame: &str, message: &str, theme: &Theme) {
    let mut err = stderr();
    let _ = queue!(err, MoveToColumn(0), Clear(ClearType::CurrentLine));
    let _ = if theme.enabled {
        queue!(
            err,
            PrintStyledContent(frame.with(theme.spinner)),
            Print(" "),
            PrintStyledContent(message.with(theme.key))
        )
    } else {
        queue!(err, Print(frame), Print(" "), Print(message))
    };
    let _ = err.flush();
}

fn clear_line() {
    let mut err = stderr();
    let _ = queue!(err, MoveToColumn(0), Clear(ClearType::CurrentLine));
    let _ = err.flush();
}
