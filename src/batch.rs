//! Batch driver: renders every configured task and writes `task_<number>.png` files.
//!
//! Each task owns its surface, so tasks are spread over scoped worker threads with no
//! shared mutable state. Fonts and the background are loaded once and shared read-only.

use std::path::{Path, PathBuf};
use std::thread;

use log::{error, info};

use crate::compose::{load_background, render_task_png};
use crate::config::{RunConfig, TaskNumber, TaskSpec};
use crate::error::RenderError;
use crate::image::RasterImage;
use crate::theme::FontBook;

#[derive(Debug, Default)]
pub struct BatchReport {
    pub written: Vec<PathBuf>,
    /// Task label (title or position) and the reason it produced no file.
    pub failed: Vec<(String, RenderError)>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// `task_<number>.png`, with path separators in string numbers replaced.
pub fn output_file_name(number: &TaskNumber) -> String {
    let number = number.to_string().replace(['/', '\\'], "_");
    format!("task_{number}.png")
}

/// Render all tasks of `config`. Only failing to create the output directory aborts the
/// run; per-task failures are logged and collected in the report.
pub fn run_batch(config: &RunConfig) -> Result<BatchReport, RenderError> {
    std::fs::create_dir_all(&config.output_dir).map_err(|e| RenderError::io(&config.output_dir, e))?;

    let fonts = FontBook::load(&config.fonts);
    let background = load_background(config.background_image.as_deref());
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, config.tasks.len().max(1));

    let results: Vec<(usize, Result<PathBuf, RenderError>)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let fonts = &fonts;
                let background = background.as_ref();
                scope.spawn(move || {
                    config
                        .tasks
                        .iter()
                        .enumerate()
                        .skip(worker)
                        .step_by(workers)
                        .map(|(i, task)| (i, render_one(task, config, fonts, background)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(results) => results,
                Err(_) => {
                    error!("Render worker panicked");
                    Vec::new()
                }
            })
            .collect()
    });

    let mut ordered = results;
    ordered.sort_by_key(|(i, _)| *i);

    let mut report = BatchReport::default();
    for (i, result) in ordered {
        match result {
            Ok(path) => report.written.push(path),
            Err(e) => {
                let label = task_label(&config.tasks[i], i);
                error!("Task {label} failed: {e}");
                report.failed.push((label, e));
            }
        }
    }
    info!("Wrote {} images, {} failed", report.written.len(), report.failed.len());
    Ok(report)
}

fn render_one(
    task: &TaskSpec,
    config: &RunConfig,
    fonts: &FontBook,
    background: Option<&RasterImage>,
) -> Result<PathBuf, RenderError> {
    let (_, number) = task.require_identity()?;
    let bytes = render_task_png(task, config, fonts, background)?;
    let path = config.output_dir.join(output_file_name(number));
    write_file(&path, &bytes)?;
    info!("Saved {}", path.display());
    Ok(path)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    std::fs::write(path, bytes).map_err(|e| RenderError::io(path, e))
}

fn task_label(task: &TaskSpec, index: usize) -> String {
    match (&task.title, &task.number) {
        (_, Some(number)) => format!("#{number}"),
        (Some(title), None) => format!("{title:?}"),
        (None, None) => format!("at position {}", index + 1),
    }
}
