//! TOML run configuration: fonts, layout settings, placement policies and the task list.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Deserialize;

use crate::error::RenderError;
use crate::highlight::LanguageRegistry;
use crate::theme::Color;

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub background_image: Option<PathBuf>,
    /// Font family name -> font file.
    #[serde(default)]
    pub fonts: HashMap<String, PathBuf>,
    #[serde(default)]
    pub font_settings: FontSettings,
    #[serde(default)]
    pub code_block_position: VerticalPosition,
    #[serde(default)]
    pub code_block_horizontal_position: HorizontalAlign,
    pub group_element: Option<GroupElement>,
    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Horizontal alignment for title, footer and panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    #[default]
    Start,
    Center,
    Right,
}

/// Vertical placement policy for the code/image panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalPosition {
    #[default]
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    pub font_family: String,
    /// Family for the code panel; falls back to `font_family` when unset.
    pub code_font_family: Option<String>,
    pub title_size: f32,
    pub code_size: f32,
    pub footer_size: f32,
    pub title_color: Color,
    pub code_color: Color,
    pub footer_color: Color,
    pub code_background: Color,
    pub highlight: HighlightColors,
    pub panel_padding: f32,
    pub panel_radius: f32,
    pub panel_border_color: Color,
    pub title_align: HorizontalAlign,
    pub footer_align: HorizontalAlign,
    pub title_top_margin: f32,
    pub footer_bottom_margin: f32,
}

/// Per-category syntax colors. Unset entries fall back along the dispatch chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HighlightColors {
    pub comment: Option<Color>,
    pub string: Option<Color>,
    pub number: Option<Color>,
    pub keyword: Option<Color>,
    pub function: Option<Color>,
    pub parameter: Option<Color>,
    pub variable: Option<Color>,
    pub operator: Option<Color>,
    pub punctuation: Option<Color>,
}

impl Default for FontSettings {
    fn default() -> Self {
        FontSettings {
            font_family: "sans".into(),
            code_font_family: None,
            title_size: 24.0,
            code_size: 16.0,
            footer_size: 16.0,
            title_color: Color::BLACK,
            code_color: Color::rgb(0xd4, 0xd4, 0xd4),
            footer_color: Color::rgb(0x55, 0x55, 0x55),
            code_background: Color::rgb(0x1e, 0x1e, 0x1e),
            highlight: HighlightColors::default(),
            panel_padding: 10.0,
            panel_radius: 8.0,
            panel_border_color: Color::rgb(0x44, 0x44, 0x44),
            title_align: HorizontalAlign::Start,
            footer_align: HorizontalAlign::Start,
            title_top_margin: 40.0,
            footer_bottom_margin: 20.0,
        }
    }
}

impl FontSettings {
    pub fn code_family(&self) -> &str {
        self.code_font_family.as_deref().unwrap_or(&self.font_family)
    }

    /// Line advance used by title, footer and code panel alike.
    pub fn line_height(size: f32) -> f32 {
        size + 5.0
    }
}

/// Small decorative element anchored to the bottom-right corner.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupElement {
    Text {
        content: String,
        #[serde(default = "default_group_font_size")]
        font_size: f32,
        #[serde(default = "default_group_font_color")]
        font_color: Color,
        font_family: Option<String>,
        #[serde(default)]
        margin_right: f32,
        #[serde(default)]
        margin_bottom: f32,
    },
    Image {
        image_path: PathBuf,
        #[serde(default)]
        margin_right: f32,
        #[serde(default)]
        margin_bottom: f32,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSpec {
    pub title: Option<String>,
    pub number: Option<TaskNumber>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub image: Option<PathBuf>,
    pub bottom_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TaskNumber {
    Int(i64),
    Text(String),
}

impl fmt::Display for TaskNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskNumber::Int(n) => write!(f, "{n}"),
            TaskNumber::Text(s) => f.write_str(s),
        }
    }
}

impl TaskSpec {
    /// Title and number are the two inputs without which no image is produced.
    pub fn require_identity(&self) -> Result<(&str, &TaskNumber), RenderError> {
        let title = self
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RenderError::Configuration("task title is missing".into()))?;
        let number = self
            .number
            .as_ref()
            .filter(|n| !matches!(n, TaskNumber::Text(s) if s.trim().is_empty()))
            .ok_or_else(|| RenderError::Configuration(format!("task {title:?} has no number")))?;
        Ok((title, number))
    }
}

impl RunConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, RenderError> {
        toml::from_str(content).map_err(|source| RenderError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read, parse, validate and resolve relative paths against the config's directory.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let content = std::fs::read_to_string(path).map_err(|e| RenderError::io(path, e))?;
        let mut config = Self::parse(&content, path)?;
        config.validate()?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        info!("Loaded {} tasks from {}", config.tasks.len(), path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        let fs = &self.font_settings;
        for (name, size) in [
            ("title_size", fs.title_size),
            ("code_size", fs.code_size),
            ("footer_size", fs.footer_size),
        ] {
            if !(size > 0.0) {
                return Err(RenderError::Configuration(format!("{name} must be positive, got {size}")));
            }
        }
        for (name, value) in [
            ("panel_padding", fs.panel_padding),
            ("panel_radius", fs.panel_radius),
            ("title_top_margin", fs.title_top_margin),
            ("footer_bottom_margin", fs.footer_bottom_margin),
        ] {
            if !(value >= 0.0) {
                return Err(RenderError::Configuration(format!("{name} must not be negative, got {value}")));
            }
        }
        if let Some(GroupElement::Text { font_size, .. }) = &self.group_element {
            if !(*font_size > 0.0) {
                return Err(RenderError::Configuration("group_element.font_size must be positive".into()));
            }
        }
        if self.tasks.is_empty() {
            return Err(RenderError::Configuration("no tasks configured".into()));
        }
        if self.fonts.is_empty() {
            warn!("No fonts registered; text will not be painted");
        }
        let registry = LanguageRegistry::builtin();
        for task in &self.tasks {
            let has_code = task.code.as_deref().is_some_and(|c| !c.is_empty());
            let language = task.language.as_deref().unwrap_or_default();
            if has_code && !registry.supports(language) {
                warn!("Task {:?}: no grammar for language {language:?}; its code panel will be skipped", task.title);
            }
        }
        Ok(())
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.output_dir);
        if let Some(bg) = self.background_image.as_mut() {
            resolve(bg);
        }
        for path in self.fonts.values_mut() {
            resolve(path);
        }
        if let Some(GroupElement::Image { image_path, .. }) = self.group_element.as_mut() {
            resolve(image_path);
        }
        for task in &mut self.tasks {
            if let Some(image) = task.image.as_mut() {
                resolve(image);
            }
        }
    }

    /// Config lookup chain:
    /// 1. explicit path from the command line
    /// 2. $TASKCARD_CONFIG
    /// 3. ./taskcard.toml
    pub fn find(explicit: Option<PathBuf>) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = vec![
            explicit,
            std::env::var("TASKCARD_CONFIG").ok().map(PathBuf::from),
            Some(PathBuf::from("taskcard.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        candidates.into_iter().find(|p| {
            let exists = p.exists();
            if !exists {
                info!("No config at {}", p.display());
            }
            exists
        })
    }
}

fn default_output_dir() -> PathBuf { PathBuf::from("output") }
fn default_group_font_size() -> f32 { 14.0 }
fn default_group_font_color() -> Color { Color::BLACK }
