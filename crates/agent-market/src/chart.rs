//! Chart rendering
//!
//! Charts are written as standalone SVG files: candlesticks with a volume
//! panel, plus MA overlays, a MACD panel and an RSI panel depending on the
//! chart kind. Rising bars are red and falling bars green, as on mainland
//! exchanges.

use crate::error::{MarketError, Result};
use crate::indicators::IndicatorFrame;
use crate::signals::{RSI_OVERBOUGHT, RSI_OVERSOLD};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Which chart to draw
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Auto,
    Basic,
    Ma,
    Macd,
    Comprehensive,
}

impl ChartKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "basic" => Some(Self::Basic),
            "ma" => Some(Self::Ma),
            "macd" => Some(Self::Macd),
            "comprehensive" => Some(Self::Comprehensive),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Basic => "basic",
            Self::Ma => "ma",
            Self::Macd => "macd",
            Self::Comprehensive => "comprehensive",
        }
    }

    /// Pick a concrete kind for `Auto` from the columns present
    pub fn resolve(self, frame: &IndicatorFrame) -> Self {
        if self != Self::Auto {
            return self;
        }
        let has_ma = !frame.ma_columns().is_empty();
        let has_macd = frame.has("macd");
        let has_rsi = frame.has("rsi_14");

        if has_ma && has_macd && has_rsi {
            Self::Comprehensive
        } else if has_macd {
            Self::Macd
        } else if has_ma {
            Self::Ma
        } else {
            Self::Basic
        }
    }

    fn file_stem(self) -> &'static str {
        match self {
            Self::Auto | Self::Basic => "kline",
            Self::Ma => "kline_ma",
            Self::Macd => "kline_macd",
            Self::Comprehensive => "comprehensive",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    Dark,
    #[default]
    Light,
}

impl ChartTheme {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
        }
    }

    fn palette(self) -> Palette {
        match self {
            Self::Dark => Palette {
                background: "#1E1E1E",
                foreground: "#E0E0E0",
                grid: "#3A3A3A",
            },
            Self::Light => Palette {
                background: "#FFFFFF",
                foreground: "#333333",
                grid: "#E6E6E6",
            },
        }
    }
}

struct Palette {
    background: &'static str,
    foreground: &'static str,
    grid: &'static str,
}

const UP: &str = "#E53935";
const DOWN: &str = "#43A047";
const MA_COLORS: [&str; 4] = ["#1E90FF", "#FF69B4", "#FFD700", "#9370DB"];

/// Writes a chart for a frame and returns where it went
pub trait ChartRenderer: Send + Sync {
    fn render(&self, frame: &IndicatorFrame, title: &str, kind: ChartKind) -> Result<PathBuf>;
}

/// SVG renderer writing into one output directory
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    output_dir: PathBuf,
    theme: ChartTheme,
}

impl SvgChartRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            theme: ChartTheme::default(),
        }
    }

    pub fn with_theme(mut self, theme: ChartTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn target_path(&self, kind: ChartKind) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let stem = format!("{}_{stamp}", kind.file_stem());
        let mut path = self.output_dir.join(format!("{stem}.svg"));
        let mut n = 1;
        while path.exists() {
            path = self.output_dir.join(format!("{stem}_{n}.svg"));
            n += 1;
        }
        path
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render(&self, frame: &IndicatorFrame, title: &str, kind: ChartKind) -> Result<PathBuf> {
        if frame.is_empty() {
            return Err(MarketError::Chart("cannot chart an empty series".to_string()));
        }
        let kind = kind.resolve(frame);
        let svg = draw(frame, title, kind, &self.theme.palette());

        fs::create_dir_all(&self.output_dir)?;
        let path = self.target_path(kind);
        fs::write(&path, svg)?;

        info!(path = %path.display(), %kind, "Chart saved");
        Ok(path)
    }
}

const WIDTH: f64 = 1400.0;
const LEFT: f64 = 70.0;
const RIGHT: f64 = 30.0;
const TITLE_HEIGHT: f64 = 50.0;
const GAP: f64 = 24.0;

/// Vertical band of the chart with its own value scale
struct Panel {
    top: f64,
    height: f64,
    low: f64,
    high: f64,
}

impl Panel {
    fn new(top: f64, height: f64, low: f64, high: f64) -> Self {
        let (low, high) = if (high - low).abs() < f64::EPSILON {
            (low - 1.0, high + 1.0)
        } else {
            let pad = (high - low) * 0.05;
            (low - pad, high + pad)
        };
        Self {
            top,
            height,
            low,
            high,
        }
    }

    fn y(&self, value: f64) -> f64 {
        self.top + (self.high - value) / (self.high - self.low) * self.height
    }

    fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

struct Canvas<'a> {
    svg: String,
    palette: &'a Palette,
    step: f64,
}

impl Canvas<'_> {
    fn x(&self, i: usize) -> f64 {
        LEFT + (i as f64 + 0.5) * self.step
    }

    fn frame(&mut self, panel: &Panel, label: &str) {
        self.svg.push_str(&format!(
            r#"<rect x="{LEFT}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="{}"/>"#,
            panel.top,
            WIDTH - LEFT - RIGHT,
            panel.height,
            self.palette.grid
        ));
        self.svg.push_str(&format!(
            r#"<text x="8" y="{:.1}" font-size="12" fill="{}">{}</text>"#,
            panel.top + 14.0,
            self.palette.foreground,
            escape(label)
        ));
        for value in [panel.high, panel.low] {
            self.svg.push_str(&format!(
                r#"<text x="8" y="{:.1}" font-size="10" fill="{}">{value:.2}</text>"#,
                panel.y(value).clamp(panel.top + 26.0, panel.bottom()),
                self.palette.foreground
            ));
        }
    }

    fn line(&mut self, panel: &Panel, values: &[Option<f64>], color: &str, dashed: bool) {
        let mut path = String::new();
        let mut pen_down = false;
        for (i, value) in values.iter().enumerate() {
            match value {
                Some(v) => {
                    let cmd = if pen_down { 'L' } else { 'M' };
                    path.push_str(&format!("{cmd}{:.1},{:.1} ", self.x(i), panel.y(*v)));
                    pen_down = true;
                }
                None => pen_down = false,
            }
        }
        if path.is_empty() {
            return;
        }
        let dash = if dashed { r#" stroke-dasharray="6,4""# } else { "" };
        self.svg.push_str(&format!(
            r#"<path d="{}" fill="none" stroke="{color}" stroke-width="1.5"{dash}/>"#,
            path.trim_end()
        ));
    }

    fn bar(&mut self, i: usize, top: f64, bottom: f64, color: &str) {
        let width = (self.step * 0.7).max(1.0);
        self.svg.push_str(&format!(
            r#"<rect x="{:.1}" y="{:.1}" width="{width:.1}" height="{:.1}" fill="{color}"/>"#,
            self.x(i) - width / 2.0,
            top.min(bottom),
            (bottom - top).abs().max(0.5)
        ));
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn bounds<'a>(columns: impl IntoIterator<Item = &'a [Option<f64>]>) -> Option<(f64, f64)> {
    let mut low = f64::INFINITY;
    let mut high = f64::NEG_INFINITY;
    for v in columns.into_iter().flatten().flatten() {
        low = low.min(*v);
        high = high.max(*v);
    }
    (low <= high).then_some((low, high))
}

fn draw(frame: &IndicatorFrame, title: &str, kind: ChartKind, palette: &Palette) -> String {
    let bars = frame.series().bars();
    let show_ma = matches!(kind, ChartKind::Ma | ChartKind::Comprehensive);
    let show_macd = matches!(kind, ChartKind::Macd | ChartKind::Comprehensive) && frame.has("macd");
    let show_rsi = kind == ChartKind::Comprehensive && frame.has("rsi_14");

    let price_height = 420.0;
    let sub_height = 110.0;
    let mut height = TITLE_HEIGHT + price_height + GAP + sub_height;
    if show_macd {
        height += GAP + sub_height;
    }
    if show_rsi {
        height += GAP + sub_height;
    }
    height += GAP;

    let mut canvas = Canvas {
        svg: String::new(),
        palette,
        step: (WIDTH - LEFT - RIGHT) / bars.len() as f64,
    };
    canvas.svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{height}" viewBox="0 0 {WIDTH} {height}">"#
    ));
    canvas.svg.push_str(&format!(
        r#"<rect width="100%" height="100%" fill="{}"/>"#,
        palette.background
    ));
    canvas.svg.push_str(&format!(
        r#"<text x="{:.1}" y="32" font-size="20" text-anchor="middle" fill="{}">{}</text>"#,
        WIDTH / 2.0,
        palette.foreground,
        escape(title)
    ));

    // Price
    let ma_columns: Vec<&[Option<f64>]> = if show_ma {
        frame
            .ma_columns()
            .into_iter()
            .filter_map(|(_, name)| frame.column(name))
            .collect()
    } else {
        Vec::new()
    };
    let lows: Vec<Option<f64>> = bars.iter().map(|b| Some(b.low)).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| Some(b.high)).collect();
    let (low, high) = bounds(
        [lows.as_slice(), highs.as_slice()]
            .into_iter()
            .chain(ma_columns.iter().copied()),
    )
    .unwrap_or((0.0, 1.0));
    let price = Panel::new(TITLE_HEIGHT, price_height, low, high);
    canvas.frame(&price, "Price");
    for (i, bar) in bars.iter().enumerate() {
        let color = if bar.close >= bar.open { UP } else { DOWN };
        canvas.svg.push_str(&format!(
            r#"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{color}"/>"#,
            price.y(bar.high),
            price.y(bar.low),
            x = canvas.x(i)
        ));
        canvas.bar(i, price.y(bar.open), price.y(bar.close), color);
    }
    for (i, column) in ma_columns.iter().enumerate() {
        canvas.line(&price, column, MA_COLORS[i % MA_COLORS.len()], false);
    }

    // Volume
    let mut top = price.bottom() + GAP;
    let max_volume = bars.iter().map(|b| b.volume).fold(0.0, f64::max);
    let volume = Panel {
        top,
        height: sub_height,
        low: 0.0,
        high: if max_volume > 0.0 { max_volume * 1.05 } else { 1.0 },
    };
    canvas.frame(&volume, "Volume");
    for (i, bar) in bars.iter().enumerate() {
        let color = if bar.close >= bar.open { UP } else { DOWN };
        canvas.bar(i, volume.y(bar.volume), volume.bottom(), color);
    }
    top = volume.bottom() + GAP;

    if show_macd {
        let macd = frame.column("macd").unwrap_or_default();
        let signal = frame.column("macd_signal").unwrap_or_default();
        let hist = frame.column("macd_hist").unwrap_or_default();
        let (low, high) = bounds([macd, signal, hist]).unwrap_or((-1.0, 1.0));
        let panel = Panel::new(top, sub_height, low.min(0.0), high.max(0.0));
        canvas.frame(&panel, "MACD");
        for (i, value) in hist.iter().enumerate() {
            if let Some(v) = value {
                let color = if *v >= 0.0 { UP } else { DOWN };
                canvas.bar(i, panel.y(*v), panel.y(0.0), color);
            }
        }
        canvas.line(&panel, macd, "#1E90FF", false);
        canvas.line(&panel, signal, "#FF69B4", false);
        top = panel.bottom() + GAP;
    }

    if show_rsi {
        let rsi = frame.column("rsi_14").unwrap_or_default();
        let panel = Panel {
            top,
            height: sub_height,
            low: 0.0,
            high: 100.0,
        };
        canvas.frame(&panel, "RSI");
        let n = bars.len();
        canvas.line(&panel, &vec![Some(RSI_OVERSOLD); n], "#32CD32", true);
        canvas.line(&panel, &vec![Some(RSI_OVERBOUGHT); n], "#DC143C", true);
        canvas.line(&panel, rsi, "#9370DB", false);
    }

    canvas.svg.push_str("</svg>\n");
    canvas.svg
}
