use std::io;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlImageElement, Window,
};

use crate::geometry::PathCommand;
use crate::render::{Cursor, StrokeStyle, Surface};

pub fn create_element<T: JsCast>(document: &Document, tag: &str) -> Result<T, JsValue> {
    document
        .create_element(tag)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {tag}")))
}

pub fn window_size(window: &Window) -> (f64, f64) {
    let width = window
        .inner_width()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0);
    (width, height)
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    image: Option<HtmlImageElement>,
    cursor: Option<Cursor>,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Missing 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            image: None,
            cursor: None,
        })
    }

    pub fn set_background(&mut self, image: HtmlImageElement) {
        self.image = Some(image);
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, width: f64, height: f64) {
        let width = width.max(0.0) as u32;
        let height = height.max(0.0) as u32;
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }

    fn clear(&mut self) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
    }

    fn set_transform(&mut self, scale: f64, x: f64, y: f64) {
        let _ = self.ctx.scale(scale, scale);
        let _ = self.ctx.translate(x, y);
    }

    fn draw_background(&mut self, x: f64, y: f64) {
        let Some(image) = &self.image else {
            return;
        };
        self.ctx.set_shadow_blur(0.0);
        if let Err(error) = self.ctx.draw_image_with_html_image_element(image, x, y) {
            tracing::warn!(?error, "background image could not be drawn");
        }
    }

    fn stroke_path(&mut self, path: &[PathCommand], style: &StrokeStyle<'_>) {
        let ctx = &self.ctx;
        ctx.set_line_cap("round");
        ctx.set_line_join("round");
        ctx.set_line_width(style.width);
        ctx.set_stroke_style_str(style.color);
        ctx.set_shadow_blur(style.glow);
        ctx.set_shadow_color(style.color);
        ctx.begin_path();
        for command in path {
            match *command {
                PathCommand::MoveTo(point) => ctx.move_to(point.x, point.y),
                PathCommand::QuadTo { control, end } => {
                    ctx.quadratic_curve_to(control.x, control.y, end.x, end.y)
                }
                PathCommand::LineTo(point) => ctx.line_to(point.x, point.y),
            }
        }
        ctx.stroke();
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        if self.cursor == Some(cursor) {
            return;
        }
        if let Ok(element) = self.canvas.clone().dyn_into::<HtmlElement>() {
            let _ = element.style().set_property("cursor", cursor.css());
            self.cursor = Some(cursor);
        }
    }
}

#[derive(Default)]
pub struct ConsoleWriter {
    buffer: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buffer);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

pub fn init_logging(debug: bool) {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(ConsoleWriter::default)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .try_init();
}
