use stratboard_shared::{ClientState, Point, Stroke};

pub struct StrokeBuffer {
    state: ClientState,
    drawing: bool,
    generation: u64,
}

impl StrokeBuffer {
    pub fn new(state: ClientState) -> Self {
        Self {
            state,
            drawing: false,
            generation: 0,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.state.strokes
    }

    pub fn begin_stroke(&mut self) {
        self.state.strokes.push(Stroke::default());
        self.drawing = true;
    }

    pub fn append_point(&mut self, x: f64, y: f64) -> bool {
        if !self.drawing {
            return false;
        }
        let point = Point::new(x, y);
        if !point.is_finite() {
            return false;
        }
        match self.state.strokes.last_mut() {
            Some(stroke) => {
                stroke.points.push(point);
                true
            }
            None => false,
        }
    }

    pub fn end_stroke(&mut self) {
        self.drawing = false;
    }

    pub fn reset(&mut self) {
        self.state.strokes.clear();
        self.drawing = false;
        self.generation += 1;
    }

    pub fn set_color(&mut self, color: String) {
        self.state.color = color;
    }

    pub fn set_width(&mut self, width: u32) {
        self.state.width = width;
    }
}
