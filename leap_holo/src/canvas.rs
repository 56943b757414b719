//! ARGB framebuffer with the handful of primitives the viewer needs:
//! rectangles, lines and a tiny bitmap font.
//!
//! Kept separate from the window so it can be drawn into (and tested)
//! without a display.

pub struct Canvas {
    pub buf: Vec<u32>,
    width:   usize,
    height:  usize,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Canvas { buf: vec![background; width * height], width, height }
    }

    pub fn clear(&mut self, color: u32) {
        self.buf.fill(color);
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.buf[y * self.width + x])
    }

    pub fn set_pixel(&mut self, x: isize, y: isize, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    pub fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 {
            return;
        }
        let (x, y) = (x as isize, y as isize);
        let (r, b) = (x + w as isize - 1, y + h as isize - 1);
        for col in x..=r {
            self.set_pixel(col, y, color);
            self.set_pixel(col, b, color);
        }
        for row in y..=b {
            self.set_pixel(x, row, color);
            self.set_pixel(r, row, color);
        }
    }

    /// Bresenham line; off-canvas pixels are dropped.
    pub fn draw_line(&mut self, x0: isize, y0: isize, x1: isize, y1: isize, color: u32) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Draw `text` with the 3×5 font, each font pixel `scale`×`scale`.
    pub fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            if cx + 3 * scale > self.width {
                break;
            }
            for (row, &bits) in glyph(ch).iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale;
        }
    }
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: usize) -> usize {
    text.chars().count() * 4 * scale.max(1)
}

// ────────────────────────────────────────────────────────────────────────────
// 3×5 bitmap font, one row per byte, high bit = leftmost column
// ────────────────────────────────────────────────────────────────────────────

fn glyph(c: char) -> [u8; 5] {
    match c.to_ascii_lowercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '(' => [0b001, 0b010, 0b010, 0b010, 0b001],
        ')' => [0b100, 0b010, 0b010, 0b010, 0b100],
        ' ' => [0b000; 5],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000],
    }
}
