use eframe::egui::{Button, Color32, Frame, Margin, Response, RichText, Stroke, Ui, Vec2, Widget};

/// see through white, the background shows through buttons
pub const GLASS_BUTTON_FILL: Color32 = Color32::from_rgba_premultiplied(30, 30, 30, 30);
/// see through black behind the clock and the controls
pub const GLASS_PANEL_FILL: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 100);

/// a semi transparent rounded panel
#[must_use]
pub fn glass_panel() -> Frame {
    Frame::new()
        .fill(GLASS_PANEL_FILL)
        .corner_radius(20_u8)
        .inner_margin(Margin::same(16))
}

pub struct GlassButton {
    text: String,
    text_size: f32,
    min_width: f32,
}

impl GlassButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            text_size: 24.0,
            min_width: 0.0,
        }
    }

    #[must_use]
    pub const fn min_width(mut self, min_width: f32) -> Self {
        self.min_width = min_width;
        self
    }
}

impl Widget for GlassButton {
    fn ui(self, ui: &mut Ui) -> Response {
        let Self {
            text,
            text_size,
            min_width,
        } = self;
        let label = RichText::new(text)
            .size(text_size)
            .strong()
            .color(Color32::WHITE);
        // padding around the text like a regular button, only bigger
        ui.add(
            Button::new(label)
                .fill(GLASS_BUTTON_FILL)
                .stroke(Stroke::NONE)
                .corner_radius(15_u8)
                .min_size(Vec2::new(min_width, text_size + 20.0)),
        )
    }
}
