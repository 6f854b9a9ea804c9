use crate::crop::RatioPreset;
use crate::filter::FilterSlider;
use crate::geometry::Size;

/// State the engine writes back to the side panels and readouts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Controls {
    pub main_zoom: u32,
    /// Present only while cropping.
    pub crop_zoom: Option<u32>,
    /// `"image"`, `"text"`, `"shape"`, or empty with nothing selected.
    pub element_label: &'static str,
    pub width_field: String,
    pub height_field: String,
    pub ratio: RatioPreset,
    pub filter_slider: Option<FilterSlider>,
}

impl Controls {
    pub(super) fn write_size(&mut self, size: Size) {
        self.width_field = format_dimension(size.width);
        self.height_field = format_dimension(size.height);
    }

    pub(super) fn clear_element(&mut self) {
        self.element_label = "";
        self.width_field.clear();
        self.height_field.clear();
        self.filter_slider = None;
    }
}

fn format_dimension(value: f64) -> String {
    format!("{}", value.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_fields_are_rounded_integers() {
        let mut controls = Controls::default();
        controls.write_size(Size::new(120.4, 79.6));
        assert_eq!(controls.width_field, "120");
        assert_eq!(controls.height_field, "80");
        controls.clear_element();
        assert!(controls.width_field.is_empty());
        assert_eq!(controls.element_label, "");
    }
}
