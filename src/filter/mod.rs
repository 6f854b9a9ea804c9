//! Named raster filters toggled on image nodes, with one adjustable parameter slider.

mod raster;

pub use raster::apply_filters;

use crate::geometry::parse_number_or;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    Grayscale,
    Blur,
    Pixelate,
    Contrast,
    Brighten,
    Invert,
}

impl FilterKind {
    pub const ALL: [FilterKind; 6] = [
        Self::Grayscale,
        Self::Blur,
        Self::Pixelate,
        Self::Contrast,
        Self::Brighten,
        Self::Invert,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Grayscale => "grayscale",
            Self::Blur => "blur",
            Self::Pixelate => "pixelate",
            Self::Contrast => "contrast",
            Self::Brighten => "brighten",
            Self::Invert => "invert",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(name))
    }

    /// The numeric property a slider edits, or `None` for pure toggles.
    pub const fn parameter(self) -> Option<FilterParam> {
        match self {
            Self::Blur => Some(FilterParam::BlurRadius),
            Self::Pixelate => Some(FilterParam::PixelSize),
            Self::Contrast => Some(FilterParam::Contrast),
            Self::Brighten => Some(FilterParam::Brightness),
            Self::Grayscale | Self::Invert => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterParam {
    BlurRadius,
    PixelSize,
    Contrast,
    Brightness,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
}

impl FilterParam {
    pub const fn range(self) -> SliderRange {
        match self {
            Self::BlurRadius => SliderRange {
                min: 0.0,
                max: 40.0,
                step: 1.0,
                default: 0.0,
            },
            Self::PixelSize => SliderRange {
                min: 1.0,
                max: 64.0,
                step: 1.0,
                default: 8.0,
            },
            Self::Contrast => SliderRange {
                min: -100.0,
                max: 100.0,
                step: 1.0,
                default: 0.0,
            },
            Self::Brightness => SliderRange {
                min: -1.0,
                max: 1.0,
                step: 0.05,
                default: 0.0,
            },
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let range = self.range();
        if value.is_finite() {
            value.clamp(range.min, range.max)
        } else {
            range.default
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParams {
    pub blur_radius: f64,
    pub pixel_size: f64,
    pub contrast: f64,
    pub brightness: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            blur_radius: FilterParam::BlurRadius.range().default,
            pixel_size: FilterParam::PixelSize.range().default,
            contrast: FilterParam::Contrast.range().default,
            brightness: FilterParam::Brightness.range().default,
        }
    }
}

impl FilterParams {
    pub fn get(&self, param: FilterParam) -> f64 {
        match param {
            FilterParam::BlurRadius => self.blur_radius,
            FilterParam::PixelSize => self.pixel_size,
            FilterParam::Contrast => self.contrast,
            FilterParam::Brightness => self.brightness,
        }
    }

    pub fn set(&mut self, param: FilterParam, value: f64) -> f64 {
        let value = param.clamp(value);
        let slot = match param {
            FilterParam::BlurRadius => &mut self.blur_radius,
            FilterParam::PixelSize => &mut self.pixel_size,
            FilterParam::Contrast => &mut self.contrast,
            FilterParam::Brightness => &mut self.brightness,
        };
        *slot = value;
        value
    }

    pub fn reset(&mut self, param: FilterParam) {
        self.set(param, param.range().default);
    }
}

/// Ordered set of active filters plus their numeric parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    active: Vec<FilterKind>,
    pub params: FilterParams,
}

impl FilterState {
    pub fn contains(&self, kind: FilterKind) -> bool {
        self.active.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn kinds(&self) -> &[FilterKind] {
        &self.active
    }

    /// Flips `kind`. Turning a filter off resets its parameter to the neutral
    /// default. Returns whether the filter is now enabled.
    pub fn toggle(&mut self, kind: FilterKind) -> bool {
        if let Some(index) = self.active.iter().position(|active| *active == kind) {
            self.active.remove(index);
            if let Some(param) = kind.parameter() {
                self.params.reset(param);
            }
            false
        } else {
            self.active.push(kind);
            true
        }
    }
}

/// The single visible parameter slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSlider {
    pub kind: FilterKind,
    pub param: FilterParam,
    pub value: f64,
}

impl FilterSlider {
    pub fn open(kind: FilterKind, params: &FilterParams) -> Option<Self> {
        let param = kind.parameter()?;
        Some(Self {
            kind,
            param,
            value: params.get(param),
        })
    }

    pub fn range(&self) -> SliderRange {
        self.param.range()
    }

    /// Applies free slider text to `params`; unparseable input reads as the
    /// parameter's default.
    pub fn apply_input(&mut self, raw: &str, params: &mut FilterParams) -> f64 {
        let value = parse_number_or(raw, self.param.range().default);
        self.value = params.set(self.param, value);
        self.value
    }
}

/// Toggles `kind` and keeps the slider in step with it: enabling a
/// parameterized filter replaces whatever slider was open, disabling the
/// filter that owns the slider closes it.
pub fn toggle_with_slider(
    state: &mut FilterState,
    slider: &mut Option<FilterSlider>,
    kind: FilterKind,
) -> bool {
    let enabled = state.toggle(kind);
    if enabled {
        if kind.parameter().is_some() {
            *slider = FilterSlider::open(kind, &state.params);
        }
    } else if slider.is_some_and(|open| open.kind == kind) {
        *slider = None;
    }
    tracing::debug!(filter = kind.name(), enabled, "filter toggled");
    enabled
}
