//! Serializable editing recipes.
//!
//! A [`Recipe`] is an ordered list of buffer operations that can be stored as
//! JSON and replayed on any [`PixelBuffer`].
//!
//! # Example
//!
//! ```
//! use rasterkit::{BlurKind, PixelBuffer, Recipe, ResizeKind, Step};
//!
//! let recipe = Recipe::new()
//!     .with_step(Step::Fill { color: 0x336699ff })
//!     .with_step(Step::Resize { kind: ResizeKind::Nearest, width: 8, height: 8 })
//!     .with_step(Step::Blur { kernel: BlurKind::Box { radius: 1 } });
//!
//! let json = recipe.to_json().unwrap();
//! let restored = Recipe::from_json(&json).unwrap();
//!
//! let mut buffer = PixelBuffer::new(4, 4).unwrap();
//! restored.apply(&mut buffer).unwrap();
//! assert_eq!(buffer.dimensions(), (8, 8));
//! ```

use serde::{Deserialize, Serialize};

use crate::blur::BlurKind;
use crate::buffer::PixelBuffer;
use crate::error::Result;
use crate::transform::{FlipAxis, ResizeKind};

// ============================================================================
// Step
// ============================================================================

/// One buffer operation with its parameters.
///
/// Serializes with an `op` tag, e.g.
/// `{ "op": "rotate", "degrees": 45.0, "resizeCanvas": true }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Step {
    Fill {
        color: u32,
    },
    Clear,
    Flip {
        axis: FlipAxis,
    },
    /// Clockwise rotation in degrees.
    Rotate {
        degrees: f64,
        #[serde(default)]
        resize_canvas: bool,
    },
    Resize {
        #[serde(default)]
        kind: ResizeKind,
        width: u32,
        height: u32,
    },
    Scale {
        #[serde(default)]
        kind: ResizeKind,
        factor: f64,
    },
    /// Box crop; `x`/`y` are the 0-based offset of the kept region.
    Crop {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    CropCircle {
        #[serde(default)]
        feathering: f64,
    },
    DrawBox {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        color: u32,
    },
    DrawCircle {
        x: i64,
        y: i64,
        radius: u32,
        color: u32,
    },
    RoundCorners {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
    Blur {
        kernel: BlurKind,
    },
    Opacity {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    Red {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    Green {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    Blue {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    Lightness {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    Saturation {
        value: f32,
        #[serde(default)]
        absolute: bool,
    },
    HueShift {
        degrees: f32,
    },
    Invert,
    InvertValue,
    InvertSaturation,
    InvertHue,
}

impl Step {
    /// Applies this operation to `buffer`.
    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<()> {
        match *self {
            Step::Fill { color } => {
                buffer.fill(color);
            }
            Step::Clear => {
                buffer.clear();
            }
            Step::Flip { axis } => {
                buffer.flip(axis);
            }
            Step::Rotate { degrees, resize_canvas } => {
                buffer.rotate(degrees, resize_canvas)?;
            }
            Step::Resize { kind, width, height } => {
                buffer.resize(kind, width, height)?;
            }
            Step::Scale { kind, factor } => {
                buffer.scale(kind, factor)?;
            }
            Step::Crop { x, y, width, height } => {
                buffer.crop(x, y, width, height)?;
            }
            Step::CropCircle { feathering } => {
                buffer.crop_circle(feathering)?;
            }
            Step::DrawBox {
                x,
                y,
                width,
                height,
                color,
            } => {
                buffer.draw_box(x, y, width, height, color);
            }
            Step::DrawCircle { x, y, radius, color } => {
                buffer.draw_circle(x, y, radius, color);
            }
            Step::RoundCorners { radius } => {
                buffer.round_corners(radius)?;
            }
            Step::Blur { kernel } => {
                buffer.blur(kernel)?;
            }
            Step::Opacity { value, absolute } => {
                buffer.opacity(value, absolute)?;
            }
            Step::Red { value, absolute } => {
                buffer.red(value, absolute)?;
            }
            Step::Green { value, absolute } => {
                buffer.green(value, absolute)?;
            }
            Step::Blue { value, absolute } => {
                buffer.blue(value, absolute)?;
            }
            Step::Lightness { value, absolute } => {
                buffer.lightness(value, absolute)?;
            }
            Step::Saturation { value, absolute } => {
                buffer.saturation(value, absolute)?;
            }
            Step::HueShift { degrees } => {
                buffer.hue_shift(degrees)?;
            }
            Step::Invert => {
                buffer.invert();
            }
            Step::InvertValue => {
                buffer.invert_value();
            }
            Step::InvertSaturation => {
                buffer.invert_saturation();
            }
            Step::InvertHue => {
                buffer.invert_hue();
            }
        }
        Ok(())
    }
}

// ============================================================================
// Recipe
// ============================================================================

/// An ordered, serializable list of [`Step`]s.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Recipe {
    /// Creates an empty recipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step.
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order, stopping at the first failure.
    ///
    /// Steps that ran before the failing one stay applied.
    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<()> {
        for (index, step) in self.steps.iter().enumerate() {
            log::trace!("recipe step {index}: {step:?} on {buffer}");
            step.apply(buffer)?;
        }
        Ok(())
    }

    /// Serializes the recipe to a JSON string.
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the recipe to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a recipe from a JSON string.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn step_json_format() {
        let step = Step::Rotate {
            degrees: 90.0,
            resize_canvas: true,
        };
        assert_eq!(
            serde_json::to_string(&step).unwrap(),
            r#"{"op":"rotate","degrees":90.0,"resizeCanvas":true}"#
        );
        assert_eq!(serde_json::to_string(&Step::InvertHue).unwrap(), r#"{"op":"invert-hue"}"#);

        let json = r#"{"op":"blur","kernel":{"kind":"gaussian","radius":2.5}}"#;
        let blur: Step = serde_json::from_str(json).unwrap();
        assert_eq!(
            blur,
            Step::Blur {
                kernel: BlurKind::Gaussian { radius: 2.5 }
            }
        );
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let recipe = Recipe::from_json(
            r#"{"steps":[
                {"op":"resize","width":2,"height":3},
                {"op":"opacity","value":0.5},
                {"op":"round-corners"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            recipe.steps,
            vec![
                Step::Resize {
                    kind: ResizeKind::Linear,
                    width: 2,
                    height: 3
                },
                Step::Opacity {
                    value: 0.5,
                    absolute: false
                },
                Step::RoundCorners { radius: None },
            ]
        );
    }

    #[test]
    fn empty_recipe_deserializes() {
        let recipe = Recipe::from_json("{}").unwrap();
        assert!(recipe.is_empty());
    }

    #[test]
    fn recipe_roundtrip() {
        let recipe = Recipe::new()
            .with_step(Step::Flip { axis: FlipAxis::Vertical })
            .with_step(Step::Crop {
                x: -1,
                y: 2,
                width: 3,
                height: 4,
            })
            .with_step(Step::DrawCircle {
                x: 5,
                y: 5,
                radius: 2,
                color: 0xff0000ff,
            });
        let restored = Recipe::from_json(&recipe.to_json_pretty().unwrap()).unwrap();
        assert_eq!(restored, recipe);
    }

    #[test]
    fn applies_steps_in_order() {
        let recipe = Recipe::new()
            .with_step(Step::Fill { color: 0x00ff00ff })
            .with_step(Step::DrawBox {
                x: 1,
                y: 1,
                width: 1,
                height: 1,
                color: 0xff0000ff,
            })
            .with_step(Step::Rotate {
                degrees: 180.0,
                resize_canvas: false,
            })
            .with_step(Step::Resize {
                kind: ResizeKind::Nearest,
                width: 4,
                height: 2,
            });

        let mut buffer = PixelBuffer::new(2, 1).unwrap();
        recipe.apply(&mut buffer).unwrap();
        assert_eq!(buffer.dimensions(), (4, 2));
        assert_eq!(buffer.get(1, 1).unwrap(), 0x00ff00ff);
        assert_eq!(buffer.get(4, 2).unwrap(), 0xff0000ff);
    }

    #[test]
    fn stops_at_first_error() {
        let recipe = Recipe::new()
            .with_step(Step::Fill { color: 0x112233ff })
            .with_step(Step::Opacity {
                value: -1.0,
                absolute: false,
            })
            .with_step(Step::Clear);

        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        let err = recipe.apply(&mut buffer).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(buffer.get(1, 1).unwrap(), 0x112233ff);
    }

    #[test]
    fn extreme_offsets_from_json_are_clipped() {
        let recipe = Recipe::from_json(
            r#"{"steps":[
                {"op":"fill","color":4278190335},
                {"op":"draw-box","x":-9223372036854775808,"y":1,"width":2,"height":2,"color":255},
                {"op":"draw-circle","x":9223372036854775807,"y":1,"radius":3,"color":255}
            ]}"#,
        )
        .unwrap();
        let mut buffer = PixelBuffer::new(2, 2).unwrap();
        recipe.apply(&mut buffer).unwrap();
        assert!(buffer.pixels().all(|(_, _, c)| c == 0xff0000ff));

        let crop = Recipe::from_json(
            r#"{"steps":[{"op":"crop","x":-9223372036854775808,"y":0,"width":2,"height":1}]}"#,
        )
        .unwrap();
        crop.apply(&mut buffer).unwrap();
        assert_eq!(buffer.dimensions(), (2, 1));
        assert!(buffer.bitmap().iter().all(|&b| b == 0));
    }
}
