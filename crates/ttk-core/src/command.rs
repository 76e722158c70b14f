//! Drawing-command serialization boundary.
//!
//! Every drawing operation has a dictionary form tagged with `command_type`,
//! suitable for disk, network, or test transports. Optional fields are
//! omitted when they hold their defaults, so `parse(serialize(cmd)) == cmd`
//! and re-serializing a parsed dictionary canonicalizes defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Attributes, Error, Result, Rgb, Screen};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command_type", rename_all = "snake_case")]
pub enum Command {
    DrawText {
        row: i32,
        col: i32,
        text: String,
        #[serde(default, skip_serializing_if = "is_default_pair")]
        color_pair: u16,
        #[serde(default, skip_serializing_if = "Attributes::is_empty")]
        attributes: Attributes,
    },
    DrawHline {
        row: i32,
        col: i32,
        #[serde(rename = "char")]
        ch: char,
        length: i32,
        #[serde(default, skip_serializing_if = "is_default_pair")]
        color_pair: u16,
    },
    DrawVline {
        row: i32,
        col: i32,
        #[serde(rename = "char")]
        ch: char,
        length: i32,
        #[serde(default, skip_serializing_if = "is_default_pair")]
        color_pair: u16,
    },
    DrawRect {
        row: i32,
        col: i32,
        height: i32,
        width: i32,
        #[serde(default, skip_serializing_if = "is_default_pair")]
        color_pair: u16,
        #[serde(default, skip_serializing_if = "is_false")]
        filled: bool,
    },
    Clear,
    ClearRegion {
        row: i32,
        col: i32,
        height: i32,
        width: i32,
    },
    Refresh,
    RefreshRegion {
        row: i32,
        col: i32,
        height: i32,
        width: i32,
    },
    InitColorPair {
        pair_id: u16,
        fg_color: Rgb,
        bg_color: Rgb,
    },
    SetCursorVisibility {
        visible: bool,
    },
    MoveCursor {
        row: i32,
        col: i32,
    },
}

fn is_default_pair(pair: &u16) -> bool {
    *pair == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Command {
    /// Dictionary form of the command.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).expect("command serialization is infallible")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.to_value()).expect("command serialization is infallible")
    }

    pub fn parse(json: &str) -> Result<Command> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidArgument(e.to_string()))?;
        Self::from_value(&value)
    }

    /// Parse a dictionary, validating ranges the type system cannot express
    /// at this boundary: pair ids must be 1-255 and RGB components 0-255.
    pub fn from_value(value: &Value) -> Result<Command> {
        if value.get("command_type").and_then(Value::as_str) == Some("init_color_pair") {
            validate_color_pair_dict(value)?;
        }
        serde_json::from_value(value.clone()).map_err(|e| Error::InvalidArgument(e.to_string()))
    }

    /// Replay the command against a screen.
    pub fn apply(&self, screen: &mut dyn Screen) -> Result<()> {
        match self {
            Command::DrawText { row, col, text, color_pair, attributes } => {
                screen.draw_text(*row, *col, text, *color_pair, *attributes);
            }
            Command::DrawHline { row, col, ch, length, color_pair } => {
                screen.draw_hline(*row, *col, *ch, *length, *color_pair);
            }
            Command::DrawVline { row, col, ch, length, color_pair } => {
                screen.draw_vline(*row, *col, *ch, *length, *color_pair);
            }
            Command::DrawRect { row, col, height, width, color_pair, filled } => {
                screen.draw_rect(*row, *col, *height, *width, *color_pair, *filled);
            }
            Command::Clear => screen.clear(),
            Command::ClearRegion { row, col, height, width } => {
                screen.clear_region(*row, *col, *height, *width);
            }
            Command::Refresh => screen.refresh(),
            Command::RefreshRegion { row, col, height, width } => {
                screen.refresh_region(*row, *col, *height, *width);
            }
            Command::InitColorPair { pair_id, fg_color, bg_color } => {
                screen.init_color_pair(*pair_id, *fg_color, *bg_color)?;
            }
            Command::SetCursorVisibility { visible } => screen.set_cursor_visibility(*visible),
            Command::MoveCursor { row, col } => screen.move_cursor(*row, *col),
        }
        Ok(())
    }
}

fn validate_color_pair_dict(value: &Value) -> Result<()> {
    let pair_id = value
        .get("pair_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::InvalidArgument("init_color_pair requires pair_id".to_string()))?;
    if !(1..=255).contains(&pair_id) {
        return Err(Error::InvalidPairId(pair_id));
    }
    for key in ["fg_color", "bg_color"] {
        let components = value
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidArgument(format!("{key} must be a 3-tuple")))?;
        if components.len() != 3 {
            return Err(Error::InvalidArgument(format!("{key} must be a 3-tuple")));
        }
        for component in components {
            let component = component
                .as_i64()
                .ok_or_else(|| Error::InvalidArgument(format!("{key} must hold integers")))?;
            if !(0..=255).contains(&component) {
                return Err(Error::InvalidRgb(component));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn round_trip(cmd: Command) {
        let value = cmd.to_value();
        let parsed = Command::from_value(&value).unwrap();
        assert_eq!(parsed, cmd);
        assert_eq!(parsed.to_value(), value);
    }

    #[test]
    fn every_command_round_trips() {
        round_trip(Command::DrawText {
            row: 5,
            col: 10,
            text: "Hello".to_string(),
            color_pair: 1,
            attributes: Attributes::empty(),
        });
        round_trip(Command::DrawText {
            row: 0,
            col: 0,
            text: "あいう".to_string(),
            color_pair: 0,
            attributes: Attributes::BOLD | Attributes::REVERSE,
        });
        round_trip(Command::DrawHline { row: 1, col: 2, ch: '-', length: 8, color_pair: 3 });
        round_trip(Command::DrawVline { row: 1, col: 2, ch: '|', length: 8, color_pair: 0 });
        round_trip(Command::DrawRect {
            row: 0,
            col: 0,
            height: 4,
            width: 9,
            color_pair: 2,
            filled: true,
        });
        round_trip(Command::Clear);
        round_trip(Command::ClearRegion { row: 1, col: 1, height: 2, width: 2 });
        round_trip(Command::Refresh);
        round_trip(Command::RefreshRegion { row: 0, col: 0, height: 5, width: 5 });
        round_trip(Command::InitColorPair {
            pair_id: 7,
            fg_color: Rgb(255, 0, 0),
            bg_color: Rgb(0, 0, 255),
        });
        round_trip(Command::SetCursorVisibility { visible: false });
        round_trip(Command::MoveCursor { row: 3, col: 4 });
    }

    #[test]
    fn draw_text_dictionary_shape() {
        let cmd = Command::DrawText {
            row: 5,
            col: 10,
            text: "Hello".to_string(),
            color_pair: 1,
            attributes: Attributes::empty(),
        };
        assert_eq!(
            cmd.to_value(),
            json!({
                "command_type": "draw_text",
                "row": 5,
                "col": 10,
                "text": "Hello",
                "color_pair": 1,
            })
        );
    }

    #[test]
    fn defaults_are_omitted_and_refilled() {
        let cmd = Command::DrawText {
            row: 0,
            col: 0,
            text: "x".to_string(),
            color_pair: 0,
            attributes: Attributes::empty(),
        };
        let value = cmd.to_value();
        assert!(value.get("color_pair").is_none());
        assert!(value.get("attributes").is_none());
        assert_eq!(Command::from_value(&value).unwrap(), cmd);
    }

    #[test]
    fn parse_canonicalizes_explicit_defaults() {
        let dict = json!({
            "command_type": "draw_rect",
            "row": 1, "col": 2, "height": 3, "width": 4,
            "color_pair": 0,
            "filled": false,
        });
        let parsed = Command::from_value(&dict).unwrap();
        let canonical = parsed.to_value();
        assert!(canonical.get("color_pair").is_none());
        assert!(canonical.get("filled").is_none());
    }

    #[test]
    fn init_color_pair_rejects_pair_zero() {
        let dict = json!({
            "command_type": "init_color_pair",
            "pair_id": 0,
            "fg_color": [255, 255, 255],
            "bg_color": [0, 0, 0],
        });
        assert!(matches!(Command::from_value(&dict), Err(Error::InvalidPairId(0))));
    }

    #[test]
    fn init_color_pair_rejects_negative_component() {
        let dict = json!({
            "command_type": "init_color_pair",
            "pair_id": 1,
            "fg_color": [-1, 0, 0],
            "bg_color": [0, 0, 0],
        });
        assert!(matches!(Command::from_value(&dict), Err(Error::InvalidRgb(-1))));
    }

    #[test]
    fn init_color_pair_rejects_oversized_component() {
        let dict = json!({
            "command_type": "init_color_pair",
            "pair_id": 1,
            "fg_color": [0, 300, 0],
            "bg_color": [0, 0, 0],
        });
        assert!(matches!(Command::from_value(&dict), Err(Error::InvalidRgb(300))));
    }

    #[test]
    fn unknown_command_type_is_an_error() {
        let dict = json!({ "command_type": "draw_circle", "row": 0 });
        assert!(matches!(Command::from_value(&dict), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn unknown_attribute_bits_are_rejected() {
        let dict = json!({
            "command_type": "draw_text",
            "row": 0, "col": 0, "text": "x",
            "attributes": 64,
        });
        assert!(matches!(Command::from_value(&dict), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn json_string_round_trip() {
        let cmd = Command::MoveCursor { row: 9, col: 1 };
        assert_eq!(Command::parse(&cmd.to_json()).unwrap(), cmd);
    }
}
