//! Pin role types.
//!
//! `PinRole` names a logical function ("LED 1", "Button 2") without naming
//! its physical pin. `KeyCode` and `LogicState` configure how a button role
//! is turned into key events by the button driver.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, de};

// ─── PinRole ────────────────────────────────────────────────────────

/// Logical device role on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PinRole {
    Led1,
    Led2,
    Led3,
    Button1,
    Button2,
    Button3,
}

impl PinRole {
    /// Every role, LEDs first.
    pub const ALL: [PinRole; 6] = [
        Self::Led1,
        Self::Led2,
        Self::Led3,
        Self::Button1,
        Self::Button2,
        Self::Button3,
    ];

    /// Output roles.
    pub const LEDS: [PinRole; 3] = [Self::Led1, Self::Led2, Self::Led3];

    /// Input roles.
    pub const BUTTONS: [PinRole; 3] = [Self::Button1, Self::Button2, Self::Button3];

    /// True for LED (output) roles.
    pub fn is_led(&self) -> bool {
        matches!(self, Self::Led1 | Self::Led2 | Self::Led3)
    }

    /// True for button (input) roles.
    pub fn is_button(&self) -> bool {
        !self.is_led()
    }

    /// 1-based channel number within the role's kind.
    pub fn channel(&self) -> u8 {
        match self {
            Self::Led1 | Self::Button1 => 1,
            Self::Led2 | Self::Button2 => 2,
            Self::Led3 | Self::Button3 => 3,
        }
    }

    /// Button role for a 1-based channel number.
    pub fn button(channel: u8) -> Option<Self> {
        Self::BUTTONS.get(usize::from(channel).checked_sub(1)?).copied()
    }

    /// LED role for a 1-based channel number.
    pub fn led(channel: u8) -> Option<Self> {
        Self::LEDS.get(usize::from(channel).checked_sub(1)?).copied()
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Led1 => "Led1",
            Self::Led2 => "Led2",
            Self::Led3 => "Led3",
            Self::Button1 => "Button1",
            Self::Button2 => "Button2",
            Self::Button3 => "Button3",
        }
    }
}

impl fmt::Display for PinRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown PinRole: {s:?}"))
    }
}

impl TryFrom<String> for PinRole {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PinRole> for String {
    fn from(role: PinRole) -> Self {
        role.to_string()
    }
}

// ─── KeyCode ────────────────────────────────────────────────────────

/// Key code emitted by a button driver (Linux input-event numbering).
///
/// In TOML either a name (`key = "A"`) or a number (`key = 30`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct KeyCode(pub u16);

impl KeyCode {
    /// `KEY_A`.
    pub const A: Self = Self(30);
    /// `KEY_B`.
    pub const B: Self = Self(48);
    /// `KEY_C`.
    pub const C: Self = Self(46);

    fn name(&self) -> Option<&'static str> {
        match *self {
            Self::A => Some("A"),
            Self::B => Some("B"),
            Self::C => Some("C"),
            _ => None,
        }
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for KeyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            other => other
                .parse::<u16>()
                .map(Self)
                .map_err(|_| format!("unknown KeyCode: {s:?}, expected A, B, C or a number")),
        }
    }
}

impl<'de> Deserialize<'de> for KeyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u16),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(code) => Ok(Self(code)),
            Repr::Name(name) => name.parse().map_err(de::Error::custom),
        }
    }
}

impl From<KeyCode> for String {
    fn from(code: KeyCode) -> Self {
        code.to_string()
    }
}

// ─── LogicState ─────────────────────────────────────────────────────

/// Electrical level that means "pressed" for a button input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicState {
    /// Pressed when the line reads low (pull-up wiring).
    #[default]
    ActiveLow,
    /// Pressed when the line reads high (pull-down wiring).
    ActiveHigh,
}

impl LogicState {
    /// Interpret a raw line level.
    pub fn is_pressed(&self, level: bool) -> bool {
        match self {
            Self::ActiveLow => !level,
            Self::ActiveHigh => level,
        }
    }

    /// Line level that corresponds to `pressed`.
    pub fn level_for(&self, pressed: bool) -> bool {
        match self {
            Self::ActiveLow => !pressed,
            Self::ActiveHigh => pressed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roles() {
        assert_eq!("Led1".parse::<PinRole>().unwrap(), PinRole::Led1);
        assert_eq!("button3".parse::<PinRole>().unwrap(), PinRole::Button3);
        assert_eq!("BUTTON2".parse::<PinRole>().unwrap(), PinRole::Button2);
        assert!("Led4".parse::<PinRole>().is_err());
        assert!("".parse::<PinRole>().is_err());
    }

    #[test]
    fn role_kinds() {
        for role in PinRole::LEDS {
            assert!(role.is_led());
            assert!(!role.is_button());
        }
        for role in PinRole::BUTTONS {
            assert!(role.is_button());
        }
        assert_eq!(PinRole::ALL.len(), 6);
    }

    #[test]
    fn role_channels() {
        assert_eq!(PinRole::Button2.channel(), 2);
        assert_eq!(PinRole::button(1), Some(PinRole::Button1));
        assert_eq!(PinRole::led(3), Some(PinRole::Led3));
        assert_eq!(PinRole::button(0), None);
        assert_eq!(PinRole::led(4), None);
    }

    #[test]
    fn key_codes() {
        assert_eq!("a".parse::<KeyCode>().unwrap(), KeyCode::A);
        assert_eq!("C".parse::<KeyCode>().unwrap(), KeyCode::C);
        assert_eq!("105".parse::<KeyCode>().unwrap(), KeyCode(105));
        assert!("Z".parse::<KeyCode>().is_err());
        assert_eq!(KeyCode::B.to_string(), "B");
        assert_eq!(KeyCode(105).to_string(), "105");
    }

    #[test]
    fn active_low_logic() {
        let logic = LogicState::default();
        assert_eq!(logic, LogicState::ActiveLow);
        assert!(logic.is_pressed(false));
        assert!(!logic.is_pressed(true));
        assert!(!logic.level_for(true));
        assert!(LogicState::ActiveHigh.is_pressed(true));
    }

    #[test]
    fn role_serde_in_table() {
        #[derive(Debug, Deserialize, Serialize, PartialEq)]
        struct Wrapper {
            role: PinRole,
            key: KeyCode,
            logic: LogicState,
        }

        let parsed: Wrapper =
            toml::from_str("role = \"Button1\"\nkey = \"B\"\nlogic = \"active_high\"").unwrap();
        assert_eq!(parsed.role, PinRole::Button1);
        assert_eq!(parsed.key, KeyCode::B);
        assert_eq!(parsed.logic, LogicState::ActiveHigh);

        let text = toml::to_string(&parsed).unwrap();
        assert!(text.contains("Button1"));
        assert!(text.contains("active_high"));
    }

    #[test]
    fn key_code_from_toml_name_or_number() {
        #[derive(Debug, Deserialize)]
        struct Route {
            key: KeyCode,
        }

        let by_number: Route = toml::from_str("key = 30").unwrap();
        assert_eq!(by_number.key, KeyCode::A);
        let quoted: Route = toml::from_str("key = \"105\"").unwrap();
        assert_eq!(quoted.key, KeyCode(105));
        let named: Route = toml::from_str("key = \"c\"").unwrap();
        assert_eq!(named.key, KeyCode::C);

        assert!(toml::from_str::<Route>("key = -1").is_err());
        assert!(toml::from_str::<Route>("key = \"Z\"").is_err());
    }
}
