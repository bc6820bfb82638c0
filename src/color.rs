use std::fmt;

use anyhow::{anyhow, Result};

// 8-bit sRGB triple. Every supported textual color syntax resolves to this
// before anything is compared.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

// Integer HSL triple with the ranges enforced at construction: hue wraps into
// [0, 360), saturation and lightness clamp into [0, 100].
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Hsl {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Rgb {
    pub fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    // RGB to HSL with all three components rounded to the nearest integer.
    // The rounded triple is the key used for color equality.
    pub fn to_hsl(&self) -> Hsl {
        let red = self.red as f64 / 255.0;
        let green = self.green as f64 / 255.0;
        let blue = self.blue as f64 / 255.0;

        let max = red.max(green).max(blue);
        let min = red.min(green).min(blue);

        let lightness = (max + min) / 2.0;

        let mut hue = 0.0;
        let mut saturation = 0.0;
        if max != min {
            let delta = max - min;

            saturation = if lightness > 0.5 {
                delta / (2.0 - max - min)
            } else {
                delta / (max + min)
            };

            hue = if max == red {
                (green - blue) / delta + if green < blue { 6.0 } else { 0.0 }
            } else if max == green {
                (blue - red) / delta + 2.0
            } else {
                (red - green) / delta + 4.0
            };
            hue /= 6.0;
        }

        // A hue that rounds up to 360 wraps back to 0 inside Hsl::new
        Hsl::new(
            (hue * 360.0).round() as i32,
            (saturation * 100.0).round() as i32,
            (lightness * 100.0).round() as i32,
        )
    }
}

impl Hsl {
    pub fn new(hue: i32, saturation: i32, lightness: i32) -> Self {
        Self {
            hue: hue.rem_euclid(360) as u16,
            saturation: saturation.clamp(0, 100) as u8,
            lightness: lightness.clamp(0, 100) as u8,
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        hsl_to_rgb(
            self.hue as f64,
            self.saturation as f64 / 100.0,
            self.lightness as f64 / 100.0,
        )
    }

    // The comparison form: a round trip through the 8-bit RGB intermediate,
    // so that equality is judged on what would actually be rendered.
    pub fn canonical(&self) -> Hsl {
        self.to_rgb().to_hsl()
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.red, self.green, self.blue)
    }
}

// https://drafts.csswg.org/css-color-4/#hsl-to-rgb
// Saturation and lightness are fractions in [0, 1] here, hue in degrees.
fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Rgb {
    let hue = hue.rem_euclid(360.0);

    let f = |n: f64| {
        let k = (n + hue / 30.0) % 12.0;
        let a = saturation * lightness.min(1.0 - lightness);
        lightness - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0)
    };

    Rgb::new(to_channel(f(0.0)), to_channel(f(8.0)), to_channel(f(4.0)))
}

fn to_channel(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

// Parse any supported representation down to the rounded HSL triple used for
// equality comparison.
pub fn to_canonical_hsl(input: &str) -> Result<Hsl> {
    Ok(parse_color(input)?.to_hsl())
}

// Resolve a textual color to its 8-bit RGB form. Accepts CSS named colors,
// #rgb/#rgba/#rrggbb/#rrggbbaa hex, rgb(r, g, b) and hsl(h, s%, l%).
pub fn parse_color(input: &str) -> Result<Rgb> {
    let normalized = input.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return Err(anyhow!("empty color string"));
    }

    if let Some(digits) = normalized.strip_prefix('#') {
        return parse_hex(digits);
    }
    if let Some(args) = normalized
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_rgb_args(args);
    }
    if let Some(args) = normalized
        .strip_prefix("hsl(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_hsl_args(args);
    }

    named_color(&normalized).ok_or_else(|| anyhow!("unsupported color syntax {input:?}"))
}

fn parse_hex(digits: &str) -> Result<Rgb> {
    let bytes = digits.as_bytes();
    if !matches!(bytes.len(), 3 | 4 | 6 | 8) {
        return Err(anyhow!("invalid hex color length {}", bytes.len()));
    }

    let mut nibbles = [0u8; 8];
    for (slot, &byte) in nibbles.iter_mut().zip(bytes) {
        *slot = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            _ => return Err(anyhow!("invalid hex digit {:?} in #{digits}", byte as char)),
        };
    }

    // The 4- and 8-digit forms carry alpha; the digits are validated above
    // and dropped, the comparison space is opaque RGB.
    Ok(if bytes.len() <= 4 {
        Rgb::new(nibbles[0] * 17, nibbles[1] * 17, nibbles[2] * 17)
    } else {
        Rgb::new(
            nibbles[0] << 4 | nibbles[1],
            nibbles[2] << 4 | nibbles[3],
            nibbles[4] << 4 | nibbles[5],
        )
    })
}

fn parse_rgb_args(args: &str) -> Result<Rgb> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(anyhow!("rgb() takes three components, got {}", parts.len()));
    }

    let channel = |part: &str| -> Result<u8> {
        part.parse::<u16>()
            .ok()
            .filter(|&value| value <= 255)
            .map(|value| value as u8)
            .ok_or_else(|| anyhow!("rgb() component {part:?} out of range"))
    };

    Ok(Rgb::new(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
    ))
}

fn parse_hsl_args(args: &str) -> Result<Rgb> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(anyhow!("hsl() takes three components, got {}", parts.len()));
    }

    let number = |part: &str| -> Result<f64> {
        part.parse::<f64>()
            .map_err(|_| anyhow!("bad hsl() component {part:?}"))
    };
    let percent = |part: &str| -> Result<f64> {
        let digits = part
            .strip_suffix('%')
            .ok_or_else(|| anyhow!("hsl() component {part:?} is missing the % sign"))?;
        number(digits.trim())
    };

    // Fractional components resolve through the RGB form without being
    // rounded first, the same way a rendering engine would treat them.
    let hue = number(parts[0])?;
    let saturation = (percent(parts[1])? / 100.0).clamp(0.0, 1.0);
    let lightness = (percent(parts[2])? / 100.0).clamp(0.0, 1.0);

    Ok(hsl_to_rgb(hue, saturation, lightness))
}

// The CSS Color 4 named set.
fn named_color(name: &str) -> Option<Rgb> {
    let color = match name {
        "aliceblue" => Rgb::new(240, 248, 255),
        "antiquewhite" => Rgb::new(250, 235, 215),
        "aqua" | "cyan" => Rgb::new(0, 255, 255),
        "aquamarine" => Rgb::new(127, 255, 212),
        "azure" => Rgb::new(240, 255, 255),
        "beige" => Rgb::new(245, 245, 220),
        "bisque" => Rgb::new(255, 228, 196),
        "black" => Rgb::new(0, 0, 0),
        "blanchedalmond" => Rgb::new(255, 235, 205),
        "blue" => Rgb::new(0, 0, 255),
        "blueviolet" => Rgb::new(138, 43, 226),
        "brown" => Rgb::new(165, 42, 42),
        "burlywood" => Rgb::new(222, 184, 135),
        "cadetblue" => Rgb::new(95, 158, 160),
        "chartreuse" => Rgb::new(127, 255, 0),
        "chocolate" => Rgb::new(210, 105, 30),
        "coral" => Rgb::new(255, 127, 80),
        "cornflowerblue" => Rgb::new(100, 149, 237),
        "cornsilk" => Rgb::new(255, 248, 220),
        "crimson" => Rgb::new(220, 20, 60),
        "darkblue" => Rgb::new(0, 0, 139),
        "darkcyan" => Rgb::new(0, 139, 139),
        "darkgoldenrod" => Rgb::new(184, 134, 11),
        "darkgray" | "darkgrey" => Rgb::new(169, 169, 169),
        "darkgreen" => Rgb::new(0, 100, 0),
        "darkkhaki" => Rgb::new(189, 183, 107),
        "darkmagenta" => Rgb::new(139, 0, 139),
        "darkolivegreen" => Rgb::new(85, 107, 47),
        "darkorange" => Rgb::new(255, 140, 0),
        "darkorchid" => Rgb::new(153, 50, 204),
        "darkred" => Rgb::new(139, 0, 0),
        "darksalmon" => Rgb::new(233, 150, 122),
        "darkseagreen" => Rgb::new(143, 188, 143),
        "darkslateblue" => Rgb::new(72, 61, 139),
        "darkslategray" | "darkslategrey" => Rgb::new(47, 79, 79),
        "darkturquoise" => Rgb::new(0, 206, 209),
        "darkviolet" => Rgb::new(148, 0, 211),
        "deeppink" => Rgb::new(255, 20, 147),
        "deepskyblue" => Rgb::new(0, 191, 255),
        "dimgray" | "dimgrey" => Rgb::new(105, 105, 105),
        "dodgerblue" => Rgb::new(30, 144, 255),
        "firebrick" => Rgb::new(178, 34, 34),
        "floralwhite" => Rgb::new(255, 250, 240),
        "forestgreen" => Rgb::new(34, 139, 34),
        "fuchsia" | "magenta" => Rgb::new(255, 0, 255),
        "gainsboro" => Rgb::new(220, 220, 220),
        "ghostwhite" => Rgb::new(248, 248, 255),
        "gold" => Rgb::new(255, 215, 0),
        "goldenrod" => Rgb::new(218, 165, 32),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        "green" => Rgb::new(0, 128, 0),
        "greenyellow" => Rgb::new(173, 255, 47),
        "honeydew" => Rgb::new(240, 255, 240),
        "hotpink" => Rgb::new(255, 105, 180),
        "indianred" => Rgb::new(205, 92, 92),
        "indigo" => Rgb::new(75, 0, 130),
        "ivory" => Rgb::new(255, 255, 240),
        "khaki" => Rgb::new(240, 230, 140),
        "lavender" => Rgb::new(230, 230, 250),
        "lavenderblush" => Rgb::new(255, 240, 245),
        "lawngreen" => Rgb::new(124, 252, 0),
        "lemonchiffon" => Rgb::new(255, 250, 205),
        "lightblue" => Rgb::new(173, 216, 230),
        "lightcoral" => Rgb::new(240, 128, 128),
        "lightcyan" => Rgb::new(224, 255, 255),
        "lightgoldenrodyellow" => Rgb::new(250, 250, 210),
        "lightgray" | "lightgrey" => Rgb::new(211, 211, 211),
        "lightgreen" => Rgb::new(144, 238, 144),
        "lightpink" => Rgb::new(255, 182, 193),
        "lightsalmon" => Rgb::new(255, 160, 122),
        "lightseagreen" => Rgb::new(32, 178, 170),
        "lightskyblue" => Rgb::new(135, 206, 250),
        "lightslategray" | "lightslategrey" => Rgb::new(119, 136, 153),
        "lightsteelblue" => Rgb::new(176, 196, 222),
        "lightyellow" => Rgb::new(255, 255, 224),
        "lime" => Rgb::new(0, 255, 0),
        "limegreen" => Rgb::new(50, 205, 50),
        "linen" => Rgb::new(250, 240, 230),
        "maroon" => Rgb::new(128, 0, 0),
        "mediumaquamarine" => Rgb::new(102, 205, 170),
        "mediumblue" => Rgb::new(0, 0, 205),
        "mediumorchid" => Rgb::new(186, 85, 211),
        "mediumpurple" => Rgb::new(147, 112, 219),
        "mediumseagreen" => Rgb::new(60, 179, 113),
        "mediumslateblue" => Rgb::new(123, 104, 238),
        "mediumspringgreen" => Rgb::new(0, 250, 154),
        "mediumturquoise" => Rgb::new(72, 209, 204),
        "mediumvioletred" => Rgb::new(199, 21, 133),
        "midnightblue" => Rgb::new(25, 25, 112),
        "mintcream" => Rgb::new(245, 255, 250),
        "mistyrose" => Rgb::new(255, 228, 225),
        "moccasin" => Rgb::new(255, 228, 181),
        "navajowhite" => Rgb::new(255, 222, 173),
        "navy" => Rgb::new(0, 0, 128),
        "oldlace" => Rgb::new(253, 245, 230),
        "olive" => Rgb::new(128, 128, 0),
        "olivedrab" => Rgb::new(107, 142, 35),
        "orange" => Rgb::new(255, 165, 0),
        "orangered" => Rgb::new(255, 69, 0),
        "orchid" => Rgb::new(218, 112, 214),
        "palegoldenrod" => Rgb::new(238, 232, 170),
        "palegreen" => Rgb::new(152, 251, 152),
        "paleturquoise" => Rgb::new(175, 238, 238),
        "palevioletred" => Rgb::new(219, 112, 147),
        "papayawhip" => Rgb::new(255, 239, 213),
        "peachpuff" => Rgb::new(255, 218, 185),
        "peru" => Rgb::new(205, 133, 63),
        "pink" => Rgb::new(255, 192, 203),
        "plum" => Rgb::new(221, 160, 221),
        "powderblue" => Rgb::new(176, 224, 230),
        "purple" => Rgb::new(128, 0, 128),
        "rebeccapurple" => Rgb::new(102, 51, 153),
        "red" => Rgb::new(255, 0, 0),
        "rosybrown" => Rgb::new(188, 143, 143),
        "royalblue" => Rgb::new(65, 105, 225),
        "saddlebrown" => Rgb::new(139, 69, 19),
        "salmon" => Rgb::new(250, 128, 114),
        "sandybrown" => Rgb::new(244, 164, 96),
        "seagreen" => Rgb::new(46, 139, 87),
        "seashell" => Rgb::new(255, 245, 238),
        "sienna" => Rgb::new(160, 82, 45),
        "silver" => Rgb::new(192, 192, 192),
        "skyblue" => Rgb::new(135, 206, 235),
        "slateblue" => Rgb::new(106, 90, 205),
        "slategray" | "slategrey" => Rgb::new(112, 128, 144),
        "snow" => Rgb::new(255, 250, 250),
        "springgreen" => Rgb::new(0, 255, 127),
        "steelblue" => Rgb::new(70, 130, 180),
        "tan" => Rgb::new(210, 180, 140),
        "teal" => Rgb::new(0, 128, 128),
        "thistle" => Rgb::new(216, 191, 216),
        "tomato" => Rgb::new(255, 99, 71),
        "turquoise" => Rgb::new(64, 224, 208),
        "violet" => Rgb::new(238, 130, 238),
        "wheat" => Rgb::new(245, 222, 179),
        "white" => Rgb::new(255, 255, 255),
        "whitesmoke" => Rgb::new(245, 245, 245),
        "yellow" => Rgb::new(255, 255, 0),
        "yellowgreen" => Rgb::new(154, 205, 50),
        _ => return None,
    };

    Some(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_hex_rgb_agree() {
        let named = to_canonical_hsl("tomato").unwrap();
        assert_eq!(named, to_canonical_hsl("#ff6347").unwrap());
        assert_eq!(named, to_canonical_hsl("rgb(255, 99, 71)").unwrap());
        assert_eq!(named, to_canonical_hsl("  TOMATO  ").unwrap());
    }

    #[test]
    fn test_short_and_long_hex_agree() {
        assert_eq!(
            to_canonical_hsl("#09c").unwrap(),
            to_canonical_hsl("#0099cc").unwrap()
        );
        // Alpha digits are dropped
        assert_eq!(
            to_canonical_hsl("#09c8").unwrap(),
            to_canonical_hsl("#0099cc80").unwrap()
        );
    }

    #[test]
    fn test_known_canonical_values() {
        assert_eq!(to_canonical_hsl("red").unwrap(), Hsl::new(0, 100, 50));
        assert_eq!(to_canonical_hsl("white").unwrap(), Hsl::new(0, 0, 100));
        assert_eq!(to_canonical_hsl("black").unwrap(), Hsl::new(0, 0, 0));
        assert_eq!(to_canonical_hsl("gray").unwrap(), Hsl::new(0, 0, 50));
        assert_eq!(to_canonical_hsl("#ff6347").unwrap(), Hsl::new(9, 100, 64));
    }

    #[test]
    fn test_canonicalization_is_stable() {
        let color = Hsl::new(203, 77, 42);
        assert_eq!(color.canonical(), color.canonical());
        // The rendered textual form keys down to the same triple
        assert_eq!(
            to_canonical_hsl(&color.to_string()).unwrap(),
            color.canonical()
        );
    }

    #[test]
    fn test_hsl_text_matches_constructed_value() {
        let parsed = to_canonical_hsl("hsl(210, 55%, 43%)").unwrap();
        assert_eq!(parsed, Hsl::new(210, 55, 43).canonical());
    }

    #[test]
    fn test_construction_wraps_and_clamps() {
        assert_eq!(Hsl::new(373, 109, -3), Hsl::new(13, 100, 0));
        assert_eq!(Hsl::new(-15, 50, 120).hue, 345);
        assert_eq!(Hsl::new(360, 40, 40).hue, 0);
    }

    #[test]
    fn test_rounded_hue_stays_in_range() {
        // Close to pure red from above: the raw hue rounds to 360
        let canonical = Rgb::new(255, 0, 1).to_hsl();
        assert_eq!(canonical.hue, 0);
    }

    #[test]
    fn test_rejected_inputs() {
        assert!(parse_color("").is_err());
        assert!(parse_color("#12").is_err());
        assert!(parse_color("#12345g").is_err());
        assert!(parse_color("rgb(256, 0, 0)").is_err());
        assert!(parse_color("rgb(1, 2)").is_err());
        assert!(parse_color("hsl(120, 50, 50)").is_err());
        assert!(parse_color("notacolor").is_err());
    }
}
