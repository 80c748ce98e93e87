//! Computed-style value parsing.
//!
//! Built on `winnow` 0.7. Browsers serialize computed values in a narrow,
//! predictable shape (`rgb(255, 0, 0)`, `12px`, `matrix(...)`,
//! `rgba(0, 0, 0, 0.1) 0px 4px 6px -1px`), so these parsers only cover that
//! shape. Every entry point returns `Option`/`Vec`; an unparseable value
//! makes the caller fall back to a default.

use crate::model::{Color, Shadow, ShadowKind};
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, separated, terminated};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_while};

/// Parse a CSS color (`rgb()`, `rgba()`, hex, or a common keyword).
pub fn parse_color(value: &str) -> Option<Color> {
    let mut input = value.trim();
    let color = color.parse_next(&mut input).ok()?;
    input.trim().is_empty().then_some(color)
}

/// Parse a pixel length (`12px`, `0`, `-1.5px`). `auto`/`normal` yield `None`.
pub fn parse_px(value: &str) -> Option<f32> {
    let mut input = value.trim();
    let v = terminated(number, opt("px")).parse_next(&mut input).ok()?;
    input.is_empty().then_some(v)
}

/// Parse a numeric or keyword font weight.
pub fn parse_font_weight(value: &str) -> Option<u16> {
    match value.trim() {
        "normal" => Some(400),
        "bold" => Some(700),
        "lighter" => Some(300),
        "bolder" => Some(700),
        other => other
            .parse::<f32>()
            .ok()
            .filter(|w| w.is_finite() && *w >= 1.0 && *w <= 1000.0)
            .map(|w| w.round() as u16),
    }
}

/// First family of a `font-family` list, unquoted.
pub fn first_font_family(value: &str) -> Option<String> {
    let first = split_top_level(value, ',').into_iter().next()?;
    let family = first.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    (!family.is_empty()).then(|| family.to_string())
}

/// Extract the target of a `url(...)` value.
pub fn parse_url(value: &str) -> Option<String> {
    let mut input = value.trim();
    url.parse_next(&mut input).ok().map(str::to_string)
}

/// Rotation in degrees from a computed `transform` (`matrix`, `matrix3d`, `rotate`).
pub fn parse_rotation(value: &str) -> Option<f32> {
    let value = value.trim();
    if value == "none" {
        return Some(0.0);
    }
    let mut input = value;
    let angle = alt((matrix_rotation, rotate_function))
        .parse_next(&mut input)
        .ok()?;
    // Normalize -0.0 and tiny float noise to a clean zero.
    Some(if angle.abs() < 1e-3 { 0.0 } else { angle })
}

/// Parse a computed `box-shadow` list. Inset shadows are not modeled and are dropped.
pub fn parse_box_shadows(value: &str) -> Vec<Shadow> {
    let value = value.trim();
    if value.is_empty() || value == "none" {
        return Vec::new();
    }
    split_top_level(value, ',')
        .into_iter()
        .filter_map(|layer| {
            let parsed = parse_shadow_layer(layer);
            if parsed.is_none() {
                log::debug!("unparseable box-shadow layer {layer:?}");
            }
            parsed
        })
        .collect()
}

/// Split on `sep` outside of parentheses and quotes.
pub fn split_top_level(value: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, c) if c == sep && depth == 0 => {
                parts.push(value[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(value[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

// ─── Shadow layers ──────────────────────────────────────────────────────

fn parse_shadow_layer(layer: &str) -> Option<Shadow> {
    let mut input = layer.trim();
    let mut color_value = None;
    let mut lengths: Vec<f32> = Vec::with_capacity(4);

    while !input.is_empty() {
        if input.starts_with("inset") {
            return None;
        }
        // Probe on a copy so a failed alternative never leaves `input` half-consumed.
        let mut probe = input;
        if let Ok(c) = color.parse_next(&mut probe) {
            color_value = Some(c);
        } else {
            probe = input;
            lengths.push(length.parse_next(&mut probe).ok()?);
        }
        input = probe.trim_start();
    }

    if lengths.len() < 2 {
        return None;
    }
    Some(Shadow {
        kind: ShadowKind::DropShadow,
        // A shadow without an explicit color uses currentColor; we don't
        // track that, so it stays color-less and is never forwarded.
        color: color_value,
        offset_x: lengths[0],
        offset_y: lengths[1],
        blur: lengths.get(2).copied().unwrap_or(0.0),
        spread: lengths.get(3).copied().unwrap_or(0.0),
        visible: true,
    })
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn number(input: &mut &str) -> ModalResult<f32> {
    (
        opt(one_of(['-', '+'])),
        take_while(0.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
        opt((
            one_of(['e', 'E']),
            opt(one_of(['-', '+'])),
            take_while(1.., |c: char| c.is_ascii_digit()),
        )),
    )
        .take()
        .verify(|s: &str| s.chars().any(|c| c.is_ascii_digit()))
        .try_map(str::parse::<f32>)
        .parse_next(input)
}

fn length(input: &mut &str) -> ModalResult<f32> {
    terminated(number, opt("px")).parse_next(input)
}

/// Separator between function arguments: comma, slash, or bare whitespace.
fn arg_sep(input: &mut &str) -> ModalResult<()> {
    (multispace0, opt(one_of([',', '/'])), multispace0)
        .void()
        .parse_next(input)
}

fn alpha(input: &mut &str) -> ModalResult<f32> {
    (number, opt('%'))
        .map(|(v, pct)| if pct.is_some() { v / 100.0 } else { v })
        .parse_next(input)
}

fn color(input: &mut &str) -> ModalResult<Color> {
    alt((rgb_function, hex_color, named_color)).parse_next(input)
}

fn rgb_function(input: &mut &str) -> ModalResult<Color> {
    (
        terminated(alt(("rgba", "rgb")), (multispace0, '(', multispace0)),
        number,
        preceded(arg_sep, number),
        preceded(arg_sep, number),
        opt(preceded(arg_sep, alpha)),
        (multispace0, ')'),
    )
        .map(|(_, r, g, b, a, _)| {
            let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
            Color::from_rgb8(channel(r), channel(g), channel(b), a.unwrap_or(1.0))
        })
        .parse_next(input)
}

fn hex_color(input: &mut &str) -> ModalResult<Color> {
    preceded('#', take_while(3..=8, |c: char| c.is_ascii_hexdigit()))
        .verify_map(|hex: &str| Color::from_hex(&format!("#{hex}")))
        .parse_next(input)
}

fn named_color(input: &mut &str) -> ModalResult<Color> {
    take_while(1.., |c: char| c.is_ascii_alphabetic())
        .verify_map(|name: &str| match name.to_ascii_lowercase().as_str() {
            "transparent" => Some(Color::TRANSPARENT),
            "black" => Some(Color::BLACK),
            "white" => Some(Color::WHITE),
            "red" => Some(Color::from_rgb8(255, 0, 0, 1.0)),
            "green" => Some(Color::from_rgb8(0, 128, 0, 1.0)),
            "blue" => Some(Color::from_rgb8(0, 0, 255, 1.0)),
            "gray" | "grey" => Some(Color::from_rgb8(128, 128, 128, 1.0)),
            _ => None,
        })
        .parse_next(input)
}

fn url<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited(
        ("url(", multispace0),
        alt((
            delimited('"', take_till(0.., '"'), '"'),
            delimited('\'', take_till(0.., '\''), '\''),
            take_till(0.., ')'),
        )),
        (multispace0, ')'),
    )
    .map(str::trim)
    .parse_next(input)
}

fn matrix_args(count: usize) -> impl FnMut(&mut &str) -> ModalResult<Vec<f32>> {
    move |input: &mut &str| {
        separated(count, delimited(multispace0, number, multispace0), ',').parse_next(input)
    }
}

fn matrix_rotation(input: &mut &str) -> ModalResult<f32> {
    alt((
        delimited(("matrix3d", multispace0, '('), matrix_args(16), ')'),
        delimited(("matrix", multispace0, '('), matrix_args(6), ')'),
    ))
    .map(|values| values[1].atan2(values[0]).to_degrees())
    .parse_next(input)
}

fn rotate_function(input: &mut &str) -> ModalResult<f32> {
    delimited(
        ("rotate", multispace0, '(', multispace0),
        (number, alt(("deg", "rad", "turn", ""))),
        (multispace0, ')'),
    )
    .map(|(v, unit)| match unit {
        "rad" => v.to_degrees(),
        "turn" => v * 360.0,
        _ => v,
    })
    .parse_next(input)
}
