// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! `((gallery ...))` shortcode parsing for host page text. Grammar matches
//! the site-wide shortcode convention: `((name attr="value" attr=value
//! flag))`. Only the gallery shortcode is handled here; anything else is
//! left untouched for the host processor.

use crate::render::RenderAttributes;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{alpha1, alphanumeric1, char, multispace0, multispace1},
    combinator::{map, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
};
use std::collections::HashMap;

pub const GALLERY_SHORTCODE: &str = "gallery";

#[derive(Debug, Clone)]
pub struct GalleryShortcode {
    pub attributes: HashMap<String, String>,
}

impl GalleryShortcode {
    /// The single-gallery filter, when an `id` attribute is present and
    /// positive.
    pub fn gallery_id(&self) -> Option<u64> {
        self.attributes
            .get("id")
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|&id| id > 0)
            .map(|id| id as u64)
    }

    pub fn render_attributes(&self) -> RenderAttributes {
        RenderAttributes {
            template: self
                .attributes
                .get("template")
                .map(|template| template.trim().to_string())
                .filter(|template| !template.is_empty()),
        }
    }
}

fn shortcode_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"), tag("-"))),
        many0(alt((alphanumeric1, tag("-"), tag("_")))),
    ))(input)
}

fn quoted_value(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"'))(input)
}

fn unquoted_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != ')')(input)
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((quoted_value, unquoted_value))(input)
}

fn attribute(input: &str) -> IResult<&str, (String, String)> {
    alt((
        map(
            separated_pair(
                shortcode_name,
                delimited(multispace0, char('='), multispace0),
                attribute_value,
            ),
            |(k, v)| (k.to_string(), v.to_string()),
        ),
        map(shortcode_name, |k| (k.to_string(), String::new())),
    ))(input)
}

fn shortcode_content(input: &str) -> IResult<&str, GalleryShortcode> {
    map(
        tuple((
            preceded(multispace0, tag(GALLERY_SHORTCODE)),
            many0(preceded(multispace1, attribute)),
            multispace0,
        )),
        |(_, attrs, _)| GalleryShortcode {
            attributes: attrs.into_iter().collect(),
        },
    )(input)
}

fn nom_parse_shortcode(input: &str) -> IResult<&str, GalleryShortcode> {
    delimited(tag("(("), shortcode_content, tag("))"))(input)
}

/// Parse a gallery shortcode at the start of `text`. Returns the parsed
/// shortcode and the number of bytes consumed.
pub fn parse_gallery_shortcode(text: &str) -> Option<(GalleryShortcode, usize)> {
    match nom_parse_shortcode(text) {
        Ok((remaining, shortcode)) => Some((shortcode, text.len() - remaining.len())),
        Err(_) => None,
    }
}

/// Replace every gallery shortcode in `text` with the markup produced by
/// `render`. A `None` from the renderer leaves the original shortcode in
/// place for operator correction; non-gallery shortcodes pass through
/// untouched.
pub fn process_page_text(
    text: &str,
    render: impl Fn(&GalleryShortcode) -> Option<String>,
) -> String {
    if !text.contains("((") {
        return text.to_string();
    }

    let mut result = String::new();
    let mut last_end = 0;
    while last_end < text.len() {
        let Some(start_pos) = text[last_end..].find("((") else {
            result.push_str(&text[last_end..]);
            break;
        };
        let actual_start = last_end + start_pos;
        result.push_str(&text[last_end..actual_start]);

        match parse_gallery_shortcode(&text[actual_start..]) {
            Some((shortcode, consumed)) => {
                match render(&shortcode) {
                    Some(html) => result.push_str(&html),
                    None => {
                        log::debug!("Gallery shortcode failed to render, leaving in place");
                        result.push_str(&text[actual_start..actual_start + consumed]);
                    }
                }
                last_end = actual_start + consumed;
            }
            None => {
                result.push_str("((");
                last_end = actual_start + 2;
            }
        }
    }
    result
}
