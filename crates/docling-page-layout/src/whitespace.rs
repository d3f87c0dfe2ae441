// Whitespace consolidation
//
// Extracted glyph runs rarely carry explicit spaces. Word gaps are
// re-synthesized from glyph advances, ligatures are expanded into their
// component letters, and sub/superscript runs are wrapped in virtual markers.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use crate::config::LayoutConfig;
use crate::fonts::{glyph_box_advance, FontMetrics};
use crate::geometry::{BoundingBox, Bounded};
use crate::line::LineSegment;
use crate::ordering::insertion_sort_by;
use crate::primitive::{
    Glyph, Primitive, PrimitiveKind, SUB_SCRIPT_END, SUB_SCRIPT_START, SUPER_SCRIPT_END, SUPER_SCRIPT_START,
};

const MAX_BASELINE_DIFF_TO_CHAR_HEIGHT_RATIO: f32 = 0.2;

/// Letters a presentation-form ligature stands for.
fn ligature(code: char) -> Option<&'static str> {
    Some(match code {
        '\u{A732}' => "AA",
        '\u{A733}' => "aa",
        '\u{00C6}' => "AE",
        '\u{00E6}' => "ae",
        '\u{AB31}' => "a\u{0259}",
        '\u{A734}' => "AO",
        '\u{A735}' => "ao",
        '\u{A736}' => "AU",
        '\u{A737}' => "au",
        '\u{A738}' | '\u{A73A}' => "AV",
        '\u{A739}' | '\u{A73B}' => "av",
        '\u{A73C}' => "AY",
        '\u{A73D}' => "ay",
        '\u{1F670}' => "et",
        '\u{AB41}' => "\u{0259}\u{00F8}",
        '\u{FB00}' => "ff",
        '\u{FB03}' => "ffi",
        '\u{FB04}' => "ffl",
        '\u{FB01}' => "fi",
        '\u{FB02}' => "fl",
        '\u{01F6}' => "Hv",
        '\u{0195}' => "hv",
        '\u{2114}' => "lb",
        '\u{1EFA}' => "lL",
        '\u{1EFB}' => "ll",
        '\u{0152}' => "OE",
        '\u{0153}' => "oe",
        '\u{A74E}' => "OO",
        '\u{A74F}' => "oo",
        '\u{AB62}' => "\u{0254}e",
        '\u{1E9E}' => "\u{017F}s",
        '\u{00DF}' => "\u{017F}z",
        '\u{FB06}' => "st",
        '\u{FB05}' => "\u{017F}t",
        '\u{A728}' => "TZ",
        '\u{A729}' => "tz",
        '\u{1D6B}' => "ue",
        '\u{AB63}' => "uo",
        '\u{A760}' => "VY",
        '\u{A761}' => "vy",
        _ => return None,
    })
}

/// Whether a word gap separates `prev` from the glyph `current`.
fn needs_space_between(prev: &Primitive, current: &Primitive, glyph: &Glyph, metrics: &dyn FontMetrics) -> bool {
    if glyph.is_space() {
        return false;
    }
    let delta_x = current.bbox.x0 - prev.bbox.x1;
    if delta_x <= 0.0 {
        return false;
    }
    let Some(prev_glyph) = prev.glyph_data() else {
        return (4.0 * delta_x / current.bbox.height()) as usize > 0;
    };
    if prev_glyph.is_space() {
        return false;
    }

    let prev_advance = glyph_box_advance(metrics, prev_glyph, &prev.bbox);
    let curr_advance = glyph_box_advance(metrics, glyph, &current.bbox);

    let mut threshold = prev_advance.max(curr_advance);
    threshold /= if threshold < 400.0 {
        2.0
    } else if threshold < 700.0 {
        4.0
    } else if threshold < 800.0 {
        5.0
    } else {
        6.0
    };
    if (threshold > 1487.9 && threshold < 1488.1) || (threshold > 1389.99 && threshold < 1390.01) {
        threshold *= 1.5;
    }
    threshold *= if prev_advance > curr_advance {
        prev_glyph.font_size
    } else {
        glyph.font_size
    };
    threshold /= 1000.0;
    (delta_x / threshold) as usize > 0
}

/// Letter-spaced capitals ("T I T L E") rendered as alternating letters and spaces.
fn is_horizontally_kerned(items: &[Primitive]) -> bool {
    if items.len() <= 4 {
        return false;
    }
    let mut last_was_space = true;
    for item in items {
        let Some(code) = item.code() else {
            return false;
        };
        if last_was_space {
            if !code.is_ascii_uppercase() {
                return false;
            }
            last_was_space = false;
        } else {
            if code != ' ' {
                return false;
            }
            last_was_space = true;
        }
    }
    true
}

#[derive(Debug, Default)]
struct ScriptState {
    sub: bool,
    sup: bool,
}

impl LineSegment {
    /// Rebuild the member list with synthesized spaces, expanded ligatures and
    /// script markers.
    ///
    /// Previously synthesized spaces and script markers are dropped first, so
    /// running the pass twice yields the same content.
    pub fn consolidate_spaces(&mut self, metrics: &dyn FontMetrics, config: &LayoutConfig) {
        let line_box = *self.bbox();
        let baseline = self.baseline();

        let mut items: Vec<Primitive> = self
            .items()
            .iter()
            .filter(|item| match item.glyph_data() {
                Some(glyph) if glyph.is_virtual => {
                    !(glyph.is_space()
                        || matches!(
                            glyph.code,
                            SUB_SCRIPT_START | SUB_SCRIPT_END | SUPER_SCRIPT_START | SUPER_SCRIPT_END
                        ))
                }
                _ => true,
            })
            .copied()
            .collect();
        insertion_sort_by(&mut items, |a, b| a.bbox.x0 < b.bbox.x0);

        let marker = |code: char, x: f32| -> Option<Primitive> {
            let wanted = match code {
                SUB_SCRIPT_START | SUB_SCRIPT_END => config.mark_subscripts,
                _ => config.mark_superscripts,
            };
            wanted.then(|| {
                Primitive::glyph(
                    BoundingBox::with_bands(x, line_box.y0, x, line_box.y1, line_box.y0, line_box.y1),
                    Glyph::marker(code, baseline),
                )
            })
        };
        let close_scripts =
            |out: &mut Vec<Primitive>, state: &mut ScriptState, x: f32, current: Option<char>, next: Option<char>| {
                if state.sub {
                    if next != Some(SUB_SCRIPT_END) && current != Some(SUB_SCRIPT_END) {
                        out.extend(marker(SUB_SCRIPT_END, x));
                    }
                    state.sub = false;
                }
                if state.sup {
                    if next != Some(SUPER_SCRIPT_END) && current != Some(SUPER_SCRIPT_END) {
                        out.extend(marker(SUPER_SCRIPT_END, x));
                    }
                    state.sup = false;
                }
            };

        let mut out: Vec<Primitive> = Vec::with_capacity(items.len() + items.len() / 4);
        let mut prev_object: Option<Primitive> = None;
        let mut state = ScriptState::default();

        for (i, item) in items.iter().enumerate() {
            let x = item.bbox.x0;
            let current = item.code();
            let prev_code = i.checked_sub(1).and_then(|p| items[p].code());
            let next_code = items.get(i + 1).and_then(Primitive::code);

            match item.glyph_data() {
                Some(glyph) if glyph.code > '\0' => {
                    if let Some(prev) = prev_object.as_ref() {
                        if needs_space_between(prev, item, glyph, metrics) {
                            close_scripts(&mut out, &mut state, x, current, next_code);
                            let mut space = Glyph::new(' ', glyph.baseline, glyph.font, glyph.font_size);
                            space.angle = glyph.angle;
                            space.is_virtual = true;
                            out.push(Primitive::glyph(
                                BoundingBox::with_bands(
                                    prev.bbox.x1,
                                    line_box.y0,
                                    x,
                                    line_box.y1,
                                    line_box.y0,
                                    line_box.y1,
                                ),
                                space,
                            ));
                        }
                    }

                    let shift = MAX_BASELINE_DIFF_TO_CHAR_HEIGHT_RATIO * item.bbox.tight_height();
                    if glyph.can_be_super_or_subscript() && glyph.baseline < baseline - shift {
                        if state.sub {
                            if next_code != Some(SUB_SCRIPT_END) {
                                out.extend(marker(SUB_SCRIPT_END, x));
                            }
                            state.sub = false;
                        }
                        if !state.sup {
                            if prev_code != Some(SUPER_SCRIPT_START) {
                                out.extend(marker(SUPER_SCRIPT_START, x));
                            }
                            state.sup = true;
                        }
                    } else if glyph.can_be_super_or_subscript() && glyph.baseline > baseline + shift {
                        if state.sup {
                            if next_code != Some(SUPER_SCRIPT_END) {
                                out.extend(marker(SUPER_SCRIPT_END, x));
                            }
                            state.sup = false;
                        }
                        if !state.sub {
                            if prev_code != Some(SUB_SCRIPT_START) {
                                out.extend(marker(SUB_SCRIPT_START, x));
                            }
                            state.sub = true;
                        }
                    } else {
                        close_scripts(&mut out, &mut state, x, current, next_code);
                    }

                    if let Some(letters) = ligature(glyph.code) {
                        let width_per_char = item.bbox.width() / letters.chars().count() as f32;
                        let mut x0 = item.bbox.x0;
                        for letter in letters.chars() {
                            let mut part = *glyph;
                            part.code = letter;
                            out.push(Primitive {
                                bbox: BoundingBox::with_bands(
                                    x0,
                                    item.bbox.top,
                                    x0 + width_per_char,
                                    item.bbox.bottom,
                                    item.bbox.y0,
                                    item.bbox.y1,
                                ),
                                kind: PrimitiveKind::Char(part),
                                flags: item.flags,
                            });
                            x0 += width_per_char;
                        }
                    } else {
                        out.push(*item);
                    }
                    prev_object = Some(*item);
                }
                _ => {
                    close_scripts(&mut out, &mut state, x, current, next_code);
                    if !item.is_char() {
                        out.push(*item);
                    }
                    prev_object = Some(*item);
                }
            }

            if i + 1 == items.len() {
                close_scripts(&mut out, &mut state, x, current, next_code);
            }
        }

        if is_horizontally_kerned(&out) {
            out.retain(|item| item.code() != Some(' '));
        }
        self.replace_items(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::NoFontMetrics;
    use crate::primitive::FontId;

    fn glyph(code: char, x0: f32, width: f32, baseline: f32, size: f32) -> Primitive {
        Primitive::glyph(
            BoundingBox::new(x0, baseline - 0.8 * size, x0 + width, baseline + 0.2 * size),
            Glyph::new(code, baseline, Some(FontId(1)), size),
        )
    }

    fn line_of(glyphs: Vec<Primitive>) -> LineSegment {
        LineSegment::from_items(glyphs)
    }

    #[test]
    fn test_space_inserted_at_word_gap() {
        let mut line = line_of(vec![
            glyph('a', 0.0, 5.0, 100.0, 10.0),
            glyph('b', 5.0, 5.0, 100.0, 10.0),
            glyph('c', 14.0, 5.0, 100.0, 10.0),
        ]);
        line.consolidate_spaces(&NoFontMetrics, &LayoutConfig::default());
        assert_eq!(line.content_string(), "ab c");
        assert!(line.items()[2].is_virtual_char());
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let mut line = line_of(vec![
            glyph('a', 0.0, 5.0, 100.0, 10.0),
            glyph('2', 5.0, 3.0, 96.0, 6.0),
            glyph('b', 12.0, 5.0, 100.0, 10.0),
            glyph('c', 17.0, 5.0, 100.0, 10.0),
            glyph('d', 22.0, 5.0, 100.0, 10.0),
        ]);
        let config = LayoutConfig::default();
        line.consolidate_spaces(&NoFontMetrics, &config);
        let once = line.content_string();
        line.consolidate_spaces(&NoFontMetrics, &config);
        assert_eq!(line.content_string(), once);
        assert!(once.contains('\u{207D}'));
        assert!(once.contains('\u{207E}'));
    }

    #[test]
    fn test_superscript_markers_respect_config() {
        let mut line = line_of(vec![
            glyph('x', 0.0, 5.0, 100.0, 10.0),
            glyph('2', 5.0, 3.0, 96.0, 6.0),
            glyph('y', 8.0, 5.0, 100.0, 10.0),
            glyph('z', 13.0, 5.0, 100.0, 10.0),
        ]);
        let config = LayoutConfig {
            mark_superscripts: false,
            ..LayoutConfig::default()
        };
        line.consolidate_spaces(&NoFontMetrics, &config);
        assert_eq!(line.content_string(), "x2yz");
    }

    #[test]
    fn test_ligature_expanded() {
        let mut line = line_of(vec![
            glyph('\u{FB01}', 0.0, 8.0, 100.0, 10.0),
            glyph('n', 8.0, 5.0, 100.0, 10.0),
            glyph('d', 13.0, 5.0, 100.0, 10.0),
        ]);
        line.consolidate_spaces(&NoFontMetrics, &LayoutConfig::default());
        assert_eq!(line.content_string(), "find");
        assert!((line.items()[1].bbox.x0 - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_letter_spaced_capitals_collapse() {
        let mut line = line_of(vec![
            glyph('T', 0.0, 5.0, 100.0, 10.0),
            glyph('I', 10.0, 5.0, 100.0, 10.0),
            glyph('T', 20.0, 5.0, 100.0, 10.0),
            glyph('L', 30.0, 5.0, 100.0, 10.0),
        ]);
        line.consolidate_spaces(&NoFontMetrics, &LayoutConfig::default());
        assert_eq!(line.content_string(), "TITL");
    }
}
