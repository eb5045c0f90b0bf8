//! TrueType tables built with `write-fonts`.
//!
//! The assembler hands over the ordered glyph set; this module derives the
//! font-wide values from it and fills in `head`, `hhea`, `maxp`, `OS/2`, `hmtx`,
//! `cmap`, `name`, `post`, `glyf` and `loca`. Creation and modification dates stay
//! at zero so identical input compiles to identical bytes.

use write_fonts::FontBuilder;
use write_fonts::tables::cmap::Cmap;
use write_fonts::tables::glyf::GlyfLocaBuilder;
use write_fonts::tables::head::Head;
use write_fonts::tables::hhea::Hhea;
use write_fonts::tables::hmtx::{Hmtx, LongMetric};
use write_fonts::tables::loca::LocaFormat;
use write_fonts::tables::maxp::Maxp;
use write_fonts::tables::name::{Name, NameRecord};
use write_fonts::tables::os2::Os2;
use write_fonts::tables::post::Post;
use write_fonts::types::{FWord, Fixed, GlyphId, NameId, UfWord};

use crate::core::{FontError, FontResult};
use crate::font::FontMetricsConfig;
use crate::font::glyf::{FontGlyph, GlyphBounds};

/// Value the whole-file checksum is adjusted to.
const CHECKSUM_MAGIC: u32 = 0xB1B0AFBA;
/// Offset of `checkSumAdjustment` inside `head`.
const HEAD_CHECKSUM_OFFSET: usize = 8;

/// Windows platform, Unicode BMP encoding, US English.
const WINDOWS: (u16, u16, u16) = (3, 1, 0x0409);

/// Font-wide values derived from the glyph set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FontSummary {
    pub bounds: GlyphBounds,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub average_advance: i16,
    pub max_points: u16,
    pub max_contours: u16,
    pub first_char: u16,
    pub last_char: u16,
}

impl FontSummary {
    pub(crate) fn of(glyphs: &[FontGlyph]) -> Self {
        let mut bounds: Option<GlyphBounds> = None;
        let (mut min_lsb, mut min_rsb, mut max_extent) = (i16::MAX, i16::MAX, i16::MIN);
        for glyph in glyphs {
            if let Some(b) = glyph.bounds() {
                bounds = Some(bounds.map_or(b, |acc| acc.union(&b)));
                let rsb = glyph.advance_width as i32 - b.x_max as i32;
                min_lsb = min_lsb.min(b.x_min);
                min_rsb = min_rsb.min(rsb.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
                max_extent = max_extent.max(b.x_max);
            }
        }
        let has_outlines = bounds.is_some();

        let advances: Vec<u32> = glyphs
            .iter()
            .map(|g| g.advance_width as u32)
            .filter(|&a| a > 0)
            .collect();
        let average_advance = if advances.is_empty() {
            0
        } else {
            (advances.iter().sum::<u32>() / advances.len() as u32).min(i16::MAX as u32) as i16
        };

        let codepoints: Vec<u16> = glyphs
            .iter()
            .filter_map(|g| g.codepoint)
            .map(|c| (c as u32).min(0xFFFF) as u16)
            .collect();

        Self {
            bounds: bounds.unwrap_or_default(),
            advance_width_max: glyphs.iter().map(|g| g.advance_width).max().unwrap_or(0),
            min_left_side_bearing: if has_outlines { min_lsb } else { 0 },
            min_right_side_bearing: if has_outlines { min_rsb } else { 0 },
            x_max_extent: if has_outlines { max_extent } else { 0 },
            average_advance,
            max_points: glyphs
                .iter()
                .map(|g| g.stored_point_bound().min(u16::MAX as usize) as u16)
                .max()
                .unwrap_or(0),
            max_contours: glyphs.iter().map(|g| g.contours.len() as u16).max().unwrap_or(0),
            first_char: codepoints.iter().copied().min().unwrap_or(0),
            last_char: codepoints.iter().copied().max().unwrap_or(0),
        }
    }
}

/// Compiles `glyphs` (`.notdef` first) into a TrueType binary.
pub(crate) fn compile(metrics: &FontMetricsConfig, glyphs: &[FontGlyph]) -> FontResult<Vec<u8>> {
    let num_glyphs = u16::try_from(glyphs.len()).map_err(|_| {
        FontError::invalid_input(format!("{} glyphs exceed the TrueType limit", glyphs.len()))
    })?;
    let summary = FontSummary::of(glyphs);

    let mut glyf_builder = GlyfLocaBuilder::new();
    for glyph in glyphs {
        let outline = glyph
            .to_glyph()
            .map_err(|e| FontError::font_assembly(&format!("outline of '{}'", glyph.name), std::io::Error::other(format!("{e:?}"))))?;
        glyf_builder
            .add_glyph(&outline)
            .map_err(|e| FontError::font_assembly(&format!("glyf entry of '{}'", glyph.name), e))?;
    }
    let (glyf, loca, loca_format) = glyf_builder.build();

    let cmap = Cmap::from_mappings(glyphs.iter().enumerate().filter_map(|(gid, g)| {
        g.codepoint.map(|c| (c, GlyphId::new(gid as u32)))
    }))
    .map_err(|e| FontError::font_assembly("cmap", e))?;

    let mut builder = FontBuilder::new();
    builder
        .add_table(&build_head(metrics, &summary, loca_format))
        .and_then(|b| b.add_table(&build_hhea(metrics, &summary, num_glyphs)))
        .and_then(|b| b.add_table(&build_maxp(&summary, num_glyphs)))
        .and_then(|b| b.add_table(&build_os2(metrics, &summary, glyphs)))
        .and_then(|b| b.add_table(&build_hmtx(glyphs)))
        .and_then(|b| b.add_table(&cmap))
        .and_then(|b| b.add_table(&build_name(metrics)))
        .and_then(|b| b.add_table(&build_post(metrics, glyphs)))
        .and_then(|b| b.add_table(&glyf))
        .and_then(|b| b.add_table(&loca))
        .map_err(|e| FontError::font_assembly("font tables", e))?;

    let mut data = builder.build();
    adjust_file_checksum(&mut data);
    Ok(data)
}

fn build_head(metrics: &FontMetricsConfig, summary: &FontSummary, loca_format: LocaFormat) -> Head {
    Head {
        font_revision: font_revision(&metrics.version),
        units_per_em: metrics.units_per_em,
        x_min: summary.bounds.x_min,
        y_min: summary.bounds.y_min,
        x_max: summary.bounds.x_max,
        y_max: summary.bounds.y_max,
        lowest_rec_ppem: 8,
        index_to_loc_format: match loca_format {
            LocaFormat::Short => 0,
            LocaFormat::Long => 1,
        },
        ..Default::default()
    }
}

fn build_hhea(metrics: &FontMetricsConfig, summary: &FontSummary, num_glyphs: u16) -> Hhea {
    Hhea::new(
        FWord::new(metrics.ascender),
        FWord::new(metrics.descender),
        FWord::new(metrics.line_gap),
        UfWord::new(summary.advance_width_max),
        FWord::new(summary.min_left_side_bearing),
        FWord::new(summary.min_right_side_bearing),
        FWord::new(summary.x_max_extent),
        1, // caret slope rise: upright
        0,
        0,
        num_glyphs,
    )
}

fn build_maxp(summary: &FontSummary, num_glyphs: u16) -> Maxp {
    Maxp {
        num_glyphs,
        max_points: Some(summary.max_points),
        max_contours: Some(summary.max_contours),
        max_composite_points: Some(0),
        max_composite_contours: Some(0),
        max_zones: Some(2),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(0),
        max_component_depth: Some(0),
        ..Default::default()
    }
}

fn build_os2(metrics: &FontMetricsConfig, summary: &FontSummary, glyphs: &[FontGlyph]) -> Os2 {
    let upm = metrics.units_per_em as i32;
    let scaled = |v: i32| (v * upm / 1000) as i16;

    let codepoints = || glyphs.iter().filter_map(|g| g.codepoint);
    let mut unicode_range = 0u32;
    let mut code_page = 0u32;
    if codepoints().any(|c| c.is_ascii()) {
        unicode_range |= 1 << 0;
        code_page |= 1 << 0;
    }
    if codepoints().any(|c| ('\u{0590}'..='\u{05FF}').contains(&c)) {
        unicode_range |= 1 << 11;
        code_page |= 1 << 5;
    }

    Os2 {
        x_avg_char_width: summary.average_advance,
        us_weight_class: 400,
        us_width_class: 5,
        y_subscript_x_size: scaled(650),
        y_subscript_y_size: scaled(600),
        y_subscript_y_offset: scaled(75),
        y_superscript_x_size: scaled(650),
        y_superscript_y_size: scaled(600),
        y_superscript_y_offset: scaled(350),
        y_strikeout_size: scaled(50),
        y_strikeout_position: scaled(300),
        ul_unicode_range_1: unicode_range,
        us_first_char_index: summary.first_char,
        us_last_char_index: summary.last_char,
        s_typo_ascender: metrics.ascender,
        s_typo_descender: metrics.descender,
        s_typo_line_gap: metrics.line_gap,
        us_win_ascent: summary.bounds.y_max.max(metrics.ascender).max(0) as u16,
        us_win_descent: (-(summary.bounds.y_min.min(metrics.descender) as i32)).max(0) as u16,
        ul_code_page_range_1: Some(code_page),
        ul_code_page_range_2: Some(0),
        sx_height: Some(metrics.ascender / 2),
        s_cap_height: Some(metrics.ascender),
        us_default_char: Some(0),
        us_break_char: Some(0x20),
        us_max_context: Some(0),
        ..Default::default()
    }
}

fn build_hmtx(glyphs: &[FontGlyph]) -> Hmtx {
    let metrics = glyphs
        .iter()
        .map(|g| LongMetric::new(g.advance_width, g.left_side_bearing()))
        .collect();
    Hmtx::new(metrics, Vec::new())
}

/// `name` records 1 through 6.
fn build_name(metrics: &FontMetricsConfig) -> Name {
    let full_name = format!("{} {}", metrics.family_name, metrics.style_name);
    let postscript = postscript_name(metrics);
    let unique = format!("{};{}", metrics.version, postscript);
    let records = [
        (1, metrics.family_name.clone()),
        (2, metrics.style_name.clone()),
        (3, unique),
        (4, full_name),
        (5, metrics.version.clone()),
        (6, postscript),
    ];

    let (platform, encoding, language) = WINDOWS;
    Name::new(
        records
            .into_iter()
            .map(|(id, text)| NameRecord::new(platform, encoding, language, NameId::new(id), text.into()))
            .collect(),
    )
}

/// `post` with the glyph names of the assembled set.
fn build_post(metrics: &FontMetricsConfig, glyphs: &[FontGlyph]) -> Post {
    let upm = metrics.units_per_em as i32;
    let mut post = Post::new_v2(glyphs.iter().map(|g| g.name.as_str()));
    post.underline_position = FWord::new((-100 * upm / 1000) as i16);
    post.underline_thickness = FWord::new((50 * upm / 1000) as i16);
    post
}

/// `Family-Style` without spaces or the characters PostScript names forbid.
pub(crate) fn postscript_name(metrics: &FontMetricsConfig) -> String {
    format!("{}-{}", metrics.family_name, metrics.style_name)
        .chars()
        .filter(|c| c.is_ascii_graphic() && !"[](){}<>/%".contains(*c))
        .collect()
}

/// `"Version 1.002"` → 1.002; unparseable strings give 1.0.
fn font_revision(version: &str) -> Fixed {
    let number = version
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit())
        .split_whitespace()
        .next()
        .unwrap_or("");
    let mut parts = number.splitn(2, '.');
    let major: u32 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(1);
    let minor: u32 = parts
        .next()
        .and_then(|p| p.chars().take(3).collect::<String>().parse().ok())
        .unwrap_or(0);
    Fixed::from_f64(major.min(0x7FFF) as f64 + minor as f64 / 1000.0)
}

/// Sum of big-endian u32 words, zero-padding a trailing partial word.
fn table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Sets `head.checkSumAdjustment` so the whole file sums to [`CHECKSUM_MAGIC`].
fn adjust_file_checksum(data: &mut [u8]) {
    let read_u32 = |data: &[u8], at: usize| {
        data.get(at..at + 4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    };
    let num_tables = data.get(4..6).map_or(0, |b| u16::from_be_bytes([b[0], b[1]]) as usize);
    let head = (0..num_tables)
        .map(|i| 12 + 16 * i)
        .find(|&record| data.get(record..record + 4) == Some(b"head".as_slice()))
        .and_then(|record| read_u32(data, record + 8));
    let Some(head) = head else {
        return;
    };
    let field = head as usize + HEAD_CHECKSUM_OFFSET;
    if field + 4 > data.len() {
        return;
    }
    data[field..field + 4].fill(0);
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(table_checksum(data));
    data[field..field + 4].copy_from_slice(&adjustment.to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::glyf::GlyphPoint;

    fn square(name: &str, codepoint: char, x: i16) -> FontGlyph {
        let pt = |x, y| GlyphPoint { x, y, on_curve: true };
        FontGlyph {
            name: name.to_string(),
            codepoint: Some(codepoint),
            contours: vec![vec![pt(x, 0), pt(x, 500), pt(x + 300, 500), pt(x + 300, 0)]],
            advance_width: (x + 350) as u16,
        }
    }

    fn glyph_set() -> Vec<FontGlyph> {
        vec![
            FontGlyph::empty(".notdef", None, 600),
            FontGlyph::empty("space", Some(' '), 600),
            square("alef", '\u{05D0}', 50),
            square("bet", '\u{05D1}', 80),
        ]
    }

    #[test]
    fn test_summary() {
        let summary = FontSummary::of(&glyph_set());
        assert_eq!(summary.bounds, GlyphBounds { x_min: 50, y_min: 0, x_max: 380, y_max: 500 });
        assert_eq!(summary.advance_width_max, 600);
        assert_eq!(summary.min_left_side_bearing, 50);
        assert_eq!(summary.max_points, 5);
        assert_eq!(summary.max_contours, 1);
        assert_eq!((summary.first_char, summary.last_char), (0x20, 0x05D1));
    }

    #[test]
    fn test_compiled_tables_read_back() {
        let metrics = FontMetricsConfig::default();
        let data = compile(&metrics, &glyph_set()).unwrap();
        assert_eq!(table_checksum(&data), CHECKSUM_MAGIC);

        let face = ttf_parser::Face::parse(&data, 0).unwrap();
        assert_eq!(face.number_of_glyphs(), 4);
        assert_eq!(face.units_per_em(), 1000);
        assert_eq!(face.ascender(), 800);
        assert_eq!(face.descender(), -200);

        let bet = face.glyph_index('\u{05D1}').unwrap();
        assert_eq!(bet.0, 3);
        assert_eq!(face.glyph_hor_advance(bet), Some(430));
        assert_eq!(face.glyph_hor_side_bearing(bet), Some(80));
        let bbox = face.glyph_bounding_box(bet).unwrap();
        assert_eq!((bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max), (80, 0, 380, 500));
        assert_eq!(face.glyph_name(bet), Some("bet"));
        assert!(face.glyph_index('A').is_none());
    }

    #[test]
    fn test_name_records() {
        let metrics = FontMetricsConfig {
            family_name: "Sheet Hand".to_string(),
            ..FontMetricsConfig::default()
        };
        let data = compile(&metrics, &glyph_set()).unwrap();
        let face = ttf_parser::Face::parse(&data, 0).unwrap();
        let name = |id| {
            face.names()
                .into_iter()
                .find(|n| n.name_id == id)
                .and_then(|n| n.to_string())
        };
        assert_eq!(name(ttf_parser::name_id::FAMILY).as_deref(), Some("Sheet Hand"));
        assert_eq!(name(ttf_parser::name_id::FULL_NAME).as_deref(), Some("Sheet Hand Regular"));
        assert_eq!(
            name(ttf_parser::name_id::UNIQUE_ID).as_deref(),
            Some("Version 1.000;SheetHand-Regular")
        );
    }

    #[test]
    fn test_same_glyphs_compile_to_same_bytes() {
        let metrics = FontMetricsConfig::default();
        assert_eq!(
            compile(&metrics, &glyph_set()).unwrap(),
            compile(&metrics, &glyph_set()).unwrap()
        );
    }

    #[test]
    fn test_font_revision() {
        assert_eq!(font_revision("Version 1.000"), Fixed::from_f64(1.0));
        assert_eq!(font_revision("Version 2.500"), Fixed::from_f64(2.5));
        assert_eq!(font_revision("garbage"), Fixed::from_f64(1.0));
    }

    #[test]
    fn test_table_checksum() {
        assert_eq!(table_checksum(b"ABCD"), 0x41424344);
        assert_eq!(table_checksum(&[0, 0, 0, 1, 0x80]), 0x80000001);
    }
}
