//! Positioning passes: horizontal alignment and vertical stacking.

use crate::style::{Align, LastLine, VAlign};
use crate::wrap::UnitLine;

/// Assign x positions.
///
/// Alignment is per line, taken from the line's first unit so a tag spanning
/// a whole paragraph aligns every wrapped line it produced. Without a finite
/// positive wrap width there is no right edge and everything stays
/// left-aligned.
pub(crate) fn apply_horizontal(lines: &mut [UnitLine], default_align: Align, wrap_width: f32) {
    let bounded = wrap_width.is_finite() && wrap_width > 0.0;
    let count = lines.len();
    for idx in 0..count {
        let paragraph_last = lines[idx].paragraph_break || idx + 1 == count;
        let line = &mut lines[idx];

        let mut cursor = 0.0f32;
        for unit in &mut line.units {
            unit.x = cursor;
            cursor += unit.width;
        }
        let line_width = cursor;
        if !bounded {
            continue;
        }

        let align = line
            .units
            .first()
            .map(|u| u.unit.style.align)
            .unwrap_or(default_align);
        match align {
            Align::Left => {}
            Align::Right => shift_line(line, wrap_width - line_width),
            Align::Center => shift_line(line, (wrap_width - line_width) / 2.0),
            Align::Justify(last_line) => {
                if paragraph_last && last_line != LastLine::All {
                    match last_line {
                        LastLine::Right => shift_line(line, wrap_width - line_width),
                        LastLine::Center => shift_line(line, (wrap_width - line_width) / 2.0),
                        LastLine::Left | LastLine::All => {}
                    }
                } else {
                    justify_line(line, wrap_width, line_width);
                }
            }
        }
    }
}

fn shift_line(line: &mut UnitLine, offset: f32) {
    if offset <= 0.0 {
        return;
    }
    for unit in &mut line.units {
        unit.x += offset;
    }
}

/// Distribute the slack evenly over the gaps between units that occupy width.
/// Zero-width units (collapsed spaces, line breaks) neither receive a gap nor
/// count toward one, so the last visible unit lands flush on the right edge.
fn justify_line(line: &mut UnitLine, wrap_width: f32, line_width: f32) {
    let visible = line.units.iter().filter(|u| u.width > 0.0).count();
    if visible < 2 {
        return;
    }
    let extra = ((wrap_width - line_width) / (visible - 1) as f32).max(0.0);
    let mut passed = 0u32;
    for unit in &mut line.units {
        unit.x += extra * passed as f32;
        if unit.width > 0.0 {
            passed += 1;
        }
    }
}

/// Assign y positions and stack lines top to bottom.
///
/// A line's ascent and height come from its tallest unit. Lines with no
/// vertical extent of their own (a bare line-break from consecutive breaks)
/// inherit the previous line's height so blank lines keep the rhythm of the
/// paragraph around them.
pub(crate) fn apply_vertical(lines: &mut [UnitLine], default_line_spacing: f32) {
    let mut y = 0.0f32;
    let mut prev_ascent = 0.0f32;
    let mut prev_height = 0.0f32;
    for line in lines {
        let mut line_ascent = 0.0f32;
        let mut line_height = 0.0f32;
        for unit in &line.units {
            line_ascent = line_ascent.max(unit.effective_ascent());
            line_height = line_height.max(unit.height);
        }
        if line_height <= 0.0 {
            line_ascent = prev_ascent;
            line_height = prev_height;
        }

        for unit in &mut line.units {
            let ascent = unit.effective_ascent();
            unit.y = match unit.unit.style.valign {
                VAlign::Top => y,
                VAlign::Middle => y + (line_height - unit.height) / 2.0,
                VAlign::Bottom => y + line_height - unit.height,
                VAlign::Baseline => y + line_ascent - ascent,
                VAlign::Offset(offset) => y + line_ascent - ascent - offset,
            };
        }

        let line_spacing = line
            .units
            .first()
            .map(|u| u.unit.style.line_spacing)
            .unwrap_or(default_line_spacing);
        y += line_height + line_spacing + line.paragraph_spacing_after;
        prev_ascent = line_ascent;
        prev_height = line_height;
    }
}
