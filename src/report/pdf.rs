use std::path::Path;

use anyhow::{Context, Result};
use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};

use crate::collection::AppCollection;
use crate::models::{RiskLevel, ScoredApp};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 18.0;
const COVER_HDR_H: f32 = 68.0;

// ── Palette ───────────────────────────────────────────────────────────────────
const BG:           (f32, f32, f32) = (1.00, 1.00, 1.00);
const PANEL:        (f32, f32, f32) = (1.00, 1.00, 1.00);
const PANEL_BORDER: (f32, f32, f32) = (0.85, 0.87, 0.92);
const ACCENT_RED:   (f32, f32, f32) = (0.82, 0.18, 0.26);
const ACCENT_PUR:   (f32, f32, f32) = (0.45, 0.22, 0.62);
const TEXT_PRI:     (f32, f32, f32) = (0.07, 0.08, 0.14);
const TEXT_SEC:     (f32, f32, f32) = (0.36, 0.40, 0.52);
const TEXT_MUT:     (f32, f32, f32) = (0.58, 0.63, 0.72);
const WHITE:        (f32, f32, f32) = (1.00, 1.00, 1.00);
const WHITE_DIM:    (f32, f32, f32) = (0.96, 0.86, 0.88);

const HIGH_BG: (f32, f32, f32) = (1.00, 0.91, 0.91);
const HIGH_FG: (f32, f32, f32) = (0.76, 0.09, 0.13);
const MED_BG:  (f32, f32, f32) = (1.00, 0.95, 0.87);
const MED_FG:  (f32, f32, f32) = (0.70, 0.40, 0.02);
const LOW_BG:  (f32, f32, f32) = (0.90, 0.98, 0.92);
const LOW_FG:  (f32, f32, f32) = (0.07, 0.52, 0.22);

const R_PANEL: f32 = 2.5;
const R_BADGE: f32 = 1.5;

const BADGE_W: f32 = 22.0;
const BADGE_H: f32 = 6.0;

const NAME_TRUNC: usize = 40;
const REASON_WRAP: usize = 92;
const REASON_MAX_LINES: usize = 4;

// ── Public entry point ────────────────────────────────────────────────────────

/// Render a PDF report: cover page with risk overview → ranked application
/// table with reasons.
pub fn render(collection: &AppCollection, scan_path: &Path, output_path: &Path) -> Result<()> {
    let doc = PdfDocument::empty("Spyware Risk Report");

    add_cover_page(&doc, collection, scan_path)?;
    add_table_pages(&doc, collection)?;

    let bytes = doc.save_to_bytes()?;
    std::fs::write(output_path, &bytes)
        .with_context(|| format!("Failed to write PDF to {}", output_path.display()))?;

    println!("PDF report written to: {}", output_path.display());
    Ok(())
}

// ── Cover page ────────────────────────────────────────────────────────────────

fn add_cover_page(
    doc: &PdfDocumentReference,
    collection: &AppCollection,
    scan_path: &Path,
) -> Result<()> {
    let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Cover");
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let font_b = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_r = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let total = collection.len();
    let high = collection.count_level(RiskLevel::High);
    let medium = collection.count_level(RiskLevel::Medium);
    let low = collection.count_level(RiskLevel::Low);

    fill_rect(&layer, 0.0, 0.0, PAGE_W, PAGE_H, BG);
    let hdr_bot = PAGE_H - COVER_HDR_H;
    fill_gradient_h(&layer, 0.0, hdr_bot, PAGE_W, COVER_HDR_H, ACCENT_RED, ACCENT_PUR, 28);

    set_color(&layer, WHITE_DIM);
    layer.use_text(
        format!("spyscan v{}", env!("CARGO_PKG_VERSION")),
        7.5,
        Mm(PAGE_W - MARGIN - 36.0),
        Mm(PAGE_H - 10.5),
        &font_r,
    );

    set_color(&layer, WHITE);
    layer.use_text("Spyware Risk", 28.0, Mm(MARGIN), Mm(PAGE_H - 26.0), &font_b);
    set_color(&layer, WHITE_DIM);
    layer.use_text("Application Scan Report", 28.0, Mm(MARGIN), Mm(PAGE_H - 41.0), &font_b);

    // Scan-target chip
    let chip_y = hdr_bot - 18.0;
    let chip_h = 12.0f32;
    let chip_w = PAGE_W - MARGIN * 2.0;
    fill_rounded_rect(&layer, MARGIN, chip_y, chip_w, chip_h, R_BADGE, PANEL);
    stroke_rounded_rect(&layer, MARGIN, chip_y, chip_w, chip_h, R_BADGE, PANEL_BORDER);
    fill_rect(&layer, MARGIN, chip_y, 2.5, chip_h, ACCENT_RED);

    set_color(&layer, TEXT_MUT);
    layer.use_text("SCAN TARGET", 6.0, Mm(MARGIN + 5.0), Mm(chip_y + chip_h - 3.8), &font_b);
    set_color(&layer, TEXT_PRI);
    layer.use_text(
        truncate(&scan_path.display().to_string(), 72),
        9.5,
        Mm(MARGIN + 5.0),
        Mm(chip_y + 2.8),
        &font_b,
    );

    set_color(&layer, TEXT_SEC);
    layer.use_text(
        format!("Scanned  {}", scan_date()),
        9.0,
        Mm(MARGIN),
        Mm(chip_y - 8.0),
        &font_r,
    );

    let rule_y = chip_y - 16.5;
    draw_hline(&layer, MARGIN, PAGE_W - MARGIN, rule_y, PANEL_BORDER);
    set_color(&layer, TEXT_MUT);
    layer.use_text("OVERVIEW", 6.5, Mm(MARGIN), Mm(rule_y - 7.0), &font_b);

    // Stat cards
    let card_y = rule_y - 42.0;
    let card_h = 26.0f32;
    let gap = 4.0f32;
    let card_w = (PAGE_W - MARGIN * 2.0 - gap * 3.0) / 4.0;

    let cards: [(&str, String, (f32, f32, f32)); 4] = [
        ("SCANNED", total.to_string(), ACCENT_PUR),
        ("HIGH", high.to_string(), HIGH_FG),
        ("MEDIUM", medium.to_string(), MED_FG),
        ("LOW", low.to_string(), LOW_FG),
    ];

    for (i, (label, value, accent)) in cards.iter().enumerate() {
        let cx = MARGIN + (card_w + gap) * i as f32;
        draw_stat_card(&layer, cx, card_y, card_w, card_h, label, value, *accent, &font_r, &font_b);
    }

    // Top findings preview
    let section_y = card_y - 13.0;
    draw_hline(&layer, MARGIN, PAGE_W - MARGIN, section_y, PANEL_BORDER);
    set_color(&layer, TEXT_MUT);
    layer.use_text("HIGHEST RISK", 6.5, Mm(MARGIN), Mm(section_y - 7.5), &font_b);

    let mut y = section_y - 17.0;
    for app in collection.ranked().iter().take(6) {
        fill_rounded_rect(&layer, MARGIN, y - 2.5, PAGE_W - MARGIN * 2.0, 9.5, R_BADGE, PANEL);
        stroke_rounded_rect(
            &layer,
            MARGIN,
            y - 2.5,
            PAGE_W - MARGIN * 2.0,
            9.5,
            R_BADGE,
            PANEL_BORDER,
        );

        set_color(&layer, TEXT_PRI);
        layer.use_text(
            truncate(&app.app.app_name, NAME_TRUNC),
            9.0,
            Mm(MARGIN + 4.0),
            Mm(y),
            &font_b,
        );
        set_color(&layer, TEXT_SEC);
        layer.use_text(
            format!("{:.0} / 100", app.risk_score),
            9.0,
            Mm(PAGE_W - MARGIN - 52.0),
            Mm(y),
            &font_r,
        );
        draw_level_badge(&layer, PAGE_W - MARGIN - BADGE_W - 3.0, y - 1.6, app.risk_level, &font_b);

        y -= 12.5;
        if y < MARGIN + 10.0 {
            break;
        }
    }

    Ok(())
}

// ── Ranked table pages ────────────────────────────────────────────────────────

fn add_table_pages(doc: &PdfDocumentReference, collection: &AppCollection) -> Result<()> {
    let font_b = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_r = doc.add_builtin_font(BuiltinFont::Helvetica)?;

    let ranked = collection.ranked();
    let mut remaining: &[&ScoredApp] = &ranked;
    let mut page_no = 1;

    while !remaining.is_empty() {
        let (page_idx, layer_idx) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Apps {}", page_no));
        let layer = doc.get_page(page_idx).get_layer(layer_idx);

        fill_rect(&layer, 0.0, 0.0, PAGE_W, PAGE_H, BG);
        set_color(&layer, TEXT_PRI);
        layer.use_text("Ranked Applications", 14.0, Mm(MARGIN), Mm(PAGE_H - MARGIN), &font_b);
        draw_hline(&layer, MARGIN, PAGE_W - MARGIN, PAGE_H - MARGIN - 4.0, PANEL_BORDER);

        let mut y = PAGE_H - MARGIN - 14.0;
        let mut drawn = 0;

        for app in remaining {
            // Reasons are spelled out for apps that need attention; low-risk
            // rows stay compact.
            let reason_lines: Vec<String> = if app.risk_level == RiskLevel::Low {
                Vec::new()
            } else {
                let mut lines = Vec::new();
                for reason in &app.risk_reasons {
                    lines.extend(wrap_text(reason, REASON_WRAP));
                    if lines.len() >= REASON_MAX_LINES {
                        lines.truncate(REASON_MAX_LINES);
                        break;
                    }
                }
                lines
            };

            let row_h = 12.0 + reason_lines.len() as f32 * 4.2;
            if y - row_h < MARGIN {
                break;
            }

            set_color(&layer, TEXT_PRI);
            layer.use_text(
                truncate(&app.app.app_name, NAME_TRUNC),
                10.0,
                Mm(MARGIN),
                Mm(y),
                &font_b,
            );
            set_color(&layer, TEXT_MUT);
            layer.use_text(
                truncate(&app.app.package_name, 46),
                7.0,
                Mm(MARGIN),
                Mm(y - 4.0),
                &font_r,
            );

            set_color(&layer, TEXT_SEC);
            layer.use_text(
                format!("{:.0}", app.risk_score),
                11.0,
                Mm(PAGE_W - MARGIN - BADGE_W - 14.0),
                Mm(y - 1.0),
                &font_b,
            );
            draw_level_badge(&layer, PAGE_W - MARGIN - BADGE_W, y - 2.0, app.risk_level, &font_b);

            let mut reason_y = y - 8.6;
            set_color(&layer, TEXT_SEC);
            for line in &reason_lines {
                layer.use_text(line.as_str(), 7.0, Mm(MARGIN + 3.0), Mm(reason_y), &font_r);
                reason_y -= 4.2;
            }

            y -= row_h;
            draw_hline(&layer, MARGIN, PAGE_W - MARGIN, y + 2.0, PANEL_BORDER);
            drawn += 1;
        }

        // Always make progress, even if a single row would not fit.
        let advance = drawn.max(1);
        remaining = &remaining[advance.min(remaining.len())..];
        page_no += 1;
    }

    Ok(())
}

// ── Drawing helpers ───────────────────────────────────────────────────────────

fn level_style(level: RiskLevel) -> (&'static str, (f32, f32, f32), (f32, f32, f32)) {
    match level {
        RiskLevel::High => ("HIGH", HIGH_BG, HIGH_FG),
        RiskLevel::Medium => ("MEDIUM", MED_BG, MED_FG),
        RiskLevel::Low => ("LOW", LOW_BG, LOW_FG),
    }
}

fn draw_level_badge(layer: &PdfLayerReference, x: f32, y: f32, level: RiskLevel, font_b: &IndirectFontRef) {
    let (label, bg, fg) = level_style(level);
    fill_rounded_rect(layer, x, y, BADGE_W, BADGE_H, R_BADGE, bg);
    set_color(layer, fg);
    let text_x = x + (BADGE_W - label.len() as f32 * 1.55) / 2.0;
    layer.use_text(label, 6.5, Mm(text_x), Mm(y + 1.8), font_b);
}

#[allow(clippy::too_many_arguments)]
fn draw_stat_card(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    label: &str,
    value: &str,
    accent: (f32, f32, f32),
    font_r: &IndirectFontRef,
    font_b: &IndirectFontRef,
) {
    fill_rounded_rect(layer, x, y, w, h, R_PANEL, PANEL);
    stroke_rounded_rect(layer, x, y, w, h, R_PANEL, PANEL_BORDER);
    fill_rect(layer, x, y + h - 2.0, w, 2.0, accent);

    set_color(layer, accent);
    layer.use_text(value, 20.0, Mm(x + 5.0), Mm(y + h * 0.38), font_b);
    set_color(layer, TEXT_MUT);
    layer.use_text(label, 6.5, Mm(x + 5.0), Mm(y + 3.2), font_r);
}

fn set_color(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb { r, g, b, icc_profile: None }));
}

fn fill_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32, (r, g, b): (f32, f32, f32)) {
    layer.set_fill_color(Color::Rgb(Rgb { r, g, b, icc_profile: None }));
    layer.add_polygon(Polygon {
        rings: vec![vec![
            (Point::new(Mm(x), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y)), false),
            (Point::new(Mm(x + w), Mm(y + h)), false),
            (Point::new(Mm(x), Mm(y + h)), false),
        ]],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_fill_color(Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None }));
}

/// Clockwise ring approximating a rounded rectangle, 8 segments per corner.
fn rounded_rect_ring(x: f32, y: f32, w: f32, h: f32, r: f32) -> Vec<(Point, bool)> {
    let r = r.min(w / 2.0).min(h / 2.0);
    let corners = [
        (x + w - r, y + h - r, 0.0f32),
        (x + w - r, y + r, 270.0f32),
        (x + r, y + r, 180.0f32),
        (x + r, y + h - r, 90.0f32),
    ];
    let mut ring = Vec::with_capacity(36);
    for (cx, cy, start_deg) in corners {
        for step in 0..=8 {
            let angle = (start_deg + step as f32 * 90.0 / 8.0).to_radians();
            ring.push((
                Point::new(Mm(cx + r * angle.cos()), Mm(cy + r * angle.sin())),
                false,
            ));
        }
    }
    ring
}

fn fill_rounded_rect(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    r: f32,
    (cr, cg, cb): (f32, f32, f32),
) {
    layer.set_fill_color(Color::Rgb(Rgb { r: cr, g: cg, b: cb, icc_profile: None }));
    layer.add_polygon(Polygon {
        rings: vec![rounded_rect_ring(x, y, w, h, r)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_fill_color(Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None }));
}

fn stroke_rounded_rect(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    r: f32,
    (cr, cg, cb): (f32, f32, f32),
) {
    layer.set_outline_color(Color::Rgb(Rgb { r: cr, g: cg, b: cb, icc_profile: None }));
    layer.set_outline_thickness(0.4);
    layer.add_polygon(Polygon {
        rings: vec![rounded_rect_ring(x, y, w, h, r)],
        mode: PaintMode::Stroke,
        winding_order: WindingOrder::NonZero,
    });
    layer.set_outline_color(Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None }));
    layer.set_outline_thickness(1.0);
}

fn draw_hline(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, (r, g, b): (f32, f32, f32)) {
    layer.set_outline_color(Color::Rgb(Rgb { r, g, b, icc_profile: None }));
    layer.set_outline_thickness(0.3);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    });
    layer.set_outline_color(Color::Rgb(Rgb { r: 0.0, g: 0.0, b: 0.0, icc_profile: None }));
    layer.set_outline_thickness(1.0);
}

/// Left-to-right gradient fill drawn as overlapping vertical strips.
#[allow(clippy::too_many_arguments)]
fn fill_gradient_h(
    layer: &PdfLayerReference,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    from: (f32, f32, f32),
    to: (f32, f32, f32),
    steps: usize,
) {
    let step_w = w / steps as f32;
    for i in 0..steps {
        let t = i as f32 / (steps - 1).max(1) as f32;
        let color = (
            from.0 + (to.0 - from.0) * t,
            from.1 + (to.1 - from.1) * t,
            from.2 + (to.2 - from.2) * t,
        );
        fill_rect(layer, x + i as f32 * step_w, y, step_w + 0.6, h, color);
    }
}

fn truncate(s: &str, max: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() > max {
        format!("{}…", chars[..max - 1].iter().collect::<String>())
    } else {
        s.to_string()
    }
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.len() <= max_chars {
        return vec![text.to_string()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() > max_chars {
            lines.push(current.clone());
            current = word.to_string();
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Approximate UTC date stamp without a date-time dependency.
fn scan_date() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let days = secs / 86400;
    let year = 1970 + days / 365;
    let doy = days % 365;
    let month = (doy / 30) + 1;
    let day = (doy % 30) + 1;
    format!("{:04}-{:02}-{:02}", year, month.min(12), day.min(31))
}
