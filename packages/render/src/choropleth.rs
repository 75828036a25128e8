//! Choropleth rendering of joined rows to SVG.

use std::ops::Range;
use std::path::Path;

use geo::{BoundingRect, Polygon as GeoPolygon, Rect};
use malaria_choco_cases_models::MapField;
use malaria_choco_geography_models::EnrichedRecord;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::RenderError;
use crate::scale::ColorScale;

/// Layout and styling of a rendered map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapStyle {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Width reserved on the right for the colour bar.
    pub legend_width: u32,
    /// Fill for polygons with no value.
    pub missing_color: RGBColor,
    /// Polygon outline width in pixels.
    pub outline_width: u32,
    /// Font family for the title and labels.
    pub font_family: String,
    /// Title font size.
    pub title_size: u32,
    /// Legend label font size.
    pub label_size: u32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 900,
            legend_width: 140,
            missing_color: RGBColor(200, 200, 200),
            outline_width: 1,
            font_family: "sans-serif".to_owned(),
            title_size: 26,
            label_size: 16,
        }
    }
}

const LEGEND_STEPS: u32 = 64;

fn drawing(err: impl std::fmt::Display) -> RenderError {
    RenderError::Drawing {
        message: err.to_string(),
    }
}

/// Minimum and maximum of the finite values of `field` across `rows`.
#[must_use]
pub fn value_range(rows: &[EnrichedRecord<'_>], field: MapField) -> Option<(f64, f64)> {
    rows.iter()
        .filter_map(|r| r.value(field))
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        })
}

/// Position of `value` within `[lo, hi]`; a flat range maps to the middle.
#[must_use]
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Map title: the field and the observation month of the rows.
#[must_use]
pub fn map_title(rows: &[EnrichedRecord<'_>], field: MapField) -> String {
    rows.iter().find_map(EnrichedRecord::date).map_or_else(
        || field.to_string(),
        |date| format!("{field} — {}", date.format("%Y-%m-%d")),
    )
}

/// Renders `field` over `rows` as an SVG document.
///
/// # Errors
///
/// Returns [`RenderError::EmptySelection`] if `rows` is empty, or
/// [`RenderError::Drawing`] if the backend fails.
pub fn render_choropleth(
    rows: &[EnrichedRecord<'_>],
    field: MapField,
    scale: ColorScale,
    style: &MapStyle,
) -> Result<String, RenderError> {
    if rows.is_empty() {
        return Err(RenderError::EmptySelection {
            field: field.to_string(),
        });
    }

    let range = value_range(rows, field);
    let missing = rows.iter().filter(|r| r.value(field).is_none()).count();
    if missing > 0 {
        log::debug!("{field}: {missing} of {} polygons have no value", rows.len());
    }

    let mut svg = String::new();
    {
        let root =
            SVGBackend::with_string(&mut svg, (style.width, style.height)).into_drawing_area();
        root.fill(&WHITE).map_err(drawing)?;

        let body = root
            .titled(
                &map_title(rows, field),
                (style.font_family.as_str(), style.title_size).into_font(),
            )
            .map_err(drawing)?;
        let (body_width, _) = body.dim_in_pixel();
        let (map_area, legend_area) =
            body.split_horizontally(body_width.saturating_sub(style.legend_width));

        draw_polygons(&map_area, rows, field, scale, range, style)?;
        draw_legend(&legend_area, scale, range, style)?;

        root.present().map_err(drawing)?;
    }

    Ok(svg)
}

/// Renders `field` over `rows` and writes the SVG to `path`.
///
/// # Errors
///
/// Returns [`RenderError`] if rendering or the file write fails.
pub fn render_to_file(
    path: impl AsRef<Path>,
    rows: &[EnrichedRecord<'_>],
    field: MapField,
    scale: ColorScale,
    style: &MapStyle,
) -> Result<(), RenderError> {
    let path = path.as_ref();
    let svg = render_choropleth(rows, field, scale, style)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, svg)?;

    log::info!("Rendered {field} ({scale}) to {}", path.display());
    Ok(())
}

fn bounds(rows: &[EnrichedRecord<'_>]) -> Option<Rect<f64>> {
    rows.iter()
        .filter_map(|r| r.polygon.geometry.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
}

/// Pads the shorter side of `rect` so one unit is the same number of pixels
/// on both axes.
fn fit_aspect(rect: Rect<f64>, (width, height): (u32, u32)) -> (Range<f64>, Range<f64>) {
    let (mut w, mut h) = (rect.width(), rect.height());
    if w <= 0.0 {
        w = 1e-6;
    }
    if h <= 0.0 {
        h = 1e-6;
    }

    let pixel_aspect = f64::from(width.max(1)) / f64::from(height.max(1));
    if w / h < pixel_aspect {
        w = h * pixel_aspect;
    } else {
        h = w / pixel_aspect;
    }

    let center = rect.center();
    (
        (center.x - w / 2.0)..(center.x + w / 2.0),
        (center.y - h / 2.0)..(center.y + h / 2.0),
    )
}

fn ring(line: &geo::LineString<f64>) -> Vec<(f64, f64)> {
    line.coords().map(|c| (c.x, c.y)).collect()
}

fn draw_polygons<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rows: &[EnrichedRecord<'_>],
    field: MapField,
    scale: ColorScale,
    range: Option<(f64, f64)>,
    style: &MapStyle,
) -> Result<(), RenderError> {
    let Some(rect) = bounds(rows) else {
        log::warn!("No drawable geometry for {field}");
        return Ok(());
    };

    let (x_range, y_range) = fit_aspect(rect, area.dim_in_pixel());
    let mut chart = ChartBuilder::on(area)
        .margin(20)
        .build_cartesian_2d(x_range, y_range)
        .map_err(drawing)?;

    let fills = rows.iter().flat_map(|row| {
        let color = match (row.value(field), range) {
            (Some(v), Some((lo, hi))) if v.is_finite() => scale.color_at(normalize(v, lo, hi)),
            _ => style.missing_color,
        };
        row.polygon
            .geometry
            .iter()
            .map(move |p: &GeoPolygon<f64>| Polygon::new(ring(p.exterior()), color.filled()))
    });
    chart.draw_series(fills).map_err(drawing)?;

    let holes = rows
        .iter()
        .flat_map(|row| row.polygon.geometry.iter())
        .flat_map(GeoPolygon::interiors)
        .map(|hole| Polygon::new(ring(hole), WHITE.filled()));
    chart.draw_series(holes).map_err(drawing)?;

    let outlines = rows
        .iter()
        .flat_map(|row| row.polygon.geometry.iter())
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .map(|line| PathElement::new(ring(line), BLACK.stroke_width(style.outline_width)));
    chart.draw_series(outlines).map_err(drawing)?;

    Ok(())
}

fn label(value: f64) -> String {
    if value.abs() >= 100.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn draw_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scale: ColorScale,
    range: Option<(f64, f64)>,
    style: &MapStyle,
) -> Result<(), RenderError> {
    let (_, height) = area.dim_in_pixel();
    let font = (style.font_family.as_str(), style.label_size).into_font();
    let top = (f64::from(height) * 0.15) as i32;
    let bottom = (f64::from(height) * 0.85) as i32;
    let (left, right) = (20, 50);

    let Some((lo, hi)) = range else {
        area.draw(&Text::new("no data", (left, top), font))
            .map_err(drawing)?;
        return Ok(());
    };

    let span = f64::from(bottom - top);
    for step in 0..LEGEND_STEPS {
        let y0 = top + (span * f64::from(step) / f64::from(LEGEND_STEPS)) as i32;
        let y1 = top + (span * f64::from(step + 1) / f64::from(LEGEND_STEPS)) as i32;
        let t = 1.0 - (f64::from(step) + 0.5) / f64::from(LEGEND_STEPS);
        area.draw(&Rectangle::new(
            [(left, y0), (right, y1)],
            scale.color_at(t).filled(),
        ))
        .map_err(drawing)?;
    }
    area.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.stroke_width(1)))
        .map_err(drawing)?;

    let label_size = style.label_size as i32;
    area.draw(&Text::new(label(hi), (right + 8, top), font.clone()))
        .map_err(drawing)?;
    area.draw(&Text::new(label(lo), (right + 8, bottom - label_size), font))
        .map_err(drawing)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use geo::{MultiPolygon, polygon};
    use malaria_choco_cases_models::{
        CaseRecord, Covariate, Covariates, MunicipalityCode, RawMunicipalityCode,
    };
    use malaria_choco_geography_models::{MunicipalPolygon, Properties};

    use super::*;

    fn municipality(code: i64, x: f64) -> MunicipalPolygon {
        MunicipalPolygon {
            code: RawMunicipalityCode::Integer(code),
            geometry: MultiPolygon(vec![polygon![
                (x: x, y: 5.0),
                (x: x + 0.5, y: 5.0),
                (x: x + 0.5, y: 5.5),
                (x: x, y: 5.5),
            ]]),
            properties: Properties::new(),
        }
    }

    fn case(code: i64, cases: Option<f64>) -> CaseRecord {
        CaseRecord {
            row: 0,
            municipality: MunicipalityCode(code),
            date: NaiveDate::from_ymd_opt(2018, 7, 1).unwrap(),
            disease: "MALARIA FALCIPARUM".to_owned(),
            cases,
            covariates: Covariates::default().with(Covariate::ElevationMean, Some(43.0)),
            extra: BTreeMap::new(),
        }
    }

    fn row<'a>(
        code: i64,
        polygon: &'a MunicipalPolygon,
        case: Option<&'a CaseRecord>,
    ) -> EnrichedRecord<'a> {
        EnrichedRecord {
            municipality: MunicipalityCode(code),
            polygon,
            case,
        }
    }

    #[test]
    fn value_range_ignores_missing() {
        let (p1, p2, p3) = (municipality(1, 0.0), municipality(2, 1.0), municipality(3, 2.0));
        let (c1, c2) = (case(1, Some(4.0)), case(2, Some(40.0)));
        let rows = [
            row(1, &p1, Some(&c1)),
            row(2, &p2, Some(&c2)),
            row(3, &p3, None),
        ];
        assert_eq!(value_range(&rows, MapField::Cases), Some((4.0, 40.0)));
        assert_eq!(value_range(&rows[2..], MapField::Cases), None);
    }

    #[test]
    fn normalize_handles_flat_range() {
        assert!((normalize(5.0, 0.0, 10.0) - 0.5).abs() < 1e-12);
        assert!((normalize(5.0, 5.0, 5.0) - 0.5).abs() < 1e-12);
        assert!((normalize(-1.0, 0.0, 10.0)).abs() < 1e-12);
    }

    #[test]
    fn title_names_field_and_month() {
        let p = municipality(1, 0.0);
        let c = case(1, Some(4.0));
        let rows = [row(1, &p, Some(&c))];
        assert_eq!(map_title(&rows, MapField::Cases), "CASES — 2018-07-01");
    }

    #[test]
    fn empty_selection_is_an_error() {
        let err = render_choropleth(&[], MapField::Cases, ColorScale::Reds, &MapStyle::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptySelection { .. }));
    }

    #[test]
    fn renders_every_polygon() {
        let (p1, p2, p3) = (municipality(1, 0.0), municipality(2, 1.0), municipality(3, 2.0));
        let (c1, c2) = (case(1, Some(4.0)), case(2, None));
        let rows = [
            row(1, &p1, Some(&c1)),
            row(2, &p2, Some(&c2)),
            row(3, &p3, None),
        ];

        let svg = render_choropleth(&rows, MapField::Cases, ColorScale::Reds, &MapStyle::default())
            .unwrap();

        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.matches("<polygon").count() >= rows.len());
        assert!(svg.contains("CASES"));
    }

    #[test]
    fn writes_svg_file() {
        let p = municipality(1, 0.0);
        let c = case(1, Some(4.0));
        let rows = [row(1, &p, Some(&c))];

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("maps").join("MUN_ELV_MEAN_2018-07-01.svg");
        render_to_file(
            &path,
            &rows,
            MapField::Covariate(Covariate::ElevationMean),
            ColorScale::Terrain,
            &MapStyle::default(),
        )
        .unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }
}
