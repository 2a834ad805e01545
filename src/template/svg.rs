use std::f64::consts::{FRAC_PI_2, TAU};

use kurbo::Shape;

use crate::foundation::core::{Affine, BezPath, Point, ViewBox};
use crate::foundation::error::{CollageError, CollageResult};
use crate::template::Slot;

/// Polygons with more vertices than this are center candidates.
pub const CENTER_MIN_VERTICES: usize = 15;

/// Axis-aligned bounds in template units.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// One `<polygon>` of a hexagon-family template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSlot {
    pub id: String,
    /// Closed path of the polygon in its own coordinates: `M x0 y0 L x1 y1 ... Z`.
    pub path_data: String,
    /// Composed transform of the polygon and its ancestors as `matrix(a b c d e f)`; omitted
    /// when it is the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<String>,
    pub is_center: bool,
    /// Bounds in template coordinates (transform applied).
    pub bounding_box: BoundingBox,
    /// Vertex mean in template coordinates (transform applied).
    pub centroid: Point,
    pub vertex_count: usize,
    /// Vertices in template coordinates.
    #[serde(skip)]
    points: Vec<Point>,
}

impl ParsedSlot {
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn to_slot(&self) -> CollageResult<Slot> {
        if self.points.len() < 3 {
            return Err(CollageError::svg_parse(format!(
                "slot '{}' carries no vertices",
                self.id
            )));
        }
        let path = polygon_path(&self.points);
        Ok(Slot {
            id: self.id.clone(),
            bbox: path.bounding_box(),
            path,
            is_center: self.is_center,
        })
    }
}

/// Slots of one template ordered `[center, ...border clockwise from top]`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTemplate {
    pub view_box: ViewBox,
    pub slots: Vec<ParsedSlot>,
}

impl ExtractedTemplate {
    pub fn center(&self) -> &ParsedSlot {
        &self.slots[0]
    }

    pub fn border(&self) -> &[ParsedSlot] {
        &self.slots[1..]
    }

    pub fn to_slots(&self) -> CollageResult<Vec<Slot>> {
        self.slots.iter().map(ParsedSlot::to_slot).collect()
    }
}

/// Parse template SVG text into classified, ordered slots.
#[tracing::instrument(level = "debug", skip(svg))]
pub fn extract_svg(svg: &str) -> CollageResult<ExtractedTemplate> {
    let doc = roxmltree::Document::parse(svg)
        .map_err(|e| CollageError::svg_parse(format!("invalid svg document: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "svg" {
        return Err(CollageError::svg_parse(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let view_box = match root.attribute("viewBox") {
        Some(raw) => ViewBox::parse(raw).unwrap_or_else(|| {
            tracing::warn!(view_box = raw, "unreadable viewBox, using fallback");
            ViewBox::FALLBACK
        }),
        None => ViewBox::FALLBACK,
    };

    let mut polygons = Vec::new();
    for (i, node) in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "polygon")
        .enumerate()
    {
        let id = node
            .attribute("id")
            .map(str::to_string)
            .unwrap_or_else(|| format!("polygon-{i}"));
        let raw = node.attribute("points").unwrap_or("");
        let local = parse_points(raw)
            .ok_or_else(|| CollageError::svg_parse(format!("polygon '{id}' has invalid points")))?;
        if local.len() < 3 {
            return Err(CollageError::svg_parse(format!(
                "polygon '{id}' needs at least 3 vertices, has {}",
                local.len()
            )));
        }
        let affine = absolute_transform(node)?;
        polygons.push(parsed_slot(id, &local, affine));
    }

    if polygons.is_empty() {
        return Err(CollageError::svg_parse("template contains no polygons"));
    }

    let slots = classify_and_order(polygons, view_box)?;
    Ok(ExtractedTemplate { view_box, slots })
}

fn parsed_slot(id: String, local: &[Point], affine: Affine) -> ParsedSlot {
    let points: Vec<Point> = local.iter().map(|p| affine * *p).collect();
    let transform = (affine != Affine::IDENTITY).then(|| {
        let [a, b, c, d, e, f] = affine.as_coeffs();
        format!("matrix({a} {b} {c} {d} {e} {f})")
    });
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    ParsedSlot {
        id,
        path_data: path_data(local),
        transform,
        is_center: false,
        bounding_box: BoundingBox {
            x: min_x,
            y: min_y,
            w: max_x - min_x,
            h: max_y - min_y,
        },
        centroid: Point::new(sx / n, sy / n),
        vertex_count: points.len(),
        points,
    }
}

/// Split polygons into the center shape and clockwise-ordered border shapes.
///
/// The center is the polygon with the most vertices, provided it has more than
/// [`CENTER_MIN_VERTICES`]. When several polygons tie, the first in document order wins and the
/// rest are treated as border slots.
pub fn classify_and_order(
    mut polygons: Vec<ParsedSlot>,
    view_box: ViewBox,
) -> CollageResult<Vec<ParsedSlot>> {
    let max_verts = polygons.iter().map(|p| p.vertex_count).max().unwrap_or(0);
    let candidates: Vec<usize> = polygons
        .iter()
        .enumerate()
        .filter(|(_, p)| p.vertex_count == max_verts && p.vertex_count > CENTER_MIN_VERTICES)
        .map(|(i, _)| i)
        .collect();

    let Some(&center_i) = candidates.first() else {
        return Err(CollageError::svg_parse(format!(
            "no center polygon: largest polygon has {max_verts} vertices, need more than {CENTER_MIN_VERTICES}"
        )));
    };
    if candidates.len() > 1 {
        tracing::warn!(
            candidates = candidates.len(),
            "several center candidates, keeping the first"
        );
    }

    let mut center = polygons.remove(center_i);
    center.is_center = true;
    for p in &mut polygons {
        p.is_center = false;
    }

    let origin = view_box.center();
    polygons.sort_by(|a, b| {
        clockwise_angle(a.centroid, origin).total_cmp(&clockwise_angle(b.centroid, origin))
    });

    let mut out = Vec::with_capacity(polygons.len() + 1);
    out.push(center);
    out.extend(polygons);
    Ok(out)
}

/// Angle of `p` around `origin` in `[0, 2π)`: 0 points up, increasing clockwise (y down).
pub fn clockwise_angle(p: Point, origin: Point) -> f64 {
    let angle = (p.y - origin.y).atan2(p.x - origin.x);
    ((angle + FRAC_PI_2) + TAU) % TAU
}

fn parse_points(raw: &str) -> Option<Vec<Point>> {
    let nums = svgtypes::NumberListParser::from(raw)
        .map(|n| n.ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<f64>>>()?;
    if nums.len() % 2 != 0 {
        return None;
    }
    Some(
        nums.chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect(),
    )
}

fn path_data(points: &[Point]) -> String {
    let mut out = String::new();
    for (i, p) in points.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        out.push_str(&format!("{cmd} {} {}", p.x, p.y));
    }
    out.push_str(" Z");
    out
}

fn polygon_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
        path.close_path();
    }
    path
}

/// Parse one `transform` attribute value into an affine.
pub fn parse_transform(raw: &str) -> CollageResult<Affine> {
    let ts: svgtypes::Transform = raw
        .parse()
        .map_err(|e| CollageError::svg_parse(format!("invalid transform '{raw}': {e}")))?;
    Ok(Affine::new([ts.a, ts.b, ts.c, ts.d, ts.e, ts.f]))
}

/// Product of every `transform` from the document root down to `node`.
fn absolute_transform(node: roxmltree::Node<'_, '_>) -> CollageResult<Affine> {
    let mut out = Affine::IDENTITY;
    for n in node.ancestors().filter(|n| n.is_element()) {
        if let Some(raw) = n.attribute("transform") {
            out = parse_transform(raw)? * out;
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/template/svg.rs"]
mod tests;
