//! Winding normalization: exterior rings counterclockwise, holes clockwise.

use super::{Feature, FeatureCollection, Geometry, Position};

pub fn rewind(collection: &mut FeatureCollection) {
    for feature in &mut collection.features {
        rewind_feature(feature);
    }
}

pub fn rewind_feature(feature: &mut Feature) {
    match &mut feature.geometry {
        Geometry::Polygon(rings) => rewind_rings(rings),
        Geometry::MultiPolygon(polygons) => {
            for rings in polygons {
                rewind_rings(rings);
            }
        }
        _ => {}
    }
}

fn rewind_rings(rings: &mut [Vec<Position>]) {
    for (index, ring) in rings.iter_mut().enumerate() {
        rewind_ring(ring, index == 0);
    }
}

/// Reverses the ring in place when its orientation disagrees with
/// `counterclockwise`. The signed area uses a Neumaier-compensated sum so
/// near-degenerate rings at real-world coordinates orient deterministically.
fn rewind_ring(ring: &mut Vec<Position>, counterclockwise: bool) {
    let mut area = 0.0f64;
    let mut err = 0.0f64;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        if i > 0 {
            j = i - 1;
        }
        let k = (ring[i][0] - ring[j][0]) * (ring[j][1] + ring[i][1]);
        let m = area + k;
        err += if area.abs() >= k.abs() {
            area - m + k
        } else {
            k - m + area
        };
        area = m;
    }
    // area + err >= 0 means clockwise in this formulation
    if (area + err >= 0.0) != !counterclockwise {
        ring.reverse();
    }
}

#[cfg(test)]
fn square_cw() -> Vec<Position> {
    vec![[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]]
}

#[cfg(test)]
fn square_ccw() -> Vec<Position> {
    vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
}

#[test]
fn exterior_rings_become_counterclockwise() {
    let mut rings = vec![square_cw()];
    rewind_rings(&mut rings);
    assert_eq!(rings[0], square_ccw());
}

#[test]
fn holes_become_clockwise() {
    let mut rings = vec![square_ccw(), square_ccw()];
    rewind_rings(&mut rings);
    assert_eq!(rings[0], square_ccw());
    assert_eq!(rings[1], square_cw());
}

#[test]
fn rewind_is_idempotent() {
    let mut rings = vec![square_cw(), square_cw()];
    rewind_rings(&mut rings);
    let once = rings.clone();
    rewind_rings(&mut rings);
    assert_eq!(rings, once);
}

#[test]
fn multipolygons_rewind_every_polygon() {
    use serde_json::Map;

    let mut feature = Feature::new(
        "relation/1".to_string(),
        Map::new(),
        Geometry::MultiPolygon(vec![vec![square_cw()], vec![square_cw(), square_ccw()]]),
    );
    rewind_feature(&mut feature);
    match &feature.geometry {
        Geometry::MultiPolygon(polygons) => {
            assert_eq!(polygons[0][0], square_ccw());
            assert_eq!(polygons[1][0], square_ccw());
            assert_eq!(polygons[1][1], square_cw());
        }
        other => panic!("unexpected geometry: {:?}", other),
    }
}
