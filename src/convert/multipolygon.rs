//! Inner/outer ring pairing for multipolygons.

/// `(lat, lon)` pair; containment tests run on raw coordinates.
pub(crate) type LatLon = [f64; 2];

/// Even-odd rule ray casting. Points on the boundary may land on either
/// side, which is fine for ring pairing.
pub(crate) fn point_in_polygon(point: LatLon, polygon: &[LatLon]) -> bool {
    let mut inside = false;
    if polygon.is_empty() {
        return inside;
    }
    let (x, y) = (point[0], point[1]);
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (xi, yi) = (polygon[i][0], polygon[i][1]);
        let (xj, yj) = (polygon[j][0], polygon[j][1]);
        if ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi) {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Index of the first ring cluster whose outer ring contains a vertex of
/// `inner`. Ring clusters are `[outer, hole, hole, ..]`.
pub(crate) fn find_outer(clusters: &[Vec<Vec<LatLon>>], inner: &[LatLon]) -> Option<usize> {
    clusters.iter().position(|cluster| {
        cluster
            .first()
            .map_or(false, |outer| {
                inner.iter().any(|point| point_in_polygon(*point, outer))
            })
    })
}

#[cfg(test)]
fn square(origin: f64, size: f64) -> Vec<LatLon> {
    vec![
        [origin, origin],
        [origin, origin + size],
        [origin + size, origin + size],
        [origin + size, origin],
        [origin, origin],
    ]
}

#[test]
fn point_in_polygon_follows_the_even_odd_rule() {
    let ring = square(0.0, 4.0);
    assert!(point_in_polygon([2.0, 2.0], &ring));
    assert!(!point_in_polygon([5.0, 2.0], &ring));
    assert!(!point_in_polygon([-1.0, -1.0], &ring));
}

#[test]
fn find_outer_picks_the_containing_cluster() {
    let clusters = vec![vec![square(0.0, 4.0)], vec![square(10.0, 4.0)]];
    assert_eq!(find_outer(&clusters, &square(11.0, 1.0)), Some(1));
    assert_eq!(find_outer(&clusters, &square(1.0, 1.0)), Some(0));
    assert_eq!(find_outer(&clusters, &square(20.0, 1.0)), None);
}
