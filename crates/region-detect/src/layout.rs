//! Named region layout consumed by the count source

use std::collections::BTreeMap;

use crate::polygon::{Point, RegionPolygon};
use crate::DetectionError;

/// The detector's declared region set: region name -> detection polygon.
///
/// Configured once at startup, immutable afterwards.
#[derive(Debug, Clone)]
pub struct RegionLayout {
    regions: BTreeMap<String, RegionPolygon>,
}

impl RegionLayout {
    /// Build a layout from named polygons.
    ///
    /// Fails on an empty set or a duplicated region name.
    pub fn new(regions: Vec<(String, RegionPolygon)>) -> Result<Self, DetectionError> {
        if regions.is_empty() {
            return Err(DetectionError::Layout("no regions defined".into()));
        }
        let mut map = BTreeMap::new();
        for (name, polygon) in regions {
            if map.insert(name.clone(), polygon).is_some() {
                return Err(DetectionError::Layout(format!(
                    "duplicate region name: {name}"
                )));
            }
        }
        Ok(Self { regions: map })
    }

    /// Region names declared by the detector
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(|k| k.as_str())
    }

    pub fn polygon(&self, name: &str) -> Option<&RegionPolygon> {
        self.regions.get(name)
    }

    /// Which region contains the given frame point, if any.
    ///
    /// Polygons are not expected to overlap; the first match wins.
    pub fn locate(&self, point: Point) -> Option<&str> {
        self.regions
            .iter()
            .find(|(_, poly)| poly.contains(point))
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Point;

    fn square(origin: i32) -> RegionPolygon {
        RegionPolygon::new(vec![
            Point::new(origin, 0),
            Point::new(origin + 10, 0),
            Point::new(origin + 10, 10),
            Point::new(origin, 10),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = RegionLayout::new(vec![
            ("Region-1".into(), square(0)),
            ("Region-1".into(), square(20)),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(RegionLayout::new(vec![]).is_err());
    }

    #[test]
    fn test_locate() {
        let layout = RegionLayout::new(vec![
            ("Region-1".into(), square(0)),
            ("Region-2".into(), square(20)),
        ])
        .unwrap();

        assert_eq!(layout.locate(Point::new(5, 5)), Some("Region-1"));
        assert_eq!(layout.locate(Point::new(25, 5)), Some("Region-2"));
        assert_eq!(layout.locate(Point::new(15, 5)), None);
    }
}
