//! Marker family tables.

use crate::descriptor::parse_descriptor;
use crate::{ConfigError, MarkerFamily, MarkerModel, StateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unit system of model coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    Pixels,
    Meters,
    Normalized,
}

impl Units {
    pub fn code(self) -> i32 {
        match self {
            Units::Pixels => 0,
            Units::Meters => 1,
            Units::Normalized => 2,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Units::Pixels),
            1 => Some(Units::Meters),
            2 => Some(Units::Normalized),
            _ => None,
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Units::Pixels => "pixel",
            Units::Meters => "meter",
            Units::Normalized => "normalized",
        })
    }
}

/// All markers of one family, keyed by id.
///
/// Built in two passes: every model is loaded first, then sub-marker masks
/// and keypoints are derived by looking children up by id.
#[derive(Clone, Debug)]
pub struct MarkerModelSet {
    family: Option<MarkerFamily>,
    units: Units,
    root_id: i32,
    models: BTreeMap<i32, MarkerModel>,
    bit_count_index: BTreeMap<usize, Vec<i32>>,
}

impl MarkerModelSet {
    /// Load one of the embedded families.
    pub fn from_family(family: MarkerFamily) -> Result<Self, ConfigError> {
        let mut set = Self::from_descriptor(family.descriptor())?;
        set.family = Some(family);
        Ok(set)
    }

    /// Load a family by name, e.g. `"FRACTAL_4L_6"`.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::from_family(name.parse()?)
    }

    /// Build a set from raw descriptor bytes.
    pub fn from_descriptor(bytes: &[u8]) -> Result<Self, ConfigError> {
        let desc = parse_descriptor(bytes)?;

        let mut models = BTreeMap::new();
        for rec in desc.markers {
            let model = MarkerModel::new(rec.id, rec.n, rec.bits, rec.corners, rec.sub_marker_ids);
            if model.side_length() <= 0.0 || !model.side_length().is_finite() {
                return Err(ConfigError::DegenerateMarker(rec.id));
            }
            if models.insert(rec.id, model).is_some() {
                return Err(ConfigError::DuplicateId(rec.id));
            }
        }
        if !models.contains_key(&desc.root_id) {
            return Err(ConfigError::UnknownRoot(desc.root_id));
        }

        let ids: Vec<i32> = models.keys().copied().collect();
        for &id in &ids {
            let mut regions = Vec::new();
            {
                let parent = &models[&id];
                for &child in parent.sub_marker_ids() {
                    let sub = models
                        .get(&child)
                        .ok_or(ConfigError::UnknownSubMarker { parent: id, child })?;
                    let region = parent
                        .sub_region(sub)
                        .ok_or(ConfigError::SubMarkerOutOfBounds { parent: id, child })?;
                    regions.push((child, region));
                }
            }
            if let Some(parent) = models.get_mut(&id) {
                for (child, region) in regions {
                    if !parent.mask_region(region) {
                        return Err(ConfigError::OverlappingSubMarkers { parent: id, child });
                    }
                }
                parent.derive_keypoints();
            }
        }

        let mut bit_count_index: BTreeMap<usize, Vec<i32>> = BTreeMap::new();
        for (&id, m) in &models {
            bit_count_index.entry(m.bit_count()).or_default().push(id);
        }

        log::debug!(
            "marker set: {} models, root {}, units {}",
            models.len(),
            desc.root_id,
            desc.units
        );

        Ok(Self {
            family: None,
            units: desc.units,
            root_id: desc.root_id,
            models,
            bit_count_index,
        })
    }

    /// Embedded family this set was loaded from, if any.
    pub fn family(&self) -> Option<MarkerFamily> {
        self.family
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub fn root_id(&self) -> i32 {
        self.root_id
    }

    /// The outermost marker.
    pub fn root(&self) -> &MarkerModel {
        &self.models[&self.root_id]
    }

    pub fn get(&self, id: i32) -> Option<&MarkerModel> {
        self.models.get(&id)
    }

    /// Models in ascending id order.
    pub fn models(&self) -> impl Iterator<Item = &MarkerModel> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Bit count → model ids, both ascending.
    pub fn bit_count_index(&self) -> &BTreeMap<usize, Vec<i32>> {
        &self.bit_count_index
    }

    /// Rescale all model coordinates so the root marker side equals `size`
    /// and switch to [`Units::Meters`].
    ///
    /// Only allowed once, from pixel or normalized units.
    pub fn convert_to_physical_scale(&mut self, size: f32) -> Result<(), StateError> {
        if !matches!(self.units, Units::Pixels | Units::Normalized) {
            return Err(StateError::AlreadyPhysical(self.units));
        }
        if !size.is_finite() || size <= 0.0 {
            return Err(StateError::InvalidSize(size));
        }
        let factor = size / self.root().side_length();
        for m in self.models.values_mut() {
            m.scale(factor);
        }
        self.units = Units::Meters;
        log::debug!("marker set scaled by {factor} to {size} m root side");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::tests::DescriptorBuilder;

    /// Cells of `[y0, y0+size) × [x0, x0+size)` per family, root first.
    fn expected_regions(family: MarkerFamily) -> Vec<(i32, usize, usize, usize)> {
        match family {
            MarkerFamily::Fractal2L6 => vec![(0, 3, 3, 4)],
            MarkerFamily::Fractal3L6 => vec![(0, 3, 3, 6), (1, 3, 3, 4)],
            MarkerFamily::Fractal4L6 => vec![(0, 3, 3, 7), (1, 3, 3, 6), (2, 3, 3, 4)],
            MarkerFamily::Fractal5L6 => {
                vec![(0, 3, 3, 5), (1, 3, 3, 7), (2, 3, 3, 6), (3, 3, 3, 4)]
            }
        }
    }

    #[test]
    fn families_load_with_normalized_units() {
        for fam in MarkerFamily::ALL {
            let set = MarkerModelSet::from_family(fam).unwrap();
            assert_eq!(set.family(), Some(fam));
            assert_eq!(set.units(), Units::Normalized);
            assert_eq!(set.root_id(), 0);
            assert!((set.root().side_length() - 2.0).abs() < 1e-6);
            for m in set.models() {
                assert_eq!(m.bits().len(), m.bit_count());
                assert_eq!(m.mask().len(), m.bit_count());
                assert!(m.keypoints().len() > 4);
            }
        }
    }

    #[test]
    fn masks_cover_exactly_the_sub_marker_regions() {
        for fam in MarkerFamily::ALL {
            let set = MarkerModelSet::from_family(fam).unwrap();
            let regions = expected_regions(fam);
            for m in set.models() {
                let region = regions.iter().find(|r| r.0 == m.id());
                let zeros = m.mask().iter().filter(|&&v| v == 0).count();
                match region {
                    Some(&(_, x0, y0, size)) => {
                        assert_eq!(m.sub_marker_ids().len(), 1);
                        assert_eq!(zeros, size * size, "{fam} marker {}", m.id());
                        for r in y0..y0 + size {
                            for c in x0..x0 + size {
                                assert!(m.is_masked(r, c));
                            }
                        }
                    }
                    None => {
                        assert!(m.sub_marker_ids().is_empty());
                        assert_eq!(zeros, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn sub_regions_are_ringed_by_white_bits() {
        let set = MarkerModelSet::from_family(MarkerFamily::Fractal3L6).unwrap();
        let root = set.root();
        // the cells right around the 6×6 region at (3, 3)
        for i in 2..10 {
            assert_eq!(root.bit(2, i), 1);
            assert_eq!(root.bit(9, i), 1);
            assert_eq!(root.bit(i, 2), 1);
            assert_eq!(root.bit(i, 9), 1);
        }
    }

    #[test]
    fn bit_count_index_is_sorted_by_id() {
        let set = MarkerModelSet::from_family(MarkerFamily::Fractal5L6).unwrap();
        let total: usize = set.bit_count_index().values().map(Vec::len).sum();
        assert_eq!(total, set.len());
        for (&bits, ids) in set.bit_count_index() {
            assert!(ids.windows(2).all(|w| w[0] < w[1]));
            for id in ids {
                assert_eq!(set.get(*id).unwrap().bit_count(), bits);
            }
        }
    }

    #[test]
    fn physical_scale_applies_once() {
        let mut set = MarkerModelSet::from_family(MarkerFamily::Fractal3L6).unwrap();
        let before: Vec<_> = set.get(1).unwrap().keypoints().to_vec();

        set.convert_to_physical_scale(0.5).unwrap();
        assert_eq!(set.units(), Units::Meters);
        assert!((set.root().side_length() - 0.5).abs() < 1e-6);
        for (a, b) in before.iter().zip(set.get(1).unwrap().keypoints()) {
            assert!((b.position.x - a.position.x * 0.25).abs() < 1e-6);
            assert!((b.position.y - a.position.y * 0.25).abs() < 1e-6);
            assert_eq!(a.class, b.class);
        }

        assert_eq!(
            set.convert_to_physical_scale(0.5).unwrap_err(),
            StateError::AlreadyPhysical(Units::Meters)
        );
    }

    #[test]
    fn physical_scale_rejects_bad_sizes() {
        let mut set = MarkerModelSet::from_family(MarkerFamily::Fractal2L6).unwrap();
        assert!(matches!(
            set.convert_to_physical_scale(0.0),
            Err(StateError::InvalidSize(_))
        ));
        assert!(matches!(
            set.convert_to_physical_scale(f32::NAN),
            Err(StateError::InvalidSize(_))
        ));
        assert_eq!(set.units(), Units::Normalized);
    }

    #[test]
    fn unknown_names_and_references_fail() {
        assert!(matches!(
            MarkerModelSet::from_name("FRACTAL_1L_6"),
            Err(ConfigError::UnknownFamily(_))
        ));

        let unknown_root = DescriptorBuilder::default()
            .header(2, 1, 5)
            .marker(0, 1.0, &[0; 4], &[]);
        assert_eq!(
            MarkerModelSet::from_descriptor(&unknown_root.bytes).unwrap_err(),
            ConfigError::UnknownRoot(5)
        );

        let dup = DescriptorBuilder::default()
            .header(2, 2, 0)
            .marker(0, 1.0, &[0; 4], &[])
            .marker(0, 1.0, &[0; 4], &[]);
        assert_eq!(
            MarkerModelSet::from_descriptor(&dup.bytes).unwrap_err(),
            ConfigError::DuplicateId(0)
        );

        let dangling = DescriptorBuilder::default()
            .header(2, 1, 0)
            .marker(0, 1.0, &[0; 4], &[9]);
        assert_eq!(
            MarkerModelSet::from_descriptor(&dangling.bytes).unwrap_err(),
            ConfigError::UnknownSubMarker {
                parent: 0,
                child: 9
            }
        );
    }

    #[test]
    fn misplaced_sub_markers_fail() {
        // 4×4 parent with side 2 → cell 1/3. A child of side 4/3 at the
        // origin corner covers 4 cells starting at column 2: out of bounds.
        let outside = DescriptorBuilder::default()
            .header(2, 2, 0)
            .marker(0, 1.0, &[1; 16], &[1])
            .marker_at(1, (0.0, 0.0), 4.0 / 3.0, &[0; 4]);
        assert_eq!(
            MarkerModelSet::from_descriptor(&outside.bytes).unwrap_err(),
            ConfigError::SubMarkerOutOfBounds {
                parent: 0,
                child: 1
            }
        );

        let overlapping = DescriptorBuilder::default()
            .header(2, 3, 0)
            .marker(0, 1.0, &[1; 16], &[1, 2])
            .marker_at(1, (-2.0 / 3.0, 2.0 / 3.0), 2.0 / 3.0, &[0; 4])
            .marker_at(2, (-1.0 / 3.0, 1.0 / 3.0), 2.0 / 3.0, &[0; 4]);
        assert_eq!(
            MarkerModelSet::from_descriptor(&overlapping.bytes).unwrap_err(),
            ConfigError::OverlappingSubMarkers {
                parent: 0,
                child: 2
            }
        );
    }
}
