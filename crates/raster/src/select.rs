//! Band selection by metadata tag.

use crate::dataset::Dataset;
use crate::grib::GRIB_ELEMENT;

/// 1-based indices, ascending, of bands whose `key` metadata equals `identifier`.
///
/// No match yields an empty vector.
pub fn select_bands(dataset: &Dataset, key: &str, identifier: &str) -> Vec<usize> {
    select_bands_by(dataset, |band| band.metadata_item(key) == Some(identifier))
}

/// Bands whose GRIB element name equals `element`.
pub fn select_bands_by_element(dataset: &Dataset, element: &str) -> Vec<usize> {
    select_bands(dataset, GRIB_ELEMENT, element)
}

/// 1-based indices of bands matching a predicate.
pub fn select_bands_by<F>(dataset: &Dataset, predicate: F) -> Vec<usize>
where
    F: Fn(&crate::dataset::Band) -> bool,
{
    dataset
        .bands()
        .iter()
        .enumerate()
        .filter(|(_, band)| predicate(band))
        .map(|(i, _)| i + 1)
        .collect()
}
