//! Band subsetting and reprojection through the scratch store.

use std::sync::Arc;

use projection::Crs;
use tracing::{debug, info};

use crate::dataset::{Band, Dataset};
use crate::error::{RasterError, Result};
use crate::resample::{warp, WarpOptions};
use crate::scratch::{ScratchHandle, ScratchStore};

/// A reprojected dataset and the handle that owns its scratch entry.
///
/// Dropping this (or calling [`Reprojected::release`]) frees the entry.
#[derive(Debug)]
pub struct Reprojected {
    pub dataset: Arc<Dataset>,
    pub handle: ScratchHandle,
}

impl Reprojected {
    pub fn release(self) {
        self.handle.release();
    }
}

/// New dataset holding exactly the given 1-based bands, in the given order.
pub fn extract_bands(source: &Dataset, bands: &[usize]) -> Result<Dataset> {
    if bands.is_empty() {
        return Err(RasterError::EmptyBandList);
    }

    let selected: Vec<Band> = bands
        .iter()
        .map(|&i| source.band(i).cloned())
        .collect::<Result<_>>()?;

    Dataset::new(
        source.width(),
        source.height(),
        *source.geo_transform(),
        source.crs().cloned(),
        selected,
    )
}

/// Extract `bands` from `source` and warp them into `target`.
///
/// The band subset is a scratch entry released before this returns; the
/// warped result is a scratch entry owned by the returned handle.
pub fn reproject(
    store: &ScratchStore,
    source: &Dataset,
    bands: &[usize],
    target: &Crs,
    options: &WarpOptions,
) -> Result<Reprojected> {
    let subset = store.allocate("subset", extract_bands(source, bands)?);
    let warped = warp(&*subset.dataset()?, target, options)?;
    subset.release();

    let handle = store.allocate("warped", warped);
    let dataset = handle.dataset()?;
    info!(
        bands = dataset.band_count(),
        width = dataset.width(),
        height = dataset.height(),
        crs = %target,
        "Reprojected dataset"
    );
    debug!(name = %handle.name(), "Reprojected dataset stored");

    Ok(Reprojected { dataset, handle })
}
