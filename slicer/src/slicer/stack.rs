use std::{
    ops::Range,
    sync::atomic::{AtomicU32, Ordering},
    time::Instant,
};

use anyhow::Result;
use common::progress::Progress;
use image::GrayImage;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::info;

use crate::slicer::Slicer;

/// Outcome of slicing a range of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSummary {
    /// The first layer found to be above the top of the mesh, if any.
    pub top_layer: Option<u32>,
    /// Number of layers handed to the sink.
    pub layers: u32,
}

impl Slicer {
    /// Renders every layer in `layers` on the rayon thread pool, passing each
    /// finished image to `sink` along with its layer index.
    ///
    /// Every worker renders into its own image, so the sink may be called
    /// from many threads at once and in any order. Once a layer is found to
    /// be above the top of the mesh, it and every layer after it are skipped.
    /// An error from the sink stops the operation and is returned, it is
    /// never confused with reaching the top of the mesh.
    pub fn slice_layers(
        &self,
        layers: Range<u32>,
        progress: &Progress,
        sink: impl Fn(u32, &GrayImage) -> Result<()> + Sync,
    ) -> Result<SliceSummary> {
        let (width, height) = self.config.slice_size();
        let now = Instant::now();

        let top = AtomicU32::new(u32::MAX);
        let written = AtomicU32::new(0);
        progress.set_total(layers.len() as u32);

        let result: Result<()> = layers.into_par_iter().try_for_each_init(
            || GrayImage::new(width, height),
            |image, layer| {
                if layer < top.load(Ordering::Relaxed) {
                    if self.render(image, self.layer_height(layer)) {
                        sink(layer, image)?;
                        written.fetch_add(1, Ordering::Relaxed);
                    } else {
                        top.fetch_min(layer, Ordering::Relaxed);
                    }
                }

                progress.add_complete(1);
                Ok(())
            },
        );

        progress.set_finished();
        result?;

        let top = top.into_inner();
        let summary = SliceSummary {
            top_layer: (top != u32::MAX).then_some(top),
            layers: written.into_inner(),
        };

        info!(
            "Sliced {} layers in {:?}, top: {:?}",
            summary.layers,
            now.elapsed(),
            summary.top_layer
        );
        Ok(summary)
    }
}
