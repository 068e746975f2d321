// crates
use async_trait::async_trait;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
// internal
use tessera_core::{Availability, ExtendedHeader, Getter, GetterError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightAvailabilitySettings {
    /// Distinct coordinates to sample per check.
    pub sample_count: usize,
}

impl Default for LightAvailabilitySettings {
    fn default() -> Self {
        Self { sample_count: 16 }
    }
}

/// Sampling-based availability: pull a handful of random coordinates
/// through a getter and conclude, with high probability, that the whole
/// square is retrievable. A single missing sample means withheld data.
pub struct LightAvailability<G> {
    getter: G,
    settings: LightAvailabilitySettings,
}

impl<G: Getter> LightAvailability<G> {
    pub fn new(getter: G) -> Self {
        Self::with_settings(getter, LightAvailabilitySettings::default())
    }

    pub fn with_settings(getter: G, settings: LightAvailabilitySettings) -> Self {
        Self { getter, settings }
    }
}

#[async_trait]
impl<G: Getter> Availability for LightAvailability<G> {
    async fn shares_available(&self, header: &ExtendedHeader) -> Result<(), GetterError> {
        let width = header.dah().square_width();
        let cells = width * width;
        let wanted = self.settings.sample_count.min(cells);
        // draw every coordinate up front, the rng cannot cross an await
        let coords: Vec<(usize, usize)> =
            rand::seq::index::sample(&mut thread_rng(), cells, wanted)
                .into_iter()
                .map(|cell| (cell / width, cell % width))
                .collect();
        for (row, col) in coords {
            match self.getter.get_share(header, row, col).await {
                Ok(_) => {}
                Err(GetterError::NotFound | GetterError::Unavailable) => {
                    return Err(GetterError::Unavailable);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
