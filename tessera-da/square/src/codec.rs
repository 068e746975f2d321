// std
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
// crates
use once_cell::sync::Lazy;
use reed_solomon_erasure::galois_8::ReedSolomon;
use thiserror::Error;
// internal
use crate::share::{Share, SHARE_SIZE};
use crate::MAX_SQUARE_WIDTH;

/// Codec tables are expensive to derive; share one per width across every
/// encoder and repairer in the process.
static CODECS: Lazy<Mutex<HashMap<usize, Arc<ReedSolomon>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("codec does not support width {0}")]
    UnsupportedWidth(usize),
    #[error("need {need} shares to reconstruct, have {have}")]
    TooFewShares { have: usize, need: usize },
    #[error("share has the wrong size for the codec")]
    WrongShardSize,
    #[error("erasure codec failure: {0}")]
    Codec(String),
}

impl From<reed_solomon_erasure::Error> for CodecError {
    fn from(err: reed_solomon_erasure::Error) -> Self {
        Self::Codec(err.to_string())
    }
}

/// Systematic erasure codec over whole shares: `encode` turns `k` data
/// shares into `k` parity shares, `reconstruct` recovers a full line of `2k`
/// from any `k` survivors.
pub trait Codec: Send + Sync {
    fn encode(&self, data: &[Share]) -> Result<Vec<Share>, CodecError>;
    fn reconstruct(&self, shares: &mut [Option<Share>]) -> Result<(), CodecError>;
    fn supports(&self, width: usize) -> bool;
}

/// Reed-Solomon over GF(2^8). The field bounds lines at 256 shards, so
/// original widths run up to [`MAX_SQUARE_WIDTH`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RsGf8Codec;

impl RsGf8Codec {
    pub const fn new() -> Self {
        Self
    }

    fn codec_for(&self, width: usize) -> Result<Arc<ReedSolomon>, CodecError> {
        if !self.supports(width) {
            return Err(CodecError::UnsupportedWidth(width));
        }
        let mut cache = CODECS.lock().unwrap();
        if let Some(rs) = cache.get(&width) {
            return Ok(Arc::clone(rs));
        }
        let rs = Arc::new(ReedSolomon::new(width, width)?);
        cache.insert(width, Arc::clone(&rs));
        Ok(rs)
    }
}

impl Codec for RsGf8Codec {
    fn encode(&self, data: &[Share]) -> Result<Vec<Share>, CodecError> {
        let width = data.len();
        let rs = self.codec_for(width)?;
        let mut shards = vec![vec![0u8; SHARE_SIZE]; 2 * width];
        for (shard, share) in shards.iter_mut().zip(data) {
            shard.copy_from_slice(share.as_bytes());
        }
        rs.encode(&mut shards)?;
        shards[width..]
            .iter()
            .map(|bytes| Share::from_slice(bytes).map_err(|_| CodecError::WrongShardSize))
            .collect()
    }

    fn reconstruct(&self, shares: &mut [Option<Share>]) -> Result<(), CodecError> {
        if shares.len() % 2 != 0 {
            return Err(CodecError::UnsupportedWidth(shares.len()));
        }
        let width = shares.len() / 2;
        let rs = self.codec_for(width)?;
        let have = shares.iter().filter(|share| share.is_some()).count();
        if have < width {
            return Err(CodecError::TooFewShares { have, need: width });
        }
        // Missing slots stay None all the way into the codec; pre-filling
        // them with zeroes would make it treat garbage as survivors.
        let mut shards: Vec<Option<Vec<u8>>> = shares
            .iter()
            .map(|share| share.as_ref().map(|s| s.as_bytes().to_vec()))
            .collect();
        rs.reconstruct(&mut shards)?;
        for (slot, shard) in shares.iter_mut().zip(shards) {
            if slot.is_none() {
                let bytes =
                    shard.ok_or_else(|| CodecError::Codec("shard missing after repair".into()))?;
                *slot = Some(Share::from_slice(&bytes).map_err(|_| CodecError::WrongShardSize)?);
            }
        }
        Ok(())
    }

    fn supports(&self, width: usize) -> bool {
        width.is_power_of_two() && width <= MAX_SQUARE_WIDTH
    }
}
