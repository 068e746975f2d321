//! Random share fixtures shared by this crate's tests and downstream
//! dev-dependencies, behind the `testutils` feature.

// crates
use rand::{thread_rng, RngCore};
// internal
use crate::encoder::{DaEncoder, DaEncoderParams, EncodedData};
use crate::share::{Share, PAYLOAD_SIZE};
use tessera_nmt::{Namespace, NoopVisitor};

pub fn rand_payload() -> Vec<u8> {
    let mut payload = vec![0u8; PAYLOAD_SIZE];
    thread_rng().fill_bytes(&mut payload);
    payload
}

/// One random-payload share per entry of `namespaces`, in the given order.
/// The list must already be sorted or the encoder will reject the result.
pub fn rand_shares(namespaces: &[u64]) -> Vec<Share> {
    namespaces
        .iter()
        .map(|ns| Share::build(Namespace::from_be_u64(*ns), &rand_payload()).unwrap())
        .collect()
}

/// `k²` sorted random shares, two consecutive shares per namespace.
pub fn rand_shares_width(k: usize) -> Vec<Share> {
    let namespaces: Vec<u64> = (0..k * k).map(|i| i as u64 / 2 + 1).collect();
    rand_shares(&namespaces)
}

/// A fully encoded random `2k × 2k` square with its row and column roots.
pub fn rand_square(k: usize) -> EncodedData {
    DaEncoder::new(DaEncoderParams::new(k))
        .encode(&rand_shares_width(k), &NoopVisitor)
        .unwrap()
}
