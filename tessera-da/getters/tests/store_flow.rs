//! Flows crossing the encoder, the node store, and the store getter.

use tessera_core::{DataAvailabilityHeader, ExtendedHeader, Getter, GetterError};
use tessera_da_storage::{MemStore, NodeBatch, NodeStore};
use tessera_getters::StoreGetter;
use tessera_nmt::hash::leaf_node_bytes;
use tessera_nmt::Namespace;
use tessera_square::testutils::rand_shares;
use tessera_square::{DaEncoder, DaEncoderParams, EncodedData, Share};

fn ns(id: u64) -> Namespace {
    Namespace::from_be_u64(id)
}

fn encode(namespaces: &[u64]) -> (EncodedData, NodeBatch) {
    let k = (namespaces.len() as f64).sqrt() as usize;
    let batch = NodeBatch::new();
    let encoded = DaEncoder::new(DaEncoderParams::new(k))
        .encode(&rand_shares(namespaces), &batch)
        .unwrap();
    (encoded, batch)
}

async fn committed(namespaces: &[u64]) -> (ExtendedHeader, EncodedData, MemStore) {
    let (encoded, batch) = encode(namespaces);
    let store = MemStore::new();
    batch.commit(&store).await.unwrap();
    let header = ExtendedHeader::new(7, DataAvailabilityHeader::from_encoded(&encoded));
    (header, encoded, store)
}

#[tokio::test]
async fn every_committed_coordinate_is_retrievable() {
    let (header, encoded, store) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(store);
    for row in 0..4 {
        for col in 0..4 {
            let share = getter.get_share(&header, row, col).await.unwrap();
            assert_eq!(&share, encoded.square.share(row, col).unwrap());
        }
    }
}

#[tokio::test]
async fn out_of_square_coordinates_are_not_found() {
    let (header, _, store) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(store);
    assert!(matches!(
        getter.get_share(&header, 4, 0).await,
        Err(GetterError::NotFound)
    ));
    assert!(matches!(
        getter.get_share(&header, 0, 4).await,
        Err(GetterError::NotFound)
    ));
}

#[tokio::test]
async fn uncommitted_square_is_not_found() {
    let (header, _, _) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(MemStore::new());
    assert!(matches!(
        getter.get_share(&header, 0, 0).await,
        Err(GetterError::NotFound)
    ));
    assert!(matches!(
        getter.get_eds(&header).await,
        Err(GetterError::Unavailable)
    ));
}

#[tokio::test]
async fn full_square_round_trips_through_the_store() {
    let (header, encoded, store) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(store);
    let square = getter.get_eds(&header).await.unwrap();
    assert_eq!(square, encoded.square);
}

#[tokio::test]
async fn tampered_store_value_is_caught() {
    let (encoded, batch) = encode(&[1, 1, 2, 2]);
    let store = MemStore::new();
    // poison the root's slot first; the idempotent put keeps the forgery
    let forged = leaf_node_bytes(ns(1), &[0u8; 8]);
    store
        .put(encoded.row_roots[0].digest(), forged.into())
        .await
        .unwrap();
    batch.commit(&store).await.unwrap();

    let header = ExtendedHeader::new(7, DataAvailabilityHeader::from_encoded(&encoded));
    let getter = StoreGetter::new(store);
    assert!(getter
        .get_share(&header, 0, 0)
        .await
        .unwrap_err()
        .is_verification());
}

#[tokio::test]
async fn namespace_query_returns_exactly_the_matching_row() {
    // namespaces [1, 1 | 2, 2]: row 0 commits to namespace 1, row 1 to
    // namespace 2, parity rows to neither
    let (header, encoded, store) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(store);

    let result = getter
        .get_shares_by_namespace(&header, ns(2))
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].row, 1);
    assert!(!result.rows[0].proof.is_of_absence());
    let expected: Vec<Share> = encoded.square.row(1).unwrap()[..2].to_vec();
    assert_eq!(result.shares(), expected);
    result.verify(header.dah(), ns(2)).unwrap();
}

#[tokio::test]
async fn namespace_outside_every_row_range_yields_no_rows() {
    let (header, _, store) = committed(&[1, 1, 2, 2]).await;
    let getter = StoreGetter::new(store);
    let result = getter
        .get_shares_by_namespace(&header, ns(9))
        .await
        .unwrap();
    assert!(result.rows.is_empty());
}

#[tokio::test]
async fn namespace_in_a_range_gap_gets_an_absence_proof() {
    // row 0 commits the range [1, 3]; namespace 2 falls in its gap
    let (header, _, store) = committed(&[1, 3, 4, 4]).await;
    let getter = StoreGetter::new(store);
    let result = getter
        .get_shares_by_namespace(&header, ns(2))
        .await
        .unwrap();
    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.rows[0].row, 0);
    assert!(result.rows[0].proof.is_of_absence());
    assert!(result.rows[0].shares.is_empty());
    result.verify(header.dah(), ns(2)).unwrap();
}

#[tokio::test]
async fn wider_squares_round_trip_too() {
    let namespaces: Vec<u64> = (0..16).map(|i| i / 3 + 1).collect();
    let (header, encoded, store) = committed(&namespaces).await;
    let getter = StoreGetter::new(store);
    assert_eq!(getter.get_eds(&header).await.unwrap(), encoded.square);

    let result = getter
        .get_shares_by_namespace(&header, ns(2))
        .await
        .unwrap();
    result.verify(header.dah(), ns(2)).unwrap();
    let mut expected = Vec::new();
    for row in 0..4 {
        expected.extend(
            encoded.square.row(row).unwrap()[..4]
                .iter()
                .filter(|share| share.namespace() == ns(2))
                .cloned(),
        );
    }
    assert_eq!(result.shares(), expected);
}
