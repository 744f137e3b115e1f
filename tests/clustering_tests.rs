// tests/clustering_tests.rs
//! Greedy clustering properties

use presence_radar_core::config::ClusterConfig;
use presence_radar_core::processing::{Cluster, Detection, DetectionClusterer};
use proptest::prelude::*;

fn clusterer(eps: f64) -> DetectionClusterer {
    DetectionClusterer::new(ClusterConfig { eps }).unwrap()
}

fn detection_strategy() -> impl Strategy<Value = Detection> {
    (0usize..64, 0usize..64, 0.0f64..40.0).prop_map(|(range_bin, doppler_bin, snr_db)| Detection {
        range_bin,
        doppler_bin,
        snr_db,
    })
}

/// Full 3×3 blobs on a coarse grid so every cluster mean is an exact bin
fn blob_scene_strategy() -> impl Strategy<Value = Vec<Detection>> {
    prop::collection::btree_set((1usize..6, 1usize..6), 1..8).prop_map(|centres| {
        let mut detections = Vec::new();
        for (i, j) in centres {
            let (range_bin, doppler_bin) = (i * 10, j * 10);
            for dr in 0..3 {
                for dd in 0..3 {
                    detections.push(Detection {
                        range_bin: range_bin + dr - 1,
                        doppler_bin: doppler_bin + dd - 1,
                        snr_db: 10.0 + (dr * 3 + dd) as f64,
                    });
                }
            }
        }
        detections
    })
}

proptest! {
    #[test]
    fn prop_member_counts_sum_to_input(
        detections in prop::collection::vec(detection_strategy(), 0..60),
        eps in 0.5f64..6.0,
    ) {
        let clusters = clusterer(eps).cluster(&detections);
        let members: usize = clusters.iter().map(|c| c.member_count).sum();
        prop_assert_eq!(members, detections.len());
        prop_assert!(clusters.len() <= detections.len());
        for cluster in &clusters {
            prop_assert!(cluster.member_count >= 1);
        }
    }

    #[test]
    fn prop_max_snr_is_preserved(
        detections in prop::collection::vec(detection_strategy(), 1..60),
        eps in 0.5f64..6.0,
    ) {
        let clusters = clusterer(eps).cluster(&detections);
        let best_input = detections.iter().map(|d| d.snr_db).fold(f64::MIN, f64::max);
        let best_cluster = clusters.iter().map(|c| c.max_snr_db).fold(f64::MIN, f64::max);
        prop_assert_eq!(best_input, best_cluster);
    }

    /// Re-clustering one representative per cluster gives the same clusters as singletons
    #[test]
    fn prop_clustering_representatives_is_idempotent(detections in blob_scene_strategy()) {
        let clusterer = clusterer(3.0);
        let clusters = clusterer.cluster(&detections);

        let representatives: Vec<Detection> = clusters
            .iter()
            .map(|c| Detection {
                range_bin: c.avg_range_bin as usize,
                doppler_bin: c.avg_doppler_bin as usize,
                snr_db: c.max_snr_db,
            })
            .collect();
        let again = clusterer.cluster(&representatives);

        prop_assert_eq!(again.len(), clusters.len());
        for ((before, after), rep) in clusters.iter().zip(&again).zip(&representatives) {
            prop_assert_eq!(*after, Cluster::singleton(rep));
            prop_assert_eq!(after.avg_range_bin, before.avg_range_bin);
            prop_assert_eq!(after.avg_doppler_bin, before.avg_doppler_bin);
            prop_assert_eq!(after.max_snr_db, before.max_snr_db);
        }
    }
}

#[test]
fn test_three_by_three_blob_is_one_cluster() {
    let mut detections = Vec::new();
    for range_bin in 29..=31 {
        for doppler_bin in 63..=65 {
            detections.push(Detection {
                range_bin,
                doppler_bin,
                snr_db: if (range_bin, doppler_bin) == (30, 64) { 30.0 } else { 15.0 },
            });
        }
    }

    let clusters = clusterer(3.0).cluster(&detections);
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].member_count, 9);
    assert_eq!(clusters[0].avg_range_bin, 30.0);
    assert_eq!(clusters[0].avg_doppler_bin, 64.0);
    assert_eq!(clusters[0].max_snr_db, 30.0);

    // The default eps only reaches direct neighbours of the seed
    assert!(clusterer(1.5).cluster(&detections).len() > 1);
}
