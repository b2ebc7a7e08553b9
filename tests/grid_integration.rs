//! Integration Tests for the CIPHERGRID Aggregation Pipeline
//!
//! Comprehensive tests for:
//! - GridNode lifecycle and configuration
//! - Provider authorization and observation submission
//! - Grid builds through the two-phase oracle protocol
//! - One-shot map reveal
//! - Callback validation (proof, kind, payload shape)
//! - Write-through persistence and restart recovery

use ciphergrid::prelude::*;
use ciphergrid_core::CoreError;
use ciphergrid_oracle::encode_cleartexts;

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tempfile::tempdir;

// =============================================================================
// HELPERS
// =============================================================================

fn pid(byte: u8) -> ProviderId {
    ProviderId::from_bytes([byte; 32])
}

async fn node_in(dir: &std::path::Path) -> GridNode {
    let config = NodeConfig {
        data_dir: dir.to_path_buf(),
        ..NodeConfig::local()
    };
    GridNode::new(config).await.expect("node creation should succeed")
}

/// Submit one observation encrypted under the node's own oracle key
async fn submit(node: &GridNode, provider: ProviderId, x: u32, y: u32, z: u32, d: u32) -> u64 {
    let key = node.oracle().mask_key().clone();
    let mut rng = ChaCha20Rng::seed_from_u64((u64::from(x) << 32) | u64::from(d));
    node.submit_observation(
        provider,
        key.encrypt(x, &mut rng),
        key.encrypt(y, &mut rng),
        key.encrypt(z, &mut rng),
        key.encrypt(d, &mut rng),
    )
    .await
    .expect("submission should be accepted")
    .id
}

/// Read the decrypted-trivial value of one grid cell
async fn cell_value(node: &GridNode, x: u32, y: u32, z: u32) -> Ciphertext {
    let engine = node.engine();
    let engine = engine.read().await;
    engine.grid().cell(x, y, z).expect("grid allocated").clone()
}

// =============================================================================
// LIFECYCLE TESTS
// =============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_fresh_node_state() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        let status = node.status().await;
        assert_eq!(status.network, "local");
        assert_eq!(status.observation_count, 0);
        assert_eq!(status.provider_count, 0);
        assert_eq!(status.resolution, 0);
        assert!(!status.map_ready);
        assert!(!status.revealed);
        assert_eq!(status.pending_requests, 0);
        assert_eq!(status.oracle_queue, 0);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        assert!(!node.is_running().await);
        node.start().await.unwrap();
        assert!(node.is_running().await);
        node.stop().await;
        assert!(!node.is_running().await);
    }

    #[test]
    fn test_root_crate_version() {
        assert!(!ciphergrid::VERSION.is_empty());
        assert_eq!(
            ciphergrid::config::default_threshold(ciphergrid::config::DEFAULT_COMMITTEE_SIZE),
            2
        );
    }
}

// =============================================================================
// SUBMISSION TESTS
// =============================================================================

mod submission_tests {
    use super::*;

    #[tokio::test]
    async fn test_authorize_is_idempotent() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        assert!(node.authorize(pid(1)).await.unwrap());
        assert!(!node.authorize(pid(1)).await.unwrap());
        assert_eq!(node.status().await.provider_count, 1);
    }

    #[tokio::test]
    async fn test_observation_ids_are_sequential_across_providers() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        node.authorize(pid(2)).await.unwrap();

        assert_eq!(submit(&node, pid(1), 0, 0, 0, 1).await, 1);
        assert_eq!(submit(&node, pid(2), 0, 0, 0, 2).await, 2);
        assert_eq!(submit(&node, pid(1), 0, 0, 0, 3).await, 3);
        assert_eq!(node.observation_count().await, 3);
    }

    #[tokio::test]
    async fn test_unauthorized_provider_is_rejected() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        let err = node
            .submit_observation(
                pid(9),
                Ciphertext::zero(),
                Ciphertext::zero(),
                Ciphertext::zero(),
                Ciphertext::zero(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NodeError::Core(CoreError::Unauthorized(p)) if p == pid(9)
        ));
        assert_eq!(node.observation_count().await, 0);
    }
}

// =============================================================================
// GRID BUILD TESTS
// =============================================================================

mod grid_build_tests {
    use super::*;

    #[tokio::test]
    async fn test_density_map_sums_per_cell() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 1, 1, 1, 5).await;
        submit(&node, pid(1), 1, 1, 1, 7).await;
        submit(&node, pid(1), 2, 2, 2, 3).await;

        node.calculate_density_map(10, pid(1)).await.unwrap();
        assert!(node.pump_oracle_once().await.unwrap());

        assert!(node.is_map_ready().await);
        assert_eq!(node.status().await.resolution, 10);
        assert_eq!(cell_value(&node, 1, 1, 1).await, Ciphertext::trivial(12));
        assert_eq!(cell_value(&node, 2, 2, 2).await, Ciphertext::trivial(3));
        assert_eq!(cell_value(&node, 0, 0, 0).await, Ciphertext::zero());
    }

    #[tokio::test]
    async fn test_coordinates_bin_by_modulus() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        // 11 mod 10 = 1, 10 mod 10 = 0
        submit(&node, pid(1), 11, 11, 11, 5).await;
        submit(&node, pid(1), 10, 10, 10, 9).await;

        node.calculate_density_map(10, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();

        assert_eq!(cell_value(&node, 1, 1, 1).await, Ciphertext::trivial(5));
        assert_eq!(cell_value(&node, 0, 0, 0).await, Ciphertext::trivial(9));
    }

    #[tokio::test]
    async fn test_rebuild_starts_from_scratch() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 1, 1, 1, 5).await;

        node.calculate_density_map(4, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        assert_eq!(cell_value(&node, 1, 1, 1).await, Ciphertext::trivial(5));

        // A second build re-bins every stored observation; nothing is
        // double counted and nothing from the first build is kept
        submit(&node, pid(1), 1, 1, 1, 7).await;
        node.calculate_density_map(4, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();

        assert_eq!(cell_value(&node, 1, 1, 1).await, Ciphertext::trivial(12));
    }

    #[tokio::test]
    async fn test_build_with_no_observations() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.calculate_density_map(2, pid(1)).await.unwrap();
        assert!(node.pump_oracle_once().await.unwrap());

        assert!(node.is_map_ready().await);
        let engine = node.engine();
        let engine = engine.read().await;
        assert_eq!(engine.grid().cell_count(), 8);
        assert!(engine.grid().cells().iter().all(|c| *c == Ciphertext::zero()));
    }

    #[tokio::test]
    async fn test_resolution_bounds_are_enforced() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        for resolution in [0, 101] {
            let err = node
                .calculate_density_map(resolution, pid(1))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                NodeError::Core(CoreError::InvalidResolution(r)) if r == resolution
            ));
        }

        // Rejected before anything reached the oracle or the store
        assert_eq!(node.oracle().pending_count(), 0);
        assert_eq!(node.status().await.pending_requests, 0);
    }
}

// =============================================================================
// REVEAL TESTS
// =============================================================================

mod reveal_tests {
    use super::*;

    #[tokio::test]
    async fn test_reveal_returns_cleartext_grid() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 1, 1, 1, 5).await;
        submit(&node, pid(1), 1, 1, 1, 7).await;
        submit(&node, pid(1), 2, 2, 2, 3).await;
        node.calculate_density_map(10, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();

        let request_id = node.request_map_reveal(pid(2)).await.unwrap();
        let batch = node.oracle().take_pending().pop().unwrap();
        assert_eq!(batch.request_id, request_id);
        let callback = node.oracle().answer(&batch).unwrap();

        let revealed = node
            .reveal_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap();

        assert_eq!(revealed.resolution, 10);
        assert_eq!(revealed.values.len(), 1000);
        // flatten order is (x * r + y) * r + z
        assert_eq!(revealed.values[(1 * 10 + 1) * 10 + 1], 12);
        assert_eq!(revealed.values[(2 * 10 + 2) * 10 + 2], 3);
        assert_eq!(revealed.values.iter().sum::<u32>(), 15);
        assert!(node.status().await.revealed);
    }

    #[tokio::test]
    async fn test_reveal_is_one_shot() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.calculate_density_map(2, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        node.request_map_reveal(pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        assert!(node.status().await.revealed);

        let err = node.request_map_reveal(pid(1)).await.unwrap_err();
        assert!(matches!(err, NodeError::Core(CoreError::AlreadyRevealed)));
    }

    #[tokio::test]
    async fn test_reveal_of_unbuilt_grid_is_empty() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;
        let mut events = node.subscribe();

        node.request_map_reveal(pid(1)).await.unwrap();
        assert!(node.pump_oracle_once().await.unwrap());

        let status = node.status().await;
        assert!(status.revealed);
        assert!(!status.map_ready);
        assert_eq!(status.resolution, 0);

        events.try_recv().unwrap(); // MapRevealRequested
        match events.try_recv().unwrap() {
            NodeEvent::MapRevealed(revealed) => assert!(revealed.values.is_empty()),
            other => panic!("expected MapRevealed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rebuild_after_reveal_keeps_flag() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 0, 0, 0, 4).await;
        node.calculate_density_map(3, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        node.request_map_reveal(pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        assert!(node.status().await.revealed);

        // Rebuilding is still allowed and does not reset revealed
        node.calculate_density_map(5, pid(1)).await.unwrap();
        node.pump_oracle_once().await.unwrap();
        let status = node.status().await;
        assert_eq!(status.resolution, 5);
        assert!(status.revealed);
    }
}

// =============================================================================
// CALLBACK VALIDATION TESTS
// =============================================================================

mod callback_tests {
    use super::*;

    #[tokio::test]
    async fn test_tampered_cleartexts_fail_the_proof() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 1, 2, 3, 4).await;
        let request_id = node.calculate_density_map(4, pid(1)).await.unwrap();

        let batch = node.oracle().take_pending().pop().unwrap();
        let callback = node.oracle().answer(&batch).unwrap();

        let mut tampered = callback.cleartexts.clone();
        tampered[0] ^= 0xFF;
        let err = node
            .grid_build_callback(request_id, &tampered, &callback.proof)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Core(CoreError::InvalidProof(r)) if r == request_id
        ));

        // The request survived the rejected callback
        assert_eq!(node.status().await.pending_requests, 1);
        node.grid_build_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap();
        assert!(node.is_map_ready().await);
    }

    #[tokio::test]
    async fn test_wrong_kind_callback_is_rejected_without_consumption() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        let request_id = node.calculate_density_map(2, pid(1)).await.unwrap();
        let batch = node.oracle().take_pending().pop().unwrap();
        let callback = node.oracle().answer(&batch).unwrap();

        let err = node
            .reveal_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            NodeError::Core(CoreError::InvalidRequest { .. })
        ));
        assert!(!node.status().await.revealed);

        node.grid_build_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_request_id_is_rejected() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        let bogus = RequestId::new(999);
        let proof = node.oracle().committee().sign(bogus, &[]).unwrap();
        let err = node.grid_build_callback(bogus, &[], &proof).await.unwrap_err();

        assert!(matches!(
            err,
            NodeError::Core(CoreError::UnknownRequest(r)) if r == bogus
        ));
    }

    #[tokio::test]
    async fn test_partial_observation_group_is_rejected() {
        let dir = tempdir().unwrap();
        let node = node_in(dir.path()).await;

        node.authorize(pid(1)).await.unwrap();
        submit(&node, pid(1), 1, 1, 1, 1).await;
        let request_id = node.calculate_density_map(3, pid(1)).await.unwrap();

        // Three whole words: decodes fine, but not a whole observation
        let payload = encode_cleartexts(&[1, 2, 3]);
        let proof = node.oracle().committee().sign(request_id, &payload).unwrap();
        let err = node
            .grid_build_callback(request_id, &payload, &proof)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            NodeError::Core(CoreError::MalformedCleartexts { .. })
        ));
        assert!(!node.is_map_ready().await);

        // No consumption: the honest callback still completes the build
        let batch = node.oracle().take_pending().pop().unwrap();
        let callback = node.oracle().answer(&batch).unwrap();
        node.grid_build_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap();
        assert!(node.is_map_ready().await);
    }
}

// =============================================================================
// PERSISTENCE TESTS
// =============================================================================

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_registry_survives_restart() {
        let dir = tempdir().unwrap();

        {
            let node = node_in(dir.path()).await;
            node.authorize(pid(1)).await.unwrap();
            submit(&node, pid(1), 4, 4, 4, 2).await;
            submit(&node, pid(1), 5, 5, 5, 6).await;
        }

        let node = node_in(dir.path()).await;
        assert_eq!(node.observation_count().await, 2);
        assert_eq!(node.status().await.provider_count, 1);

        // Grant persisted; next id continues the sequence
        assert_eq!(submit(&node, pid(1), 6, 6, 6, 1).await, 3);
    }

    #[tokio::test]
    async fn test_built_grid_reveals_after_restart() {
        let dir = tempdir().unwrap();

        {
            let node = node_in(dir.path()).await;
            node.authorize(pid(1)).await.unwrap();
            submit(&node, pid(1), 1, 1, 1, 5).await;
            submit(&node, pid(1), 2, 2, 2, 3).await;
            node.calculate_density_map(10, pid(1)).await.unwrap();
            node.pump_oracle_once().await.unwrap();
        }

        // Built cells are trivial ciphertexts, so the new committee can
        // still produce the reveal
        let node = node_in(dir.path()).await;
        assert!(node.is_map_ready().await);

        let request_id = node.request_map_reveal(pid(1)).await.unwrap();
        let batch = node.oracle().take_pending().pop().unwrap();
        let callback = node.oracle().answer(&batch).unwrap();
        let revealed = node
            .reveal_callback(request_id, &callback.cleartexts, &callback.proof)
            .await
            .unwrap();

        assert_eq!(revealed.values[(1 * 10 + 1) * 10 + 1], 5);
        assert_eq!(revealed.values[(2 * 10 + 2) * 10 + 2], 3);
    }

    #[tokio::test]
    async fn test_revealed_flag_survives_restart() {
        let dir = tempdir().unwrap();

        {
            let node = node_in(dir.path()).await;
            node.calculate_density_map(2, pid(1)).await.unwrap();
            node.pump_oracle_once().await.unwrap();
            node.request_map_reveal(pid(1)).await.unwrap();
            node.pump_oracle_once().await.unwrap();
        }

        let node = node_in(dir.path()).await;
        assert!(node.status().await.revealed);
        let err = node.request_map_reveal(pid(1)).await.unwrap_err();
        assert!(matches!(err, NodeError::Core(CoreError::AlreadyRevealed)));
    }

    #[tokio::test]
    async fn test_pending_request_survives_restart() {
        let dir = tempdir().unwrap();

        let request_id = {
            let node = node_in(dir.path()).await;
            node.calculate_density_map(3, pid(1)).await.unwrap()
        };

        // The broker entry is durable; the in-memory oracle queue is not
        let node = node_in(dir.path()).await;
        assert_eq!(node.status().await.pending_requests, 1);
        assert_eq!(node.status().await.oracle_queue, 0);
        assert!(!node.pump_oracle_once().await.unwrap());

        // An external oracle can still answer the old id
        let payload = encode_cleartexts(&[]);
        let proof = node.oracle().committee().sign(request_id, &payload).unwrap();
        node.grid_build_callback(request_id, &payload, &proof)
            .await
            .unwrap();
        assert!(node.is_map_ready().await);
        assert_eq!(node.status().await.pending_requests, 0);
    }
}
