//! Scene identification against a stash-box registry
//!
//! Fingerprint lookups fan out to the registry in bounded chunks and fan
//! back in to the original query positions: each input scene receives the
//! remote scenes whose fingerprint set intersects its own, by exact hash on
//! any algorithm or by perceptual-hash distance.

use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use stash_common::db::{performers, scenes};
use stash_common::fingerprint::{self, FingerprintAlgorithm};
use stash_common::models::{Performer, PerformerQueryResult, ScrapedPerformer, ScrapedScene};
use stash_common::Error;

use crate::client::{StashBox, FINGERPRINT_CHUNK_SIZE};
use crate::error::Result;
use crate::graphql::{FingerprintInput, FingerprintQueryInput, FingerprintSubmission};
use crate::scrape::performer_fragment_to_scraped;

/// Per-call indexes mapping fingerprints back to input positions.
///
/// `fp_to_scene` is a multi-map on the canonical hash string because two
/// inputs may share a hash; `phash_to_scene` additionally keys perceptual
/// hashes by value for fuzzy matching.
#[derive(Debug, Default)]
struct FingerprintIndex {
    queries: Vec<FingerprintQueryInput>,
    fp_to_scene: HashMap<String, Vec<usize>>,
    phash_to_scene: HashMap<i64, Vec<usize>>,
}

impl FingerprintIndex {
    fn add_scene(&mut self, index: usize, scene: &stash_common::models::Scene) {
        if let Some(checksum) = &scene.checksum {
            self.queries.push(FingerprintQueryInput {
                hash: checksum.clone(),
                algorithm: FingerprintAlgorithm::Md5,
            });
            self.fp_to_scene.entry(checksum.clone()).or_default().push(index);
        }

        if let Some(oshash) = &scene.oshash {
            self.queries.push(FingerprintQueryInput {
                hash: oshash.clone(),
                algorithm: FingerprintAlgorithm::Oshash,
            });
            self.fp_to_scene.entry(oshash.clone()).or_default().push(index);
        }

        if let Some(phash) = scene.phash {
            let hash = fingerprint::phash_to_string(phash);
            self.queries.push(FingerprintQueryInput {
                hash: hash.clone(),
                algorithm: FingerprintAlgorithm::Phash,
            });
            self.fp_to_scene.entry(hash).or_default().push(index);
            self.phash_to_scene.entry(phash).or_default().push(index);
        }
    }
}

impl StashBox {
    /// Identify local scenes by fingerprint, returning for each input scene
    /// — in input order — the remote scenes that match it.
    pub async fn find_scenes_by_fingerprints(
        &self,
        cancel: &CancellationToken,
        scene_ids: &[i64],
    ) -> Result<Vec<Vec<ScrapedScene>>> {
        let ids = scene_ids.to_vec();
        let index = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move {
                    let mut index = FingerprintIndex::default();
                    for (position, scene_id) in ids.iter().copied().enumerate() {
                        let scene = scenes::find(txn, scene_id).await?.ok_or(Error::NotFound {
                            entity: "scene",
                            id: scene_id,
                        })?;
                        index.add_scene(position, &scene);
                    }
                    Ok(index)
                })
            })
            .await?;

        debug!(
            scenes = scene_ids.len(),
            fingerprints = index.queries.len(),
            "querying stash-box by fingerprint"
        );

        let remote = self.query_fingerprints_chunked(cancel, &index.queries).await?;

        Ok(correlate(
            scene_ids.len(),
            &index.fp_to_scene,
            &index.phash_to_scene,
            remote,
            self.max_phash_distance(),
        ))
    }

    /// Identify local scenes by fingerprint without per-input correlation;
    /// the result is the concatenated remote result list.
    pub async fn find_scenes_by_fingerprints_flat(
        &self,
        cancel: &CancellationToken,
        scene_ids: &[i64],
    ) -> Result<Vec<ScrapedScene>> {
        let ids = scene_ids.to_vec();
        let index = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move {
                    let mut index = FingerprintIndex::default();
                    for (position, scene_id) in ids.iter().copied().enumerate() {
                        let scene = scenes::find(txn, scene_id).await?.ok_or(Error::NotFound {
                            entity: "scene",
                            id: scene_id,
                        })?;
                        index.add_scene(position, &scene);
                    }
                    Ok(index)
                })
            })
            .await?;

        self.query_fingerprints_chunked(cancel, &index.queries).await
    }

    async fn query_fingerprints_chunked(
        &self,
        cancel: &CancellationToken,
        queries: &[FingerprintQueryInput],
    ) -> Result<Vec<ScrapedScene>> {
        let mut all = Vec::new();
        for chunk in queries.chunks(FINGERPRINT_CHUNK_SIZE) {
            let fragments = self.find_scenes_by_full_fingerprints(cancel, chunk).await?;
            for fragment in &fragments {
                all.push(self.scene_fragment_to_scraped(cancel, fragment).await?);
            }
        }
        Ok(all)
    }

    /// Submit the fingerprints of local scenes to the registry.
    ///
    /// Only scenes holding a stash id for this registry's endpoint are
    /// submitted; the rest are skipped. Submission is at-least-once: each
    /// fingerprint posts individually, a failure is terminal, and earlier
    /// submissions are not rolled back.
    pub async fn submit_fingerprints(
        &self,
        cancel: &CancellationToken,
        scene_ids: &[i64],
    ) -> Result<bool> {
        let endpoint = self.endpoint().to_string();
        let ids = scene_ids.to_vec();

        let submissions = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move {
                    let mut submissions: Vec<FingerprintSubmission> = Vec::new();

                    for scene_id in ids {
                        let scene = scenes::find(txn, scene_id).await?.ok_or(Error::NotFound {
                            entity: "scene",
                            id: scene_id,
                        })?;

                        let stash_ids = scenes::stash_ids(txn, scene_id).await?;
                        let Some(remote_scene_id) = stash_ids
                            .into_iter()
                            .find(|s| s.endpoint == endpoint)
                            .map(|s| s.stash_id)
                        else {
                            debug!(scene_id, "scene holds no stash id for endpoint, skipping");
                            continue;
                        };

                        let Some(duration) = scene.duration else {
                            debug!(scene_id, "scene duration unknown, skipping");
                            continue;
                        };
                        let duration = duration as i64;

                        if let Some(checksum) = &scene.checksum {
                            submissions.push(FingerprintSubmission {
                                scene_id: remote_scene_id.clone(),
                                fingerprint: FingerprintInput {
                                    hash: checksum.clone(),
                                    algorithm: FingerprintAlgorithm::Md5,
                                    duration,
                                },
                            });
                        }

                        if let Some(oshash) = &scene.oshash {
                            submissions.push(FingerprintSubmission {
                                scene_id: remote_scene_id.clone(),
                                fingerprint: FingerprintInput {
                                    hash: oshash.clone(),
                                    algorithm: FingerprintAlgorithm::Oshash,
                                    duration,
                                },
                            });
                        }

                        if let Some(phash) = scene.phash {
                            submissions.push(FingerprintSubmission {
                                scene_id: remote_scene_id,
                                fingerprint: FingerprintInput {
                                    hash: fingerprint::phash_to_string(phash),
                                    algorithm: FingerprintAlgorithm::Phash,
                                    duration,
                                },
                            });
                        }
                    }

                    Ok(submissions)
                })
            })
            .await?;

        info!(count = submissions.len(), "submitting fingerprints");

        for submission in &submissions {
            self.submit_fingerprint(cancel, submission).await?;
        }

        Ok(true)
    }

    /// Search the registry for each local performer by name. The result's
    /// query key is the performer's decimal local id.
    pub async fn query_performers(
        &self,
        cancel: &CancellationToken,
        performer_ids: &[i64],
    ) -> Result<Vec<PerformerQueryResult>> {
        let ids = performer_ids.to_vec();
        let local: Vec<Performer> = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move {
                    let mut local = Vec::with_capacity(ids.len());
                    for performer_id in ids {
                        let performer =
                            performers::find(txn, performer_id).await?.ok_or(Error::NotFound {
                                entity: "performer",
                                id: performer_id,
                            })?;
                        if !performer.name.trim().is_empty() {
                            local.push(performer);
                        }
                    }
                    Ok(local)
                })
            })
            .await?;

        let mut results = Vec::with_capacity(local.len());
        for performer in local {
            let scraped = self.scraped_performer_search(cancel, &performer.name).await?;
            results.push(PerformerQueryResult {
                query: performer.id.to_string(),
                results: scraped,
            });
        }

        Ok(results)
    }

    /// Search the registry for performers by free-text term, wrapped with
    /// the term as the query key.
    pub async fn query_performers_by_term(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> Result<PerformerQueryResult> {
        let results = self.scraped_performer_search(cancel, term).await?;
        Ok(PerformerQueryResult {
            query: term.to_string(),
            results,
        })
    }

    /// Search the registry for scenes by free-text term, with local
    /// matching applied to the results.
    pub async fn query_scenes(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> Result<Vec<ScrapedScene>> {
        let fragments = self.search_scenes(cancel, term).await?;
        let mut scenes = Vec::with_capacity(fragments.len());
        for fragment in &fragments {
            scenes.push(self.scene_fragment_to_scraped(cancel, fragment).await?);
        }
        Ok(scenes)
    }

    /// Look up one remote performer by its registry id.
    pub async fn find_performer_by_remote_id(
        &self,
        cancel: &CancellationToken,
        remote_id: &str,
    ) -> Result<Option<ScrapedPerformer>> {
        let fragment = self.find_performer(cancel, remote_id).await?;
        Ok(fragment.as_ref().map(performer_fragment_to_scraped))
    }

    /// Find the remote performer whose name equals `name`, ignoring case.
    pub async fn find_performer_by_name(
        &self,
        cancel: &CancellationToken,
        name: &str,
    ) -> Result<Option<ScrapedPerformer>> {
        let fragments = self.search_performers(cancel, name).await?;
        Ok(fragments
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(performer_fragment_to_scraped))
    }

    async fn scraped_performer_search(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> Result<Vec<ScrapedPerformer>> {
        let fragments = self.search_performers(cancel, term).await?;
        Ok(fragments.iter().map(performer_fragment_to_scraped).collect())
    }
}

/// Fan returned remote scenes back in to the input positions they matched.
///
/// A remote scene contributes to an input when any of its fingerprints
/// matches that input exactly, or — for perceptual hashes — within
/// `max_distance` bits. Each remote scene lands on a given input at most
/// once, and remote discovery order is preserved per input.
fn correlate(
    input_count: usize,
    fp_to_scene: &HashMap<String, Vec<usize>>,
    phash_to_scene: &HashMap<i64, Vec<usize>>,
    remote: Vec<ScrapedScene>,
    max_distance: u32,
) -> Vec<Vec<ScrapedScene>> {
    let mut results: Vec<Vec<ScrapedScene>> = vec![Vec::new(); input_count];

    for scene in remote {
        let mut added_to: Vec<usize> = Vec::new();

        for fp in &scene.fingerprints {
            if let Some(positions) = fp_to_scene.get(&fp.hash) {
                for &position in positions {
                    if !added_to.contains(&position) {
                        added_to.push(position);
                    }
                }
            }

            // Perceptual matches are fuzzy; the registry does not say which
            // query hash produced a result, so compare against every input.
            if fp.algorithm == FingerprintAlgorithm::Phash.as_str() {
                let hash = match fingerprint::string_to_phash(&fp.hash) {
                    Ok(hash) => hash,
                    Err(err) => {
                        debug!(hash = %fp.hash, %err, "skipping undecodable remote phash");
                        continue;
                    }
                };

                for (&phash, positions) in phash_to_scene {
                    if fingerprint::matches_within(hash, phash, max_distance) {
                        for &position in positions {
                            if !added_to.contains(&position) {
                                added_to.push(position);
                            }
                        }
                    }
                }
            }
        }

        for &position in &added_to {
            results[position].push(scene.clone());
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use stash_common::models::StashBoxFingerprint;

    fn remote_scene(id: &str, fingerprints: Vec<StashBoxFingerprint>) -> ScrapedScene {
        ScrapedScene {
            remote_site_id: Some(id.to_string()),
            fingerprints,
            ..Default::default()
        }
    }

    fn fp(algorithm: &str, hash: &str) -> StashBoxFingerprint {
        StashBoxFingerprint {
            algorithm: algorithm.to_string(),
            hash: hash.to_string(),
            duration: 1200,
        }
    }

    #[test]
    fn test_correlate_exact_md5_hit() {
        let md5 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert(md5.to_string(), vec![0]);

        let remote = vec![remote_scene("r1", vec![fp("MD5", md5)])];
        let results = correlate(1, &fp_to_scene, &HashMap::new(), remote, 4);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].remote_site_id.as_deref(), Some("r1"));
    }

    #[test]
    fn test_correlate_fuzzy_phash_within_threshold() {
        // local phash 0, remote phash 0xF: distance 4 matches
        let mut phash_to_scene = HashMap::new();
        phash_to_scene.insert(0i64, vec![0]);
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert(fingerprint::phash_to_string(0), vec![0]);

        let remote = vec![remote_scene("r1", vec![fp("PHASH", "000000000000000f")])];
        let results = correlate(1, &fp_to_scene, &phash_to_scene, remote, 4);
        assert_eq!(results[0].len(), 1);

        // distance 5 does not
        let remote = vec![remote_scene("r1", vec![fp("PHASH", "000000000000001f")])];
        let results = correlate(1, &fp_to_scene, &phash_to_scene, remote, 4);
        assert!(results[0].is_empty());
    }

    #[test]
    fn test_correlate_shared_hash_lands_on_both_inputs() {
        let oshash = "bbbbbbbbbbbbbbbb";
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert(oshash.to_string(), vec![0, 1]);

        let remote = vec![remote_scene("r1", vec![fp("OSHASH", oshash)])];
        let results = correlate(2, &fp_to_scene, &HashMap::new(), remote, 4);

        assert_eq!(results[0].len(), 1);
        assert_eq!(results[1].len(), 1);
        assert_eq!(results[0][0].remote_site_id, results[1][0].remote_site_id);
    }

    #[test]
    fn test_correlate_deduplicates_per_remote_scene() {
        // One remote scene matches the same input through two algorithms.
        let md5 = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
        let oshash = "bbbbbbbbbbbbbbbb";
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert(md5.to_string(), vec![0]);
        fp_to_scene.insert(oshash.to_string(), vec![0]);

        let remote = vec![remote_scene("r1", vec![fp("MD5", md5), fp("OSHASH", oshash)])];
        let results = correlate(1, &fp_to_scene, &HashMap::new(), remote, 4);

        assert_eq!(results[0].len(), 1);
    }

    #[test]
    fn test_correlate_malformed_remote_phash_is_skipped() {
        let mut phash_to_scene = HashMap::new();
        phash_to_scene.insert(0i64, vec![0]);

        let remote = vec![remote_scene(
            "r1",
            vec![fp("PHASH", "not-a-phash"), fp("PHASH", "0000000000000001")],
        )];
        let results = correlate(1, &HashMap::new(), &phash_to_scene, remote, 4);

        // the malformed hash is ignored, the valid one still matches
        assert_eq!(results[0].len(), 1);
    }

    #[test]
    fn test_correlate_preserves_input_and_discovery_order() {
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert("hash-a".to_string(), vec![0]);
        fp_to_scene.insert("hash-b".to_string(), vec![1]);

        let remote = vec![
            remote_scene("r1", vec![fp("MD5", "hash-b")]),
            remote_scene("r2", vec![fp("MD5", "hash-a")]),
            remote_scene("r3", vec![fp("MD5", "hash-b")]),
        ];
        let results = correlate(2, &fp_to_scene, &HashMap::new(), remote, 4);

        assert_eq!(results[0].len(), 1);
        assert_eq!(results[0][0].remote_site_id.as_deref(), Some("r2"));
        let ids: Vec<_> = results[1]
            .iter()
            .map(|s| s.remote_site_id.as_deref().unwrap())
            .collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }

    #[test]
    fn test_correlate_unmatched_remote_scene_is_dropped() {
        let mut fp_to_scene = HashMap::new();
        fp_to_scene.insert("known".to_string(), vec![0]);

        let remote = vec![remote_scene("r1", vec![fp("MD5", "unknown")])];
        let results = correlate(1, &fp_to_scene, &HashMap::new(), remote, 4);

        assert!(results[0].is_empty());
    }

    #[test]
    fn test_fingerprint_index_collects_all_algorithms() {
        let scene = stash_common::models::Scene {
            id: 1,
            checksum: Some("aa".repeat(16)),
            oshash: Some("bb".repeat(8)),
            phash: Some(-1),
            ..Default::default()
        };

        let mut index = FingerprintIndex::default();
        index.add_scene(0, &scene);

        assert_eq!(index.queries.len(), 3);
        assert_eq!(index.fp_to_scene.len(), 3);
        assert_eq!(index.phash_to_scene.len(), 1);
        assert_eq!(
            index.queries[2],
            FingerprintQueryInput {
                hash: "ffffffffffffffff".to_string(),
                algorithm: FingerprintAlgorithm::Phash,
            }
        );
    }
}
