//! External suitability scoring, run through a bounded worker pool.
//!
//! The pool width is the rate limit: with the default of one, requests go
//! out strictly one after another.

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::catalog::CatalogItem;
use crate::collaborators::SuitabilityScorer;
use crate::context::ContextSnapshot;

/// Score every item that has no suitability yet. Returns how many items
/// received a score.
///
/// A failed request stores `0.0` so the item is not asked about again this
/// session; an empty answer leaves the item unscored.
pub async fn score_catalog(
    catalog: &mut [CatalogItem],
    context: &ContextSnapshot,
    scorer: &dyn SuitabilityScorer,
    concurrency: usize,
) -> usize {
    let width = concurrency.max(1);
    let results: Vec<(usize, Option<f64>)> = stream::iter(
        catalog
            .iter()
            .enumerate()
            .filter(|(_, item)| item.suitability.is_none()),
    )
    .map(|(idx, item)| async move {
        let score = match scorer.suitability_score(context, item).await {
            Ok(Some(score)) if score.is_finite() => Some(score),
            Ok(Some(score)) => {
                warn!(item = %item.id, score, "non-finite suitability score, using 0");
                Some(0.0)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(item = %item.id, error = %err, "suitability scoring failed, using 0");
                Some(0.0)
            }
        };
        (idx, score)
    })
    .buffered(width)
    .collect()
    .await;

    let mut scored = 0;
    for (idx, score) in results {
        if let Some(score) = score {
            debug!(item = %catalog[idx].id, score, "suitability stored");
            catalog[idx].suitability = Some(score);
            scored += 1;
        }
    }
    info!(scored, width, "external suitability pass complete");
    scored
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::error::{NpError, Result};

    #[derive(Default)]
    struct TrackingScorer {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl SuitabilityScorer for TrackingScorer {
        async fn suitability_score(
            &self,
            _context: &ContextSnapshot,
            item: &CatalogItem,
        ) -> Result<Option<f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            match item.title.as_str() {
                "broken" => Err(NpError::Collaborator("503".into())),
                "silent" => Ok(None),
                _ => Ok(Some(item.title.len() as f64)),
            }
        }
    }

    fn catalog(titles: &[&str]) -> Vec<CatalogItem> {
        titles.iter().map(|t| CatalogItem::new(*t, &[])).collect()
    }

    #[tokio::test]
    async fn default_width_is_sequential() {
        let scorer = TrackingScorer::default();
        let mut items = catalog(&["a", "bb", "ccc", "dddd"]);
        let scored = score_catalog(&mut items, &ContextSnapshot::default(), &scorer, 1).await;
        assert_eq!(scored, 4);
        assert_eq!(scorer.peak.load(Ordering::SeqCst), 1);
        assert_eq!(items[2].suitability, Some(3.0));
    }

    #[tokio::test]
    async fn wider_pool_overlaps_requests() {
        let scorer = TrackingScorer::default();
        let mut items = catalog(&["a", "bb", "ccc", "dddd"]);
        score_catalog(&mut items, &ContextSnapshot::default(), &scorer, 3).await;
        let peak = scorer.peak.load(Ordering::SeqCst);
        assert!(peak > 1 && peak <= 3, "peak was {peak}");
    }

    #[tokio::test]
    async fn failures_become_zero_and_silence_stays_unscored() {
        let scorer = TrackingScorer::default();
        let mut items = catalog(&["broken", "silent", "ok"]);
        let scored = score_catalog(&mut items, &ContextSnapshot::default(), &scorer, 1).await;
        assert_eq!(scored, 2);
        assert_eq!(items[0].suitability, Some(0.0));
        assert_eq!(items[1].suitability, None);
        assert_eq!(items[2].suitability, Some(2.0));
    }

    #[tokio::test]
    async fn already_scored_items_are_skipped() {
        let scorer = TrackingScorer::default();
        let mut items = vec![
            CatalogItem::new("known", &[]).with_suitability(9.0),
            CatalogItem::new("new", &[]),
        ];
        score_catalog(&mut items, &ContextSnapshot::default(), &scorer, 1).await;
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(items[0].suitability, Some(9.0));
    }
}
