use std::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One matching row, already resolved to its key's display form.
///
/// Hits order by `tier` first, then `score`. Both follow the FTS5 `bm25()`
/// convention: lower is more relevant.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Id of the key's oldest row; it also supplies `key`.
    pub first_id: i64,
    pub key: String,
    pub key_norm: String,
    pub tier: u8,
    pub score: f64,
}

/// Best hit seen for one key.
#[derive(Debug)]
struct RankedKey {
    key: String,
    first_id: i64,
    tier: u8,
    score: f64,
}

impl RankedKey {
    fn cmp_relevance(&self, other: &Self) -> Ordering {
        self.tier
            .cmp(&other.tier)
            .then(self.score.partial_cmp(&other.score).unwrap_or(Ordering::Equal))
    }

    fn absorb(&mut self, hit: Hit) {
        let candidate = RankedKey::from(hit);
        if candidate.cmp_relevance(self) == Ordering::Less {
            self.tier = candidate.tier;
            self.score = candidate.score;
        }
    }
}

impl From<Hit> for RankedKey {
    fn from(hit: Hit) -> Self {
        Self {
            key: hit.key,
            first_id: hit.first_id,
            tier: hit.tier,
            score: hit.score,
        }
    }
}

/// Collapse row hits into distinct keys, each keeping its best hit, and
/// return the top `limit` keys best first.
///
/// Ties are broken by insertion order so results are stable.
pub fn best_per_key<I>(hits: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = Hit>,
{
    let mut best: HashMap<String, RankedKey> = HashMap::new();

    for hit in hits {
        match best.entry(hit.key_norm.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().absorb(hit),
            Entry::Vacant(slot) => {
                slot.insert(RankedKey::from(hit));
            }
        }
    }

    let mut ranked: Vec<RankedKey> = best.into_values().collect();
    ranked.sort_by(|a, b| a.cmp_relevance(b).then(a.first_id.cmp(&b.first_id)));
    ranked.truncate(limit);
    ranked.into_iter().map(|r| r.key).collect()
}
