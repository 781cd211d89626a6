//! Content plan: which topic, length bucket and word budget each iteration
//! gets.
//!
//! The plan depends on the iteration count only. Both indexes in a comparison
//! receive the same plan, so the only difference between their corpora is the
//! seeded wording.

use std::f64::consts::PI;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::catalog::{Topic, TOPICS};
use crate::error::{BenchError, BenchResult};

pub const MIN_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Short,
    Medium,
    Long,
}

impl Bucket {
    /// Minimum number of body sentences a document in this bucket gets.
    pub fn min_sentences(self) -> usize {
        match self {
            Self::Short => 5,
            Self::Medium => 7,
            Self::Long => 10,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Medium => write!(f, "medium"),
            Self::Long => write!(f, "long"),
        }
    }
}

/// Oscillator and word-budget coefficients.
///
/// `wave = sin(t·π·slow) + fast_gain·sin(t·π·fast)` with `t = i / n`. Each
/// bucket rescales its own slice of the wave range and maps it onto
/// `base + round(offset · scale)`, where `offset = (wave − start) / span`.
/// The slices start at `short_floor`, `short_below` and `medium_below`.
///
/// Spans are independent of the edges. The default budgets depend on these
/// exact literals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthProfile {
    pub slow_freq: f64,
    pub fast_freq: f64,
    pub fast_gain: f64,
    pub short_floor: f64,
    pub short_below: f64,
    pub medium_below: f64,
    pub short_span: f64,
    pub medium_span: f64,
    pub long_span: f64,
    pub short_base: usize,
    pub short_scale: f64,
    pub medium_base: usize,
    pub medium_scale: f64,
    pub long_base: usize,
    pub long_scale: f64,
}

pub const DEFAULT_PROFILE: LengthProfile = LengthProfile {
    slow_freq: 5.0,
    fast_freq: 17.0,
    fast_gain: 0.4,
    short_floor: -1.35,
    short_below: -0.35,
    medium_below: 0.45,
    short_span: 1.0,
    medium_span: 0.8,
    long_span: 0.95,
    short_base: 18,
    short_scale: 10.0,
    medium_base: 34,
    medium_scale: 18.0,
    long_base: 62,
    long_scale: 40.0,
};

impl LengthProfile {
    pub fn wave(&self, i: usize, n: usize) -> f64 {
        let t = i as f64 / n as f64;
        (t * PI * self.slow_freq).sin() + self.fast_gain * (t * PI * self.fast_freq).sin()
    }

    pub fn bucket(&self, wave: f64) -> Bucket {
        if wave < self.short_below {
            Bucket::Short
        } else if wave < self.medium_below {
            Bucket::Medium
        } else {
            Bucket::Long
        }
    }

    pub fn target_word_count(&self, bucket: Bucket, wave: f64) -> usize {
        let (base, offset) = match bucket {
            Bucket::Short => (
                self.short_base,
                ((wave - self.short_floor) / self.short_span) * self.short_scale,
            ),
            Bucket::Medium => (
                self.medium_base,
                ((wave - self.short_below) / self.medium_span) * self.medium_scale,
            ),
            Bucket::Long => (
                self.long_base,
                ((wave - self.medium_below) / self.long_span) * self.long_scale,
            ),
        };
        let adjusted = base as f64 + round_half_up(offset);
        adjusted.max(0.0) as usize
    }
}

/// Round half toward positive infinity. `f64::round` rounds half away from
/// zero, which shifts negative halves and therefore the word budgets.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanItem {
    pub iteration: usize,
    pub topic: &'static Topic,
    pub bucket: Bucket,
    pub target_word_count: usize,
    pub canonical_query: &'static str,
    pub synonym_query: &'static str,
    pub related_query: &'static str,
}

impl Serialize for PlanItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("PlanItem", 7)?;
        s.serialize_field("iteration", &self.iteration)?;
        s.serialize_field("topic", self.topic.id)?;
        s.serialize_field("bucket", &self.bucket)?;
        s.serialize_field("targetWordCount", &self.target_word_count)?;
        s.serialize_field("canonicalQuery", self.canonical_query)?;
        s.serialize_field("synonymQuery", self.synonym_query)?;
        s.serialize_field("relatedQuery", self.related_query)?;
        s.end()
    }
}

/// Build the plan for `iterations` documents with the default profile.
pub fn build_plan(iterations: usize) -> BenchResult<Vec<PlanItem>> {
    build_plan_with(iterations, &DEFAULT_PROFILE)
}

pub fn build_plan_with(iterations: usize, profile: &LengthProfile) -> BenchResult<Vec<PlanItem>> {
    if iterations < MIN_ITERATIONS {
        return Err(BenchError::Config(format!(
            "--iterations must be at least {MIN_ITERATIONS}, got {iterations}"
        )));
    }

    let plan = (0..iterations)
        .map(|i| {
            let topic = &TOPICS[i % TOPICS.len()];
            let wave = profile.wave(i, iterations);
            let bucket = profile.bucket(wave);
            PlanItem {
                iteration: i,
                topic,
                bucket,
                target_word_count: profile.target_word_count(bucket, wave),
                canonical_query: topic.canonical,
                synonym_query: topic.synonyms[i % topic.synonyms.len()],
                related_query: topic.related[i % topic.related.len()],
            }
        })
        .collect();
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_small_iteration_counts() {
        let err = build_plan(9).unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
        assert!(err.to_string().contains("at least 10"));
        assert!(build_plan(0).is_err());
        assert!(build_plan(10).is_ok());
    }

    #[test]
    fn test_ten_items_cycle_topics_in_order() {
        let plan = build_plan(10).unwrap();
        assert_eq!(plan.len(), 10);
        for (i, item) in plan.iter().enumerate() {
            assert_eq!(item.iteration, i);
            assert_eq!(item.topic.id, TOPICS[i].id);
        }
    }

    #[test]
    fn test_first_item_is_medium() {
        let plan = build_plan(10).unwrap();
        assert_eq!(DEFAULT_PROFILE.wave(0, 10), 0.0);
        assert_eq!(plan[0].bucket, Bucket::Medium);
        assert_eq!(plan[0].target_word_count, 42);
        assert_eq!(plan[0].synonym_query, "replica coordination");
        assert_eq!(plan[0].related_query, "raft");
    }

    #[test]
    fn test_matches_reference_plan() {
        let plan = build_plan(10).unwrap();
        let got: Vec<(&str, Bucket, usize)> = plan
            .iter()
            .map(|p| (p.topic.id, p.bucket, p.target_word_count))
            .collect();
        assert_eq!(
            got,
            vec![
                ("distributed-systems", Bucket::Medium, 42),
                ("neural-memory", Bucket::Long, 72),
                ("database-indexing", Bucket::Short, 28),
                ("observability", Bucket::Short, 20),
                ("ml-pipelines", Bucket::Medium, 47),
                ("privacy-security", Bucket::Long, 102),
                ("edge-computing", Bucket::Medium, 47),
                ("reliability", Bucket::Short, 20),
                ("semantic-search", Bucket::Short, 28),
                ("event-streaming", Bucket::Long, 72),
            ]
        );
        assert_eq!(plan[9].synonym_query, "stream processing");
        assert_eq!(plan[9].related_query, "consumer lag");
    }

    #[test]
    fn test_bucket_distribution_for_large_plan() {
        let plan = build_plan(500).unwrap();
        let count = |b: Bucket| plan.iter().filter(|p| p.bucket == b).count();
        assert_eq!(count(Bucket::Short), 164);
        assert_eq!(count(Bucket::Medium), 131);
        assert_eq!(count(Bucket::Long), 205);
    }

    #[test]
    fn test_plan_is_deterministic() {
        assert_eq!(build_plan(137).unwrap(), build_plan(137).unwrap());
    }

    #[test]
    fn test_bucket_boundaries() {
        let p = DEFAULT_PROFILE;
        assert_eq!(p.bucket(-0.36), Bucket::Short);
        assert_eq!(p.bucket(-0.35), Bucket::Medium);
        assert_eq!(p.bucket(0.0), Bucket::Medium);
        assert_eq!(p.bucket(0.449), Bucket::Medium);
        assert_eq!(p.bucket(0.45), Bucket::Long);
    }

    #[test]
    fn test_target_word_count_ranges() {
        let p = DEFAULT_PROFILE;
        assert_eq!(p.target_word_count(Bucket::Short, -0.35), 28);
        assert_eq!(p.target_word_count(Bucket::Medium, -0.35), 34);
        assert_eq!(p.target_word_count(Bucket::Medium, 0.45), 52);
        assert_eq!(p.target_word_count(Bucket::Long, 0.45), 62);
        assert_eq!(p.target_word_count(Bucket::Long, 1.4), 102);
    }

    #[test]
    fn test_custom_profile_moves_word_budgets_with_edges() {
        let p = LengthProfile {
            short_floor: -2.0,
            short_below: 0.0,
            medium_below: 0.5,
            short_span: 2.0,
            medium_span: 0.5,
            long_span: 1.0,
            ..DEFAULT_PROFILE
        };
        assert_eq!(p.bucket(-0.2), Bucket::Short);
        assert_eq!(p.bucket(0.2), Bucket::Medium);
        // Each slice starts at its base and ends at base + scale.
        assert_eq!(p.target_word_count(Bucket::Short, -2.0), 18);
        assert_eq!(p.target_word_count(Bucket::Short, -1.0), 23);
        assert_eq!(p.target_word_count(Bucket::Short, 0.0), 28);
        assert_eq!(p.target_word_count(Bucket::Medium, 0.0), 34);
        assert_eq!(p.target_word_count(Bucket::Medium, 0.5), 52);
        assert_eq!(p.target_word_count(Bucket::Long, 0.5), 62);
        assert_eq!(p.target_word_count(Bucket::Long, 1.5), 102);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-0.5), 0.0);
        assert_eq!(round_half_up(-0.6), -1.0);
    }
}
