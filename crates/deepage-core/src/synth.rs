//! Document synthesizer: turns a plan item and a PRNG stream into a
//! multi-sentence document with machine-checkable ground-truth markers.
//!
//! The order of PRNG draws below is part of the reproducibility contract.
//! Moving a `pick` changes every document that follows it.

use serde::Serialize;

use crate::catalog::{
    other_topics, KnowledgeEntity, Topic, ACTORS, BOOKS, CONNECTORS, DATA_POINTS, FILLER_PHRASES,
    FILMS, ID_PREFIXES, LOCATIONS, OBJECTS, QUALIFIERS, SYLLABLES, TIME_WINDOWS, TRANSITIONS,
    VERBS,
};
use crate::plan::PlanItem;
use crate::rng::Mulberry32;

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Lowercase ASCII slug: runs of anything outside `[a-z0-9]` collapse to a
/// single `-`, leading and trailing dashes are dropped.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;
    for c in value.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn marker(tag: &str, value: &str) -> String {
    format!("[{tag}:{}]", slugify(value))
}

/// Whitespace-separated token count.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Case-insensitive marker check. Markers are lowercase by construction.
pub fn contains_marker(content: &str, marker: &str) -> bool {
    content.to_lowercase().contains(&marker.to_lowercase())
}

// ---------------------------------------------------------------------------
// Synthetic tokens
// ---------------------------------------------------------------------------

/// Pronounceable nonsense word built from 2-4 (or `min..=max`) syllables.
pub fn syllable_token(rng: &mut Mulberry32, min_syllables: u32, max_syllables: u32) -> String {
    let count = rng.range_inclusive(min_syllables, max_syllables);
    (0..count).map(|_| *rng.pick(SYLLABLES)).collect()
}

/// Reference code such as `delta-shicai-9946`.
pub fn reference_code(rng: &mut Mulberry32) -> String {
    let prefix = rng.pick(ID_PREFIXES);
    let token = syllable_token(rng, 2, 3);
    let number = rng.range_inclusive(1000, 9999);
    format!("{prefix}-{token}-{number}")
}

// ---------------------------------------------------------------------------
// Knowledge bundle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeMarkers {
    pub movie: String,
    pub actor: String,
    pub book: String,
    pub author: String,
    pub movie_topic: String,
    pub book_topic: String,
}

impl KnowledgeMarkers {
    pub fn all(&self) -> [&str; 6] {
        [
            self.movie.as_str(),
            self.actor.as_str(),
            self.book.as_str(),
            self.author.as_str(),
            self.movie_topic.as_str(),
            self.book_topic.as_str(),
        ]
    }
}

/// One film and one book sampled from the two catalogs, the attributes the
/// document focuses on, and a question cross-referencing both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeBundle {
    pub movie: &'static KnowledgeEntity,
    pub book: &'static KnowledgeEntity,
    pub actor_focus: &'static str,
    pub movie_topic_focus: &'static str,
    pub book_topic_focus: &'static str,
    pub context_question: String,
    pub markers: KnowledgeMarkers,
}

impl KnowledgeBundle {
    pub fn author(&self) -> &'static str {
        self.book.contributors[0]
    }
}

fn build_knowledge_bundle(rng: &mut Mulberry32) -> KnowledgeBundle {
    let movie = rng.pick(FILMS);
    let book = rng.pick(BOOKS);
    let actor_focus = *rng.pick(movie.contributors);
    let movie_topic_focus = *rng.pick(movie.topics);
    let book_topic_focus = *rng.pick(book.topics);
    let author = book.contributors[0];

    let context_question = match rng.range_inclusive(0, 3) {
        0 => format!(
            "Which actor is associated with {} and which author wrote {}?",
            movie.title, book.title
        ),
        1 => format!(
            "How does {movie_topic_focus} in {} relate to {book_topic_focus} in {}?",
            movie.title, book.title
        ),
        2 => format!(
            "Who appears in {} and what core topic does {} discuss?",
            movie.title, book.title
        ),
        _ => format!(
            "Compare {} ({actor_focus}) with {} by {author} using their main themes.",
            movie.title, book.title
        ),
    };

    KnowledgeBundle {
        movie,
        book,
        actor_focus,
        movie_topic_focus,
        book_topic_focus,
        context_question,
        markers: KnowledgeMarkers {
            movie: marker("movie", movie.title),
            actor: marker("actor", actor_focus),
            book: marker("book", book.title),
            author: marker("author", author),
            movie_topic: marker("movie-topic", movie_topic_focus),
            book_topic: marker("book-topic", book_topic_focus),
        },
    }
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

fn nth<'a>(items: &'a [&'a str], i: usize) -> &'a str {
    items[i % items.len()]
}

/// One templated body sentence. All word-bank draws happen up front, then a
/// template is picked; some templates draw again while formatting.
fn body_sentence(
    rng: &mut Mulberry32,
    item: &PlanItem,
    index_label: &str,
    sentence_index: usize,
) -> String {
    let topic = item.topic;
    let si = sentence_index;

    let actor = rng.pick(ACTORS);
    let verb = rng.pick(VERBS);
    let object = rng.pick(OBJECTS);
    let qualifier = rng.pick(QUALIFIERS);
    let location = rng.pick(LOCATIONS);
    let filler = rng.pick(FILLER_PHRASES);
    let data_a = rng.pick(DATA_POINTS);
    let data_b = rng.pick(DATA_POINTS);
    let connector = rng.pick(CONNECTORS);
    let window = rng.pick(TIME_WINDOWS);
    let others = other_topics(topic.id);
    let cross: &Topic = *rng.pick(&others);
    let reference = reference_code(rng);
    let ratio = format!(
        "{}:{}",
        rng.range_inclusive(7, 93),
        rng.range_inclusive(5, 99)
    );

    match rng.range_inclusive(0, 7) {
        0 => format!(
            "{actor} {qualifier} {verb} {object} {filler}, and keeps {} connected to {} through {}.",
            topic.canonical,
            nth(topic.synonyms, si),
            nth(topic.related, si)
        ),
        1 => {
            let transition = rng.pick(TRANSITIONS);
            format!(
                "{transition} {location}, {actor} {verb} {data_a} {window}, {connector} the run cross-checks {} against {} with marker {reference}.",
                topic.canonical, cross.canonical
            )
        }
        2 => format!(
            "Field note {reference}: {actor} {verb} {object} using ratio {ratio}; this paragraph mentions {}, {}, and {} to avoid rigid phrasing.",
            topic.canonical,
            nth(topic.related, si + 1),
            nth(topic.synonyms, si + 1)
        ),
        3 => format!(
            "\"{} should stay retrievable even when phrasing drifts,\" wrote {actor}, who then {verb} {data_b} {window} {connector} compared it with {}.",
            topic.canonical,
            nth(cross.synonyms, si)
        ),
        4 => {
            let data_c = rng.pick(DATA_POINTS);
            format!(
                "Operational checklist {reference} records {data_a}, {data_b}, and {data_c}; {actor} {qualifier} {verb} {object} {filler}."
            )
        }
        5 => format!(
            "If a query asks about {}, the benchmark still expects memory of {}; therefore {actor} {verb} {object} {window}.",
            nth(topic.related, si + 2),
            topic.canonical
        ),
        6 => {
            let segment = rng.range_inclusive(2, 11);
            let neighbor = syllable_token(rng, 2, 4);
            format!(
                "Comparative segment {segment} links {} with {} while intentionally injecting neighbor terms like {} and {neighbor}.",
                topic.canonical,
                nth(topic.synonyms, si + 2),
                nth(cross.related, si + 2)
            )
        }
        _ => {
            let transition = rng.pick(TRANSITIONS);
            let tag = syllable_token(rng, 2, 4);
            format!(
                "{transition}, {actor} {verb} {object} {connector} annotates {data_a}; in this turn the content embeds {}, {}, and the synthetic tag {index_label}-{tag}.",
                topic.canonical,
                nth(topic.synonyms, si)
            )
        }
    }
}

/// Sentence naming a different topic outright, to tempt shallow keyword
/// matching into false positives.
fn distractor_sentence(rng: &mut Mulberry32, item: &PlanItem, sentence_index: usize) -> String {
    let others = other_topics(item.topic.id);
    let distractor = rng.pick(&others);
    let reference = reference_code(rng);
    format!(
        "Context drift sample {reference} adds neighboring vocabulary such as {}, {}, and {} to challenge shallow keyword matching.",
        distractor.canonical,
        nth(distractor.synonyms, sentence_index),
        nth(distractor.related, sentence_index)
    )
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    pub content: String,
    pub unique_token: String,
    pub topic_marker: String,
    pub knowledge: KnowledgeBundle,
    pub sentence_count: usize,
    pub word_count: usize,
}

impl RenderedDocument {
    /// Every marker embedded in the content.
    pub fn markers(&self) -> Vec<&str> {
        let mut all = vec![self.topic_marker.as_str()];
        all.extend(self.knowledge.markers.all());
        all
    }
}

/// Accumulates sentences and tracks the running word count.
struct Body {
    sentences: Vec<String>,
    words: usize,
}

impl Body {
    fn new() -> Self {
        Self {
            sentences: Vec::new(),
            words: 0,
        }
    }

    fn push(&mut self, sentence: String) {
        self.words += word_count(&sentence);
        self.sentences.push(sentence);
    }
}

/// Render one document for `item`. The caller owns the PRNG so consecutive
/// documents in a run continue the same stream.
pub fn render_document(
    item: &PlanItem,
    index_label: &str,
    rng: &mut Mulberry32,
) -> RenderedDocument {
    let topic = item.topic;
    let serial = rng.range_inclusive(100_000, 999_999);
    let unique_token = format!(
        "{index_label}-{}-{serial}-{}",
        item.iteration,
        syllable_token(rng, 2, 4)
    );
    let topic_marker = topic.marker();
    let knowledge = build_knowledge_bundle(rng);

    let mut body = Body::new();
    body.push(format!(
        "{}, this record focuses on {}, references {}, links {}, and intentionally varies structure to reduce template overfitting pressure.",
        rng.pick(TRANSITIONS),
        topic.canonical,
        item.synonym_query,
        item.related_query
    ));
    body.push(format!(
        "Film list item: \"{}\" starring {} explores {}.",
        knowledge.movie.title,
        knowledge.movie.contributors.join(", "),
        knowledge.movie.topics.join(", ")
    ));
    body.push(format!(
        "Book list item: \"{}\" by {} discusses {}.",
        knowledge.book.title,
        knowledge.author(),
        knowledge.book.topics.join(", ")
    ));
    body.push(format!("Context prompt: {}", knowledge.context_question));

    let min_sentences = item.bucket.min_sentences();
    let mut sentence_index = 0;
    while sentence_index < min_sentences || body.words < item.target_word_count {
        body.push(body_sentence(rng, item, index_label, sentence_index));
        if sentence_index > 0 && sentence_index % 3 == 0 {
            body.push(distractor_sentence(rng, item, sentence_index));
        }
        sentence_index += 1;
    }

    body.push(format!(
        "Unique marker {unique_token} {topic_marker} canonical:{} synonym:{} related:{}.",
        topic.canonical, item.synonym_query, item.related_query
    ));
    body.push(format!(
        "Knowledge markers {}.",
        knowledge.markers.all().join(" ")
    ));

    RenderedDocument {
        sentence_count: body.sentences.len(),
        word_count: body.words,
        content: body.sentences.join(" "),
        unique_token,
        topic_marker,
        knowledge,
    }
}

// ---------------------------------------------------------------------------
// Query specs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryKind {
    TopicCanonical,
    TopicSynonym,
    TopicRelated,
    MovieTitle,
    MovieActor,
    MovieTopic,
    BookTitle,
    BookAuthor,
    BookTopic,
    ContextQuestion,
}

impl QueryKind {
    /// Entity-level queries (films, books, the cross-reference question).
    pub fn is_contextual(self) -> bool {
        !matches!(
            self,
            Self::TopicCanonical | Self::TopicSynonym | Self::TopicRelated
        )
    }
}

/// A query derived from one document plus the markers a hit must carry to
/// count as relevant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub kind: QueryKind,
    pub query: String,
    pub expected_markers: Vec<String>,
}

impl QuerySpec {
    fn new(kind: QueryKind, query: impl Into<String>, expected_markers: &[&str]) -> Self {
        Self {
            kind,
            query: query.into(),
            expected_markers: expected_markers.iter().map(|m| m.to_string()).collect(),
        }
    }
}

pub fn query_specs(item: &PlanItem, doc: &RenderedDocument) -> Vec<QuerySpec> {
    let k = &doc.knowledge;
    let m = &k.markers;
    let topic = doc.topic_marker.as_str();
    vec![
        QuerySpec::new(QueryKind::TopicCanonical, item.canonical_query, &[topic]),
        QuerySpec::new(QueryKind::TopicSynonym, item.synonym_query, &[topic]),
        QuerySpec::new(QueryKind::TopicRelated, item.related_query, &[topic]),
        QuerySpec::new(QueryKind::MovieTitle, k.movie.title, &[m.movie.as_str()]),
        QuerySpec::new(
            QueryKind::MovieActor,
            k.actor_focus,
            &[m.movie.as_str(), m.actor.as_str()],
        ),
        QuerySpec::new(
            QueryKind::MovieTopic,
            k.movie_topic_focus,
            &[m.movie.as_str(), m.movie_topic.as_str()],
        ),
        QuerySpec::new(QueryKind::BookTitle, k.book.title, &[m.book.as_str()]),
        QuerySpec::new(
            QueryKind::BookAuthor,
            k.author(),
            &[m.book.as_str(), m.author.as_str()],
        ),
        QuerySpec::new(
            QueryKind::BookTopic,
            k.book_topic_focus,
            &[m.book.as_str(), m.book_topic.as_str()],
        ),
        QuerySpec::new(
            QueryKind::ContextQuestion,
            k.context_question.clone(),
            &[m.movie.as_str(), m.book.as_str()],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{build_plan, Bucket};

    /// Known-good first document for seed 42, label `alpha`, ten iterations.
    /// Any change to the catalog or the draw order shows up here.
    const REFERENCE_DOC_0: &str = include_str!("../testdata/seed42_alpha_doc0.txt");

    fn render_all(seed: u32, iterations: usize, label: &str) -> Vec<RenderedDocument> {
        let plan = build_plan(iterations).unwrap();
        let mut rng = Mulberry32::new(seed);
        plan.iter()
            .map(|item| render_document(item, label, &mut rng))
            .collect()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Blade Runner 2049"), "blade-runner-2049");
        assert_eq!(slugify("J K Simmons"), "j-k-simmons");
        assert_eq!(slugify("The Three-Body Problem"), "the-three-body-problem");
        assert_eq!(slugify("  --Hello, World!-- "), "hello-world");
        assert_eq!(slugify("São Paulo"), "s-o-paulo");
        assert_eq!(marker("movie-topic", "AI Ethics"), "[movie-topic:ai-ethics]");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("  one  two\tthree\n"), 3);
    }

    #[test]
    fn test_matches_reference_document() {
        let plan = build_plan(10).unwrap();
        let mut rng = Mulberry32::new(42);
        let doc = render_document(&plan[0], "alpha", &mut rng);
        assert_eq!(doc.unique_token, "alpha-0-640993-pracaizen");
        assert_eq!(doc.topic_marker, "[topic:distributed-systems]");
        assert_eq!(doc.knowledge.markers.movie, "[movie:ex-machina]");
        assert_eq!(doc.knowledge.markers.actor, "[actor:domhnall-gleeson]");
        assert_eq!(doc.knowledge.markers.author, "[author:yuval-noah-harari]");
        assert_eq!(
            doc.knowledge.context_question,
            "Which actor is associated with Ex Machina and which author wrote Sapiens?"
        );
        assert_eq!(doc.content, REFERENCE_DOC_0.trim_end());
        assert_eq!(doc.word_count, 324);

        let next = render_document(&plan[1], "alpha", &mut rng);
        assert_eq!(next.unique_token, "alpha-1-212420-alpex");
    }

    #[test]
    fn test_same_seed_byte_identical() {
        let a = render_all(42, 40, "alpha");
        let b = render_all(42, 40, "alpha");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seed_different_wording() {
        let a = render_all(42, 20, "alpha");
        let b = render_all(1337, 20, "alpha");
        let same = a.iter().zip(&b).filter(|(x, y)| x.content == y.content).count();
        assert_eq!(same, 0);
    }

    #[test]
    fn test_marker_integrity() {
        for doc in render_all(7, 60, "beta") {
            assert_eq!(doc.content.matches(&doc.unique_token).count(), 1);
            for m in doc.markers() {
                assert!(doc.content.contains(m), "missing {m}");
                assert_eq!(m, m.to_lowercase());
                assert!(contains_marker(&doc.content.to_uppercase(), m));
            }
        }
    }

    #[test]
    fn test_length_conformance() {
        let plan = build_plan(120).unwrap();
        let mut rng = Mulberry32::new(99);
        for item in &plan {
            let doc = render_document(item, "alpha", &mut rng);
            assert!(doc.word_count >= item.target_word_count);
            assert_eq!(doc.word_count, word_count(&doc.content));
            // intro + two facts + prompt + bucket minimum + two marker lines
            assert!(doc.sentence_count >= item.bucket.min_sentences() + 6);
        }
    }

    #[test]
    fn test_end_to_end_first_item() {
        let plan = build_plan(10).unwrap();
        let mut rng = Mulberry32::new(42);
        assert_eq!(plan[0].bucket, Bucket::Medium);
        let doc = render_document(&plan[0], "alpha", &mut rng);
        assert!(doc.sentence_count >= 7);
        assert!(doc.word_count >= 34);
    }

    #[test]
    fn test_query_specs_cover_document() {
        let plan = build_plan(30).unwrap();
        let mut rng = Mulberry32::new(5);
        for item in &plan {
            let doc = render_document(item, "alpha", &mut rng);
            let specs = query_specs(item, &doc);
            assert_eq!(specs.len(), 10);
            assert_eq!(specs.iter().filter(|s| s.kind.is_contextual()).count(), 7);
            for spec in &specs {
                assert!(!spec.query.is_empty());
                assert!(!spec.expected_markers.is_empty());
                for m in &spec.expected_markers {
                    assert!(doc.content.contains(m.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_query_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&QueryKind::ContextQuestion).unwrap();
        assert_eq!(json, "\"context-question\"");
    }
}
