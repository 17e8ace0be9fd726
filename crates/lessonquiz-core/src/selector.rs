//! Final test generation from a chapter's question pool.
//!
//! The stratified strategy first guarantees a minimum number of questions
//! per theory block, then fills up randomly, truncates when the minimums
//! overshoot, and shuffles once more so block grouping never shows in the
//! presentation order.

use std::collections::{BTreeMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SelectionError;
use crate::model::{Chapter, Question, SelectionStrategy};

/// Bucket for pool questions without a `theory_block_id`.
pub const UNKNOWN_BLOCK: &str = "unknown";

/// Generate a final test using the thread-local RNG.
pub fn generate_chapter_test(chapter: &Chapter) -> Result<Vec<Question>, SelectionError> {
    generate_chapter_test_with(chapter, &mut rand::rng())
}

/// Generate a final test with an explicit random source.
pub fn generate_chapter_test_with<R: Rng + ?Sized>(
    chapter: &Chapter,
    rng: &mut R,
) -> Result<Vec<Question>, SelectionError> {
    let (Some(config), Some(bank)) = (&chapter.chapter_test, &chapter.question_bank) else {
        return Err(SelectionError::MissingTestConfig {
            chapter_id: chapter.id.clone(),
        });
    };

    let pool_ids: HashSet<&str> = config
        .pool_question_ids
        .iter()
        .map(String::as_str)
        .collect();
    let mut seen = HashSet::new();
    let mut pool: Vec<&Question> = Vec::new();
    for q in &bank.questions {
        if pool_ids.contains(q.id.as_str()) && seen.insert(q.id.as_str()) {
            pool.push(q);
        }
    }

    let mut selected = match &config.selection_strategy {
        SelectionStrategy::StratifiedByTheoryBlock {
            min_per_theory_block,
            ..
        } => select_stratified(&pool, config.num_questions, *min_per_theory_block, rng),
        SelectionStrategy::Random => select_random(&pool, config.num_questions, rng),
    };

    selected.shuffle(rng);

    tracing::debug!(
        chapter = %chapter.id,
        pool = pool.len(),
        selected = selected.len(),
        "generated chapter test"
    );

    Ok(selected.into_iter().cloned().collect())
}

fn select_stratified<'a, R: Rng + ?Sized>(
    pool: &[&'a Question],
    num_questions: usize,
    min_per_block: usize,
    rng: &mut R,
) -> Vec<&'a Question> {
    let mut by_block: BTreeMap<&str, Vec<&'a Question>> = BTreeMap::new();
    for &q in pool {
        let block = q.theory_block_id.as_deref().unwrap_or(UNKNOWN_BLOCK);
        by_block.entry(block).or_default().push(q);
    }

    let mut selected: Vec<&'a Question> = Vec::new();
    for questions in by_block.values_mut() {
        questions.shuffle(rng);
        selected.extend(questions.iter().take(min_per_block));
    }

    if selected.len() < num_questions {
        let taken: HashSet<&str> = selected.iter().map(|q| q.id.as_str()).collect();
        let mut remaining: Vec<&'a Question> = pool
            .iter()
            .copied()
            .filter(|q| !taken.contains(q.id.as_str()))
            .collect();
        remaining.shuffle(rng);
        let needed = num_questions - selected.len();
        selected.extend(remaining.into_iter().take(needed));
    }

    if selected.len() > num_questions {
        selected.shuffle(rng);
        selected.truncate(num_questions);
    }

    selected
}

fn select_random<'a, R: Rng + ?Sized>(
    pool: &[&'a Question],
    num_questions: usize,
    rng: &mut R,
) -> Vec<&'a Question> {
    let mut shuffled = pool.to_vec();
    shuffled.shuffle(rng);
    shuffled.truncate(num_questions.min(pool.len()));
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterTestConfig, QuestionBank, QuestionBody};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{BTreeMap, HashMap};

    fn question(id: &str, block: Option<&str>) -> Question {
        Question {
            id: id.into(),
            prompt: format!("prompt {id}"),
            difficulty: 1,
            theory_block_id: block.map(String::from),
            explanation: None,
            body: QuestionBody::FillBlank {
                correct: "x".into(),
            },
        }
    }

    fn chapter(
        questions: Vec<Question>,
        pool: &[&str],
        num_questions: usize,
        strategy: SelectionStrategy,
    ) -> Chapter {
        Chapter {
            id: "ch1".into(),
            section_id: None,
            title: None,
            title_short: None,
            order: None,
            level: None,
            estimated_minutes: None,
            description: None,
            blocks: vec![],
            question_bank: Some(QuestionBank {
                questions,
                rejected: vec![],
            }),
            chapter_test: Some(ChapterTestConfig {
                num_questions,
                pool_question_ids: pool.iter().map(|s| s.to_string()).collect(),
                selection_strategy: strategy,
            }),
        }
    }

    fn stratified(min: usize) -> SelectionStrategy {
        SelectionStrategy::StratifiedByTheoryBlock {
            min_per_theory_block: min,
            difficulty_mix: BTreeMap::new(),
        }
    }

    fn block_counts(questions: &[Question]) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for q in questions {
            *counts
                .entry(q.theory_block_id.clone().unwrap_or_default())
                .or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn two_blocks_of_three_with_minimum_two() {
        let questions = vec![
            question("a1", Some("A")),
            question("a2", Some("A")),
            question("a3", Some("A")),
            question("b1", Some("B")),
            question("b2", Some("B")),
            question("b3", Some("B")),
        ];
        let ids = ["a1", "a2", "a3", "b1", "b2", "b3"];
        let ch = chapter(questions, &ids, 4, stratified(2));

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let test = generate_chapter_test_with(&ch, &mut rng).unwrap();
            assert_eq!(test.len(), 4);
            let counts = block_counts(&test);
            assert_eq!(counts["A"], 2);
            assert_eq!(counts["B"], 2);
            let unique: HashSet<&str> = test.iter().map(|q| q.id.as_str()).collect();
            assert_eq!(unique.len(), 4);
        }
    }

    #[test]
    fn covers_every_block_when_room_allows() {
        let mut questions = Vec::new();
        let mut ids = Vec::new();
        for block in ["A", "B", "C", "D"] {
            for i in 0..3 {
                let id = format!("{block}{i}");
                questions.push(question(&id, Some(block)));
                ids.push(id);
            }
        }
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let ch = chapter(questions, &id_refs, 6, stratified(1));

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let test = generate_chapter_test_with(&ch, &mut rng).unwrap();
            assert_eq!(test.len(), 6);
            assert_eq!(block_counts(&test).len(), 4);
        }
    }

    #[test]
    fn only_pool_questions_and_never_more_than_asked() {
        let questions = vec![
            question("p1", Some("A")),
            question("p2", None),
            question("x1", Some("A")),
            question("x2", Some("B")),
        ];
        for strategy in [stratified(1), SelectionStrategy::Random] {
            let ch = chapter(questions.clone(), &["p1", "p2", "missing"], 10, strategy);
            let mut rng = StdRng::seed_from_u64(7);
            let test = generate_chapter_test_with(&ch, &mut rng).unwrap();
            assert_eq!(test.len(), 2);
            assert!(test.iter().all(|q| q.id.starts_with('p')));
        }
    }

    #[test]
    fn minimums_overshooting_are_truncated() {
        let questions = vec![
            question("a", Some("A")),
            question("b", Some("B")),
            question("c", Some("C")),
            question("d", None),
        ];
        let ch = chapter(questions, &["a", "b", "c", "d"], 2, stratified(1));
        let test = generate_chapter_test(&ch).unwrap();
        assert_eq!(test.len(), 2);
    }

    #[test]
    fn random_strategy_samples_without_duplicates() {
        let questions: Vec<Question> = (0..10).map(|i| question(&format!("q{i}"), None)).collect();
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let ch = chapter(questions, &id_refs, 5, SelectionStrategy::Random);
        let test = generate_chapter_test(&ch).unwrap();
        let unique: HashSet<&str> = test.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn presentation_order_varies() {
        let questions: Vec<Question> = (0..8)
            .map(|i| question(&format!("q{i}"), Some(if i < 4 { "A" } else { "B" })))
            .collect();
        let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let ch = chapter(questions, &id_refs, 8, stratified(4));

        let orders: HashSet<Vec<String>> = (0..20)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                generate_chapter_test_with(&ch, &mut rng)
                    .unwrap()
                    .into_iter()
                    .map(|q| q.id)
                    .collect()
            })
            .collect();
        assert!(orders.len() > 1);
    }

    #[test]
    fn missing_configuration_is_an_error() {
        let mut ch = chapter(vec![question("a", None)], &["a"], 1, stratified(1));
        ch.chapter_test = None;
        assert!(matches!(
            generate_chapter_test(&ch),
            Err(SelectionError::MissingTestConfig { .. })
        ));

        let mut ch = chapter(vec![question("a", None)], &["a"], 1, stratified(1));
        ch.question_bank = None;
        assert!(generate_chapter_test(&ch).is_err());
    }

    #[test]
    fn zero_questions_requested_yields_empty_test() {
        let ch = chapter(vec![question("a", Some("A"))], &["a"], 0, stratified(1));
        assert!(generate_chapter_test(&ch).unwrap().is_empty());
    }
}
