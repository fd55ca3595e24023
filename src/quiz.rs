use crate::bank::{Question, QuestionKind};
use rand::Rng;
use rand::seq::SliceRandom;

/// Number of options every quiz item shows
pub const OPTION_COUNT: usize = 4;

/// Shown as the correct option when an open question has no bullets
pub const PLACEHOLDER_CORRECT: &str = "Correct option";

/// Explanation attached to generated items
pub const GENERATED_EXPLAIN: &str = "Generated from card; check phrasing.";

/// A multiple-choice item ready to present
#[derive(Debug, Clone, PartialEq)]
pub struct QuizItem {
    /// Id grades are recorded against
    pub id: String,
    pub prompt: String,
    pub options: Vec<String>,
    /// Index of the correct entry in `options`
    pub answer: usize,
    pub explain: Option<String>,
}

impl QuizItem {
    /// Build a quiz item for `question`. Multiple-choice questions keep their
    /// options in shuffled order; open questions get generated distractors.
    pub fn for_question<R: Rng + ?Sized>(question: &Question, bank: &[Question], rng: &mut R) -> Self {
        match &question.kind {
            QuestionKind::Mcq {
                options,
                answer,
                explain,
            } => {
                let mut order: Vec<usize> = (0..options.len()).collect();
                order.shuffle(rng);
                let answer = order.iter().position(|&i| i == *answer).unwrap_or(0);
                QuizItem {
                    id: question.id.clone(),
                    prompt: question.prompt.clone(),
                    options: order.into_iter().map(|i| options[i].clone()).collect(),
                    answer,
                    explain: explain.clone(),
                }
            }
            QuestionKind::Open { .. } => generate_mcq(question, bank, rng),
        }
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.answer
    }
}

/// Turn an open question into a four-option multiple-choice item.
///
/// Distractors are the first bullets of other open questions on the same
/// topic; missing slots are filled with numbered placeholders.
pub fn generate_mcq<R: Rng + ?Sized>(question: &Question, bank: &[Question], rng: &mut R) -> QuizItem {
    let correct = question
        .first_answer()
        .unwrap_or(PLACEHOLDER_CORRECT)
        .to_string();

    let mut pool: Vec<&str> = Vec::new();
    for other in bank {
        if other.id == question.id || other.topic != question.topic || !other.is_open() {
            continue;
        }
        if let Some(bullet) = other.first_answer()
            && bullet != correct
            && !pool.contains(&bullet)
        {
            pool.push(bullet);
        }
    }
    pool.shuffle(rng);

    let mut options = vec![correct.clone()];
    options.extend(pool.into_iter().take(OPTION_COUNT - 1).map(str::to_string));

    let mut counter = 1;
    while options.len() < OPTION_COUNT {
        let mut filler = format!("Another option {}", counter);
        while options.contains(&filler) {
            counter += 1;
            filler = format!("Another option {}", counter);
        }
        options.push(filler);
        counter += 1;
    }

    options.shuffle(rng);
    let answer = options.iter().position(|o| *o == correct).unwrap_or(0);

    QuizItem {
        id: format!("{}-gen", question.id),
        prompt: question.prompt.clone(),
        options,
        answer,
        explain: Some(GENERATED_EXPLAIN.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn open(id: &str, topic: &str, answers: &[&str]) -> Question {
        Question {
            id: id.to_string(),
            topic: topic.to_string(),
            prompt: format!("prompt {}", id),
            kind: QuestionKind::Open {
                answers: answers.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    fn assert_well_formed(item: &QuizItem, correct: &str) {
        assert_eq!(item.options.len(), OPTION_COUNT);
        let unique: HashSet<&String> = item.options.iter().collect();
        assert_eq!(unique.len(), OPTION_COUNT, "duplicate options: {:?}", item.options);
        assert_eq!(item.options[item.answer], correct);
    }

    #[test]
    fn test_uses_same_topic_distractors() {
        let bank = vec![
            open("a", "T", &["right", "more"]),
            open("b", "T", &["wrong b"]),
            open("c", "T", &["wrong c"]),
            open("d", "T", &["wrong d"]),
            open("e", "T", &["wrong e"]),
            open("x", "Other", &["off topic"]),
        ];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..20 {
            let item = generate_mcq(&bank[0], &bank, &mut rng);
            assert_well_formed(&item, "right");
            assert!(!item.options.iter().any(|o| o == "off topic"));
            assert!(!item.options.iter().any(|o| o.starts_with("Another option")));
            assert_eq!(item.id, "a-gen");
            assert_eq!(item.explain.as_deref(), Some(GENERATED_EXPLAIN));
        }
    }

    #[test]
    fn test_pads_with_placeholders() {
        let bank = vec![open("a", "T", &["right"]), open("b", "T", &["wrong b"])];
        let mut rng = StdRng::seed_from_u64(1);

        let item = generate_mcq(&bank[0], &bank, &mut rng);
        assert_well_formed(&item, "right");
        assert!(item.options.contains(&"Another option 1".to_string()));
        assert!(item.options.contains(&"Another option 2".to_string()));
    }

    #[test]
    fn test_skips_taken_placeholder_names() {
        let bank = vec![
            open("a", "T", &["Another option 1"]),
            open("b", "T", &["Another option 2"]),
        ];
        let mut rng = StdRng::seed_from_u64(3);

        let item = generate_mcq(&bank[0], &bank, &mut rng);
        assert_well_formed(&item, "Another option 1");
        assert!(item.options.contains(&"Another option 3".to_string()));
        assert!(item.options.contains(&"Another option 4".to_string()));
    }

    #[test]
    fn test_excludes_duplicates_of_correct() {
        let bank = vec![
            open("a", "T", &["same"]),
            open("b", "T", &["same"]),
            open("c", "T", &["dup"]),
            open("d", "T", &["dup"]),
        ];
        let mut rng = StdRng::seed_from_u64(11);

        let item = generate_mcq(&bank[0], &bank, &mut rng);
        assert_well_formed(&item, "same");
        assert_eq!(item.options.iter().filter(|o| *o == "dup").count(), 1);
    }

    #[test]
    fn test_placeholder_when_no_bullets() {
        let bank = vec![open("a", "T", &[])];
        let mut rng = StdRng::seed_from_u64(5);

        let item = generate_mcq(&bank[0], &bank, &mut rng);
        assert_well_formed(&item, PLACEHOLDER_CORRECT);
    }

    #[test]
    fn test_same_seed_same_item() {
        let bank = QuestionBank::builtin().unwrap();
        let question = bank.questions.iter().find(|q| q.is_open()).unwrap();

        let first = generate_mcq(question, &bank.questions, &mut StdRng::seed_from_u64(42));
        let second = generate_mcq(question, &bank.questions, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_mcq_keeps_answer_after_shuffle() {
        let bank = QuestionBank::builtin().unwrap();
        let question = bank
            .questions
            .iter()
            .find(|q| q.id == "spring-bean-scope")
            .unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..10 {
            let item = QuizItem::for_question(question, &bank.questions, &mut rng);
            assert_eq!(item.id, "spring-bean-scope");
            assert_well_formed(&item, "singleton");
            assert!(item.is_correct(item.answer));
        }
    }

    #[test]
    fn test_builtin_open_questions_generate() {
        let bank = QuestionBank::builtin().unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        for question in bank.questions.iter().filter(|q| q.is_open()) {
            let item = QuizItem::for_question(question, &bank.questions, &mut rng);
            assert_well_formed(&item, question.first_answer().unwrap());
        }
    }
}
