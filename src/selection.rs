use crate::bank::Question;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashSet;

/// The questions currently being studied, in presentation order
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    filtered: Vec<Question>,
    order: Vec<usize>,
    cursor: usize,
}

impl WorkingSet {
    /// Keep the questions whose topic is selected, in bank order
    pub fn filtered(questions: &[Question], selected: &HashSet<String>) -> Self {
        let filtered: Vec<Question> = questions
            .iter()
            .filter(|q| selected.contains(&q.topic))
            .cloned()
            .collect();
        let order = (0..filtered.len()).collect();

        Self {
            filtered,
            order,
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.filtered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }

    /// Position in the presentation order
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Question> {
        let idx = *self.order.get(self.cursor)?;
        self.filtered.get(idx)
    }

    /// Move to the next question, wrapping at the end
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.order.len().max(1);
    }

    /// Randomize the order and start over
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
        self.cursor = 0;
    }

    /// Back to the first question, optionally restoring bank order
    pub fn rewind(&mut self, restore_order: bool) {
        if restore_order {
            self.order = (0..self.filtered.len()).collect();
        }
        self.cursor = 0;
    }

    pub fn ids(&self) -> Vec<&str> {
        self.filtered.iter().map(|q| q.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(id: &str, topic: &str) -> Question {
        Question {
            id: id.to_string(),
            topic: topic.to_string(),
            prompt: String::new(),
            kind: QuestionKind::Open { answers: vec![] },
        }
    }

    fn topics(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn bank() -> Vec<Question> {
        vec![
            question("a", "Core"),
            question("b", "SQL"),
            question("c", "Core"),
            question("d", "JVM"),
        ]
    }

    #[test]
    fn test_filter_keeps_bank_order() {
        let set = WorkingSet::filtered(&bank(), &topics(&["Core", "JVM"]));
        assert_eq!(set.ids(), ["a", "c", "d"]);
        assert_eq!(set.current().unwrap().id, "a");
    }

    #[test]
    fn test_advance_wraps() {
        let mut set = WorkingSet::filtered(&bank(), &topics(&["Core"]));
        set.advance();
        assert_eq!(set.current().unwrap().id, "c");
        set.advance();
        assert_eq!(set.current().unwrap().id, "a");
    }

    #[test]
    fn test_empty_set() {
        let mut set = WorkingSet::filtered(&bank(), &topics(&[]));
        assert!(set.is_empty());
        assert!(set.current().is_none());
        set.advance();
        assert_eq!(set.position(), 0);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let all = topics(&["Core", "SQL", "JVM"]);
        let mut set = WorkingSet::filtered(&bank(), &all);
        set.advance();
        set.shuffle(&mut StdRng::seed_from_u64(4));
        assert_eq!(set.position(), 0);

        let mut seen = Vec::new();
        for _ in 0..set.len() {
            seen.push(set.current().unwrap().id.clone());
            set.advance();
        }
        seen.sort();
        assert_eq!(seen, ["a", "b", "c", "d"]);

        set.rewind(true);
        assert_eq!(set.current().unwrap().id, "a");
    }
}
