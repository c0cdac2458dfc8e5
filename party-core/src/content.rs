use anyhow::{Context, Result, anyhow};
use party_types::{ContentItem, Difficulty};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Supplies questions, phrases and sequences to the PRESENT phase.
///
/// Must never fail: an exhausted pool returns fewer than `count` items.
pub trait ContentProvider: Send {
    fn sample(&mut self, category: &str, difficulty: Difficulty, count: usize) -> Vec<ContentItem>;
}

/// Provider for games that show no content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoContent;

impl ContentProvider for NoContent {
    fn sample(&mut self, _category: &str, _difficulty: Difficulty, _count: usize) -> Vec<ContentItem> {
        Vec::new()
    }
}

/// Immutable content list, shared across sessions.
#[derive(Debug, Clone, Default)]
pub struct ContentPool {
    items: Vec<ContentItem>,
}

impl ContentPool {
    pub fn new(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    /// Parse `category|difficulty|prompt|answer` lines. The answer column is
    /// optional; blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut items = Vec::new();

        for (line_number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut columns = line.split('|').map(str::trim);
            let (Some(category), Some(difficulty), Some(prompt)) =
                (columns.next(), columns.next(), columns.next())
            else {
                return Err(anyhow!(
                    "line {}: expected category|difficulty|prompt[|answer]",
                    line_number + 1
                ));
            };

            if category.is_empty() || prompt.is_empty() {
                return Err(anyhow!("line {}: empty category or prompt", line_number + 1));
            }

            let difficulty = difficulty
                .parse::<Difficulty>()
                .map_err(|e| anyhow!("line {}: {}", line_number + 1, e))?;

            items.push(ContentItem {
                category: category.to_lowercase(),
                difficulty,
                prompt: prompt.to_string(),
                answer: columns
                    .next()
                    .filter(|answer| !answer.is_empty())
                    .map(str::to_string),
            });
        }

        Ok(Self { items })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read content file {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn count_for(&self, category: &str, difficulty: Difficulty) -> usize {
        self.indices_for(category, difficulty).count()
    }

    fn indices_for<'a>(
        &'a self,
        category: &'a str,
        difficulty: Difficulty,
    ) -> impl Iterator<Item = usize> + 'a {
        self.items
            .iter()
            .enumerate()
            .filter(move |(_, item)| {
                item.difficulty == difficulty && item.category.eq_ignore_ascii_case(category)
            })
            .map(|(index, _)| index)
    }
}

/// Per-session view of a pool that never repeats an item within the session.
#[derive(Debug, Clone)]
pub struct PoolSampler {
    pool: Arc<ContentPool>,
    drawn: HashSet<usize>,
    rng: StdRng,
}

impl PoolSampler {
    pub fn new(pool: Arc<ContentPool>) -> Self {
        Self::with_rng(pool, StdRng::from_os_rng())
    }

    pub fn seeded(pool: Arc<ContentPool>, seed: u64) -> Self {
        Self::with_rng(pool, StdRng::seed_from_u64(seed))
    }

    fn with_rng(pool: Arc<ContentPool>, rng: StdRng) -> Self {
        Self {
            pool,
            drawn: HashSet::new(),
            rng,
        }
    }

    pub fn remaining(&self, category: &str, difficulty: Difficulty) -> usize {
        self.pool
            .indices_for(category, difficulty)
            .filter(|index| !self.drawn.contains(index))
            .count()
    }
}

impl ContentProvider for PoolSampler {
    fn sample(&mut self, category: &str, difficulty: Difficulty, count: usize) -> Vec<ContentItem> {
        let available: Vec<usize> = self
            .pool
            .indices_for(category, difficulty)
            .filter(|index| !self.drawn.contains(index))
            .collect();

        let amount = count.min(available.len());
        let picked: Vec<usize> = rand::seq::index::sample(&mut self.rng, available.len(), amount)
            .into_iter()
            .map(|position| available[position])
            .collect();

        picked
            .into_iter()
            .map(|index| {
                self.drawn.insert(index);
                self.pool.items[index].clone()
            })
            .collect()
    }
}
