use std::cmp::Ordering;

use crate::play::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalMetric {
    #[default]
    Euclidean,
    Manhattan,
}

impl LocalMetric {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "euclidean" | "l2" => Some(Self::Euclidean),
            "manhattan" | "l1" | "cityblock" => Some(Self::Manhattan),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Alignment {
    pub total_cost: f64,
    /// Number of aligned cells on the optimal path.
    pub path_len: usize,
}

impl Alignment {
    pub fn normalized_cost(&self) -> f64 {
        if self.path_len == 0 {
            0.0
        } else {
            self.total_cost / self.path_len as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aligner {
    pub metric: LocalMetric,
    pub include_z: bool,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    cost: f64,
    steps: usize,
}

impl Cell {
    const UNREACHED: Cell = Cell {
        cost: f64::INFINITY,
        steps: usize::MAX,
    };

    // Lower cost wins; equal cost falls back to the shorter path so the
    // normalised cost does not depend on scan order.
    fn cmp_key(&self, other: &Cell) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.steps.cmp(&other.steps))
    }
}

impl Aligner {
    pub fn new(metric: LocalMetric, include_z: bool) -> Self {
        Self { metric, include_z }
    }

    pub fn local_distance(&self, a: &Position, b: &Position) -> f64 {
        let dx = a.x - b.x;
        let dy = a.y - b.y;
        let dz = if self.include_z {
            a.z.unwrap_or(0.0) - b.z.unwrap_or(0.0)
        } else {
            0.0
        };
        match self.metric {
            LocalMetric::Euclidean => (dx * dx + dy * dy + dz * dz).sqrt(),
            LocalMetric::Manhattan => dx.abs() + dy.abs() + dz.abs(),
        }
    }

    /// Optimal monotonic alignment from (0, 0) to (m-1, n-1) with the
    /// right/down/diagonal step set. `None` if either input is empty or no
    /// path has a finite cost.
    pub fn align(&self, a: &[Position], b: &[Position]) -> Option<Alignment> {
        if a.is_empty() || b.is_empty() {
            return None;
        }
        // Local distance is symmetric, so the grid can be transposed to
        // keep the rolling rows on the shorter side.
        let (rows, cols) = if a.len() >= b.len() { (a, b) } else { (b, a) };

        let mut prev = vec![Cell::UNREACHED; cols.len()];
        let mut curr = vec![Cell::UNREACHED; cols.len()];

        for (i, row_pt) in rows.iter().enumerate() {
            for (j, col_pt) in cols.iter().enumerate() {
                let from = if i == 0 && j == 0 {
                    Some(Cell { cost: 0.0, steps: 0 })
                } else {
                    [
                        (i > 0 && j > 0).then(|| prev[j - 1]),
                        (i > 0).then(|| prev[j]),
                        (j > 0).then(|| curr[j - 1]),
                    ]
                    .into_iter()
                    .flatten()
                    .filter(|c| c.cost.is_finite())
                    .min_by(|a, b| a.cmp_key(b))
                };
                curr[j] = match from {
                    Some(c) => Cell {
                        cost: c.cost + self.local_distance(row_pt, col_pt),
                        steps: c.steps + 1,
                    },
                    None => Cell::UNREACHED,
                };
            }
            std::mem::swap(&mut prev, &mut curr);
        }

        let end = prev[cols.len() - 1];
        if !end.cost.is_finite() {
            return None;
        }
        Some(Alignment {
            total_cost: end.cost,
            path_len: end.steps,
        })
    }

    pub fn cost(&self, a: &[Position], b: &[Position]) -> Option<f64> {
        self.align(a, b).map(|al| al.normalized_cost())
    }
}
