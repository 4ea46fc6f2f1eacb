//! Tick layout: which steps get a label.
//!
//! Every step gets a tick. The first and last are end ticks and never carry
//! a label. Interior ticks are labelled ("major") every `k` steps, starting
//! at an offset that leaves the same number of minor ticks at both ends,
//! with the smallest `k` whose labels do not collide.

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// First or last step
    End,
    /// Labelled interior step
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub index: usize,
    pub position: f64,
    pub kind: TickKind,
}

/// Result of [`plan_ticks`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickLayout {
    pub ticks: Vec<Tick>,
    /// Spacing between majors; `None` for the single middle-label fallback
    /// or when there is no interior step.
    pub major_interval: Option<usize>,
    /// Index of the first major candidate (may be an end tick)
    pub offset: usize,
}

impl TickLayout {
    /// Step indices carrying a label
    pub fn major_indices(&self) -> Vec<usize> {
        self.ticks
            .iter()
            .filter(|t| t.kind == TickKind::Major)
            .map(|t| t.index)
            .collect()
    }
}

/// Plan ticks for steps at `positions`.
///
/// `label_width(i)` estimates the rendered width of step `i`'s label; labels
/// are centred on their tick and must keep `padding` between neighbours.
pub fn plan_ticks<F>(positions: &[f64], label_width: F, padding: f64) -> TickLayout
where
    F: Fn(usize) -> f64,
{
    let n = positions.len();
    if n < 3 {
        return TickLayout {
            ticks: build_ticks(positions, &[]),
            major_interval: None,
            offset: 0,
        };
    }

    let last = n - 1;
    let max_k = n.div_ceil(2);
    for k in 2..=max_k {
        let leftover = last % k;
        // Equal minor counts at both ends need an even leftover
        if leftover % 2 != 0 {
            continue;
        }
        let offset = leftover / 2;
        let majors: Vec<usize> = (offset..n).step_by(k).filter(|&i| i != 0 && i != last).collect();
        if majors.is_empty() {
            continue;
        }
        if labels_fit(positions, &majors, &label_width, padding) {
            trace!("Tick layout: {} steps, major every {} from {}", n, k, offset);
            return TickLayout {
                ticks: build_ticks(positions, &majors),
                major_interval: Some(k),
                offset,
            };
        }
    }

    let middle = last / 2;
    trace!("Tick layout: {} steps, no spacing fits, single label at {}", n, middle);
    TickLayout {
        ticks: build_ticks(positions, &[middle]),
        major_interval: None,
        offset: middle,
    }
}

/// True when no two neighbouring labels overlap (padding included).
fn labels_fit<F>(positions: &[f64], majors: &[usize], label_width: &F, padding: f64) -> bool
where
    F: Fn(usize) -> f64,
{
    let span = |i: usize| {
        let half = label_width(i) / 2.0;
        (positions[i] - half, positions[i] + half)
    };
    majors.windows(2).all(|pair| {
        let (_, right) = span(pair[0]);
        let (left, _) = span(pair[1]);
        right + padding <= left
    })
}

fn build_ticks(positions: &[f64], majors: &[usize]) -> Vec<Tick> {
    let last = positions.len().saturating_sub(1);
    positions
        .iter()
        .enumerate()
        .map(|(index, &position)| {
            let kind = if index == 0 || index == last {
                TickKind::End
            } else if majors.contains(&index) {
                TickKind::Major
            } else {
                TickKind::Minor
            };
            Tick { index, position, kind }
        })
        .collect()
}
