//! Slack distribution for justified lines.

/// Spread `slack` pixels over the spaces of a line.
///
/// Every space receives `slack / spaces` pixels and the first
/// `slack % spaces` spaces one more, so the returned advances sum to the
/// original width plus `slack`. Returns `None` when there is nothing to
/// distribute or no space to distribute it over.
#[must_use]
pub fn justify(advances: &[u32], chars: &[char], slack: u32) -> Option<Vec<u32>> {
    if slack == 0 {
        return None;
    }
    let spaces: Vec<usize> = chars
        .iter()
        .take(advances.len())
        .enumerate()
        .filter_map(|(idx, &ch)| (ch == ' ').then_some(idx))
        .collect();
    if spaces.is_empty() {
        return None;
    }

    let count = spaces.len() as u32;
    let per_space = slack / count;
    let extra = slack % count;

    let mut widths = advances.to_vec();
    for (rank, &idx) in spaces.iter().enumerate() {
        widths[idx] += per_space + u32::from((rank as u32) < extra);
    }
    Some(widths)
}
