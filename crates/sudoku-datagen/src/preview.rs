use rand::seq::index::sample;
use rand::Rng;
use sudoku_augment::{decode_puzzle, decode_solution, EncodedBatch, Grid};

/// Render up to `count` randomly chosen samples, decoded from the tensors
/// so the text matches what the trainer will read
pub fn render_samples<R: Rng + ?Sized>(batch: &EncodedBatch, count: usize, rng: &mut R) -> String {
    let total = batch.len();
    let count = count.min(total);
    let mut out = String::new();

    let mut picks: Vec<usize> = sample(rng, total, count).into_vec();
    picks.sort_unstable();
    for index in picks {
        let (Some(puzzle), Some(solution)) =
            (decode_puzzle(&batch.x, index), decode_solution(&batch.y, index))
        else {
            continue;
        };
        out.push_str(&format!(
            "sample {} ({} givens)\n",
            index,
            puzzle.given_count()
        ));
        out.push_str(&side_by_side(&puzzle, &solution));
        out.push('\n');
    }
    out
}

fn side_by_side(left: &Grid, right: &Grid) -> String {
    let left = left.to_string();
    let right = right.to_string();
    left.lines()
        .zip(right.lines())
        .map(|(l, r)| format!("{l}    {r}\n"))
        .collect()
}
