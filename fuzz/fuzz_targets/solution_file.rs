use honggfuzz::fuzz;
use sochi_blocks::import::{solution_cells, SolutionFile};
use sochi_blocks::puzzle::GridSize;

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Ok(file) = serde_json::from_slice::<SolutionFile>(data) else {
                return;
            };
            for solution in &file {
                if let Ok(cells) = solution_cells(solution) {
                    if let Some(grid) = GridSize::enclosing(&cells) {
                        assert!(cells.iter().all(|c| c.x < grid.x && c.y < grid.y && c.z < grid.z));
                    }
                }
            }
        });
    }
}
